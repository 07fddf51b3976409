//! Attention Estimation Engine
//!
//! Real-time study attention analysis from facial landmarks:
//! - Eye aspect ratio with closed-eye debounce (drowsiness)
//! - Mouth aspect ratio (yawning)
//! - Nose/chin offset (posture)
//! - Optional facial emotion (distraction)
//! - Time-in-state accounting per session

pub mod accumulator;
pub mod analysis;
pub mod config;
pub mod detector;
pub mod emotion;
pub mod geometry;
pub mod hysteresis;
pub mod onnx;
pub mod signals;
pub mod state;

pub use accumulator::{FrameClock, SessionAccumulator, SessionTotals};
pub use analysis::FrameAnalysis;
pub use config::{AttentionConfig, TimeStep};
pub use detector::{FaceBbox, FaceDetection, FaceObserver, FrameObservation, LandmarkDetector};
pub use emotion::{Emotion, EmotionClassifier, EmotionSample, FacePatch};
pub use geometry::{FeatureSample, LandmarkSet, Point};
pub use hysteresis::EyeClosureTracker;
pub use onnx::OnnxEmotionClassifier;
pub use signals::{AlertSignals, SignalClassifier};
pub use state::Classification;

use thiserror::Error;
use tracing::{debug, info, trace};

/// Attention engine error types
#[derive(Error, Debug)]
pub enum AttentionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid landmarks: {0}")]
    Landmarks(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
}

/// Per-session attention engine.
///
/// Owns all state that lives across frames; one instance per session,
/// driven by one caller frame after frame.
pub struct AttentionEngine {
    config: AttentionConfig,
    classifier: SignalClassifier,
    eyes: EyeClosureTracker,
    clock: FrameClock,
    accumulator: SessionAccumulator,
    signals: AlertSignals,
    classification: Classification,
}

impl AttentionEngine {
    /// Create a new engine; invalid configuration is rejected up front
    pub fn new(config: AttentionConfig) -> Result<Self, AttentionError> {
        config.validate()?;
        info!(
            "Creating attention engine (ear<{}, {} frames, mar>{}, posture>{}px)",
            config.eye_ar_thresh,
            config.eye_ar_consec_frames,
            config.mouth_ar_thresh,
            config.posture_deviation_px
        );
        Ok(Self {
            classifier: SignalClassifier::new(&config),
            eyes: EyeClosureTracker::new(config.eye_ar_thresh, config.eye_ar_consec_frames),
            clock: FrameClock::new(config.time_step),
            accumulator: SessionAccumulator::new(),
            signals: AlertSignals::default(),
            classification: Classification::default(),
            config,
        })
    }

    /// Process one frame
    pub fn process(&mut self, observation: &FrameObservation) -> FrameAnalysis {
        let frame_index = self.accumulator.frames();
        let emotion = observation.emotion.map(|label| self.classifier.emotion(label));
        let emotion_alert = emotion.map_or(false, |e| e.distracted);

        let (features, signals) = match &observation.face {
            None => {
                // Nothing to measure; the closed-eye counter is left as is
                let signals = AlertSignals {
                    blink: false,
                    yawn: false,
                    posture: true,
                    emotion: emotion_alert,
                };
                (None, signals)
            }
            Some(face) => {
                let features = FeatureSample::extract(&face.landmarks);
                let signals = AlertSignals {
                    blink: self.eyes.update(features.ear),
                    yawn: self.classifier.yawn(&features),
                    posture: self.classifier.posture(&features),
                    emotion: emotion_alert,
                };
                (Some(features), signals)
            }
        };

        let classification = state::resolve(&signals, observation.face.is_some());
        let frame_seconds = self.clock.advance(observation.timestamp_ns);
        self.accumulator.add(classification, frame_seconds);

        if classification != self.classification {
            debug!("Attention state {} -> {}", self.classification, classification);
        }
        trace!(
            "Frame {}: {:?} ear={:?} signals={:?}",
            frame_index,
            classification,
            features.map(|f| f.ear),
            signals
        );

        self.signals = signals;
        self.classification = classification;

        FrameAnalysis {
            frame_index,
            face_detected: observation.face.is_some(),
            features,
            emotion,
            signals,
            classification,
            eye_closed_frames: self.eyes.counter(),
            frame_seconds,
            totals: self.accumulator.totals(),
        }
    }

    /// Count an alert that made it past its cooldown
    pub fn record_alert(&mut self) {
        self.accumulator.record_alert();
    }

    /// Signals of the last processed frame
    pub fn signals(&self) -> AlertSignals {
        self.signals
    }

    /// State of the last processed frame
    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn totals(&self) -> SessionTotals {
        self.accumulator.totals()
    }

    pub fn frames_processed(&self) -> u64 {
        self.accumulator.frames()
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    /// End the session and hand out the final totals
    pub fn finish(self) -> SessionTotals {
        let frames = self.accumulator.frames();
        let totals = self.accumulator.finalize();
        info!(
            "Attention session finished: {} frames, focused {:.1}s, drowsy {:.1}s, distracted {:.1}s, {} alerts",
            frames,
            totals.focused_seconds,
            totals.drowsy_seconds,
            totals.distracted_seconds,
            totals.alert_count
        );
        totals
    }
}
