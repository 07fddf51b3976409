//! Face/landmark detection boundary and the frame observer

use camera_capture::frame::{GrayFrame, VideoFrame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AttentionConfig;
use crate::emotion::{Emotion, EmotionClassifier, FacePatch};
use crate::geometry::LandmarkSet;
use crate::onnx::OnnxEmotionClassifier;
use crate::AttentionError;

/// Face bounding box in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBbox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// First face found in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub bbox: FaceBbox,
    pub landmarks: LandmarkSet,
}

/// Face alignment model (e.g. a 68-point shape predictor).
///
/// Returns the first detected face only; `Ok(None)` means nobody is in view.
pub trait LandmarkDetector {
    fn detect(&mut self, frame: &GrayFrame) -> Result<Option<FaceDetection>, AttentionError>;
}

/// What the engine needs to know about one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    /// Capture time (nanoseconds), used by the measured time step
    pub timestamp_ns: u64,
    /// First detected face, if any
    pub face: Option<FaceDetection>,
    /// Emotion label of that face, when an emotion classifier is attached
    pub emotion: Option<Emotion>,
}

/// Turns raw frames into observations.
///
/// The landmark-only and emotion-augmented variants are the same pipeline;
/// the latter just carries an emotion classifier.
pub struct FaceObserver {
    detector: Box<dyn LandmarkDetector>,
    emotion: Option<Box<dyn EmotionClassifier>>,
}

impl FaceObserver {
    pub fn new(detector: Box<dyn LandmarkDetector>) -> Self {
        Self {
            detector,
            emotion: None,
        }
    }

    /// Build the observer for `config`, loading the emotion model when a
    /// path is configured
    pub fn from_config(
        detector: Box<dyn LandmarkDetector>,
        config: &AttentionConfig,
    ) -> Result<Self, AttentionError> {
        let observer = Self::new(detector);
        match &config.emotion_model_path {
            Some(path) => Ok(observer.with_emotion(Box::new(OnnxEmotionClassifier::load(path)?))),
            None => Ok(observer),
        }
    }

    /// Attach an emotion classifier
    pub fn with_emotion(mut self, classifier: Box<dyn EmotionClassifier>) -> Self {
        info!("Emotion classification enabled");
        self.emotion = Some(classifier);
        self
    }

    pub fn has_emotion(&self) -> bool {
        self.emotion.is_some()
    }

    /// Detect the face and, if enabled, classify its emotion
    pub fn observe(&mut self, frame: &VideoFrame) -> Result<FrameObservation, AttentionError> {
        let gray = frame.to_grayscale();
        let face = self.detector.detect(&gray)?;

        let emotion = match (&mut self.emotion, &face) {
            (Some(classifier), Some(face)) => match FacePatch::from_gray(&gray, &face.bbox)? {
                Some(patch) => Some(classifier.classify(&patch)?),
                None => {
                    debug!("Face box outside frame, skipping emotion");
                    None
                }
            },
            _ => None,
        };

        Ok(FrameObservation {
            timestamp_ns: frame.timestamp_ns,
            face,
            emotion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fixtures;

    struct Scripted(Vec<Option<FaceDetection>>);

    impl LandmarkDetector for Scripted {
        fn detect(&mut self, _frame: &GrayFrame) -> Result<Option<FaceDetection>, AttentionError> {
            Ok(if self.0.is_empty() { None } else { self.0.remove(0) })
        }
    }

    struct AlwaysFear;

    impl EmotionClassifier for AlwaysFear {
        fn classify(&mut self, patch: &FacePatch) -> Result<Emotion, AttentionError> {
            assert_eq!(patch.pixels().shape(), &[1, 48, 48, 1]);
            Ok(Emotion::Fear)
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::new(vec![128; 320 * 240 * 3], 320, 240, 42, 0).unwrap()
    }

    fn detection() -> FaceDetection {
        let landmarks = fixtures::focused();
        FaceDetection {
            bbox: landmarks.bounding_box(),
            landmarks,
        }
    }

    #[test]
    fn test_landmark_only_observer() {
        let mut observer = FaceObserver::new(Box::new(Scripted(vec![Some(detection()), None])));
        assert!(!observer.has_emotion());

        let first = observer.observe(&frame()).unwrap();
        assert_eq!(first.timestamp_ns, 42);
        assert!(first.face.is_some());
        assert_eq!(first.emotion, None);

        let second = observer.observe(&frame()).unwrap();
        assert!(second.face.is_none());
    }

    #[test]
    fn test_from_config() {
        let observer =
            FaceObserver::from_config(Box::new(Scripted(vec![])), &AttentionConfig::default()).unwrap();
        assert!(!observer.has_emotion());

        let config = AttentionConfig {
            emotion_model_path: Some("/nonexistent/fer_model.onnx".into()),
            ..Default::default()
        };
        let result = FaceObserver::from_config(Box::new(Scripted(vec![])), &config);
        assert!(matches!(result, Err(AttentionError::ModelLoad(_))));
    }

    #[test]
    fn test_emotion_only_with_face() {
        let mut observer = FaceObserver::new(Box::new(Scripted(vec![Some(detection()), None])))
            .with_emotion(Box::new(AlwaysFear));
        assert!(observer.has_emotion());

        assert_eq!(observer.observe(&frame()).unwrap().emotion, Some(Emotion::Fear));
        assert_eq!(observer.observe(&frame()).unwrap().emotion, None);
    }
}
