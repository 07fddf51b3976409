//! Attention engine configuration

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;
use crate::AttentionError;

/// How much session time a processed frame accounts for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeStep {
    /// Every frame advances the clock by the same nominal duration
    Fixed { seconds: f64 },
    /// Use the gap between consecutive frame timestamps; the first frame
    /// of a session falls back to the nominal duration
    Measured { nominal_seconds: f64 },
}

impl TimeStep {
    /// Assumed ~30fps processing rate
    pub const NOMINAL_SECONDS: f64 = 1.0 / 30.0;

    pub fn nominal_seconds(&self) -> f64 {
        match *self {
            TimeStep::Fixed { seconds } => seconds,
            TimeStep::Measured { nominal_seconds } => nominal_seconds,
        }
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        TimeStep::Fixed {
            seconds: Self::NOMINAL_SECONDS,
        }
    }
}

/// Attention engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    /// Eye aspect ratio below which the eye counts as closed
    pub eye_ar_thresh: f64,

    /// Consecutive closed-eye frames before drowsiness is reported
    pub eye_ar_consec_frames: u32,

    /// Mouth aspect ratio above which the mouth counts as yawning
    pub mouth_ar_thresh: f64,

    /// Horizontal nose/chin offset (pixels) that counts as bad posture
    pub posture_deviation_px: f64,

    /// Emotions that mark the frame as distracted
    pub distracted_emotions: BTreeSet<Emotion>,

    /// Emotions highlighted as focused (informational only)
    pub focused_emotions: BTreeSet<Emotion>,

    /// Per-frame time accounting
    pub time_step: TimeStep,

    /// Emotion model path (ONNX). `None` runs the landmark-only pipeline
    pub emotion_model_path: Option<String>,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            eye_ar_thresh: 0.22,
            eye_ar_consec_frames: 6,
            mouth_ar_thresh: 0.6,
            posture_deviation_px: 40.0,
            distracted_emotions: [
                Emotion::Angry,
                Emotion::Disgust,
                Emotion::Fear,
                Emotion::Surprise,
            ]
            .into_iter()
            .collect(),
            focused_emotions: [Emotion::Neutral, Emotion::Happy].into_iter().collect(),
            time_step: TimeStep::default(),
            emotion_model_path: None,
        }
    }
}

impl AttentionConfig {
    /// Create strict config (reacts sooner)
    pub fn strict() -> Self {
        Self {
            eye_ar_thresh: 0.24,
            eye_ar_consec_frames: 4,
            mouth_ar_thresh: 0.5,
            posture_deviation_px: 30.0,
            ..Default::default()
        }
    }

    /// Create lenient config (tolerates more before reacting)
    pub fn lenient() -> Self {
        Self {
            eye_ar_thresh: 0.20,
            eye_ar_consec_frames: 9,
            mouth_ar_thresh: 0.7,
            posture_deviation_px: 55.0,
            ..Default::default()
        }
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), AttentionError> {
        let positive = [
            ("eye_ar_thresh", self.eye_ar_thresh),
            ("mouth_ar_thresh", self.mouth_ar_thresh),
            ("posture_deviation_px", self.posture_deviation_px),
            ("time_step", self.time_step.nominal_seconds()),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(AttentionError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.eye_ar_consec_frames == 0 {
            return Err(AttentionError::Config(
                "eye_ar_consec_frames must be at least 1".into(),
            ));
        }

        if let Some(emotion) = self
            .distracted_emotions
            .intersection(&self.focused_emotions)
            .next()
        {
            return Err(AttentionError::Config(format!(
                "emotion '{}' is listed as both distracted and focused",
                emotion
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AttentionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.eye_ar_consec_frames, 6);
        assert!((config.time_step.nominal_seconds() - 1.0 / 30.0).abs() < 1e-12);
        assert!(config.distracted_emotions.contains(&Emotion::Surprise));
        assert!(!config.distracted_emotions.contains(&Emotion::Sad));
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(AttentionConfig::strict().validate().is_ok());
        assert!(AttentionConfig::lenient().validate().is_ok());
        assert!(AttentionConfig::strict().eye_ar_consec_frames < AttentionConfig::lenient().eye_ar_consec_frames);
    }

    #[test]
    fn test_rejects_zero_frames() {
        let config = AttentionConfig {
            eye_ar_consec_frames: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AttentionError::Config(_))));
    }

    #[test]
    fn test_rejects_overlapping_emotion_sets() {
        let mut config = AttentionConfig::default();
        config.focused_emotions.insert(Emotion::Fear);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_time_step() {
        let config = AttentionConfig {
            time_step: TimeStep::Fixed { seconds: 0.0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: AttentionConfig = serde_json::from_str(
            r#"{"eye_ar_thresh": 0.25, "time_step": {"mode": "measured", "nominal_seconds": 0.05}}"#,
        )
        .unwrap();
        assert_eq!(config.eye_ar_thresh, 0.25);
        assert_eq!(config.mouth_ar_thresh, 0.6);
        assert_eq!(config.time_step, TimeStep::Measured { nominal_seconds: 0.05 });
    }
}
