//! Instantaneous alert signals

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::AttentionConfig;
use crate::emotion::{Emotion, EmotionSample};
use crate::geometry::FeatureSample;

/// Raw per-frame signals exposed to the alerting layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSignals {
    /// Eyes closed long enough to count as drowsy
    pub blink: bool,
    /// Mouth open wide
    pub yawn: bool,
    /// Head off-center, dropped, or out of view
    pub posture: bool,
    /// Emotion in the distracted subset
    pub emotion: bool,
}

impl AlertSignals {
    /// Any signal that feeds the distracted state
    pub fn any_distraction(&self) -> bool {
        self.yawn || self.posture || self.emotion
    }
}

/// Threshold checks that need no history
#[derive(Debug, Clone)]
pub struct SignalClassifier {
    mouth_ar_thresh: f64,
    posture_deviation_px: f64,
    distracted_emotions: BTreeSet<Emotion>,
    focused_emotions: BTreeSet<Emotion>,
}

impl SignalClassifier {
    pub fn new(config: &AttentionConfig) -> Self {
        Self {
            mouth_ar_thresh: config.mouth_ar_thresh,
            posture_deviation_px: config.posture_deviation_px,
            distracted_emotions: config.distracted_emotions.clone(),
            focused_emotions: config.focused_emotions.clone(),
        }
    }

    pub fn yawn(&self, features: &FeatureSample) -> bool {
        features.mar > self.mouth_ar_thresh
    }

    pub fn posture(&self, features: &FeatureSample) -> bool {
        features.posture_deviation > self.posture_deviation_px || features.posture_drop
    }

    pub fn emotion(&self, label: Emotion) -> EmotionSample {
        EmotionSample::new(label, &self.distracted_emotions, &self.focused_emotions)
    }
}
