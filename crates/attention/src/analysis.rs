//! Per-frame analysis results

use serde::{Deserialize, Serialize};

use crate::accumulator::SessionTotals;
use crate::emotion::EmotionSample;
use crate::geometry::FeatureSample;
use crate::signals::AlertSignals;
use crate::state::Classification;

/// Everything the presentation layer reads after one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Zero-based index of the frame within the session
    pub frame_index: u64,

    /// Whether a face was detected
    pub face_detected: bool,

    /// Geometric features (absent when no face was found)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureSample>,

    /// Emotion of the face, when classified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionSample>,

    /// Raw signals of this frame
    pub signals: AlertSignals,

    /// Resolved state
    pub classification: Classification,

    /// Consecutive closed-eye frames
    pub eye_closed_frames: u32,

    /// Seconds credited to `classification` for this frame
    pub frame_seconds: f64,

    /// Running totals after this frame
    pub totals: SessionTotals,
}

impl FrameAnalysis {
    /// Label shown for the current emotion ("---" when unknown)
    pub fn emotion_label(&self) -> &'static str {
        self.emotion.map_or("---", |e| e.label.as_str())
    }
}
