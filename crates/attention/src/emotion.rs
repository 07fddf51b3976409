//! Emotion vocabulary and classifier boundary

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use camera_capture::frame::GrayFrame;
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use crate::detector::FaceBbox;
use crate::AttentionError;

/// Side of the square patch fed to the emotion model
pub const FACE_PATCH_SIZE: usize = 48;

/// FER emotion labels, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    /// Map a model output index to its label
    pub fn from_index(index: usize) -> Option<Emotion> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = AttentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .find(|e| e.as_str() == wanted)
            .copied()
            .ok_or_else(|| AttentionError::Config(format!("unknown emotion '{}'", s)))
    }
}

/// Classified emotion with its subset membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionSample {
    pub label: Emotion,
    /// Member of the configured distracted subset
    pub distracted: bool,
    /// Member of the configured focused subset
    pub focused: bool,
}

impl EmotionSample {
    pub fn new(label: Emotion, distracted: &BTreeSet<Emotion>, focused: &BTreeSet<Emotion>) -> Self {
        Self {
            label,
            distracted: distracted.contains(&label),
            focused: focused.contains(&label),
        }
    }
}

/// Normalized grayscale face crop, NHWC `[1, 48, 48, 1]` in `0.0..=1.0`
#[derive(Debug, Clone)]
pub struct FacePatch {
    pixels: Array4<f32>,
}

impl FacePatch {
    /// Crop `bbox` out of the frame, resize and normalize it.
    ///
    /// Returns `None` if the box does not overlap the frame.
    pub fn from_gray(frame: &GrayFrame, bbox: &FaceBbox) -> Result<Option<Self>, AttentionError> {
        let Some(crop) = frame.crop(bbox.x, bbox.y, bbox.width, bbox.height) else {
            return Ok(None);
        };
        let side = FACE_PATCH_SIZE as u32;
        let resized = crop
            .resize(side, side)
            .map_err(|e| AttentionError::ImageProcessing(e.to_string()))?;

        let mut pixels = Array4::<f32>::zeros((1, FACE_PATCH_SIZE, FACE_PATCH_SIZE, 1));
        for (i, value) in resized.data.iter().enumerate() {
            let (y, x) = (i / FACE_PATCH_SIZE, i % FACE_PATCH_SIZE);
            pixels[[0, y, x, 0]] = f32::from(*value) / 255.0;
        }
        Ok(Some(Self { pixels }))
    }

    pub fn pixels(&self) -> &Array4<f32> {
        &self.pixels
    }
}

/// Facial expression model
pub trait EmotionClassifier {
    fn classify(&mut self, patch: &FacePatch) -> Result<Emotion, AttentionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_order() {
        assert_eq!(Emotion::from_index(0), Some(Emotion::Angry));
        assert_eq!(Emotion::from_index(5), Some(Emotion::Surprise));
        assert_eq!(Emotion::from_index(6), Some(Emotion::Neutral));
        assert_eq!(Emotion::from_index(7), None);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("Happy".parse::<Emotion>().unwrap(), Emotion::Happy);
        assert_eq!(" fear ".parse::<Emotion>().unwrap(), Emotion::Fear);
        assert!("bored".parse::<Emotion>().is_err());
        assert_eq!(Emotion::Disgust.to_string(), "disgust");
    }

    #[test]
    fn test_sample_membership() {
        let distracted: BTreeSet<_> = [Emotion::Angry].into_iter().collect();
        let focused: BTreeSet<_> = [Emotion::Neutral].into_iter().collect();
        let angry = EmotionSample::new(Emotion::Angry, &distracted, &focused);
        assert!(angry.distracted && !angry.focused);
        let sad = EmotionSample::new(Emotion::Sad, &distracted, &focused);
        assert!(!sad.distracted && !sad.focused);
    }

    #[test]
    fn test_face_patch_normalized() {
        let frame = GrayFrame {
            data: vec![255; 100 * 100],
            width: 100,
            height: 100,
        };
        let bbox = FaceBbox {
            x: 10,
            y: 10,
            width: 60,
            height: 60,
        };
        let patch = FacePatch::from_gray(&frame, &bbox).unwrap().unwrap();
        assert_eq!(patch.pixels().shape(), &[1, 48, 48, 1]);
        assert!(patch.pixels().iter().all(|&v| (v - 1.0).abs() < 1e-6));

        let outside = FaceBbox { x: 200, ..bbox };
        assert!(FacePatch::from_gray(&frame, &outside).unwrap().is_none());
    }
}
