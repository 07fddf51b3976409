//! FER emotion model running on tract

use std::path::Path;

use tracing::{debug, error, info};
use tract_onnx::prelude::*;

use crate::emotion::{Emotion, EmotionClassifier, FacePatch, FACE_PATCH_SIZE};
use crate::AttentionError;

type EmotionPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// Emotion classifier backed by an ONNX export of a FER-2013 model
/// (input `[1, 48, 48, 1]`, output 7 scores)
pub struct OnnxEmotionClassifier {
    plan: EmotionPlan,
}

impl OnnxEmotionClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AttentionError> {
        let path = path.as_ref();
        info!("Loading emotion model from {}", path.display());

        let shape = [1, FACE_PATCH_SIZE, FACE_PATCH_SIZE, 1];
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact(shape).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                error!("Failed to load emotion model: {}", e);
                AttentionError::ModelLoad(format!("{}: {}", path.display(), e))
            })?;

        Ok(Self { plan })
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&mut self, patch: &FacePatch) -> Result<Emotion, AttentionError> {
        let pixels = patch.pixels();
        let data: Vec<f32> = pixels.iter().copied().collect();
        let input = Tensor::from_shape(pixels.shape(), &data)
            .map_err(|e| AttentionError::Inference(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| AttentionError::Inference(e.to_string()))?;
        let scores = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| AttentionError::Inference(e.to_string()))?;

        let index = argmax(scores.iter().copied())
            .ok_or_else(|| AttentionError::Inference("emotion model returned no scores".into()))?;
        let emotion = Emotion::from_index(index).ok_or_else(|| {
            AttentionError::Inference(format!("emotion index {} outside vocabulary", index))
        })?;
        debug!("Emotion scores argmax {} -> {}", index, emotion);
        Ok(emotion)
    }
}

/// Index of the largest score; NaN never wins
fn argmax(scores: impl Iterator<Item = f32>) -> Option<usize> {
    scores
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_first_maximum() {
        assert_eq!(argmax([0.1, 0.7, 0.2, 0.7].into_iter()), Some(1));
        assert_eq!(argmax([f32::NAN, 0.3].into_iter()), Some(1));
        assert_eq!(argmax(std::iter::empty()), None);
    }

    #[test]
    fn test_missing_model_fails_to_load() {
        let result = OnnxEmotionClassifier::load("/nonexistent/fer_model.onnx");
        assert!(matches!(result, Err(AttentionError::ModelLoad(_))));
    }
}
