use crate::config::{Canvas, EmbeddingConfig};
use crate::detection::preprocessing;
use crate::error::{Result, SignatureError};
use crate::scoring::{SimilarityScorer, Strategy};
use image::DynamicImage;
use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::Tensor;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A two-branch network producing a similarity in [0, 1] for a pair of canvases.
/// Inputs are row-major single-channel pixels scaled to [0, 1]
pub trait SimilarityModel: Send + Sync {
    fn infer(&self, a: &[f32], b: &[f32], canvas: Canvas) -> Result<f32>;
}

/// Twin-branch model in `.rten` format with two NHWC `[1, H, W, 1]` inputs
pub struct RtenTwinModel {
    model: Model,
}

impl RtenTwinModel {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SignatureError::ScoringUnavailable(format!(
                "model not found: {}",
                path.display()
            )));
        }

        let model = Model::load_file(path).map_err(|e| {
            SignatureError::ScoringUnavailable(format!("failed to load {}: {}", path.display(), e))
        })?;
        if model.input_ids().len() != 2 {
            return Err(SignatureError::ScoringUnavailable(format!(
                "expected a model with 2 inputs, {} has {}",
                path.display(),
                model.input_ids().len()
            )));
        }

        info!(model = %path.display(), "loaded twin-branch model");
        Ok(Self { model })
    }
}

impl SimilarityModel for RtenTwinModel {
    fn infer(&self, a: &[f32], b: &[f32], canvas: Canvas) -> Result<f32> {
        let shape = [1, canvas.height as usize, canvas.width as usize, 1];
        let input_a = Tensor::from_data(&shape[..], a.to_vec());
        let input_b = Tensor::from_data(&shape[..], b.to_vec());

        let input_ids = self.model.input_ids();
        let output_id = *self
            .model
            .output_ids()
            .first()
            .ok_or_else(|| SignatureError::ScoringUnavailable("model has no outputs".to_string()))?;

        let mut outputs = self
            .model
            .run(
                vec![
                    (input_ids[0], input_a.view().into()),
                    (input_ids[1], input_b.view().into()),
                ],
                &[output_id],
                None,
            )
            .map_err(|e| SignatureError::ScoringUnavailable(format!("inference failed: {}", e)))?;

        let output: Tensor<f32> = outputs.remove(0).try_into().map_err(|e| {
            SignatureError::ScoringUnavailable(format!("unexpected model output: {:?}", e))
        })?;
        output
            .iter()
            .next()
            .copied()
            .ok_or_else(|| SignatureError::ScoringUnavailable("model returned an empty tensor".to_string()))
    }
}

/// Learned-embedding scorer; the model is shared read-only between calls
#[derive(Clone)]
pub struct EmbeddingScorer {
    model: Arc<dyn SimilarityModel>,
    canvas: Canvas,
}

impl EmbeddingScorer {
    pub fn new(model: Arc<dyn SimilarityModel>, canvas: Canvas) -> Self {
        Self { model, canvas }
    }

    /// Load the model named by the configuration
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let path = config.model_path.as_deref().ok_or_else(|| {
            SignatureError::ScoringUnavailable("embedding strategy needs a model_path".to_string())
        })?;
        let model = RtenTwinModel::load(path)?;
        Ok(Self::new(Arc::new(model), config.canvas))
    }

    /// Single-channel canvas scaled to [0, 1]
    pub fn preprocess(&self, img: &DynamicImage) -> Vec<f32> {
        preprocessing::gray_canvas(img, self.canvas)
            .pixels()
            .map(|p| p[0] as f32 / 255.0)
            .collect()
    }
}

impl SimilarityScorer for EmbeddingScorer {
    fn strategy(&self) -> Strategy {
        Strategy::Embedding
    }

    fn score(&self, a: &DynamicImage, b: &DynamicImage) -> Result<f64> {
        let input_a = self.preprocess(a);
        let input_b = self.preprocess(b);
        let raw = self.model.infer(&input_a, &input_b, self.canvas)?;
        if !raw.is_finite() {
            return Err(SignatureError::ScoringUnavailable(format!(
                "model produced a non-finite score: {}",
                raw
            )));
        }
        Ok(raw.clamp(0.0, 1.0) as f64)
    }
}
