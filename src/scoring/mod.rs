pub mod ssim;
pub mod orb;
pub mod embedding;

use crate::config::VerifierConfig;
use crate::error::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use embedding::{EmbeddingScorer, RtenTwinModel, SimilarityModel};
pub use orb::OrbScorer;
pub use ssim::SsimScorer;

/// Which similarity backend a verifier uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Structural similarity index
    #[default]
    Ssim,
    /// ORB keypoint match ratio
    Orb,
    /// Twin-branch CNN inference
    Embedding,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Ssim => "ssim",
            Strategy::Orb => "orb",
            Strategy::Embedding => "embedding",
        };
        f.write_str(name)
    }
}

/// A similarity backend. Scores are only comparable within one strategy
pub trait SimilarityScorer: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Score two crops of arbitrary size; higher means more similar
    fn score(&self, a: &DynamicImage, b: &DynamicImage) -> Result<f64>;
}

/// Score `a` against `b` with the given backend
pub fn score_similarity(a: &DynamicImage, b: &DynamicImage, scorer: &dyn SimilarityScorer) -> Result<f64> {
    scorer.score(a, b)
}

/// Build the scorer selected by `config.strategy`.
/// For the embedding strategy this loads the model, once, here
pub fn build_scorer(config: &VerifierConfig) -> Result<Arc<dyn SimilarityScorer>> {
    Ok(match config.strategy {
        Strategy::Ssim => Arc::new(SsimScorer::new(config.ssim.clone())),
        Strategy::Orb => Arc::new(OrbScorer::new(config.orb.clone())),
        Strategy::Embedding => Arc::new(EmbeddingScorer::from_config(&config.embedding)?),
    })
}
