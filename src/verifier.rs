use crate::config::VerifierConfig;
use crate::detection::SignatureExtractor;
use crate::error::{Result, SignatureError};
use crate::models::{score_percent, Comparison};
use crate::pipeline::prepare_debug_dir;
use crate::scoring::{build_scorer, SimilarityScorer};
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const REFERENCE: &str = "reference";
pub const SAMPLE: &str = "sample";

/// Decode PNG/JPEG/... bytes, guessing the format from the content
pub fn decode_image(bytes: &[u8], input: &str) -> Result<DynamicImage> {
    let decode_error = |source: image::ImageError| SignatureError::Decode {
        input: input.to_string(),
        source,
    };
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)
}

/// Compares a reference signature with a sample using one configured strategy
pub struct Verifier {
    config: VerifierConfig,
    extractor: SignatureExtractor,
    scorer: Arc<dyn SimilarityScorer>,
    debug_dir: Option<PathBuf>,
}

impl Verifier {
    /// Validate the configuration and build the scorer (loads the model, if any)
    pub fn new(config: VerifierConfig) -> Result<Self> {
        config.validate()?;
        let scorer = build_scorer(&config)?;
        Ok(Self::with_scorer(config, scorer))
    }

    /// Use an already constructed scorer
    pub fn with_scorer(config: VerifierConfig, scorer: Arc<dyn SimilarityScorer>) -> Self {
        let extractor = SignatureExtractor::new(config.extraction.clone());
        Self {
            config,
            extractor,
            scorer,
            debug_dir: None,
        }
    }

    /// Dump per-step extraction images under `dir/reference` and `dir/sample`.
    /// The directory must be empty or non-existent; each input directory can be written once
    pub fn with_debug_dir(mut self, dir: PathBuf) -> Result<Self> {
        prepare_debug_dir(&dir)?;
        self.debug_dir = Some(dir);
        Ok(self)
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn verify_bytes(&self, reference: &[u8], sample: &[u8]) -> Result<Comparison> {
        let reference = decode_image(reference, REFERENCE)?;
        let sample = decode_image(sample, SAMPLE)?;
        self.verify_images(&reference, &sample)
    }

    pub fn verify_images(&self, reference: &DynamicImage, sample: &DynamicImage) -> Result<Comparison> {
        let debug_dir = |input: &str| self.debug_dir.as_ref().map(|dir| dir.join(input));
        let reference = self
            .extractor
            .extract_labeled(reference, REFERENCE, debug_dir(REFERENCE))?;
        let sample = self.extractor.extract_labeled(sample, SAMPLE, debug_dir(SAMPLE))?;

        let strategy = self.scorer.strategy();
        let score = self.scorer.score(&reference.image, &sample.image)?;
        let verdict = self.config.thresholds_for(strategy).classify(score);

        let comparison = Comparison {
            id: Uuid::new_v4(),
            strategy,
            score,
            score_percent: score_percent(score),
            verdict,
            label: verdict.label(strategy),
            reference: reference.summary(),
            sample: sample.summary(),
        };

        info!(
            id = %comparison.id,
            strategy = %strategy,
            score = comparison.score_percent,
            verdict = comparison.label,
            "comparison complete"
        );
        Ok(comparison)
    }
}
