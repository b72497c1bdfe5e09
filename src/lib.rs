pub mod audit;
pub mod classify;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod verifier;

pub use audit::{AuditLog, AuditRecord};
pub use classify::{classify, Thresholds, Verdict};
pub use config::{Canvas, ExtractionConfig, SearchRegion, VerifierConfig};
pub use detection::{extract_signature, SignatureExtractor};
pub use error::{Result, SignatureError};
pub use models::{Comparison, Extraction, ExtractionSummary, SignatureContour};
pub use pipeline::{BoundingBox, MetadataValue, Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use scoring::{score_similarity, SimilarityScorer, Strategy};
pub use verifier::{decode_image, Verifier};
