mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from sigverify for tests
pub use sigverify::{
    BoundingBox, Comparison, ExtractionConfig, SearchRegion, SignatureError, Strategy, Verdict,
    Verifier, VerifierConfig,
};
