use thiserror::Error;

/// Errors produced while extracting, scoring or classifying signatures
#[derive(Error, Debug)]
pub enum SignatureError {
    /// Input bytes are not a supported or intact image
    #[error("Failed to decode {input} image: {source}")]
    Decode {
        input: String,
        #[source]
        source: image::ImageError,
    },

    /// No usable foreground region and the search-region fallback is disabled
    #[error("No signature detected in {input} image")]
    NoSignatureDetected { input: String },

    /// Scoring backend (model, runtime) is not ready
    #[error("Scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl SignatureError {
    /// Whether the failure was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SignatureError::Decode { .. } | SignatureError::NoSignatureDetected { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SignatureError>;
