use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Required input is missing or empty; the caller corrects and retries
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The image is neither PNG nor JPEG; embed/detect must not be attempted
    #[error("Unsupported image format")]
    UnsupportedFormat,

    /// Manifest present but its hash/signature does not check out
    #[error("Manifest verification failed: {0}")]
    VerificationFailed(String),

    /// Manifest JSON present but not parseable into the expected shape
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    /// Sidecar JSON present but not parseable
    #[error("Malformed sidecar: {0}")]
    MalformedSidecar(String),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(#[from] sello_codec::Error),

    /// Key error
    #[error("Key error: {0}")]
    Key(#[from] sello_key::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Time formatting error
    #[error("Time formatting error: {0}")]
    TimeFormat(#[from] time::error::Format),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Core result alias
pub type Result<T> = std::result::Result<T, CoreError>;
