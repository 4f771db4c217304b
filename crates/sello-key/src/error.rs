use thiserror::Error;

/// Key handling error type
#[derive(Error, Debug)]
pub enum Error {
    /// Key material could not be loaded or parsed
    #[error("Key error: {0}")]
    KeyError(String),

    /// Signing or verification failed
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// The key algorithm is not one this crate can sign with
    #[error("Unsupported key algorithm")]
    UnsupportedAlgorithm,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// PKCS8 error
    #[error("PKCS8 error: {0}")]
    Pkcs8Error(#[from] pkcs8::Error),

    /// SPKI error
    #[error("SPKI error: {0}")]
    SpkiError(#[from] pkcs8::spki::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
