use thiserror::Error;

/// Codec error type
#[derive(Error, Debug)]
pub enum Error {
    /// The buffer is neither PNG nor JPEG
    #[error("Unsupported image format")]
    UnsupportedFormat,

    /// PNG structure violation (bad signature, truncated chunk, bad CRC)
    #[error("Corrupt PNG data: {0}")]
    CorruptPng(String),

    /// JPEG structure violation (bad marker sequence, truncated segment)
    #[error("Corrupt JPEG data: {0}")]
    CorruptJpeg(String),

    /// EXIF/TIFF structure violation inside an APP1 segment
    #[error("Corrupt EXIF data: {0}")]
    CorruptExif(String),

    /// Metadata key that cannot be represented in the target container
    #[error("Invalid metadata key: {0}")]
    InvalidKey(String),

    /// Entry exceeds what the container can carry in one segment/chunk
    #[error("Metadata entry too large for container: {0} ({1} bytes)")]
    EntryTooLarge(String, usize),
}

/// Codec result alias
pub type Result<T> = std::result::Result<T, Error>;
