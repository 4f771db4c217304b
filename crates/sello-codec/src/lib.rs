//! Sello Codec Library
//!
//! Byte-level read/write of flat string-keyed metadata for the image
//! containers sello supports: PNG textual chunks and JPEG EXIF tags. The
//! codecs are structural transforms over caller-supplied byte buffers; pixel
//! data (PNG IDAT, the JPEG entropy-coded stream) is copied verbatim and
//! never decoded.

pub mod error;
pub mod exif;
pub mod format;
pub mod jpeg;
pub mod png;

use std::collections::BTreeMap;

pub use error::{Error, Result};
pub use format::ImageFormat;
pub use jpeg::JpegCodec;
pub use png::PngCodec;

/// Per-format metadata codec.
///
/// `read_metadata` returns every recognizable textual entry in the container.
/// `write_metadata` re-encodes the container with `entries` inserted,
/// overwriting same-named entries and preserving everything else.
pub trait ImageCodec {
    fn read_metadata(&self, bytes: &[u8]) -> Result<BTreeMap<String, String>>;
    fn write_metadata(
        &self,
        bytes: &[u8],
        entries: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>>;
}

/// Read metadata from an image buffer of any supported format.
///
/// An unrecognized format is an empty result, not an error: callers probing
/// arbitrary bytes must be able to treat "nothing there" uniformly.
pub fn read_metadata(bytes: &[u8]) -> Result<BTreeMap<String, String>> {
    match ImageFormat::sniff(bytes) {
        Some(format) => format.codec().read_metadata(bytes),
        None => Ok(BTreeMap::new()),
    }
}

/// Write metadata entries into an image buffer of any supported format.
///
/// Unlike reads, writes to an unrecognized format fail hard: there is no
/// container to carry the entries.
pub fn write_metadata(bytes: &[u8], entries: &BTreeMap<String, String>) -> Result<Vec<u8>> {
    let format = ImageFormat::sniff(bytes).ok_or(Error::UnsupportedFormat)?;
    format.codec().write_metadata(bytes, entries)
}
