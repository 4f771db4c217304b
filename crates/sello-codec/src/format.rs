//! Image format detection by container signature

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{jpeg::JpegCodec, png::PngCodec, ImageCodec};

/// PNG file signature (8 bytes)
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// JPEG SOI marker followed by another marker prefix
const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Supported image container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Detect the container format from leading bytes.
    ///
    /// Detection is independent of any file extension; `None` means the
    /// buffer is not a container this crate can handle.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= PNG_SIGNATURE.len() && bytes[..PNG_SIGNATURE.len()] == PNG_SIGNATURE {
            Some(ImageFormat::Png)
        } else if bytes.len() >= JPEG_SIGNATURE.len()
            && bytes[..JPEG_SIGNATURE.len()] == JPEG_SIGNATURE
        {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }

    /// MIME type for the format
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Short lowercase name ("png", "jpeg")
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// The metadata codec for this format
    pub fn codec(&self) -> &'static dyn ImageCodec {
        match self {
            ImageFormat::Png => &PngCodec,
            ImageFormat::Jpeg => &JpegCodec,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
