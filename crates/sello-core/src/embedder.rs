//! Manifest embedding
//!
//! Translates a signed manifest into the flat entries each container can
//! hold. PNG has arbitrary keyed text chunks, so it carries both the flat
//! summary keys and the full manifest under its own key. JPEG EXIF exposes
//! only a handful of fixed slots: the flat summary goes into
//! ImageDescription/Software and the full manifest into UserComment, the one
//! tag with no length-sensitive semantics. The detector leans on this
//! asymmetry rather than hiding it.

use std::collections::BTreeMap;

use sello_codec::ImageFormat;

use crate::{
    error::{CoreError, Result},
    manifest::{ProvenanceManifest, MANIFEST_VERSION},
};

/// PNG flat summary keys
pub const PNG_KEY_GENERATED: &str = "AI-Generated";
pub const PNG_KEY_MODEL: &str = "AI-Model";
pub const PNG_KEY_PROMPT: &str = "AI-Prompt";

/// PNG structured manifest keys
pub const PNG_KEY_MANIFEST: &str = "C2PA-Manifest";
pub const PNG_KEY_VERSION: &str = "C2PA-Version";
pub const PNG_KEY_SIGNED: &str = "C2PA-Signed";

/// JPEG EXIF tag names (as exposed by the codec)
pub const JPEG_TAG_DESCRIPTION: &str = "ImageDescription";
pub const JPEG_TAG_SOFTWARE: &str = "Software";
pub const JPEG_TAG_USER_COMMENT: &str = "UserComment";

/// Leading text of the JPEG flat summary; the detector's flat-tag tier
/// checks for this prefix
pub const FLAT_SUMMARY_PREFIX: &str = "AI-generated image";

/// Human-readable one-line summary for containers without keyed slots
pub fn flat_summary(manifest: &ProvenanceManifest) -> String {
    format!(
        "{} | model: {} | prompt: {}",
        FLAT_SUMMARY_PREFIX,
        manifest.model().unwrap_or_default(),
        manifest.prompt().unwrap_or_default()
    )
}

/// Embed a signed manifest into the image, dispatching on format.
///
/// The transform is metadata-only; pixel data passes through untouched.
pub fn embed_manifest(
    bytes: &[u8],
    format: ImageFormat,
    manifest: &ProvenanceManifest,
) -> Result<Vec<u8>> {
    if !manifest.is_signed() {
        return Err(CoreError::InvalidInput(
            "only signed manifests can be embedded".to_string(),
        ));
    }
    let manifest_json = manifest.to_canonical_json()?;

    let mut entries = BTreeMap::new();
    match format {
        ImageFormat::Png => {
            entries.insert(PNG_KEY_GENERATED.to_string(), "true".to_string());
            entries.insert(
                PNG_KEY_MODEL.to_string(),
                manifest.model().unwrap_or_default().to_string(),
            );
            entries.insert(
                PNG_KEY_PROMPT.to_string(),
                manifest.prompt().unwrap_or_default().to_string(),
            );
            entries.insert(PNG_KEY_MANIFEST.to_string(), manifest_json);
            entries.insert(PNG_KEY_VERSION.to_string(), MANIFEST_VERSION.to_string());
            entries.insert(PNG_KEY_SIGNED.to_string(), "true".to_string());
        }
        ImageFormat::Jpeg => {
            entries.insert(JPEG_TAG_DESCRIPTION.to_string(), flat_summary(manifest));
            entries.insert(
                JPEG_TAG_SOFTWARE.to_string(),
                manifest.claim_generator.clone(),
            );
            entries.insert(JPEG_TAG_USER_COMMENT.to_string(), manifest_json);
        }
    }

    Ok(format.codec().write_metadata(bytes, &entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::ManifestBuilder, signer::sign_manifest};

    fn signed_manifest(image: &[u8]) -> ProvenanceManifest {
        let unsigned = ManifestBuilder::new(image)
            .prompt("a cat")
            .model("model-x")
            .build()
            .unwrap();
        sign_manifest(unsigned, None).unwrap().manifest
    }

    #[test]
    fn test_unsigned_manifest_rejected() {
        let unsigned = ManifestBuilder::new(b"img")
            .prompt("p")
            .build()
            .unwrap();
        let result = embed_manifest(b"img", ImageFormat::Png, &unsigned);
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_flat_summary_shape() {
        let manifest = signed_manifest(b"img");
        assert_eq!(
            flat_summary(&manifest),
            "AI-generated image | model: model-x | prompt: a cat"
        );
    }

    #[test]
    fn test_png_embed_requires_png_structure() {
        // A signed manifest plus a buffer that is not a PNG: the codec
        // refuses rather than fabricating a container.
        let manifest = signed_manifest(b"not a png");
        assert!(embed_manifest(b"not a png", ImageFormat::Png, &manifest).is_err());
    }
}
