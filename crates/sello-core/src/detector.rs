//! Provenance detection and signal resolution
//!
//! An arbitrary image can carry up to three independent provenance signals:
//! an embedded structured manifest, flat metadata tags, and a detached
//! sidecar file. They are consulted in trust order (a verified manifest
//! beats an unverified flat string, which beats a file that may have been
//! separated from its image) and the first match wins. The tier table below
//! is that policy, spelled out as data so the ordering stays auditable.
//!
//! Nothing in this path is fatal: malformed or unverifiable signals demote
//! to the next tier, and a fully silent image classifies as `source: none`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use sello_codec::ImageFormat;
use tracing::debug;

use crate::{
    embedder::{
        FLAT_SUMMARY_PREFIX, JPEG_TAG_DESCRIPTION, JPEG_TAG_SOFTWARE, JPEG_TAG_USER_COMMENT,
        PNG_KEY_GENERATED, PNG_KEY_MANIFEST, PNG_KEY_SIGNED, PNG_KEY_VERSION,
    },
    manifest::{ProvenanceManifest, SignatureKind},
    sidecar::SidecarRecord,
    signer::verify_signed_manifest,
};

/// Which signal source produced the classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionSource {
    EmbeddedManifest,
    FlatTag,
    SidecarFile,
    None,
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionSource::EmbeddedManifest => "embedded-manifest",
            DetectionSource::FlatTag => "flat-tag",
            DetectionSource::SidecarFile => "sidecar-file",
            DetectionSource::None => "none",
        };
        f.write_str(name)
    }
}

/// Classification result for one image
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    /// Image file name, when classification started from a path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
    pub ai_generated: bool,
    pub source: DetectionSource,
    /// Source-specific flattened key/value view
    pub details: BTreeMap<String, String>,
    /// Present only when `source` is the embedded manifest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_manifest: Option<ProvenanceManifest>,
    /// Keeps the simulated-vs-real distinction visible to callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_kind: Option<SignatureKind>,
}

impl DetectionResult {
    fn absent(image: Option<String>) -> Self {
        Self {
            image,
            exists: false,
            format: None,
            ai_generated: false,
            source: DetectionSource::None,
            details: BTreeMap::new(),
            raw_manifest: None,
            signature_kind: None,
        }
    }
}

struct DetectionContext<'a> {
    metadata: &'a BTreeMap<String, String>,
    format: Option<ImageFormat>,
    path: Option<&'a Path>,
}

struct TierMatch {
    source: DetectionSource,
    ai_generated: bool,
    details: BTreeMap<String, String>,
    raw_manifest: Option<ProvenanceManifest>,
    signature_kind: Option<SignatureKind>,
}

type Tier = fn(&DetectionContext<'_>) -> Option<TierMatch>;

/// Precedence pipeline, strongest evidence first. Evaluation short-circuits
/// on the first tier that matches.
const TIERS: &[Tier] = &[tier_embedded_manifest, tier_flat_tag, tier_sidecar];

/// Tier 1: a structured manifest that passes re-verification.
///
/// A manifest that is present but malformed or fails its hash/signature
/// check does not match; the pipeline falls through instead of aborting.
fn tier_embedded_manifest(ctx: &DetectionContext<'_>) -> Option<TierMatch> {
    let raw = ctx
        .metadata
        .get(PNG_KEY_MANIFEST)
        .or_else(|| ctx.metadata.get(JPEG_TAG_USER_COMMENT))?;
    match verify_signed_manifest(raw) {
        Ok(manifest) => {
            let mut details = BTreeMap::new();
            details.insert("claim_generator".to_string(), manifest.claim_generator.clone());
            details.insert("title".to_string(), manifest.title.clone());
            details.insert("instance_id".to_string(), manifest.instance_id.clone());
            if let Some(model) = manifest.model() {
                details.insert("model".to_string(), model.to_string());
            }
            if let Some(prompt) = manifest.prompt() {
                details.insert("prompt".to_string(), prompt.to_string());
            }
            if let Some(kind) = manifest.signature_kind() {
                details.insert("signature".to_string(), kind.to_string());
            }
            Some(TierMatch {
                source: DetectionSource::EmbeddedManifest,
                ai_generated: manifest.ai_generated(),
                details,
                signature_kind: manifest.signature_kind(),
                raw_manifest: Some(manifest),
            })
        }
        Err(e) => {
            debug!(error = %e, "embedded manifest rejected, falling through");
            None
        }
    }
}

/// Tier 2: an affirmative flat tag. PNG uses the `AI-Generated` key; JPEG,
/// having no keyed slots, uses the summary prefix in ImageDescription.
fn tier_flat_tag(ctx: &DetectionContext<'_>) -> Option<TierMatch> {
    let affirmative = match ctx.format {
        Some(ImageFormat::Jpeg) => ctx
            .metadata
            .get(JPEG_TAG_DESCRIPTION)
            .is_some_and(|d| d.starts_with(FLAT_SUMMARY_PREFIX)),
        _ => ctx
            .metadata
            .get(PNG_KEY_GENERATED)
            .is_some_and(|v| v.eq_ignore_ascii_case("true")),
    };
    if !affirmative {
        return None;
    }

    let details = ctx
        .metadata
        .iter()
        .filter(|(key, _)| {
            key.starts_with("AI-")
                || key.as_str() == PNG_KEY_VERSION
                || key.as_str() == PNG_KEY_SIGNED
                || key.as_str() == JPEG_TAG_DESCRIPTION
                || key.as_str() == JPEG_TAG_SOFTWARE
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Some(TierMatch {
        source: DetectionSource::FlatTag,
        ai_generated: true,
        details,
        raw_manifest: None,
        signature_kind: None,
    })
}

/// Tier 3: a sidecar file found by naming convention. Weakest signal; a
/// missing, malformed or negative sidecar does not match.
fn tier_sidecar(ctx: &DetectionContext<'_>) -> Option<TierMatch> {
    let path = ctx.path?;
    match SidecarRecord::read_for(path) {
        Ok(Some(record)) if record.ai_generated => {
            let mut details = BTreeMap::new();
            details.insert("model".to_string(), record.model.clone());
            details.insert("prompt".to_string(), record.prompt.clone());
            details.insert("image".to_string(), record.image.clone());
            Some(TierMatch {
                source: DetectionSource::SidecarFile,
                ai_generated: true,
                details,
                raw_manifest: None,
                signature_kind: None,
            })
        }
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "sidecar rejected, falling through");
            None
        }
    }
}

/// Classify an image on disk, consulting all three tiers.
pub fn classify_path(path: &Path) -> DetectionResult {
    let image = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, path = %path.display(), "image not readable");
            return DetectionResult::absent(image);
        }
    };
    classify_inner(&bytes, Some(path), image)
}

/// Classify an in-memory image. Without a path there is no sidecar to look
/// up, so only the embedded-manifest and flat-tag tiers apply.
pub fn classify_bytes(bytes: &[u8]) -> DetectionResult {
    classify_inner(bytes, None, None)
}

fn classify_inner(bytes: &[u8], path: Option<&Path>, image: Option<String>) -> DetectionResult {
    let format = ImageFormat::sniff(bytes);
    let metadata = match format {
        Some(format) => format.codec().read_metadata(bytes).unwrap_or_else(|e| {
            debug!(error = %e, "unreadable metadata treated as empty");
            BTreeMap::new()
        }),
        None => BTreeMap::new(),
    };

    let ctx = DetectionContext {
        metadata: &metadata,
        format,
        path,
    };
    for tier in TIERS {
        if let Some(matched) = tier(&ctx) {
            return DetectionResult {
                image,
                exists: true,
                format,
                ai_generated: matched.ai_generated,
                source: matched.source,
                details: matched.details,
                raw_manifest: matched.raw_manifest,
                signature_kind: matched.signature_kind,
            };
        }
    }
    DetectionResult {
        image,
        exists: true,
        format,
        ai_generated: false,
        source: DetectionSource::None,
        details: BTreeMap::new(),
        raw_manifest: None,
        signature_kind: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::ManifestBuilder, signer::sign_manifest};

    fn signed_manifest_json() -> String {
        let unsigned = ManifestBuilder::new(b"some image")
            .prompt("a cat")
            .model("model-x")
            .build()
            .unwrap();
        sign_manifest(unsigned, None)
            .unwrap()
            .manifest
            .to_canonical_json()
            .unwrap()
    }

    fn ctx<'a>(
        metadata: &'a BTreeMap<String, String>,
        format: Option<ImageFormat>,
    ) -> DetectionContext<'a> {
        DetectionContext {
            metadata,
            format,
            path: None,
        }
    }

    #[test]
    fn test_tier_order_is_trust_order() {
        // A map carrying both a valid manifest and a flat tag must resolve
        // to the manifest tier.
        let mut metadata = BTreeMap::new();
        metadata.insert(PNG_KEY_MANIFEST.to_string(), signed_manifest_json());
        metadata.insert(PNG_KEY_GENERATED.to_string(), "true".to_string());

        let context = ctx(&metadata, Some(ImageFormat::Png));
        let matched = TIERS.iter().find_map(|tier| tier(&context)).unwrap();
        assert_eq!(matched.source, DetectionSource::EmbeddedManifest);
        assert!(matched.raw_manifest.is_some());
        assert_eq!(matched.signature_kind, Some(SignatureKind::Simulated));
    }

    #[test]
    fn test_invalid_manifest_falls_through_to_flat_tag() {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            PNG_KEY_MANIFEST.to_string(),
            signed_manifest_json().replace("a cat", "a dog"),
        );
        metadata.insert(PNG_KEY_GENERATED.to_string(), "true".to_string());

        let context = ctx(&metadata, Some(ImageFormat::Png));
        let matched = TIERS.iter().find_map(|tier| tier(&context)).unwrap();
        assert_eq!(matched.source, DetectionSource::FlatTag);
        assert!(matched.raw_manifest.is_none());
    }

    #[test]
    fn test_jpeg_flat_tag_uses_description_prefix() {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            JPEG_TAG_DESCRIPTION.to_string(),
            "AI-generated image | model: m | prompt: p".to_string(),
        );
        let context = ctx(&metadata, Some(ImageFormat::Jpeg));
        let matched = tier_flat_tag(&context).unwrap();
        assert_eq!(matched.source, DetectionSource::FlatTag);

        // An ordinary description is not affirmative.
        let mut metadata = BTreeMap::new();
        metadata.insert(
            JPEG_TAG_DESCRIPTION.to_string(),
            "holiday photo".to_string(),
        );
        assert!(tier_flat_tag(&ctx(&metadata, Some(ImageFormat::Jpeg))).is_none());
    }

    #[test]
    fn test_negative_flat_tag_does_not_match() {
        let mut metadata = BTreeMap::new();
        metadata.insert(PNG_KEY_GENERATED.to_string(), "false".to_string());
        assert!(tier_flat_tag(&ctx(&metadata, Some(ImageFormat::Png))).is_none());
    }

    #[test]
    fn test_classify_bytes_on_garbage() {
        let result = classify_bytes(b"definitely not an image");
        assert!(result.exists);
        assert_eq!(result.format, None);
        assert!(!result.ai_generated);
        assert_eq!(result.source, DetectionSource::None);
    }

    #[test]
    fn test_classify_missing_path() {
        let result = classify_path(Path::new("/no/such/image.png"));
        assert!(!result.exists);
        assert_eq!(result.source, DetectionSource::None);
        assert_eq!(result.image.as_deref(), Some("image.png"));
    }

    #[test]
    fn test_flat_tag_details_filtered() {
        let mut metadata = BTreeMap::new();
        metadata.insert(PNG_KEY_GENERATED.to_string(), "true".to_string());
        metadata.insert("AI-Model".to_string(), "model-x".to_string());
        metadata.insert("Unrelated".to_string(), "noise".to_string());

        let matched = tier_flat_tag(&ctx(&metadata, Some(ImageFormat::Png))).unwrap();
        assert!(matched.details.contains_key("AI-Model"));
        assert!(!matched.details.contains_key("Unrelated"));
    }
}
