//! The marking operation
//!
//! Orchestrates the whole write path: build the manifest over the pristine
//! bytes, sign it under the selection policy, embed it into the container,
//! and (for files) drop the sidecar next to the image. Errors here surface
//! directly; unlike detection, a failed mark produces no usable artifact.

use std::path::{Path, PathBuf};

use sello_codec::ImageFormat;
use sello_key::KeyMaterial;
use tracing::info;

use crate::{
    builder::ManifestBuilder,
    embedder::embed_manifest,
    error::{CoreError, Result},
    manifest::ProvenanceManifest,
    sidecar::SidecarRecord,
    signer::{sign_manifest, SigningDowngrade},
};

/// Inputs for marking one image
pub struct MarkRequest<'a> {
    pub image: &'a [u8],
    pub prompt: &'a str,
    pub model: &'a str,
    pub author: &'a str,
    pub key_material: Option<KeyMaterial>,
}

/// A completed mark: the rewritten image plus the claim that went into it
pub struct MarkOutcome {
    pub image: Vec<u8>,
    pub format: ImageFormat,
    pub manifest: ProvenanceManifest,
    /// Set when real signing was unavailable and the integrity stamp was
    /// used instead; callers surface this as a warning
    pub downgrade: Option<SigningDowngrade>,
}

/// Mark an in-memory image.
pub fn mark_image(request: &MarkRequest<'_>) -> Result<MarkOutcome> {
    let format = ImageFormat::sniff(request.image).ok_or(CoreError::UnsupportedFormat)?;

    let unsigned = ManifestBuilder::new(request.image)
        .prompt(request.prompt)
        .model(request.model)
        .author(request.author)
        .build()?;
    let signed = sign_manifest(unsigned, request.key_material.as_ref())?;
    let embedded = embed_manifest(request.image, format, &signed.manifest)?;

    info!(
        format = %format,
        instance_id = %signed.manifest.instance_id,
        "image marked"
    );
    Ok(MarkOutcome {
        image: embedded,
        format,
        manifest: signed.manifest,
        downgrade: signed.downgrade,
    })
}

/// Mark an image file, writing the embedded image to `output` (or back in
/// place) and the sidecar record next to it. Returns the outcome and the
/// sidecar path.
pub fn mark_file(
    input: &Path,
    output: Option<&Path>,
    prompt: &str,
    model: &str,
    author: &str,
    key_material: Option<KeyMaterial>,
) -> Result<(MarkOutcome, PathBuf)> {
    let bytes = std::fs::read(input)?;
    let outcome = mark_image(&MarkRequest {
        image: &bytes,
        prompt,
        model,
        author,
        key_material,
    })?;
    let target = output.unwrap_or(input);
    std::fs::write(target, &outcome.image)?;

    let sidecar = SidecarRecord::for_manifest(target, &outcome.manifest);
    let sidecar_path = sidecar.write_for(target)?;
    Ok((outcome, sidecar_path))
}
