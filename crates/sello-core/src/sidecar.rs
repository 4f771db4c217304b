//! Sidecar manifest files
//!
//! A sidecar is a JSON document living next to its image, at
//! `<base-name>_manifest.json`, carrying the generation flag, model and
//! prompt, plus a copy of the signed manifest when one exists. It is written
//! at mark time, overwritten by a later mark of the same image, and read by
//! the detector's weakest tier. Cleanup belongs to whoever owns the files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    manifest::{Assertion, ProvenanceManifest},
};

/// Filename suffix appended to the image's base name
pub const SIDECAR_SUFFIX: &str = "_manifest.json";

/// Sidecar path for an image path: same directory, extension replaced by
/// the sidecar suffix.
pub fn sidecar_path_for(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    image_path.with_file_name(format!("{stem}{SIDECAR_SUFFIX}"))
}

/// Standalone provenance record co-located with an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarRecord {
    pub ai_generated: bool,
    pub model: String,
    pub prompt: String,
    /// Base file name of the image this record describes
    pub image: String,
    pub assertions: Vec<Assertion>,
    /// Copy of the signed manifest, when the image was marked with one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c2pa_manifest: Option<ProvenanceManifest>,
}

impl SidecarRecord {
    /// Build the record describing a marked image.
    pub fn for_manifest(image_path: &Path, manifest: &ProvenanceManifest) -> Self {
        let model = manifest.model().unwrap_or_default().to_string();
        let prompt = manifest.prompt().unwrap_or_default().to_string();
        Self {
            ai_generated: manifest.ai_generated(),
            model: model.clone(),
            prompt: prompt.clone(),
            image: image_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            assertions: vec![Assertion::ContentType {
                generated_by_ai: manifest.ai_generated(),
                model,
                prompt,
            }],
            c2pa_manifest: Some(manifest.clone()),
        }
    }

    /// Write the record next to the image, replacing any previous one.
    pub fn write_for(&self, image_path: &Path) -> Result<PathBuf> {
        let path = sidecar_path_for(image_path);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Read the record for an image, if one exists. A missing file is
    /// `None`; a file that exists but does not parse is `MalformedSidecar`.
    pub fn read_for(image_path: &Path) -> Result<Option<Self>> {
        let path = sidecar_path_for(image_path);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CoreError::MalformedSidecar(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::ManifestBuilder, signer::sign_manifest};

    #[test]
    fn test_path_convention() {
        assert_eq!(
            sidecar_path_for(Path::new("/tmp/gato1.png")),
            PathBuf::from("/tmp/gato1_manifest.json")
        );
        assert_eq!(
            sidecar_path_for(Path::new("photo.jpeg")),
            PathBuf::from("photo_manifest.json")
        );
    }

    #[test]
    fn test_write_read_round_trip() {
        let manifest = sign_manifest(
            ManifestBuilder::new(b"img")
                .prompt("a cat")
                .model("model-x")
                .build()
                .unwrap(),
            None,
        )
        .unwrap()
        .manifest;

        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("gato1.png");
        let record = SidecarRecord::for_manifest(&image_path, &manifest);
        let written = record.write_for(&image_path).unwrap();
        assert_eq!(written, dir.path().join("gato1_manifest.json"));

        let read = SidecarRecord::read_for(&image_path).unwrap().unwrap();
        assert_eq!(read, record);
        assert!(read.ai_generated);
        assert_eq!(read.assertions.len(), 1);
        assert_eq!(read.assertions[0].label(), "content-type");
    }

    #[test]
    fn test_missing_sidecar_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("nothing.png");
        assert!(SidecarRecord::read_for(&image_path).unwrap().is_none());
    }

    #[test]
    fn test_malformed_sidecar_reported() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("gato1.png");
        std::fs::write(sidecar_path_for(&image_path), "{broken").unwrap();
        assert!(matches!(
            SidecarRecord::read_for(&image_path),
            Err(CoreError::MalformedSidecar(_))
        ));
    }
}
