//! Sello Core Library
//!
//! Provenance claims for raster images: building a structured manifest over
//! an image's bytes, signing it (cryptographically when key material is
//! available, with a deterministic integrity stamp otherwise), embedding it
//! into PNG or JPEG metadata, and, symmetrically, recovering and
//! classifying provenance signals from images of unknown origin.
//!
//! ## Modules
//!
//! - `manifest` - the claim document, assertions and canonical form
//! - `builder` - construction of unsigned manifests
//! - `signer` - signing policy, real and simulated signers, verification
//! - `embedder` - format-dispatched metadata embedding
//! - `sidecar` - detached companion records
//! - `detector` - the three-tier classification pipeline
//! - `marker` - the end-to-end marking operation

pub mod builder;
pub mod detector;
pub mod embedder;
pub mod error;
pub mod manifest;
pub mod marker;
pub mod sidecar;
pub mod signer;

// Re-export commonly used types
pub use builder::ManifestBuilder;
pub use detector::{classify_bytes, classify_path, DetectionResult, DetectionSource};
pub use embedder::embed_manifest;
pub use error::{CoreError, Result};
pub use manifest::{
    ActionParameters, ActionRecord, Assertion, ProvenanceManifest, SignatureBlock, SignatureInfo,
    SignatureKind, CLAIM_GENERATOR, MANIFEST_VERSION,
};
pub use marker::{mark_file, mark_image, MarkOutcome, MarkRequest};
pub use sidecar::{sidecar_path_for, SidecarRecord, SIDECAR_SUFFIX};
pub use signer::{
    select_signer, sign_manifest, verify_signed_manifest, ManifestSigner, RealSigner,
    SigningDowngrade, SigningOutcome, SimulatedSigner,
};

// The codec's format type is part of this crate's public surface
pub use sello_codec::ImageFormat;
