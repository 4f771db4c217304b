//! # Sello
//!
//! Provenance marking and detection for AI-generated raster images.
//!
//! ## Modules
//!
//! - `sello_codec` - PNG/JPEG metadata codecs
//! - `sello_key` - key material and signing primitives
//! - `sello_core` - manifests, signing policy, embedding and detection
//! - `sello-cli` - command line tool

// Re-export all sub-crates
pub use sello_codec;
pub use sello_core;
pub use sello_key;
