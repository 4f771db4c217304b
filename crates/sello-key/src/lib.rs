//! Sello Key Library
//!
//! Loading and use of signing key material: filesystem-sourced key paths,
//! PKCS#8/PKCS#1 PEM parsing with algorithm auto-detection, message signing
//! and standalone signature verification against SPKI public keys.

pub mod error;
pub mod material;
pub mod signing;

pub use error::{Error, Result};
pub use material::{KeyMaterial, CERTIFICATE_ENV, PRIVATE_KEY_ENV};
pub use signing::{spki_sha256_fingerprint, verify_signature, PrivateKey, SignatureAlgorithm};
