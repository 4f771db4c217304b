//! Canonical JSON serialization
//!
//! Signing and verification must agree byte-for-byte on what was signed.
//! The canonical form is serde_json's compact output over a `Value` tree:
//! object keys sorted (the default `Value` map is a `BTreeMap`), no
//! whitespace, UTF-8. Array order is preserved, which is what makes the
//! assertion sequence order-significant.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{
    error::Result,
    manifest::ProvenanceManifest,
};

/// Canonical compact bytes of a JSON value
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Canonical compact string of a JSON value
pub fn canonical_string(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Remove the top-level signature block, in place
pub fn strip_signature(value: &mut Value) {
    if let Value::Object(map) = value {
        map.remove("signature");
    }
}

/// Canonical bytes of a manifest with its signature block excluded. This is
/// the exact payload covered by both signature variants.
pub fn unsigned_canonical_bytes(manifest: &ProvenanceManifest) -> Result<Vec<u8>> {
    let mut value = serde_json::to_value(manifest)?;
    strip_signature(&mut value);
    canonical_bytes(&value)
}

/// SHA-256 digest, hex encoded
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
