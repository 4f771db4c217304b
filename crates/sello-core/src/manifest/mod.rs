//! Provenance manifest model
//!
//! The manifest is the authoritative claim document about how an image was
//! produced. It exists in two states: unsigned (no `signature` field) and
//! signed (exactly one signature block). Any
//! mutation after signing is detectable by re-verification because signing
//! covers the canonical serialization of everything except the signature
//! itself.

pub mod assertion;
pub mod canonical;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use assertion::{ActionParameters, ActionRecord, Assertion};

use crate::error::Result;

/// Tool identity recorded in `claim_generator`
pub const CLAIM_GENERATOR: &str = concat!("sello/", env!("CARGO_PKG_VERSION"));

/// Manifest layout version written alongside embedded manifests
pub const MANIFEST_VERSION: &str = "1.0";

/// The action label for generation
pub const ACTION_CREATED: &str = "created";

/// Structured provenance claim document.
///
/// `assertions` is order-significant: canonicalization serializes the vector
/// as-is, so consumers must never reorder it before hashing or verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceManifest {
    pub claim_generator: String,
    pub title: String,
    /// MIME type of the carrier image
    pub format: String,
    /// Derived from a prefix of the content digest
    pub instance_id: String,
    pub assertions: Vec<Assertion>,
    pub signature_info: SignatureInfo,
    /// Appended by the signer; absent on the unsigned form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlock>,
}

/// Declared signing parameters, present before any signature exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub alg: String,
    pub issuer: String,
    pub time: String,
}

/// The signature appended by the signer.
///
/// Which variant gets used is a signer-policy decision; callers cannot pick
/// one after the fact. A `simulated` signature is an integrity stamp only;
/// it proves the manifest was not altered after signing, not who signed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignatureBlock {
    Simulated {
        /// SHA-256 hex of the canonical unsigned serialization
        hash: String,
    },
    Real {
        alg: String,
        issuer: String,
        /// SHA-256 hex of the SPKI public key
        key_fingerprint: String,
        /// Base64 SPKI DER, embedded so verification is self-contained
        public_key: String,
        /// Base64 signature bytes
        signature: String,
    },
}

impl SignatureBlock {
    pub fn kind(&self) -> SignatureKind {
        match self {
            SignatureBlock::Simulated { .. } => SignatureKind::Simulated,
            SignatureBlock::Real { .. } => SignatureKind::Real,
        }
    }
}

/// Simulated-vs-real distinction, kept visible all the way to detection
/// results so a hash stamp is never presented as a cryptographic signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureKind {
    Simulated,
    Real,
}

impl fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureKind::Simulated => f.write_str("simulated"),
            SignatureKind::Real => f.write_str("real"),
        }
    }
}

impl ProvenanceManifest {
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn signature_kind(&self) -> Option<SignatureKind> {
        self.signature.as_ref().map(SignatureBlock::kind)
    }

    /// Hex digest from the `hash` assertion, if present
    pub fn content_hash(&self) -> Option<&str> {
        self.assertions.iter().find_map(|a| match a {
            Assertion::Hash { hash, .. } => Some(hash.as_str()),
            _ => None,
        })
    }

    /// Prompt recorded in the first generation action
    pub fn prompt(&self) -> Option<&str> {
        self.assertions.iter().find_map(|a| match a {
            Assertion::Actions { actions } => actions
                .first()
                .map(|record| record.parameters.prompt.as_str()),
            _ => None,
        })
    }

    /// Software agent recorded in the first generation action
    pub fn model(&self) -> Option<&str> {
        self.assertions.iter().find_map(|a| match a {
            Assertion::Actions { actions } => {
                actions.first().map(|record| record.software_agent.as_str())
            }
            _ => None,
        })
    }

    /// Whether any assertion claims AI generation
    pub fn ai_generated(&self) -> bool {
        self.assertions.iter().any(|a| match a {
            Assertion::Actions { actions } => {
                actions.iter().any(|record| record.parameters.ai_generated)
            }
            Assertion::ContentType {
                generated_by_ai, ..
            } => *generated_by_ai,
            _ => false,
        })
    }

    /// Canonical JSON of the full manifest (signature included), the form
    /// embedded into image metadata.
    pub fn to_canonical_json(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        canonical::canonical_string(&value)
    }
}
