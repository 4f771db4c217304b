//! Typed assertions
//!
//! Each assertion is a `{label, data}` pair; the `data` schema is selected
//! by the label, so consumers dispatch on the tag and never assume one
//! shared shape. Serde's adjacent tagging produces exactly that wire form.

use serde::{Deserialize, Serialize};

/// One typed claim inside a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "label", content = "data")]
pub enum Assertion {
    /// Generation flag plus the model/prompt pair, used by sidecar records
    #[serde(rename = "content-type")]
    ContentType {
        generated_by_ai: bool,
        model: String,
        prompt: String,
    },

    /// Ordered action history; marking writes a single `created` action
    #[serde(rename = "actions")]
    Actions { actions: Vec<ActionRecord> },

    /// Digest of the carrier image bytes, computed before any metadata
    /// was written into them
    #[serde(rename = "hash")]
    Hash { alg: String, hash: String },

    /// Authorship and credit
    #[serde(rename = "creative-work")]
    CreativeWork {
        author: String,
        date_created: String,
        credit_text: String,
    },
}

impl Assertion {
    pub fn label(&self) -> &'static str {
        match self {
            Assertion::ContentType { .. } => "content-type",
            Assertion::Actions { .. } => "actions",
            Assertion::Hash { .. } => "hash",
            Assertion::CreativeWork { .. } => "creative-work",
        }
    }
}

/// One entry in an `actions` assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Action kind, e.g. `created`
    pub action: String,
    /// RFC 3339 timestamp
    pub when: String,
    /// The generating model or tool
    pub software_agent: String,
    pub parameters: ActionParameters,
}

/// Parameters attached to an action record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParameters {
    pub prompt: String,
    pub ai_generated: bool,
}
