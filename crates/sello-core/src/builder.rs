//! Manifest construction
//!
//! Builds the unsigned claim document from the image bytes plus the caller's
//! prompt/model/author description of how the image came to be. The content
//! digest is taken over the bytes exactly as supplied, before any metadata
//! is embedded, so the hash assertion always refers to the pristine image.

use sello_codec::ImageFormat;
use sha2::{Digest, Sha256};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    error::{CoreError, Result},
    manifest::{
        ActionParameters, ActionRecord, Assertion, ProvenanceManifest, SignatureInfo,
        ACTION_CREATED, CLAIM_GENERATOR,
    },
};

/// Digest-prefix length used for instance ids
const INSTANCE_ID_HEX_LEN: usize = 32;

/// Fallback MIME type when the buffer is not a recognized container
const OCTET_STREAM: &str = "application/octet-stream";

/// Builder for unsigned provenance manifests
pub struct ManifestBuilder<'a> {
    image: &'a [u8],
    prompt: String,
    model: String,
    author: String,
    title: String,
    timestamp: OffsetDateTime,
}

impl<'a> ManifestBuilder<'a> {
    /// Start a manifest for the given image bytes. The builder never
    /// mutates or copies the buffer; it is only hashed.
    pub fn new(image: &'a [u8]) -> Self {
        Self {
            image,
            prompt: String::new(),
            model: String::new(),
            author: String::new(),
            title: "AI-generated image".to_string(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Override the claim timestamp (defaults to now). Fixing the timestamp
    /// makes building reproducible.
    pub fn timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Validate inputs and produce the unsigned manifest.
    ///
    /// Assertion order is fixed (hash, actions, creative-work) and is part
    /// of the signed payload.
    pub fn build(self) -> Result<ProvenanceManifest> {
        if self.image.is_empty() {
            return Err(CoreError::InvalidInput("image bytes are empty".to_string()));
        }
        if self.prompt.trim().is_empty() && self.model.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "at least one of prompt or model must be non-empty".to_string(),
            ));
        }

        let digest = hex::encode(Sha256::digest(self.image));
        let when = self.timestamp.format(&Rfc3339)?;
        let format = ImageFormat::sniff(self.image)
            .map(|f| f.mime().to_string())
            .unwrap_or_else(|| OCTET_STREAM.to_string());
        let author = if self.author.trim().is_empty() {
            CLAIM_GENERATOR.to_string()
        } else {
            self.author
        };

        let assertions = vec![
            Assertion::Hash {
                alg: "sha256".to_string(),
                hash: digest.clone(),
            },
            Assertion::Actions {
                actions: vec![ActionRecord {
                    action: ACTION_CREATED.to_string(),
                    when: when.clone(),
                    software_agent: self.model.clone(),
                    parameters: ActionParameters {
                        prompt: self.prompt.clone(),
                        ai_generated: true,
                    },
                }],
            },
            Assertion::CreativeWork {
                author: author.clone(),
                date_created: when.clone(),
                credit_text: format!("AI-generated image ({})", CLAIM_GENERATOR),
            },
        ];

        Ok(ProvenanceManifest {
            claim_generator: CLAIM_GENERATOR.to_string(),
            title: self.title,
            format,
            instance_id: format!("xmp:iid:{}", &digest[..INSTANCE_ID_HEX_LEN]),
            assertions,
            signature_info: SignatureInfo {
                alg: "sha256".to_string(),
                issuer: author,
                time: when,
            },
            signature: None,
        })
    }
}
