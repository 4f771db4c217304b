//! Manifest signing
//!
//! Two signer implementations behind one capability: `RealSigner` wraps a
//! private key loaded from disk, `SimulatedSigner` produces a deterministic
//! SHA-256 integrity stamp. A single policy function picks between them, so
//! "is a usable key present" is decided in exactly one place. A fall-back
//! from real to simulated never raises; it is recorded on the outcome and
//! logged, and the caller is responsible for surfacing it.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sello_key::{KeyMaterial, PrivateKey};
use tracing::warn;

use crate::{
    error::{CoreError, Result},
    manifest::{
        canonical::{sha256_hex, unsigned_canonical_bytes},
        ProvenanceManifest, SignatureBlock, SignatureKind,
    },
};

/// Issuer recorded when no certificate identifies the signer
const SELF_ISSUED: &str = "self";

/// Why real signing was not used for a given manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningDowngrade {
    /// No private-key path was supplied
    NoKeyConfigured,
    /// The configured path does not name a readable file
    KeyUnreadable(String),
    /// The key file exists but loading or signing with it failed
    SigningFailed(String),
}

impl fmt::Display for SigningDowngrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningDowngrade::NoKeyConfigured => f.write_str("no private key configured"),
            SigningDowngrade::KeyUnreadable(path) => {
                write!(f, "private key not readable: {path}")
            }
            SigningDowngrade::SigningFailed(reason) => {
                write!(f, "real signing failed: {reason}")
            }
        }
    }
}

/// Signing capability over an unsigned manifest
pub trait ManifestSigner {
    fn kind(&self) -> SignatureKind;
    fn sign(&self, manifest: &ProvenanceManifest) -> Result<SignatureBlock>;
}

/// Hash-based integrity stamp, used whenever no real key is usable.
///
/// Deterministic: the same unsigned manifest always yields the same hash.
pub struct SimulatedSigner;

impl ManifestSigner for SimulatedSigner {
    fn kind(&self) -> SignatureKind {
        SignatureKind::Simulated
    }

    fn sign(&self, manifest: &ProvenanceManifest) -> Result<SignatureBlock> {
        let canonical = unsigned_canonical_bytes(manifest)?;
        Ok(SignatureBlock::Simulated {
            hash: sha256_hex(&canonical),
        })
    }
}

/// Cryptographic signer backed by a private key from disk
pub struct RealSigner {
    key: PrivateKey,
    issuer: String,
}

impl RealSigner {
    pub fn new(key: PrivateKey, issuer: impl Into<String>) -> Self {
        Self {
            key,
            issuer: issuer.into(),
        }
    }

    /// Load the private key named by the material. The certificate file, if
    /// any, only contributes the issuer label; chain validation is out of
    /// scope.
    pub fn from_material(material: &KeyMaterial) -> Result<Self> {
        let path = material.private_key_path.as_deref().ok_or_else(|| {
            CoreError::InvalidInput("key material has no private key path".to_string())
        })?;
        let key = PrivateKey::load_pem_file(path)?;
        let issuer = material
            .certificate_path
            .as_deref()
            .and_then(|p| p.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| SELF_ISSUED.to_string());
        Ok(Self::new(key, issuer))
    }
}

impl ManifestSigner for RealSigner {
    fn kind(&self) -> SignatureKind {
        SignatureKind::Real
    }

    fn sign(&self, manifest: &ProvenanceManifest) -> Result<SignatureBlock> {
        let canonical = unsigned_canonical_bytes(manifest)?;
        let signature = self.key.sign(&canonical)?;
        let spki = self.key.public_key_spki_der()?;
        Ok(SignatureBlock::Real {
            alg: self.key.algorithm().as_str().to_string(),
            issuer: self.issuer.clone(),
            key_fingerprint: sello_key::spki_sha256_fingerprint(&spki),
            public_key: BASE64.encode(&spki),
            signature: BASE64.encode(&signature),
        })
    }
}

/// Deterministic signer selection.
///
/// Real signing is attempted only when a private-key path is configured and
/// readable; everything else selects the simulated signer together with the
/// reason for the downgrade.
pub fn select_signer(
    material: Option<&KeyMaterial>,
) -> (Box<dyn ManifestSigner>, Option<SigningDowngrade>) {
    let Some(material) = material else {
        return (Box::new(SimulatedSigner), Some(SigningDowngrade::NoKeyConfigured));
    };
    match &material.private_key_path {
        None => (Box::new(SimulatedSigner), Some(SigningDowngrade::NoKeyConfigured)),
        Some(path) if !material.is_available() => (
            Box::new(SimulatedSigner),
            Some(SigningDowngrade::KeyUnreadable(path.display().to_string())),
        ),
        Some(_) => match RealSigner::from_material(material) {
            Ok(signer) => (Box::new(signer), None),
            Err(e) => (
                Box::new(SimulatedSigner),
                Some(SigningDowngrade::SigningFailed(e.to_string())),
            ),
        },
    }
}

/// Outcome of signing: the signed manifest plus the downgrade record the
/// caller must surface when real signing was unavailable.
pub struct SigningOutcome {
    pub manifest: ProvenanceManifest,
    pub downgrade: Option<SigningDowngrade>,
}

/// Sign an unsigned manifest, falling back to the simulated signer if the
/// real path fails at any point.
pub fn sign_manifest(
    mut manifest: ProvenanceManifest,
    material: Option<&KeyMaterial>,
) -> Result<SigningOutcome> {
    if manifest.is_signed() {
        return Err(CoreError::InvalidInput(
            "manifest is already signed".to_string(),
        ));
    }

    let (signer, mut downgrade) = select_signer(material);
    let block = match signer.sign(&manifest) {
        Ok(block) => block,
        Err(e) if signer.kind() == SignatureKind::Real => {
            downgrade = Some(SigningDowngrade::SigningFailed(e.to_string()));
            SimulatedSigner.sign(&manifest)?
        }
        Err(e) => return Err(e),
    };
    if let Some(reason) = &downgrade {
        warn!(%reason, "falling back to simulated signature");
    }

    manifest.signature = Some(block);
    Ok(SigningOutcome {
        manifest,
        downgrade,
    })
}

/// Parse and re-verify an embedded manifest document.
///
/// The canonical hash is recomputed over the parsed JSON with the signature
/// block removed; a `real` signature is additionally checked against the
/// public key it embeds, including the key fingerprint.
pub fn verify_signed_manifest(raw: &str) -> Result<ProvenanceManifest> {
    let mut value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| CoreError::MalformedManifest(e.to_string()))?;
    let manifest: ProvenanceManifest = serde_json::from_value(value.clone())
        .map_err(|e| CoreError::MalformedManifest(e.to_string()))?;
    let Some(signature) = &manifest.signature else {
        return Err(CoreError::VerificationFailed(
            "manifest carries no signature".to_string(),
        ));
    };

    crate::manifest::canonical::strip_signature(&mut value);
    let canonical = crate::manifest::canonical::canonical_bytes(&value)?;

    match signature {
        SignatureBlock::Simulated { hash } => {
            if sha256_hex(&canonical) != *hash {
                return Err(CoreError::VerificationFailed(
                    "integrity hash mismatch".to_string(),
                ));
            }
        }
        SignatureBlock::Real {
            key_fingerprint,
            public_key,
            signature,
            ..
        } => {
            let spki = BASE64
                .decode(public_key)
                .map_err(|e| CoreError::MalformedManifest(format!("bad public key: {e}")))?;
            if sello_key::spki_sha256_fingerprint(&spki) != *key_fingerprint {
                return Err(CoreError::VerificationFailed(
                    "public key fingerprint mismatch".to_string(),
                ));
            }
            let sig = BASE64
                .decode(signature)
                .map_err(|e| CoreError::MalformedManifest(format!("bad signature: {e}")))?;
            let valid = sello_key::verify_signature(&spki, &canonical, &sig)?;
            if !valid {
                return Err(CoreError::VerificationFailed(
                    "signature does not match manifest".to_string(),
                ));
            }
        }
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ManifestBuilder;

    fn unsigned_manifest() -> ProvenanceManifest {
        ManifestBuilder::new(b"some image bytes")
            .prompt("a cat")
            .model("model-x")
            .timestamp(
                time::Date::from_calendar_date(2026, time::Month::February, 3)
                    .unwrap()
                    .midnight()
                    .assume_utc(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_simulated_signing_is_deterministic() {
        let manifest = unsigned_manifest();
        let first = sign_manifest(manifest.clone(), None).unwrap();
        let second = sign_manifest(manifest, None).unwrap();
        assert_eq!(first.manifest.signature, second.manifest.signature);
        assert_eq!(first.downgrade, Some(SigningDowngrade::NoKeyConfigured));
    }

    #[test]
    fn test_simulated_manifest_verifies() {
        let outcome = sign_manifest(unsigned_manifest(), None).unwrap();
        let json = outcome.manifest.to_canonical_json().unwrap();
        let verified = verify_signed_manifest(&json).unwrap();
        assert_eq!(verified.signature_kind(), Some(SignatureKind::Simulated));
    }

    #[test]
    fn test_tampered_manifest_fails_verification() {
        let outcome = sign_manifest(unsigned_manifest(), None).unwrap();
        let json = outcome.manifest.to_canonical_json().unwrap();
        let tampered = json.replace("a cat", "a dog");
        assert_ne!(json, tampered);
        assert!(matches!(
            verify_signed_manifest(&tampered),
            Err(CoreError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_unsigned_manifest_fails_verification() {
        let json = unsigned_manifest().to_canonical_json().unwrap();
        assert!(matches!(
            verify_signed_manifest(&json),
            Err(CoreError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_garbage_json_is_malformed() {
        assert!(matches!(
            verify_signed_manifest("{not json"),
            Err(CoreError::MalformedManifest(_))
        ));
    }

    #[test]
    fn test_missing_key_file_downgrades() {
        let material = KeyMaterial::new(Some("/no/such/key.pem".into()), None);
        let outcome = sign_manifest(unsigned_manifest(), Some(&material)).unwrap();
        assert_eq!(
            outcome.manifest.signature_kind(),
            Some(SignatureKind::Simulated)
        );
        assert!(matches!(
            outcome.downgrade,
            Some(SigningDowngrade::KeyUnreadable(_))
        ));
    }

    #[test]
    fn test_unparseable_key_downgrades() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(file, "this is not a pem").unwrap();
        let material = KeyMaterial::new(Some(file.path().to_path_buf()), None);

        let outcome = sign_manifest(unsigned_manifest(), Some(&material)).unwrap();
        assert_eq!(
            outcome.manifest.signature_kind(),
            Some(SignatureKind::Simulated)
        );
        assert!(matches!(
            outcome.downgrade,
            Some(SigningDowngrade::SigningFailed(_))
        ));
    }

    #[test]
    fn test_real_signing_with_generated_key() {
        let key = PrivateKey::generate_ed25519();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("private_key.pem");
        std::fs::write(&path, key.to_pkcs8_pem().unwrap()).unwrap();
        let material = KeyMaterial::new(Some(path), None);

        let outcome = sign_manifest(unsigned_manifest(), Some(&material)).unwrap();
        assert!(outcome.downgrade.is_none());
        assert_eq!(outcome.manifest.signature_kind(), Some(SignatureKind::Real));

        let json = outcome.manifest.to_canonical_json().unwrap();
        let verified = verify_signed_manifest(&json).unwrap();
        assert_eq!(verified.signature_kind(), Some(SignatureKind::Real));
    }

    #[test]
    fn test_real_signed_manifest_tamper_detected() {
        let key = PrivateKey::generate_ed25519();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("private_key.pem");
        std::fs::write(&path, key.to_pkcs8_pem().unwrap()).unwrap();
        let material = KeyMaterial::new(Some(path), None);

        let outcome = sign_manifest(unsigned_manifest(), Some(&material)).unwrap();
        let json = outcome.manifest.to_canonical_json().unwrap();
        let tampered = json.replace("model-x", "model-y");
        assert!(matches!(
            verify_signed_manifest(&tampered),
            Err(CoreError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_already_signed_manifest_rejected() {
        let outcome = sign_manifest(unsigned_manifest(), None).unwrap();
        assert!(matches!(
            sign_manifest(outcome.manifest, None),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
