//! Private-key loading, signing and signature verification
//!
//! Keys arrive as PEM files. The algorithm is auto-detected: Ed25519 and RSA
//! PKCS#8 documents plus the PKCS#1 form emitted by `openssl genrsa` are
//! accepted. Verification is standalone, against an SPKI DER public key, so
//! a signed document carrying its own public key can be checked without any
//! key distribution.

use std::path::Path;

use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{pkcs1::DecodeRsaPrivateKey, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Signature algorithms sello can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Ed25519,
    RsaPkcs1Sha256,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Ed25519 => "Ed25519",
            SignatureAlgorithm::RsaPkcs1Sha256 => "RSA-PKCS1-SHA256",
        }
    }
}

/// A loaded private key with signing capability
pub enum PrivateKey {
    Ed25519(SigningKey),
    Rsa(Box<RsaPrivateKey>),
}

impl PrivateKey {
    /// Load a private key from a PEM file, detecting the algorithm.
    pub fn load_pem_file(path: &Path) -> Result<Self> {
        let pem = std::fs::read_to_string(path)?;
        Self::from_pem(&pem)
    }

    /// Parse a private key from PEM text.
    ///
    /// Tries Ed25519 PKCS#8, RSA PKCS#8, then RSA PKCS#1 in that order.
    pub fn from_pem(pem: &str) -> Result<Self> {
        if let Ok(key) = SigningKey::from_pkcs8_pem(pem) {
            return Ok(PrivateKey::Ed25519(key));
        }
        if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(pem) {
            return Ok(PrivateKey::Rsa(Box::new(key)));
        }
        if let Ok(key) = RsaPrivateKey::from_pkcs1_pem(pem) {
            return Ok(PrivateKey::Rsa(Box::new(key)));
        }
        Err(Error::KeyError(
            "not a supported Ed25519 or RSA private key PEM".to_string(),
        ))
    }

    /// Generate a fresh Ed25519 key
    pub fn generate_ed25519() -> Self {
        let mut rng = rand::rngs::OsRng;
        PrivateKey::Ed25519(SigningKey::generate(&mut rng))
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            PrivateKey::Ed25519(_) => SignatureAlgorithm::Ed25519,
            PrivateKey::Rsa(_) => SignatureAlgorithm::RsaPkcs1Sha256,
        }
    }

    /// Sign a message. RSA uses PKCS#1 v1.5 over a SHA-256 digest.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        match self {
            PrivateKey::Ed25519(key) => Ok(key.sign(message).to_bytes().to_vec()),
            PrivateKey::Rsa(key) => {
                let mut rng = rand::thread_rng();
                let hashed = Sha256::digest(message);
                key.sign_with_rng(&mut rng, Pkcs1v15Sign::new::<Sha256>(), &hashed)
                    .map_err(|e| Error::SignatureError(format!("RSA signing failed: {e}")))
            }
        }
    }

    /// Export the public key as SPKI DER
    pub fn public_key_spki_der(&self) -> Result<Vec<u8>> {
        let der = match self {
            PrivateKey::Ed25519(key) => key.verifying_key().to_public_key_der()?,
            PrivateKey::Rsa(key) => key.to_public_key().to_public_key_der()?,
        };
        Ok(der.as_bytes().to_vec())
    }

    /// Export the public key as SPKI PEM
    pub fn public_key_spki_pem(&self) -> Result<String> {
        let pem = match self {
            PrivateKey::Ed25519(key) => key.verifying_key().to_public_key_pem(LineEnding::LF)?,
            PrivateKey::Rsa(key) => key.to_public_key().to_public_key_pem(LineEnding::LF)?,
        };
        Ok(pem)
    }

    /// Export the private key as PKCS#8 PEM
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = match self {
            PrivateKey::Ed25519(key) => key.to_pkcs8_pem(LineEnding::LF)?,
            PrivateKey::Rsa(key) => key.to_pkcs8_pem(LineEnding::LF)?,
        };
        Ok(pem.to_string())
    }

    /// SHA-256 fingerprint of the SPKI public key, hex encoded
    pub fn fingerprint_hex(&self) -> Result<String> {
        Ok(spki_sha256_fingerprint(&self.public_key_spki_der()?))
    }
}

/// SHA-256 fingerprint of an SPKI DER public key, hex encoded
pub fn spki_sha256_fingerprint(spki_der: &[u8]) -> String {
    hex::encode(Sha256::digest(spki_der))
}

/// Verify a signature against an SPKI DER public key.
///
/// The key algorithm is detected from the SPKI document. `Ok(false)` means
/// the key parsed but the signature does not match; `Err` means the key
/// itself was unusable.
pub fn verify_signature(spki_der: &[u8], message: &[u8], signature: &[u8]) -> Result<bool> {
    if let Ok(key) = VerifyingKey::from_public_key_der(spki_der) {
        let Ok(bytes) = <[u8; 64]>::try_from(signature) else {
            return Ok(false);
        };
        let sig = ed25519_dalek::Signature::from_bytes(&bytes);
        return Ok(key.verify(message, &sig).is_ok());
    }
    if let Ok(key) = RsaPublicKey::from_public_key_der(spki_der) {
        let hashed = Sha256::digest(message);
        return Ok(key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, signature)
            .is_ok());
    }
    Err(Error::UnsupportedAlgorithm)
}
