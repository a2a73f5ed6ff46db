//! RSA key types and operations.

use crate::error::{SignerError, SignerResult};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::path::Path;

/// Smallest modulus accepted without a warning.
pub const RECOMMENDED_MIN_BITS: usize = 2048;

/// The process signing key.
pub struct SecretKey {
    inner: RsaPrivateKey,
}

impl SecretKey {
    /// Generate a new random key with a modulus of `bits` bits.
    pub fn generate(bits: usize) -> SignerResult<Self> {
        let mut rng = rand_core::OsRng;
        let inner = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|source| SignerError::KeyGeneration { bits, source })?;
        Ok(Self::from_rsa(inner))
    }

    /// Parse a PEM private key: PKCS#8 (`BEGIN PRIVATE KEY`) or
    /// PKCS#1 (`BEGIN RSA PRIVATE KEY`).
    pub fn from_pem(pem: &str) -> SignerResult<Self> {
        let pem = pem.trim();
        let inner = match RsaPrivateKey::from_pkcs8_pem(pem) {
            Ok(key) => key,
            Err(pkcs8_err) => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|pkcs1_err| {
                SignerError::KeyParsing(format!(
                    "not a PKCS#8 ({pkcs8_err}) or PKCS#1 ({pkcs1_err}) RSA private key"
                ))
            })?,
        };
        Ok(Self::from_rsa(inner))
    }

    /// Read and parse a PEM private key file.
    pub fn from_pem_file(path: &Path) -> SignerResult<Self> {
        let pem = std::fs::read_to_string(path).map_err(|source| SignerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(&pem)
    }

    fn from_rsa(inner: RsaPrivateKey) -> Self {
        let bits = inner.size() * 8;
        if bits < RECOMMENDED_MIN_BITS {
            tracing::warn!(bits, "RSA signing key is shorter than {RECOMMENDED_MIN_BITS} bits");
        }
        Self { inner }
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.inner.size() * 8
    }

    /// Get the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.inner.to_public_key(),
        }
    }

    pub(crate) fn rsa_key(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({} bits, [REDACTED])", self.bits())
    }
}

/// Public half of the signing key, handed to clients for verification.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    /// Parse a PEM public key: SPKI (`BEGIN PUBLIC KEY`) or PKCS#1
    /// (`BEGIN RSA PUBLIC KEY`).
    pub fn from_pem(pem: &str) -> SignerResult<Self> {
        let pem = pem.trim();
        let inner = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| SignerError::KeyParsing(format!("invalid RSA public key: {e}")))?;
        Ok(Self { inner })
    }

    /// Encode as an SPKI PEM document.
    pub fn to_pem(&self) -> SignerResult<String> {
        self.inner
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| SignerError::KeyEncoding(e.to_string()))
    }

    /// SHA-256 of the SPKI DER encoding, lowercase hex.
    pub fn fingerprint(&self) -> SignerResult<String> {
        let der = self
            .inner
            .to_public_key_der()
            .map_err(|e| SignerError::KeyEncoding(e.to_string()))?;
        Ok(crate::sha256_hex(der.as_bytes()))
    }

    pub(crate) fn rsa_key(&self) -> &RsaPublicKey {
        &self.inner
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fingerprint() {
            Ok(fp) => write!(f, "PublicKey({}...)", &fp[..16]),
            Err(_) => write!(f, "PublicKey(<unencodable>)"),
        }
    }
}
