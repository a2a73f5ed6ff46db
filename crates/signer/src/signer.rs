//! Content signing and verification.

use crate::error::{SignerError, SignerResult};
use crate::key::{PublicKey, SecretKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use scout_core::ContentHash;
use sha2::Sha256;

/// SHA-256 of `data`, lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    ContentHash::compute(data).to_hex()
}

/// Signs content bytes with the process key.
///
/// RSASSA-PKCS1-v1_5 over SHA-256 (DigestInfo prefixed), so the output is
/// deterministic for a fixed key and verifies with `openssl dgst -sha256
/// -verify`. Immutable once built; share it behind an `Arc`.
pub struct ContentSigner {
    signing_key: SigningKey<Sha256>,
    public_key: PublicKey,
}

impl ContentSigner {
    /// Create a new signer that owns `secret` for its lifetime.
    pub fn new(secret: SecretKey) -> Self {
        let public_key = secret.public_key();
        let signing_key = SigningKey::<Sha256>::new(secret.rsa_key().clone());
        Self {
            signing_key,
            public_key,
        }
    }

    /// Get the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Sign exactly `data`, with no added framing. Returns the raw signature
    /// as lowercase hex.
    pub fn sign(&self, data: &[u8]) -> SignerResult<String> {
        // The RNG only blinds the private-key operation; PKCS#1 v1.5 output
        // stays deterministic.
        let signature = self
            .signing_key
            .try_sign_with_rng(&mut OsRng, data)
            .map_err(SignerError::Signing)?;
        Ok(hex::encode(signature.to_bytes()))
    }

    /// SHA-256 of `data`, lowercase hex. Does not touch the key.
    pub fn hash(&self, data: &[u8]) -> String {
        sha256_hex(data)
    }
}

impl std::fmt::Debug for ContentSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSigner")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Verify a hex signature over `data` against `public_key`.
pub fn verify(public_key: &PublicKey, data: &[u8], signature_hex: &str) -> SignerResult<()> {
    let sig_bytes = hex::decode(signature_hex)
        .map_err(|e| SignerError::InvalidSignature(format!("invalid hex: {e}")))?;

    let signature = Signature::try_from(sig_bytes.as_slice())
        .map_err(|e| SignerError::InvalidSignature(e.to_string()))?;

    VerifyingKey::<Sha256>::new(public_key.rsa_key().clone())
        .verify(data, &signature)
        .map_err(|_| SignerError::VerificationFailed)
}
