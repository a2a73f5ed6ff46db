//! Signer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Key loading and signing errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("failed to generate {bits}-bit RSA key: {source}")]
    KeyGeneration {
        bits: usize,
        #[source]
        source: rsa::Error,
    },

    #[error("key parsing error: {0}")]
    KeyParsing(String),

    #[error("key encoding error: {0}")]
    KeyEncoding(String),

    #[error("signing error: {0}")]
    Signing(#[source] rsa::signature::Error),

    #[error("verification failed")]
    VerificationFailed,

    #[error("invalid signature format: {0}")]
    InvalidSignature(String),

    #[error("failed to read key file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for signing operations.
pub type SignerResult<T> = std::result::Result<T, SignerError>;
