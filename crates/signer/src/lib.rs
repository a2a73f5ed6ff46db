//! Content signing for the scout content server.
//!
//! This crate provides:
//! - RSA private key loading (PKCS#8 or PKCS#1 PEM) and generation
//! - RSASSA-PKCS1-v1_5 / SHA-256 signatures over content bytes, hex encoded
//! - SHA-256 content hashes, and signature verification for clients and tests

pub mod error;
pub mod key;
pub mod signer;

#[cfg(test)]
mod signer_property_tests;

pub use error::{SignerError, SignerResult};
pub use key::{PublicKey, SecretKey};
pub use signer::{ContentSigner, sha256_hex, verify};
