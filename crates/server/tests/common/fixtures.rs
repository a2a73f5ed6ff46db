//! Shared test fixtures.

use scout_signer::{ContentSigner, SecretKey};

/// PKCS#8 test key shared with the signer crate's fixtures.
pub const TEST_KEY_PEM: &str = include_str!("../../../signer/tests/fixtures/test_key.pem");

/// A signer over the fixture key.
pub fn test_signer() -> ContentSigner {
    ContentSigner::new(SecretKey::from_pem(TEST_KEY_PEM).expect("fixture key parses"))
}
