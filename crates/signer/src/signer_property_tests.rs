//! Property-based tests for signing and hashing.

use proptest::prelude::*;
use sha2::{Digest, Sha256};

use crate::key::SecretKey;
use crate::signer::{ContentSigner, sha256_hex, verify};

const TEST_KEY: &str = include_str!("../tests/fixtures/test_key.pem");

fn signer() -> ContentSigner {
    ContentSigner::new(SecretKey::from_pem(TEST_KEY).unwrap())
}

fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn hash_is_lowercase_sha256_hex(data in content_strategy()) {
        let hash = sha256_hex(&data);
        prop_assert_eq!(hash.len(), 64);
        prop_assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        prop_assert_eq!(hash, hex::encode(Sha256::digest(&data)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn signatures_verify_only_for_signed_bytes(data in content_strategy(), extra in any::<u8>()) {
        let signer = signer();
        let sig = signer.sign(&data).unwrap();
        prop_assert_eq!(sig.len(), 512);
        prop_assert!(verify(signer.public_key(), &data, &sig).is_ok());
        prop_assert_eq!(signer.sign(&data).unwrap(), sig.clone());

        let mut tampered = data.clone();
        tampered.push(extra);
        prop_assert!(verify(signer.public_key(), &tampered, &sig).is_err());
    }
}
