//! Property tests for the voice-code drift tolerance of §8: approval codes
//! validate within the configured drift window and are rejected outside it,
//! for arbitrary keys, codes, and clock offsets rather than fixed examples.

use allow2_crypto::{CryptoProvider, Ed25519Sha256Provider};
use allow2_voice::{generate_approval_code, validate_approval_code};
use proptest::prelude::*;

const BUCKET_SEC: i64 = 30;
const DRIFT: i64 = 1;

fn request_code_strategy() -> impl Strategy<Value = String> {
    "[0-9]{6}"
}

fn key_strategy() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn validates_within_the_configured_drift_window(
        key in key_strategy(),
        codes in prop::collection::vec(request_code_strategy(), 1..4),
        base_unix in 0i64..2_000_000_000,
        offset_secs in -(BUCKET_SEC * DRIFT)..=(BUCKET_SEC * DRIFT),
    ) {
        let provider = Ed25519Sha256Provider;
        let base = base_unix - (base_unix % BUCKET_SEC);
        let approval = generate_approval_code(&provider, &key, &codes, base, BUCKET_SEC);

        let result = validate_approval_code(
            &provider,
            &key,
            &codes,
            &approval,
            base + offset_secs,
            BUCKET_SEC,
            DRIFT,
        );
        prop_assert!(result.is_ok());
    }

    #[test]
    fn rejects_drift_strictly_beyond_the_window(
        key in key_strategy(),
        codes in prop::collection::vec(request_code_strategy(), 1..4),
        base_unix in 0i64..2_000_000_000,
        extra_buckets in 2i64..10,
    ) {
        let provider = Ed25519Sha256Provider;
        let base = base_unix - (base_unix % BUCKET_SEC);
        let approval = generate_approval_code(&provider, &key, &codes, base, BUCKET_SEC);

        let result = validate_approval_code(
            &provider,
            &key,
            &codes,
            &approval,
            base + extra_buckets * BUCKET_SEC,
            BUCKET_SEC,
            DRIFT,
        );
        prop_assert!(result.is_err());
    }

    #[test]
    fn approval_code_is_insensitive_to_request_code_order(
        key in key_strategy(),
        codes in prop::collection::vec(request_code_strategy(), 2..5),
        base_unix in 0i64..2_000_000_000,
    ) {
        let provider = Ed25519Sha256Provider;
        let base = base_unix - (base_unix % BUCKET_SEC);
        let mut reversed = codes.clone();
        reversed.reverse();

        let a = generate_approval_code(&provider, &key, &codes, base, BUCKET_SEC);
        let b = generate_approval_code(&provider, &key, &reversed, base, BUCKET_SEC);
        prop_assert_eq!(a, b);
    }
}
