//! Property tests for §8's grant round-trip and nonce-persistence
//! invariants, run over arbitrary grant fields rather than a handful of
//! hand-picked examples.

use allow2_core::Allow2Config;
use allow2_crypto::{CryptoProvider, Ed25519Sha256Provider};
use allow2_grant::{codec, Grant, GrantType, NonceLedger};
use chrono::DateTime;
use proptest::prelude::*;
use std::time::Duration as StdDuration;

fn grant_type_strategy() -> impl Strategy<Value = GrantType> {
    prop_oneof![
        Just(GrantType::Extension),
        Just(GrantType::Quota),
        Just(GrantType::Earlier),
        Just(GrantType::LiftBan),
    ]
}

fn printable_ascii(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(0x20u8..0x7f, 0..max_len)
        .prop_map(|bytes| String::from_utf8(bytes).expect("ascii is valid utf8"))
}

fn grant_strategy() -> impl Strategy<Value = Grant> {
    (
        grant_type_strategy(),
        any::<u64>(),
        any::<u64>(),
        0u16..=480,
        0i64..1_000_000_000,
        1i64..3_600_000,
        printable_ascii(16).prop_filter("nonce must be non-empty", |s| !s.is_empty()),
        printable_ascii(16),
        printable_ascii(8),
    )
        .prop_map(
            |(grant_type, child_id, activity_id, minutes, issued_secs, delta_secs, nonce, device_id, key_id)| {
                Grant {
                    grant_type,
                    child_id,
                    activity_id,
                    minutes,
                    issued_at: DateTime::from_timestamp(issued_secs, 0).unwrap(),
                    expires_at: DateTime::from_timestamp(issued_secs + delta_secs, 0).unwrap(),
                    nonce,
                    device_id,
                    key_id,
                }
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn grant_round_trips_through_generate_and_parse(grant in grant_strategy()) {
        let provider = Ed25519Sha256Provider;
        let config = Allow2Config::default();
        let (sk, vk) = provider.generate_keypair();

        let token = codec::generate(&provider, &config, &grant, &sk, &grant.key_id).unwrap();
        let parsed = codec::parse_and_verify(&provider, &config, &token, &vk).unwrap();

        prop_assert_eq!(parsed, grant);
    }

    #[test]
    fn expiry_and_device_and_child_checks_are_consistent_with_the_fields(
        grant in grant_strategy(),
        other_child in any::<u64>(),
        other_device in printable_ascii(16),
        probe_secs in 0i64..2_000_000_000,
    ) {
        let probe = DateTime::from_timestamp(probe_secs, 0).unwrap();
        prop_assert_eq!(grant.is_expired(probe), probe > grant.expires_at);
        prop_assert!(grant.matches_child(grant.child_id));
        if other_child != grant.child_id {
            prop_assert!(!grant.matches_child(other_child));
        }
        if grant.device_id.is_empty() {
            prop_assert!(grant.matches_device(&other_device));
        } else if other_device != grant.device_id {
            prop_assert!(!grant.matches_device(&other_device));
        }
    }

    #[test]
    fn nonce_ledger_never_forgets_within_the_ttl_window(
        nonces in prop::collection::vec("[a-z0-9]{8,16}", 1..20),
        base_secs in 0i64..1_000_000_000,
    ) {
        let config = Allow2Config::default();
        let mut ledger = NonceLedger::new();
        let base = DateTime::from_timestamp(base_secs, 0).unwrap();

        for (i, nonce) in nonces.iter().enumerate() {
            let seen_at = base + chrono::Duration::seconds(i as i64);
            ledger.record(nonce.clone(), seen_at, &config, StdDuration::ZERO);
        }

        // Every nonce recorded in this short burst is well within
        // `nonce_ttl` (7 days) of the most recent `record` call, so none
        // of them should have been opportunistically GC'd.
        for nonce in &nonces {
            prop_assert!(ledger.contains(nonce));
        }
    }
}
