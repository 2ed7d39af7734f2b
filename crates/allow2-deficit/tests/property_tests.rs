//! Property tests for the deficit-saturation invariant of §8: the ledger
//! never exceeds `deficit_ceiling_sec` regardless of how the additions are
//! sequenced, and `is_exceeded` agrees with the ceiling exactly.

use allow2_core::Allow2Config;
use allow2_deficit::DeficitLedger;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn never_exceeds_the_ceiling_regardless_of_addition_order(
        additions in prop::collection::vec(0i32..5_000, 1..20),
    ) {
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        for amount in additions {
            ledger.add(&config, 1, amount);
            prop_assert!(ledger.get(1) <= config.deficit_ceiling_sec);
        }
    }

    #[test]
    fn is_exceeded_agrees_with_the_ceiling_comparison(
        additions in prop::collection::vec(0i32..5_000, 1..20),
    ) {
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        for amount in additions {
            ledger.add(&config, 1, amount);
        }
        prop_assert_eq!(ledger.is_exceeded(&config, 1), ledger.get(1) >= config.deficit_ceiling_sec);
    }

    #[test]
    fn apply_never_produces_a_negative_remaining(
        owed in 0i32..3_000,
        remaining in -1_000i32..10_000,
    ) {
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        ledger.add(&config, 1, owed);
        prop_assert!(ledger.apply(1, remaining) >= 0);
    }

    #[test]
    fn apply_does_not_mutate_the_ledger(
        owed in 0i32..3_000,
        remaining in 0i32..10_000,
    ) {
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        ledger.add(&config, 1, owed);
        let before = ledger.get(1);
        let _ = ledger.apply(1, remaining);
        prop_assert_eq!(ledger.get(1), before);
    }

    #[test]
    fn clear_always_resets_to_zero_and_not_exceeded(owed in 0i32..5_000) {
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        ledger.add(&config, 1, owed);
        ledger.clear(1);
        prop_assert_eq!(ledger.get(1), 0);
        prop_assert!(!ledger.is_exceeded(&config, 1));
    }
}
