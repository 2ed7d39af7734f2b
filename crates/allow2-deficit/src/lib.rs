//! # allow2-deficit — C5 DeficitLedger
//!
//! Per-child borrowed-time accounting with a hard ceiling (§4.5). Every
//! operation is idempotent for identical inputs except `add`, which is
//! additive and saturates at `Allow2Config::deficit_ceiling_sec`.

#![forbid(unsafe_code)]

use allow2_core::secret_store::keys;
use allow2_core::{Allow2Config, ChildId, Result, SecretStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-child seconds-owed ledger.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DeficitLedger {
    owed: HashMap<ChildId, i32>,
}

impl DeficitLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds currently owed for `child`, `0` if never recorded.
    pub fn get(&self, child: ChildId) -> i32 {
        *self.owed.get(&child).unwrap_or(&0)
    }

    /// Add `seconds` to `child`'s deficit, saturating at `config.deficit_ceiling_sec`.
    pub fn add(&mut self, config: &Allow2Config, child: ChildId, seconds: i32) {
        let current = self.get(child);
        let next = current.saturating_add(seconds).min(config.deficit_ceiling_sec);
        self.owed.insert(child, next);
        tracing::debug!(child_id = child, seconds, next, "deficit added");
    }

    /// Zero `child`'s deficit (server sync or parent forgiveness).
    pub fn clear(&mut self, child: ChildId) {
        self.owed.remove(&child);
    }

    /// `max(0, remaining - deficit)` without mutating the ledger.
    pub fn apply(&self, child: ChildId, remaining: i32) -> i32 {
        (remaining - self.get(child)).max(0)
    }

    /// `true` iff `child`'s deficit is at or past the ceiling.
    pub fn is_exceeded(&self, config: &Allow2Config, child: ChildId) -> bool {
        self.get(child) >= config.deficit_ceiling_sec
    }

    /// Load the ledger from `store`, defaulting to empty if absent.
    pub fn load_from(store: &dyn SecretStore) -> Result<Self> {
        match store.get(keys::DEFICITS)? {
            Some(bytes) => Ok(serde_cbor::from_slice(&bytes)
                .map_err(|e| allow2_core::Allow2Error::storage(e.to_string()))?),
            None => Ok(Self::new()),
        }
    }

    /// Persist the ledger to `store`.
    pub fn save_to(&self, store: &dyn SecretStore) -> Result<()> {
        let bytes = serde_cbor::to_vec(self)
            .map_err(|e| allow2_core::Allow2Error::storage(e.to_string()))?;
        store.put(keys::DEFICITS, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allow2_core::secret_store::test_util::InMemorySecretStore;

    #[test]
    fn saturates_at_the_ceiling() {
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        ledger.add(&config, 42, 1200);
        ledger.add(&config, 42, 1200);

        assert_eq!(ledger.get(42), 1800);
        assert!(ledger.is_exceeded(&config, 42));
        assert_eq!(ledger.apply(42, 600), 0);
    }

    #[test]
    fn apply_is_pure() {
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        ledger.add(&config, 1, 300);

        assert_eq!(ledger.apply(1, 1000), 700);
        assert_eq!(ledger.apply(1, 1000), 700); // unchanged by the read
        assert_eq!(ledger.get(1), 300);
    }

    #[test]
    fn clear_is_idempotent() {
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        ledger.add(&config, 1, 500);
        ledger.clear(1);
        ledger.clear(1);

        assert_eq!(ledger.get(1), 0);
        assert!(!ledger.is_exceeded(&config, 1));
    }

    #[test]
    fn not_exceeded_below_ceiling() {
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        ledger.add(&config, 1, 1799);
        assert!(!ledger.is_exceeded(&config, 1));
        ledger.add(&config, 1, 1);
        assert!(ledger.is_exceeded(&config, 1));
    }

    #[test]
    fn persists_round_trip_through_secret_store() {
        let store = InMemorySecretStore::new();
        let config = Allow2Config::default();
        let mut ledger = DeficitLedger::new();
        ledger.add(&config, 7, 200);
        ledger.save_to(&store).unwrap();

        let reloaded = DeficitLedger::load_from(&store).unwrap();
        assert_eq!(reloaded.get(7), 200);
    }
}
