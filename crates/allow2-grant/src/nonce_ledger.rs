//! C3 NonceLedger — persistent set of consumed nonces with TTL eviction (§4.3)

use allow2_core::secret_store::keys;
use allow2_core::{Allow2Config, Result, SecretStore};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration as StdDuration;

/// `(nonce, first_seen)` bookkeeping for anti-replay.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct NonceLedger {
    entries: HashMap<String, DateTime<Utc>>,
}

impl NonceLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `nonce` has already been recorded.
    pub fn contains(&self, nonce: &str) -> bool {
        self.entries.contains_key(nonce)
    }

    /// Record `nonce` as consumed at `seen_at`. Per §4.3, callers must call
    /// this in the same critical section as verification succeeds and
    /// before any side effect (deficit update, time grant) is applied.
    ///
    /// GC runs opportunistically on every call, pruning anything older than
    /// `config.gc_threshold(grant_ttl)`: `now - max(grant_ttl, nonce_ttl)`.
    /// Pass `Duration::ZERO` for `grant_ttl` when the caller's wire format
    /// carries no TTL of its own (e.g. voice codes), which falls back to
    /// `nonce_ttl` alone.
    pub fn record(
        &mut self,
        nonce: impl Into<String>,
        seen_at: DateTime<Utc>,
        config: &Allow2Config,
        grant_ttl: StdDuration,
    ) {
        self.entries.insert(nonce.into(), seen_at);
        if let Ok(threshold) = ChronoDuration::from_std(config.gc_threshold(grant_ttl)) {
            self.gc(seen_at - threshold);
        }
    }

    /// Prune entries whose `first_seen` is strictly before `before`.
    pub fn gc(&mut self, before: DateTime<Utc>) {
        self.entries.retain(|_, first_seen| *first_seen >= before);
    }

    /// Number of nonces currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no nonces are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load the ledger from `store`, defaulting to empty if absent.
    pub fn load_from(store: &dyn SecretStore) -> Result<Self> {
        match store.get(keys::NONCE_LEDGER)? {
            Some(bytes) => Ok(serde_cbor::from_slice(&bytes)
                .map_err(|e| allow2_core::Allow2Error::storage(e.to_string()))?),
            None => Ok(Self::new()),
        }
    }

    /// Persist the ledger to `store`.
    pub fn save_to(&self, store: &dyn SecretStore) -> Result<()> {
        let bytes = serde_cbor::to_vec(self)
            .map_err(|e| allow2_core::Allow2Error::storage(e.to_string()))?;
        store.put(keys::NONCE_LEDGER, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allow2_core::secret_store::test_util::InMemorySecretStore;
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn record_then_contains_until_gc_past_ttl() {
        let config = Allow2Config::default();
        let mut ledger = NonceLedger::new();
        ledger.record("n1", at(1_000), &config, StdDuration::ZERO);
        assert!(ledger.contains("n1"));

        ledger.gc(at(1_000)); // not yet past first_seen
        assert!(ledger.contains("n1"));

        let ttl = Duration::days(7);
        ledger.gc(at(1_000) + ttl + Duration::seconds(1));
        assert!(!ledger.contains("n1"));
    }

    #[test]
    fn gc_only_removes_entries_older_than_threshold() {
        let config = Allow2Config::default();
        let mut ledger = NonceLedger::new();
        ledger.record("old", at(1_000), &config, StdDuration::ZERO);
        ledger.record("new", at(2_000), &config, StdDuration::ZERO);

        ledger.gc(at(1_500));

        assert!(!ledger.contains("old"));
        assert!(ledger.contains("new"));
    }

    #[test]
    fn record_opportunistically_gcs_entries_older_than_the_configured_ttl() {
        let config = Allow2Config {
            nonce_ttl: StdDuration::from_secs(100),
            ..Allow2Config::default()
        };
        let mut ledger = NonceLedger::new();
        ledger.record("old", at(0), &config, StdDuration::ZERO);
        assert!(ledger.contains("old"));

        // Recording a second nonce far enough past `nonce_ttl` sweeps the
        // first one without an explicit `gc` call.
        ledger.record("new", at(500), &config, StdDuration::ZERO);

        assert!(!ledger.contains("old"));
        assert!(ledger.contains("new"));
    }

    #[test]
    fn record_uses_grant_ttl_when_it_exceeds_nonce_ttl() {
        let config = Allow2Config {
            nonce_ttl: StdDuration::from_secs(100),
            ..Allow2Config::default()
        };
        let mut ledger = NonceLedger::new();
        ledger.record("old", at(0), &config, StdDuration::ZERO);

        // grant_ttl of 1000s exceeds nonce_ttl, so the larger window wins
        // and `old` survives.
        ledger.record("new", at(500), &config, StdDuration::from_secs(1_000));

        assert!(ledger.contains("old"));
        assert!(ledger.contains("new"));
    }

    #[test]
    fn persists_round_trip_through_secret_store() {
        let store = InMemorySecretStore::new();
        let config = Allow2Config::default();
        let mut ledger = NonceLedger::new();
        ledger.record("n1", at(1_000), &config, StdDuration::ZERO);
        ledger.save_to(&store).unwrap();

        let reloaded = NonceLedger::load_from(&store).unwrap();
        assert!(reloaded.contains("n1"));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn missing_store_entry_loads_as_empty() {
        let store = InMemorySecretStore::new();
        let ledger = NonceLedger::load_from(&store).unwrap();
        assert!(ledger.is_empty());
    }
}
