//! `SecretStore` — the opaque encrypted key-value collaborator of §6.
//!
//! The core never implements at-rest encryption itself; this trait is the
//! seam a browser-host integration plugs into. An in-memory fake is
//! provided behind `test-util` for the core's own tests.

use crate::Result;

/// Keys the offline core writes to / reads from the store, per §6.
pub mod keys {
    /// Encrypted `Credentials` struct.
    pub const CREDENTIALS: &str = "allow2.credentials";
    /// Persistent per-device token (32 random bytes, hex-encoded).
    pub const DEVICE_TOKEN: &str = "allow2.device_token";
    /// Human-readable device name used at pairing time.
    pub const DEVICE_NAME: &str = "allow2.device_name";
    /// Timestamp the device was paired at.
    pub const PAIRED_AT: &str = "allow2.paired_at";
    /// Configured home IANA timezone identifier.
    pub const HOME_TZ: &str = "allow2.home_tz";
    /// Serialized `NonceLedger`.
    pub const NONCE_LEDGER: &str = "allow2.nonce_ledger";
    /// Serialized `DeficitLedger`.
    pub const DEFICITS: &str = "allow2.deficits";
    /// Derived voice-code shared key.
    pub const VOICE_KEY: &str = "allow2.voice_key";
}

/// Externally synchronized encrypted key-value storage. Implementations
/// must serialize their own access so only one read/write per key is
/// outstanding at a time (§5).
pub trait SecretStore: Send + Sync {
    /// Fetch the bytes stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Durably write `value` under `key`.
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    /// Remove `key`, if present.
    fn delete(&self, key: &str) -> Result<()>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    //! In-memory `SecretStore` fake for unit and integration tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A `SecretStore` backed by a `Mutex<HashMap>`, never touching disk.
    #[derive(Default)]
    pub struct InMemorySecretStore {
        inner: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl InMemorySecretStore {
        /// Construct an empty store.
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl SecretStore for InMemorySecretStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.inner.lock().unwrap().get(key).cloned())
        }

        fn put(&self, key: &str, value: &[u8]) -> Result<()> {
            self.inner
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.inner.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[test]
    fn round_trips_a_value() {
        let store = InMemorySecretStore::new();
        store.put("k", b"v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
