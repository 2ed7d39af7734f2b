//! `Credentials` — the long-lived identity a successful pairing produces.

use allow2_core::secret_store::keys;
use allow2_core::{Result, SecretStore};
use serde::{Deserialize, Serialize};

/// `(user_id, pair_id, pair_token)` persisted encrypted in `SecretStore`.
/// Cleared only on a remote 401, never by direct user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The parent account's identifier.
    pub user_id: String,
    /// Opaque pairing identifier, used as the HKDF salt for the voice key.
    pub pair_id: String,
    /// Long-lived bearer token for this device/parent pairing.
    pub pair_token: String,
}

impl Credentials {
    /// Load persisted credentials, if a device has ever completed pairing.
    pub fn load_from(store: &dyn SecretStore) -> Result<Option<Self>> {
        match store.get(keys::CREDENTIALS)? {
            Some(bytes) => Ok(Some(
                serde_cbor::from_slice(&bytes)
                    .map_err(|e| allow2_core::Allow2Error::storage(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Persist these credentials.
    pub fn save_to(&self, store: &dyn SecretStore) -> Result<()> {
        let bytes = serde_cbor::to_vec(self)
            .map_err(|e| allow2_core::Allow2Error::storage(e.to_string()))?;
        store.put(keys::CREDENTIALS, &bytes)
    }

    /// Clear persisted credentials, e.g. on a remote 401.
    pub fn clear(store: &dyn SecretStore) -> Result<()> {
        store.delete(keys::CREDENTIALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allow2_core::secret_store::test_util::InMemorySecretStore;

    #[test]
    fn round_trips_through_a_store() {
        let store = InMemorySecretStore::new();
        assert_eq!(Credentials::load_from(&store).unwrap(), None);

        let creds = Credentials {
            user_id: "u1".into(),
            pair_id: "p1".into(),
            pair_token: "tok".into(),
        };
        creds.save_to(&store).unwrap();
        assert_eq!(Credentials::load_from(&store).unwrap(), Some(creds));
    }

    #[test]
    fn clear_removes_the_entry() {
        let store = InMemorySecretStore::new();
        let creds = Credentials {
            user_id: "u1".into(),
            pair_id: "p1".into(),
            pair_token: "tok".into(),
        };
        creds.save_to(&store).unwrap();
        Credentials::clear(&store).unwrap();
        assert_eq!(Credentials::load_from(&store).unwrap(), None);
    }
}
