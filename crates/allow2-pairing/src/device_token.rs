//! Persistent per-device token generation, cached in `SecretStore`.

use allow2_core::secret_store::keys;
use allow2_core::{Result, SecretStore};
use allow2_crypto::CryptoProvider;

/// Fetch the cached device token, generating and persisting a fresh
/// 32-byte (hex-encoded) one on first use.
pub fn get_or_create(store: &dyn SecretStore, crypto: &dyn CryptoProvider) -> Result<String> {
    if let Some(bytes) = store.get(keys::DEVICE_TOKEN)? {
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }
    let token = hex::encode(crypto.random_bytes(32));
    store.put(keys::DEVICE_TOKEN, token.as_bytes())?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use allow2_core::secret_store::test_util::InMemorySecretStore;
    use allow2_crypto::TestProvider;

    #[test]
    fn generates_once_and_caches() {
        let store = InMemorySecretStore::new();
        let crypto = TestProvider::new(0);

        let first = get_or_create(&store, &crypto).unwrap();
        assert_eq!(first.len(), 64); // 32 bytes, hex-encoded

        let crypto2 = TestProvider::new(99); // would differ if regenerated
        let second = get_or_create(&store, &crypto2).unwrap();
        assert_eq!(first, second);
    }
}
