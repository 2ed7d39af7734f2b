//! Voice-code shared-key derivation
//!
//! `HKDF(ikm = pair_token, salt = pair_id, info = "allow2-voice-v1", len = 32)`
//! per §4.1. Pinned here so `allow2-pairing` and `allow2-voice` derive the
//! identical key from the identical inputs.

use crate::CryptoProvider;
use allow2_core::Result;

const VOICE_KEY_INFO: &[u8] = b"allow2-voice-v1";

/// Derive the 32-byte voice-code HMAC key from the pairing-produced
/// `pair_token`/`pair_id`.
pub fn derive_voice_key(
    provider: &dyn CryptoProvider,
    pair_token: &[u8],
    pair_id: &[u8],
) -> Result<[u8; 32]> {
    let bytes = provider.hkdf(pair_token, pair_id, VOICE_KEY_INFO, 32)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}
