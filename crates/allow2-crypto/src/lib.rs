//! # allow2-crypto — C1 OfflineCrypto
//!
//! Ed25519 keypair generation, signing, and verification; HMAC-SHA256;
//! HKDF key derivation; constant-time comparison. Exposed as a
//! [`CryptoProvider`] capability trait so the rest of the workspace never
//! calls `ed25519-dalek`/`hmac`/`hkdf` directly, and so tests can swap in
//! a deterministic provider.

#![forbid(unsafe_code)]

mod provider;
mod voice_key;

pub use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
pub use provider::{constant_time_eq, CryptoProvider, Ed25519Sha256Provider};
pub use voice_key::derive_voice_key;

#[cfg(any(test, feature = "test-util"))]
pub use provider::TestProvider;
