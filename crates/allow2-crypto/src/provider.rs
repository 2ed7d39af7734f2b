//! `CryptoProvider` — capability interface over cryptographic primitives
//!
//! Generalizing over the primitive implementation (rather than calling
//! `ed25519_dalek`/`hmac` directly everywhere) lets the test suite swap in
//! a deterministic variant seeded by the harness, per the design note
//! "Polymorphism over crypto primitives".

use allow2_core::{Allow2Error, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Capability surface C1 exposes to every other component: key generation,
/// signing and verification, HMAC, HKDF, and secure randomness.
pub trait CryptoProvider: Send + Sync {
    /// Generate a fresh Ed25519 keypair.
    fn generate_keypair(&self) -> (SigningKey, VerifyingKey);
    /// Sign `msg` with `signing`.
    fn sign(&self, signing: &SigningKey, msg: &[u8]) -> Signature;
    /// Verify `sig` over `msg` under `verifying`. Never panics on malformed
    /// input; returns a typed error instead.
    fn verify(&self, verifying: &VerifyingKey, msg: &[u8], sig: &Signature) -> Result<()>;
    /// HMAC-SHA256 of `msg` under `key`.
    fn hmac_sha256(&self, key: &[u8], msg: &[u8]) -> [u8; 32];
    /// HKDF-SHA256 extract-then-expand of `ikm`, with the given `salt` and
    /// `info`, to `len` bytes.
    fn hkdf(&self, ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> Result<Vec<u8>>;
    /// `n` bytes of cryptographically secure randomness.
    fn random_bytes(&self, n: usize) -> Vec<u8>;
}

/// Constant-time byte-slice equality. All verifications and MAC
/// comparisons in this workspace must route through this function rather
/// than `==`, per §4.1.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Default production provider: Ed25519 (`ed25519-dalek`) + HMAC-SHA256 +
/// HKDF-SHA256, backed by the OS RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Sha256Provider;

impl CryptoProvider for Ed25519Sha256Provider {
    fn generate_keypair(&self) -> (SigningKey, VerifyingKey) {
        let signing = SigningKey::generate(&mut rand::rngs::OsRng);
        let verifying = signing.verifying_key();
        (signing, verifying)
    }

    fn sign(&self, signing: &SigningKey, msg: &[u8]) -> Signature {
        signing.sign(msg)
    }

    fn verify(&self, verifying: &VerifyingKey, msg: &[u8], sig: &Signature) -> Result<()> {
        verifying
            .verify(msg, sig)
            .map_err(|_| Allow2Error::BadSignature)
    }

    fn hmac_sha256(&self, key: &[u8], msg: &[u8]) -> [u8; 32] {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
        mac.update(msg);
        mac.finalize().into_bytes().into()
    }

    fn hkdf(&self, ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> Result<Vec<u8>> {
        let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
        let mut out = vec![0u8; len];
        hk.expand(info, &mut out)
            .map_err(|e| Allow2Error::invalid(format!("HKDF expand failed: {e}")))?;
        Ok(out)
    }

    fn random_bytes(&self, n: usize) -> Vec<u8> {
        use rand::RngCore;
        let mut buf = vec![0u8; n];
        rand::rngs::OsRng.fill_bytes(&mut buf);
        buf
    }
}

/// Deterministic test provider: signing/HMAC/HKDF are identical to the
/// production provider (the primitives themselves are not mocked — only
/// randomness is), but `random_bytes` is driven by a seeded counter so
/// tests are reproducible.
#[cfg(any(test, feature = "test-util"))]
pub struct TestProvider {
    counter: std::sync::atomic::AtomicU64,
}

#[cfg(any(test, feature = "test-util"))]
impl Default for TestProvider {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(any(test, feature = "test-util"))]
impl TestProvider {
    /// Construct a test provider whose `random_bytes` stream starts at `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            counter: std::sync::atomic::AtomicU64::new(seed),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl CryptoProvider for TestProvider {
    fn generate_keypair(&self) -> (SigningKey, VerifyingKey) {
        Ed25519Sha256Provider.generate_keypair()
    }

    fn sign(&self, signing: &SigningKey, msg: &[u8]) -> Signature {
        Ed25519Sha256Provider.sign(signing, msg)
    }

    fn verify(&self, verifying: &VerifyingKey, msg: &[u8], sig: &Signature) -> Result<()> {
        Ed25519Sha256Provider.verify(verifying, msg, sig)
    }

    fn hmac_sha256(&self, key: &[u8], msg: &[u8]) -> [u8; 32] {
        Ed25519Sha256Provider.hmac_sha256(key, msg)
    }

    fn hkdf(&self, ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> Result<Vec<u8>> {
        Ed25519Sha256Provider.hkdf(ikm, salt, info, len)
    }

    fn random_bytes(&self, n: usize) -> Vec<u8> {
        use std::sync::atomic::Ordering;
        (0..n)
            .map(|_| self.counter.fetch_add(1, Ordering::Relaxed) as u8)
            .collect()
    }
}
