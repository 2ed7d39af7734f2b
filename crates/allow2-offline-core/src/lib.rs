//! # allow2-offline-core
//!
//! Facade crate re-exporting the offline parental-control authorization
//! core as a single dependency: crypto primitives, QR grant codec and
//! anti-replay ledger, voice-code protocol, borrowed-time deficit ledger,
//! the pairing state machine, the warning/countdown machine, and the
//! travel-time timezone adjuster.
//!
//! A host integration depends on this crate alone; the component crates
//! underneath are implementation detail it should not need to name
//! directly.

#![forbid(unsafe_code)]

pub use allow2_core::{config::Allow2Config, errors::Allow2Error, secret_store, ActivityId, ChildId, Result, SecretStore};

pub use allow2_crypto::{
    constant_time_eq, derive_voice_key, CryptoProvider, Ed25519Sha256Provider, Signature,
    SigningKey, VerifyingKey,
};

pub use allow2_grant::{accept_grant, codec, matches_activity, Grant, GrantType, NonceLedger};

pub use allow2_voice::{
    bucket_for, generate_approval_code, generate_request_code, parse, validate_and_consume,
    validate_approval_code, VoiceRequest, VoiceRequestType,
};

pub use allow2_deficit::DeficitLedger;

pub use allow2_pairing::{
    ChildSummary, Credentials, InitResponse, PairingMode, PairingSession, PairingState,
    PairingTransport, StatusResponse,
};

pub use allow2_warning::{WarningLevel, WarningMachine};

pub use allow2_travel::{parse_tz, DayType, TravelTimeAdjuster};

#[cfg(any(test, feature = "test-util"))]
pub use allow2_crypto::TestProvider;
#[cfg(any(test, feature = "test-util"))]
pub use allow2_core::secret_store::test_util::InMemorySecretStore;
#[cfg(any(test, feature = "test-util"))]
pub use allow2_pairing::FakeTransport;
