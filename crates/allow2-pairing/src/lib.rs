//! # allow2-pairing — C6 PairingSession
//!
//! The device-pairing state machine: QR/PIN init, long-polling for
//! completion, credential persistence, and (per the voice-key supplement)
//! deriving the voice-code shared key the moment pairing succeeds.
//!
//! The external RPC surface is the [`PairingTransport`] trait rather than
//! a concrete HTTP client — this crate has no opinion on transport.

#![forbid(unsafe_code)]

mod credentials;
mod device_token;
mod session;
mod transport;

pub use credentials::Credentials;
pub use session::{PairingSession, PairingState};
pub use transport::{ChildSummary, InitResponse, PairingMode, PairingTransport, StatusResponse};

#[cfg(any(test, feature = "test-util"))]
pub use transport::test_util::FakeTransport;
