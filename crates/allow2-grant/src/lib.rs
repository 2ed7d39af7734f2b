//! # allow2-grant — C2 QRGrantCodec + C3 NonceLedger
//!
//! Canonical serialization, base64url, and Ed25519 signing/verification of
//! QR grant tokens, plus the nonce ledger that makes a grant consumable at
//! most once. These two components are kept in one crate because the
//! ledger is the codec's anti-replay collaborator and the two are always
//! consumed together through [`accept_grant`].

#![forbid(unsafe_code)]

mod acceptance;
pub mod codec;
mod grant;
mod nonce_ledger;

pub use acceptance::{accept_grant, matches_activity};
pub use grant::{Grant, GrantType};
pub use nonce_ledger::NonceLedger;
