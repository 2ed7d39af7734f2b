//! # allow2-core
//!
//! Shared plumbing for the offline parental-control authorization core:
//! the error taxonomy, enumerated configuration, and the `SecretStore`
//! trait that stands in for the encrypted on-disk key-value store
//! described in the system's external interfaces.
//!
//! This crate has no knowledge of crypto, grants, or pairing — those live
//! in `allow2-crypto`, `allow2-grant`, `allow2-voice`, `allow2-deficit`,
//! `allow2-pairing`, `allow2-warning`, and `allow2-travel`, each depending
//! on this one for the bottom layer.

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod secret_store;

pub use config::Allow2Config;
pub use errors::{Allow2Error, Result};
pub use secret_store::SecretStore;

/// Identifier for a managed child profile.
pub type ChildId = u64;
/// Identifier for an activity category (Gaming, Internet, ...).
pub type ActivityId = u64;
