//! Unified error taxonomy for the offline authorization core
//!
//! A single flat error enum, one variant per §7 error kind, rather than a
//! hierarchy per component. Every crate in the workspace returns
//! `allow2_core::Result<T>`.

use serde::{Deserialize, Serialize};

/// Unified error type for all offline-core operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Allow2Error {
    /// Shape or encoding is wrong: token segments, base64, digit pattern.
    #[error("malformed: {message}")]
    Malformed {
        /// Description of what failed to parse.
        message: String,
    },

    /// Ed25519 signature verification failed.
    #[error("bad signature")]
    BadSignature,

    /// `now > expires_at` for a grant, or a pairing session passed its deadline.
    #[error("expired")]
    Expired,

    /// The nonce has already been consumed.
    #[error("replay of nonce {nonce}")]
    Replay {
        /// The nonce that was already present in the ledger.
        nonce: String,
    },

    /// A grant's `device_id` does not match the verifying device.
    #[error("wrong device")]
    WrongDevice,

    /// A grant's `child_id` does not match the requesting child.
    #[error("wrong child")]
    WrongChild,

    /// Granting this request would exceed the deficit ceiling.
    #[error("deficit ceiling exceeded")]
    DeficitExceeded,

    /// A reserved or not-yet-specified protocol feature was used.
    #[error("unsupported: {message}")]
    Unsupported {
        /// Which feature is unsupported.
        message: String,
    },

    /// An external RPC call failed.
    #[error("network error: {message}")]
    Network {
        /// Description of the network failure.
        message: String,
    },

    /// A `SecretStore` read or write failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// The user or a collaborator cancelled an in-flight operation.
    #[error("cancelled")]
    Cancelled,

    /// A precondition was violated that does not fit another variant
    /// (e.g. `minutes > 480`, `expires_at <= issued_at`).
    #[error("invalid: {message}")]
    Invalid {
        /// Description of the violated precondition.
        message: String,
    },
}

impl Allow2Error {
    /// Build a [`Allow2Error::Malformed`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Build a [`Allow2Error::Unsupported`].
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Build a [`Allow2Error::Network`].
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Build a [`Allow2Error::Storage`].
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Build a [`Allow2Error::Invalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Error-kind string for user-facing message tables and telemetry,
    /// matching the centralized message table §7 calls for.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
            Self::Replay { .. } => "replay",
            Self::WrongDevice => "wrong_device",
            Self::WrongChild => "wrong_child",
            Self::DeficitExceeded => "deficit_exceeded",
            Self::Unsupported { .. } => "unsupported",
            Self::Network { .. } => "network",
            Self::Storage { .. } => "storage",
            Self::Cancelled => "cancelled",
            Self::Invalid { .. } => "invalid",
        }
    }

    /// Network errors during polling are recovered by the next tick; every
    /// other kind is fatal to the event that produced it (§7 policy).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl From<serde_json::Error> for Allow2Error {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

impl From<base64::DecodeError> for Allow2Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::malformed(format!("base64url: {err}"))
    }
}

impl From<hex::FromHexError> for Allow2Error {
    fn from(err: hex::FromHexError) -> Self {
        Self::malformed(format!("hex: {err}"))
    }
}

/// Standard result type for offline-core operations.
pub type Result<T> = std::result::Result<T, Allow2Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_per_variant() {
        assert_eq!(Allow2Error::BadSignature.kind(), "bad_signature");
        assert_eq!(
            Allow2Error::Replay {
                nonce: "n".into()
            }
            .kind(),
            "replay"
        );
    }

    #[test]
    fn only_network_errors_are_recoverable() {
        assert!(Allow2Error::network("timeout").is_recoverable());
        assert!(!Allow2Error::Expired.is_recoverable());
        assert!(!Allow2Error::BadSignature.is_recoverable());
    }
}
