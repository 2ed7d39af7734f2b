//! Grant data model (§3)

use allow2_core::{ActivityId, ChildId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a grant authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantType {
    /// Extend the current session by `minutes`.
    Extension,
    /// Grant an additional quota of `minutes` for the day.
    Quota,
    /// Allow the activity to start earlier than scheduled.
    Earlier,
    /// Lift an active ban.
    LiftBan,
}

impl GrantType {
    /// Wire-format string per §4.2 (`type` field of the payload).
    pub fn as_wire_str(self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::Quota => "quota",
            Self::Earlier => "earlier",
            Self::LiftBan => "lift_ban",
        }
    }

    /// Parse the wire-format string back into a `GrantType`.
    pub fn from_wire_str(s: &str) -> Option<Self> {
        match s {
            "extension" => Some(Self::Extension),
            "quota" => Some(Self::Quota),
            "earlier" => Some(Self::Earlier),
            "lift_ban" => Some(Self::LiftBan),
            _ => None,
        }
    }
}

/// A signed authorization record (§3 Grant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// What the grant authorizes.
    pub grant_type: GrantType,
    /// Which child this grant applies to.
    pub child_id: ChildId,
    /// Which activity this grant applies to.
    pub activity_id: ActivityId,
    /// Minutes granted; `0..=480`.
    pub minutes: u16,
    /// When the grant was issued.
    pub issued_at: DateTime<Utc>,
    /// When the grant stops being valid. Must be strictly after `issued_at`.
    pub expires_at: DateTime<Utc>,
    /// Single-use anti-replay identifier, at least 8 bytes of entropy
    /// once decoded.
    pub nonce: String,
    /// Device this grant is restricted to; empty string means any device.
    pub device_id: String,
    /// Identifies the signing key used, for key rotation.
    pub key_id: String,
}

impl Grant {
    /// `true` once `now` has passed `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// `true` if this grant may be consumed on `device_id` (empty grant
    /// `device_id` matches any device, including the empty string).
    pub fn matches_device(&self, device_id: &str) -> bool {
        self.device_id.is_empty() || self.device_id == device_id
    }

    /// `true` if this grant was issued for `child_id`.
    pub fn matches_child(&self, child_id: ChildId) -> bool {
        self.child_id == child_id
    }
}
