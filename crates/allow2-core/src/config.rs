//! Enumerated configuration knobs (§6 "Configuration (enumerated)")

use std::time::Duration;

/// Policy knobs the offline core is parameterized over. Components take
/// `&Allow2Config` rather than hard-coding constants so embedding
/// applications can override TTLs in tests without touching the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allow2Config {
    /// How long a consumed nonce stays in the ledger before GC.
    pub nonce_ttl: Duration,
    /// Hard ceiling on `Grant.minutes`.
    pub grant_max_minutes: u16,
    /// Hard ceiling on the voice code `MM` multiplier (99 => 495 minutes).
    pub voice_max_increments: u8,
    /// Voice-code 5-minute multiplier step.
    pub voice_minutes_per_increment: u16,
    /// Hard ceiling on borrowed-time deficit, in seconds.
    pub deficit_ceiling_sec: i32,
    /// Width of a voice-code time bucket, in seconds.
    pub voice_bucket_sec: i64,
    /// How many buckets of drift either side of `bucket` are accepted.
    pub voice_drift_buckets: i64,
    /// Pairing long-poll interval.
    pub pairing_poll_interval: Duration,
    /// Warning-machine countdown tick interval.
    pub countdown_tick_interval: Duration,
}

impl Default for Allow2Config {
    fn default() -> Self {
        Self {
            nonce_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            grant_max_minutes: 480,
            voice_max_increments: 99,
            voice_minutes_per_increment: 5,
            deficit_ceiling_sec: 1800,
            voice_bucket_sec: 30,
            voice_drift_buckets: 1,
            pairing_poll_interval: Duration::from_secs(2),
            countdown_tick_interval: Duration::from_secs(1),
        }
    }
}

impl Allow2Config {
    /// Maximum minutes a voice code can express, derived from the
    /// increment ceiling rather than hard-coded twice.
    pub fn voice_max_minutes(&self) -> u16 {
        self.voice_max_increments as u16 * self.voice_minutes_per_increment
    }

    /// The GC threshold used by `NonceLedger::gc`: `now - max(grant_ttl, nonce_ttl)`.
    pub fn gc_threshold(&self, grant_ttl: Duration) -> Duration {
        std::cmp::max(grant_ttl, self.nonce_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Allow2Config::default();
        assert_eq!(cfg.grant_max_minutes, 480);
        assert_eq!(cfg.deficit_ceiling_sec, 1800);
        assert_eq!(cfg.voice_max_minutes(), 495);
        assert_eq!(cfg.nonce_ttl, Duration::from_secs(604_800));
    }
}
