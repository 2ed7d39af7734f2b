//! # allow2-travel — C8 TravelTimeAdjuster
//!
//! Home-vs-device timezone reconciliation so day boundaries and schedules
//! stay correct while the device travels (§4.8).

#![forbid(unsafe_code)]

use allow2_core::Allow2Error;
use chrono::{DateTime, Datelike, Duration, Offset, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use std::str::FromStr;

/// A named scheduling bucket evaluated against the home timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayType {
    /// A weekday evening that is not the night before a school day, or
    /// any Mon-Fri daytime hour.
    Weekday,
    /// Saturday or Sunday, home-local.
    Weekend,
    /// Evening (18:00 or later, home-local) preceding a Mon-Fri school day.
    SchoolNight,
}

/// Reconciles the device's local clock against a configured home
/// timezone for schedule evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelTimeAdjuster {
    home_tz: Tz,
    device_tz: Tz,
}

impl TravelTimeAdjuster {
    /// Build an adjuster from an explicit home/device timezone pair.
    pub fn new(home_tz: Tz, device_tz: Tz) -> Self {
        Self {
            home_tz,
            device_tz,
        }
    }

    /// Build an adjuster resolving `device_tz` from the `TZ` environment
    /// variable, falling back to UTC. The core has no platform-timezone
    /// crate in its dependency stack, so this is a best-effort stand-in
    /// for an OS timezone query — a browser host integration is expected
    /// to supply the device timezone directly via [`Self::new`] instead.
    pub fn from_env(home_tz: Tz) -> Self {
        let device_tz = std::env::var("TZ")
            .ok()
            .and_then(|tz| Tz::from_str(&tz).ok())
            .unwrap_or(Tz::UTC);
        Self::new(home_tz, device_tz)
    }

    /// The configured home timezone.
    pub fn home_tz(&self) -> Tz {
        self.home_tz
    }

    /// The resolved device timezone.
    pub fn device_tz(&self) -> Tz {
        self.device_tz
    }

    /// `true` iff the device's timezone differs from home.
    pub fn is_traveling(&self) -> bool {
        self.home_tz != self.device_tz
    }

    /// `device_offset - home_offset`, in seconds, at `now`.
    pub fn offset_delta(&self, now: DateTime<Utc>) -> i64 {
        let device_offset = now.with_timezone(&self.device_tz).offset().fix().local_minus_utc();
        let home_offset = now.with_timezone(&self.home_tz).offset().fix().local_minus_utc();
        (device_offset - home_offset) as i64
    }

    /// Shift a UTC instant by the current home/device offset delta, i.e.
    /// the UTC instant whose device-local wall clock reads what `t`'s
    /// home-local wall clock reads.
    pub fn home_to_device(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        t + Duration::seconds(self.offset_delta(t))
    }

    /// The inverse of [`Self::home_to_device`].
    pub fn device_to_home(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        t - Duration::seconds(self.offset_delta(t))
    }

    /// Evaluate weekday/weekend/school-night using the wall-clock date in
    /// `home_tz`, never device-local.
    pub fn effective_day_type(&self, now: DateTime<Utc>) -> DayType {
        let home_now = now.with_timezone(&self.home_tz);
        let weekday = home_now.weekday();

        if matches!(weekday, Weekday::Sat | Weekday::Sun) {
            return DayType::Weekend;
        }

        let tomorrow_is_school_day = !matches!(weekday.succ(), Weekday::Sat | Weekday::Sun);
        let is_evening = home_now.hour() >= 18;

        if is_evening && tomorrow_is_school_day {
            DayType::SchoolNight
        } else {
            DayType::Weekday
        }
    }

    /// Clip `raw_remaining` (seconds) so the child cannot gain time by
    /// flying west: if the next home-timezone midnight is still in the
    /// future under device time but would fall before `raw_remaining`
    /// elapses, the remaining time is capped at the boundary.
    pub fn adjusted_remaining(&self, raw_remaining: i64, now: DateTime<Utc>) -> i64 {
        let Some(boundary_utc) = self.next_home_midnight_utc(now) else {
            return raw_remaining;
        };
        let secs_until_boundary = (boundary_utc - now).num_seconds();
        if secs_until_boundary > 0 && raw_remaining > secs_until_boundary {
            secs_until_boundary
        } else {
            raw_remaining
        }
    }

    fn next_home_midnight_utc(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let home_now = now.with_timezone(&self.home_tz);
        let next_midnight_naive = home_now
            .date_naive()
            .succ_opt()?
            .and_hms_opt(0, 0, 0)?;
        let boundary_home = self
            .home_tz
            .from_local_datetime(&next_midnight_naive)
            .single()?;
        Some(boundary_home.with_timezone(&Utc))
    }
}

/// Parse an IANA timezone identifier, surfacing an `Invalid` error on an
/// unrecognized zone name rather than panicking.
pub fn parse_tz(id: &str) -> allow2_core::Result<Tz> {
    Tz::from_str(id).map_err(|_| Allow2Error::invalid(format!("unknown timezone {id}")))
}
