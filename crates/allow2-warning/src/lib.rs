//! # allow2-warning — C7 WarningMachine
//!
//! Remaining-time thresholds, 1-second countdown, and the block trigger
//! (§4.7). Notification is monotone: a level can rise without bound but is
//! only reset by an explicit [`WarningMachine::reset`], which prevents UI
//! flicker when the backend briefly reports a higher remaining-time value
//! (e.g. right after a grant is applied).
//!
//! Observers are invoked in registration order on the caller's own
//! sequence; this crate does no threading or deferral of its own — the
//! owning host is expected not to re-enter the machine synchronously from
//! within an observer callback, matching the "no observer may re-enter
//! synchronously" design note.

#![forbid(unsafe_code)]

/// Urgency level, ordered least to most urgent so `update` can detect an
/// escalation with a single comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WarningLevel {
    /// More than 900 seconds remain.
    None,
    /// 900 seconds or fewer remain.
    Gentle,
    /// 300 seconds or fewer remain.
    Warning,
    /// 60 seconds or fewer remain (also re-notified at 30s and 10s).
    Urgent,
    /// No time remains; the block callback fires.
    Blocked,
}

impl WarningLevel {
    fn bracket(remaining: i64) -> Self {
        if remaining <= 0 {
            Self::Blocked
        } else if remaining <= 60 {
            Self::Urgent
        } else if remaining <= 300 {
            Self::Warning
        } else if remaining <= 900 {
            Self::Gentle
        } else {
            Self::None
        }
    }
}

type LevelObserver = Box<dyn Fn(WarningLevel) + Send>;
type TickObserver = Box<dyn Fn(i64) + Send>;
type BlockCallback = Box<dyn FnOnce(String) + Send>;

/// The warning/countdown state machine gating access to an activity.
pub struct WarningMachine {
    level: WarningLevel,
    countdown_running: bool,
    countdown_remaining: Option<i64>,
    level_observers: Vec<LevelObserver>,
    tick_observers: Vec<TickObserver>,
    block_callback: Option<BlockCallback>,
}

impl Default for WarningMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl WarningMachine {
    /// A fresh machine at [`WarningLevel::None`] with no countdown running.
    pub fn new() -> Self {
        Self {
            level: WarningLevel::None,
            countdown_running: false,
            countdown_remaining: None,
            level_observers: Vec::new(),
            tick_observers: Vec::new(),
            block_callback: None,
        }
    }

    /// Register a sink invoked whenever the urgency level is notified.
    pub fn on_level_change(&mut self, observer: LevelObserver) {
        self.level_observers.push(observer);
    }

    /// Register a sink invoked on each 1 Hz countdown tick.
    pub fn on_tick(&mut self, observer: TickObserver) {
        self.tick_observers.push(observer);
    }

    /// Set the callback fired exactly once when `remaining` reaches zero.
    /// Replaces any previously set (and not yet fired) callback.
    pub fn set_block_callback(&mut self, callback: BlockCallback) {
        self.block_callback = Some(callback);
    }

    /// Current urgency level.
    pub fn level(&self) -> WarningLevel {
        self.level
    }

    /// `true` while the 1 Hz countdown is active.
    pub fn is_counting_down(&self) -> bool {
        self.countdown_running
    }

    /// Recompute the level for `remaining` seconds. Observers are notified
    /// only when the level increases in urgency, except at the two
    /// explicit re-notify points (30s and 10s) while already `Urgent`.
    pub fn update(&mut self, remaining: i64) {
        let target = WarningLevel::bracket(remaining);
        let repeat_notify = target == WarningLevel::Urgent
            && self.level == WarningLevel::Urgent
            && (remaining == 30 || remaining == 10);
        let escalated = target > self.level;

        if escalated {
            self.level = target;
        }
        if escalated || repeat_notify {
            self.notify_level();
        }

        if remaining <= 60 && remaining > 0 && !self.countdown_running {
            self.countdown_running = true;
            tracing::debug!(remaining, "countdown started");
        }
        if self.countdown_running {
            self.countdown_remaining = Some(remaining);
        }

        if remaining <= 0 {
            self.fire_block("remaining time reached zero".to_string());
            self.countdown_running = false;
            self.countdown_remaining = None;
        }
    }

    /// Advance the countdown by one second, re-running `update` on the new
    /// remaining value so threshold re-notification and the block trigger
    /// share a single code path. Returns the new remaining value, or
    /// `None` if the countdown is not running.
    pub fn tick(&mut self) -> Option<i64> {
        if !self.countdown_running {
            return None;
        }
        let next = self.countdown_remaining.unwrap_or(0) - 1;
        self.notify_tick(next);
        self.update(next);
        Some(next)
    }

    /// Reset to [`WarningLevel::None`] and stop the countdown. Does not
    /// restore an already-fired block callback — callers that want another
    /// block notification must call [`WarningMachine::set_block_callback`]
    /// again.
    pub fn reset(&mut self) {
        self.level = WarningLevel::None;
        self.countdown_running = false;
        self.countdown_remaining = None;
    }

    fn notify_level(&self) {
        for observer in &self.level_observers {
            observer(self.level);
        }
    }

    fn notify_tick(&self, remaining: i64) {
        for observer in &self.tick_observers {
            observer(remaining);
        }
    }

    fn fire_block(&mut self, reason: String) {
        if let Some(callback) = self.block_callback.take() {
            callback(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn warning_progression_matches_spec_scenario() {
        let notifications = Arc::new(Mutex::new(Vec::new()));
        let blocked = Arc::new(Mutex::new(0));

        let mut machine = WarningMachine::new();
        {
            let notifications = notifications.clone();
            machine.on_level_change(Box::new(move |level| {
                notifications.lock().unwrap().push(level);
            }));
        }
        {
            let blocked = blocked.clone();
            machine.set_block_callback(Box::new(move |_reason| {
                *blocked.lock().unwrap() += 1;
            }));
        }

        machine.update(900);
        assert_eq!(machine.level(), WarningLevel::Gentle);

        machine.update(800); // no new notification, same bracket
        assert_eq!(machine.level(), WarningLevel::Gentle);

        machine.update(300);
        assert_eq!(machine.level(), WarningLevel::Warning);

        machine.update(60);
        assert_eq!(machine.level(), WarningLevel::Urgent);
        assert!(machine.is_counting_down());

        // drive the countdown second-by-second via tick(), the way the
        // host's 1 Hz timer would.
        while machine.tick().is_some() {}

        assert_eq!(machine.level(), WarningLevel::Blocked);
        assert_eq!(*blocked.lock().unwrap(), 1);

        // further ticks do nothing: countdown has stopped and the
        // callback was already consumed.
        assert_eq!(machine.tick(), None);

        let seen = notifications.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                WarningLevel::Gentle,
                WarningLevel::Warning,
                WarningLevel::Urgent, // from update(60)
                WarningLevel::Urgent, // repeat-notify at 30
                WarningLevel::Urgent, // repeat-notify at 10
            ]
        );
    }

    #[test]
    fn block_callback_fires_exactly_once() {
        let blocked = Arc::new(Mutex::new(0));
        let mut machine = WarningMachine::new();
        {
            let blocked = blocked.clone();
            machine.set_block_callback(Box::new(move |_| {
                *blocked.lock().unwrap() += 1;
            }));
        }

        machine.update(0);
        machine.update(0);
        machine.update(-5);

        assert_eq!(*blocked.lock().unwrap(), 1);
    }

    #[test]
    fn reset_allows_a_downgrade() {
        let mut machine = WarningMachine::new();
        machine.update(60);
        assert_eq!(machine.level(), WarningLevel::Urgent);

        machine.update(900); // would be a downgrade: ignored
        assert_eq!(machine.level(), WarningLevel::Urgent);

        machine.reset();
        machine.update(900);
        assert_eq!(machine.level(), WarningLevel::Gentle);
    }

    #[test]
    fn never_notifies_on_downgrade_without_reset() {
        let notifications = Arc::new(Mutex::new(Vec::new()));
        let mut machine = WarningMachine::new();
        {
            let notifications = notifications.clone();
            machine.on_level_change(Box::new(move |level| {
                notifications.lock().unwrap().push(level);
            }));
        }

        machine.update(60);
        machine.update(5000);

        assert_eq!(notifications.lock().unwrap().as_slice(), [WarningLevel::Urgent]);
    }
}
