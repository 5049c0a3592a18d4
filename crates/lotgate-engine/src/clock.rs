//! Time sources.
//!
//! The engine reads the clock once per operation, after guard evaluation,
//! while the batch lock is held.

use parking_lot::Mutex;

use lotgate_core::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// The current UTC time, truncated to seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to. Used by scripted replays and tests.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    /// Start at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump to `at`. Moving backwards is allowed.
    pub fn set(&self, at: Timestamp) {
        *self.current.lock() = at;
    }

    /// Move forward (or back, if negative) by `secs`. Unchanged on overflow.
    pub fn advance_secs(&self, secs: i64) {
        let mut current = self.current.lock();
        if let Some(next) = current.checked_add_secs(secs) {
            *current = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_on_request() {
        let start = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance_secs(600);
        assert_eq!(clock.now().seconds_since(&start), 600);
        clock.advance_secs(-1200);
        assert_eq!(clock.now().seconds_since(&start), -600);
        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn system_clock_is_recent() {
        let now = SystemClock.now();
        assert!(now.epoch_secs() > 1_700_000_000);
    }
}
