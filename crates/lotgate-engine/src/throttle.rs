//! # Telemetry Ingestion Throttle
//!
//! In-spec readings are accepted at most once per minimum interval,
//! measured from the batch's last accepted event. Out-of-spec readings are
//! never throttled.

use lotgate_core::{BatchId, Rejection, Timestamp};

/// Default minimum interval between in-spec updates: 20 minutes.
pub const DEFAULT_MIN_UPDATE_INTERVAL_SECS: u64 = 20 * 60;

/// Admission rule for telemetry updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryThrottle {
    min_interval_secs: i64,
}

impl TelemetryThrottle {
    /// A throttle with the given minimum interval.
    pub fn new(min_interval_secs: u64) -> Self {
        Self {
            min_interval_secs: i64::try_from(min_interval_secs).unwrap_or(i64::MAX),
        }
    }

    /// The minimum interval in seconds.
    pub fn min_interval_secs(&self) -> i64 {
        self.min_interval_secs
    }

    /// Admit an update iff it is out-of-spec or at least the minimum
    /// interval has passed since `last_event_at`.
    ///
    /// A clock that reads earlier than `last_event_at` yields a negative
    /// elapsed time, so in-spec updates are rejected until it catches up.
    pub fn admit(
        &self,
        batch_id: &BatchId,
        last_event_at: Timestamp,
        now: Timestamp,
        spec_good: bool,
    ) -> Result<(), Rejection> {
        if !spec_good {
            return Ok(());
        }
        let elapsed_secs = now.seconds_since(&last_event_at);
        if elapsed_secs >= self.min_interval_secs {
            Ok(())
        } else {
            Err(Rejection::IntervalNotReached {
                batch_id: batch_id.clone(),
                elapsed_secs,
                required_secs: self.min_interval_secs,
            })
        }
    }
}

impl Default for TelemetryThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_UPDATE_INTERVAL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BASE: i64 = 1_768_478_400;

    fn ts(offset: i64) -> Timestamp {
        Timestamp::from_epoch_secs(BASE + offset).unwrap()
    }

    fn batch() -> BatchId {
        BatchId::new("B1").unwrap()
    }

    #[test]
    fn default_is_twenty_minutes() {
        assert_eq!(TelemetryThrottle::default().min_interval_secs(), 1200);
    }

    #[test]
    fn in_spec_before_interval_rejected() {
        let t = TelemetryThrottle::default();
        match t.admit(&batch(), ts(0), ts(600), true) {
            Err(Rejection::IntervalNotReached {
                elapsed_secs,
                required_secs,
                ..
            }) => {
                assert_eq!(elapsed_secs, 600);
                assert_eq!(required_secs, 1200);
            }
            other => panic!("expected IntervalNotReached, got {other:?}"),
        }
    }

    #[test]
    fn in_spec_at_interval_accepted() {
        let t = TelemetryThrottle::default();
        assert!(t.admit(&batch(), ts(0), ts(1200), true).is_ok());
        assert!(t.admit(&batch(), ts(0), ts(1199), true).is_err());
    }

    #[test]
    fn out_of_spec_always_accepted() {
        let t = TelemetryThrottle::default();
        assert!(t.admit(&batch(), ts(0), ts(0), false).is_ok());
        assert!(t.admit(&batch(), ts(100), ts(0), false).is_ok());
    }

    #[test]
    fn clock_behind_last_event_rejects_in_spec() {
        let t = TelemetryThrottle::default();
        assert!(matches!(
            t.admit(&batch(), ts(5000), ts(4000), true),
            Err(Rejection::IntervalNotReached { elapsed_secs: -1000, .. })
        ));
    }

    proptest! {
        #[test]
        fn admission_matches_rule(
            interval in 0u64..10_000,
            last in 0i64..100_000,
            delta in -20_000i64..20_000,
            spec_good in any::<bool>(),
        ) {
            let t = TelemetryThrottle::new(interval);
            let result = t.admit(&batch(), ts(last), ts(last + delta), spec_good);
            let expected = !spec_good || delta >= interval as i64;
            prop_assert_eq!(result.is_ok(), expected);
        }
    }
}
