//! Per-stage time bookkeeping.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::time_span::TimeSpan;

/// Elapsed and total time for one update stage.
///
/// Values handed to update callbacks are copies, valid as a snapshot of the
/// tracker at the moment the callback was invoked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    /// Most recent increment.
    pub elapsed_time: TimeSpan,
    /// Running sum of all increments since the last reset.
    pub total_time: TimeSpan,
}

impl Time {
    #[must_use]
    pub const fn new(elapsed_time: TimeSpan, total_time: TimeSpan) -> Self {
        Self {
            elapsed_time,
            total_time,
        }
    }
}

/// Accumulates time increments into a [`Time`].
#[derive(Debug, Default, Clone)]
pub struct TimeTracker {
    time: Time,
}

impl TimeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time without advancing.
    #[inline]
    #[must_use]
    pub const fn time(&self) -> Time {
        self.time
    }

    /// Zero both elapsed and total time.
    pub fn reset(&mut self) -> Time {
        self.time = Time::default();
        self.time
    }

    /// Record `delta` as the elapsed time and add it to the total.
    ///
    /// On overflow of the total the tracker is left unchanged.
    pub fn increment(&mut self, delta: TimeSpan) -> Result<Time> {
        let total_time = self.time.total_time.try_add(delta)?;
        self.time = Time::new(delta, total_time);
        Ok(self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn increment_accumulates_total() {
        let mut tracker = TimeTracker::new();
        let step = TimeSpan::from_milliseconds(16).unwrap();

        let first = tracker.increment(step).unwrap();
        assert_eq!(first.elapsed_time, step);
        assert_eq!(first.total_time, step);

        let second = tracker.increment(step).unwrap();
        assert_eq!(second.elapsed_time, step);
        assert_eq!(second.total_time.total_milliseconds(), 32.0);
    }

    #[test]
    fn returned_time_is_a_snapshot() {
        let mut tracker = TimeTracker::new();
        let snapshot = tracker.increment(TimeSpan::from_ticks(5)).unwrap();
        tracker.increment(TimeSpan::from_ticks(7)).unwrap();

        assert_eq!(snapshot.total_time.ticks(), 5);
        assert_eq!(tracker.time().total_time.ticks(), 12);
    }

    #[test]
    fn reset_zeroes_both_fields() {
        let mut tracker = TimeTracker::new();
        tracker.increment(TimeSpan::from_seconds(3).unwrap()).unwrap();

        let time = tracker.reset();
        assert_eq!(time, Time::default());
        assert_eq!(tracker.time().total_time, TimeSpan::ZERO);
    }

    #[test]
    fn overflow_leaves_tracker_unchanged() {
        let mut tracker = TimeTracker::new();
        tracker.increment(TimeSpan::MAX).unwrap();

        let result = tracker.increment(TimeSpan::from_ticks(1));
        assert!(matches!(result, Err(Error::OutOfRange(_))));
        assert_eq!(tracker.time(), Time::new(TimeSpan::MAX, TimeSpan::MAX));
    }
}
