//! Wall-clock stopwatch.

use std::time::{Duration, Instant};

use crate::error::Result;
use crate::time_span::TimeSpan;

/// Measures elapsed wall-clock time across start/stop cycles.
#[derive(Debug, Default, Clone)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Stopwatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopwatch that is already running.
    #[must_use]
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start measuring. Does nothing if already running.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Stop measuring and fold the running interval into the total.
    pub fn stop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.accumulated += started_at.elapsed();
        }
    }

    /// Stop and clear the accumulated time.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }

    /// Clear the accumulated time and start again.
    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    /// Total measured duration, including the current interval if running.
    #[must_use]
    pub fn elapsed_duration(&self) -> Duration {
        self.started_at
            .map_or(self.accumulated, |started_at| {
                self.accumulated + started_at.elapsed()
            })
    }

    /// Total measured time as a [`TimeSpan`].
    pub fn elapsed(&self) -> Result<TimeSpan> {
        TimeSpan::try_from(self.elapsed_duration())
    }
}
