//! Scheduler configuration.

use sedulous_core::TimeSpan;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{ContextError, Result};

/// Timing configuration for a [`Context`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Length of one fixed update step.
    pub target_elapsed_time: TimeSpan,
    /// Pause applied to each update while the host is suspended. Zero
    /// disables the pause.
    pub inactive_sleep_time: TimeSpan,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            target_elapsed_time: Context::DEFAULT_TARGET_ELAPSED_TIME,
            inactive_sleep_time: Context::DEFAULT_INACTIVE_SLEEP_TIME,
        }
    }
}

impl ContextConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fixed update step.
    #[must_use]
    pub const fn with_target_elapsed_time(mut self, target_elapsed_time: TimeSpan) -> Self {
        self.target_elapsed_time = target_elapsed_time;
        self
    }

    /// Set the fixed update step from a rate in steps per second.
    #[must_use]
    pub fn with_fixed_update_rate(mut self, hz: u32) -> Self {
        self.target_elapsed_time =
            TimeSpan::from_ticks(TimeSpan::TICKS_PER_SECOND / i64::from(hz.max(1)));
        self
    }

    /// Set the pause applied while the host is suspended.
    #[must_use]
    pub const fn with_inactive_sleep_time(mut self, inactive_sleep_time: TimeSpan) -> Self {
        self.inactive_sleep_time = inactive_sleep_time;
        self
    }

    /// Check that the fixed step is strictly positive.
    pub fn validate(&self) -> Result<()> {
        if self.target_elapsed_time <= TimeSpan::ZERO {
            return Err(ContextError::InvalidTargetElapsedTime(
                self.target_elapsed_time,
            ));
        }
        Ok(())
    }
}
