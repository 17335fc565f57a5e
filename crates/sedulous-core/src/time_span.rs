//! Tick-based duration type.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Decomposed units for building a [`TimeSpan`].
///
/// All fields default to zero, so callers only name the units they need:
///
/// ```
/// use sedulous_core::{TimeComponents, TimeSpan};
///
/// let span = TimeSpan::from_components(TimeComponents {
///     minutes: 1,
///     seconds: 30,
///     ..Default::default()
/// })
/// .unwrap();
/// assert_eq!(span.total_seconds(), 90.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimeComponents {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub milliseconds: i64,
    pub microseconds: i64,
    pub nanoseconds: i64,
}

/// A signed duration measured in ticks of 100 nanoseconds.
///
/// Every construction path and every arithmetic operation is range checked:
/// a result that does not fit in a signed 64-bit tick count is reported as
/// [`Error::OutOfRange`] and never wraps.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TimeSpan {
    ticks: i64,
}

impl TimeSpan {
    /// Nanoseconds covered by a single tick.
    pub const NANOSECONDS_PER_TICK: i64 = 100;
    pub const TICKS_PER_MICROSECOND: i64 = 10;
    pub const TICKS_PER_MILLISECOND: i64 = 10_000;
    pub const TICKS_PER_SECOND: i64 = 10_000_000;
    pub const TICKS_PER_MINUTE: i64 = Self::TICKS_PER_SECOND * 60;
    pub const TICKS_PER_HOUR: i64 = Self::TICKS_PER_MINUTE * 60;
    pub const TICKS_PER_DAY: i64 = Self::TICKS_PER_HOUR * 24;

    /// The zero-length span.
    pub const ZERO: Self = Self { ticks: 0 };
    /// The most negative representable span.
    pub const MIN: Self = Self { ticks: i64::MIN };
    /// The most positive representable span.
    pub const MAX: Self = Self { ticks: i64::MAX };

    /// Create a span from a raw tick count.
    ///
    /// Any `i64` is a valid tick count, so this cannot fail.
    #[inline]
    #[must_use]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    /// Create a span from a wide tick count, failing when it does not fit in
    /// the signed 64-bit range.
    pub fn try_from_ticks(ticks: i128) -> Result<Self> {
        i64::try_from(ticks)
            .map(Self::from_ticks)
            .map_err(|_| Error::OutOfRange(format!("{ticks} ticks")))
    }

    /// Create a span from decomposed units.
    ///
    /// The units are summed in 128-bit arithmetic and the total is then
    /// validated, so intermediate products cannot overflow.
    pub fn from_components(components: TimeComponents) -> Result<Self> {
        let TimeComponents {
            days,
            hours,
            minutes,
            seconds,
            milliseconds,
            microseconds,
            nanoseconds,
        } = components;

        let ticks = i128::from(days) * i128::from(Self::TICKS_PER_DAY)
            + i128::from(hours) * i128::from(Self::TICKS_PER_HOUR)
            + i128::from(minutes) * i128::from(Self::TICKS_PER_MINUTE)
            + i128::from(seconds) * i128::from(Self::TICKS_PER_SECOND)
            + i128::from(milliseconds) * i128::from(Self::TICKS_PER_MILLISECOND)
            + i128::from(microseconds) * i128::from(Self::TICKS_PER_MICROSECOND)
            + i128::from(nanoseconds) / i128::from(Self::NANOSECONDS_PER_TICK);

        Self::try_from_ticks(ticks)
    }

    pub fn from_days(days: i64) -> Result<Self> {
        Self::from_units(days, Self::TICKS_PER_DAY)
    }

    pub fn from_hours(hours: i64) -> Result<Self> {
        Self::from_units(hours, Self::TICKS_PER_HOUR)
    }

    pub fn from_minutes(minutes: i64) -> Result<Self> {
        Self::from_units(minutes, Self::TICKS_PER_MINUTE)
    }

    pub fn from_seconds(seconds: i64) -> Result<Self> {
        Self::from_units(seconds, Self::TICKS_PER_SECOND)
    }

    pub fn from_milliseconds(milliseconds: i64) -> Result<Self> {
        Self::from_units(milliseconds, Self::TICKS_PER_MILLISECOND)
    }

    pub fn from_microseconds(microseconds: i64) -> Result<Self> {
        Self::from_units(microseconds, Self::TICKS_PER_MICROSECOND)
    }

    /// Create a span from nanoseconds, truncated to whole ticks.
    #[must_use]
    pub const fn from_nanoseconds(nanoseconds: i64) -> Self {
        Self::from_ticks(nanoseconds / Self::NANOSECONDS_PER_TICK)
    }

    /// Create a span from floating-point wall-clock seconds.
    ///
    /// Fractions of a tick are truncated toward zero.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_seconds_f64(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() {
            return Err(Error::InvalidTime(format!("{seconds} seconds")));
        }

        let ticks = seconds * Self::TICKS_PER_SECOND as f64;
        // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
        if !(i64::MIN as f64..i64::MAX as f64).contains(&ticks) {
            return Err(Error::OutOfRange(format!("{seconds} seconds")));
        }

        Ok(Self::from_ticks(ticks as i64))
    }

    fn from_units(value: i64, ticks_per_unit: i64) -> Result<Self> {
        Self::try_from_ticks(i128::from(value) * i128::from(ticks_per_unit))
    }

    /// Raw tick count.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> i64 {
        self.ticks
    }

    /// Returns `true` if the span is exactly zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.ticks == 0
    }

    /// Returns `true` if the span is strictly negative.
    #[inline]
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.ticks < 0
    }

    /// Add two spans, failing on overflow.
    pub fn try_add(self, rhs: Self) -> Result<Self> {
        self.ticks
            .checked_add(rhs.ticks)
            .map(Self::from_ticks)
            .ok_or_else(|| Error::OutOfRange(format!("{} + {} ticks", self.ticks, rhs.ticks)))
    }

    /// Subtract two spans, failing on overflow.
    pub fn try_sub(self, rhs: Self) -> Result<Self> {
        self.ticks
            .checked_sub(rhs.ticks)
            .map(Self::from_ticks)
            .ok_or_else(|| Error::OutOfRange(format!("{} - {} ticks", self.ticks, rhs.ticks)))
    }

    /// Whole days, carrying the sign of the span.
    #[must_use]
    pub const fn days(self) -> i64 {
        self.ticks / Self::TICKS_PER_DAY
    }

    /// Hours component of the magnitude (0..24).
    #[must_use]
    pub const fn hours(self) -> i64 {
        self.component(Self::TICKS_PER_DAY, Self::TICKS_PER_HOUR)
    }

    /// Minutes component of the magnitude (0..60).
    #[must_use]
    pub const fn minutes(self) -> i64 {
        self.component(Self::TICKS_PER_HOUR, Self::TICKS_PER_MINUTE)
    }

    /// Seconds component of the magnitude (0..60).
    #[must_use]
    pub const fn seconds(self) -> i64 {
        self.component(Self::TICKS_PER_MINUTE, Self::TICKS_PER_SECOND)
    }

    /// Milliseconds component of the magnitude (0..1000).
    #[must_use]
    pub const fn milliseconds(self) -> i64 {
        self.component(Self::TICKS_PER_SECOND, Self::TICKS_PER_MILLISECOND)
    }

    /// Microseconds component of the magnitude (0..1000).
    #[must_use]
    pub const fn microseconds(self) -> i64 {
        self.component(Self::TICKS_PER_MILLISECOND, Self::TICKS_PER_MICROSECOND)
    }

    /// Nanoseconds component of the magnitude (0..1000, in steps of one tick).
    #[must_use]
    pub const fn nanoseconds(self) -> i64 {
        self.component(Self::TICKS_PER_MICROSECOND, 1) * Self::NANOSECONDS_PER_TICK
    }

    /// Breaks the absolute tick count down into one unit. Negative spans keep
    /// their sign only in `days` and the `total_*` views.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    const fn component(self, parent: i64, unit: i64) -> i64 {
        // parent and unit are positive constants and the remainder is < parent.
        ((self.ticks.unsigned_abs() % parent as u64) / unit as u64) as i64
    }

    #[must_use]
    pub fn total_days(self) -> f64 {
        self.ticks as f64 / Self::TICKS_PER_DAY as f64
    }

    #[must_use]
    pub fn total_hours(self) -> f64 {
        self.ticks as f64 / Self::TICKS_PER_HOUR as f64
    }

    #[must_use]
    pub fn total_minutes(self) -> f64 {
        self.ticks as f64 / Self::TICKS_PER_MINUTE as f64
    }

    #[must_use]
    pub fn total_seconds(self) -> f64 {
        self.ticks as f64 / Self::TICKS_PER_SECOND as f64
    }

    #[must_use]
    pub fn total_milliseconds(self) -> f64 {
        self.ticks as f64 / Self::TICKS_PER_MILLISECOND as f64
    }

    #[must_use]
    pub fn total_microseconds(self) -> f64 {
        self.ticks as f64 / Self::TICKS_PER_MICROSECOND as f64
    }

    #[must_use]
    pub fn total_nanoseconds(self) -> f64 {
        self.ticks as f64 * Self::NANOSECONDS_PER_TICK as f64
    }

    /// Whole seconds, truncated toward zero.
    #[must_use]
    pub const fn to_seconds(self) -> i64 {
        self.ticks / Self::TICKS_PER_SECOND
    }

    /// Convert to a [`Duration`]. Negative spans become [`Duration::ZERO`].
    #[must_use]
    pub fn to_duration(self) -> Duration {
        if self.ticks <= 0 {
            return Duration::ZERO;
        }

        let ticks = self.ticks.unsigned_abs();
        let per_second = Self::TICKS_PER_SECOND.unsigned_abs();
        let subsec_ticks = ticks % per_second;
        // subsec_ticks * 100 < 1_000_000_000, which fits in u32.
        #[allow(clippy::cast_possible_truncation)]
        let nanos = (subsec_ticks * Self::NANOSECONDS_PER_TICK.unsigned_abs()) as u32;
        Duration::new(ticks / per_second, nanos)
    }
}

impl TryFrom<Duration> for TimeSpan {
    type Error = Error;

    fn try_from(duration: Duration) -> Result<Self> {
        let ticks = duration.as_nanos() / u128::from(Self::NANOSECONDS_PER_TICK.unsigned_abs());
        i64::try_from(ticks)
            .map(Self::from_ticks)
            .map_err(|_| Error::OutOfRange(format!("{duration:?}")))
    }
}

impl From<TimeSpan> for Duration {
    fn from(span: TimeSpan) -> Self {
        span.to_duration()
    }
}

impl fmt::Display for TimeSpan {
    /// Formats as `[-]d:hh:mm:ss.mmmuuunnn`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(
            f,
            "{sign}{}:{:02}:{:02}:{:02}.{:03}{:03}{:03}",
            self.days().unsigned_abs(),
            self.hours(),
            self.minutes(),
            self.seconds(),
            self.milliseconds(),
            self.microseconds(),
            self.nanoseconds(),
        )
    }
}
