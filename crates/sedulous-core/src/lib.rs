//! Core types for the Sedulous framework.
//!
//! This crate provides the foundational time types used by the scheduler:
//! - `TimeSpan`: signed tick-based durations (10,000,000 ticks per second)
//! - `Time` / `TimeTracker`: per-stage elapsed and total time bookkeeping
//! - `Stopwatch`: wall-clock measurement for platform loop drivers
//! - Common error types

pub mod error;
pub mod stopwatch;
pub mod time;
pub mod time_span;

pub use error::{Error, Result};
pub use stopwatch::Stopwatch;
pub use time::{Time, TimeTracker};
pub use time_span::{TimeComponents, TimeSpan};
