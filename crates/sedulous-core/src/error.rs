//! Error types for the core crate.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A tick count fell outside the signed 64-bit range.
    #[error("Time span out of range: {0}")]
    OutOfRange(String),

    /// A floating-point time value was NaN or infinite.
    #[error("Invalid time value: {0}")]
    InvalidTime(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
