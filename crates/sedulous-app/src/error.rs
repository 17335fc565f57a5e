//! Scheduler error types.

use sedulous_core::TimeSpan;
use thiserror::Error;

use crate::context::ContextState;

/// Errors produced by the [`Context`](crate::Context) and the platform loop.
#[derive(Error, Debug)]
pub enum ContextError {
    /// A system refused to initialize; the whole batch was rolled back.
    #[error("System '{system}' failed to initialize: {source}")]
    SystemInitialization {
        system: String,
        #[source]
        source: anyhow::Error,
    },

    /// Operation not allowed in the current lifecycle state.
    #[error("Cannot {operation} while the context is {state}")]
    InvalidState {
        operation: &'static str,
        state: ContextState,
    },

    /// The fixed update step must be strictly positive.
    #[error("Target elapsed time must be positive, got {0}")]
    InvalidTargetElapsedTime(TimeSpan),

    /// No system of the requested type is registered.
    #[error("System not found: {0}")]
    SystemNotFound(&'static str),

    /// Time arithmetic overflowed.
    #[error("Time error: {0}")]
    Time(#[from] sedulous_core::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, ContextError>;
