//! Host environment contract.

/// The environment a [`Context`](crate::Context) runs inside, usually the
/// platform layer that owns the window and the main loop.
pub trait ContextHost: Send + Sync {
    /// Whether the host is suspended (minimized, backgrounded). Polled once
    /// per `Context::update`.
    fn suspended(&self) -> bool;

    /// Ask the host to stop its main loop. Advisory: the current frame still
    /// completes.
    fn exit(&self);
}
