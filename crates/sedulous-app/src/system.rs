//! System trait definition.

use std::any::Any;

use crate::context::Context;

/// Upcast helper so the context can downcast boxed systems to their concrete
/// type. Implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A pluggable unit of application behavior owned by a [`Context`].
///
/// Systems are initialized in the order they were added to the
/// [`ContextInitializer`](crate::ContextInitializer) and shut down in reverse.
/// A typical system registers its update functions in `on_initialize` and
/// unregisters them in `on_shutdown`.
///
/// State that update functions need to mutate should live behind interior
/// mutability (`Cell`, `RefCell`), since update functions only see the
/// context, and through it the systems, by shared reference.
pub trait System: AsAny {
    /// Human-readable name for this system.
    fn name(&self) -> &str;

    /// Called once when the context initializes this system.
    ///
    /// Returning an error aborts the batch: systems initialized before this one
    /// are shut down in reverse order and none of the batch is kept.
    ///
    /// Default implementation does nothing.
    #[allow(unused_variables)]
    fn on_initialize(&mut self, context: &Context) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when the context shuts down, or when an initialization
    /// batch is rolled back. Must tolerate being called after a partial
    /// `on_initialize`.
    ///
    /// Default implementation does nothing.
    #[allow(unused_variables)]
    fn on_shutdown(&mut self, context: &Context) {}
}
