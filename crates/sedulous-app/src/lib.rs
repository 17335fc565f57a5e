//! Frame update scheduler for the Sedulous framework.
//!
//! This crate provides the per-frame scheduling core:
//! - `Context`: owns systems and runs staged pre/fixed/variable/post updates
//! - `System`: a pluggable unit with initialize and shutdown hooks
//! - `ContextInitializer`: the batch of systems handed to the context
//! - `Platform`: a headless main loop that feeds real time to a context
//!
//! # Example
//!
//! ```no_run
//! use sedulous_app::{
//!     Context, ContextUpdateFunctionInfo, Platform, PlatformCallbacks, PlatformConfig, System,
//! };
//!
//! struct Greeter;
//!
//! impl System for Greeter {
//!     fn name(&self) -> &str {
//!         "greeter"
//!     }
//!
//!     fn on_initialize(&mut self, context: &Context) -> anyhow::Result<()> {
//!         context.register_update_function(ContextUpdateFunctionInfo::new(|info| {
//!             tracing::info!("frame took {}", info.time.elapsed_time);
//!         }));
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut platform = Platform::new(PlatformConfig::new("Greeter").with_max_frames(60))?;
//!     platform.run(PlatformCallbacks::new().on_initializing(|initializer| {
//!         initializer.add_system(Greeter);
//!     }))
//! }
//! ```

mod config;
mod context;
mod error;
mod host;
mod initializer;
mod runner;
mod system;
mod update;

pub use config::ContextConfig;
pub use context::{Context, ContextState};
pub use error::{ContextError, Result};
pub use host::ContextHost;
pub use initializer::ContextInitializer;
pub use runner::{
    init_logging, InitializedCallback, InitializingCallback, Platform, PlatformCallbacks,
    PlatformConfig, PlatformHost, ShuttingDownCallback,
};
pub use system::{AsAny, System};
pub use update::{
    ContextUpdateFunctionInfo, ContextUpdateInfo, UpdateFunction, UpdateFunctionHandle,
    UpdateStage,
};

// Re-export commonly used types for convenience
pub use sedulous_core::{Time, TimeSpan, TimeTracker};
