//! Sandbox systems.

use std::cell::Cell;

use sedulous_app::{
    Context, ContextUpdateFunctionInfo, ContextUpdateInfo, System, UpdateFunctionHandle,
    UpdateStage,
};
use tracing::{debug, info};

/// Logs the variable frame time, looking itself up through the context.
#[derive(Default)]
pub struct TestSystem {
    handle: Option<UpdateFunctionHandle>,
    updates: Cell<u64>,
}

impl TestSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn on_update(info: &ContextUpdateInfo<'_>) {
        if let Some(system) = info.context.get_system::<Self>() {
            system.print_info(info);
        }
    }

    fn print_info(&self, info: &ContextUpdateInfo<'_>) {
        self.updates.set(self.updates.get() + 1);
        debug!(
            "{} update #{}: {:.6}s",
            self.name(),
            self.updates.get(),
            info.time.elapsed_time.total_seconds()
        );
    }
}

impl System for TestSystem {
    fn name(&self) -> &str {
        "Test"
    }

    fn on_initialize(&mut self, context: &Context) -> anyhow::Result<()> {
        self.handle = Some(context.register_update_function(ContextUpdateFunctionInfo::new(
            Self::on_update,
        )));
        Ok(())
    }

    fn on_shutdown(&mut self, context: &Context) {
        if let Some(handle) = self.handle.take() {
            context.unregister_update_function(handle);
        }
        info!("{} saw {} variable update(s)", self.name(), self.updates.get());
    }
}

/// Counts fixed steps and reports how far simulated time got.
#[derive(Default)]
pub struct FixedStepSystem {
    handle: Option<UpdateFunctionHandle>,
    steps: Cell<u64>,
}

impl FixedStepSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn on_fixed_update(info: &ContextUpdateInfo<'_>) {
        if let Some(system) = info.context.get_system::<Self>() {
            system.steps.set(system.steps.get() + 1);
        }
    }
}

impl System for FixedStepSystem {
    fn name(&self) -> &str {
        "FixedStep"
    }

    fn on_initialize(&mut self, context: &Context) -> anyhow::Result<()> {
        let info = ContextUpdateFunctionInfo::new(Self::on_fixed_update)
            .with_stage(UpdateStage::FixedUpdate)
            .with_priority(10);
        self.handle = Some(context.register_update_function(info));
        Ok(())
    }

    fn on_shutdown(&mut self, context: &Context) {
        if let Some(handle) = self.handle.take() {
            context.unregister_update_function(handle);
        }
        let simulated = context.target_elapsed_time().total_seconds() * self.steps.get() as f64;
        info!(
            "{} ran {} fixed step(s), {:.3}s simulated",
            self.name(),
            self.steps.get(),
            simulated
        );
    }
}
