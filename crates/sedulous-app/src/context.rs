//! Frame update scheduler.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::cmp::Reverse;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use sedulous_core::{Time, TimeSpan, TimeTracker};
use tracing::{debug, trace, warn};

use crate::config::ContextConfig;
use crate::error::{ContextError, Result};
use crate::host::ContextHost;
use crate::initializer::ContextInitializer;
use crate::system::System;
use crate::update::{
    ContextUpdateFunctionInfo, ContextUpdateInfo, PendingUpdateFunctions,
    RegisteredUpdateFunction, UpdateFunctionHandle, UpdateStage,
};

type PanicPayload = Box<dyn Any + Send + 'static>;

/// Lifecycle of a [`Context`].
///
/// ```text
/// Uninitialized ─initialize()─> Initializing ─ok─> Running ─shutdown()─> ShuttingDown ─> Shutdown
///       ^                            │                 ^
///       └────────rollback────────────┘                 └─ initialize() again (additional batch)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContextState {
    #[default]
    Uninitialized,
    Initializing,
    Running,
    ShuttingDown,
    Shutdown,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::ShuttingDown => "shutting down",
            Self::Shutdown => "shut down",
        })
    }
}

/// Owns the systems and drives staged per-frame updates.
///
/// All work happens synchronously on the thread calling [`Context::update`].
/// Update functions may register or unregister update functions through the
/// `&Context` they receive; those changes are queued and applied at the start
/// of the next `update`, never mid-dispatch.
pub struct Context {
    host: Arc<dyn ContextHost>,
    state: ContextState,
    systems: Vec<Box<dyn System>>,

    pre_update_time_tracker: TimeTracker,
    fixed_update_time_tracker: TimeTracker,
    variable_update_time_tracker: TimeTracker,
    post_update_time_tracker: TimeTracker,
    accumulated_elapsed_time: TimeSpan,

    target_elapsed_time: TimeSpan,
    inactive_sleep_time: TimeSpan,

    update_functions: [Vec<RegisteredUpdateFunction>; UpdateStage::COUNT],
    /// Stage whose registry is detached for dispatch, and its length.
    dispatching: Option<(UpdateStage, usize)>,
    pending: RefCell<PendingUpdateFunctions>,
    next_update_function_id: Cell<u64>,
}

impl Context {
    /// Upper bound on the fixed-step accumulator, limiting catch-up after a
    /// stall.
    pub const MAX_ELAPSED_TIME: TimeSpan =
        TimeSpan::from_ticks(500 * TimeSpan::TICKS_PER_MILLISECOND);
    /// Default fixed step (60 Hz).
    pub const DEFAULT_TARGET_ELAPSED_TIME: TimeSpan =
        TimeSpan::from_ticks(TimeSpan::TICKS_PER_SECOND / 60);
    /// Default pause per update while the host is suspended.
    pub const DEFAULT_INACTIVE_SLEEP_TIME: TimeSpan =
        TimeSpan::from_ticks(20 * TimeSpan::TICKS_PER_MILLISECOND);

    /// Create a context with the default configuration.
    pub fn new(host: Arc<dyn ContextHost>) -> Self {
        let config = ContextConfig::default();
        Self {
            host,
            state: ContextState::Uninitialized,
            systems: Vec::new(),
            pre_update_time_tracker: TimeTracker::new(),
            fixed_update_time_tracker: TimeTracker::new(),
            variable_update_time_tracker: TimeTracker::new(),
            post_update_time_tracker: TimeTracker::new(),
            accumulated_elapsed_time: TimeSpan::ZERO,
            target_elapsed_time: config.target_elapsed_time,
            inactive_sleep_time: config.inactive_sleep_time,
            update_functions: Default::default(),
            dispatching: None,
            pending: RefCell::default(),
            next_update_function_id: Cell::new(0),
        }
    }

    /// Create a context with a validated configuration.
    pub fn with_config(host: Arc<dyn ContextHost>, config: ContextConfig) -> Result<Self> {
        config.validate()?;
        let mut context = Self::new(host);
        context.target_elapsed_time = config.target_elapsed_time;
        context.inactive_sleep_time = config.inactive_sleep_time;
        Ok(context)
    }

    /// The host this context reports to.
    #[must_use]
    pub fn host(&self) -> &dyn ContextHost {
        self.host.as_ref()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ContextState {
        self.state
    }

    /// Length of one fixed update step.
    #[must_use]
    pub const fn target_elapsed_time(&self) -> TimeSpan {
        self.target_elapsed_time
    }

    /// Change the fixed step. Takes effect on the next update.
    pub fn set_target_elapsed_time(&mut self, target_elapsed_time: TimeSpan) -> Result<()> {
        if target_elapsed_time <= TimeSpan::ZERO {
            return Err(ContextError::InvalidTargetElapsedTime(target_elapsed_time));
        }
        self.target_elapsed_time = target_elapsed_time;
        Ok(())
    }

    /// Pause applied to each update while the host is suspended.
    #[must_use]
    pub const fn inactive_sleep_time(&self) -> TimeSpan {
        self.inactive_sleep_time
    }

    /// Change the suspended-host pause. Zero or negative disables it.
    pub fn set_inactive_sleep_time(&mut self, inactive_sleep_time: TimeSpan) {
        self.inactive_sleep_time = inactive_sleep_time;
    }

    /// Owned systems, in initialization order.
    pub fn systems(&self) -> impl Iterator<Item = &(dyn System + 'static)> {
        self.systems.iter().map(|system| &**system)
    }

    /// Number of owned systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Number of update functions currently applied to `stage`.
    ///
    /// Pending registrations are not counted.
    #[must_use]
    pub fn update_function_count(&self, stage: UpdateStage) -> usize {
        match self.dispatching {
            Some((dispatching, len)) if dispatching == stage => len,
            _ => self.update_functions[stage.index()].len(),
        }
    }

    /// First system of type `T`, in initialization order.
    #[must_use]
    pub fn get_system<T: System>(&self) -> Option<&T> {
        self.systems.iter().find_map(|system| {
            let system: &dyn System = &**system;
            system.as_any().downcast_ref::<T>()
        })
    }

    /// Like [`Context::get_system`], but reports a missing system as an error.
    pub fn try_get_system<T: System>(&self) -> Result<&T> {
        self.get_system::<T>()
            .ok_or(ContextError::SystemNotFound(std::any::type_name::<T>()))
    }

    /// Initialize a batch of systems, in order.
    ///
    /// Stops at the first system whose `on_initialize` fails, shuts down the
    /// systems of this batch that did initialize (in reverse order), and
    /// leaves the system list as it was before the call. A panicking
    /// `on_initialize` is rolled back the same way before the panic resumes.
    pub fn initialize(&mut self, initializer: ContextInitializer) -> Result<()> {
        self.ensure_state(
            "initialize",
            &[ContextState::Uninitialized, ContextState::Running],
        )?;

        let previous_state = self.state;
        self.state = ContextState::Initializing;
        let batch_start = self.systems.len();

        for mut system in initializer.into_systems() {
            // Systems of this batch are pushed as they succeed, so later
            // systems can already look up earlier ones.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| system.on_initialize(&*self)));
            let source = match outcome {
                Ok(Ok(())) => {
                    debug!("System '{}' initialized", system.name());
                    self.systems.push(system);
                    continue;
                }
                Ok(Err(source)) => source,
                Err(payload) => {
                    warn!("System '{}' panicked during initialization, rolling back", system.name());
                    // The first panic wins over any raised while rolling back.
                    let _ = self.rollback_systems(batch_start);
                    self.state = previous_state;
                    panic::resume_unwind(payload);
                }
            };

            let name = system.name().to_owned();
            warn!("System '{name}' failed to initialize, rolling back: {source:#}");
            let rollback_panic = self.rollback_systems(batch_start);
            self.state = previous_state;
            if let Some(payload) = rollback_panic {
                panic::resume_unwind(payload);
            }
            return Err(ContextError::SystemInitialization {
                system: name,
                source,
            });
        }

        self.state = ContextState::Running;
        Ok(())
    }

    /// Shut down and drop the systems added after `batch_start`.
    fn rollback_systems(&mut self, batch_start: usize) -> Option<PanicPayload> {
        let (_, panic_payload) = self.shut_down_systems_above(batch_start);
        panic_payload
    }

    /// Pop systems off the back until `len` remain, calling `on_shutdown` on
    /// each. Every popped system is shut down even if an earlier one panics;
    /// the first panic is returned. Popped systems come back last first.
    fn shut_down_systems_above(&mut self, len: usize) -> (Vec<Box<dyn System>>, Option<PanicPayload>) {
        let mut shut_down = Vec::with_capacity(self.systems.len().saturating_sub(len));
        let mut panic_payload = None;

        while self.systems.len() > len {
            let Some(mut system) = self.systems.pop() else {
                break;
            };
            debug!("Shutting down system '{}'", system.name());
            // Each system can still see the systems initialized before it.
            if let Err(payload) =
                panic::catch_unwind(AssertUnwindSafe(|| system.on_shutdown(&*self)))
            {
                warn!("System '{}' panicked during shutdown", system.name());
                panic_payload.get_or_insert(payload);
            }
            shut_down.push(system);
        }

        (shut_down, panic_payload)
    }

    /// Shut down every owned system, last initialized first.
    ///
    /// A panicking `on_shutdown` does not stop the remaining systems from
    /// shutting down; the first panic resumes once the context is `Shutdown`.
    pub fn shutdown(&mut self) -> Result<()> {
        self.ensure_state(
            "shut down",
            &[ContextState::Uninitialized, ContextState::Running],
        )?;

        self.state = ContextState::ShuttingDown;

        let (mut shut_down, panic_payload) = self.shut_down_systems_above(0);
        shut_down.reverse();
        self.systems = shut_down;

        self.state = ContextState::Shutdown;
        if let Some(payload) = panic_payload {
            panic::resume_unwind(payload);
        }
        Ok(())
    }

    /// Queue an update function for registration at the start of the next
    /// [`Context::update`].
    pub fn register_update_function(&self, info: ContextUpdateFunctionInfo) -> UpdateFunctionHandle {
        let id = self.next_update_function_id.get();
        self.next_update_function_id.set(id + 1);

        let handle = UpdateFunctionHandle::new(id, info.stage);
        self.pending.borrow_mut().to_register.push((handle, info));
        handle
    }

    /// Queue several update functions, returning their handles in order.
    pub fn register_update_functions(
        &self,
        infos: impl IntoIterator<Item = ContextUpdateFunctionInfo>,
    ) -> Vec<UpdateFunctionHandle> {
        infos
            .into_iter()
            .map(|info| self.register_update_function(info))
            .collect()
    }

    /// Queue an update function for removal at the start of the next
    /// [`Context::update`]. Unknown handles are ignored.
    pub fn unregister_update_function(&self, handle: UpdateFunctionHandle) {
        self.pending.borrow_mut().to_unregister.push(handle);
    }

    /// Queue several update functions for removal.
    pub fn unregister_update_functions(
        &self,
        handles: impl IntoIterator<Item = UpdateFunctionHandle>,
    ) {
        self.pending.borrow_mut().to_unregister.extend(handles);
    }

    /// Run one frame given the real elapsed time of that frame.
    ///
    /// Applies queued registrations, then unregistrations, optionally sleeps
    /// while the host is suspended, advances the fixed-step accumulator and
    /// dispatches pre, fixed (once per due step), variable and post stages.
    pub fn update(&mut self, time: Time) -> Result<()> {
        self.ensure_state(
            "update",
            &[ContextState::Uninitialized, ContextState::Running],
        )?;

        self.process_update_functions_to_register();
        self.process_update_functions_to_unregister();

        if self.inactive_sleep_time > TimeSpan::ZERO && self.host.suspended() {
            trace!("Host suspended, sleeping for {}", self.inactive_sleep_time);
            thread::sleep(self.inactive_sleep_time.to_duration());
        }

        self.accumulated_elapsed_time = self
            .accumulated_elapsed_time
            .try_add(time.elapsed_time)?
            .min(Self::MAX_ELAPSED_TIME);

        // Pre-update
        let pre_update_time = self.pre_update_time_tracker.increment(time.elapsed_time)?;
        self.run_update_functions(UpdateStage::PreUpdate, pre_update_time);

        // Fixed update
        let step = self.target_elapsed_time;
        let fixed_ticks_to_run = self.accumulated_elapsed_time.ticks() / step.ticks();
        if fixed_ticks_to_run > 0 {
            // fixed_ticks_to_run * step <= accumulated, so this cannot overflow.
            self.accumulated_elapsed_time = TimeSpan::from_ticks(
                self.accumulated_elapsed_time.ticks() - fixed_ticks_to_run * step.ticks(),
            );

            for _ in 0..fixed_ticks_to_run {
                let fixed_update_time = self.fixed_update_time_tracker.increment(step)?;
                self.run_update_functions(UpdateStage::FixedUpdate, fixed_update_time);
            }
        }

        // Variable update
        let variable_update_time = self
            .variable_update_time_tracker
            .increment(time.elapsed_time)?;
        self.run_update_functions(UpdateStage::VariableUpdate, variable_update_time);

        // Post-update
        let post_update_time = self.post_update_time_tracker.increment(time.elapsed_time)?;
        self.run_update_functions(UpdateStage::PostUpdate, post_update_time);

        Ok(())
    }

    fn run_update_functions(&mut self, stage: UpdateStage, time: Time) {
        let index = stage.index();
        if self.update_functions[index].is_empty() {
            return;
        }

        // Detach the stage's registry so its functions can borrow the context.
        let mut functions = std::mem::take(&mut self.update_functions[index]);
        self.dispatching = Some((stage, functions.len()));

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let info = ContextUpdateInfo {
                context: &*self,
                time,
            };
            for registered in &mut functions {
                (registered.function)(&info);
            }
        }));

        // Reattach before resuming a panic so the registry survives it.
        self.update_functions[index] = functions;
        self.dispatching = None;
        if let Err(payload) = outcome {
            panic::resume_unwind(payload);
        }
    }

    fn process_update_functions_to_register(&mut self) {
        let to_register = std::mem::take(&mut self.pending.get_mut().to_register);
        if to_register.is_empty() {
            return;
        }

        trace!("Registering {} update function(s)", to_register.len());
        for (handle, info) in to_register {
            self.update_functions[handle.stage().index()].push(RegisteredUpdateFunction {
                id: handle.id(),
                priority: info.priority,
                function: info.function,
            });
        }
        self.sort_update_functions();
    }

    fn process_update_functions_to_unregister(&mut self) {
        let to_unregister = std::mem::take(&mut self.pending.get_mut().to_unregister);
        if to_unregister.is_empty() {
            return;
        }

        trace!("Unregistering {} update function(s)", to_unregister.len());
        for handle in to_unregister {
            let functions = &mut self.update_functions[handle.stage().index()];
            if let Some(index) = functions.iter().position(|f| f.id == handle.id()) {
                functions.remove(index);
            }
        }
        self.sort_update_functions();
    }

    /// Descending priority. `sort_by_key` is stable, so ties keep
    /// registration order.
    fn sort_update_functions(&mut self) {
        for functions in &mut self.update_functions {
            functions.sort_by_key(|f| Reverse(f.priority));
        }
    }

    fn ensure_state(&self, operation: &'static str, allowed: &[ContextState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ContextError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state)
            .field("systems", &self.systems.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("target_elapsed_time", &self.target_elapsed_time)
            .field("inactive_sleep_time", &self.inactive_sleep_time)
            .field("accumulated_elapsed_time", &self.accumulated_elapsed_time)
            .finish_non_exhaustive()
    }
}
