//! Platform loop driver.
//!
//! A headless rendition of the platform main loop: it measures real elapsed
//! time with a [`Stopwatch`], feeds it to the [`Context`] once per frame, and
//! keeps going until the host is asked to exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sedulous_core::{Stopwatch, TimeTracker};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ContextConfig;
use crate::context::Context;
use crate::error::Result;
use crate::host::ContextHost;
use crate::initializer::ContextInitializer;

/// Platform configuration.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Application title, used in logs.
    pub title: String,
    /// Scheduler timing.
    pub context: ContextConfig,
    /// Target frames per second (None for unlimited).
    pub target_fps: Option<u32>,
    /// Exit after this many frames (None to run until exit is requested).
    pub max_frames: Option<u64>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Sedulous".to_string(),
            context: ContextConfig::default(),
            target_fps: None,
            max_frames: None,
        }
    }
}

impl PlatformConfig {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the scheduler timing.
    #[must_use]
    pub fn with_context_config(mut self, context: ContextConfig) -> Self {
        self.context = context;
        self
    }

    /// Set the target FPS.
    #[must_use]
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = Some(fps);
        self
    }

    /// Stop after a fixed number of frames.
    #[must_use]
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }
}

/// Host state shared between the platform and its context.
#[derive(Debug, Default)]
pub struct PlatformHost {
    suspended: AtomicBool,
    running: AtomicBool,
}

impl PlatformHost {
    /// Whether the main loop should keep running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Mark the host suspended (minimized, backgrounded) or active.
    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

impl ContextHost for PlatformHost {
    fn suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    fn exit(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("Exit requested");
        }
    }
}

/// Called with the initializer before the context initializes.
pub type InitializingCallback = Box<dyn FnOnce(&mut ContextInitializer)>;
/// Called right after the context initialized its systems.
pub type InitializedCallback = Box<dyn FnOnce(&Context)>;
/// Called right before the context shuts down.
pub type ShuttingDownCallback = Box<dyn FnOnce(&Context)>;

/// Optional hooks around context startup and teardown.
#[derive(Default)]
pub struct PlatformCallbacks {
    on_initializing: Option<InitializingCallback>,
    on_initialized: Option<InitializedCallback>,
    on_shutting_down: Option<ShuttingDownCallback>,
}

impl PlatformCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add systems before the context initializes.
    #[must_use]
    pub fn on_initializing(mut self, callback: impl FnOnce(&mut ContextInitializer) + 'static) -> Self {
        self.on_initializing = Some(Box::new(callback));
        self
    }

    /// Inspect the context once its systems are up.
    #[must_use]
    pub fn on_initialized(mut self, callback: impl FnOnce(&Context) + 'static) -> Self {
        self.on_initialized = Some(Box::new(callback));
        self
    }

    /// Inspect the context before it shuts down.
    #[must_use]
    pub fn on_shutting_down(mut self, callback: impl FnOnce(&Context) + 'static) -> Self {
        self.on_shutting_down = Some(Box::new(callback));
        self
    }
}

/// Initialize logging.
///
/// Honors `RUST_LOG`, defaulting to `info`. Safe to call more than once; only
/// the first call installs a subscriber.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// Drives a [`Context`] from a frame loop.
pub struct Platform {
    config: PlatformConfig,
    host: Arc<PlatformHost>,
    context: Context,
    timer: Stopwatch,
    time_tracker: TimeTracker,
    target_frame_time: Option<Duration>,
    frame_count: u64,
    // FPS tracking
    min_fps: f64,
    max_fps: f64,
    fps_sum: f64,
}

impl Platform {
    /// Create a platform and its context.
    pub fn new(config: PlatformConfig) -> Result<Self> {
        let host = Arc::new(PlatformHost::default());
        let context = Context::with_config(host.clone(), config.context)?;
        let target_frame_time = config
            .target_fps
            .filter(|&fps| fps > 0)
            .map(|fps| Duration::from_nanos(1_000_000_000 / u64::from(fps)));

        Ok(Self {
            config,
            host,
            context,
            timer: Stopwatch::new(),
            time_tracker: TimeTracker::new(),
            target_frame_time,
            frame_count: 0,
            min_fps: f64::MAX,
            max_fps: 0.0,
            fps_sum: 0.0,
        })
    }

    /// Shared host state, for marking the platform suspended.
    #[must_use]
    pub const fn host(&self) -> &Arc<PlatformHost> {
        &self.host
    }

    /// The driven context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable access to the driven context, e.g. to retune its timing.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Whether the main loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.host.is_running()
    }

    /// Frames run since the main loop started.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Run the main loop until the host is asked to exit.
    ///
    /// This initializes logging, initializes the context's systems, runs
    /// frames, and shuts the context down. A failed system initialization
    /// is returned without entering the loop. A frame error stops the loop,
    /// shuts down, and is then returned.
    pub fn run(&mut self, callbacks: PlatformCallbacks) -> anyhow::Result<()> {
        init_logging();

        info!("{} starting...", self.config.title);

        let PlatformCallbacks {
            on_initializing,
            on_initialized,
            on_shutting_down,
        } = callbacks;

        self.start_main_loop(on_initializing, on_initialized)?;

        let mut frame_error = None;
        while self.host.is_running() {
            if let Err(e) = self.run_one_frame() {
                error!("Frame error: {e}");
                self.host.exit();
                frame_error = Some(e);
            }
        }

        self.stop_main_loop(on_shutting_down)?;

        match frame_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Build the initializer, initialize the context, and start timing.
    ///
    /// The host counts as running from the start, so an exit requested by a
    /// system or callback during startup is kept and no frame runs.
    pub fn start_main_loop(
        &mut self,
        on_initializing: Option<InitializingCallback>,
        on_initialized: Option<InitializedCallback>,
    ) -> Result<()> {
        self.host.set_running(true);

        let mut initializer = ContextInitializer::new();
        if let Some(callback) = on_initializing {
            callback(&mut initializer);
        }

        info!("Initializing {} system(s)...", initializer.len());
        if let Err(e) = self.context.initialize(initializer) {
            self.host.set_running(false);
            return Err(e);
        }

        if let Some(callback) = on_initialized {
            callback(&self.context);
        }

        self.timer.restart();
        info!("Main loop started");
        Ok(())
    }

    /// Measure the time since the previous frame and update the context once.
    pub fn run_one_frame(&mut self) -> Result<()> {
        let frame_start = Instant::now();

        let elapsed = self.timer.elapsed()?;
        self.timer.restart();
        let time = self.time_tracker.increment(elapsed)?;

        self.context.update(time)?;

        self.frame_count += 1;
        let dt = elapsed.total_seconds();
        if dt > 0.0 {
            let fps = 1.0 / dt;
            self.min_fps = self.min_fps.min(fps);
            self.max_fps = self.max_fps.max(fps);
            self.fps_sum += fps;
        }

        if let Some(max_frames) = self.config.max_frames {
            if self.frame_count >= max_frames {
                self.host.exit();
            }
        }

        // Frame pacing
        if let Some(target) = self.target_frame_time {
            let spent = frame_start.elapsed();
            if spent < target {
                thread::sleep(target - spent);
            }
        }

        Ok(())
    }

    /// Stop timing and shut the context down.
    pub fn stop_main_loop(&mut self, on_shutting_down: Option<ShuttingDownCallback>) -> Result<()> {
        self.timer.stop();

        if let Some(callback) = on_shutting_down {
            callback(&self.context);
        }

        self.context.shutdown()?;
        self.host.set_running(false);

        if self.frame_count > 0 {
            let avg_fps = self.fps_sum / self.frame_count as f64;
            info!("FPS Statistics:");
            info!("  Min: {:.1}", self.min_fps);
            info!("  Max: {:.1}", self.max_fps);
            info!("  Avg: {:.1}", avg_fps);
            info!("  Total frames: {}", self.frame_count);
        }

        info!("Main loop stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContextError;
    use crate::system::System;
    use crate::update::{ContextUpdateFunctionInfo, ContextUpdateInfo};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct FrameCounter {
        frames: Rc<Cell<u64>>,
    }

    impl System for FrameCounter {
        fn name(&self) -> &str {
            "frame-counter"
        }

        fn on_initialize(&mut self, context: &Context) -> anyhow::Result<()> {
            let frames = Rc::clone(&self.frames);
            context.register_update_function(ContextUpdateFunctionInfo::new(
                move |_: &ContextUpdateInfo<'_>| frames.set(frames.get() + 1),
            ));
            Ok(())
        }
    }

    struct Broken;

    /// Asks the host to exit while initializing.
    struct ExitOnStart;

    impl System for ExitOnStart {
        fn name(&self) -> &str {
            "exit-on-start"
        }

        fn on_initialize(&mut self, context: &Context) -> anyhow::Result<()> {
            context.host().exit();
            Ok(())
        }
    }

    impl System for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn on_initialize(&mut self, _context: &Context) -> anyhow::Result<()> {
            anyhow::bail!("no device")
        }
    }

    fn headless(max_frames: u64) -> Platform {
        let config = PlatformConfig::new("test").with_max_frames(max_frames);
        Platform::new(config).unwrap()
    }

    #[test]
    fn runs_until_max_frames_and_invokes_callbacks_in_order() {
        let mut platform = headless(3);
        let frames = Rc::new(Cell::new(0));
        let events = Rc::new(RefCell::new(Vec::new()));

        let system_frames = Rc::clone(&frames);
        let (initializing, initialized, shutting_down) =
            (Rc::clone(&events), Rc::clone(&events), Rc::clone(&events));
        let callbacks = PlatformCallbacks::new()
            .on_initializing(move |initializer| {
                initializing.borrow_mut().push("initializing");
                initializer.add_system(FrameCounter {
                    frames: system_frames,
                });
            })
            .on_initialized(move |context| {
                assert_eq!(context.system_count(), 1);
                initialized.borrow_mut().push("initialized");
            })
            .on_shutting_down(move |_| shutting_down.borrow_mut().push("shutting_down"));

        platform.run(callbacks).unwrap();

        assert_eq!(platform.frame_count(), 3);
        assert_eq!(frames.get(), 3);
        assert!(!platform.is_running());
        assert_eq!(*events.borrow(), ["initializing", "initialized", "shutting_down"]);
    }

    #[test]
    fn update_function_can_request_exit() {
        let mut platform = headless(100);

        let callbacks = PlatformCallbacks::new().on_initialized(|context| {
            context.register_update_function(ContextUpdateFunctionInfo::new(
                |info: &ContextUpdateInfo<'_>| info.context.host().exit(),
            ));
        });
        platform.run(callbacks).unwrap();

        // The exit request is honored after the frame that made it.
        assert_eq!(platform.frame_count(), 1);
    }

    #[test]
    fn failed_initialization_does_not_enter_the_loop() {
        let mut platform = headless(10);
        let initialized = Rc::new(Cell::new(false));
        let flag = Rc::clone(&initialized);

        let callbacks = PlatformCallbacks::new()
            .on_initializing(|initializer| {
                initializer.add_system(Broken);
            })
            .on_initialized(move |_| flag.set(true));

        let error = platform.run(callbacks).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<ContextError>(),
            Some(ContextError::SystemInitialization { .. })
        ));
        assert!(!initialized.get());
        assert_eq!(platform.frame_count(), 0);
        assert!(!platform.is_running());
    }

    #[test]
    fn exit_requested_during_startup_is_kept() {
        let mut platform = headless(10);
        let callbacks = PlatformCallbacks::new().on_initializing(|initializer| {
            initializer.add_system(ExitOnStart);
        });
        platform.run(callbacks).unwrap();
        assert_eq!(platform.frame_count(), 0);

        let mut platform = headless(10);
        let callbacks = PlatformCallbacks::new().on_initialized(|context| context.host().exit());
        platform.run(callbacks).unwrap();
        assert_eq!(platform.frame_count(), 0);
    }

    #[test]
    fn manual_stepping() {
        let mut platform = headless(u64::MAX);
        platform.start_main_loop(None, None).unwrap();
        assert!(platform.is_running());

        platform.run_one_frame().unwrap();
        platform.run_one_frame().unwrap();
        assert_eq!(platform.frame_count(), 2);

        platform.stop_main_loop(None).unwrap();
        assert!(!platform.is_running());
    }

    #[test]
    fn host_reports_suspension() {
        let platform = headless(1);
        assert!(!platform.context().host().suspended());

        platform.host().set_suspended(true);
        assert!(platform.context().host().suspended());
    }

    #[test]
    fn frame_pacing_sleeps_to_target() {
        let config = PlatformConfig::new("paced")
            .with_target_fps(100)
            .with_max_frames(2);
        let mut platform = Platform::new(config).unwrap();

        let started = Instant::now();
        platform.run(PlatformCallbacks::new()).unwrap();

        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
