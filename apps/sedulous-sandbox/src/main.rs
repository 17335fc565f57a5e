//! Sedulous Sandbox
//!
//! Runs the frame scheduler headless with a couple of demo systems: one logs
//! every variable update, one counts fixed steps.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p sedulous-sandbox -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `-f, --frames <N>`: Exit after N frames (default: 300)
//! - `--fps <N>`: Target frames per second (default: 60)
//! - `--fixed-rate <HZ>`: Fixed update rate (default: 60)
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod systems;

use sedulous_app::{ContextConfig, Platform, PlatformCallbacks, PlatformConfig};

use crate::systems::{FixedStepSystem, TestSystem};

const DEFAULT_FRAMES: u64 = 300;
const DEFAULT_FPS: u32 = 60;
const DEFAULT_FIXED_RATE: u32 = 60;

/// Command line options.
struct Options {
    frames: u64,
    fps: u32,
    fixed_rate: u32,
}

impl Options {
    fn from_args() -> Self {
        let mut options = Self {
            frames: DEFAULT_FRAMES,
            fps: DEFAULT_FPS,
            fixed_rate: DEFAULT_FIXED_RATE,
        };

        let args: Vec<String> = std::env::args().collect();
        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1);
            match args[i].as_str() {
                "-f" | "--frames" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        options.frames = v;
                        i += 1;
                    }
                }
                "--fps" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        options.fps = v;
                        i += 1;
                    }
                }
                "--fixed-rate" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        options.fixed_rate = v;
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        options
    }
}

fn main() -> anyhow::Result<()> {
    // Check for help flag before starting the loop
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    let options = Options::from_args();

    let config = PlatformConfig::new("Sedulous Sandbox")
        .with_context_config(ContextConfig::new().with_fixed_update_rate(options.fixed_rate))
        .with_target_fps(options.fps)
        .with_max_frames(options.frames);

    let mut platform = Platform::new(config)?;
    platform.run(
        PlatformCallbacks::new()
            .on_initializing(|initializer| {
                initializer
                    .add_system(TestSystem::new())
                    .add_system(FixedStepSystem::new());
            })
            .on_initialized(|context| {
                tracing::info!(
                    "Running with {} system(s), fixed step {}",
                    context.system_count(),
                    context.target_elapsed_time()
                );
            }),
    )
}

fn print_help() {
    eprintln!(
        "Sedulous Sandbox

USAGE:
    cargo run -p sedulous-sandbox -- [OPTIONS]

OPTIONS:
    -f, --frames <N>        Exit after N frames (default: {DEFAULT_FRAMES})
    --fps <N>               Target frames per second (default: {DEFAULT_FPS})
    --fixed-rate <HZ>       Fixed update rate (default: {DEFAULT_FIXED_RATE})
    -h, --help              Print this help message

EXAMPLES:
    # Run 5 seconds at 60 FPS
    cargo run -p sedulous-sandbox

    # Watch per-frame timing
    RUST_LOG=debug cargo run -p sedulous-sandbox -- --frames 30

    # Slow frames against a fast fixed step
    cargo run -p sedulous-sandbox -- --fps 10 --fixed-rate 120

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
