//! # PTZ Bridge
//!
//! Drive a VISCA pan-tilt-zoom camera over RS-232/RS-422 with a gamepad.
//!
//! Left stick pans and tilts, right stick zooms, face buttons and the hat
//! recall presets. Holding Menu and/or Start shifts the preset inputs into
//! the hidden bank or into preset-set mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use ptz_bridge::bridge;
use ptz_bridge::config::Config;

/// Configuration file used when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "ptz-bridge.log";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "ptz-bridge", version, about)]
struct Args {
    /// Serial port of the camera (overrides `serial.port`)
    port: Option<String>,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

/// Load the configuration named on the command line
///
/// A missing file at the default path yields the built-in defaults; a
/// missing file the user named explicitly is an error.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if args.config.exists() {
        Config::load(&args.config)
            .with_context(|| format!("Failed to load {}", args.config.display()))?
    } else if args.config == Path::new(DEFAULT_CONFIG_PATH) {
        Config::default()
    } else {
        bail!("Configuration file {} not found", args.config.display());
    };

    if let Some(port) = &args.port {
        config.serial.port = port.clone();
        config.validate()?;
    }

    Ok(config)
}

/// Set up console logging, plus a daily rolling file when `log_dir` is set
///
/// The returned guard flushes the file writer and must live as long as the
/// process.
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let (file_layer, guard) = if config.logging.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.logging.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Main entry point for PTZ Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse arguments and load configuration
///    - Set up logging
///
/// 2. **Session**
///    - Open the serial port and query the camera's power state
///    - Start the gamepad sampler thread
///    - Dispatch commands every `timing.cycle_period_ms`
///
/// 3. **Supervision**
///    - Link failure (cable pulled, port vanished): wait
///      `serial.reconnect_backoff_ms`, then start a new session
///    - Fatal failure (gamepad backend, configuration): report the
///      subsystem and exit
///    - Ctrl+C: clean exit
///
/// # Examples
///
/// ```bash
/// cargo run --release -- /dev/ttyUSB0
/// ```
///
/// Expected output:
/// ```text
/// INFO ptz_bridge: PTZ Bridge v0.1.0 starting...
/// INFO ptz_bridge::serial: Opened VISCA port /dev/ttyUSB0 at 9600 baud
/// INFO ptz_bridge::controller::sampler: Joystick 0 connected
/// INFO ptz_bridge::bridge: Dispatched command: preset_recall(0)
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let _log_guard = init_logging(&config);

    info!("PTZ Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Camera {} on {} at {} baud",
        config.serial.address, config.serial.port, config.serial.baud_rate
    );
    info!("Press Ctrl+C to exit");

    let backoff = Duration::from_millis(config.serial.reconnect_backoff_ms);
    let mut sessions: u64 = 0;

    loop {
        sessions += 1;
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };

        match bridge::run_session(&config, shutdown).await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            Err(e) if e.is_link_failure() => {
                warn!("Session {} ended: {}", sessions, e);
                warn!("Restarting in {:?}", backoff);

                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down...");
                        break;
                    }
                }
            }
            Err(e) => {
                let subsystem = e.subsystem();
                error!("Fatal {} error: {}", subsystem, e);
                return Err(e).with_context(|| format!("{} failure", subsystem));
            }
        }
    }

    Ok(())
}
