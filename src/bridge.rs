//! # Bridge Session
//!
//! One dispatch session: the sampler thread publishes controller snapshots,
//! and a fixed-period loop turns the latest snapshot into camera commands.
//!
//! Each cycle runs to completion before the next tick; commands are sent
//! one after another and a slow camera delays the next cycle rather than
//! overlapping it.
//!
//! A session ends when:
//! - the sampler reports a fatal input error
//! - the serial link to the camera is lost
//! - shutdown is requested

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::controller::driver::GilrsDriver;
use crate::controller::sampler::spawn_sampler;
use crate::controller::state::ControllerState;
use crate::dispatch::{Dispatcher, DispatcherSettings, PtzCamera};
use crate::error::{PtzBridgeError, Result};
use crate::journal::CommandJournal;
use crate::serial::ViscaSerial;
use crate::visca::{CameraAddress, ViscaCamera};

/// Number of dispatch cycles between status log messages
pub const STATUS_LOG_CYCLES: u64 = 1500;

/// Dispatch loop bound to one camera
#[derive(Debug)]
pub struct Bridge<C: PtzCamera> {
    camera: C,
    dispatcher: Dispatcher,
    journal: Option<CommandJournal>,
    dispatched: u64,
    failed: u64,
}

impl<C: PtzCamera> Bridge<C> {
    pub fn new(camera: C, dispatcher: Dispatcher, journal: Option<CommandJournal>) -> Self {
        Self {
            camera,
            dispatcher,
            journal,
            dispatched: 0,
            failed: 0,
        }
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Commands sent successfully and commands that failed
    pub fn counters(&self) -> (u64, u64) {
        (self.dispatched, self.failed)
    }

    /// Query the camera's power state once at session start
    ///
    /// An unanswered query leaves the power state unknown; both power
    /// chords then stay available.
    ///
    /// # Errors
    ///
    /// Returns link failures; every other failure is logged.
    pub async fn initialize(&mut self) -> Result<()> {
        match self.camera.get_power().await {
            Ok(powered) => self.dispatcher.seed_power(Some(powered)),
            Err(e) if e.is_link_failure() => return Err(e),
            Err(e) => {
                warn!("Could not query camera power: {}", e);
                self.dispatcher.seed_power(None);
            }
        }
        Ok(())
    }

    /// Run one dispatch cycle and send its commands
    ///
    /// # Returns
    ///
    /// Number of commands sent successfully.
    ///
    /// # Errors
    ///
    /// Returns the first link failure. Single-command failures are logged,
    /// reported back to the dispatcher and skipped.
    pub async fn run_cycle(&mut self, state: &ControllerState, now: Instant) -> Result<usize> {
        let commands = self.dispatcher.cycle(state, now);
        let mut sent = 0;

        for command in commands {
            let outcome = command.execute(&mut self.camera).await;
            if let Some(journal) = self.journal.as_mut() {
                journal.record(&command, &outcome);
            }

            match outcome {
                Ok(()) => {
                    info!("Dispatched command: {}", command);
                    self.dispatched += 1;
                    sent += 1;
                }
                Err(e) if e.is_link_failure() => {
                    error!("Camera link lost while sending {}: {}", command, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Command {} failed: {}", command, e);
                    self.dispatcher.command_failed(&command);
                    self.failed += 1;
                }
            }
        }

        Ok(sent)
    }

    /// Run the dispatch loop until shutdown or failure
    ///
    /// # Arguments
    ///
    /// * `states` - Latest snapshot published by the sampler
    /// * `fatal` - Completes when the sampler stops with an error
    /// * `period` - Dispatch cycle period
    /// * `shutdown` - Completes when the process should stop
    ///
    /// # Errors
    ///
    /// Returns the sampler's error, or a link failure from the camera.
    pub async fn run<F>(
        &mut self,
        states: watch::Receiver<ControllerState>,
        mut fatal: oneshot::Receiver<PtzBridgeError>,
        period: Duration,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Starting dispatch loop ({:?} period)", period);
        let mut cycles: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let state = states.borrow().clone();
                    self.run_cycle(&state, Instant::now()).await?;

                    cycles += 1;
                    if cycles % STATUS_LOG_CYCLES == 0 {
                        info!(
                            "Status: {} cycles, {} commands sent, {} failed, camera {:?}",
                            cycles, self.dispatched, self.failed, self.dispatcher.power_state()
                        );
                    }
                }

                result = &mut fatal => {
                    let err = result.unwrap_or_else(|_| {
                        PtzBridgeError::InputDevice("Gamepad sampler stopped unexpectedly".to_string())
                    });
                    return Err(err);
                }

                _ = &mut shutdown => {
                    info!("Shutdown requested after {} cycles", cycles);
                    info!("Total commands sent: {} ({} failed)", self.dispatched, self.failed);
                    return Ok(());
                }
            }
        }
    }
}

/// Open the camera, start the sampler and run one session
///
/// # Errors
///
/// Returns link failures (the caller may retry) and fatal input or
/// configuration errors.
pub async fn run_session<F>(config: &Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let serial = ViscaSerial::open(&config.serial.port, config.serial.baud_rate)?;
    let address = CameraAddress::new(config.serial.address)?;
    let camera = ViscaCamera::new(
        serial,
        address,
        Duration::from_millis(config.serial.timeout_ms),
    );

    let journal = if config.journal.enabled {
        match CommandJournal::open(&config.journal.path) {
            Ok(journal) => Some(journal),
            Err(e) => {
                warn!("Command journal disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let handle = spawn_sampler(
        GilrsDriver::new,
        Duration::from_millis(config.controller.poll_interval_ms),
    )?;

    let dispatcher = Dispatcher::new(DispatcherSettings::from_config(config));
    let mut bridge = Bridge::new(camera, dispatcher, journal);
    bridge.initialize().await?;
    bridge
        .run(handle.states, handle.fatal, config.timing.cycle_period(), shutdown)
        .await
}
