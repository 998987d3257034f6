//! # Input Sampler Module
//!
//! Polls a [`GamepadDriver`] and publishes normalized [`ControllerState`]
//! snapshots.
//!
//! The sampler runs on its own OS thread (gilrs is not `Send`) and hands the
//! newest snapshot to the dispatcher through a `tokio::sync::watch` channel:
//! last write wins, nothing is queued, and the dispatcher always reads the
//! most recent state. A driver failure is reported once on a oneshot
//! channel and stops the thread.
//!
//! With several gamepads connected, the one with the lowest device id
//! drives the camera. With none connected the published state is all-rest,
//! which stops any motion in progress.

use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use super::driver::{DeviceId, GamepadDriver, HotplugEvent, RawReading};
use super::state::{Axis, Button, ControllerState, Hat};
use crate::error::{PtzBridgeError, Result};

/// Decimal places kept from raw axis values.
pub const AXIS_PRECISION: i32 = 3;

/// Rounds an axis reading to [`AXIS_PRECISION`] decimals.
#[must_use]
pub fn round_axis(value: f32) -> f32 {
    let scale = 10f32.powi(AXIS_PRECISION);
    (value * scale).round() / scale
}

/// Converts a raw driver reading into a canonical snapshot.
///
/// Buttons and axes missing from the reading are treated as released / at rest.
#[must_use]
pub fn normalize(raw: &RawReading) -> ControllerState {
    let mut state = ControllerState::new();
    for button in Button::ALL {
        state.set_button(button, raw.buttons.get(&button).copied().unwrap_or(false));
    }
    for axis in Axis::ALL {
        state.set_axis(axis, round_axis(raw.axes.get(&axis).copied().unwrap_or(0.0)));
    }
    state.hat = Hat::new(raw.hat.0, raw.hat.1);
    state
}

/// Tracks connected gamepads and produces one snapshot per call.
#[derive(Debug)]
pub struct Sampler<D: GamepadDriver> {
    driver: D,
    active: BTreeSet<DeviceId>,
}

impl<D: GamepadDriver> Sampler<D> {
    /// Creates a sampler, seeding the active set from devices already connected.
    pub fn new(mut driver: D) -> Self {
        let active = driver.list_active_devices();
        if active.is_empty() {
            warn!("No gamepad connected, waiting for one");
        }
        Self { driver, active }
    }

    /// Currently connected devices.
    #[must_use]
    pub fn active_devices(&self) -> &BTreeSet<DeviceId> {
        &self.active
    }

    /// Applies pending hot-plug events and reads the primary device.
    ///
    /// # Errors
    ///
    /// Propagates `InputDevice` errors from the driver. These are fatal.
    pub fn sample(&mut self) -> Result<ControllerState> {
        while let Some(event) = self.driver.next_hotplug()? {
            match event {
                HotplugEvent::Connected(id) => {
                    info!("Joystick {} connected", id);
                    self.active.insert(id);
                }
                HotplugEvent::Disconnected(id) => {
                    info!("Joystick {} disconnected", id);
                    self.active.remove(&id);
                }
            }
        }

        while let Some(&id) = self.active.iter().next() {
            match self.driver.poll(id)? {
                Some(raw) => return Ok(normalize(&raw)),
                None => {
                    warn!("Joystick {} vanished without a disconnect event", id);
                    self.active.remove(&id);
                }
            }
        }

        Ok(ControllerState::default())
    }
}

/// Channels connecting the sampler thread to the dispatch loop.
#[derive(Debug)]
pub struct SamplerHandle {
    /// Latest published snapshot
    pub states: watch::Receiver<ControllerState>,
    /// Completes with the error that stopped the sampler
    pub fatal: oneshot::Receiver<PtzBridgeError>,
}

/// Spawns the sampling thread.
///
/// `make_driver` runs on the new thread, so drivers that are not `Send`
/// can be used. The thread exits on driver failure or once every state
/// receiver has been dropped.
///
/// # Errors
///
/// Returns `InputDevice` if the thread cannot be spawned.
pub fn spawn_sampler<F, D>(make_driver: F, poll_interval: Duration) -> Result<SamplerHandle>
where
    F: FnOnce() -> Result<D> + Send + 'static,
    D: GamepadDriver + 'static,
{
    let (state_tx, states) = watch::channel(ControllerState::default());
    let (fatal_tx, fatal) = oneshot::channel();

    thread::Builder::new()
        .name("gamepad-sampler".to_string())
        .spawn(move || {
            let driver = match make_driver() {
                Ok(driver) => driver,
                Err(e) => {
                    error!("Gamepad driver failed to start: {}", e);
                    let _ = fatal_tx.send(e);
                    return;
                }
            };
            let mut sampler = Sampler::new(driver);

            loop {
                if state_tx.is_closed() {
                    debug!("Dispatch loop gone, stopping sampler");
                    break;
                }
                match sampler.sample() {
                    Ok(state) => {
                        state_tx.send_replace(state);
                    }
                    Err(e) => {
                        error!("Gamepad sampling failed: {}", e);
                        let _ = fatal_tx.send(e);
                        break;
                    }
                }
                thread::sleep(poll_interval);
            }
        })
        .map_err(|e| PtzBridgeError::InputDevice(format!("Failed to spawn sampler thread: {}", e)))?;

    Ok(SamplerHandle { states, fatal })
}
