//! # Gamepad Driver Module
//!
//! Abstraction over the gamepad library plus its gilrs implementation.
//!
//! The sampler only needs three things from a driver: the set of devices
//! connected at startup, hot-plug notifications, and the raw reading of one
//! device. Keeping that behind [`GamepadDriver`] lets the sampler be tested
//! without hardware.
//!
//! ## gilrs mapping (Xbox 360 layout)
//!
//! | Button | gilrs |
//! |--------|-------|
//! | North/East/South/West | `North`/`East`/`South`/`West` |
//! | L1 / R1 | `LeftTrigger` / `RightTrigger` |
//! | L2 / R2 | `LeftTrigger2` / `RightTrigger2` |
//! | Menu / Start | `Select` / `Start` |
//! | L3 / R3 | `LeftThumb` / `RightThumb` |
//! | Hat | `DPadUp`/`DPadDown`/`DPadLeft`/`DPadRight` |

use std::collections::{BTreeSet, HashMap};

use gilrs::{Event, EventType, GamepadId, Gilrs};
use tracing::{debug, info};

use super::state::{Axis, Button};
use crate::error::{PtzBridgeError, Result};

/// Driver-assigned device instance id.
pub type DeviceId = usize;

/// Connect/disconnect notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotplugEvent {
    Connected(DeviceId),
    Disconnected(DeviceId),
}

/// Unnormalized reading of one device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReading {
    pub buttons: HashMap<Button, bool>,
    /// (x, y) with x right-positive and y up-positive
    pub hat: (i8, i8),
    pub axes: HashMap<Axis, f32>,
}

/// Gamepad library collaborator.
#[cfg_attr(test, mockall::automock)]
pub trait GamepadDriver {
    /// Devices already connected when the driver was created.
    fn list_active_devices(&mut self) -> BTreeSet<DeviceId>;

    /// Next pending hot-plug notification, if any.
    ///
    /// # Errors
    ///
    /// Returns `InputDevice` if the driver can no longer deliver events.
    fn next_hotplug(&mut self) -> Result<Option<HotplugEvent>>;

    /// Current reading of `device`, or `None` if it is no longer connected.
    ///
    /// # Errors
    ///
    /// Returns `InputDevice` if the device cannot be read.
    fn poll(&mut self, device: DeviceId) -> Result<Option<RawReading>>;
}

/// [`GamepadDriver`] backed by gilrs.
///
/// `Gilrs` is not `Send`, so this driver must be created on the thread
/// that samples it.
pub struct GilrsDriver {
    gilrs: Gilrs,
    ids: HashMap<DeviceId, GamepadId>,
}

impl std::fmt::Debug for GilrsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GilrsDriver")
            .field("devices", &self.ids.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl GilrsDriver {
    /// Initializes gilrs.
    ///
    /// # Errors
    ///
    /// Returns `InputDevice` if the platform gamepad backend is unavailable.
    pub fn new() -> Result<Self> {
        info!("Initializing gilrs controller interface");
        let gilrs = Gilrs::new()
            .map_err(|e| PtzBridgeError::InputDevice(format!("Failed to initialize gilrs: {}", e)))?;
        Ok(Self {
            gilrs,
            ids: HashMap::new(),
        })
    }

    fn gilrs_button(button: Button) -> gilrs::Button {
        match button {
            Button::North => gilrs::Button::North,
            Button::East => gilrs::Button::East,
            Button::South => gilrs::Button::South,
            Button::West => gilrs::Button::West,
            Button::L1 => gilrs::Button::LeftTrigger,
            Button::L2 => gilrs::Button::LeftTrigger2,
            Button::R1 => gilrs::Button::RightTrigger,
            Button::R2 => gilrs::Button::RightTrigger2,
            Button::Menu => gilrs::Button::Select,
            Button::Start => gilrs::Button::Start,
            Button::L3 => gilrs::Button::LeftThumb,
            Button::R3 => gilrs::Button::RightThumb,
        }
    }

    fn gilrs_axis(axis: Axis) -> gilrs::Axis {
        match axis {
            Axis::LeftX => gilrs::Axis::LeftStickX,
            Axis::LeftY => gilrs::Axis::LeftStickY,
            Axis::RightX => gilrs::Axis::RightStickX,
            Axis::RightY => gilrs::Axis::RightStickY,
        }
    }
}

impl GamepadDriver for GilrsDriver {
    fn list_active_devices(&mut self) -> BTreeSet<DeviceId> {
        let mut devices = BTreeSet::new();
        for (id, gamepad) in self.gilrs.gamepads() {
            let device = usize::from(id);
            info!("Found gamepad {}: {}", device, gamepad.name());
            self.ids.insert(device, id);
            devices.insert(device);
        }
        devices
    }

    fn next_hotplug(&mut self) -> Result<Option<HotplugEvent>> {
        // Draining events also refreshes gilrs' cached button/axis state.
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            let device = usize::from(id);
            match event {
                EventType::Connected => {
                    self.ids.insert(device, id);
                    return Ok(Some(HotplugEvent::Connected(device)));
                }
                EventType::Disconnected => {
                    self.ids.remove(&device);
                    return Ok(Some(HotplugEvent::Disconnected(device)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn poll(&mut self, device: DeviceId) -> Result<Option<RawReading>> {
        let Some(&id) = self.ids.get(&device) else {
            debug!("Gamepad {} is not known to gilrs", device);
            return Ok(None);
        };
        let Some(gamepad) = self.gilrs.connected_gamepad(id) else {
            return Ok(None);
        };

        let buttons = Button::ALL
            .iter()
            .map(|&b| (b, gamepad.is_pressed(Self::gilrs_button(b))))
            .collect();

        let axes = Axis::ALL
            .iter()
            .map(|&a| (a, gamepad.value(Self::gilrs_axis(a))))
            .collect();

        let x = i8::from(gamepad.is_pressed(gilrs::Button::DPadRight))
            - i8::from(gamepad.is_pressed(gilrs::Button::DPadLeft));
        let y = i8::from(gamepad.is_pressed(gilrs::Button::DPadUp))
            - i8::from(gamepad.is_pressed(gilrs::Button::DPadDown));

        Ok(Some(RawReading {
            buttons,
            hat: (x, y),
            axes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_button_has_a_distinct_gilrs_mapping() {
        let mapped: std::collections::HashSet<_> = Button::ALL
            .iter()
            .map(|&b| GilrsDriver::gilrs_button(b))
            .collect();
        assert_eq!(mapped.len(), Button::ALL.len());
    }

    #[test]
    fn test_sticks_map_to_gilrs_axes() {
        assert_eq!(GilrsDriver::gilrs_axis(Axis::LeftX), gilrs::Axis::LeftStickX);
        assert_eq!(GilrsDriver::gilrs_axis(Axis::LeftY), gilrs::Axis::LeftStickY);
        assert_eq!(GilrsDriver::gilrs_axis(Axis::RightY), gilrs::Axis::RightStickY);
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_gilrs_with_real_hardware() {
        let mut driver = GilrsDriver::new().expect("gilrs backend unavailable");
        let devices = driver.list_active_devices();
        assert!(!devices.is_empty(), "Connect a gamepad to run this test");

        let first = *devices.iter().next().unwrap();
        let reading = driver.poll(first).unwrap();
        assert!(reading.is_some());
    }
}
