//! # Controller State Module
//!
//! Canonical snapshot of every monitored gamepad input at one instant.
//!
//! ## Buttons (Xbox 360 layout)
//!
//! | Button | Role |
//! |--------|------|
//! | North (Y) | Preset 0 / 8 |
//! | East (B) | Preset 1 / 9 |
//! | South (A) | Preset 2 / 10 |
//! | West (X) | Preset 3 / 11 |
//! | L1 / L2 | Pan-tilt speed tier, iris or gain in set modes |
//! | R1 / R2 | Zoom speed tier, brightness or aperture in set modes |
//! | Menu | Preset-set shift |
//! | Start | Hidden bank shift |
//! | L3 / R3 | Power chords |
//!
//! ## Axes
//!
//! Normalized to -1.0..=1.0 with 0.0 at rest. Positive is right (X) or
//! up (Y). Values are rounded to three decimals by the sampler to suppress
//! jitter.
//!
//! ## Hat
//!
//! Pair of -1/0/1 values: `x` is left/right, `y` is down/up.

/// Number of monitored buttons.
pub const BUTTON_COUNT: usize = 12;

/// Number of monitored analog axes.
pub const AXIS_COUNT: usize = 4;

/// Hat component value when released.
pub const HAT_RELEASED: i8 = 0;

/// Monitored digital buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Button {
    North,
    East,
    South,
    West,
    L1,
    L2,
    R1,
    R2,
    Menu,
    Start,
    L3,
    R3,
}

impl Button {
    /// Every monitored button, in index order.
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::North,
        Button::East,
        Button::South,
        Button::West,
        Button::L1,
        Button::L2,
        Button::R1,
        Button::R2,
        Button::Menu,
        Button::Start,
        Button::L3,
        Button::R3,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Monitored analog axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left stick X (pan)
    LeftX,
    /// Left stick Y (tilt)
    LeftY,
    /// Right stick X (unused by the default bindings)
    RightX,
    /// Right stick Y (zoom)
    RightY,
}

impl Axis {
    /// Every monitored axis, in index order.
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::LeftX, Axis::LeftY, Axis::RightX, Axis::RightY];

    fn index(self) -> usize {
        self as usize
    }
}

/// Directional hat position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hat {
    /// -1 = left, 0 = center, 1 = right
    pub x: i8,
    /// -1 = down, 0 = center, 1 = up
    pub y: i8,
}

impl Hat {
    /// Centered hat.
    pub const NEUTRAL: Hat = Hat { x: HAT_RELEASED, y: HAT_RELEASED };

    /// Creates a hat position, clamping each component to -1..=1.
    #[must_use]
    pub fn new(x: i8, y: i8) -> Self {
        Self {
            x: x.clamp(-1, 1),
            y: y.clamp(-1, 1),
        }
    }

    /// Returns true if the hat is centered.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

/// Represents the complete state of the gamepad at one instant.
///
/// Produced fresh by the sampler every cycle and never mutated once
/// published; the dispatcher always reads the latest snapshot.
///
/// # Examples
///
/// ```
/// use ptz_bridge::controller::state::{Axis, Button, ControllerState};
///
/// let state = ControllerState::default();
/// assert_eq!(state.axis(Axis::LeftX), 0.0);
/// assert!(!state.pressed(Button::Menu));
/// assert!(state.hat.is_neutral());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerState {
    buttons: [bool; BUTTON_COUNT],
    axes: [f32; AXIS_COUNT],
    /// Directional pad
    pub hat: Hat,
}

impl ControllerState {
    /// Creates a state with all buttons released, axes at rest and the hat centered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `button` is held.
    #[must_use]
    pub fn pressed(&self, button: Button) -> bool {
        self.buttons[button.index()]
    }

    /// Returns true if every button in `chord` is held.
    #[must_use]
    pub fn chord_held(&self, chord: &[Button]) -> bool {
        !chord.is_empty() && chord.iter().all(|&b| self.pressed(b))
    }

    /// Returns the normalized value of `axis`.
    #[must_use]
    pub fn axis(&self, axis: Axis) -> f32 {
        self.axes[axis.index()]
    }

    /// Sets a button, returning the updated state.
    #[must_use]
    pub fn with_button(mut self, button: Button, pressed: bool) -> Self {
        self.set_button(button, pressed);
        self
    }

    /// Sets an axis value, returning the updated state.
    #[must_use]
    pub fn with_axis(mut self, axis: Axis, value: f32) -> Self {
        self.set_axis(axis, value);
        self
    }

    /// Sets the hat, returning the updated state.
    #[must_use]
    pub fn with_hat(mut self, x: i8, y: i8) -> Self {
        self.hat = Hat::new(x, y);
        self
    }

    /// Sets a button in place.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.buttons[button.index()] = pressed;
    }

    /// Sets an axis in place, clamping to -1.0..=1.0.
    pub fn set_axis(&mut self, axis: Axis, value: f32) {
        self.axes[axis.index()] = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
    }

    /// Checks if any button is currently pressed.
    #[must_use]
    pub fn any_button_pressed(&self) -> bool {
        self.buttons.iter().any(|&b| b)
    }
}
