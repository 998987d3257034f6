//! # Analog Mapping Module
//!
//! Converts normalized axis readings into motion intents, speeds and
//! relative step sizes.
//!
//! ## Dead-zone
//!
//! Any reading whose magnitude is at or below the rest threshold counts as
//! "at rest". Hardware often rests slightly off zero (a threshold of 0.004
//! is typical), so the threshold is configured per axis.
//!
//! ## Mapping
//!
//! Both mappings are linear in the magnitude of the input; the sign only
//! selects direction:
//!
//! - `map_speed(v, max) = max * |v|`
//! - `map_chunk(v, min, max) = min + (max - min) * |v|`
//!
//! ## Usage
//!
//! ```
//! use ptz_bridge::controller::analog::{DeadZone, Direction};
//!
//! let dz = DeadZone::new(0.004);
//! let intent = dz.intent(-0.5);
//! assert_eq!(intent.direction, Direction::Negative);
//! assert_eq!(intent.step(5, 10), 8);
//! ```

/// Linear speed for an axis reading: `max_speed * |value|`.
#[must_use]
pub fn map_speed(value: f32, max_speed: f32) -> f32 {
    max_speed * value.abs()
}

/// Linear step size for an axis reading: `min_out + (max_out - min_out) * |value|`.
#[must_use]
pub fn map_chunk(value: f32, min_out: f32, max_out: f32) -> f32 {
    min_out + (max_out - min_out) * value.abs()
}

/// Direction of a single axis relative to its rest position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Left, down, or zoom-out side
    Negative,
    /// Inside the dead-zone
    #[default]
    Rest,
    /// Right, up, or zoom-in side
    Positive,
}

/// Per-cycle motion derived from one axis. Never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionIntent {
    pub direction: Direction,
    /// Magnitude of the reading (0.0 at rest, up to 1.0)
    pub magnitude: f32,
}

impl MotionIntent {
    /// Intent for an axis inside its dead-zone.
    pub const REST: MotionIntent = MotionIntent {
        direction: Direction::Rest,
        magnitude: 0.0,
    };

    /// Returns true if the axis is inside its dead-zone.
    #[must_use]
    pub fn is_rest(&self) -> bool {
        self.direction == Direction::Rest
    }

    /// Speed scaled by deflection, rounded and kept at least 1.
    ///
    /// Returns 0 at rest.
    #[must_use]
    pub fn speed(&self, max_speed: u8) -> u8 {
        if self.is_rest() {
            return 0;
        }
        let speed = map_speed(self.magnitude, f32::from(max_speed)).round();
        (speed as u8).clamp(1, max_speed.max(1))
    }

    /// Relative step size, rounded to the nearest integer.
    ///
    /// Returns 0 at rest.
    #[must_use]
    pub fn step(&self, min_step: u16, max_step: u16) -> u16 {
        if self.is_rest() {
            return 0;
        }
        map_chunk(self.magnitude, f32::from(min_step), f32::from(max_step)).round() as u16
    }

    /// Step carrying the direction sign.
    #[must_use]
    pub fn signed_step(&self, min_step: u16, max_step: u16) -> i16 {
        let step = i16::try_from(self.step(min_step, max_step)).unwrap_or(i16::MAX);
        match self.direction {
            Direction::Negative => -step,
            Direction::Rest => 0,
            Direction::Positive => step,
        }
    }
}

/// Dead-zone around an axis rest position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadZone {
    rest_threshold: f32,
}

impl Default for DeadZone {
    fn default() -> Self {
        Self { rest_threshold: 0.004 }
    }
}

impl DeadZone {
    /// Creates a dead-zone. The threshold is clamped to 0.0..=0.5.
    #[must_use]
    pub fn new(rest_threshold: f32) -> Self {
        Self {
            rest_threshold: rest_threshold.clamp(0.0, 0.5),
        }
    }

    /// Returns the configured rest threshold.
    #[must_use]
    pub fn rest_threshold(&self) -> f32 {
        self.rest_threshold
    }

    /// Returns true if `value` counts as "at rest".
    #[must_use]
    pub fn is_rest(&self, value: f32) -> bool {
        value.abs() <= self.rest_threshold
    }

    /// Converts a normalized reading into a motion intent.
    #[must_use]
    pub fn intent(&self, value: f32) -> MotionIntent {
        if self.is_rest(value) {
            return MotionIntent::REST;
        }
        let magnitude = value.abs().min(1.0);
        let direction = if value < 0.0 {
            Direction::Negative
        } else {
            Direction::Positive
        };
        MotionIntent { direction, magnitude }
    }
}
