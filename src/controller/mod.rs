//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and hot-plug via gilrs
//! - Normalizing button, hat and axis readings into [`state::ControllerState`]
//! - Dead-zones and analog speed/step mapping
//! - Resolving the Menu/Start shift mode

pub mod analog;
pub mod driver;
pub mod sampler;
pub mod shift;
pub mod state;
