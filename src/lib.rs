//! # PTZ Bridge Library
//!
//! Control a VISCA pan-tilt-zoom camera with a gamepad.
//!
//! This library samples gamepad state on a dedicated thread, turns each
//! snapshot into edge-triggered preset/exposure/power actions and
//! continuous pan/tilt/zoom motion, and sends the resulting VISCA commands
//! over a serial port.

pub mod bridge;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod journal;
pub mod serial;
pub mod visca;
