//! # VISCA Protocol Module
//!
//! Implements the subset of Sony's VISCA camera-control protocol needed to
//! drive a PTZ camera over a serial line.
//!
//! VISCA is a simple request/reply protocol:
//! - Each packet starts with an address header and ends with 0xFF
//! - Up to seven cameras share one daisy chain (addresses 1-7)
//! - Replies are ACK (accepted), completion, or error
//!
//! This module provides:
//! - Protocol constants and camera addressing
//! - Packet encoding for motion, preset, exposure and power commands
//! - Reply framing and decoding
//! - [`camera::ViscaCamera`], the serial-backed camera

pub mod camera;
pub mod decoder;
pub mod encoder;
pub mod protocol;

pub use camera::ViscaCamera;
pub use protocol::CameraAddress;
