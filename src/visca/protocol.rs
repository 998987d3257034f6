//! # VISCA Protocol Constants and Types
//!
//! Core protocol definitions for VISCA over RS-232/RS-422.
//!
//! Every packet is `header, body..., 0xFF`. Controller-to-camera headers
//! are `0x80 | address`; camera replies use `0x80 | (address << 4)`
//! (so `0x90` for camera 1).

use crate::error::{PtzBridgeError, Result};

/// Packet terminator
pub const VISCA_TERMINATOR: u8 = 0xFF;

/// Controller header base (OR-ed with the camera address)
pub const VISCA_HEADER_BASE: u8 = 0x80;

/// Broadcast header
pub const VISCA_BROADCAST: u8 = 0x88;

/// Command category
pub const VISCA_COMMAND: u8 = 0x01;

/// Inquiry category
pub const VISCA_INQUIRY: u8 = 0x09;

/// Maximum packet size (header + 14 bytes + terminator)
pub const VISCA_MAX_PACKET_SIZE: usize = 16;

/// Lowest and highest camera address on a daisy chain
pub const VISCA_MIN_ADDRESS: u8 = 1;
pub const VISCA_MAX_ADDRESS: u8 = 7;

/// Pan speed range
pub const PAN_SPEED_MIN: u8 = 0x01;
pub const PAN_SPEED_MAX: u8 = 0x18;

/// Tilt speed range
pub const TILT_SPEED_MIN: u8 = 0x01;
pub const TILT_SPEED_MAX: u8 = 0x14;

/// Zoom speed range (variable zoom nibble)
pub const ZOOM_SPEED_MAX: u8 = 0x07;

/// Highest preset index the memory commands accept
pub const PRESET_MAX: u8 = 0x7F;

/// Pan-tilt drive direction nibbles (`0p` / `0q`)
pub const DRIVE_LEFT: u8 = 0x01;
pub const DRIVE_RIGHT: u8 = 0x02;
pub const DRIVE_UP: u8 = 0x01;
pub const DRIVE_DOWN: u8 = 0x02;
pub const DRIVE_STOP: u8 = 0x03;

/// Reply types, high nibble of the byte after the reply header
pub const REPLY_ACK: u8 = 0x40;
pub const REPLY_COMPLETION: u8 = 0x50;
pub const REPLY_ERROR: u8 = 0x60;

/// Power inquiry reply values
pub const POWER_ON: u8 = 0x02;
pub const POWER_OFF: u8 = 0x03;

/// Camera error codes carried by error replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViscaErrorCode {
    MessageLength,
    Syntax,
    BufferFull,
    Cancelled,
    NoSocket,
    NotExecutable,
    Other(u8),
}

impl From<u8> for ViscaErrorCode {
    fn from(code: u8) -> Self {
        match code {
            0x01 => ViscaErrorCode::MessageLength,
            0x02 => ViscaErrorCode::Syntax,
            0x03 => ViscaErrorCode::BufferFull,
            0x04 => ViscaErrorCode::Cancelled,
            0x05 => ViscaErrorCode::NoSocket,
            0x41 => ViscaErrorCode::NotExecutable,
            other => ViscaErrorCode::Other(other),
        }
    }
}

impl std::fmt::Display for ViscaErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViscaErrorCode::MessageLength => f.write_str("message length error"),
            ViscaErrorCode::Syntax => f.write_str("syntax error"),
            ViscaErrorCode::BufferFull => f.write_str("command buffer full"),
            ViscaErrorCode::Cancelled => f.write_str("command cancelled"),
            ViscaErrorCode::NoSocket => f.write_str("no socket"),
            ViscaErrorCode::NotExecutable => f.write_str("command not executable"),
            ViscaErrorCode::Other(code) => write!(f, "error 0x{:02X}", code),
        }
    }
}

/// Validated camera address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraAddress(u8);

impl CameraAddress {
    /// Create an address
    ///
    /// # Errors
    ///
    /// Returns error if `address` is outside 1-7
    pub fn new(address: u8) -> Result<Self> {
        if !(VISCA_MIN_ADDRESS..=VISCA_MAX_ADDRESS).contains(&address) {
            return Err(PtzBridgeError::Protocol(format!(
                "Camera address {} out of range {}-{}",
                address, VISCA_MIN_ADDRESS, VISCA_MAX_ADDRESS
            )));
        }
        Ok(Self(address))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// First byte of packets sent to this camera
    pub fn header(self) -> u8 {
        VISCA_HEADER_BASE | self.0
    }

    /// First byte of replies from this camera
    pub fn reply_header(self) -> u8 {
        VISCA_HEADER_BASE | (self.0 << 4)
    }
}

impl Default for CameraAddress {
    fn default() -> Self {
        Self(VISCA_MIN_ADDRESS)
    }
}
