//! # VISCA Packet Encoder
//!
//! Builds controller-to-camera packets. Speeds and preset numbers are
//! clamped to what the protocol accepts; callers never see an encoding
//! error.

use super::protocol::*;
use crate::dispatch::bindings::ExposureAdjust;

fn packet(address: CameraAddress, body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(body.len() + 2);
    frame.push(address.header());
    frame.extend_from_slice(body);
    frame.push(VISCA_TERMINATOR);
    frame
}

fn pan_speed(speed: u8) -> u8 {
    speed.clamp(PAN_SPEED_MIN, PAN_SPEED_MAX)
}

fn tilt_speed(speed: u8) -> u8 {
    speed.clamp(TILT_SPEED_MIN, TILT_SPEED_MAX)
}

/// Pan-tilt drive: `8x 01 06 01 VV WW 0p 0q FF`
///
/// # Arguments
///
/// * `pan_speed` - 0x01-0x18, clamped
/// * `tilt_speed` - 0x01-0x14, clamped
/// * `pan` - [`DRIVE_LEFT`], [`DRIVE_RIGHT`] or [`DRIVE_STOP`]
/// * `tilt` - [`DRIVE_UP`], [`DRIVE_DOWN`] or [`DRIVE_STOP`]
///
/// # Examples
///
/// ```
/// use ptz_bridge::visca::encoder::encode_pan_tilt_drive;
/// use ptz_bridge::visca::protocol::{CameraAddress, DRIVE_LEFT, DRIVE_STOP};
///
/// let frame = encode_pan_tilt_drive(CameraAddress::default(), 7, 7, DRIVE_LEFT, DRIVE_STOP);
/// assert_eq!(frame, vec![0x81, 0x01, 0x06, 0x01, 0x07, 0x07, 0x01, 0x03, 0xFF]);
/// ```
pub fn encode_pan_tilt_drive(
    address: CameraAddress,
    pan_speed_value: u8,
    tilt_speed_value: u8,
    pan: u8,
    tilt: u8,
) -> Vec<u8> {
    packet(
        address,
        &[
            VISCA_COMMAND,
            0x06,
            0x01,
            pan_speed(pan_speed_value),
            tilt_speed(tilt_speed_value),
            pan,
            tilt,
        ],
    )
}

/// Pan only; tilt is stopped
pub fn encode_pan(address: CameraAddress, speed: u8, direction: u8) -> Vec<u8> {
    encode_pan_tilt_drive(address, speed, TILT_SPEED_MIN, direction, DRIVE_STOP)
}

/// Tilt only; pan is stopped
pub fn encode_tilt(address: CameraAddress, speed: u8, direction: u8) -> Vec<u8> {
    encode_pan_tilt_drive(address, PAN_SPEED_MIN, speed, DRIVE_STOP, direction)
}

/// Stop pan and tilt
pub fn encode_pan_tilt_stop(address: CameraAddress) -> Vec<u8> {
    encode_pan_tilt_drive(address, PAN_SPEED_MIN, TILT_SPEED_MIN, DRIVE_STOP, DRIVE_STOP)
}

/// Splits a signed position into four low nibbles, most significant first.
fn position_nibbles(value: i16) -> [u8; 4] {
    let raw = value as u16;
    [
        ((raw >> 12) & 0x0F) as u8,
        ((raw >> 8) & 0x0F) as u8,
        ((raw >> 4) & 0x0F) as u8,
        (raw & 0x0F) as u8,
    ]
}

/// Relative move: `8x 01 06 03 VV WW 0Y 0Y 0Y 0Y 0Z 0Z 0Z 0Z FF`
///
/// Positive pan steps move right, positive tilt steps move up.
pub fn encode_relative_move(
    address: CameraAddress,
    pan_step: i16,
    tilt_step: i16,
    pan_speed_value: u8,
    tilt_speed_value: u8,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(13);
    body.extend_from_slice(&[
        VISCA_COMMAND,
        0x06,
        0x03,
        pan_speed(pan_speed_value),
        tilt_speed(tilt_speed_value),
    ]);
    body.extend_from_slice(&position_nibbles(pan_step));
    body.extend_from_slice(&position_nibbles(tilt_step));
    packet(address, &body)
}

/// Variable zoom in: `8x 01 04 07 2p FF`
pub fn encode_zoom_tele(address: CameraAddress, speed: u8) -> Vec<u8> {
    packet(address, &[VISCA_COMMAND, 0x04, 0x07, 0x20 | speed.min(ZOOM_SPEED_MAX)])
}

/// Variable zoom out: `8x 01 04 07 3p FF`
pub fn encode_zoom_wide(address: CameraAddress, speed: u8) -> Vec<u8> {
    packet(address, &[VISCA_COMMAND, 0x04, 0x07, 0x30 | speed.min(ZOOM_SPEED_MAX)])
}

/// Zoom stop: `8x 01 04 07 00 FF`
pub fn encode_zoom_stop(address: CameraAddress) -> Vec<u8> {
    packet(address, &[VISCA_COMMAND, 0x04, 0x07, 0x00])
}

/// Memory recall: `8x 01 04 3F 02 pp FF`
pub fn encode_preset_recall(address: CameraAddress, index: u8) -> Vec<u8> {
    packet(address, &[VISCA_COMMAND, 0x04, 0x3F, 0x02, index.min(PRESET_MAX)])
}

/// Memory set: `8x 01 04 3F 01 pp FF`
pub fn encode_preset_set(address: CameraAddress, index: u8) -> Vec<u8> {
    packet(address, &[VISCA_COMMAND, 0x04, 0x3F, 0x01, index.min(PRESET_MAX)])
}

/// Pan-tilt home: `8x 01 06 04 FF`
pub fn encode_home(address: CameraAddress) -> Vec<u8> {
    packet(address, &[VISCA_COMMAND, 0x06, 0x04])
}

/// One-push autofocus trigger: `8x 01 04 18 01 FF`
pub fn encode_autofocus(address: CameraAddress) -> Vec<u8> {
    packet(address, &[VISCA_COMMAND, 0x04, 0x18, 0x01])
}

/// Exposure step: `8x 01 04 ss 02|03 FF`
///
/// | Adjustment | ss |
/// |------------|----|
/// | Iris | 0B |
/// | Bright | 0D |
/// | Gain | 0C |
/// | Aperture | 02 |
pub fn encode_exposure(address: CameraAddress, adjust: ExposureAdjust) -> Vec<u8> {
    let (selector, up) = match adjust {
        ExposureAdjust::IrisUp => (0x0B, true),
        ExposureAdjust::IrisDown => (0x0B, false),
        ExposureAdjust::BrightUp => (0x0D, true),
        ExposureAdjust::BrightDown => (0x0D, false),
        ExposureAdjust::GainUp => (0x0C, true),
        ExposureAdjust::GainDown => (0x0C, false),
        ExposureAdjust::ApertureUp => (0x02, true),
        ExposureAdjust::ApertureDown => (0x02, false),
    };
    packet(address, &[VISCA_COMMAND, 0x04, selector, if up { 0x02 } else { 0x03 }])
}

/// Power: `8x 01 04 00 02|03 FF`
pub fn encode_power(address: CameraAddress, on: bool) -> Vec<u8> {
    packet(
        address,
        &[VISCA_COMMAND, 0x04, 0x00, if on { POWER_ON } else { POWER_OFF }],
    )
}

/// Power inquiry: `8x 09 04 00 FF`
pub fn encode_power_inquiry(address: CameraAddress) -> Vec<u8> {
    packet(address, &[VISCA_INQUIRY, 0x04, 0x00])
}

/// Clears the camera's command buffers: `8x 01 00 01 FF`
pub fn encode_if_clear(address: CameraAddress) -> Vec<u8> {
    packet(address, &[VISCA_COMMAND, 0x00, 0x01])
}
