//! # VISCA Reply Decoder
//!
//! Splits the incoming byte stream into `0xFF`-terminated frames and
//! decodes acknowledgements, completions and errors.

use bytes::{Bytes, BytesMut};

use super::protocol::*;
use crate::error::{PtzBridgeError, Result};

/// Camera reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Command accepted into `socket`
    Ack { socket: u8 },
    /// Command or inquiry finished; inquiries carry their answer in `payload`
    Completion { socket: u8, payload: Vec<u8> },
    /// Command rejected
    Error { socket: u8, code: ViscaErrorCode },
}

/// Decode one complete reply frame
///
/// # Arguments
///
/// * `address` - Camera the reply must come from
/// * `frame` - Frame bytes including the terminator
///
/// # Errors
///
/// Returns error if:
/// - Frame is too short or not terminated
/// - Reply header does not match `address`
/// - Reply type is unknown
pub fn decode_reply(address: CameraAddress, frame: &[u8]) -> Result<Reply> {
    // Minimum reply: header(1) + type(1) + terminator(1)
    if frame.len() < 3 {
        return Err(PtzBridgeError::Protocol(format!(
            "Reply too short: {} bytes",
            frame.len()
        )));
    }
    if frame[frame.len() - 1] != VISCA_TERMINATOR {
        return Err(PtzBridgeError::Protocol("Reply not terminated".to_string()));
    }
    if frame[0] != address.reply_header() {
        return Err(PtzBridgeError::Protocol(format!(
            "Unexpected reply header: 0x{:02X} (expected 0x{:02X})",
            frame[0],
            address.reply_header()
        )));
    }

    let socket = frame[1] & 0x0F;
    let body = &frame[2..frame.len() - 1];
    match frame[1] & 0xF0 {
        REPLY_ACK => Ok(Reply::Ack { socket }),
        REPLY_COMPLETION => Ok(Reply::Completion {
            socket,
            payload: body.to_vec(),
        }),
        REPLY_ERROR => {
            let code = body.first().copied().ok_or_else(|| {
                PtzBridgeError::Protocol("Error reply without error code".to_string())
            })?;
            Ok(Reply::Error {
                socket,
                code: ViscaErrorCode::from(code),
            })
        }
        other => Err(PtzBridgeError::Protocol(format!(
            "Unknown reply type: 0x{:02X}",
            other
        ))),
    }
}

/// Interpret a power inquiry reply
///
/// # Errors
///
/// Returns error if the reply is not a completion carrying 0x02 or 0x03
pub fn decode_power_reply(reply: &Reply) -> Result<bool> {
    match reply {
        Reply::Completion { payload, .. } => match payload.as_slice() {
            [POWER_ON] => Ok(true),
            [POWER_OFF] => Ok(false),
            other => Err(PtzBridgeError::Protocol(format!(
                "Unexpected power reply payload: {:02X?}",
                other
            ))),
        },
        Reply::Error { code, .. } => Err(PtzBridgeError::Protocol(format!(
            "Power inquiry rejected: {}",
            code
        ))),
        Reply::Ack { .. } => Err(PtzBridgeError::Protocol(
            "Power inquiry answered with ACK".to_string(),
        )),
    }
}

/// Reassembles frames from partial serial reads
#[derive(Debug, Default)]
pub struct ReplyBuffer {
    buf: BytesMut,
}

impl ReplyBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(VISCA_MAX_PACKET_SIZE * 2),
        }
    }

    /// Append bytes read from the port
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        // A frame never exceeds the max packet size; anything longer
        // without a terminator is line noise.
        if self.buf.len() > VISCA_MAX_PACKET_SIZE && !self.buf.contains(&VISCA_TERMINATOR) {
            self.buf.clear();
        }
    }

    /// Take the next complete frame, terminator included
    pub fn next_frame(&mut self) -> Option<Bytes> {
        let end = self.buf.iter().position(|&b| b == VISCA_TERMINATOR)?;
        Some(self.buf.split_to(end + 1).freeze())
    }

    /// Drop any buffered partial frame
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
