//! # Error Types
//!
//! Custom error types for PTZ Bridge using `thiserror`.
//!
//! Errors fall into three severities:
//!
//! - **Fatal**: the gamepad subsystem or the configuration is unusable.
//!   The process reports the failing subsystem and exits.
//! - **Link**: the serial connection to the camera was lost. The session
//!   ends and the supervisor restarts it after a backoff.
//! - **Recoverable**: a single command failed to send. It is logged and the
//!   dispatch loop continues with the next cycle.

use std::io;

use thiserror::Error;

/// Main error type for PTZ Bridge
#[derive(Debug, Error)]
pub enum PtzBridgeError {
    /// Gamepad enumeration or polling failed irrecoverably
    #[error("Input device error: {0}")]
    InputDevice(String),

    /// A single camera command could not be sent
    #[error("Failed to send {command}: {reason}")]
    TransportSend {
        /// Command name and parameters, e.g. `pan_left(7)`
        command: String,
        /// Underlying failure
        reason: String,
    },

    /// The serial link to the camera is gone
    #[error("Transport link error: {0}")]
    TransportLink(String),

    /// No serial device could be opened
    #[error("Serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// Malformed or unexpected VISCA reply
    #[error("VISCA protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PtzBridgeError {
    /// Returns true if the process must stop rather than retry.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InputDevice(_) | Self::Config(_))
    }

    /// Returns true if the serial link needs to be re-established.
    #[must_use]
    pub fn is_link_failure(&self) -> bool {
        matches!(self, Self::TransportLink(_) | Self::SerialPortNotFound(_))
    }

    /// Classifies a failed serial write for `command`.
    ///
    /// Errors that mean the device went away become [`Self::TransportLink`];
    /// everything else only affects the one command.
    pub fn from_write_error(command: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::UnexpectedEof => {
                Self::TransportLink(format!("{} failed: {}", command, err))
            }
            _ => Self::TransportSend {
                command: command.to_string(),
                reason: err.to_string(),
            },
        }
    }

    /// Short name of the failing subsystem for user-facing messages.
    #[must_use]
    pub fn subsystem(&self) -> &'static str {
        match self {
            Self::InputDevice(_) => "gamepad",
            Self::TransportSend { .. }
            | Self::TransportLink(_)
            | Self::SerialPortNotFound(_)
            | Self::Protocol(_) => "camera transport",
            Self::Config(_) => "configuration",
            Self::Io(_) => "I/O",
        }
    }
}

/// Result type alias for PTZ Bridge
pub type Result<T> = std::result::Result<T, PtzBridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(PtzBridgeError::InputDevice("gone".into()).is_fatal());
        assert!(!PtzBridgeError::TransportLink("gone".into()).is_fatal());
        assert!(!PtzBridgeError::TransportSend {
            command: "stop".into(),
            reason: "timeout".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_link_classification() {
        assert!(PtzBridgeError::TransportLink("gone".into()).is_link_failure());
        assert!(PtzBridgeError::SerialPortNotFound("/dev/ttyUSB0".into()).is_link_failure());
        assert!(!PtzBridgeError::InputDevice("gone".into()).is_link_failure());
    }

    #[test]
    fn test_broken_pipe_is_link_failure() {
        let err = io::Error::new(io::ErrorKind::BrokenPipe, "unplugged");
        let classified = PtzBridgeError::from_write_error("pan_left(7)", &err);
        assert!(classified.is_link_failure());
    }

    #[test]
    fn test_timeout_is_send_failure() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "slow");
        match PtzBridgeError::from_write_error("preset_recall(3)", &err) {
            PtzBridgeError::TransportSend { command, reason } => {
                assert_eq!(command, "preset_recall(3)");
                assert!(reason.contains("slow"));
            }
            other => panic!("Expected TransportSend, got: {:?}", other),
        }
    }

    #[test]
    fn test_send_error_message_names_command() {
        let err = PtzBridgeError::TransportSend {
            command: "zoom_in(3)".into(),
            reason: "timed out".into(),
        };
        assert_eq!(err.to_string(), "Failed to send zoom_in(3): timed out");
        assert_eq!(err.subsystem(), "camera transport");
    }
}
