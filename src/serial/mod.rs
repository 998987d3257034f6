//! # Serial Communication Module
//!
//! Handles the serial line to the VISCA camera.
//!
//! This module handles:
//! - Opening the serial port at a VISCA baud rate (8N1, no flow control)
//! - Async read/write operations
//! - Reopening the port after the camera power-cycles

pub mod port_trait;

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt};
use tracing::{debug, info, warn};

pub use port_trait::SerialPortIO;

use crate::error::{PtzBridgeError, Result};

/// Baud rates VISCA cameras accept
pub const SUPPORTED_BAUD_RATES: &[u32] = &[2400, 4800, 9600, 19200, 38400, 115_200];

/// Default VISCA baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// VISCA Serial Port Handler
///
/// Owns the connection to one camera. The port can be dropped and reopened
/// in place, which is how the link is re-established after power-on.
pub struct ViscaSerial {
    /// Serial port handle, `None` between close and reopen
    port: Option<tokio_serial::SerialStream>,
    /// Device path (e.g., /dev/ttyUSB0 or COM3)
    device_path: String,
    baud_rate: u32,
}

impl std::fmt::Debug for ViscaSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViscaSerial")
            .field("device_path", &self.device_path)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl ViscaSerial {
    /// Open connection to the camera
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyUSB0" or "COM3")
    /// * `baud_rate` - Line speed, one of [`SUPPORTED_BAUD_RATES`]
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` if the device does not exist and
    /// `TransportLink` if it exists but cannot be opened.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptz_bridge::serial::ViscaSerial;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// let serial = ViscaSerial::open("/dev/ttyUSB0", 9600)?;
    /// println!("Connected to: {}", serial.device_path());
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        debug!("Trying to open serial port: {}", path);
        let port = Self::open_port(path, baud_rate)?;
        info!("Successfully opened camera port at {} ({} baud)", path, baud_rate);
        Ok(Self {
            port: Some(port),
            device_path: path.to_string(),
            baud_rate,
        })
    }

    /// Open a specific serial port with VISCA settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| match e.kind() {
                tokio_serial::ErrorKind::NoDevice => {
                    PtzBridgeError::SerialPortNotFound(path.to_string())
                }
                _ => PtzBridgeError::TransportLink(format!("Failed to open {}: {}", path, e)),
            })
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn port_mut(&mut self) -> io::Result<&mut tokio_serial::SerialStream> {
        self.port.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "serial port is closed")
        })
    }
}

#[async_trait]
impl SerialPortIO for ViscaSerial {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port_mut()?.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.port_mut()?.flush().await
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port_mut()?.read(buf).await
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.port_mut()?
            .clear(ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    async fn reopen(&mut self) -> io::Result<()> {
        info!("Reopening camera port {}", self.device_path);
        // Release the handle first; some drivers refuse a second open.
        self.port = None;
        match Self::open_port(&self.device_path, self.baud_rate) {
            Ok(port) => {
                self.port = Some(port);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to reopen {}: {}", self.device_path, e);
                Err(io::Error::new(io::ErrorKind::NotConnected, e.to_string()))
            }
        }
    }
}
