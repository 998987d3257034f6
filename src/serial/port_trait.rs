//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for serial port I/O operations
#[async_trait]
pub trait SerialPortIO: Send {
    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;

    /// Read available bytes into `buf`, waiting until at least one arrives
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Discard unread input
    fn clear_input(&mut self) -> io::Result<()>;

    /// Close and reopen the underlying device
    async fn reopen(&mut self) -> io::Result<()>;
}
