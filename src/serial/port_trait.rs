//! Trait abstraction for the receive side of the serial link to enable testing

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncReadExt;
use tokio_serial::SerialPort;

/// Byte source feeding the frame synchronizer
///
/// Implementations must never block waiting for data: when nothing is
/// buffered, `read_available` returns `Ok(0)` and the caller backs off.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SerialTransport: Send {
    /// Number of bytes currently buffered
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read whatever is currently buffered into `buf`
    ///
    /// Returns the number of bytes read, `0` if none are available.
    async fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Wrapper around tokio_serial::SerialStream that implements SerialTransport
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream) -> Self {
        Self { port }
    }
}

#[async_trait]
impl SerialTransport for TokioSerialPort {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let pending = self.port.bytes_to_read().map_err(io::Error::from)?;
        Ok(pending as usize)
    }

    async fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pending = self.bytes_available()?;
        if pending == 0 || buf.is_empty() {
            return Ok(0);
        }

        let len = pending.min(buf.len());
        self.port.read(&mut buf[..len]).await
    }
}
