//! # Serial Communication Module
//!
//! Handles the serial link to the Locus positioning unit.
//!
//! This module handles:
//! - Opening the serial port at 57,600 baud, 8N1
//! - Non-blocking reads of whatever bytes are buffered
//! - A simulated unit producing synthetic frames for hardware-free runs

pub mod port_trait;
pub mod simulated;

use async_trait::async_trait;
use std::io;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{LocusError, Result};
use port_trait::{SerialTransport, TokioSerialPort};

/// LPS serial baud rate (57,600 baud)
pub const LPS_BAUD_RATE: u32 = 57_600;

/// Default Locus device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // RS-485 USB adapters (most common for Locus)
    "/dev/ttyACM0", // USB CDC devices
];

/// Locus Serial Port Handler
///
/// Manages the receive-only connection to a Locus unit.
pub struct LocusSerial {
    /// Serial port handle
    port: TokioSerialPort,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for LocusSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocusSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl LocusSerial {
    /// Open connection to a Locus unit
    ///
    /// Auto-detects the device by trying common paths at the default baud rate.
    ///
    /// # Returns
    ///
    /// * `Result<LocusSerial>` - Connected serial port or error
    ///
    /// # Errors
    ///
    /// Returns error if no Locus device found or connection fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use locus_lps::serial::LocusSerial;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let serial = LocusSerial::open()?;
    ///     Ok(())
    /// }
    /// ```
    pub fn open() -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, LPS_BAUD_RATE)
    }

    /// Open connection to a Locus unit with custom device paths
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    ///
    /// # Returns
    ///
    /// * `Result<LocusSerial>` - Connected serial port or error
    pub fn open_with_paths<S: AsRef<str>>(paths: &[S], baud_rate: u32) -> Result<Self> {
        for path in paths {
            let path = path.as_ref();
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Successfully opened Locus device at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port: TokioSerialPort::new(port),
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        let tried: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();
        Err(LocusError::SerialPortNotFound(tried.join(", ")))
    }

    /// Open a specific serial port with LPS settings (8N1, no flow control)
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| LocusError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use locus_lps::serial::LocusSerial;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let serial = LocusSerial::open()?;
    /// println!("Connected to: {}", serial.device_path());
    /// # Ok(())
    /// # }
    /// ```
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl SerialTransport for LocusSerial {
    fn bytes_available(&mut self) -> io::Result<usize> {
        self.port.bytes_available()
    }

    async fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read_available(buf).await
    }
}
