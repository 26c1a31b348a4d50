//! # LPS Reader
//!
//! Background task owning the serial link, the frame synchronizer and the
//! writer side of the telemetry store.
//!
//! The task polls the transport, feeds whatever bytes are buffered through
//! the synchronizer and decoder, and publishes the results. When nothing is
//! buffered it sleeps for the poll interval instead of spinning. Per-frame
//! problems (CRC mismatches, unknown events) and transport read errors are
//! logged and never stop the loop; only opening the transport can fail.

use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::lps::decoder::decode;
use crate::lps::framer::FrameSynchronizer;
use crate::serial::port_trait::SerialTransport;
use crate::serial::simulated::SimulatedTransport;
use crate::serial::LocusSerial;
use crate::telemetry::{self, TelemetryHandle, TelemetryPublisher};

/// Read buffer size; larger than any single frame
const READ_BUFFER_SIZE: usize = 512;

/// Handle to the running background reader
#[derive(Debug)]
pub struct LpsReader {
    telemetry: TelemetryHandle,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl LpsReader {
    /// Open the transport described by `config` and start reading
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the serial port cannot be opened. The background
    /// task is not started in that case.
    pub fn start(config: &Config) -> Result<Self> {
        let poll_interval = Duration::from_millis(config.serial.poll_interval_ms);

        if config.simulation.enabled {
            info!(
                "Simulating Locus unit {} every {}ms",
                config.simulation.address, config.simulation.interval_ms
            );
            let transport = SimulatedTransport::new(
                config.simulation.address,
                Duration::from_millis(config.simulation.interval_ms),
            );
            return Ok(Self::spawn(transport, poll_interval));
        }

        let serial = LocusSerial::open_with_paths(&config.candidate_ports(), config.serial.baud_rate)?;
        Ok(Self::spawn(serial, poll_interval))
    }

    /// Start reading from an already-open transport
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<T>(transport: T, poll_interval: Duration) -> Self
    where
        T: SerialTransport + 'static,
    {
        let (publisher, telemetry) = telemetry::channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(transport, publisher, poll_interval, cancel.clone()));

        Self {
            telemetry,
            cancel,
            task,
        }
    }

    /// Read-only view of the decoded telemetry
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry.clone()
    }

    /// Whether the background task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the background task and release the transport
    ///
    /// A partially received frame is discarded.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("LPS reader task ended abnormally: {}", e);
        }
        info!("LPS reader stopped");
    }
}

/// Reader loop; owns the transport until cancelled
async fn run<T>(
    mut transport: T,
    mut publisher: TelemetryPublisher,
    poll_interval: Duration,
    cancel: CancellationToken,
) where
    T: SerialTransport,
{
    let mut sync = FrameSynchronizer::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    debug!("LPS reader started (poll interval {:?})", poll_interval);

    while !cancel.is_cancelled() {
        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = transport.read_available(&mut buf) => read,
        };

        match read {
            Ok(0) => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(poll_interval) => {}
                }
            }
            Ok(n) => {
                for frame in sync.feed(&buf[..n]) {
                    publisher.apply(&decode(&frame));
                }
                publisher.update_sync_stats(sync.stats());
            }
            Err(e) => {
                warn!("Serial read error: {}", e);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(poll_interval) => {}
                }
            }
        }
    }

    let stats = sync.stats();
    info!(
        "LPS reader exiting: {} frames, {} CRC errors, {} bytes skipped",
        stats.frames, stats.crc_errors, stats.skipped_bytes
    );
}
