//! Simulated Locus unit
//!
//! Produces a stream of real encoded frames so the full decode pipeline can
//! run without hardware. The unit random-walks through the room the way a
//! slowly moving tag would.

use async_trait::async_trait;
use rand::prelude::*;
use std::io;
use tokio::time::{Duration, Instant};

use super::port_trait::SerialTransport;
use crate::lps::encoder::{encode_strength_frame, encode_telemetry_frame, TelemetryPayload};
use crate::lps::protocol::pack_orientation;

/// Horizontal jitter per step in millimeters
const XY_STEP_MM: i32 = 50;

/// Vertical jitter per step in millimeters
const Z_STEP_MM: i32 = 20;

/// Beacon mask reported by the simulated unit
const SIMULATED_BEACONS: u8 = 0b1010;

/// Simulated supply voltage in millivolts
const SIMULATED_VOLTAGE_MV: u16 = 3900;

/// Transport yielding synthetic frames at a fixed interval
pub struct SimulatedTransport {
    address: u8,
    interval: Duration,
    next_frame_at: Instant,
    position: [i32; 3],
    pending: Vec<u8>,
    rng: StdRng,
}

impl std::fmt::Debug for SimulatedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedTransport")
            .field("address", &self.address)
            .field("interval", &self.interval)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl SimulatedTransport {
    /// Create a simulated unit emitting one batch of frames per `interval`
    ///
    /// The first batch is available immediately.
    pub fn new(address: u8, interval: Duration) -> Self {
        Self::with_rng(address, interval, StdRng::from_entropy())
    }

    /// Deterministic variant for reproducible streams
    pub fn with_seed(address: u8, interval: Duration, seed: u64) -> Self {
        Self::with_rng(address, interval, StdRng::seed_from_u64(seed))
    }

    fn with_rng(address: u8, interval: Duration, mut rng: StdRng) -> Self {
        let position = [
            rng.gen_range(-5500..=5500),
            rng.gen_range(-5500..=5500),
            rng.gen_range(0..=4000),
        ];

        Self {
            address,
            interval,
            next_frame_at: Instant::now(),
            position,
            pending: Vec::new(),
            rng,
        }
    }

    /// Current simulated position in millimeters
    pub fn position(&self) -> [i32; 3] {
        self.position
    }

    /// Advance the random walk and queue the next telemetry and strength frames
    fn step(&mut self) {
        self.position[0] += self.rng.gen_range(-XY_STEP_MM..=XY_STEP_MM);
        self.position[1] += self.rng.gen_range(-XY_STEP_MM..=XY_STEP_MM);
        self.position[2] = (self.position[2] + self.rng.gen_range(-Z_STEP_MM..=Z_STEP_MM)).max(0);

        let telemetry = TelemetryPayload {
            orientation: pack_orientation(
                self.rng.gen_range(0..2048),
                self.rng.gen_range(0..1024),
                self.rng.gen_range(0..2048),
            ),
            position: self.position,
            velocity: [0, 0, 0],
            voltage: SIMULATED_VOLTAGE_MV,
            beacons: SIMULATED_BEACONS,
            status: 0,
            position_error: 0,
        };
        let levels = [
            self.rng.gen_range(2..=2500),
            self.rng.gen_range(2..=2500),
            300,
            1000,
        ];

        self.pending.extend(encode_telemetry_frame(self.address, &telemetry));
        self.pending.extend(encode_strength_frame(self.address, levels));
    }

    fn poll_due(&mut self) {
        let now = Instant::now();
        if self.pending.is_empty() && now >= self.next_frame_at {
            self.step();
            self.next_frame_at = now + self.interval;
        }
    }
}

#[async_trait]
impl SerialTransport for SimulatedTransport {
    fn bytes_available(&mut self) -> io::Result<usize> {
        self.poll_due();
        Ok(self.pending.len())
    }

    async fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.poll_due();

        let len = self.pending.len().min(buf.len());
        buf[..len].copy_from_slice(&self.pending[..len]);
        self.pending.drain(..len);
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lps::decoder::decode;
    use crate::lps::framer::FrameSynchronizer;
    use crate::lps::protocol::Record;

    #[tokio::test]
    async fn test_first_batch_available_immediately() {
        let mut transport = SimulatedTransport::with_seed(4, Duration::from_secs(60), 1);
        let mut buf = [0u8; 256];

        let n = transport.read_available(&mut buf).await.unwrap();
        assert_eq!(n, 33 + 13, "one telemetry and one strength frame");

        // Nothing more until the interval elapses
        assert_eq!(transport.read_available(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_simulated_frames_decode() {
        let mut transport = SimulatedTransport::with_seed(4, Duration::from_secs(60), 7);
        let mut buf = [0u8; 256];
        let n = transport.read_available(&mut buf).await.unwrap();

        let mut sync = FrameSynchronizer::new();
        let records: Vec<_> = sync.feed(&buf[..n]).map(|f| decode(&f)).collect();

        assert_eq!(records.len(), 2);
        match records[0] {
            Record::Telemetry(t) => {
                assert_eq!(t.address, 4);
                assert_eq!(t.position, transport.position());
                assert_eq!(t.beacons, SIMULATED_BEACONS);
                assert!(t.position[2] >= 0);
            }
            other => panic!("Expected Telemetry, got: {:?}", other),
        }
        match records[1] {
            Record::Strength(levels) => {
                assert_eq!(&levels[2..], &[300, 1000]);
                assert!((2..=2500).contains(&levels[0]));
            }
            other => panic!("Expected Strength, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_small_buffer_reads_in_pieces() {
        let mut transport = SimulatedTransport::with_seed(1, Duration::from_secs(60), 3);
        let mut buf = [0u8; 10];

        let mut total = 0;
        loop {
            let n = transport.read_available(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        assert_eq!(total, 46);
    }
}
