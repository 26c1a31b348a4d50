//! Single-writer / multi-reader telemetry store.
//!
//! The reader task owns a [`TelemetryPublisher`] and is the only writer. Every
//! applied record publishes an immutable snapshot over a `watch` channel, so
//! consumers always observe a consistent [`TelemetryState`] without locking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use super::state::{Angles, LinkStats, Position, TelemetryState};
use crate::lps::framer::SyncStats;
use crate::lps::protocol::{FirmwareInfo, Record, SysStatus, Telemetry};

/// Writer side of the store, owned by the reader task
#[derive(Debug)]
pub struct TelemetryPublisher {
    state: TelemetryState,
    tx: watch::Sender<Arc<TelemetryState>>,
    fresh: Arc<AtomicBool>,
}

/// Read-only view for consumers
///
/// Cheap to clone. All clones share one fresh-telemetry flag.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    rx: watch::Receiver<Arc<TelemetryState>>,
    fresh: Arc<AtomicBool>,
}

/// Create a connected publisher/handle pair with an empty state
pub fn channel() -> (TelemetryPublisher, TelemetryHandle) {
    let (tx, rx) = watch::channel(Arc::new(TelemetryState::default()));
    let fresh = Arc::new(AtomicBool::new(false));

    let publisher = TelemetryPublisher {
        state: TelemetryState::default(),
        tx,
        fresh: Arc::clone(&fresh),
    };

    (publisher, TelemetryHandle { rx, fresh })
}

impl TelemetryPublisher {
    /// Apply a decoded record and publish the new snapshot
    ///
    /// Unrecognized records only bump the link statistics.
    pub fn apply(&mut self, record: &Record) {
        let is_telemetry = self.state.apply(record);
        self.publish();

        if is_telemetry {
            // Set after publishing so a reader seeing the flag sees the data
            self.fresh.store(true, Ordering::Release);
        }
    }

    /// Publish updated synchronizer counters
    pub fn update_sync_stats(&mut self, stats: SyncStats) {
        self.state.update_sync_stats(stats);
        self.publish();
    }

    /// Current writer-side state
    pub fn state(&self) -> &TelemetryState {
        &self.state
    }

    fn publish(&self) {
        // send_replace succeeds even when every handle has been dropped
        self.tx.send_replace(Arc::new(self.state.clone()));
    }
}

impl TelemetryHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<TelemetryState> {
        Arc::clone(&self.rx.borrow())
    }

    /// Edge-triggered fresh-telemetry flag
    ///
    /// Returns `true` exactly once per decoded Telemetry frame (coalescing
    /// frames decoded between two calls), then `false` until the next one.
    pub fn fresh_telemetry(&self) -> bool {
        self.fresh.swap(false, Ordering::AcqRel)
    }

    pub fn telemetry(&self) -> Option<Telemetry> {
        self.snapshot().telemetry().copied()
    }

    pub fn address(&self) -> Option<u8> {
        self.snapshot().address()
    }

    /// Position in meters with the beacon bitmask
    pub fn position(&self) -> Option<Position> {
        self.snapshot().position()
    }

    /// Roll, pitch and yaw in degrees
    pub fn angles(&self) -> Option<Angles> {
        self.snapshot().angles()
    }

    pub fn velocity(&self) -> Option<[i16; 3]> {
        self.snapshot().velocity()
    }

    /// Supply voltage in volts
    pub fn voltage(&self) -> Option<f64> {
        self.snapshot().voltage()
    }

    pub fn status(&self) -> Option<u8> {
        self.snapshot().status()
    }

    pub fn position_error(&self) -> Option<u8> {
        self.snapshot().position_error()
    }

    pub fn sys_status(&self) -> Option<SysStatus> {
        self.snapshot().sys_status()
    }

    pub fn info(&self) -> Option<FirmwareInfo> {
        self.snapshot().info()
    }

    pub fn raw_accel(&self) -> Option<[i16; 3]> {
        self.snapshot().raw_accel()
    }

    pub fn signal_levels(&self) -> Option<[i16; 4]> {
        self.snapshot().signal_levels()
    }

    pub fn link_stats(&self) -> LinkStats {
        self.snapshot().link_stats()
    }
}
