//! Latest-known decoded values and their consumer-facing accessors.
//!
//! Values are stored in device units (millimeters, millivolts, radians) and
//! converted on read.

use serde::Serialize;

use crate::lps::framer::SyncStats;
use crate::lps::protocol::{FirmwareInfo, Record, SysStatus, Telemetry};

/// Position in meters plus the visible-beacon bitmask
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub beacons: u8,
}

/// Orientation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Angles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Link health counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Frames that passed the checksum
    pub frames: u64,

    /// Frames dropped on checksum mismatch
    pub crc_errors: u64,

    /// Bytes discarded while searching for a start marker
    pub skipped_bytes: u64,

    /// Valid frames with an unknown tag or unacceptable length
    pub unrecognized: u64,
}

/// Latest decoded value of every field, each `None` until first decode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryState {
    telemetry: Option<Telemetry>,
    sys_status: Option<SysStatus>,
    info: Option<FirmwareInfo>,
    raw_accel: Option<[i16; 3]>,
    signal_levels: Option<[i16; 4]>,
    link_stats: LinkStats,
}

impl TelemetryState {
    /// Merge a decoded record into the state
    ///
    /// Only the fields of the record's own variant are replaced.
    /// Returns `true` for a Telemetry record.
    pub fn apply(&mut self, record: &Record) -> bool {
        match *record {
            Record::Telemetry(telemetry) => {
                self.telemetry = Some(telemetry);
                return true;
            }
            Record::SysStatus(status) => self.sys_status = Some(status),
            Record::Info(info) => self.info = Some(info),
            Record::RawAccel(accel) => self.raw_accel = Some(accel),
            Record::Strength(levels) => self.signal_levels = Some(levels),
            Record::Unrecognized { .. } => self.link_stats.unrecognized += 1,
        }
        false
    }

    /// Copy the synchronizer counters into the link statistics
    pub fn update_sync_stats(&mut self, stats: SyncStats) {
        self.link_stats.frames = stats.frames;
        self.link_stats.crc_errors = stats.crc_errors;
        self.link_stats.skipped_bytes = stats.skipped_bytes;
    }

    /// Raw telemetry record, device units
    pub fn telemetry(&self) -> Option<&Telemetry> {
        self.telemetry.as_ref()
    }

    /// Dynamic address of the unit that sent the latest telemetry
    pub fn address(&self) -> Option<u8> {
        self.telemetry.map(|t| t.address)
    }

    /// Position in meters with the beacon bitmask
    pub fn position(&self) -> Option<Position> {
        self.telemetry.map(|t| Position {
            x: t.position[0] as f64 / 1000.0,
            y: t.position[1] as f64 / 1000.0,
            z: t.position[2] as f64 / 1000.0,
            beacons: t.beacons,
        })
    }

    /// Roll, pitch and yaw in degrees
    pub fn angles(&self) -> Option<Angles> {
        self.telemetry.map(|t| Angles {
            roll: t.orientation.roll.to_degrees(),
            pitch: t.orientation.pitch.to_degrees(),
            yaw: t.orientation.yaw.to_degrees(),
        })
    }

    pub fn velocity(&self) -> Option<[i16; 3]> {
        self.telemetry.map(|t| t.velocity)
    }

    /// Supply voltage in volts
    pub fn voltage(&self) -> Option<f64> {
        self.telemetry.map(|t| t.voltage as f64 / 1000.0)
    }

    pub fn status(&self) -> Option<u8> {
        self.telemetry.map(|t| t.status)
    }

    pub fn position_error(&self) -> Option<u8> {
        self.telemetry.map(|t| t.position_error)
    }

    pub fn sys_status(&self) -> Option<SysStatus> {
        self.sys_status
    }

    pub fn info(&self) -> Option<FirmwareInfo> {
        self.info
    }

    pub fn raw_accel(&self) -> Option<[i16; 3]> {
        self.raw_accel
    }

    pub fn signal_levels(&self) -> Option<[i16; 4]> {
        self.signal_levels
    }

    pub fn link_stats(&self) -> LinkStats {
        self.link_stats
    }
}
