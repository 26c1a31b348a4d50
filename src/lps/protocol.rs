//! # LPS Protocol Constants and Types
//!
//! Core protocol definitions for the Locus positioning telemetry link.
//!
//! Wire layout of one frame:
//!
//! ```text
//! +--------+------+---------+-------+-------------+-----+
//! | 0xFE   | N    | address | event | payload (N) | CRC |
//! +--------+------+---------+-------+-------------+-----+
//! ```
//!
//! The checksum covers `N`, address, event and payload. A decoded [`Frame`]
//! holds everything except the trailing checksum, so its length is `N + 4`.

use serde::Serialize;
use std::f64::consts::PI;

/// Frame start marker (always 0xFE)
pub const LPS_START_MARKER: u8 = 0xFE;

/// Bytes preceding the payload: marker, size, address, event
pub const LPS_HEADER_SIZE: usize = 4;

/// Largest payload expressible in the 8-bit size field
pub const LPS_MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Largest frame (without checksum) the synchronizer must hold
pub const LPS_MAX_FRAME_SIZE: usize = LPS_MAX_PAYLOAD_SIZE + LPS_HEADER_SIZE;

/// Position, orientation, velocity and power telemetry
pub const LPS_EVENT_TELEMETRY: u8 = 0x02;

/// Logger / configuration status
pub const LPS_EVENT_SYS_STATUS: u8 = 0x08;

/// Hardware and firmware identification
pub const LPS_EVENT_INFO: u8 = 0x18;

/// Raw accelerometer sample
pub const LPS_EVENT_RAW_ACCEL: u8 = 0x1D;

/// Beacon signal levels
pub const LPS_EVENT_STRENGTH: u8 = 0x33;

/// Telemetry payload: u32 orientation, 3×i32 position, 3×i16 velocity,
/// u16 voltage, u8 beacons, u8 status, u8 position error, 1 reserved byte
pub const LPS_TELEMETRY_PAYLOAD_SIZE: usize = 28;

/// SysStatus frames are only accepted at exactly this length
pub const LPS_SYS_STATUS_FRAME_SIZE: usize = 16;

/// Info payload: 3×u16, 2×u8, u32, u16
pub const LPS_INFO_PAYLOAD_SIZE: usize = 14;

/// Raw accelerometer payload: 3×i16
pub const LPS_RAW_ACCEL_PAYLOAD_SIZE: usize = 6;

/// Strength frames are only accepted at exactly this length
pub const LPS_STRENGTH_FRAME_SIZE: usize = 12;

/// Roll occupies bits 0..11 of the packed orientation
pub const ORIENTATION_ROLL_MASK: u32 = 0x7FF;

/// Pitch occupies bits 11..21 of the packed orientation
pub const ORIENTATION_PITCH_MASK: u32 = 0x3FF;

/// Yaw occupies bits 21..32 of the packed orientation
pub const ORIENTATION_YAW_MASK: u32 = 0x7FF;

const ORIENTATION_PITCH_SHIFT: u32 = 11;
const ORIENTATION_YAW_SHIFT: u32 = 21;

/// Roll and pitch quantization divisor
const ROLL_PITCH_DIVISOR: f64 = 1024.0;

/// Yaw quantization divisor, as encoded by the unit firmware (not 1024)
const YAW_DIVISOR: f64 = 102.0;

/// A complete, checksum-validated frame (start marker through payload)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// Wrap validated frame bytes.
    ///
    /// Only the synchronizer builds frames from the wire; the bytes are
    /// assumed to start with the marker and carry at least the header.
    pub(crate) fn from_validated(bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.len() >= LPS_HEADER_SIZE);
        Self { bytes }
    }

    /// Raw frame bytes (without the checksum)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total frame length (`N + 4`)
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for a validated frame; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Payload size field (`N`)
    pub fn size_field(&self) -> u8 {
        self.bytes[1]
    }

    /// Dynamic address of the unit that sent the frame
    pub fn address(&self) -> u8 {
        self.bytes[2]
    }

    /// Event-type tag
    pub fn event(&self) -> u8 {
        self.bytes[3]
    }

    /// Event-specific payload
    pub fn payload(&self) -> &[u8] {
        &self.bytes[LPS_HEADER_SIZE..]
    }
}

/// Orientation in radians, decoded from the packed 32-bit field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Orientation {
    /// Unpack the 11/10/11-bit orientation field.
    ///
    /// Each angle is rounded to three decimals in radians.
    pub fn from_packed(raw: u32) -> Self {
        let roll = (raw & ORIENTATION_ROLL_MASK) as f64 * PI / ROLL_PITCH_DIVISOR;
        let pitch = ((raw >> ORIENTATION_PITCH_SHIFT) & ORIENTATION_PITCH_MASK) as f64 * PI
            / ROLL_PITCH_DIVISOR;
        let yaw = ((raw >> ORIENTATION_YAW_SHIFT) & ORIENTATION_YAW_MASK) as f64 * PI / YAW_DIVISOR;

        Self {
            roll: round_millis(roll),
            pitch: round_millis(pitch),
            yaw: round_millis(yaw),
        }
    }
}

/// Pack raw roll/pitch/yaw steps into the 32-bit orientation field.
///
/// Out-of-range bits are masked off.
pub fn pack_orientation(roll: u16, pitch: u16, yaw: u16) -> u32 {
    (roll as u32 & ORIENTATION_ROLL_MASK)
        | ((pitch as u32 & ORIENTATION_PITCH_MASK) << ORIENTATION_PITCH_SHIFT)
        | ((yaw as u32 & ORIENTATION_YAW_MASK) << ORIENTATION_YAW_SHIFT)
}

fn round_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Telemetry record (event 0x02), raw device units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Dynamic address of the reporting unit
    pub address: u8,

    /// Orientation in radians
    pub orientation: Orientation,

    /// Position in millimeters (x, y, z)
    pub position: [i32; 3],

    /// Velocity (x, y, z), device units
    pub velocity: [i16; 3],

    /// Supply voltage in millivolts
    pub voltage: u16,

    /// Bitmask of beacons visible to the unit
    pub beacons: u8,

    /// Unit status byte
    pub status: u8,

    /// Position error estimate
    pub position_error: u8,
}

/// System status record (event 0x08)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SysStatus {
    pub identifier: u16,
    pub config_status: u8,
    pub log_status: u8,
    pub logger_capacity: u32,
    pub log_size: u32,
}

/// Firmware information record (event 0x18)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FirmwareInfo {
    pub hardware_id: u16,
    pub firmware_type: u16,
    pub firmware_version: u16,
    pub protocol_minor: u8,
    pub protocol_major: u8,

    /// Firmware commit hash (truncated to 32 bits)
    pub commit: u32,
    pub commit_count: u16,
}

/// Decoded frame, one variant per known event type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
    Telemetry(Telemetry),
    SysStatus(SysStatus),
    Info(FirmwareInfo),

    /// Accelerometer axes (x, y, z)
    RawAccel([i16; 3]),

    /// Four beacon signal levels
    Strength([i16; 4]),

    /// Unknown event, or a known event with an unacceptable length
    Unrecognized { event: u8, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(LPS_START_MARKER, 0xFE);
        assert_eq!(LPS_MAX_FRAME_SIZE, 259);
        assert_eq!(LPS_HEADER_SIZE + LPS_TELEMETRY_PAYLOAD_SIZE, 32);
        assert_eq!(LPS_SYS_STATUS_FRAME_SIZE - LPS_HEADER_SIZE, 12);
        assert_eq!(LPS_STRENGTH_FRAME_SIZE - LPS_HEADER_SIZE, 8);
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::from_validated(vec![0xFE, 0x02, 0x07, 0x33, 0xAA, 0xBB]);
        assert_eq!(frame.len(), 6);
        assert_eq!(frame.size_field(), 2);
        assert_eq!(frame.address(), 7);
        assert_eq!(frame.event(), LPS_EVENT_STRENGTH);
        assert_eq!(frame.payload(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_orientation_yaw_only() {
        let orientation = Orientation::from_packed(0x7FF << 21);
        assert_eq!(orientation.roll, 0.0);
        assert_eq!(orientation.pitch, 0.0);

        let expected = (2047.0 * PI / 102.0 * 1000.0).round() / 1000.0;
        assert_eq!(orientation.yaw, expected);
        assert!((orientation.yaw - 63.047).abs() < 1e-9);
    }

    #[test]
    fn test_orientation_roll_only() {
        let orientation = Orientation::from_packed(0x7FF);
        assert!((orientation.roll - 6.280).abs() < 1e-9);
        assert_eq!(orientation.pitch, 0.0);
        assert_eq!(orientation.yaw, 0.0);
    }

    #[test]
    fn test_orientation_pitch_field() {
        // 512 steps of pi/1024 is exactly pi/2
        let orientation = Orientation::from_packed(512 << 11);
        assert!((orientation.pitch - 1.571).abs() < 1e-9);
        assert_eq!(orientation.roll, 0.0);
        assert_eq!(orientation.yaw, 0.0);
    }

    #[test]
    fn test_pack_orientation_masks_fields() {
        assert_eq!(pack_orientation(0x7FF, 0, 0), 0x7FF);
        assert_eq!(pack_orientation(0, 0x3FF, 0), 0x3FF << 11);
        assert_eq!(pack_orientation(0, 0, 0x7FF), 0x7FF << 21);

        // Pitch is only 10 bits wide, bit 10 must not leak into yaw
        assert_eq!(pack_orientation(0, 0x7FF, 0), 0x3FF << 11);
    }

    #[test]
    fn test_pack_unpack_orientation() {
        let orientation = Orientation::from_packed(pack_orientation(1024, 256, 51));
        assert!((orientation.roll - 3.142).abs() < 1e-9);
        assert!((orientation.pitch - 0.785).abs() < 1e-9);
        assert!((orientation.yaw - 1.571).abs() < 1e-9);
    }
}
