//! # LPS Frame Encoder
//!
//! Builds wire frames the way a Locus unit emits them. The link is
//! receive-only, so this is used by the simulated transport and by tests.

use bytes::{BufMut, BytesMut};

use super::crc::crc8;
use super::protocol::*;
use crate::error::{LocusError, Result};

/// Raw telemetry payload fields, as laid out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetryPayload {
    /// Packed orientation, see [`pack_orientation`]
    pub orientation: u32,
    pub position: [i32; 3],
    pub velocity: [i16; 3],
    pub voltage: u16,
    pub beacons: u8,
    pub status: u8,
    pub position_error: u8,
}

impl TelemetryPayload {
    /// Serialize to the 28-byte telemetry payload (including the reserved byte)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(LPS_TELEMETRY_PAYLOAD_SIZE);
        buf.put_u32_le(self.orientation);
        for axis in self.position {
            buf.put_i32_le(axis);
        }
        for axis in self.velocity {
            buf.put_i16_le(axis);
        }
        buf.put_u16_le(self.voltage);
        buf.put_u8(self.beacons);
        buf.put_u8(self.status);
        buf.put_u8(self.position_error);
        buf.put_u8(0); // reserved
        buf.to_vec()
    }
}

/// Encode a complete wire frame
///
/// # Arguments
///
/// * `address` - Dynamic address of the sending unit
/// * `event` - Event-type tag
/// * `payload` - Event payload (max 255 bytes)
///
/// # Returns
///
/// * `Result<Vec<u8>>` - Marker + Size + Address + Event + Payload + CRC
///
/// # Errors
///
/// Returns error if the payload does not fit the 8-bit size field
///
/// # Examples
///
/// ```
/// use locus_lps::lps::encoder::encode_frame;
/// use locus_lps::lps::protocol::LPS_EVENT_RAW_ACCEL;
///
/// let frame = encode_frame(0x05, LPS_EVENT_RAW_ACCEL, &[0u8; 6]).unwrap();
/// assert_eq!(frame.len(), 11);
/// assert_eq!(frame[0], 0xFE);
/// ```
pub fn encode_frame(address: u8, event: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > LPS_MAX_PAYLOAD_SIZE {
        return Err(LocusError::Protocol(format!(
            "Payload size {} exceeds maximum {}",
            payload.len(),
            LPS_MAX_PAYLOAD_SIZE
        )));
    }

    Ok(encode_fixed(address, event, payload))
}

/// Encode a telemetry frame (32 bytes + CRC)
pub fn encode_telemetry_frame(address: u8, telemetry: &TelemetryPayload) -> Vec<u8> {
    encode_fixed(address, LPS_EVENT_TELEMETRY, &telemetry.to_bytes())
}

/// Encode a system status frame (16 bytes + CRC)
pub fn encode_sys_status_frame(address: u8, status: &SysStatus) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(LPS_SYS_STATUS_FRAME_SIZE - LPS_HEADER_SIZE);
    buf.put_u16_le(status.identifier);
    buf.put_u8(status.config_status);
    buf.put_u8(status.log_status);
    buf.put_u32_le(status.logger_capacity);
    buf.put_u32_le(status.log_size);
    encode_fixed(address, LPS_EVENT_SYS_STATUS, &buf)
}

/// Encode a firmware info frame
pub fn encode_info_frame(address: u8, info: &FirmwareInfo) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(LPS_INFO_PAYLOAD_SIZE);
    buf.put_u16_le(info.hardware_id);
    buf.put_u16_le(info.firmware_type);
    buf.put_u16_le(info.firmware_version);
    buf.put_u8(info.protocol_minor);
    buf.put_u8(info.protocol_major);
    buf.put_u32_le(info.commit);
    buf.put_u16_le(info.commit_count);
    encode_fixed(address, LPS_EVENT_INFO, &buf)
}

/// Encode a raw accelerometer frame
pub fn encode_raw_accel_frame(address: u8, accel: [i16; 3]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(LPS_RAW_ACCEL_PAYLOAD_SIZE);
    for axis in accel {
        buf.put_i16_le(axis);
    }
    encode_fixed(address, LPS_EVENT_RAW_ACCEL, &buf)
}

/// Encode a signal strength frame (12 bytes + CRC)
pub fn encode_strength_frame(address: u8, levels: [i16; 4]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(LPS_STRENGTH_FRAME_SIZE - LPS_HEADER_SIZE);
    for level in levels {
        buf.put_i16_le(level);
    }
    encode_fixed(address, LPS_EVENT_STRENGTH, &buf)
}

/// Caller guarantees the payload fits the size field
fn encode_fixed(address: u8, event: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(LPS_HEADER_SIZE + payload.len() + 1);
    frame.push(LPS_START_MARKER);
    frame.push(payload.len() as u8);
    frame.push(address);
    frame.push(event);
    frame.extend_from_slice(payload);

    // CRC covers everything after the start marker
    let crc = crc8(&frame[1..]);
    frame.push(crc);

    frame
}
