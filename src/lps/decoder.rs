//! # LPS Packet Decoder
//!
//! Decodes validated frames into typed records (Telemetry, SysStatus,
//! Info, RawAccel, Strength).

use bytes::Buf;
use tracing::debug;

use super::protocol::*;
use crate::error::{LocusError, Result};

/// Decode a validated frame into a record
///
/// Dispatches on the event tag. Unknown tags, length-gated events with the
/// wrong frame length, and payloads too short for their layout all yield
/// [`Record::Unrecognized`].
///
/// # Examples
///
/// ```
/// use locus_lps::lps::decoder::decode;
/// use locus_lps::lps::encoder::encode_strength_frame;
/// use locus_lps::lps::framer::FrameSynchronizer;
/// use locus_lps::lps::protocol::Record;
///
/// let wire = encode_strength_frame(1, [10, 20, 30, 40]);
/// let mut sync = FrameSynchronizer::new();
/// let frame = sync.feed(&wire).next().unwrap();
///
/// assert_eq!(decode(&frame), Record::Strength([10, 20, 30, 40]));
/// ```
pub fn decode(frame: &Frame) -> Record {
    let result = match frame.event() {
        LPS_EVENT_TELEMETRY => {
            decode_telemetry(frame.address(), frame.payload()).map(Record::Telemetry)
        }
        LPS_EVENT_SYS_STATUS if frame.len() == LPS_SYS_STATUS_FRAME_SIZE => {
            decode_sys_status(frame.payload()).map(Record::SysStatus)
        }
        LPS_EVENT_INFO => decode_info(frame.payload()).map(Record::Info),
        LPS_EVENT_RAW_ACCEL => decode_raw_accel(frame.payload()).map(Record::RawAccel),
        LPS_EVENT_STRENGTH if frame.len() == LPS_STRENGTH_FRAME_SIZE => {
            decode_strength(frame.payload()).map(Record::Strength)
        }
        event => {
            debug!("Ignoring frame: event 0x{:02X}, length {}", event, frame.len());
            return unrecognized(frame);
        }
    };

    result.unwrap_or_else(|e| {
        debug!("Ignoring frame: {}", e);
        unrecognized(frame)
    })
}

fn unrecognized(frame: &Frame) -> Record {
    Record::Unrecognized {
        event: frame.event(),
        len: frame.len(),
    }
}

fn ensure_len(name: &str, payload: &[u8], required: usize) -> Result<()> {
    if payload.len() < required {
        return Err(LocusError::Protocol(format!(
            "{} payload too short: {} bytes",
            name,
            payload.len()
        )));
    }
    Ok(())
}

/// Decode a Telemetry payload (28 bytes)
///
/// # Arguments
///
/// * `address` - Dynamic address from the frame header
/// * `payload` - Telemetry payload
///
/// # Returns
///
/// * `Result<Telemetry>` - Decoded telemetry in raw device units, with
///   orientation unpacked to radians
pub fn decode_telemetry(address: u8, payload: &[u8]) -> Result<Telemetry> {
    ensure_len("Telemetry", payload, LPS_TELEMETRY_PAYLOAD_SIZE)?;
    let mut buf = payload;

    let orientation = Orientation::from_packed(buf.get_u32_le());
    let position = [buf.get_i32_le(), buf.get_i32_le(), buf.get_i32_le()];
    let velocity = [buf.get_i16_le(), buf.get_i16_le(), buf.get_i16_le()];
    let voltage = buf.get_u16_le();
    let beacons = buf.get_u8();
    let status = buf.get_u8();
    let position_error = buf.get_u8();

    Ok(Telemetry {
        address,
        orientation,
        position,
        velocity,
        voltage,
        beacons,
        status,
        position_error,
    })
}

/// Decode a SysStatus payload (12 bytes)
pub fn decode_sys_status(payload: &[u8]) -> Result<SysStatus> {
    ensure_len("SysStatus", payload, LPS_SYS_STATUS_FRAME_SIZE - LPS_HEADER_SIZE)?;
    let mut buf = payload;

    Ok(SysStatus {
        identifier: buf.get_u16_le(),
        config_status: buf.get_u8(),
        log_status: buf.get_u8(),
        logger_capacity: buf.get_u32_le(),
        log_size: buf.get_u32_le(),
    })
}

/// Decode an Info payload (14 bytes)
pub fn decode_info(payload: &[u8]) -> Result<FirmwareInfo> {
    ensure_len("Info", payload, LPS_INFO_PAYLOAD_SIZE)?;
    let mut buf = payload;

    Ok(FirmwareInfo {
        hardware_id: buf.get_u16_le(),
        firmware_type: buf.get_u16_le(),
        firmware_version: buf.get_u16_le(),
        protocol_minor: buf.get_u8(),
        protocol_major: buf.get_u8(),
        commit: buf.get_u32_le(),
        commit_count: buf.get_u16_le(),
    })
}

/// Decode a RawAccel payload (6 bytes)
pub fn decode_raw_accel(payload: &[u8]) -> Result<[i16; 3]> {
    ensure_len("RawAccel", payload, LPS_RAW_ACCEL_PAYLOAD_SIZE)?;
    let mut buf = payload;

    Ok([buf.get_i16_le(), buf.get_i16_le(), buf.get_i16_le()])
}

/// Decode a Strength payload (8 bytes)
pub fn decode_strength(payload: &[u8]) -> Result<[i16; 4]> {
    ensure_len("Strength", payload, LPS_STRENGTH_FRAME_SIZE - LPS_HEADER_SIZE)?;
    let mut buf = payload;

    Ok([
        buf.get_i16_le(),
        buf.get_i16_le(),
        buf.get_i16_le(),
        buf.get_i16_le(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lps::crc::crc8;
    use crate::lps::encoder::*;
    use crate::lps::framer::FrameSynchronizer;
    use std::f64::consts::PI;

    /// Strip the checksum from an encoded wire frame
    fn frame_from_wire(wire: &[u8]) -> Frame {
        Frame::from_validated(wire[..wire.len() - 1].to_vec())
    }

    fn sample_payload() -> TelemetryPayload {
        TelemetryPayload {
            orientation: pack_orientation(1024, 256, 51),
            position: [1500, -2000, 300],
            velocity: [-12, 34, -56],
            voltage: 3712,
            beacons: 0b1010,
            status: 0x03,
            position_error: 17,
        }
    }

    #[test]
    fn test_decode_telemetry() {
        let frame = frame_from_wire(&encode_telemetry_frame(0x42, &sample_payload()));

        let telemetry = match decode(&frame) {
            Record::Telemetry(t) => t,
            other => panic!("Expected Telemetry, got: {:?}", other),
        };

        assert_eq!(telemetry.address, 0x42);
        assert_eq!(telemetry.position, [1500, -2000, 300]);
        assert_eq!(telemetry.velocity, [-12, 34, -56]);
        assert_eq!(telemetry.voltage, 3712);
        assert_eq!(telemetry.beacons, 0b1010);
        assert_eq!(telemetry.status, 0x03);
        assert_eq!(telemetry.position_error, 17);
        assert!((telemetry.orientation.roll - 3.142).abs() < 1e-9);
        assert!((telemetry.orientation.pitch - 0.785).abs() < 1e-9);
        assert!((telemetry.orientation.yaw - 1.571).abs() < 1e-9);
    }

    #[test]
    fn test_decode_telemetry_yaw_divisor() {
        let payload = TelemetryPayload {
            orientation: 0x7FF << 21,
            ..sample_payload()
        };
        let frame = frame_from_wire(&encode_telemetry_frame(1, &payload));

        let Record::Telemetry(telemetry) = decode(&frame) else {
            panic!("Expected Telemetry");
        };
        assert_eq!(telemetry.orientation.roll, 0.0);
        assert_eq!(
            telemetry.orientation.yaw,
            (2047.0 * PI / 102.0 * 1000.0).round() / 1000.0
        );
    }

    #[test]
    fn test_decode_telemetry_too_short() {
        let wire = encode_frame(1, LPS_EVENT_TELEMETRY, &[0u8; 20]).unwrap();
        let frame = frame_from_wire(&wire);

        assert_eq!(
            decode(&frame),
            Record::Unrecognized { event: LPS_EVENT_TELEMETRY, len: 24 }
        );
        assert!(decode_telemetry(1, &[0u8; 20]).is_err());
    }

    #[test]
    fn test_decode_sys_status() {
        let status = SysStatus {
            identifier: 0xBEEF,
            config_status: 1,
            log_status: 2,
            logger_capacity: 1_048_576,
            log_size: 4096,
        };
        let frame = frame_from_wire(&encode_sys_status_frame(3, &status));

        assert_eq!(frame.len(), LPS_SYS_STATUS_FRAME_SIZE);
        assert_eq!(decode(&frame), Record::SysStatus(status));
    }

    #[test]
    fn test_decode_sys_status_wrong_length() {
        for len in [11usize, 13, 20] {
            let wire = encode_frame(3, LPS_EVENT_SYS_STATUS, &vec![0u8; len]).unwrap();
            let frame = frame_from_wire(&wire);

            assert_eq!(
                decode(&frame),
                Record::Unrecognized { event: LPS_EVENT_SYS_STATUS, len: len + 4 },
                "SysStatus frame of length {} must be rejected",
                len + 4
            );
        }
    }

    #[test]
    fn test_decode_info() {
        let info = FirmwareInfo {
            hardware_id: 0x0102,
            firmware_type: 7,
            firmware_version: 0x0304,
            protocol_minor: 2,
            protocol_major: 1,
            commit: 0xDEAD_BEEF,
            commit_count: 812,
        };
        let frame = frame_from_wire(&encode_info_frame(5, &info));

        assert_eq!(decode(&frame), Record::Info(info));
    }

    #[test]
    fn test_decode_info_too_short() {
        let wire = encode_frame(5, LPS_EVENT_INFO, &[0u8; 10]).unwrap();
        assert!(matches!(
            decode(&frame_from_wire(&wire)),
            Record::Unrecognized { event: LPS_EVENT_INFO, .. }
        ));
    }

    #[test]
    fn test_decode_raw_accel() {
        let frame = frame_from_wire(&encode_raw_accel_frame(5, [-1000, 0, 16384]));
        assert_eq!(decode(&frame), Record::RawAccel([-1000, 0, 16384]));
    }

    #[test]
    fn test_decode_raw_accel_accepts_trailing_bytes() {
        let wire = encode_frame(5, LPS_EVENT_RAW_ACCEL, &[1, 0, 2, 0, 3, 0, 0xAA, 0xBB]).unwrap();
        assert_eq!(decode(&frame_from_wire(&wire)), Record::RawAccel([1, 2, 3]));
    }

    #[test]
    fn test_decode_strength() {
        let frame = frame_from_wire(&encode_strength_frame(5, [2, 2500, 300, -1000]));
        assert_eq!(decode(&frame), Record::Strength([2, 2500, 300, -1000]));
    }

    #[test]
    fn test_decode_strength_wrong_length() {
        let wire = encode_frame(5, LPS_EVENT_STRENGTH, &[0u8; 10]).unwrap();
        assert_eq!(
            decode(&frame_from_wire(&wire)),
            Record::Unrecognized { event: LPS_EVENT_STRENGTH, len: 14 }
        );
    }

    #[test]
    fn test_decode_unknown_event() {
        let wire = encode_frame(5, 0x7F, &[1, 2, 3]).unwrap();
        assert_eq!(
            decode(&frame_from_wire(&wire)),
            Record::Unrecognized { event: 0x7F, len: 7 }
        );
    }

    #[test]
    fn test_decode_is_idempotent() {
        let frame = frame_from_wire(&encode_telemetry_frame(9, &sample_payload()));
        let first = decode(&frame);
        let second = decode(&frame);
        assert_eq!(first, second);
    }

    // Wire captures with checksums from the unit's CRC-8 table, one per event
    const TELEMETRY_WIRE: [u8; 33] = [
        0xFE, 0x1C, 0x0C, 0x02, 0x00, 0x00, 0xE0, 0xFF, 0xDC, 0x05, 0x00, 0x00, 0x30, 0xF8, 0xFF,
        0xFF, 0x2C, 0x01, 0x00, 0x00, 0x0A, 0x00, 0xEC, 0xFF, 0x1E, 0x00, 0x6E, 0x0F, 0x0B, 0x01,
        0x04, 0x00, 0x35,
    ];
    const SYS_STATUS_WIRE: [u8; 17] = [
        0xFE, 0x0C, 0x0C, 0x08, 0xEF, 0xBE, 0x01, 0x02, 0x00, 0x00, 0x10, 0x00, 0x00, 0x10, 0x00,
        0x00, 0x7D,
    ];
    const INFO_WIRE: [u8; 19] = [
        0xFE, 0x0E, 0x0C, 0x18, 0x03, 0x00, 0x01, 0x00, 0x02, 0x01, 0x02, 0x01, 0xEF, 0xBE, 0xAD,
        0xDE, 0x2A, 0x00, 0xB0,
    ];
    const RAW_ACCEL_WIRE: [u8; 11] = [0xFE, 0x06, 0x0C, 0x1D, 0x01, 0x00, 0xFE, 0xFF, 0x03, 0x00, 0xDB];
    const STRENGTH_WIRE: [u8; 13] = [
        0xFE, 0x08, 0x0C, 0x33, 0x02, 0x00, 0xC4, 0x09, 0x2C, 0x01, 0x18, 0xFC, 0x5B,
    ];

    fn captured_frames() -> Vec<(&'static [u8], Record)> {
        vec![
            (
                &TELEMETRY_WIRE[..],
                Record::Telemetry(Telemetry {
                    address: 0x0C,
                    orientation: Orientation { roll: 0.0, pitch: 0.0, yaw: 63.047 },
                    position: [1500, -2000, 300],
                    velocity: [10, -20, 30],
                    voltage: 3950,
                    beacons: 0b1011,
                    status: 1,
                    position_error: 4,
                }),
            ),
            (
                &SYS_STATUS_WIRE[..],
                Record::SysStatus(SysStatus {
                    identifier: 48879,
                    config_status: 1,
                    log_status: 2,
                    logger_capacity: 0x0010_0000,
                    log_size: 4096,
                }),
            ),
            (
                &INFO_WIRE[..],
                Record::Info(FirmwareInfo {
                    hardware_id: 3,
                    firmware_type: 1,
                    firmware_version: 0x0102,
                    protocol_minor: 2,
                    protocol_major: 1,
                    commit: 0xDEAD_BEEF,
                    commit_count: 42,
                }),
            ),
            (&RAW_ACCEL_WIRE[..], Record::RawAccel([1, -2, 3])),
            (&STRENGTH_WIRE[..], Record::Strength([2, 2500, 300, -1000])),
        ]
    }

    #[test]
    fn test_captured_checksums_cover_size_through_payload() {
        for (wire, _) in captured_frames() {
            let (body, checksum) = wire.split_at(wire.len() - 1);
            assert_eq!(crc8(&body[1..]), checksum[0], "event 0x{:02X}", body[3]);
            assert_ne!(crc8(body), checksum[0], "marker must not be checksummed");
        }
    }

    #[test]
    fn test_captured_frames_byte_by_byte() {
        let mut sync = FrameSynchronizer::new();

        for (wire, expected) in captured_frames() {
            let mut frames = Vec::new();
            for byte in wire {
                frames.extend(sync.feed(std::slice::from_ref(byte)));
            }

            assert_eq!(frames.len(), 1, "event 0x{:02X} not emitted", wire[3]);
            assert_eq!(frames[0].as_bytes(), &wire[..wire.len() - 1]);
            assert_eq!(decode(&frames[0]), expected);
        }

        assert_eq!(sync.stats().frames, 5);
        assert_eq!(sync.stats().crc_errors, 0);
    }

    #[test]
    fn test_captured_frames_in_one_read() {
        let stream: Vec<u8> = captured_frames().into_iter().flat_map(|(wire, _)| wire.to_vec()).collect();

        let mut sync = FrameSynchronizer::new();
        let records: Vec<Record> = sync.feed(&stream).map(|frame| decode(&frame)).collect();
        let expected: Vec<Record> = captured_frames().into_iter().map(|(_, record)| record).collect();

        assert_eq!(records, expected);
    }
}
