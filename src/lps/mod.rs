//! # LPS Protocol Module
//!
//! Implementation of the Locus positioning system serial telemetry protocol.
//!
//! This module handles:
//! - CRC-8 (Dallas/Maxim) checksum calculation
//! - Frame synchronization over an unreliable byte stream
//! - Typed decoding of Telemetry, SysStatus, Info, RawAccel and Strength frames
//! - Frame encoding for simulation and tests

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod framer;
pub mod crc;
