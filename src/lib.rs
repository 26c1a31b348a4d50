//! # Locus LPS Library
//!
//! Streaming decoder for telemetry from Locus indoor-positioning units.
//!
//! This library turns the raw serial byte stream into validated frames,
//! decodes them into typed records, and keeps the latest values available
//! to consumers through a lock-free snapshot handle.

pub mod config;
pub mod error;
pub mod lps;
pub mod reader;
pub mod serial;
pub mod telemetry;
