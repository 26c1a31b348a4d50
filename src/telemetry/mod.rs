//! # Telemetry Module
//!
//! Holds the latest decoded values for external consumers.
//!
//! This module handles:
//! - Storing the most recent value of every decoded field
//! - Unit conversion on read (meters, volts, degrees)
//! - Publishing consistent snapshots from the reader task to consumers
//! - The edge-triggered fresh-telemetry flag

pub mod state;
pub mod store;

pub use state::{Angles, LinkStats, Position, TelemetryState};
pub use store::{channel, TelemetryHandle, TelemetryPublisher};
