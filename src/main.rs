//! # Locus LPS
//!
//! Reads telemetry from a Locus positioning unit and reports the decoded
//! position and orientation.

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::time::{interval, Duration};
use tracing::info;

use locus_lps::config::Config;
use locus_lps::lps::protocol::{FirmwareInfo, SysStatus};
use locus_lps::reader::LpsReader;
use locus_lps::telemetry::{Angles, Position, TelemetryHandle};

/// One line of `jsonl` report output
#[derive(Debug, Serialize)]
struct ReportLine {
    timestamp: String,
    address: Option<u8>,
    position: Option<Position>,
    angles: Option<Angles>,
    voltage: Option<f64>,
    signal_levels: Option<[i16; 4]>,
    sys_status: Option<SysStatus>,
    info: Option<FirmwareInfo>,
}

/// Main entry point for Locus LPS
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (first argument, defaults otherwise)
///    - Open the serial link (or start the simulated unit)
///
/// 2. **Main Loop**
///    - Every report interval, print the latest telemetry if a new frame arrived
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop the reader task and release the serial port
///    - Log link statistics
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be loaded
/// - The serial port cannot be opened (no Locus device found)
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Locus LPS v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path))?,
        None => Config::default(),
    };

    let reader = LpsReader::start(&config).context("starting LPS reader")?;
    let telemetry = reader.telemetry();

    let mut report_interval = interval(Duration::from_millis(config.report.interval_ms));
    let jsonl = config.report.format == "jsonl";

    info!("Reporting every {}ms, press Ctrl+C to exit", config.report.interval_ms);

    loop {
        tokio::select! {
            _ = report_interval.tick() => {
                if telemetry.fresh_telemetry() {
                    report(&telemetry, jsonl)?;
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    reader.stop().await;

    let stats = telemetry.link_stats();
    info!(
        "Frames: {}, CRC errors: {}, unrecognized: {}, bytes skipped: {}",
        stats.frames, stats.crc_errors, stats.unrecognized, stats.skipped_bytes
    );

    Ok(())
}

fn report(telemetry: &TelemetryHandle, jsonl: bool) -> Result<()> {
    let snapshot = telemetry.snapshot();

    if jsonl {
        let line = ReportLine {
            timestamp: chrono::Utc::now().to_rfc3339(),
            address: snapshot.address(),
            position: snapshot.position(),
            angles: snapshot.angles(),
            voltage: snapshot.voltage(),
            signal_levels: snapshot.signal_levels(),
            sys_status: snapshot.sys_status(),
            info: snapshot.info(),
        };
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    if let (Some(position), Some(angles)) = (snapshot.position(), snapshot.angles()) {
        info!(
            "Unit {}: pos ({:.3}, {:.3}, {:.3}) m, beacons 0b{:04b}, rpy ({:.1}, {:.1}, {:.1})°, {:.2} V",
            snapshot.address().unwrap_or_default(),
            position.x,
            position.y,
            position.z,
            position.beacons,
            angles.roll,
            angles.pitch,
            angles.yaw,
            snapshot.voltage().unwrap_or_default()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_line_serializes() {
        let line = ReportLine {
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            address: Some(3),
            position: Some(Position { x: 1.5, y: -2.0, z: 0.3, beacons: 10 }),
            angles: None,
            voltage: Some(3.9),
            signal_levels: None,
            sys_status: None,
            info: Some(FirmwareInfo {
                hardware_id: 3,
                firmware_type: 1,
                firmware_version: 0x0102,
                protocol_minor: 2,
                protocol_major: 1,
                commit: 0xDEAD_BEEF,
                commit_count: 42,
            }),
        };

        let json = serde_json::to_string(&line).unwrap();
        assert!(json.contains(r#""address":3"#));
        assert!(json.contains(r#""x":1.5"#));
        assert!(json.contains(r#""angles":null"#));
        assert!(json.contains(r#""sys_status":null"#));
        assert!(json.contains(r#""commit":3735928559"#));
        assert!(json.contains(r#""commit_count":42"#));
    }
}
