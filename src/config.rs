//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{LocusError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    /// Tried in order when `port` cannot be opened
    #[serde(default)]
    pub fallback_ports: Vec<String>,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Back-off when no bytes are buffered
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Simulated unit configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_simulation_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_simulation_address")]
    pub address: u8,
}

/// Consumer report configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_report_interval_ms")]
    pub interval_ms: u64,

    /// "log" (tracing) or "jsonl" (one JSON object per line on stdout)
    #[serde(default = "default_report_format")]
    pub format: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 57600 }
fn default_poll_interval_ms() -> u64 { 5 }

fn default_simulation_interval_ms() -> u64 { 100 }
fn default_simulation_address() -> u8 { 1 }

fn default_report_interval_ms() -> u64 { 100 }
fn default_report_format() -> String { "log".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            fallback_ports: Vec::new(),
            baud_rate: default_baud_rate(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_simulation_interval_ms(),
            address: default_simulation_address(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_report_interval_ms(),
            format: default_report_format(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> LocusError {
    LocusError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use locus_lps::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serial ports to try, configured port first
    pub fn candidate_ports(&self) -> Vec<String> {
        std::iter::once(self.serial.port.clone())
            .chain(self.serial.fallback_ports.iter().cloned())
            .collect()
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // The port is irrelevant when the unit is simulated
        if !self.simulation.enabled && self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if self.serial.fallback_ports.iter().any(String::is_empty) {
            return Err(invalid("fallback_ports cannot contain empty paths"));
        }

        if ![9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 19200, 38400, 57600, 115200"));
        }

        if self.serial.poll_interval_ms == 0 || self.serial.poll_interval_ms > 1000 {
            return Err(invalid("poll_interval_ms must be between 1 and 1000"));
        }

        if self.simulation.interval_ms == 0 || self.simulation.interval_ms > 60000 {
            return Err(invalid("simulation interval_ms must be between 1 and 60000"));
        }

        if self.report.interval_ms == 0 || self.report.interval_ms > 60000 {
            return Err(invalid("report interval_ms must be between 1 and 60000"));
        }

        if !["log", "jsonl"].contains(&self.report.format.as_str()) {
            return Err(invalid(format!(
                "report format must be 'log' or 'jsonl' (got '{}')",
                self.report.format
            )));
        }

        Ok(())
    }
}
