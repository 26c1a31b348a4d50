//! # Error Types
//!
//! Custom error types for Locus LPS using `thiserror`.

use thiserror::Error;

/// Main error type for Locus LPS
#[derive(Debug, Error)]
pub enum LocusError {
    /// LPS wire protocol errors (short payloads, oversized frames)
    #[error("LPS protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate device paths could be opened
    #[error("No LPS device found (tried: {0})")]
    SerialPortNotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Locus LPS
pub type Result<T> = std::result::Result<T, LocusError>;
