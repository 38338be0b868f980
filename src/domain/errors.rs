//! Error types shared by the pipeline and its collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Faults raised by the BLE host stack.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("operation timed out")]
    Timeout,

    #[error("no Bluetooth adapter available")]
    AdapterUnavailable,

    #[error("{0}")]
    Protocol(String),
}

/// Outcomes that end a pipeline run early.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("device not found after {attempts} attempts")]
    DeviceNotFound { attempts: u32 },

    #[error("connection failed: {0}")]
    ConnectionFailure(HostError),

    #[error("interrupted by user")]
    Interrupted,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("expected six colon-separated octets, got '{0}'")]
    WrongLength(String),

    #[error("invalid octet '{0}'")]
    InvalidOctet(String),
}

/// Problems with the device configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file '{}' not found.", .0.display())]
    NotFound(PathBuf),

    #[error("Configuration error: Each line in the configuration file must be in the format key=value.")]
    MalformedLine(String),

    #[error("Configuration error: Configuration file is missing required fields.")]
    MissingFields,

    #[error("Configuration error: Device address, service UUID, or characteristic UUID is missing or improperly formatted in the configuration file.")]
    EmptyValue,

    #[error("Configuration error: invalid device address: {0}")]
    InvalidAddress(#[from] AddressParseError),

    #[error("Configuration error: invalid {field} '{value}'")]
    InvalidUuid { field: &'static str, value: String },

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}
