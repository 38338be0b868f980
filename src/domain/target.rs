//! Device configuration file
//!
//! Three `key=value` lines, in order: device address, service UUID,
//! characteristic UUID. Key names are not checked.

use crate::domain::errors::ConfigError;
use crate::domain::models::{DeviceAddress, TargetSpec};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

pub fn load_target_spec(path: &Path) -> Result<TargetSpec, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Io(e),
    })?;
    debug!(path = %path.display(), "Loaded device configuration");
    parse_target_spec(&contents)
}

pub fn parse_target_spec(contents: &str) -> Result<TargetSpec, ConfigError> {
    let lines: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut values = Vec::with_capacity(lines.len());
    for line in &lines {
        match line.split_once('=') {
            Some((_, value)) if !value.contains('=') => values.push(clean_value(value)),
            _ => return Err(ConfigError::MalformedLine(line.to_string())),
        }
    }

    if values.len() < 3 {
        return Err(ConfigError::MissingFields);
    }
    if values[..3].iter().any(|v| v.is_empty()) {
        return Err(ConfigError::EmptyValue);
    }

    Ok(TargetSpec {
        device_address: values[0].parse::<DeviceAddress>()?,
        service_uuid: parse_uuid("service_uuid", values[1])?,
        characteristic_uuid: parse_uuid("characteristic_uuid", values[2])?,
    })
}

fn clean_value(value: &str) -> &str {
    value.trim().trim_matches('"')
}

fn parse_uuid(field: &'static str, value: &str) -> Result<Uuid, ConfigError> {
    Uuid::parse_str(value).map_err(|_| ConfigError::InvalidUuid {
        field,
        value: value.to_string(),
    })
}
