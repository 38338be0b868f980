use crate::domain::errors::AddressParseError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// 6-byte BLE hardware address, written as `AA:BB:CC:DD:EE:FF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress([u8; 6]);

impl DeviceAddress {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for DeviceAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 6 {
            return Err(AddressParseError::WrongLength(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (slot, part) in bytes.iter_mut().zip(&parts) {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(AddressParseError::InvalidOctet(part.to_string()));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| AddressParseError::InvalidOctet(part.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}

/// What to look for: the device and the two identifiers of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub device_address: DeviceAddress,
    pub service_uuid: Uuid,
    pub characteristic_uuid: Uuid,
}

/// Timing parameters supplied on the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    pub connection_timeout: Duration,
    pub scan_timeout: Duration,
    pub retry_delay: Duration,
    pub verbose: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs_f64(10.0),
            scan_timeout: Duration::from_secs_f64(20.0),
            retry_delay: Duration::from_secs_f64(2.0),
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicDescriptor {
    pub uuid: Uuid,
    /// Lower-case capability tags, e.g. `read`, `write-without-response`.
    pub properties: Vec<String>,
}

impl CharacteristicDescriptor {
    pub fn new(uuid: Uuid, properties: &[&str]) -> Self {
        Self {
            uuid,
            properties: properties.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn is_readable(&self) -> bool {
        self.properties
            .iter()
            .any(|p| p.to_lowercase().contains("read"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub uuid: Uuid,
    pub description: String,
    pub characteristics: Vec<CharacteristicDescriptor>,
}

/// How a single characteristic read ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Value(Vec<u8>),
    TimedOut,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRecord {
    pub uuid: Uuid,
    pub outcome: ReadOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub services: Vec<Uuid>,
    pub reads: Vec<ReadRecord>,
}

impl HarvestSummary {
    pub fn successful_reads(&self) -> usize {
        self.reads
            .iter()
            .filter(|r| matches!(r.outcome, ReadOutcome::Value(_)))
            .count()
    }
}

/// Everything the pipeline wants the user to see.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Scan progress as a fraction in `[0, 1]`
    ScanProgress(f64),
    ServiceFound {
        uuid: Uuid,
        description: String,
    },
    CharacteristicValue {
        uuid: Uuid,
        value: Vec<u8>,
    },
    OnboardStorage {
        uuid: Uuid,
        value: Vec<u8>,
    },
    ReadTimedOut {
        uuid: Uuid,
    },
    ReadFailed {
        uuid: Uuid,
        error: String,
    },
    LogMessage(StatusMessage),
}

impl AppEvent {
    pub fn message(severity: MessageSeverity, message: impl Into<String>) -> Self {
        AppEvent::LogMessage(StatusMessage {
            message: message.into(),
            severity,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
