//! BGX device protocol constants
//!
//! Timing limits for talking to BGX220S modules and the names used to
//! describe the services they expose.

use std::time::Duration;
use uuid::Uuid;

/// Lower-case substrings marking a service description as BGX related
pub const VENDOR_KEYWORDS: &[&str] = &["bgx", "xpress", "gechoos"];

/// Pause before every characteristic read.
/// The module has a single GATT transaction channel and drops requests
/// that arrive back to back.
pub const READ_THROTTLE: Duration = Duration::from_secs(1);

pub const DEFAULT_MAX_SCAN_ATTEMPTS: u32 = 3;

/// Upper bound on tearing down a session
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of segments in the scan progress bar
pub const PROGRESS_BAR_WIDTH: usize = 40;

/// Redraw interval of the scan progress bar
pub const PROGRESS_REFRESH: Duration = Duration::from_millis(100);

/// Silicon Labs Xpress Streaming Service (BGX data pipe)
pub const XPRESS_STREAMING_SERVICE: Uuid = Uuid::from_u128(0x331a36f5_2459_45ea_9d95_6142f0c4b307);

/// Silicon Labs OTA firmware update service
pub const SILABS_OTA_SERVICE: Uuid = Uuid::from_u128(0x1d14d6ee_fd63_4fa1_bfa4_8f47b42119f0);

/// Expand a 16-bit SIG-assigned number onto the Bluetooth base UUID.
pub const fn sig_uuid(short: u16) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_0000_0000_1000_8000_00805f9b34fb)
}

const KNOWN_SERVICES: &[(Uuid, &str)] = &[
    (sig_uuid(0x1800), "Generic Access Profile"),
    (sig_uuid(0x1801), "Generic Attribute Profile"),
    (sig_uuid(0x180A), "Device Information"),
    (sig_uuid(0x180D), "Heart Rate"),
    (sig_uuid(0x180F), "Battery Service"),
    (sig_uuid(0x1812), "Human Interface Device"),
    (XPRESS_STREAMING_SERVICE, "Xpress Streaming Service"),
    (SILABS_OTA_SERVICE, "Silicon Labs OTA"),
];

/// Human-readable name of a service, `"Unknown"` when not in the table.
pub fn describe_service(uuid: &Uuid) -> &'static str {
    KNOWN_SERVICES
        .iter()
        .find(|(known, _)| known == uuid)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}
