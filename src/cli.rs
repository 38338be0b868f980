use crate::domain::models::TimingConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_HELP: &str = "\
Configuration file format:
------------------------------------------
device_address=<MAC_ADDRESS>
service_uuid=<SERVICE_UUID>
characteristic_uuid=<CHARACTERISTIC_UUID>

Example:
device_address=XX:XX:XX:XX:XX:XX
service_uuid=F000C0E0-0451-4000-B000-000000000000
characteristic_uuid=F000C0E1-0451-4000-B000-000000000000
------------------------------------------";

#[derive(Parser, Debug)]
#[command(name = "bgx-ripper")]
#[command(
    about = "BGX220S data gathering tool - reads every readable characteristic of a BGX220S BLE device"
)]
#[command(version)]
#[command(after_long_help = CONFIG_HELP)]
pub struct Cli {
    /// Path to the configuration file containing device information
    #[arg(short = 'f', long = "config_file", value_name = "FILE")]
    pub config_file: PathBuf,

    /// Timeout for the BLE connection in seconds
    #[arg(
        long = "connection_timeout",
        value_name = "SECONDS",
        default_value = "10.0",
        value_parser = parse_seconds
    )]
    pub connection_timeout: Duration,

    /// Delay between scan retries in seconds
    #[arg(
        long = "retry_delay",
        value_name = "SECONDS",
        default_value = "2.0",
        value_parser = parse_seconds
    )]
    pub retry_delay: Duration,

    /// Timeout for each BLE scan in seconds
    #[arg(
        long = "scan_timeout",
        value_name = "SECONDS",
        default_value = "20.0",
        value_parser = parse_seconds
    )]
    pub scan_timeout: Duration,

    /// Enable verbose output (scan progress, connection state, summary)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn timing(&self) -> TimingConfig {
        TimingConfig {
            connection_timeout: self.connection_timeout,
            scan_timeout: self.scan_timeout,
            retry_delay: self.retry_delay,
            verbose: self.verbose,
        }
    }
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", s))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("'{}' is not a valid duration", s))
}
