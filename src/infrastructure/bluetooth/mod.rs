//! Bluetooth Module
//!
//! Finds a BGX module, connects, and harvests its readable characteristics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  AcquisitionPipeline                    │
//! │        (locate → connect → enumerate → harvest)         │
//! └───────┬─────────────┬──────────────┬──────────────┬─────┘
//!         │             │              │              │
//!         ▼             ▼              ▼              ▼
//! ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐
//! │  Scanner   │ │ Connection │ │  Topology  │ │ Harvester  │
//! │ - retries  │ │ - Session  │ │ - filter   │ │ - throttle │
//! │ - progress │ │ - liveness │ │            │ │ - faults   │
//! └─────┬──────┘ └─────┬──────┘ └─────┬──────┘ └─────┬──────┘
//!       └──────────────┴───────┬──────┴──────────────┘
//!                              ▼
//!                  HostStack (btleplug backend)
//! ```
//!
//! ## Modules
//!
//! - [`host`] - Host-stack boundary trait
//! - [`btle`] - `btleplug` implementation of the boundary
//! - [`protocol`] - BGX constants and service names
//! - [`scanner`] - Device discovery with retries
//! - [`connection`] - Connection and session lifetime
//! - [`topology`] - Service listing and filtering
//! - [`harvester`] - Characteristic reads
//! - [`service`] - Pipeline coordinator

pub mod btle;
pub mod connection;
pub mod harvester;
pub mod host;
pub mod interrupt;
pub mod protocol;
pub mod scanner;
pub mod service;
pub mod topology;

#[cfg(test)]
pub mod testing;

// Re-export main pipeline for convenience
pub use service::AcquisitionPipeline;
