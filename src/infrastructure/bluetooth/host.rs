//! BLE host-stack boundary
//!
//! The pipeline only talks to the radio through [`HostStack`]. The real
//! implementation lives in [`super::btle`]; tests script their own.

use crate::domain::errors::HostError;
use crate::domain::models::{DeviceAddress, ServiceDescriptor};
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

#[async_trait]
pub trait HostStack: Send + Sync + 'static {
    /// Handle to an advertising peripheral found by a scan
    type Device: Send + 'static;
    /// An open connection
    type Link: Clone + Send + Sync + 'static;

    /// Scans until a peripheral with `address` is seen or `timeout` elapses.
    async fn scan_by_address(
        &self,
        address: &DeviceAddress,
        timeout: Duration,
    ) -> Result<Option<Self::Device>, HostError>;

    async fn connect(&self, device: Self::Device, timeout: Duration)
        -> Result<Self::Link, HostError>;

    async fn is_connected(&self, link: &Self::Link) -> Result<bool, HostError>;

    async fn list_services(&self, link: &Self::Link) -> Result<Vec<ServiceDescriptor>, HostError>;

    async fn read_characteristic(&self, link: &Self::Link, uuid: Uuid)
        -> Result<Vec<u8>, HostError>;

    async fn disconnect(&self, link: &Self::Link) -> Result<(), HostError>;
}
