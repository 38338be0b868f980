//! [`HostStack`] backed by the platform Bluetooth stack through `btleplug`.

use crate::domain::errors::HostError;
use crate::domain::models::{CharacteristicDescriptor, DeviceAddress, ServiceDescriptor};
use crate::infrastructure::bluetooth::host::HostStack;
use crate::infrastructure::bluetooth::protocol::describe_service;
use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Manager as _, Peripheral as _, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const CAPABILITY_TAGS: &[(CharPropFlags, &str)] = &[
    (CharPropFlags::BROADCAST, "broadcast"),
    (CharPropFlags::READ, "read"),
    (CharPropFlags::WRITE_WITHOUT_RESPONSE, "write-without-response"),
    (CharPropFlags::WRITE, "write"),
    (CharPropFlags::NOTIFY, "notify"),
    (CharPropFlags::INDICATE, "indicate"),
    (CharPropFlags::AUTHENTICATED_SIGNED_WRITES, "authenticated-signed-writes"),
    (CharPropFlags::EXTENDED_PROPERTIES, "extended-properties"),
];

pub struct BtleplugHost {
    adapter: Adapter,
    read_timeout: Duration,
}

impl BtleplugHost {
    /// Bind to the first Bluetooth adapter on the system.
    pub async fn new(read_timeout: Duration) -> Result<Self, HostError> {
        let manager = Manager::new().await.map_err(to_host_error)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(to_host_error)?
            .into_iter()
            .next()
            .ok_or(HostError::AdapterUnavailable)?;

        match adapter.adapter_info().await {
            Ok(info) => info!(adapter = %info, "Using Bluetooth adapter"),
            Err(e) => debug!(error = %e, "Adapter info unavailable"),
        }

        Ok(Self {
            adapter,
            read_timeout,
        })
    }

    async fn find(&self, wanted: &str) -> Result<Option<Peripheral>, btleplug::Error> {
        let mut events = self.adapter.events().await?;

        // A device seen by an earlier scan will not be reported as new.
        for peripheral in self.adapter.peripherals().await? {
            if has_address(&peripheral, wanted) {
                return Ok(Some(peripheral));
            }
        }

        while let Some(event) = events.next().await {
            if let CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) = event {
                let peripheral = self.adapter.peripheral(&id).await?;
                if has_address(&peripheral, wanted) {
                    return Ok(Some(peripheral));
                }
            }
        }
        Ok(None)
    }
}

fn has_address(peripheral: &Peripheral, wanted: &str) -> bool {
    peripheral.address().to_string().eq_ignore_ascii_case(wanted)
}

fn to_host_error(e: btleplug::Error) -> HostError {
    match e {
        btleplug::Error::TimedOut(_) => HostError::Timeout,
        other => HostError::Protocol(other.to_string()),
    }
}

/// Runs `on_drop` unless disarmed first. Covers a scan future dropped by an
/// interrupt before it could stop the adapter itself.
struct ScanGuard<F: FnOnce()> {
    on_drop: Option<F>,
}

impl<F: FnOnce()> ScanGuard<F> {
    fn new(on_drop: F) -> Self {
        Self {
            on_drop: Some(on_drop),
        }
    }

    fn disarm(mut self) {
        self.on_drop = None;
    }
}

impl<F: FnOnce()> Drop for ScanGuard<F> {
    fn drop(&mut self) {
        if let Some(on_drop) = self.on_drop.take() {
            on_drop();
        }
    }
}

fn stop_scan_detached(adapter: Adapter) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            debug!("Scan abandoned, stopping adapter scan");
            handle.spawn(async move {
                if let Err(e) = adapter.stop_scan().await {
                    warn!(error = %e, "Failed to stop scan");
                }
            });
        }
        Err(_) => warn!("No runtime left to stop the scan"),
    }
}

pub fn capability_tags(flags: CharPropFlags) -> Vec<String> {
    CAPABILITY_TAGS
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, name)| name.to_string())
        .collect()
}

#[async_trait]
impl HostStack for BtleplugHost {
    type Device = Peripheral;
    type Link = Peripheral;

    async fn scan_by_address(
        &self,
        address: &DeviceAddress,
        timeout: Duration,
    ) -> Result<Option<Peripheral>, HostError> {
        let wanted = address.to_string();
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(to_host_error)?;

        let adapter = self.adapter.clone();
        let guard = ScanGuard::new(move || stop_scan_detached(adapter));
        let result = tokio::time::timeout(timeout, self.find(&wanted)).await;
        guard.disarm();

        if let Err(e) = self.adapter.stop_scan().await {
            warn!(error = %e, "Failed to stop scan");
        }

        match result {
            Ok(found) => found.map_err(to_host_error),
            Err(_) => Err(HostError::Timeout),
        }
    }

    async fn connect(
        &self,
        device: Peripheral,
        timeout: Duration,
    ) -> Result<Peripheral, HostError> {
        let open = async {
            device.connect().await?;
            device.discover_services().await
        };

        let error = match tokio::time::timeout(timeout, open).await {
            Ok(Ok(())) => return Ok(device),
            Ok(Err(e)) => to_host_error(e),
            Err(_) => HostError::Timeout,
        };

        // Don't leave a half-open link behind.
        let _ = device.disconnect().await;
        Err(error)
    }

    async fn is_connected(&self, link: &Peripheral) -> Result<bool, HostError> {
        link.is_connected().await.map_err(to_host_error)
    }

    async fn list_services(&self, link: &Peripheral) -> Result<Vec<ServiceDescriptor>, HostError> {
        Ok(link
            .services()
            .into_iter()
            .map(|service| ServiceDescriptor {
                uuid: service.uuid,
                description: describe_service(&service.uuid).to_string(),
                characteristics: service
                    .characteristics
                    .iter()
                    .map(|c| CharacteristicDescriptor {
                        uuid: c.uuid,
                        properties: capability_tags(c.properties),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn read_characteristic(
        &self,
        link: &Peripheral,
        uuid: Uuid,
    ) -> Result<Vec<u8>, HostError> {
        let characteristic = link
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or_else(|| HostError::Protocol(format!("characteristic {} not found", uuid)))?;

        match tokio::time::timeout(self.read_timeout, link.read(&characteristic)).await {
            Ok(value) => value.map_err(to_host_error),
            Err(_) => Err(HostError::Timeout),
        }
    }

    async fn disconnect(&self, link: &Peripheral) -> Result<(), HostError> {
        link.disconnect().await.map_err(to_host_error)
    }
}
