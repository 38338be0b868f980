//! Scripted host stack for pipeline tests.

use crate::domain::errors::HostError;
use crate::domain::models::{AppEvent, DeviceAddress, ServiceDescriptor};
use crate::infrastructure::bluetooth::host::HostStack;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum ScanStep {
    /// Scan runs the full window and sees nothing
    Miss,
    TimedOut,
    Fault(String),
    Found,
    FoundAfter(Duration),
}

#[derive(Debug, Clone)]
pub enum ReadStep {
    Value(Vec<u8>),
    TimedOut,
    Fault(String),
    /// Never completes
    Hang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Scan,
    Connect,
    IsConnected,
    ListServices,
    Read(Uuid),
    Disconnect,
}

#[derive(Debug)]
pub struct FakeDevice;

#[derive(Debug, Clone)]
pub struct FakeLink;

#[derive(Default)]
struct FakeState {
    scans: VecDeque<ScanStep>,
    connect_error: Option<HostError>,
    list_error: Option<HostError>,
    services: Vec<ServiceDescriptor>,
    reads: HashMap<Uuid, VecDeque<ReadStep>>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeHost {
    state: Mutex<FakeState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_scans(&self, steps: Vec<ScanStep>) {
        self.state.lock().unwrap().scans = steps.into();
    }

    pub fn fail_connect(&self, error: HostError) {
        self.state.lock().unwrap().connect_error = Some(error);
    }

    pub fn fail_list_services(&self, error: HostError) {
        self.state.lock().unwrap().list_error = Some(error);
    }

    pub fn set_services(&self, services: Vec<ServiceDescriptor>) {
        self.state.lock().unwrap().services = services;
    }

    pub fn script_reads(&self, uuid: Uuid, steps: Vec<ReadStep>) {
        self.state.lock().unwrap().reads.insert(uuid, steps.into());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn scan_count(&self) -> usize {
        self.count(|c| *c == Call::Scan)
    }

    pub fn reads_of(&self, uuid: Uuid) -> usize {
        self.count(|c| *c == Call::Read(uuid))
    }

    pub fn disconnect_count(&self) -> usize {
        self.count(|c| *c == Call::Disconnect)
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl HostStack for FakeHost {
    type Device = FakeDevice;
    type Link = FakeLink;

    async fn scan_by_address(
        &self,
        _address: &DeviceAddress,
        timeout: Duration,
    ) -> Result<Option<FakeDevice>, HostError> {
        let step = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Scan);
            state.scans.pop_front().unwrap_or(ScanStep::Miss)
        };
        match step {
            ScanStep::Miss => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
            ScanStep::TimedOut => {
                tokio::time::sleep(timeout).await;
                Err(HostError::Timeout)
            }
            ScanStep::Fault(message) => Err(HostError::Protocol(message)),
            ScanStep::Found => Ok(Some(FakeDevice)),
            ScanStep::FoundAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(Some(FakeDevice))
            }
        }
    }

    async fn connect(
        &self,
        _device: FakeDevice,
        _timeout: Duration,
    ) -> Result<FakeLink, HostError> {
        let error = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Connect);
            state.connect_error.clone()
        };
        match error {
            Some(e) => Err(e),
            None => Ok(FakeLink),
        }
    }

    async fn is_connected(&self, _link: &FakeLink) -> Result<bool, HostError> {
        self.record(Call::IsConnected);
        Ok(true)
    }

    async fn list_services(&self, _link: &FakeLink) -> Result<Vec<ServiceDescriptor>, HostError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListServices);
        match &state.list_error {
            Some(e) => Err(e.clone()),
            None => Ok(state.services.clone()),
        }
    }

    async fn read_characteristic(
        &self,
        _link: &FakeLink,
        uuid: Uuid,
    ) -> Result<Vec<u8>, HostError> {
        let step = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Read(uuid));
            state
                .reads
                .get_mut(&uuid)
                .and_then(|steps| steps.pop_front())
                .unwrap_or_else(|| ReadStep::Fault("unscripted read".into()))
        };
        match step {
            ReadStep::Value(value) => Ok(value),
            ReadStep::TimedOut => Err(HostError::Timeout),
            ReadStep::Fault(message) => Err(HostError::Protocol(message)),
            ReadStep::Hang => std::future::pending().await,
        }
    }

    async fn disconnect(&self, _link: &FakeLink) -> Result<(), HostError> {
        self.record(Call::Disconnect);
        Ok(())
    }
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
