//! Acquisition pipeline
//!
//! Runs locate → connect → enumerate → harvest. Each stage gates the next,
//! and the session is released however the connected phase ends.

use crate::domain::errors::PipelineError;
use crate::domain::models::{
    AppEvent, HarvestSummary, MessageSeverity, TargetSpec, TimingConfig,
};
use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::{
    connection::{release_quietly, ConnectionManager, Session},
    harvester::CharacteristicHarvester,
    host::HostStack,
    protocol::DEFAULT_MAX_SCAN_ATTEMPTS,
    scanner::DeviceLocator,
    topology::{RelevanceFilter, TopologyEnumerator},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct AcquisitionPipeline<H: HostStack> {
    stack: Arc<H>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    token: CancellationToken,
    max_scan_attempts: u32,
    extra_keywords: Vec<String>,
}

impl<H: HostStack> AcquisitionPipeline<H> {
    pub fn new(
        stack: Arc<H>,
        event_sender: mpsc::UnboundedSender<AppEvent>,
        token: CancellationToken,
    ) -> Self {
        Self {
            stack,
            event_sender,
            token,
            max_scan_attempts: DEFAULT_MAX_SCAN_ATTEMPTS,
            extra_keywords: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.max_scan_attempts = settings.max_scan_attempts.max(1);
        self.extra_keywords = settings.extra_service_keywords.clone();
        self
    }

    pub async fn run(
        &self,
        target: &TargetSpec,
        timing: &TimingConfig,
    ) -> Result<HarvestSummary, PipelineError> {
        info!(address = %target.device_address, "Starting acquisition");

        let device = DeviceLocator::new(
            self.stack.clone(),
            self.event_sender.clone(),
            self.token.clone(),
        )
            .locate(&target.device_address, timing, self.max_scan_attempts)
            .await?;

        let session = ConnectionManager::new(
            self.stack.clone(),
            self.event_sender.clone(),
            self.token.clone(),
        )
            .connect(device, timing)
            .await?;

        let outcome = self.connected_phase(&session, target, timing).await;
        release_quietly(session).await;
        outcome
    }

    async fn connected_phase(
        &self,
        session: &Session<H>,
        target: &TargetSpec,
        timing: &TimingConfig,
    ) -> Result<HarvestSummary, PipelineError> {
        let filter = RelevanceFilter::new(target.service_uuid).with_keywords(&self.extra_keywords);
        let services = TopologyEnumerator::new(
            self.stack.clone(),
            self.event_sender.clone(),
            self.token.clone(),
        )
            .enumerate_with(session, &filter)
            .await?;

        if services.is_empty() && timing.verbose {
            self.send(MessageSeverity::Warning, "No relevant services found.".to_string());
        }

        let reads = CharacteristicHarvester::new(
            self.stack.clone(),
            self.event_sender.clone(),
            self.token.clone(),
        )
            .harvest(session, &services, target.characteristic_uuid)
            .await?;

        let summary = HarvestSummary {
            services: services.iter().map(|s| s.uuid).collect(),
            reads,
        };
        info!(
            services = summary.services.len(),
            reads = summary.reads.len(),
            ok = summary.successful_reads(),
            "Harvest complete"
        );
        if timing.verbose {
            self.send(
                MessageSeverity::Success,
                format!(
                    "Harvested {} of {} readable characteristics",
                    summary.successful_reads(),
                    summary.reads.len()
                ),
            );
        }
        Ok(summary)
    }

    fn send(&self, severity: MessageSeverity, message: String) {
        let _ = self.event_sender.send(AppEvent::message(severity, message));
    }
}

/// The line shown to the user when a run ends early.
pub fn failure_event(error: &PipelineError) -> AppEvent {
    match error {
        PipelineError::DeviceNotFound { .. } => AppEvent::message(
            MessageSeverity::Info,
            "Device not found after multiple attempts. Please ensure the device is powered on and in range.",
        ),
        PipelineError::ConnectionFailure(e) => AppEvent::message(
            MessageSeverity::Error,
            format!("An error occurred during connection or data gathering: {}", e),
        ),
        PipelineError::Interrupted => AppEvent::message(
            MessageSeverity::Warning,
            "Operation interrupted by user. Exiting...",
        ),
    }
}
