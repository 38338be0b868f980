//! Device Locator
//!
//! Finds the target peripheral by address, retrying a bounded number of
//! times. In verbose mode a progress bar runs alongside each scan.

use crate::domain::errors::{HostError, PipelineError};
use crate::domain::models::{AppEvent, DeviceAddress, MessageSeverity, TimingConfig};
use crate::infrastructure::bluetooth::host::HostStack;
use crate::infrastructure::bluetooth::interrupt;
use crate::presentation::progress::ProgressReporter;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct DeviceLocator<H: HostStack> {
    stack: Arc<H>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    token: CancellationToken,
}

impl<H: HostStack> DeviceLocator<H> {
    pub fn new(
        stack: Arc<H>,
        event_sender: mpsc::UnboundedSender<AppEvent>,
        token: CancellationToken,
    ) -> Self {
        Self {
            stack,
            event_sender,
            token,
        }
    }

    /// Scan for `address` up to `max_attempts` times.
    ///
    /// Sleeps `timing.retry_delay` between attempts, never after the last
    /// one. A scan that times out, finds nothing, or fails counts as a miss.
    pub async fn locate(
        &self,
        address: &DeviceAddress,
        timing: &TimingConfig,
        max_attempts: u32,
    ) -> Result<H::Device, PipelineError> {
        for attempt in 1..=max_attempts {
            if timing.verbose {
                self.send(
                    MessageSeverity::Info,
                    format!(
                        "Attempting to find device: {}, attempt {}/{}",
                        address, attempt, max_attempts
                    ),
                );
            }

            let found = self.scan_once(address, timing).await?;
            if let Some(device) = found {
                info!(%address, attempt, "Device found");
                return Ok(device);
            }

            if attempt < max_attempts {
                self.send(
                    MessageSeverity::Error,
                    format!(
                        "Attempt {} of {}: Device not found. Retrying...",
                        attempt, max_attempts
                    ),
                );
                interrupt::sleep(&self.token, timing.retry_delay).await?;
            } else {
                self.send(
                    MessageSeverity::Error,
                    format!("Attempt {} of {}: Device not found.", attempt, max_attempts),
                );
            }
        }

        Err(PipelineError::DeviceNotFound {
            attempts: max_attempts,
        })
    }

    async fn scan_once(
        &self,
        address: &DeviceAddress,
        timing: &TimingConfig,
    ) -> Result<Option<H::Device>, PipelineError> {
        let progress = timing.verbose.then(|| {
            ProgressReporter::new(timing.scan_timeout, self.event_sender.clone())
                .spawn(&self.token)
        });

        let result = interrupt::until_cancelled(
            &self.token,
            self.stack.scan_by_address(address, timing.scan_timeout),
        )
        .await;

        // The bar must be gone before anything else is printed.
        if let Some(progress) = progress {
            progress.stop().await;
        }

        match result? {
            Ok(device) => Ok(device),
            Err(HostError::Timeout) => {
                debug!(%address, "Scan timed out");
                Ok(None)
            }
            Err(e) => {
                warn!(%address, error = %e, "Scan failed");
                Ok(None)
            }
        }
    }

    fn send(&self, severity: MessageSeverity, message: String) {
        let _ = self.event_sender.send(AppEvent::message(severity, message));
    }
}
