//! BLE Connection Module
//!
//! Opens the link to a located device and hands it out as a [`Session`].
//! Connection faults end the run; they are never retried.

use crate::domain::errors::{HostError, PipelineError};
use crate::domain::models::{AppEvent, MessageSeverity, TimingConfig};
use crate::infrastructure::bluetooth::host::HostStack;
use crate::infrastructure::bluetooth::interrupt;
use crate::infrastructure::bluetooth::protocol::DISCONNECT_TIMEOUT;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// An open connection, owned by a single pipeline run.
///
/// Call [`Session::release`] when done. A session dropped without being
/// released schedules a disconnect on the current runtime.
pub struct Session<H: HostStack> {
    stack: Arc<H>,
    link: H::Link,
    released: bool,
}

impl<H: HostStack> Session<H> {
    fn new(stack: Arc<H>, link: H::Link) -> Self {
        Self {
            stack,
            link,
            released: false,
        }
    }

    pub fn link(&self) -> &H::Link {
        &self.link
    }

    /// Disconnect from the device.
    pub async fn release(mut self) -> Result<(), HostError> {
        self.released = true;
        match tokio::time::timeout(DISCONNECT_TIMEOUT, self.stack.disconnect(&self.link)).await {
            Ok(result) => {
                debug!("Session released");
                result
            }
            Err(_) => Err(HostError::Timeout),
        }
    }
}

impl<H: HostStack> Drop for Session<H> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!("Session dropped without release, disconnecting in background");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let stack = self.stack.clone();
            let link = self.link.clone();
            handle.spawn(async move {
                let _ = stack.disconnect(&link).await;
            });
        }
    }
}

pub struct ConnectionManager<H: HostStack> {
    stack: Arc<H>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    token: CancellationToken,
}

impl<H: HostStack> ConnectionManager<H> {
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

    /// Open a session to `device` and check it is alive.
    pub async fn connect(
        &self,
        device: H::Device,
        timing: &TimingConfig,
    ) -> Result<Session<H>, PipelineError> {
        info!(timeout = ?timing.connection_timeout, "Connecting to device");
        let link = interrupt::until_cancelled(
            &self.token,
            self.stack.connect(device, timing.connection_timeout),
        )
        .await?
        .map_err(PipelineError::ConnectionFailure)?;

        let session = Session::new(self.stack.clone(), link);

        let liveness =
            interrupt::until_cancelled(&self.token, self.stack.is_connected(session.link())).await;
        let connected = match liveness {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => {
                release_quietly(session).await;
                return Err(PipelineError::ConnectionFailure(e));
            }
            Err(interrupted) => {
                release_quietly(session).await;
                return Err(interrupted);
            }
        };

        info!(connected, "Connection established");
        if timing.verbose {
            let _ = self.event_sender.send(AppEvent::message(
                MessageSeverity::Success,
                format!("Connected to device: {}", connected),
            ));
        }
        Ok(session)
    }
}

/// Release a session, logging rather than returning any fault.
pub async fn release_quietly<H: HostStack>(session: Session<H>) {
    if let Err(e) = session.release().await {
        warn!(error = %e, "Failed to disconnect cleanly");
    }
}
