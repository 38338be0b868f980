//! Topology Enumerator
//!
//! Lists the services of a connected device and keeps the ones that look
//! like they belong to a BGX module.

use crate::domain::errors::PipelineError;
use crate::domain::models::{AppEvent, ServiceDescriptor};
use crate::infrastructure::bluetooth::connection::Session;
use crate::infrastructure::bluetooth::host::HostStack;
use crate::infrastructure::bluetooth::interrupt;
use crate::infrastructure::bluetooth::protocol::VENDOR_KEYWORDS;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Decides which services are worth harvesting.
pub trait ServiceFilter {
    fn is_relevant(&self, service: &ServiceDescriptor) -> bool;
}

impl<F> ServiceFilter for F
where
    F: Fn(&ServiceDescriptor) -> bool,
{
    fn is_relevant(&self, service: &ServiceDescriptor) -> bool {
        self(service)
    }
}

/// Matches the target service UUID, or a vendor keyword anywhere in the
/// service description (case-insensitive).
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    target_service: Uuid,
    keywords: Vec<String>,
}

impl RelevanceFilter {
    pub fn new(target_service: Uuid) -> Self {
        Self {
            target_service,
            keywords: VENDOR_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn with_keywords<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords
            .extend(extra.into_iter().map(|k| k.as_ref().to_lowercase()));
        self
    }
}

impl ServiceFilter for RelevanceFilter {
    fn is_relevant(&self, service: &ServiceDescriptor) -> bool {
        if service.uuid == self.target_service {
            return true;
        }
        let description = service.description.to_lowercase();
        self.keywords.iter().any(|k| description.contains(k.as_str()))
    }
}

pub struct TopologyEnumerator<H: HostStack> {
    stack: Arc<H>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    token: CancellationToken,
}

impl<H: HostStack> TopologyEnumerator<H> {
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

    /// Relevant services under the default vendor filter.
    pub async fn enumerate(
        &self,
        session: &Session<H>,
        target_service: Uuid,
    ) -> Result<Vec<ServiceDescriptor>, PipelineError> {
        self.enumerate_with(session, &RelevanceFilter::new(target_service))
            .await
    }

    /// Query the device and keep services accepted by `filter`, in the
    /// order the host stack reports them.
    pub async fn enumerate_with<F>(
        &self,
        session: &Session<H>,
        filter: &F,
    ) -> Result<Vec<ServiceDescriptor>, PipelineError>
    where
        F: ServiceFilter + ?Sized,
    {
        let listing = self.stack.list_services(session.link());
        let services = interrupt::until_cancelled(&self.token, listing)
            .await?
            .map_err(PipelineError::ConnectionFailure)?;
        debug!(count = services.len(), "Services listed");

        let relevant: Vec<ServiceDescriptor> = services
            .into_iter()
            .filter(|s| filter.is_relevant(s))
            .collect();

        for service in &relevant {
            let _ = self.event_sender.send(AppEvent::ServiceFound {
                uuid: service.uuid,
                description: service.description.clone(),
            });
        }
        Ok(relevant)
    }
}
