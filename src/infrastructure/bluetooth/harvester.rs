//! Characteristic Harvester
//!
//! Reads every readable characteristic of the enumerated services, one at a
//! time, with a throttle before each request. A failed read is reported and
//! skipped; it never stops the harvest.

use crate::domain::errors::{HostError, PipelineError};
use crate::domain::models::{AppEvent, ReadOutcome, ReadRecord, ServiceDescriptor};
use crate::infrastructure::bluetooth::connection::Session;
use crate::infrastructure::bluetooth::host::HostStack;
use crate::infrastructure::bluetooth::interrupt;
use crate::infrastructure::bluetooth::protocol::READ_THROTTLE;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct CharacteristicHarvester<H: HostStack> {
    stack: Arc<H>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    token: CancellationToken,
    throttle: Duration,
}

impl<H: HostStack> CharacteristicHarvester<H> {
    pub fn new(
        stack: Arc<H>,
        event_sender: mpsc::UnboundedSender<AppEvent>,
        token: CancellationToken,
    ) -> Self {
        Self {
            stack,
            event_sender,
            token,
            throttle: READ_THROTTLE,
        }
    }

    /// Read each readable characteristic exactly once, in enumeration order.
    ///
    /// The characteristic matching `target` is read a second time and shown
    /// as onboard storage. Only an interrupt ends the harvest early.
    pub async fn harvest(
        &self,
        session: &Session<H>,
        services: &[ServiceDescriptor],
        target: Uuid,
    ) -> Result<Vec<ReadRecord>, PipelineError> {
        let mut records = Vec::new();

        for service in services {
            for characteristic in service.characteristics.iter().filter(|c| c.is_readable()) {
                interrupt::sleep(&self.token, self.throttle).await?;
                let outcome = self.read_one(session, characteristic.uuid, target).await?;
                records.push(ReadRecord {
                    uuid: characteristic.uuid,
                    outcome,
                });
            }
        }

        Ok(records)
    }

    async fn read_one(
        &self,
        session: &Session<H>,
        uuid: Uuid,
        target: Uuid,
    ) -> Result<ReadOutcome, PipelineError> {
        let value = match self.read(session, uuid).await? {
            Ok(value) => value,
            Err(e) => return Ok(self.report_fault(uuid, e)),
        };

        debug!(%uuid, len = value.len(), "Characteristic read");
        self.send(AppEvent::CharacteristicValue {
            uuid,
            value: value.clone(),
        });

        // A failed second read is reported but the first value stays on record
        if uuid == target {
            match self.read(session, uuid).await? {
                Ok(storage) => self.send(AppEvent::OnboardStorage {
                    uuid,
                    value: storage,
                }),
                Err(e) => {
                    self.report_fault(uuid, e);
                }
            }
        }

        Ok(ReadOutcome::Value(value))
    }

    async fn read(
        &self,
        session: &Session<H>,
        uuid: Uuid,
    ) -> Result<Result<Vec<u8>, HostError>, PipelineError> {
        interrupt::until_cancelled(
            &self.token,
            self.stack.read_characteristic(session.link(), uuid),
        )
        .await
    }

    fn report_fault(&self, uuid: Uuid, error: HostError) -> ReadOutcome {
        match error {
            HostError::Timeout => {
                warn!(%uuid, "Read timed out");
                self.send(AppEvent::ReadTimedOut { uuid });
                ReadOutcome::TimedOut
            }
            other => {
                warn!(%uuid, error = %other, "Read failed");
                let error = other.to_string();
                self.send(AppEvent::ReadFailed {
                    uuid,
                    error: error.clone(),
                });
                ReadOutcome::Failed(error)
            }
        }
    }

    fn send(&self, event: AppEvent) {
        let _ = self.event_sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CharacteristicDescriptor, TimingConfig};
    use crate::infrastructure::bluetooth::connection::ConnectionManager;
    use crate::infrastructure::bluetooth::testing::{drain, Call, FakeDevice, FakeHost, ReadStep};
    use tokio::time::Instant;

    const A: Uuid = Uuid::from_u128(0xA);
    const B: Uuid = Uuid::from_u128(0xB);
    const TARGET: Uuid = Uuid::from_u128(0xF);

    fn services(characteristics: Vec<CharacteristicDescriptor>) -> Vec<ServiceDescriptor> {
        vec![ServiceDescriptor {
            uuid: Uuid::from_u128(1),
            description: "Xpress Streaming Service".into(),
            characteristics,
        }]
    }

    async fn setup(
        host: &Arc<FakeHost>,
    ) -> (
        Session<FakeHost>,
        CharacteristicHarvester<FakeHost>,
        mpsc::UnboundedReceiver<AppEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let session = ConnectionManager::new(host.clone(), tx.clone(), token.clone())
            .connect(FakeDevice, &TimingConfig::default())
            .await
            .unwrap();
        (session, CharacteristicHarvester::new(host.clone(), tx, token), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_only_readable() {
        let host = Arc::new(FakeHost::new());
        host.script_reads(B, vec![ReadStep::Value(b"v".to_vec())]);
        let (session, harvester, _rx) = setup(&host).await;

        let chars = vec![
            CharacteristicDescriptor::new(A, &["write", "notify"]),
            CharacteristicDescriptor::new(B, &["read"]),
        ];
        let records = harvester.harvest(&session, &services(chars), TARGET).await.unwrap();

        assert_eq!(host.reads_of(A), 0);
        assert_eq!(host.reads_of(B), 1);
        assert_eq!(records.len(), 1);
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_stop_harvest() {
        let host = Arc::new(FakeHost::new());
        host.script_reads(A, vec![ReadStep::TimedOut]);
        host.script_reads(B, vec![ReadStep::Value(vec![1, 2])]);
        let (session, harvester, mut rx) = setup(&host).await;
        drain(&mut rx);

        let chars = vec![
            CharacteristicDescriptor::new(A, &["read"]),
            CharacteristicDescriptor::new(B, &["read", "write"]),
        ];
        let records = harvester.harvest(&session, &services(chars), TARGET).await.unwrap();

        assert_eq!(
            records,
            vec![
                ReadRecord { uuid: A, outcome: ReadOutcome::TimedOut },
                ReadRecord { uuid: B, outcome: ReadOutcome::Value(vec![1, 2]) },
            ]
        );
        assert_eq!(
            drain(&mut rx),
            vec![
                AppEvent::ReadTimedOut { uuid: A },
                AppEvent::CharacteristicValue { uuid: B, value: vec![1, 2] },
            ]
        );
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fault_is_reported_and_skipped() {
        let host = Arc::new(FakeHost::new());
        host.script_reads(A, vec![ReadStep::Fault("not permitted".into())]);
        host.script_reads(B, vec![ReadStep::Value(vec![9])]);
        let (session, harvester, mut rx) = setup(&host).await;
        drain(&mut rx);

        let chars = vec![
            CharacteristicDescriptor::new(A, &["read"]),
            CharacteristicDescriptor::new(B, &["read"]),
        ];
        harvester.harvest(&session, &services(chars), TARGET).await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            AppEvent::ReadFailed {
                uuid: A,
                error: "not permitted".into()
            }
        );
        assert_eq!(events.len(), 2);
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_is_read_twice() {
        let host = Arc::new(FakeHost::new());
        host.script_reads(
            TARGET,
            vec![ReadStep::Value(b"first".to_vec()), ReadStep::Value(b"second".to_vec())],
        );
        let (session, harvester, mut rx) = setup(&host).await;
        drain(&mut rx);

        let chars = vec![CharacteristicDescriptor::new(TARGET, &["read"])];
        harvester.harvest(&session, &services(chars), TARGET).await.unwrap();

        assert_eq!(host.reads_of(TARGET), 2);
        assert_eq!(
            drain(&mut rx),
            vec![
                AppEvent::CharacteristicValue { uuid: TARGET, value: b"first".to_vec() },
                AppEvent::OnboardStorage { uuid: TARGET, value: b"second".to_vec() },
            ]
        );
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_storage_read_keeps_first_value() {
        let host = Arc::new(FakeHost::new());
        host.script_reads(
            TARGET,
            vec![ReadStep::Value(b"first".to_vec()), ReadStep::TimedOut],
        );
        host.script_reads(B, vec![ReadStep::Value(vec![7])]);
        let (session, harvester, mut rx) = setup(&host).await;
        drain(&mut rx);

        let chars = vec![
            CharacteristicDescriptor::new(TARGET, &["read"]),
            CharacteristicDescriptor::new(B, &["read"]),
        ];
        let records = harvester.harvest(&session, &services(chars), TARGET).await.unwrap();

        assert_eq!(
            records,
            vec![
                ReadRecord { uuid: TARGET, outcome: ReadOutcome::Value(b"first".to_vec()) },
                ReadRecord { uuid: B, outcome: ReadOutcome::Value(vec![7]) },
            ]
        );
        assert_eq!(
            drain(&mut rx),
            vec![
                AppEvent::CharacteristicValue { uuid: TARGET, value: b"first".to_vec() },
                AppEvent::ReadTimedOut { uuid: TARGET },
                AppEvent::CharacteristicValue { uuid: B, value: vec![7] },
            ]
        );
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttles_each_read() {
        let host = Arc::new(FakeHost::new());
        host.script_reads(A, vec![ReadStep::Value(vec![])]);
        host.script_reads(B, vec![ReadStep::Value(vec![])]);
        let (session, harvester, _rx) = setup(&host).await;

        let chars = vec![
            CharacteristicDescriptor::new(A, &["read"]),
            CharacteristicDescriptor::new(B, &["read"]),
        ];
        let start = Instant::now();
        harvester.harvest(&session, &services(chars), TARGET).await.unwrap();
        assert_eq!(start.elapsed(), READ_THROTTLE * 2);
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_read() {
        let host = Arc::new(FakeHost::new());
        host.script_reads(A, vec![ReadStep::Hang]);
        let (session, harvester, _rx) = setup(&host).await;

        let token = harvester.token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            token.cancel();
        });

        let chars = vec![
            CharacteristicDescriptor::new(A, &["read"]),
            CharacteristicDescriptor::new(B, &["read"]),
        ];
        let result = harvester.harvest(&session, &services(chars), TARGET).await;
        assert_eq!(result, Err(PipelineError::Interrupted));
        assert!(!host.calls().contains(&Call::Read(B)));
        session.release().await.unwrap();
    }
}
