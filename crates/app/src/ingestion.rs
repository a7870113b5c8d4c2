//! Ingestion loop — keeps the catalog in sync with the hub.
//!
//! Two activities run side by side for the lifetime of the process:
//!
//! 1. **Hydration**: a full snapshot read, retried with exponential backoff
//!    until it succeeds, followed by a refresh of the service registry.
//! 2. **Streaming**: every event from the hub's stream is applied to the
//!    catalog and, when accepted, published to subscribers.
//!
//! The hub's stream reconnects on its own, so the loop only ever sees gaps.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_stream::StreamExt as _;

use habridge_domain::error::BridgeError;
use habridge_domain::hub::HubMessage;

use crate::ports::{ChangePublisher, EntityRepository, EventSource, HubClient};
use crate::services::catalog::StateCatalog;
use crate::services::service_registry::ServiceRegistry;

/// Exponential backoff: starts at `initial`, doubles, never exceeds `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial.min(max),
        }
    }

    /// Delay to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Start over from the initial delay.
    pub fn reset(&mut self) {
        self.current = self.initial.min(self.max);
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(60))
    }
}

/// Orchestrates hub → catalog → publisher.
pub struct IngestionLoop<H, S, R, P> {
    hub: H,
    source: S,
    catalog: Arc<StateCatalog<R>>,
    publisher: P,
    services: Arc<ServiceRegistry>,
    backoff: Backoff,
}

impl<H, S, R, P> IngestionLoop<H, S, R, P>
where
    H: HubClient + Send + Sync + 'static,
    S: EventSource + Send + Sync + 'static,
    R: EntityRepository + Send + Sync + 'static,
    P: ChangePublisher + Send + Sync + 'static,
{
    /// Create a new loop.
    pub fn new(
        hub: H,
        source: S,
        catalog: Arc<StateCatalog<R>>,
        publisher: P,
        services: Arc<ServiceRegistry>,
    ) -> Self {
        Self {
            hub,
            source,
            catalog,
            publisher,
            services,
            backoff: Backoff::default(),
        }
    }

    /// Replace the hydration backoff policy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Spawn the loop on the current runtime.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Hydrate and stream concurrently; returns only if the stream ends.
    pub async fn run(self) {
        tokio::join!(self.hydrate_with_retry(), self.consume());
    }

    /// Run full syncs until one succeeds, sleeping with backoff in between.
    ///
    /// Returns the number of entities hydrated.
    pub async fn hydrate_with_retry(&self) -> usize {
        let mut backoff = self.backoff.clone();
        loop {
            match self.full_sync().await {
                Ok(count) => {
                    tracing::info!(entities = count, "initial full sync succeeded");
                    return count;
                }
                Err(err) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(%err, delay_ms = delay.as_millis(), "full sync failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One snapshot hydration followed by a service registry refresh.
    ///
    /// # Errors
    ///
    /// Returns the first remote or storage error encountered.
    pub async fn full_sync(&self) -> Result<usize, BridgeError> {
        let snapshot = self.hub.fetch_snapshot().await?;
        let count = self.catalog.hydrate(snapshot).await?;
        let services = self.hub.fetch_services().await?;
        tracing::info!(entities = count, service_domains = services.len(), "full sync");
        self.services.replace(services);
        Ok(count)
    }

    /// Consume the hub's event stream until it ends.
    pub async fn consume(&self) {
        let mut stream = self.source.events();
        while let Some(message) = stream.next().await {
            self.handle(message).await;
        }
        tracing::error!("hub event stream ended");
    }

    async fn handle(&self, message: HubMessage) {
        match message {
            HubMessage::Event { event, .. } => match self.catalog.apply_event(&event).await {
                Ok(Some(record)) => {
                    if let Err(err) = self.publisher.publish(record).await {
                        tracing::warn!(%err, "failed to publish change record");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(%err, "failed to apply hub event");
                }
            },
            HubMessage::Result { id, success, .. } => {
                tracing::debug!(id, success, "ignoring result frame");
            }
            other => {
                tracing::debug!(message = ?other, "ignoring hub message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcaster::Broadcaster;
    use crate::services::catalog::tests::{InMemoryEntityRepo, state_changed};
    use habridge_domain::command::ServiceCall;
    use habridge_domain::entity::EntityFilter;
    use habridge_domain::error::RemoteError;
    use habridge_domain::hub::{RawState, ServiceDomain};
    use habridge_domain::id::EntityId;
    use serde_json::{Value, json};
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use tokio_stream::StreamExt;
    use tokio_stream::wrappers::ReceiverStream;

    /// Fails the first `failures` snapshot reads, then serves `states`.
    struct FlakyHub {
        failures: usize,
        attempts: AtomicUsize,
        states: Vec<RawState>,
    }

    impl FlakyHub {
        fn new(failures: usize, states: Vec<RawState>) -> Self {
            Self {
                failures,
                attempts: AtomicUsize::new(0),
                states,
            }
        }
    }

    impl HubClient for FlakyHub {
        fn fetch_snapshot(&self) -> impl Future<Output = Result<Vec<RawState>, RemoteError>> + Send {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            let result = if attempt < self.failures {
                Err(RemoteError::Unavailable("connection refused".into()))
            } else {
                Ok(self.states.clone())
            };
            async { result }
        }

        fn fetch_services(
            &self,
        ) -> impl Future<Output = Result<Vec<ServiceDomain>, RemoteError>> + Send {
            async {
                Ok(vec![ServiceDomain {
                    domain: "light".to_string(),
                    services: serde_json::Map::new(),
                }])
            }
        }

        fn invoke(&self, _call: &ServiceCall) -> impl Future<Output = Result<Value, RemoteError>> + Send {
            async { Ok(Value::Null) }
        }
    }

    /// Event source fed from a channel; hands out its stream once.
    struct ChannelSource {
        receiver: Mutex<Option<mpsc::Receiver<HubMessage>>>,
    }

    impl ChannelSource {
        fn new() -> (Self, mpsc::Sender<HubMessage>) {
            let (tx, rx) = mpsc::channel(16);
            (
                Self {
                    receiver: Mutex::new(Some(rx)),
                },
                tx,
            )
        }
    }

    impl EventSource for ChannelSource {
        type Stream = ReceiverStream<HubMessage>;

        fn events(&self) -> Self::Stream {
            let rx = self.receiver.lock().unwrap().take().expect("stream opened once");
            ReceiverStream::new(rx)
        }
    }

    fn raw(id: &str, state: &str) -> RawState {
        serde_json::from_value(json!({"entity_id": id, "state": state})).unwrap()
    }

    fn event(id: &str, state: &str) -> HubMessage {
        serde_json::from_value(json!({
            "id": 1,
            "type": "event",
            "event": state_changed(json!({
                "entity_id": id,
                "new_state": {"entity_id": id, "state": state, "attributes": {}}
            }))
        }))
        .unwrap()
    }

    fn fast_backoff() -> Backoff {
        Backoff::new(Duration::from_millis(1), Duration::from_millis(4))
    }

    #[test]
    fn should_double_delay_until_capped() {
        let mut backoff = Backoff::default();
        let delays: Vec<u64> = (0..7).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 32, 60, 60]);
    }

    #[test]
    fn should_restart_from_initial_delay_after_reset() {
        let mut backoff = Backoff::default();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn should_retry_hydration_until_hub_is_reachable() {
        let catalog = Arc::new(StateCatalog::new(InMemoryEntityRepo::default()));
        let services = Arc::new(ServiceRegistry::new());
        let (source, _tx) = ChannelSource::new();
        let ingestion = IngestionLoop::new(
            FlakyHub::new(3, vec![raw("light.kitchen", "on")]),
            source,
            Arc::clone(&catalog),
            Broadcaster::new(8),
            Arc::clone(&services),
        )
        .with_backoff(fast_backoff());

        let count = ingestion.hydrate_with_retry().await;

        assert_eq!(count, 1);
        assert_eq!(ingestion.hub.attempts.load(Ordering::SeqCst), 4);
        assert!(
            catalog
                .read(&EntityId::parse("light.kitchen").unwrap())
                .await
                .unwrap()
                .is_some()
        );
        assert_eq!(services.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn should_apply_and_publish_stream_events_across_a_gap() {
        let catalog = Arc::new(StateCatalog::new(InMemoryEntityRepo::default()));
        let broadcaster = Arc::new(Broadcaster::new(8));
        let mut subscription = broadcaster.subscribe();
        let (source, tx) = ChannelSource::new();
        let handle = IngestionLoop::new(
            FlakyHub::new(0, vec![]),
            source,
            Arc::clone(&catalog),
            Arc::clone(&broadcaster),
            Arc::new(ServiceRegistry::new()),
        )
        .start();

        tx.send(event("light.kitchen", "on")).await.unwrap();
        let first = subscription.next().await.unwrap();
        assert_eq!(first.data.state, "on");

        // nothing arrives for a while, as during a reconnect
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(event("light.kitchen", "off")).await.unwrap();
        let second = subscription.next().await.unwrap();
        assert_eq!(second.data.state, "off");

        let stored = catalog
            .read(&EntityId::parse("light.kitchen").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state, "off");

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn should_skip_malformed_and_non_event_messages() {
        let catalog = Arc::new(StateCatalog::new(InMemoryEntityRepo::default()));
        let broadcaster = Arc::new(Broadcaster::new(8));
        let mut subscription = broadcaster.subscribe();
        let (source, tx) = ChannelSource::new();
        let ingestion = IngestionLoop::new(
            FlakyHub::new(0, vec![]),
            source,
            Arc::clone(&catalog),
            Arc::clone(&broadcaster),
            Arc::new(ServiceRegistry::new()),
        );

        tx.send(HubMessage::Result {
            id: 1,
            success: true,
            result: json!([]),
        })
        .await
        .unwrap();
        tx.send(
            serde_json::from_value(json!({
                "id": 1,
                "type": "event",
                "event": {"event_type": "state_changed", "data": {"entity_id": "light.a", "new_state": null}}
            }))
            .unwrap(),
        )
        .await
        .unwrap();
        tx.send(event("switch.porch", "on")).await.unwrap();
        drop(tx);

        ingestion.consume().await;

        let only = subscription.next().await.unwrap();
        assert_eq!(only.entity_id().as_str(), "switch.porch");
        assert_eq!(catalog.list(&EntityFilter::default()).await.unwrap().len(), 1);
    }
}
