//! Event Consumer + Dispatcher: subscription, poll loop, typed handler
//! dispatch, per-message scope, manual commit.

use crate::config::ConsumerConfig;
use crate::dlq::{DeadLetterEvent, DeadLetterSubsystem};
use crate::log::PartitionedLog;
use async_trait::async_trait;
use catalog_models::{CatalogError, Result};
use chrono::Utc;
use event_envelope::Envelope;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Object-safe handler invoked by the dispatcher once per message. Models
/// the "runtime dependency injection of scoped handlers" the source relies
/// on: the registry holds a factory, not a singleton, so each
/// message gets a fresh instance with no shared mutable state leaking
/// between events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, envelope: &Envelope) -> Result<()>;
}

/// A fresh-per-message handler constructor. Modelled as a trait rather
/// than a bare closure so `Register<Event, Handler>()` reads naturally:
/// one registration per concrete handler type.
pub trait HandlerFactory: Send + Sync {
    fn create(&self) -> Box<dyn EventHandler>;
}

impl<F> HandlerFactory for F
where
    F: Fn() -> Box<dyn EventHandler> + Send + Sync,
{
    fn create(&self) -> Box<dyn EventHandler> {
        (self)()
    }
}

/// Adapts a typed handler (one that wants `T` instead of the raw envelope)
/// into the object-safe `EventHandler`. Payload re-typing is a plain
/// `serde_json` deserialise keyed by event-type name, no reflection.
pub struct TypedHandlerAdapter<T, H> {
    inner: H,
    _marker: std::marker::PhantomData<T>,
}

impl<T, H> TypedHandlerAdapter<T, H> {
    pub fn new(inner: H) -> Self {
        TypedHandlerAdapter {
            inner,
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
pub trait TypedHandler<T>: Send + Sync {
    async fn handle(&self, payload: T, envelope: &Envelope) -> Result<()>;
}

#[async_trait]
impl<T, H> EventHandler for TypedHandlerAdapter<T, H>
where
    T: serde::de::DeserializeOwned + Send + Sync,
    H: TypedHandler<T> + Send + Sync,
{
    async fn handle(&self, envelope: &Envelope) -> Result<()> {
        let payload: T = serde_json::from_value(envelope.event.data.clone())
            .map_err(|e| CatalogError::invalid(format!("payload does not match handler type: {e}")))?;
        self.inner.handle(payload, envelope).await
    }
}

/// Thread-safe `event.type -> handler factory` map. Registration is
/// write-once per event type; lookups are O(1).
#[derive(Default)]
pub struct HandlerRegistry {
    factories: RwLock<HashMap<String, Arc<dyn HandlerFactory>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if `event_type` is already registered.
    pub async fn register(&self, event_type: impl Into<String>, factory: Arc<dyn HandlerFactory>) -> Result<()> {
        let event_type = event_type.into();
        let mut factories = self.factories.write().await;
        if factories.contains_key(&event_type) {
            return Err(CatalogError::conflict(format!(
                "handler for event type '{event_type}' already registered"
            )));
        }
        factories.insert(event_type, factory);
        Ok(())
    }

    async fn create_for(&self, event_type: &str) -> Option<Box<dyn EventHandler>> {
        self.factories.read().await.get(event_type).map(|f| f.create())
    }
}

/// Subscribes to a set of topics and runs a background poll loop that
/// dispatches to registered handlers with manual offset commit.
pub struct EventConsumer<L: PartitionedLog> {
    config: ConsumerConfig,
    log: Arc<L>,
    registry: Arc<HandlerRegistry>,
    dlq: Arc<DeadLetterSubsystem<L>>,
    cancellation: CancellationToken,
    task: RwLock<Option<JoinHandle<()>>>,
}

impl<L: PartitionedLog + 'static> EventConsumer<L> {
    pub fn new(
        config: ConsumerConfig,
        log: Arc<L>,
        registry: Arc<HandlerRegistry>,
        dlq: Arc<DeadLetterSubsystem<L>>,
    ) -> Self {
        EventConsumer {
            config,
            log,
            registry,
            dlq,
            cancellation: CancellationToken::new(),
            task: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Subscribes to `topics` and launches the background poll loop.
    pub async fn start(self: &Arc<Self>, topics: Vec<String>) {
        let consumer = Arc::clone(self);
        let cancellation = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            consumer.poll_loop(topics, cancellation).await;
        });
        *self.task.write().await = Some(handle);
    }

    /// Signals cancellation, waits for the poll loop to drain, and closes
    /// out the subscription. In-flight handlers are allowed to finish or
    /// time out on their own cancellation token.
    pub async fn stop(&self) {
        self.cancellation.cancel();
        if let Some(handle) = self.task.write().await.take() {
            let _ = handle.await;
        }
    }

    async fn poll_loop(self: Arc<Self>, topics: Vec<String>, cancellation: CancellationToken) {
        loop {
            if cancellation.is_cancelled() {
                tracing::info!(group = %self.config.group_id, "consumer poll loop exiting on cancellation");
                return;
            }

            for topic in &topics {
                if cancellation.is_cancelled() {
                    return;
                }
                match self.log.poll(topic, &self.config.group_id, self.config.max_poll_records).await {
                    Ok(records) => {
                        for record in records {
                            self.process_one(topic, record).await;
                        }
                    }
                    Err(err) => {
                        tracing::error!(topic, error = %err, "poll failed");
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_millis(self.config.fetch_max_wait_ms)) => {}
                _ = cancellation.cancelled() => return,
            }
        }
    }

    async fn process_one(&self, topic: &str, record: crate::log::LogRecord) {
        let envelope: Envelope = match serde_json::from_slice(&record.value) {
            Ok(e) => e,
            Err(err) => {
                tracing::error!(topic, partition = record.partition, offset = record.offset, error = %err, "failed to deserialise envelope, skipping");
                let _ = self.log.commit(topic, &self.config.group_id, record.partition, record.offset).await;
                return;
            }
        };

        let mut envelope = envelope;
        envelope.metadata = Envelope::metadata_from_headers(envelope.metadata, &record.headers);

        let Some(handler) = self.registry.create_for(&envelope.event.event_type).await else {
            tracing::debug!(event.r#type = %envelope.event.event_type, "no handler registered, skipping and committing");
            let _ = self.log.commit(topic, &self.config.group_id, record.partition, record.offset).await;
            return;
        };

        match handler.handle(&envelope).await {
            Ok(()) => {
                let _ = self.log.commit(topic, &self.config.group_id, record.partition, record.offset).await;
            }
            Err(err) => {
                self.handle_failure(topic, &record, &envelope, err).await;
            }
        }
    }

    async fn handle_failure(
        &self,
        topic: &str,
        record: &crate::log::LogRecord,
        envelope: &Envelope,
        err: CatalogError,
    ) {
        let now = Utc::now();
        let dead_letter = DeadLetterEvent {
            topic: topic.to_string(),
            partition: record.partition,
            offset: record.offset,
            payload: envelope.event.data.clone(),
            error_message: err.to_string(),
            exception_detail: format!("{err:?}"),
            consumer_group: self.config.group_id.clone(),
            attempt_count: 1,
            first_failure_at: now,
            last_failure_at: Some(now),
        };

        let registry = Arc::clone(&self.registry);
        let envelope_for_retry = envelope.clone();
        let outcome = self
            .dlq
            .handle_failed(dead_letter, |_event| {
                let registry = Arc::clone(&registry);
                let envelope = envelope_for_retry.clone();
                let event_type = envelope.event.event_type.clone();
                async move {
                    match registry.create_for(&event_type).await {
                        Some(handler) => handler.handle(&envelope).await,
                        None => Ok(()),
                    }
                }
            })
            .await;

        if outcome.should_commit() {
            let _ = self.log.commit(topic, &self.config.group_id, record.partition, record.offset).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeadLetterConfig;
    use crate::log::InMemoryPartitionedLog;
    use crate::producer::EventProducer;
    use crate::ProducerConfig;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Serialize, Deserialize)]
    struct Payload {
        value: u32,
    }

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TypedHandler<Payload> for CountingHandler {
        async fn handle(&self, payload: Payload, _envelope: &Envelope) -> Result<()> {
            self.count.fetch_add(payload.value as usize, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AlwaysFailsHandler;

    #[async_trait]
    impl EventHandler for AlwaysFailsHandler {
        async fn handle(&self, _envelope: &Envelope) -> Result<()> {
            Err(CatalogError::internal("handler always fails"))
        }
    }

    fn log() -> Arc<InMemoryPartitionedLog> {
        Arc::new(InMemoryPartitionedLog::new(1))
    }

    fn dlq(log: Arc<InMemoryPartitionedLog>, config: DeadLetterConfig) -> Arc<DeadLetterSubsystem<InMemoryPartitionedLog>> {
        Arc::new(DeadLetterSubsystem::new(log, config, "catalog-dlq"))
    }

    #[tokio::test]
    async fn registered_handler_commits_on_success() {
        let log = log();
        let registry = Arc::new(HandlerRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));
        let handler_count = Arc::clone(&count);
        registry
            .register(
                "PayloadReceived",
                Arc::new(move || -> Box<dyn EventHandler> {
                    Box::new(TypedHandlerAdapter::new(CountingHandler {
                        count: Arc::clone(&handler_count),
                    }))
                }),
            )
            .await
            .unwrap();

        let producer = EventProducer::new(Arc::clone(&log), ProducerConfig::default(), "catalog");
        producer
            .publish_as("events", &Payload { value: 7 }, "PayloadReceived", None)
            .await
            .unwrap();

        let consumer = Arc::new(EventConsumer::new(
            ConsumerConfig {
                group_id: "g1".to_string(),
                ..ConsumerConfig::default()
            },
            Arc::clone(&log),
            registry,
            dlq(Arc::clone(&log), DeadLetterConfig::default()),
        ));

        let records = log.poll("events", "g1", 10).await.unwrap();
        for record in records {
            consumer.process_one("events", record).await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 7);
        assert_eq!(log.committed_offset("events", "g1", 0).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn unregistered_event_type_is_skipped_and_committed() {
        let log = log();
        let registry = Arc::new(HandlerRegistry::new());
        let producer = EventProducer::new(Arc::clone(&log), ProducerConfig::default(), "catalog");
        producer
            .publish_as("events", &Payload { value: 1 }, "NoHandlerForThis", None)
            .await
            .unwrap();

        let consumer = Arc::new(EventConsumer::new(
            ConsumerConfig {
                group_id: "g2".to_string(),
                ..ConsumerConfig::default()
            },
            Arc::clone(&log),
            registry,
            dlq(Arc::clone(&log), DeadLetterConfig::default()),
        ));

        let records = log.poll("events", "g2", 10).await.unwrap();
        for record in records {
            consumer.process_one("events", record).await;
        }
        assert_eq!(log.committed_offset("events", "g2", 0).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn failing_handler_does_not_commit_until_dlq_succeeds() {
        let log = log();
        let registry = Arc::new(HandlerRegistry::new());
        registry
            .register("AlwaysFails", Arc::new(|| -> Box<dyn EventHandler> { Box::new(AlwaysFailsHandler) }))
            .await
            .unwrap();

        let producer = EventProducer::new(Arc::clone(&log), ProducerConfig::default(), "catalog");
        producer
            .publish_as("events", &Payload { value: 1 }, "AlwaysFails", None)
            .await
            .unwrap();

        let dlq_config = DeadLetterConfig {
            max_retries: 1,
            initial_retry_delay_ms: 1,
            max_retry_delay_ms: 1,
            ..DeadLetterConfig::default()
        };
        let consumer = Arc::new(EventConsumer::new(
            ConsumerConfig {
                group_id: "g3".to_string(),
                ..ConsumerConfig::default()
            },
            Arc::clone(&log),
            registry,
            dlq(Arc::clone(&log), dlq_config),
        ));

        let records = log.poll("events", "g3", 10).await.unwrap();
        for record in records {
            consumer.process_one("events", record).await;
        }

        assert_eq!(log.committed_offset("events", "g3", 0).await.unwrap(), Some(0));
        let dlq_records = log.poll("events.dlq", "dlq-reader", 10).await.unwrap();
        assert_eq!(dlq_records.len(), 1);
    }
}
