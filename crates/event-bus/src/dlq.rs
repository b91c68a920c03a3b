//! Dead-Letter Subsystem: classifies failures, retries with exponential
//! backoff, and emits to DLQ topics.

use crate::config::{Acks, DeadLetterConfig, ProducerConfig};
use crate::log::PartitionedLog;
use crate::producer::EventProducer;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The record handed from the consumer dispatcher to the DLQ subsystem on
/// handler failure.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeadLetterEvent {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub payload: serde_json::Value,
    pub error_message: String,
    pub exception_detail: String,
    pub consumer_group: String,
    pub attempt_count: u32,
    pub first_failure_at: DateTime<Utc>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// What happened to a failed message after `handle_failed` ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DlqOutcome {
    /// An in-process retry eventually succeeded.
    Retried,
    /// All retries were exhausted and the message landed on the DLQ topic.
    SentToDlq,
    /// The DLQ is disabled; the message was logged and dropped.
    DroppedDisabled,
    /// Retries were exhausted and the DLQ publish itself failed.
    DlqPublishFailed,
}

impl DlqOutcome {
    /// Whether the original topic's offset should now be committed. Only
    /// a failed DLQ publish leaves the message uncommitted, so broker
    /// redelivery gives it another full attempt at the whole DLQ flow —
    /// failures publishing to the DLQ itself do not escape back to the
    /// consumer's commit path.
    pub fn should_commit(self) -> bool {
        !matches!(self, DlqOutcome::DlqPublishFailed)
    }
}

/// Computes `min(initial * multiplier^attempt, max)`.
/// `attempt` is the `DeadLetterEvent.attempt_count` value at the time of
/// the check, before it is incremented for this retry.
pub fn retry_delay(config: &DeadLetterConfig, attempt: u32) -> Duration {
    let ms = config.initial_retry_delay_ms as f64 * config.retry_backoff_multiplier.powi(attempt as i32);
    let capped = ms.min(config.max_retry_delay_ms as f64).max(0.0);
    Duration::from_millis(capped as u64)
}

/// Retries failed messages with exponential backoff, then emits to
/// `<origTopic><topicSuffix>` via a dedicated idempotent, acks=all
/// producer.
pub struct DeadLetterSubsystem<L: PartitionedLog> {
    config: DeadLetterConfig,
    producer: EventProducer<L>,
    publish_failures: AtomicU64,
}

impl<L: PartitionedLog> DeadLetterSubsystem<L> {
    pub fn new(log: Arc<L>, config: DeadLetterConfig, source: impl Into<String>) -> Self {
        let producer_config = ProducerConfig {
            client_id: "catalog-dlq-producer".to_string(),
            acks: Acks::All,
            enable_idempotence: true,
            ..ProducerConfig::default()
        };
        DeadLetterSubsystem {
            config,
            producer: EventProducer::new(log, producer_config, source),
            publish_failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DeadLetterConfig {
        &self.config
    }

    /// Number of times a DLQ publish itself has failed, for observability.
    pub fn publish_failure_count(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    /// Runs the retry-then-DLQ algorithm for a failed message. `retry` is
    /// invoked to re-attempt processing; whether it re-publishes to the
    /// original topic or re-invokes the handler directly is left to the
    /// caller — this implementation re-invokes the
    /// handler in-process, since republishing would mint a new offset and
    /// complicate the "don't commit until resolved" contract.
    pub async fn handle_failed<F, Fut>(&self, mut event: DeadLetterEvent, mut retry: F) -> DlqOutcome
    where
        F: FnMut(DeadLetterEvent) -> Fut,
        Fut: Future<Output = catalog_models::Result<()>>,
    {
        if !self.config.enable_dlq {
            tracing::warn!(topic = %event.topic, "dead-letter queue disabled, dropping message");
            return DlqOutcome::DroppedDisabled;
        }

        loop {
            if event.attempt_count >= self.config.max_retries {
                return self.publish_to_dlq(event).await;
            }

            let delay = retry_delay(&self.config, event.attempt_count);
            tokio::time::sleep(delay).await;

            event.attempt_count += 1;
            event.last_failure_at = Some(Utc::now());

            match retry(event.clone()).await {
                Ok(()) => {
                    tracing::info!(topic = %event.topic, attempt = event.attempt_count, "retry succeeded");
                    return DlqOutcome::Retried;
                }
                Err(err) => {
                    event.error_message = err.to_string();
                    tracing::warn!(topic = %event.topic, attempt = event.attempt_count, error = %err, "retry failed");
                }
            }
        }
    }

    async fn publish_to_dlq(&self, event: DeadLetterEvent) -> DlqOutcome {
        let dlq_topic = format!("{}{}", event.topic, self.config.topic_suffix);
        let key = format!("{}-{}-{}", event.topic, event.partition, event.offset);

        let mut headers = std::collections::HashMap::new();
        headers.insert("original-topic".to_string(), event.topic.clone());
        headers.insert("error-message".to_string(), event.error_message.clone());
        headers.insert("attempt-count".to_string(), event.attempt_count.to_string());
        headers.insert("consumer-group".to_string(), event.consumer_group.clone());

        match self
            .producer
            .publish_with_headers(&dlq_topic, &event, "DeadLetter", Some(key), headers)
            .await
        {
            Ok(_) => {
                tracing::error!(
                    original_topic = %event.topic,
                    attempt_count = event.attempt_count,
                    consumer_group = %event.consumer_group,
                    "message exhausted retries, sent to dead-letter topic"
                );
                DlqOutcome::SentToDlq
            }
            Err(err) => {
                self.publish_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    original_topic = %event.topic,
                    error = %err,
                    "failed to publish to dead-letter topic"
                );
                DlqOutcome::DlqPublishFailed
            }
        }
    }
}
