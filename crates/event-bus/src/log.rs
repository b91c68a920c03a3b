//! PartitionedLog: the ambient abstraction standing in for the out-of-scope
//! broker driver underlying the Event Bus Core. Append-only per-partition
//! sequence with monotonic offsets;
//! `InMemoryPartitionedLog` is a reference implementation sufficient to
//! exercise the producer, consumer, dispatcher and DLQ without a live
//! Kafka-compatible cluster.

use async_trait::async_trait;
use catalog_models::Result;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::RwLock;

/// A single record appended to a topic-partition.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub key: String,
    pub value: Vec<u8>,
    pub headers: HashMap<String, String>,
}

/// Identifies where an `append` landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMetadata {
    pub partition: u32,
    pub offset: u64,
}

#[async_trait]
pub trait PartitionedLog: Send + Sync {
    /// Appends `value` keyed by `key` to `topic`. Partition assignment is a
    /// deterministic function of `key`, so identical keys always land on
    /// the same partition (partition-keyed delivery).
    async fn append(
        &self,
        topic: &str,
        key: &str,
        value: Vec<u8>,
        headers: HashMap<String, String>,
    ) -> Result<RecordMetadata>;

    /// Reads up to `max_records` records across `topic`'s partitions,
    /// starting just past each partition's committed offset for `group`.
    /// Per-partition order is preserved; no order is promised across
    /// partitions.
    async fn poll(&self, topic: &str, group: &str, max_records: usize) -> Result<Vec<LogRecord>>;

    /// Manual offset commit. Commits are idempotent and monotonically non-decreasing
    /// per partition: an older offset is a no-op, never a
    /// regression.
    async fn commit(&self, topic: &str, group: &str, partition: u32, offset: u64) -> Result<()>;

    async fn committed_offset(&self, topic: &str, group: &str, partition: u32) -> Result<Option<u64>>;

    async fn partition_count(&self, topic: &str) -> Result<u32>;
}

struct Partition {
    records: Vec<LogRecord>,
}

/// In-memory reference implementation of `PartitionedLog`. Each topic is
/// created on first use with `default_partitions` partitions; offsets are
/// per-(topic, partition) and committed offsets are tracked per consumer
/// group.
pub struct InMemoryPartitionedLog {
    default_partitions: u32,
    topics: RwLock<HashMap<String, Vec<Partition>>>,
    committed: RwLock<HashMap<(String, String, u32), u64>>,
}

impl InMemoryPartitionedLog {
    pub fn new(default_partitions: u32) -> Self {
        InMemoryPartitionedLog {
            default_partitions: default_partitions.max(1),
            topics: RwLock::new(HashMap::new()),
            committed: RwLock::new(HashMap::new()),
        }
    }

    fn partition_for(key: &str, partition_count: u32) -> u32 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % partition_count as u64) as u32
    }

    async fn ensure_topic<'a>(
        &self,
        topics: &'a mut HashMap<String, Vec<Partition>>,
        topic: &str,
    ) -> &'a mut Vec<Partition> {
        topics.entry(topic.to_string()).or_insert_with(|| {
            (0..self.default_partitions)
                .map(|_| Partition { records: Vec::new() })
                .collect()
        })
    }
}

#[async_trait]
impl PartitionedLog for InMemoryPartitionedLog {
    async fn append(
        &self,
        topic: &str,
        key: &str,
        value: Vec<u8>,
        headers: HashMap<String, String>,
    ) -> Result<RecordMetadata> {
        let mut topics = self.topics.write().await;
        let partitions = self.ensure_topic(&mut topics, topic).await;
        let partition_count = partitions.len() as u32;
        let partition = Self::partition_for(key, partition_count);
        let slot = &mut partitions[partition as usize];
        let offset = slot.records.len() as u64;
        slot.records.push(LogRecord {
            topic: topic.to_string(),
            partition,
            offset,
            key: key.to_string(),
            value,
            headers,
        });
        tracing::trace!(topic, partition, offset, "appended record");
        Ok(RecordMetadata { partition, offset })
    }

    async fn poll(&self, topic: &str, group: &str, max_records: usize) -> Result<Vec<LogRecord>> {
        let topics = self.topics.read().await;
        let Some(partitions) = topics.get(topic) else {
            return Ok(Vec::new());
        };
        let committed = self.committed.read().await;

        let mut out = Vec::new();
        for (partition, slot) in partitions.iter().enumerate() {
            let partition = partition as u32;
            let next_offset = committed
                .get(&(topic.to_string(), group.to_string(), partition))
                .map(|o| o + 1)
                .unwrap_or(0);
            for record in slot.records.iter().skip(next_offset as usize) {
                out.push(record.clone());
                if out.len() >= max_records {
                    return Ok(out);
                }
            }
        }
        Ok(out)
    }

    async fn commit(&self, topic: &str, group: &str, partition: u32, offset: u64) -> Result<()> {
        let mut committed = self.committed.write().await;
        let key = (topic.to_string(), group.to_string(), partition);
        let current = committed.get(&key).copied();
        if current.map(|c| offset > c).unwrap_or(true) {
            committed.insert(key, offset);
        }
        Ok(())
    }

    async fn committed_offset(&self, topic: &str, group: &str, partition: u32) -> Result<Option<u64>> {
        Ok(self
            .committed
            .read()
            .await
            .get(&(topic.to_string(), group.to_string(), partition))
            .copied())
    }

    async fn partition_count(&self, topic: &str) -> Result<u32> {
        let topics = self.topics.read().await;
        Ok(topics.get(topic).map(|p| p.len() as u32).unwrap_or(self.default_partitions))
    }
}

impl Default for InMemoryPartitionedLog {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_then_poll_round_trips() {
        let log = InMemoryPartitionedLog::new(2);
        log.append("orders", "k1", b"hello".to_vec(), HashMap::new())
            .await
            .unwrap();
        let records = log.poll("orders", "group-a", 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, b"hello");
    }

    #[tokio::test]
    async fn commit_is_monotonically_non_decreasing() {
        let log = InMemoryPartitionedLog::new(1);
        log.commit("t", "g", 0, 5).await.unwrap();
        log.commit("t", "g", 0, 2).await.unwrap();
        assert_eq!(log.committed_offset("t", "g", 0).await.unwrap(), Some(5));
        log.commit("t", "g", 0, 9).await.unwrap();
        assert_eq!(log.committed_offset("t", "g", 0).await.unwrap(), Some(9));
    }

    #[tokio::test]
    async fn poll_resumes_after_committed_offset() {
        let log = InMemoryPartitionedLog::new(1);
        for i in 0..3 {
            log.append("t", "same-key", vec![i], HashMap::new()).await.unwrap();
        }
        let first = log.poll("t", "g", 10).await.unwrap();
        assert_eq!(first.len(), 3);
        log.commit("t", "g", first[1].partition, first[1].offset).await.unwrap();

        let remaining = log.poll("t", "g", 10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].offset, first[2].offset);
    }

    #[tokio::test]
    async fn same_key_always_lands_on_same_partition() {
        let log = InMemoryPartitionedLog::new(8);
        let first = log.append("t", "stable-key", vec![1], HashMap::new()).await.unwrap();
        let second = log.append("t", "stable-key", vec![2], HashMap::new()).await.unwrap();
        assert_eq!(first.partition, second.partition);
    }
}
