//! Constructs every long-lived object once at startup: the three stores,
//! the partitioned log, the producer, the dead-letter subsystem, the
//! consumer and the coordinator that ties them together.
//!
//! The real Postgres/graph-database/search-engine/broker drivers are
//! named contracts, not designs; the in-memory reference
//! implementations stand in for them here, the same way the coordinator's
//! own test suite uses them.

use std::sync::Arc;

use catalog_coordinator::{CatalogCoordinator, EventTopics};
use event_bus::{DeadLetterSubsystem, EventConsumer, EventProducer, HandlerRegistry, InMemoryPartitionedLog};
use graph_store::InMemoryGraphStore;
use resource_store::InMemoryResourceStore;
use search_index::InMemorySearchIndex;

use crate::config::CatalogConfig;

pub type Coordinator =
    CatalogCoordinator<InMemoryResourceStore, InMemoryGraphStore, InMemorySearchIndex, InMemoryPartitionedLog>;

/// Every object the process needs for its lifetime, held together so
/// `main` can hand out clones of the `Arc`s it needs and shut the rest
/// down cleanly.
pub struct Runtime {
    pub coordinator: Arc<Coordinator>,
    pub consumer: Arc<EventConsumer<InMemoryPartitionedLog>>,
    pub handler_registry: Arc<HandlerRegistry>,
}

/// Number of broker partitions backing the in-memory log. Fixed rather
/// than configurable: the real partition count is a broker-admin concern
/// out of this process's scope.
const LOG_PARTITIONS: u32 = 6;

pub fn build(config: &CatalogConfig) -> Runtime {
    let log = Arc::new(InMemoryPartitionedLog::new(LOG_PARTITIONS));

    let resource_store = Arc::new(InMemoryResourceStore::new());
    let graph_store = Arc::new(InMemoryGraphStore::new());
    let search_index = Arc::new(InMemorySearchIndex::new());

    let producer = Arc::new(EventProducer::new(Arc::clone(&log), config.producer.clone(), "catalog"));

    let topics = EventTopics {
        resources: config.kafka.resources_topic.clone(),
        relationships: config.kafka.relationships_topic.clone(),
    };

    let coordinator = Arc::new(CatalogCoordinator::new(
        Arc::clone(&resource_store),
        Arc::clone(&graph_store),
        Arc::clone(&search_index),
        Arc::clone(&producer),
        topics,
    ));

    let dlq = Arc::new(DeadLetterSubsystem::new(
        Arc::clone(&log),
        config.dead_letter_queue.clone(),
        "catalog",
    ));
    let handler_registry = Arc::new(HandlerRegistry::new());
    let consumer = Arc::new(EventConsumer::new(
        config.consumer.clone(),
        log,
        Arc::clone(&handler_registry),
        dlq,
    ));

    Runtime {
        coordinator,
        consumer,
        handler_registry,
    }
}
