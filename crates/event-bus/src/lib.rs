//! Event Bus Core: a durable message-distribution layer on top of a
//! partitioned log. Producer with idempotent
//! exactly-once-per-partition semantics, consumer with at-least-once
//! delivery and manual offset commit, handler dispatch, and a dead-letter
//! subsystem with exponential-backoff retry.
//!
//! The real broker driver is a named contract, not a design;
//! `PartitionedLog`/`InMemoryPartitionedLog` stand in for it here.

pub mod config;
pub mod consumer;
pub mod dlq;
pub mod log;
pub mod producer;

pub use config::{Acks, CompressionType, ConsumerConfig, DeadLetterConfig, OffsetReset, ProducerConfig, SecurityConfig, SecurityProtocol};
pub use consumer::{EventConsumer, EventHandler, HandlerFactory, HandlerRegistry, TypedHandler, TypedHandlerAdapter};
pub use dlq::{DeadLetterEvent, DeadLetterSubsystem, DlqOutcome};
pub use log::{InMemoryPartitionedLog, LogRecord, PartitionedLog, RecordMetadata};
pub use producer::EventProducer;
