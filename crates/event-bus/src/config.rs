//! Configuration surface for the Event Bus Core.
//! Every field documents its default; unknown keys in the layered
//! configuration source are ignored with a warning (the deserialisation
//! itself happens one layer up, in the hosting process's config loader —
//! these structs are the typed target it binds into).

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Acks {
    All,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "0")]
    None,
}

impl Default for Acks {
    fn default() -> Self {
        Acks::All
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    Gzip,
    Snappy,
    Lz4,
    Zstd,
    None,
}

impl Default for CompressionType {
    fn default() -> Self {
        CompressionType::Snappy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityProtocol {
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl Default for SecurityProtocol {
    fn default() -> Self {
        SecurityProtocol::Plaintext
    }
}

/// Transport security shared by producer and consumer: protocol, SASL
/// mechanism, credentials, CA path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub protocol: SecurityProtocol,
    pub sasl_mechanism: Option<String>,
    pub sasl_username: Option<String>,
    pub sasl_password: Option<String>,
    pub ca_path: Option<String>,
}

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct ProducerConfig {
    pub bootstrap_servers: Vec<String>,
    pub client_id: String,
    #[serde(default)]
    pub acks: Acks,
    #[serde(default = "default_true")]
    pub enable_idempotence: bool,
    #[validate(range(min = 1))]
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: u32,
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default)]
    pub linger_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub compression_type: CompressionType,
    #[serde(default = "default_message_max_bytes")]
    pub message_max_bytes: usize,
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        ProducerConfig {
            bootstrap_servers: Vec::new(),
            client_id: "catalog-producer".to_string(),
            acks: Acks::default(),
            enable_idempotence: true,
            max_in_flight: default_max_in_flight(),
            message_timeout_ms: default_message_timeout_ms(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            linger_ms: 0,
            batch_size: default_batch_size(),
            compression_type: CompressionType::default(),
            message_max_bytes: default_message_max_bytes(),
            security: SecurityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    Earliest,
    Latest,
    Error,
}

impl Default for OffsetReset {
    fn default() -> Self {
        OffsetReset::Earliest
    }
}

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct ConsumerConfig {
    pub group_id: String,
    pub client_id: String,
    #[serde(default)]
    pub auto_offset_reset: OffsetReset,
    /// Always `false` — manual commit is the contract. Kept as
    /// a field (rather than a constant) so the layered config loader can
    /// still bind it and warn if an operator sets it to `true`.
    #[serde(default)]
    pub enable_auto_commit: bool,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,
    #[validate(range(min = 1))]
    #[serde(default = "default_max_poll_records")]
    pub max_poll_records: usize,
    #[serde(default = "default_fetch_min_bytes")]
    pub fetch_min_bytes: usize,
    #[serde(default = "default_fetch_max_wait_ms")]
    pub fetch_max_wait_ms: u64,
    #[serde(default = "default_max_partition_fetch_bytes")]
    pub max_partition_fetch_bytes: usize,
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            group_id: "catalog-consumer".to_string(),
            client_id: "catalog-consumer".to_string(),
            auto_offset_reset: OffsetReset::default(),
            enable_auto_commit: false,
            session_timeout_ms: default_session_timeout_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            max_poll_interval_ms: default_max_poll_interval_ms(),
            max_poll_records: default_max_poll_records(),
            fetch_min_bytes: default_fetch_min_bytes(),
            fetch_max_wait_ms: default_fetch_max_wait_ms(),
            max_partition_fetch_bytes: default_max_partition_fetch_bytes(),
            security: SecurityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct DeadLetterConfig {
    #[serde(default = "default_topic_suffix")]
    pub topic_suffix: String,
    #[validate(range(min = 1))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    #[serde(default = "default_retry_backoff_multiplier")]
    pub retry_backoff_multiplier: f64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_true")]
    pub enable_dlq: bool,
}

impl Default for DeadLetterConfig {
    fn default() -> Self {
        DeadLetterConfig {
            topic_suffix: default_topic_suffix(),
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            retry_backoff_multiplier: default_retry_backoff_multiplier(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            enable_dlq: true,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_max_in_flight() -> u32 {
    5
}
fn default_message_timeout_ms() -> u64 {
    300_000
}
fn default_retries() -> u32 {
    2_147_483_647
}
fn default_retry_backoff_ms() -> u64 {
    100
}
fn default_batch_size() -> usize {
    16_384
}
fn default_message_max_bytes() -> usize {
    1_000_000
}
fn default_session_timeout_ms() -> u64 {
    10_000
}
fn default_heartbeat_interval_ms() -> u64 {
    3_000
}
fn default_max_poll_interval_ms() -> u64 {
    300_000
}
fn default_max_poll_records() -> usize {
    500
}
fn default_fetch_min_bytes() -> usize {
    1
}
fn default_fetch_max_wait_ms() -> u64 {
    500
}
fn default_max_partition_fetch_bytes() -> usize {
    1_048_576
}
fn default_topic_suffix() -> String {
    ".dlq".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_initial_retry_delay_ms() -> u64 {
    1_000
}
fn default_retry_backoff_multiplier() -> f64 {
    2.0
}
fn default_max_retry_delay_ms() -> u64 {
    60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_defaults_are_idempotent_and_all_acks() {
        let cfg = ProducerConfig::default();
        assert_eq!(cfg.acks, Acks::All);
        assert!(cfg.enable_idempotence);
        assert_eq!(cfg.max_in_flight, 5);
        assert_eq!(cfg.compression_type, CompressionType::Snappy);
    }

    #[test]
    fn consumer_manual_commit_is_the_default() {
        let cfg = ConsumerConfig::default();
        assert!(!cfg.enable_auto_commit);
        assert_eq!(cfg.max_poll_records, 500);
    }

    #[test]
    fn dlq_defaults_follow_the_documented_formula() {
        let cfg = DeadLetterConfig::default();
        assert_eq!(cfg.topic_suffix, ".dlq");
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.initial_retry_delay_ms, 1000);
        assert_eq!(cfg.retry_backoff_multiplier, 2.0);
        assert_eq!(cfg.max_retry_delay_ms, 60_000);
        assert!(cfg.enable_dlq);
    }
}
