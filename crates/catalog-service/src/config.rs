//! Layered process configuration: `config/base`, an
//! `APP_ENV`-selected overlay, then `CATALOG_`-prefixed environment
//! variables, bound into a single typed `CatalogConfig` via the `config`
//! crate — the same pattern the coordinator's hosting process already
//! uses for its own settings.

use event_bus::{ConsumerConfig, DeadLetterConfig, ProducerConfig};
use once_cell::sync::OnceCell;
use serde::Deserialize;

mod app_env;

pub use app_env::app_env;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub kafka: KafkaConfig,
    pub schema_registry: SchemaRegistryConfig,
    pub producer: ProducerConfig,
    pub consumer: ConsumerConfig,
    pub dead_letter_queue: DeadLetterConfig,
    pub metrics: MetricsConfig,
    pub resource_store: StoreConfig,
    pub graph_store: StoreConfig,
    pub search_index: SearchIndexConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    pub bootstrap_servers: Vec<String>,
    #[serde(default = "default_resources_topic")]
    pub resources_topic: String,
    #[serde(default = "default_relationships_topic")]
    pub relationships_topic: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaRegistryConfig {
    pub url: String,
    #[serde(default)]
    pub auth_username: Option<String>,
    #[serde(default)]
    pub auth_password: Option<String>,
}

/// Metrics exposition format is a named contract, not a design;
/// this only carries enough configuration to decide whether a future
/// exporter should start and where.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub connection_string: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchIndexConfig {
    pub connection_string: String,
    pub index_name: String,
}

fn default_resources_topic() -> String {
    "catalog.resources".to_string()
}

fn default_relationships_topic() -> String {
    "catalog.relationships".to_string()
}

fn default_metrics_port() -> u16 {
    9094
}

pub fn settings() -> &'static CatalogConfig {
    static SETTINGS: OnceCell<CatalogConfig> = OnceCell::new();

    SETTINGS.get_or_init(|| load_settings().expect("failed to load configuration"))
}

fn load_settings() -> Result<CatalogConfig, config::ConfigError> {
    let crate_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let config_dir = crate_dir.join("config");

    let builder = config::Config::builder()
        // Base settings shipped with the crate.
        .add_source(config::File::from(config_dir.join("base")).required(true))
        // APP_ENV-specific overlay (development/production/test).
        .add_source(config::File::from(config_dir.join(app_env().as_str())).required(false))
        // A working-directory override, for operators deploying without
        // the source tree alongside the binary.
        .add_source(config::File::with_name("config/local").required(false))
        // CATALOG_-prefixed environment variables, `__` separating nested
        // keys (e.g. CATALOG_KAFKA__BOOTSTRAP_SERVERS).
        .add_source(
            config::Environment::with_prefix("CATALOG")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

    // Unknown keys are ignored by `try_deserialize` itself; the `config`
    // crate only errors on keys it cannot coerce into the target type.
    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_layer_loads_without_an_app_env_overlay() {
        let builder = config::Config::builder()
            .add_source(
                config::File::from(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/base"))
                    .required(true),
            )
            .add_source(
                config::Environment::with_prefix("CATALOG_TEST_UNUSED")
                    .separator("__")
                    .try_parsing(true),
            );
        let parsed: CatalogConfig = builder.build().unwrap().try_deserialize().unwrap();

        assert_eq!(parsed.kafka.resources_topic, "catalog.resources");
        assert_eq!(parsed.consumer.group_id, "catalog-consumer");
        assert!(!parsed.metrics.enabled);
        assert_eq!(parsed.search_index.index_name, "catalog-resources");
    }
}
