use catalog_models::ResourceType;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Declarative per-resource-type property/metadata rules.
pub struct TypeRules {
    pub required_properties: &'static [&'static str],
    pub optional_properties: &'static [&'static str],
    pub required_metadata: &'static [&'static str],
}

lazy_static! {
    pub static ref TYPE_RULES: HashMap<ResourceType, TypeRules> = {
        let mut m = HashMap::new();
        m.insert(
            ResourceType::Service,
            TypeRules {
                required_properties: &["endpoint", "protocol", "description"],
                optional_properties: &["health_check_path", "owner_team"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Database,
            TypeRules {
                required_properties: &["connection_string", "provider", "description", "environment"],
                optional_properties: &["read_replica_of"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Table,
            TypeRules {
                required_properties: &["schema", "description"],
                optional_properties: &["partition_key", "retention_days"],
                required_metadata: &["columns"],
            },
        );
        m.insert(
            ResourceType::Model,
            TypeRules {
                required_properties: &["framework", "description"],
                optional_properties: &["training_dataset", "accuracy"],
                required_metadata: &["input_schema", "output_schema"],
            },
        );
        m.insert(
            ResourceType::Dataset,
            TypeRules {
                required_properties: &["location", "description"],
                optional_properties: &["format", "size_bytes"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Api,
            TypeRules {
                required_properties: &["endpoint", "description"],
                optional_properties: &["version_header", "auth_scheme"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Queue,
            TypeRules {
                required_properties: &["broker", "description"],
                optional_properties: &["dead_letter_topic"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Topic,
            TypeRules {
                required_properties: &["broker", "description"],
                optional_properties: &["partitions", "retention_ms"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Stream,
            TypeRules {
                required_properties: &["broker", "description"],
                optional_properties: &["shard_count"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Secret,
            TypeRules {
                required_properties: &["vault_path", "description"],
                optional_properties: &["rotation_policy"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Configuration,
            TypeRules {
                required_properties: &["scope", "description"],
                optional_properties: &[],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Dashboard,
            TypeRules {
                required_properties: &["url", "description"],
                optional_properties: &["refresh_interval"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Report,
            TypeRules {
                required_properties: &["url", "description"],
                optional_properties: &["schedule"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Pipeline,
            TypeRules {
                required_properties: &["orchestrator", "description"],
                optional_properties: &["schedule"],
                required_metadata: &[],
            },
        );
        m.insert(
            ResourceType::Workflow,
            TypeRules {
                required_properties: &["orchestrator", "description"],
                optional_properties: &["schedule"],
                required_metadata: &[],
            },
        );
        m
    };
}
