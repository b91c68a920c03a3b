use crate::version::SemanticVersion;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

lazy_static! {
    pub static ref NAME_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,62}[A-Za-z0-9]$").unwrap();
    pub static ref NAMESPACE_RE: Regex =
        Regex::new(r"^[a-z0-9][a-z0-9-]{0,62}[a-z0-9]$").unwrap();
}

/// ResourceType enumerates the catalogued entity kinds. `Unknown` is a
/// deserialisation fallback only; it is rejected at create time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ResourceType {
    Service,
    Database,
    Table,
    Model,
    Dataset,
    Api,
    Queue,
    Topic,
    Stream,
    Secret,
    Configuration,
    Dashboard,
    Report,
    Pipeline,
    Workflow,
    Unknown,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A catalogued entity. Validation lives in `schema-validator`; this
/// struct only carries data.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Resource {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    pub namespace: Option<String>,
    pub version: SemanticVersion,
    /// Tags as submitted by the caller. Kept as a `Vec` (not deduplicated)
    /// so the validator can flag duplicate entries; use
    /// `distinct_tags` wherever set semantics are required.
    pub tags: Vec<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub properties: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub active: bool,
}

impl Resource {
    /// The `(type, name, namespace)` uniqueness key.
    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            resource_type: self.resource_type,
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }

    /// Tags with set semantics, i.e. an unordered set; duplicate entries
    /// in `tags` collapse here.
    pub fn distinct_tags(&self) -> BTreeSet<String> {
        self.tags.iter().cloned().collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    pub resource_type: ResourceType,
    pub name: String,
    pub namespace: Option<String>,
}

/// A lightweight projection of a Resource, reconstructed from graph-node
/// properties by the Graph Store without round-tripping
/// through the Resource Store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceProjection {
    pub id: Uuid,
    pub resource_type: ResourceType,
    pub name: String,
    pub namespace: Option<String>,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
}

impl From<&Resource> for ResourceProjection {
    fn from(r: &Resource) -> Self {
        ResourceProjection {
            id: r.id,
            resource_type: r.resource_type,
            name: r.name.clone(),
            namespace: r.namespace.clone(),
            version: r.version.as_str().to_string(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            active: r.active,
        }
    }
}
