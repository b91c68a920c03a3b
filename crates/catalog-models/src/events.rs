use crate::relationship::RelationshipType;
use crate::resource::ResourceType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Concrete payload types for the five catalog lifecycle events. Each
/// carries exactly the identifying tuple for its resource or relationship,
/// nothing more — consumers that need full attributes re-read the store.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCreated {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUpdated {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDeleted {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipCreated {
    pub id: Uuid,
    pub source_id: Uuid,
    pub target_id: Uuid,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipDeleted {
    pub id: Uuid,
    pub source_id: Uuid,
    pub target_id: Uuid,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
}

/// Event-type name constants used both as CloudEvents `type` values and as
/// handler-registry keys.
pub mod event_type {
    pub const RESOURCE_CREATED: &str = "ResourceCreated";
    pub const RESOURCE_UPDATED: &str = "ResourceUpdated";
    pub const RESOURCE_DELETED: &str = "ResourceDeleted";
    pub const RELATIONSHIP_CREATED: &str = "RelationshipCreated";
    pub const RELATIONSHIP_DELETED: &str = "RelationshipDeleted";
}
