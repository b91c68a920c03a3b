use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub enum RelationshipType {
    DependsOn,
    Produces,
    Consumes,
    Contains,
    TrainedWith,
    HasAccess,
    DerivesFrom,
    References,
    Extends,
}

impl RelationshipType {
    /// Relationship types participating in per-type acyclicity checks
    ///. `Produces`/`Consumes` intentionally do not share a cycle
    /// class with each other or with `DependsOn`:
    /// cross-type cycles are allowed, only a same-type path back to the
    /// source is rejected.
    pub fn is_acyclic_checked(&self) -> bool {
        matches!(
            self,
            RelationshipType::DependsOn | RelationshipType::Produces | RelationshipType::DerivesFrom
        )
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A typed directed edge between two Resources.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Relationship {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub bidirectional: bool,
    pub dependency_sub_type: Option<String>,
    pub required: bool,
    pub version_constraint: Option<String>,
    pub transformation_type: Option<String>,
    pub transformation_logic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

impl Relationship {
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}
