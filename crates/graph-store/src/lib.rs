//! Graph Store: typed directed relationships between catalog Resources
//!, with bounded-depth traversal and per-type cycle detection.
//!
//! `GraphStore` is a contract; the real graph-database driver is named but
//! not designed here. `InMemoryGraphStore` is a reference
//! implementation.

mod memory;

pub use memory::InMemoryGraphStore;

use async_trait::async_trait;
use catalog_models::{Relationship, RelationshipType, ResourceProjection, Result};
use uuid::Uuid;

/// Dependency walks (`Dependencies`/`Dependents`) are bounded to this depth
///.
pub const MAX_DEPENDENCY_DEPTH: u32 = 10;

/// Lineage walks and cycle checks are bounded to this depth.
pub const MAX_LINEAGE_DEPTH: u32 = 50;

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn get_edge(&self, id: Uuid) -> Result<Relationship>;

    /// Both `source_id` and `target_id` must already exist in the graph
    /// at edge-create time, and adding the edge must not close a
    /// same-type cycle.
    async fn create_edge(&self, edge: Relationship) -> Result<Relationship>;

    async fn delete_edge(&self, id: Uuid) -> Result<bool>;

    async fn get_by_source(&self, source_id: Uuid) -> Result<Vec<Relationship>>;

    async fn get_by_target(&self, target_id: Uuid) -> Result<Vec<Relationship>>;

    async fn get_by_type(&self, relationship_type: RelationshipType) -> Result<Vec<Relationship>>;

    async fn get_between(&self, source_id: Uuid, target_id: Uuid) -> Result<Vec<Relationship>>;

    /// Resources reachable by walking outgoing `DependsOn` edges from `id`,
    /// bounded to `depth` hops (1..=10).
    async fn dependencies(&self, id: Uuid, depth: u32) -> Result<Vec<ResourceProjection>>;

    /// Resources reachable by walking incoming `DependsOn` edges into `id`,
    /// bounded to `depth` hops (1..=10).
    async fn dependents(&self, id: Uuid, depth: u32) -> Result<Vec<ResourceProjection>>;

    /// Resources reachable by walking incoming edges of any type into `id`
    /// ("what feeds into id"), bounded to `depth` hops (1..=50).
    async fn lineage_upstream(&self, id: Uuid, depth: u32) -> Result<Vec<ResourceProjection>>;

    /// Resources reachable by walking outgoing edges of any type from `id`
    /// ("what id feeds into"), bounded to `depth` hops (1..=50).
    async fn lineage_downstream(&self, id: Uuid, depth: u32) -> Result<Vec<ResourceProjection>>;

    /// True if a directed path of edges of `relationship_type` already
    /// exists from `target` back to `source` (bounded to 50 hops) — i.e.
    /// whether adding `source -> target` would close a cycle.
    async fn has_cycle(
        &self,
        source: Uuid,
        target: Uuid,
        relationship_type: RelationshipType,
    ) -> Result<bool>;

    /// Registers (or refreshes) a node's projection so later edge creation
    /// and traversal can resolve it without round-tripping to the Resource
    /// Store. Called by the coordinator when a relationship references a
    /// resource; traversals reconstruct their results from these
    /// graph-node properties.
    async fn upsert_node(&self, node: ResourceProjection) -> Result<()>;

    async fn node_exists(&self, id: Uuid) -> Result<bool>;

    async fn remove_node(&self, id: Uuid) -> Result<()>;
}

pub(crate) fn validate_depth(depth: u32, max: u32) -> Result<()> {
    if depth == 0 {
        return Err(catalog_models::CatalogError::invalid("depth must be >= 1"));
    }
    if depth > max {
        return Err(catalog_models::CatalogError::invalid(format!(
            "depth {depth} exceeds maximum of {max}"
        )));
    }
    Ok(())
}
