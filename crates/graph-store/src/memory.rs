use crate::{validate_depth, GraphStore, MAX_DEPENDENCY_DEPTH, MAX_LINEAGE_DEPTH};
use async_trait::async_trait;
use catalog_models::{CatalogError, Relationship, RelationshipType, ResourceProjection, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryGraphStore {
    edges: RwLock<HashMap<Uuid, Relationship>>,
    nodes: RwLock<HashMap<Uuid, ResourceProjection>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// BFS from `start`, following edges selected by `select`, bounded to
    /// `depth` hops. Returns distinct reachable node ids, excluding `start`.
    async fn walk<F>(&self, start: Uuid, depth: u32, select: F) -> Vec<Uuid>
    where
        F: Fn(&Relationship, Uuid) -> Option<Uuid>,
    {
        let edges = self.edges.read().await;
        let mut visited = HashSet::new();
        let mut frontier = VecDeque::new();
        frontier.push_back((start, 0u32));
        visited.insert(start);

        let mut reached = Vec::new();
        while let Some((node, hop)) = frontier.pop_front() {
            if hop >= depth {
                continue;
            }
            for edge in edges.values() {
                if let Some(next) = select(edge, node) {
                    if visited.insert(next) {
                        reached.push(next);
                        frontier.push_back((next, hop + 1));
                    }
                }
            }
        }
        reached
    }

    async fn projections_for(&self, ids: &[Uuid]) -> Vec<ResourceProjection> {
        let nodes = self.nodes.read().await;
        ids.iter().filter_map(|id| nodes.get(id).cloned()).collect()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn get_edge(&self, id: Uuid) -> Result<Relationship> {
        self.edges
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(format!("relationship {id}")))
    }

    async fn create_edge(&self, mut edge: Relationship) -> Result<Relationship> {
        if edge.is_self_loop() {
            return Err(CatalogError::invalid("relationship source and target must differ"));
        }
        if !self.node_exists(edge.source_id).await? {
            return Err(CatalogError::not_found(format!("resource {}", edge.source_id)));
        }
        if !self.node_exists(edge.target_id).await? {
            return Err(CatalogError::not_found(format!("resource {}", edge.target_id)));
        }
        if edge.relationship_type.is_acyclic_checked()
            && self
                .has_cycle(edge.source_id, edge.target_id, edge.relationship_type)
                .await?
        {
            return Err(CatalogError::invalid("would introduce cycle"));
        }

        if edge.id.is_nil() {
            edge.id = Uuid::new_v4();
        }
        self.edges.write().await.insert(edge.id, edge.clone());
        tracing::debug!(id = %edge.id, kind = %edge.relationship_type, "relationship created");
        Ok(edge)
    }

    async fn delete_edge(&self, id: Uuid) -> Result<bool> {
        Ok(self.edges.write().await.remove(&id).is_some())
    }

    async fn get_by_source(&self, source_id: Uuid) -> Result<Vec<Relationship>> {
        Ok(self
            .edges
            .read()
            .await
            .values()
            .filter(|e| e.source_id == source_id)
            .cloned()
            .collect())
    }

    async fn get_by_target(&self, target_id: Uuid) -> Result<Vec<Relationship>> {
        Ok(self
            .edges
            .read()
            .await
            .values()
            .filter(|e| e.target_id == target_id)
            .cloned()
            .collect())
    }

    async fn get_by_type(&self, relationship_type: RelationshipType) -> Result<Vec<Relationship>> {
        Ok(self
            .edges
            .read()
            .await
            .values()
            .filter(|e| e.relationship_type == relationship_type)
            .cloned()
            .collect())
    }

    async fn get_between(&self, source_id: Uuid, target_id: Uuid) -> Result<Vec<Relationship>> {
        Ok(self
            .edges
            .read()
            .await
            .values()
            .filter(|e| e.source_id == source_id && e.target_id == target_id)
            .cloned()
            .collect())
    }

    async fn dependencies(&self, id: Uuid, depth: u32) -> Result<Vec<ResourceProjection>> {
        validate_depth(depth, MAX_DEPENDENCY_DEPTH)?;
        let ids = self
            .walk(id, depth, |edge, node| {
                (edge.relationship_type == RelationshipType::DependsOn && edge.source_id == node)
                    .then_some(edge.target_id)
            })
            .await;
        Ok(self.projections_for(&ids).await)
    }

    async fn dependents(&self, id: Uuid, depth: u32) -> Result<Vec<ResourceProjection>> {
        validate_depth(depth, MAX_DEPENDENCY_DEPTH)?;
        let ids = self
            .walk(id, depth, |edge, node| {
                (edge.relationship_type == RelationshipType::DependsOn && edge.target_id == node)
                    .then_some(edge.source_id)
            })
            .await;
        Ok(self.projections_for(&ids).await)
    }

    async fn lineage_upstream(&self, id: Uuid, depth: u32) -> Result<Vec<ResourceProjection>> {
        validate_depth(depth, MAX_LINEAGE_DEPTH)?;
        let ids = self
            .walk(id, depth, |edge, node| {
                (edge.target_id == node).then_some(edge.source_id)
            })
            .await;
        Ok(self.projections_for(&ids).await)
    }

    async fn lineage_downstream(&self, id: Uuid, depth: u32) -> Result<Vec<ResourceProjection>> {
        validate_depth(depth, MAX_LINEAGE_DEPTH)?;
        let ids = self
            .walk(id, depth, |edge, node| {
                (edge.source_id == node).then_some(edge.target_id)
            })
            .await;
        Ok(self.projections_for(&ids).await)
    }

    async fn has_cycle(
        &self,
        source: Uuid,
        target: Uuid,
        relationship_type: RelationshipType,
    ) -> Result<bool> {
        let ids = self
            .walk(target, MAX_LINEAGE_DEPTH, |edge, node| {
                (edge.relationship_type == relationship_type && edge.source_id == node)
                    .then_some(edge.target_id)
            })
            .await;
        Ok(ids.contains(&source) || target == source)
    }

    async fn upsert_node(&self, node: ResourceProjection) -> Result<()> {
        self.nodes.write().await.insert(node.id, node);
        Ok(())
    }

    async fn node_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.nodes.read().await.contains_key(&id))
    }

    async fn remove_node(&self, id: Uuid) -> Result<()> {
        self.nodes.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_models::ResourceType;
    use chrono::Utc;

    fn projection(id: Uuid) -> ResourceProjection {
        ResourceProjection {
            id,
            resource_type: ResourceType::Service,
            name: id.to_string(),
            namespace: None,
            version: "1.0.0".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            active: true,
        }
    }

    fn edge(source: Uuid, target: Uuid, kind: RelationshipType) -> Relationship {
        Relationship {
            id: Uuid::nil(),
            relationship_type: kind,
            source_id: source,
            target_id: target,
            bidirectional: false,
            dependency_sub_type: None,
            required: false,
            version_constraint: None,
            transformation_type: None,
            transformation_logic: None,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    async fn seeded_store(ids: &[Uuid]) -> InMemoryGraphStore {
        let store = InMemoryGraphStore::new();
        for id in ids {
            store.upsert_node(projection(*id)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn cycle_rejection_scenario() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let store = seeded_store(&[a, b, c]).await;

        store
            .create_edge(edge(a, b, RelationshipType::DependsOn))
            .await
            .unwrap();
        store
            .create_edge(edge(b, c, RelationshipType::DependsOn))
            .await
            .unwrap();
        store
            .create_edge(edge(a, c, RelationshipType::DependsOn))
            .await
            .unwrap();

        let err = store
            .create_edge(edge(c, a, RelationshipType::DependsOn))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[tokio::test]
    async fn lineage_depth_boundaries() {
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let store = seeded_store(&[a, b, c, d]).await;
        for (s, t) in [(a, b), (b, c), (c, d)] {
            store
                .create_edge(edge(s, t, RelationshipType::Produces))
                .await
                .unwrap();
        }

        let depth2: HashSet<_> = store
            .lineage_downstream(a, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(depth2, HashSet::from([b, c]));

        let depth10: HashSet<_> = store
            .lineage_downstream(a, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(depth10, HashSet::from([b, c, d]));
    }

    #[tokio::test]
    async fn depth_zero_rejected() {
        let a = Uuid::new_v4();
        let store = seeded_store(&[a]).await;
        assert!(store.dependencies(a, 0).await.is_err());
        assert!(store.lineage_upstream(a, 0).await.is_err());
    }

    #[tokio::test]
    async fn dependency_depth_over_ten_rejected() {
        let a = Uuid::new_v4();
        let store = seeded_store(&[a]).await;
        assert!(store.dependencies(a, 11).await.is_err());
        assert!(store.lineage_downstream(a, 51).await.is_err());
    }

    #[tokio::test]
    async fn missing_endpoint_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let store = seeded_store(&[a]).await;
        let err = store
            .create_edge(edge(a, b, RelationshipType::DependsOn))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn cross_type_cycle_allowed() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let store = seeded_store(&[a, b]).await;
        store
            .create_edge(edge(a, b, RelationshipType::DependsOn))
            .await
            .unwrap();
        // Produces in the opposite direction does not share DependsOn's cycle class.
        store
            .create_edge(edge(b, a, RelationshipType::Produces))
            .await
            .unwrap();
    }
}
