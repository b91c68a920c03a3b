//! Catalog Coordinator: the central write path that keeps the Resource
//! Store, Graph Store and Search Index consistent via saga compensation,
//! and emits lifecycle events.

use crate::saga::Saga;
use catalog_models::events::{
    event_type, RelationshipCreated, RelationshipDeleted, ResourceCreated, ResourceDeleted, ResourceUpdated,
};
use catalog_models::{CatalogError, Relationship, Resource, ResourceProjection, Result};
use event_bus::{EventProducer, PartitionedLog};
use graph_store::GraphStore;
use resource_store::ResourceStore;
use schema_validator::Validator;
use search_index::SearchIndex;
use std::sync::Arc;
use uuid::Uuid;

/// Topic names the coordinator publishes catalog lifecycle events to.
/// Kept small and explicit rather than folded into `event-bus`'s config
/// surface, since these are catalog-domain concerns, not broker concerns.
#[derive(Debug, Clone)]
pub struct EventTopics {
    pub resources: String,
    pub relationships: String,
}

impl Default for EventTopics {
    fn default() -> Self {
        EventTopics {
            resources: "catalog.resources".to_string(),
            relationships: "catalog.relationships".to_string(),
        }
    }
}

/// The number of rows fetched per page while resynchronising the search
/// index.
const RESYNC_PAGE_SIZE: usize = 1000;

/// Orchestrates writes across the three stores. Stateless across
/// requests — every call is its own mini-saga.
pub struct CatalogCoordinator<R, G, S, L>
where
    R: ResourceStore + 'static,
    G: GraphStore + 'static,
    S: SearchIndex + 'static,
    L: PartitionedLog + 'static,
{
    resource_store: Arc<R>,
    graph_store: Arc<G>,
    search_index: Arc<S>,
    producer: Arc<EventProducer<L>>,
    topics: EventTopics,
}

impl<R, G, S, L> CatalogCoordinator<R, G, S, L>
where
    R: ResourceStore + 'static,
    G: GraphStore + 'static,
    S: SearchIndex + 'static,
    L: PartitionedLog + 'static,
{
    pub fn new(
        resource_store: Arc<R>,
        graph_store: Arc<G>,
        search_index: Arc<S>,
        producer: Arc<EventProducer<L>>,
        topics: EventTopics,
    ) -> Self {
        CatalogCoordinator {
            resource_store,
            graph_store,
            search_index,
            producer,
            topics,
        }
    }

    /// Validates, creates in the Resource Store, indexes in Search, and
    /// best-effort publishes `ResourceCreated`.
    /// Failure after step 1 unwinds the Resource Store and Search Index
    /// writes, in LIFO order, before re-raising the original error.
    pub async fn register(&self, mut resource: Resource) -> Result<Resource> {
        let validation = Validator::validate(&resource);
        for warning in &validation.warnings {
            tracing::warn!(warning, "register validation warning");
        }
        if !validation.is_valid {
            return Err(CatalogError::invalid(validation.errors.join("; ")));
        }

        let created = self.resource_store.create(resource.clone()).await?;
        resource = created.clone();

        let mut saga = Saga::new();
        let store_for_compensation = Arc::clone(&self.resource_store);
        let created_id = resource.id;
        saga.push(async move {
            if let Err(err) = store_for_compensation.delete(created_id).await {
                tracing::warn!(error = %err, id = %created_id, "compensation deleteFromResourceStore failed");
            }
        });

        if let Err(err) = self.search_index.index(resource.clone()).await {
            tracing::warn!(error = %err, id = %resource.id, "index write failed, unwinding register");
            saga.unwind().await;
            return Err(err);
        }

        let index_for_compensation = Arc::clone(&self.search_index);
        saga.push(async move {
            if let Err(err) = index_for_compensation.delete(created_id).await {
                tracing::warn!(error = %err, id = %created_id, "compensation deleteFromSearch failed");
            }
        });

        // Best-effort: a relationship referencing this resource needs the
        // graph to already know its projection. Not a saga step — a graph
        // write failure here does not roll back the create.
        if let Err(err) = self.graph_store.upsert_node(ResourceProjection::from(&resource)).await {
            tracing::warn!(error = %err, id = %resource.id, "graph node upsert failed, continuing");
        }

        let event = ResourceCreated {
            id: resource.id,
            resource_type: resource.resource_type,
            name: resource.name.clone(),
            namespace: resource.namespace.clone(),
        };
        if let Err(err) = self
            .producer
            .publish_as(&self.topics.resources, &event, event_type::RESOURCE_CREATED, None)
            .await
        {
            tracing::warn!(error = %err, id = %resource.id, "best-effort ResourceCreated publish failed");
        }

        drop(saga);
        Ok(resource)
    }

    /// Fetches the existing resource, validates the update (including
    /// immutability checks), writes to the Resource Store, best-effort
    /// reindexes (stale index tolerated with a warning), and best-effort
    /// publishes `ResourceUpdated`.
    pub async fn update(&self, resource: Resource) -> Result<Resource> {
        let existing = self.resource_store.get(resource.id).await?;

        let validation = Validator::validate_update(&existing, &resource);
        for warning in &validation.warnings {
            tracing::warn!(warning, "update validation warning");
        }
        if !validation.is_valid {
            return Err(CatalogError::invalid(validation.errors.join("; ")));
        }

        let updated = self.resource_store.update(resource).await?;

        if let Err(err) = self.search_index.index(updated.clone()).await {
            tracing::warn!(error = %err, id = %updated.id, "reindex on update failed, index is stale");
        }
        if let Err(err) = self.graph_store.upsert_node(ResourceProjection::from(&updated)).await {
            tracing::warn!(error = %err, id = %updated.id, "graph node refresh failed, continuing");
        }

        let event = ResourceUpdated {
            id: updated.id,
            resource_type: updated.resource_type,
            name: updated.name.clone(),
            namespace: updated.namespace.clone(),
        };
        if let Err(err) = self
            .producer
            .publish_as(&self.topics.resources, &event, event_type::RESOURCE_UPDATED, None)
            .await
        {
            tracing::warn!(error = %err, id = %updated.id, "best-effort ResourceUpdated publish failed");
        }

        Ok(updated)
    }

    /// Fetches the resource for the event payload, deletes from the
    /// Resource Store (a no-op returns `false`), best-effort deletes from
    /// Search and the Graph, and best-effort publishes `ResourceDeleted`
    ///.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let existing = match self.resource_store.get(id).await {
            Ok(resource) => resource,
            Err(CatalogError::NotFound(_)) => return Ok(false),
            Err(err) => return Err(err),
        };

        if !self.resource_store.delete(id).await? {
            return Ok(false);
        }

        if let Err(err) = self.search_index.delete(id).await {
            tracing::warn!(error = %err, id = %id, "best-effort search delete failed");
        }
        if let Err(err) = self.graph_store.remove_node(id).await {
            tracing::warn!(error = %err, id = %id, "best-effort graph node removal failed");
        }

        let event = ResourceDeleted {
            id,
            resource_type: existing.resource_type,
            name: existing.name,
            namespace: existing.namespace,
        };
        if let Err(err) = self
            .producer
            .publish_as(&self.topics.resources, &event, event_type::RESOURCE_DELETED, None)
            .await
        {
            tracing::warn!(error = %err, id = %id, "best-effort ResourceDeleted publish failed");
        }

        Ok(true)
    }

    /// Creates a typed relationship edge. The Graph Store enforces
    /// endpoint existence, self-loop rejection and per-type acyclicity
    /// atomically — calling it directly, rather than a
    /// separate `HasCycle` probe followed by a create, closes the
    /// check-then-act race a two-step version would have. Publishes
    /// `RelationshipCreated` best-effort on success.
    pub async fn create_relationship(&self, edge: Relationship) -> Result<Relationship> {
        let created = self.graph_store.create_edge(edge).await?;

        let event = RelationshipCreated {
            id: created.id,
            source_id: created.source_id,
            target_id: created.target_id,
            relationship_type: created.relationship_type,
        };
        if let Err(err) = self
            .producer
            .publish_as(&self.topics.relationships, &event, event_type::RELATIONSHIP_CREATED, None)
            .await
        {
            tracing::warn!(error = %err, id = %created.id, "best-effort RelationshipCreated publish failed");
        }

        Ok(created)
    }

    /// Fetches the edge for the event payload, deletes it, and publishes
    /// `RelationshipDeleted` iff the deletion actually removed something
    ///.
    pub async fn delete_relationship(&self, id: Uuid) -> Result<bool> {
        let existing = match self.graph_store.get_edge(id).await {
            Ok(edge) => edge,
            Err(CatalogError::NotFound(_)) => return Ok(false),
            Err(err) => return Err(err),
        };

        if !self.graph_store.delete_edge(id).await? {
            return Ok(false);
        }

        let event = RelationshipDeleted {
            id,
            source_id: existing.source_id,
            target_id: existing.target_id,
            relationship_type: existing.relationship_type,
        };
        if let Err(err) = self
            .producer
            .publish_as(&self.topics.relationships, &event, event_type::RELATIONSHIP_DELETED, None)
            .await
        {
            tracing::warn!(error = %err, id = %id, "best-effort RelationshipDeleted publish failed");
        }

        Ok(true)
    }

    /// Pages the Resource Store in chunks of 1000 and atomically swaps the
    /// Search Index contents. Returns the total resource count.
    pub async fn resynchronise_search_index(&self) -> Result<usize> {
        let mut all = Vec::new();
        let mut page_number = 1;
        loop {
            let page = self.resource_store.page(RESYNC_PAGE_SIZE, page_number).await?;
            if page.is_empty() {
                break;
            }
            let fetched = page.len();
            all.extend(page);
            if fetched < RESYNC_PAGE_SIZE {
                break;
            }
            page_number += 1;
        }

        let total = all.len();
        self.search_index.reindex_all(all).await?;
        Ok(total)
    }
}
