use crate::ResourceStore;
use async_trait::async_trait;
use catalog_models::{CatalogError, Resource, ResourceKey, ResourceType, Result};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory reference implementation of `ResourceStore`.
///
/// Uniqueness is enforced by a single atomic check-and-insert under the
/// `by_id` write lock (see `create`): two concurrent `create` calls racing
/// on an identical `(type, name, namespace)` resolve to exactly one winner
/// because the scan and the insert happen while holding the same guard.
pub struct InMemoryResourceStore {
    by_id: RwLock<HashMap<Uuid, Resource>>,
}

impl Default for InMemoryResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        InMemoryResourceStore {
            by_id: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn get(&self, id: Uuid) -> Result<Resource> {
        self.by_id
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(format!("resource {id}")))
    }

    async fn get_by_name(&self, name: &str, namespace: Option<&str>) -> Result<Resource> {
        self.by_id
            .read()
            .await
            .values()
            .find(|r| r.name == name && r.namespace.as_deref() == namespace)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(format!("resource named '{name}'")))
    }

    async fn list_by_type(&self, resource_type: ResourceType) -> Result<Vec<Resource>> {
        Ok(self
            .by_id
            .read()
            .await
            .values()
            .filter(|r| r.resource_type == resource_type)
            .cloned()
            .collect())
    }

    async fn list_by_namespace(&self, namespace: &str) -> Result<Vec<Resource>> {
        Ok(self
            .by_id
            .read()
            .await
            .values()
            .filter(|r| r.namespace.as_deref() == Some(namespace))
            .cloned()
            .collect())
    }

    async fn list_by_tags(&self, tags: &[String]) -> Result<Vec<Resource>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .by_id
            .read()
            .await
            .values()
            .filter(|r| tags.iter().any(|t| r.tags.contains(t)))
            .cloned()
            .collect())
    }

    async fn create(&self, mut resource: Resource) -> Result<Resource> {
        if resource.id.is_nil() {
            resource.id = Uuid::new_v4();
        }
        let now = Utc::now();
        resource.created_at = now;
        resource.updated_at = now;

        let key = resource.key();

        let mut guard = self.by_id.write().await;
        if guard.values().any(|r| r.key() == key) {
            return Err(CatalogError::conflict(format!(
                "resource {:?}/{}/{:?} already exists",
                key.resource_type, key.name, key.namespace
            )));
        }
        guard.insert(resource.id, resource.clone());
        tracing::debug!(id = %resource.id, name = %resource.name, "resource created");
        Ok(resource)
    }

    async fn update(&self, mut resource: Resource) -> Result<Resource> {
        let mut guard = self.by_id.write().await;
        let existing = guard
            .get(&resource.id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(format!("resource {}", resource.id)))?;

        resource.created_at = existing.created_at;
        resource.created_by = existing.created_by.clone();
        resource.updated_at = Utc::now();

        guard.insert(resource.id, resource.clone());
        tracing::debug!(id = %resource.id, "resource updated");
        Ok(resource)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut guard = self.by_id.write().await;
        if guard.remove(&id).is_some() {
            tracing::debug!(id = %id, "resource deleted");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn page(&self, page_size: usize, page_number: usize) -> Result<Vec<Resource>> {
        if page_size == 0 || page_number == 0 {
            return Err(CatalogError::invalid(
                "page_size and page_number are 1-based and must be non-zero",
            ));
        }
        let mut all: Vec<Resource> = self.by_id.read().await.values().cloned().collect();
        all.sort_by_key(|r| r.created_at);

        let start = (page_number - 1) * page_size;
        if start >= all.len() {
            return Ok(Vec::new());
        }
        let end = (start + page_size).min(all.len());
        Ok(all[start..end].to_vec())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.by_id.read().await.len())
    }

    async fn key_exists(&self, key: &ResourceKey) -> Result<bool> {
        Ok(self.by_id.read().await.values().any(|r| &r.key() == key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_models::SemanticVersion;
    use std::collections::BTreeMap;

    fn sample(name: &str) -> Resource {
        Resource {
            id: Uuid::nil(),
            resource_type: ResourceType::Service,
            name: name.to_string(),
            namespace: Some("payments".to_string()),
            version: SemanticVersion::parse("1.0.0").unwrap(),
            tags: Vec::new(),
            metadata: BTreeMap::new(),
            properties: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: Some("tester".to_string()),
            active: true,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = InMemoryResourceStore::new();
        let created = store.create(sample("billing-api")).await.unwrap();
        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "billing-api");
    }

    #[tokio::test]
    async fn duplicate_key_conflicts() {
        let store = InMemoryResourceStore::new();
        store.create(sample("billing-api")).await.unwrap();
        let err = store.create(sample("billing-api")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_then_recreate_succeeds() {
        let store = InMemoryResourceStore::new();
        let created = store.create(sample("billing-api")).await.unwrap();
        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        store.create(sample("billing-api")).await.unwrap();
    }

    #[tokio::test]
    async fn update_preserves_created_fields() {
        let store = InMemoryResourceStore::new();
        let created = store.create(sample("billing-api")).await.unwrap();
        let mut update = created.clone();
        update.active = false;
        update.created_at = Utc::now() + chrono::Duration::days(1);
        update.created_by = Some("someone-else".to_string());

        let updated = store.update(update).await.unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.created_by, created.created_by);
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn page_size_and_number_must_be_non_zero() {
        let store = InMemoryResourceStore::new();
        assert!(store.page(0, 1).await.is_err());
        assert!(store.page(1, 0).await.is_err());
    }

    #[tokio::test]
    async fn empty_tag_list_returns_empty() {
        let store = InMemoryResourceStore::new();
        store.create(sample("billing-api")).await.unwrap();
        assert!(store.list_by_tags(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_double_register_exactly_one_wins() {
        let store = std::sync::Arc::new(InMemoryResourceStore::new());
        let a = store.clone();
        let b = store.clone();

        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { a.create(sample("billing-api")).await }),
            tokio::spawn(async move { b.create(sample("billing-api")).await }),
        );
        let results = [r1.unwrap(), r2.unwrap()];
        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        let conflict_count = results
            .iter()
            .filter(|r| matches!(r, Err(CatalogError::Conflict(_))))
            .count();
        assert_eq!(ok_count, 1);
        assert_eq!(conflict_count, 1);
    }
}
