//! Resource Store: the relational metadata source of truth.
//!
//! `ResourceStore` is a contract; the real Postgres-backed driver is named
//! but not designed here. `InMemoryResourceStore` is a reference
//! implementation sufficient to exercise every operation and invariant.

mod memory;

pub use memory::InMemoryResourceStore;

use async_trait::async_trait;
use catalog_models::{Resource, ResourceKey, ResourceType, Result};
use uuid::Uuid;

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Resource>;

    async fn get_by_name(&self, name: &str, namespace: Option<&str>) -> Result<Resource>;

    async fn list_by_type(&self, resource_type: ResourceType) -> Result<Vec<Resource>>;

    async fn list_by_namespace(&self, namespace: &str) -> Result<Vec<Resource>>;

    /// Any-of semantics: a resource is returned if it carries at least one
    /// of `tags`.
    async fn list_by_tags(&self, tags: &[String]) -> Result<Vec<Resource>>;

    /// Assigns `id` if nil, stamps `created_at`/`updated_at`, enforces the
    /// `(type, name, namespace)` uniqueness key. Fails `Conflict` on
    /// collision.
    async fn create(&self, resource: Resource) -> Result<Resource>;

    /// Looks up by id, fails `NotFound` if absent, rewrites mutable fields,
    /// bumps `updated_at`, retains `created_at`/`created_by`.
    async fn update(&self, resource: Resource) -> Result<Resource>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Stable order by `created_at`. `page_number` is 1-based.
    async fn page(&self, page_size: usize, page_number: usize) -> Result<Vec<Resource>>;

    /// Total resource count, used by `ResynchroniseSearchIndex`
    /// to size its chunked scan.
    async fn count(&self) -> Result<usize>;

    async fn key_exists(&self, key: &ResourceKey) -> Result<bool>;
}
