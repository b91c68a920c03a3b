//! Search Index: full-text, prefix, faceted and tag queries over catalog
//! Resources.
//!
//! `SearchIndex` is a contract; the real search-engine driver is named but
//! not designed here. `InMemorySearchIndex` is a reference
//! implementation that honours the ranking contract (name > description >
//! tags, prefix boosted above fuzzy name match in autocomplete) without
//! depending on a live engine.

mod memory;

pub use memory::InMemorySearchIndex;

use async_trait::async_trait;
use catalog_models::{Resource, Result};
use std::collections::BTreeMap;

#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, query: &str, page_size: usize, page_number: usize) -> Result<Vec<Resource>>;

    async fn autocomplete(&self, prefix: &str, limit: usize) -> Result<Vec<Resource>>;

    async fn search_by_type(&self, type_name: &str, match_all: bool) -> Result<Vec<Resource>>;

    async fn search_by_namespace(&self, namespace: &str, match_all: bool) -> Result<Vec<Resource>>;

    async fn search_by_tags(&self, tags: &[String], match_all: bool) -> Result<Vec<Resource>>;

    /// Counts keyed `type:X`, `namespace:X`, `tag:X`. `query`
    /// narrows the population the facets are computed over; `None` facets
    /// the whole index.
    async fn get_facets(&self, query: Option<&str>) -> Result<BTreeMap<String, usize>>;

    async fn index(&self, resource: Resource) -> Result<()>;

    async fn bulk_index(&self, resources: Vec<Resource>) -> Result<()>;

    async fn delete(&self, id: uuid::Uuid) -> Result<()>;

    /// Atomic index swap: delete all, wait, recreate, bulk load.
    async fn reindex_all(&self, all: Vec<Resource>) -> Result<()>;
}
