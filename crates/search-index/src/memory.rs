use crate::SearchIndex;
use async_trait::async_trait;
use catalog_models::{CatalogError, Resource, Result};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

const NAME_WEIGHT: f64 = 3.0;
const DESCRIPTION_WEIGHT: f64 = 2.0;
const TAG_WEIGHT: f64 = 1.0;

#[derive(Default)]
pub struct InMemorySearchIndex {
    documents: RwLock<BTreeMap<Uuid, Resource>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn description_of(resource: &Resource) -> String {
        resource
            .properties
            .get("description")
            .cloned()
            .unwrap_or_default()
    }

    /// Multi-field relevance score: name weighted highest, description
    /// next, tags lowest. Fuzzy matching applies to the name
    /// field via Jaro-Winkler similarity.
    fn score(resource: &Resource, query: &str) -> f64 {
        let query = query.to_lowercase();
        if query.is_empty() {
            return 0.0;
        }

        let name = resource.name.to_lowercase();
        let name_score = if name.contains(&query) {
            1.0
        } else {
            strsim::jaro_winkler(&name, &query)
        };

        let description = Self::description_of(resource).to_lowercase();
        let description_score = if description.contains(&query) {
            1.0
        } else {
            0.0
        };

        let tag_score = if resource
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(&query))
        {
            1.0
        } else {
            0.0
        };

        name_score * NAME_WEIGHT + description_score * DESCRIPTION_WEIGHT + tag_score * TAG_WEIGHT
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn search(&self, query: &str, page_size: usize, page_number: usize) -> Result<Vec<Resource>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        if page_size == 0 || page_number == 0 {
            return Err(CatalogError::invalid(
                "page_size and page_number are 1-based and must be non-zero",
            ));
        }

        let docs = self.documents.read().await;
        let mut scored: Vec<(f64, &Resource)> = docs
            .values()
            .map(|r| (Self::score(r, query), r))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

        let start = (page_number - 1) * page_size;
        if start >= scored.len() {
            return Ok(Vec::new());
        }
        let end = (start + page_size).min(scored.len());
        Ok(scored[start..end].iter().map(|(_, r)| (*r).clone()).collect())
    }

    async fn autocomplete(&self, prefix: &str, limit: usize) -> Result<Vec<Resource>> {
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        let prefix_lower = prefix.to_lowercase();

        let docs = self.documents.read().await;
        let mut scored: Vec<(f64, &Resource)> = docs
            .values()
            .filter_map(|r| {
                let name = r.name.to_lowercase();
                if name.starts_with(&prefix_lower) {
                    // Prefix matches are boosted above any fuzzy match.
                    Some((1000.0 + name.len() as f64, r))
                } else {
                    let fuzzy = strsim::jaro_winkler(&name, &prefix_lower);
                    (fuzzy > 0.7).then_some((fuzzy, r))
                }
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(_, r)| r.clone()).collect())
    }

    async fn search_by_type(&self, type_name: &str, match_all: bool) -> Result<Vec<Resource>> {
        let _ = match_all; // single-valued field: match_all is a no-op for type
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|r| r.resource_type.to_string().eq_ignore_ascii_case(type_name))
            .cloned()
            .collect())
    }

    async fn search_by_namespace(&self, namespace: &str, match_all: bool) -> Result<Vec<Resource>> {
        let _ = match_all;
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|r| r.namespace.as_deref() == Some(namespace))
            .cloned()
            .collect())
    }

    async fn search_by_tags(&self, tags: &[String], match_all: bool) -> Result<Vec<Resource>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|r| {
                if match_all {
                    tags.iter().all(|t| r.tags.contains(t))
                } else {
                    tags.iter().any(|t| r.tags.contains(t))
                }
            })
            .cloned()
            .collect())
    }

    async fn get_facets(&self, query: Option<&str>) -> Result<BTreeMap<String, usize>> {
        let docs = self.documents.read().await;
        let population: Vec<&Resource> = match query {
            Some(q) if !q.trim().is_empty() => {
                docs.values().filter(|r| Self::score(r, q) > 0.0).collect()
            }
            _ => docs.values().collect(),
        };

        let mut facets = BTreeMap::new();
        for resource in population {
            *facets
                .entry(format!("type:{}", resource.resource_type))
                .or_insert(0) += 1;
            if let Some(ns) = &resource.namespace {
                *facets.entry(format!("namespace:{ns}")).or_insert(0) += 1;
            }
            for tag in &resource.tags {
                *facets.entry(format!("tag:{tag}")).or_insert(0) += 1;
            }
        }
        Ok(facets)
    }

    async fn index(&self, resource: Resource) -> Result<()> {
        self.documents.write().await.insert(resource.id, resource);
        Ok(())
    }

    async fn bulk_index(&self, resources: Vec<Resource>) -> Result<()> {
        let mut docs = self.documents.write().await;
        for resource in resources {
            docs.insert(resource.id, resource);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.documents.write().await.remove(&id);
        Ok(())
    }

    async fn reindex_all(&self, all: Vec<Resource>) -> Result<()> {
        {
            let mut docs = self.documents.write().await;
            docs.clear();
        }
        tokio::task::yield_now().await;
        self.bulk_index(all).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_models::{ResourceType, SemanticVersion};
    use chrono::Utc;
    use std::collections::BTreeMap as Map;

    fn resource(name: &str, tags: &[&str]) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            resource_type: ResourceType::Service,
            name: name.to_string(),
            namespace: Some("payments".to_string()),
            version: SemanticVersion::parse("1.0.0").unwrap(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            metadata: Map::new(),
            properties: Map::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn empty_query_returns_empty() {
        let idx = InMemorySearchIndex::new();
        idx.index(resource("billing-api", &["prod"])).await.unwrap();
        assert!(idx.search("", 10, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn prefix_boosted_above_fuzzy_in_autocomplete() {
        let idx = InMemorySearchIndex::new();
        idx.index(resource("billing-api", &[])).await.unwrap();
        idx.index(resource("biling-svc", &[])).await.unwrap(); // fuzzy-close, not prefix
        let results = idx.autocomplete("billing", 5).await.unwrap();
        assert_eq!(results[0].name, "billing-api");
    }

    #[tokio::test]
    async fn facets_count_type_and_tags() {
        let idx = InMemorySearchIndex::new();
        for i in 0..3 {
            idx.index(resource(&format!("svc-prod-{i}"), &["prod"]))
                .await
                .unwrap();
        }
        for i in 0..2 {
            idx.index(resource(&format!("svc-dev-{i}"), &["dev"]))
                .await
                .unwrap();
        }
        let facets = idx.get_facets(None).await.unwrap();
        assert_eq!(facets.get("tag:prod"), Some(&3));
        assert_eq!(facets.get("tag:dev"), Some(&2));
        assert_eq!(facets.get("type:Service"), Some(&5));
    }

    #[tokio::test]
    async fn reindex_all_is_equivalent_to_incremental_indexing() {
        let idx = InMemorySearchIndex::new();
        let a = resource("billing-api", &["prod"]);
        let b = resource("reporting-svc", &["prod"]);
        idx.index(a.clone()).await.unwrap();
        idx.index(b.clone()).await.unwrap();
        let before = idx.search("billing", 10, 1).await.unwrap();

        idx.reindex_all(vec![a, b]).await.unwrap();
        let after = idx.search("billing", 10, 1).await.unwrap();
        assert_eq!(before.len(), after.len());
    }

    #[tokio::test]
    async fn empty_tag_filter_returns_empty() {
        let idx = InMemorySearchIndex::new();
        idx.index(resource("billing-api", &["prod"])).await.unwrap();
        assert!(idx.search_by_tags(&[], true).await.unwrap().is_empty());
    }
}
