//! In-process document store.
//!
//! Selected with a `memory://` connection string. Data lives for the lifetime
//! of the process.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Collection, DocumentStore, Filter, RepositoryError, Update, document_id};

/// Document store backed by per-collection vectors behind a `RwLock`.
///
/// Vectors keep insertion order, which `find` preserves.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Value>, RepositoryError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Value>, RepositoryError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)).cloned()))
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Value,
    ) -> Result<(), RepositoryError> {
        let id = document_id(&document)?.to_owned();
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        if docs
            .iter()
            .any(|doc| doc.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(RepositoryError::Conflict(format!(
                "{collection} already contains id {id}"
            )));
        }

        docs.push(document);
        Ok(())
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, RepositoryError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| filter.matches(doc)))
        else {
            return Ok(0);
        };

        update.apply_to(doc);
        Ok(1)
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, RepositoryError> {
        let collections = self.collections.read().await;
        let count = collections
            .get(&collection)
            .map_or(0, |docs| docs.iter().filter(|doc| filter.matches(doc)).count());
        Ok(count as u64)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn close(&self) {
        tracing::debug!("In-memory document store closed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_insert_and_find_preserves_order() {
        let store = MemoryDocumentStore::new();
        for (id, featured) in [("a", true), ("b", false), ("c", true)] {
            store
                .insert_one(
                    Collection::Products,
                    json!({"id": id, "featured": featured}),
                )
                .await
                .unwrap();
        }

        let featured = store
            .find(
                Collection::Products,
                &Filter::all().where_eq("featured", true),
                100,
            )
            .await
            .unwrap();
        let ids: Vec<_> = featured.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["a", "c"]);

        let capped = store
            .find(Collection::Products, &Filter::all(), 2)
            .await
            .unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let store = MemoryDocumentStore::new();
        store
            .insert_one(Collection::Orders, json!({"id": "o1"}))
            .await
            .unwrap();

        assert_eq!(
            store
                .count(Collection::Products, &Filter::all())
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            store.count(Collection::Orders, &Filter::all()).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let store = MemoryDocumentStore::new();
        store
            .insert_one(Collection::Orders, json!({"id": "o1"}))
            .await
            .unwrap();

        let err = store
            .insert_one(Collection::Orders, json!({"id": "o1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_one_reports_matches() {
        let store = MemoryDocumentStore::new();
        store
            .insert_one(
                Collection::Orders,
                json!({"id": "o1", "status": "pending"}),
            )
            .await
            .unwrap();

        let update = Update::new().set("status", "paid").unwrap();
        let matched = store
            .update_one(Collection::Orders, &Filter::by_id("o1"), &update)
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let missing = store
            .update_one(Collection::Orders, &Filter::by_id("nope"), &update)
            .await
            .unwrap();
        assert_eq!(missing, 0);

        let doc = store
            .find_one(Collection::Orders, &Filter::by_id("o1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["status"], "paid");
    }

    #[tokio::test]
    async fn test_insert_rejects_documents_without_id() {
        let store = MemoryDocumentStore::new();
        let err = store
            .insert_one(Collection::Products, json!({"name": "Cumin"}))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidDocument(_)));
    }
}
