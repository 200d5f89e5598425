use super::{
    merge_fields, new_document_id, Document, DocumentStore, Fields, Query, StoreError,
    StoreResult, WriteBatch, WriteOp,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

type Collections = HashMap<String, Vec<Document>>;

/// In-process document store. Collections keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the given collections already registered.
    pub fn with_collections(names: &[&str]) -> Self {
        let collections = names
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        Self {
            collections: RwLock::new(collections),
        }
    }
}

fn apply_op(collections: &mut Collections, op: WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Insert {
            collection,
            id,
            fields,
        } => {
            let docs = collections.entry(collection).or_default();
            match docs.iter_mut().find(|d| d.id == id) {
                Some(existing) => existing.fields = fields,
                None => docs.push(Document::new(id, fields)),
            }
        }
        WriteOp::Update {
            collection,
            id,
            fields,
        } => {
            let existing = collections
                .get_mut(&collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
                .ok_or_else(|| StoreError::not_found(&collection, &id))?;
            merge_fields(&mut existing.fields, fields);
        }
        WriteOp::Delete { collection, id } => {
            if let Some(docs) = collections.get_mut(&collection) {
                docs.retain(|d| d.id != id);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn collections(&self) -> StoreResult<Vec<String>> {
        let guard = self.collections.read().await;
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn ensure_collection(&self, collection: &str) -> StoreResult<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        let guard = self.collections.read().await;
        let docs = guard
            .get(collection)
            .ok_or_else(|| StoreError::CollectionMissing(collection.to_string()))?;
        Ok(query.apply(docs.iter().cloned()))
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let guard = self.collections.read().await;
        let docs = guard
            .get(collection)
            .ok_or_else(|| StoreError::CollectionMissing(collection.to_string()))?;
        Ok(docs.iter().find(|d| d.id == id).cloned())
    }

    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Fields,
    ) -> StoreResult<String> {
        let id = id.map(str::to_string).unwrap_or_else(new_document_id);
        let mut guard = self.collections.write().await;
        apply_op(
            &mut guard,
            WriteOp::Insert {
                collection: collection.to_string(),
                id: id.clone(),
                fields,
            },
        )?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut guard = self.collections.write().await;
        apply_op(
            &mut guard,
            WriteOp::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            },
        )
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut guard = self.collections.write().await;
        apply_op(
            &mut guard,
            WriteOp::Delete {
                collection: collection.to_string(),
                id: id.to_string(),
            },
        )
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut guard = self.collections.write().await;
        // Stage on a copy so a failing op leaves the store untouched.
        let mut staged = guard.clone();
        for op in batch.into_ops() {
            apply_op(&mut staged, op)?;
        }
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Filter;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn insert_generates_id_and_get_returns_document() {
        let store = MemoryStore::new();
        let id = store
            .insert("runs", None, fields(json!({ "raceName": "Seoul Marathon" })))
            .await
            .unwrap();

        let doc = store.get_by_id("runs", &id).await.unwrap().unwrap();
        assert_eq!(doc.get_str("raceName"), Some("Seoul Marathon"));
    }

    #[tokio::test]
    async fn reading_unregistered_collection_is_collection_missing() {
        let store = MemoryStore::new();
        let err = store.query("crews", &Query::new()).await.unwrap_err();
        assert!(err.is_collection_missing());

        store.ensure_collection("crews").await.unwrap();
        assert!(store.query("crews", &Query::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_and_reports_missing_documents() {
        let store = MemoryStore::with_collections(&["reports"]);
        store
            .insert("reports", Some("r1"), fields(json!({ "status": "pending", "type": "run" })))
            .await
            .unwrap();

        store
            .update("reports", "r1", fields(json!({ "status": "resolved" })))
            .await
            .unwrap();
        let doc = store.get_by_id("reports", "r1").await.unwrap().unwrap();
        assert_eq!(doc.get_str("status"), Some("resolved"));
        assert_eq!(doc.get_str("type"), Some("run"));

        let err = store
            .update("reports", "missing", fields(json!({ "status": "resolved" })))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::with_collections(&["runs"]);
        store
            .insert("runs", Some("r1"), Fields::new())
            .await
            .unwrap();
        store.delete("runs", "r1").await.unwrap();
        store.delete("runs", "r1").await.unwrap();
        store.delete("never_created", "r1").await.unwrap();
        assert!(store.get_by_id("runs", "r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_batch_applies_nothing() {
        let store = MemoryStore::with_collections(&["runs", "reports"]);
        store
            .insert("runs", Some("r1"), Fields::new())
            .await
            .unwrap();

        let batch = WriteBatch::new()
            .delete("runs", "r1")
            .update("reports", "gone", fields(json!({ "status": "resolved" })));
        let err = store.commit(batch).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(store.get_by_id("runs", "r1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn query_keeps_insertion_order_without_order_by() {
        let store = MemoryStore::new();
        for name in ["b", "a", "c"] {
            store
                .insert("runs", Some(name), fields(json!({ "kind": "race" })))
                .await
                .unwrap();
        }
        let docs = store
            .query("runs", &Query::new().filter(Filter::eq("kind", "race")))
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
