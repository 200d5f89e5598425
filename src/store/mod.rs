//! Document store abstraction.
//!
//! Every service talks to the database through [`DocumentStore`], injected as
//! a [`SharedStore`]. Documents are JSON objects addressed by a collection
//! name and a string id; sub-collections use path-like names such as
//! `crews/{id}/members`.

pub mod capabilities;
pub mod memory;
pub mod postgres;
pub mod query;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

pub use capabilities::Capabilities;
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use query::{Direction, Filter, Op, OrderBy, Query};

/// Field map of a single document.
pub type Fields = Map<String, Value>;

pub type SharedStore = Arc<dyn DocumentStore>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("collection '{0}' does not exist")]
    CollectionMissing(String),

    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_collection_missing(&self) -> bool {
        matches!(self, StoreError::CollectionMissing(_))
    }
}

/// Treats a missing collection as "no data" at call sites that tolerate it.
pub trait StoreResultExt<T> {
    fn or_empty(self) -> StoreResult<T>;
}

impl<T: Default> StoreResultExt<T> for StoreResult<T> {
    fn or_empty(self) -> StoreResult<T> {
        match self {
            Err(StoreError::CollectionMissing(collection)) => {
                tracing::debug!("collection '{}' missing, treating as empty", collection);
                Ok(T::default())
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Deserializes the document into a record type. The document id is
    /// injected as the `id` field so records can carry it.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Decodes documents, skipping (and logging) malformed ones so one legacy
/// record cannot fail a whole listing.
pub fn decode_all<T: DeserializeOwned>(collection: &str, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed {} document {}: {}", collection, doc.id, e);
                None
            }
        })
        .collect()
}

/// Field map from a `json!` object literal; other values yield no fields.
pub fn fields_of(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Serializes a record into a field map, dropping its `id` field.
pub fn to_fields<T: serde::Serialize>(record: &T) -> StoreResult<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(StoreError::Backend(anyhow::anyhow!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Insert {
        collection: String,
        id: String,
        fields: Fields,
    },
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// Writes applied all-or-nothing by [`DocumentStore::commit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, collection: &str, id: &str, fields: Fields) -> Self {
        self.ops.push(WriteOp::Insert {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn update(mut self, collection: &str, id: &str, fields: Fields) -> Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn delete(mut self, collection: &str, id: &str) -> Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of all registered collections.
    async fn collections(&self) -> StoreResult<Vec<String>>;

    /// Registers a collection so reads against it succeed even while empty.
    async fn ensure_collection(&self, collection: &str) -> StoreResult<()>;

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    /// Documents matching the query's filters; ordering and paging are ignored.
    async fn count(&self, collection: &str, query: &Query) -> StoreResult<u64> {
        Ok(self.query(collection, &query.unpaged()).await?.len() as u64)
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Stores a document and returns its id. A missing id is generated; an
    /// existing id is overwritten.
    async fn insert(&self, collection: &str, id: Option<&str>, fields: Fields)
        -> StoreResult<String>;

    /// Shallow-merges `fields` into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        id: String,
        name: String,
    }

    #[test]
    fn decode_injects_document_id() {
        let doc = Document::new("abc", json!({ "name": "x" }).as_object().unwrap().clone());
        let sample: Sample = doc.decode().unwrap();
        assert_eq!(sample.id, "abc");
        assert_eq!(sample.name, "x");
    }

    #[test]
    fn to_fields_drops_id() {
        let fields = to_fields(&Sample {
            id: "abc".to_string(),
            name: "x".to_string(),
        })
        .unwrap();
        assert!(!fields.contains_key("id"));
        assert_eq!(fields["name"], "x");
    }

    #[test]
    fn decode_all_skips_malformed_documents() {
        let docs = vec![
            Document::new("a", json!({ "name": "ok" }).as_object().unwrap().clone()),
            Document::new("b", json!({ "name": 42 }).as_object().unwrap().clone()),
        ];
        let samples: Vec<Sample> = decode_all("samples", docs);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].id, "a");
    }

    #[test]
    fn or_empty_swallows_only_missing_collection() {
        let missing: StoreResult<Vec<Document>> =
            Err(StoreError::CollectionMissing("crews".to_string()));
        assert!(missing.or_empty().unwrap().is_empty());

        let not_found: StoreResult<Vec<Document>> = Err(StoreError::not_found("runs", "r1"));
        assert!(not_found.or_empty().is_err());
    }
}
