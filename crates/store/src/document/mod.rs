//! Keyed JSON document collections with live snapshots.
//!
//! A backend holds one collection (one document per budget year) and
//! broadcasts the full collection after every write, the way a realtime
//! database pushes query snapshots to its listeners.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     DocumentStore                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │ get(key)   list()   merge(key, fields)   delete(key)         │
//! │ watch() ──► broadcast::Receiver<CollectionSnapshot>          │
//! ├─────────────────────────────┬────────────────────────────────┤
//! │ MemoryDocumentStore         │ OpendalDocumentStore           │
//! │ (DashMap, in-process)       │ ({collection}/{key}.json)      │
//! └─────────────────────────────┴────────────────────────────────┘
//! ```

mod memory;
mod object;

use std::sync::Arc;

use async_trait::async_trait;
use desa_shared::config::{StoreConfig, StoreProvider};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::error::StoreError;

pub use self::memory::MemoryDocumentStore;
pub use self::object::OpendalDocumentStore;

/// Snapshots buffered per watcher before it starts lagging.
pub(crate) const SNAPSHOT_BUFFER: usize = 16;

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

/// One document as read from the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    /// Document key (the budget year).
    pub key: String,
    /// Raw document body.
    pub body: Value,
}

/// The whole collection at one point in time, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSnapshot {
    /// Documents in the collection.
    pub documents: Vec<RemoteDocument>,
}

impl CollectionSnapshot {
    /// Builds a snapshot, sorting documents by key.
    #[must_use]
    pub fn new(mut documents: Vec<RemoteDocument>) -> Self {
        documents.sort_by(|a, b| a.key.cmp(&b.key));
        Self { documents }
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// A keyed JSON document collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Collection name, for logs.
    fn collection(&self) -> &str;

    /// Reads one document.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Reads the whole collection.
    async fn list(&self) -> Result<CollectionSnapshot, StoreError>;

    /// Creates the document or overwrites the given top-level fields,
    /// keeping every other field already present.
    async fn merge(&self, key: &str, fields: Fields) -> Result<(), StoreError>;

    /// Deletes a document; returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Subscribes to collection snapshots pushed after every write.
    fn watch(&self) -> broadcast::Receiver<CollectionSnapshot>;
}

/// Overwrites `fields` into `existing`, replacing it when it is not an object.
pub(crate) fn merge_fields(existing: Option<Value>, fields: Fields) -> Value {
    let mut merged = match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    merged.extend(fields);
    Value::Object(merged)
}

/// Builds the configured backend.
///
/// # Errors
///
/// Returns `StoreError::Configuration` if the backend cannot be initialized.
pub fn from_config(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match &config.provider {
        StoreProvider::Memory => Ok(Arc::new(MemoryDocumentStore::new(&config.collection))),
        StoreProvider::LocalFs { root } => Ok(Arc::new(OpendalDocumentStore::local_fs(
            root,
            &config.collection,
        )?)),
    }
}
