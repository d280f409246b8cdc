//! In-process document collection.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{
    CollectionSnapshot, DocumentStore, Fields, RemoteDocument, SNAPSHOT_BUFFER, merge_fields,
};
use crate::error::StoreError;

/// Documents held in a concurrent map; lost when the process exits.
pub struct MemoryDocumentStore {
    collection: String,
    docs: DashMap<String, Value>,
    snapshots: broadcast::Sender<CollectionSnapshot>,
}

impl MemoryDocumentStore {
    /// Creates an empty collection.
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_BUFFER);
        Self {
            collection: collection.into(),
            docs: DashMap::new(),
            snapshots,
        }
    }

    fn snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot::new(
            self.docs
                .iter()
                .map(|entry| RemoteDocument {
                    key: entry.key().clone(),
                    body: entry.value().clone(),
                })
                .collect(),
        )
    }

    fn publish(&self) {
        // No watchers is not an error.
        let _ = self.snapshots.send(self.snapshot());
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.docs.get(key).map(|doc| doc.value().clone()))
    }

    async fn list(&self) -> Result<CollectionSnapshot, StoreError> {
        Ok(self.snapshot())
    }

    async fn merge(&self, key: &str, fields: Fields) -> Result<(), StoreError> {
        // Merged under the entry's shard lock; the key never leaves the map.
        match self.docs.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let merged = merge_fields(Some(entry.get_mut().take()), fields);
                entry.insert(merged);
            }
            Entry::Vacant(entry) => {
                entry.insert(merge_fields(None, fields));
            }
        }
        self.publish();
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let existed = self.docs.remove(key).is_some();
        if existed {
            self.publish();
        }
        Ok(existed)
    }

    fn watch(&self) -> broadcast::Receiver<CollectionSnapshot> {
        self.snapshots.subscribe()
    }
}
