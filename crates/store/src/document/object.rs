//! Document collection on an OpenDAL operator: one JSON object per key under
//! `{collection}/{key}.json`.

use std::path::Path;

use async_trait::async_trait;
use opendal::{ErrorKind, Operator, services};
use serde_json::Value;
use tokio::sync::{Mutex, broadcast};

use super::{
    CollectionSnapshot, DocumentStore, Fields, RemoteDocument, SNAPSHOT_BUFFER, merge_fields,
};
use crate::error::StoreError;

const EXTENSION: &str = ".json";

/// Document collection backed by any OpenDAL service.
pub struct OpendalDocumentStore {
    operator: Operator,
    collection: String,
    snapshots: broadcast::Sender<CollectionSnapshot>,
    // Serializes read-modify-write merges.
    write_lock: Mutex<()>,
}

impl OpendalDocumentStore {
    /// Wraps an existing operator.
    #[must_use]
    pub fn new(operator: Operator, collection: impl Into<String>) -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_BUFFER);
        Self {
            operator,
            collection: collection.into(),
            snapshots,
            write_lock: Mutex::new(()),
        }
    }

    /// Collection on OpenDAL's in-memory service.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if the operator cannot be built.
    pub fn in_memory(collection: impl Into<String>) -> Result<Self, StoreError> {
        let operator = Operator::new(services::Memory::default())
            .map_err(|e| StoreError::Configuration(e.to_string()))?
            .finish();
        Ok(Self::new(operator, collection))
    }

    /// Collection on the local filesystem below `root`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if the root is not valid UTF-8 or
    /// the operator cannot be built.
    pub fn local_fs(root: &Path, collection: impl Into<String>) -> Result<Self, StoreError> {
        let root = root
            .to_str()
            .ok_or_else(|| StoreError::Configuration("invalid path".to_string()))?;
        let operator = Operator::new(services::Fs::default().root(root))
            .map_err(|e| StoreError::Configuration(e.to_string()))?
            .finish();
        Ok(Self::new(operator, collection))
    }

    fn dir(&self) -> String {
        format!("{}/", self.collection)
    }

    fn path(&self, key: &str) -> Result<String, StoreError> {
        validate_key(key)?;
        Ok(format!("{}/{key}{EXTENSION}", self.collection))
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        match self.operator.read(path).await {
            Ok(buffer) => Ok(Some(serde_json::from_slice(&buffer.to_vec())?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn publish(&self) {
        match self.list().await {
            Ok(snapshot) => {
                let _ = self.snapshots.send(snapshot);
            }
            Err(e) => tracing::warn!(
                collection = %self.collection,
                error = %e,
                "could not read collection snapshot after write"
            ),
        }
    }
}

#[async_trait]
impl DocumentStore for OpendalDocumentStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path(key)?;
        self.read(&path).await
    }

    async fn list(&self) -> Result<CollectionSnapshot, StoreError> {
        let entries = match self.operator.list(&self.dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CollectionSnapshot::default()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(key) = entry.name().strip_suffix(EXTENSION) else {
                continue;
            };
            if validate_key(key).is_err() {
                continue;
            }
            match self.read(entry.path()).await {
                Ok(Some(body)) => documents.push(RemoteDocument {
                    key: key.to_string(),
                    body,
                }),
                Ok(None) => {}
                Err(StoreError::Serialization(e)) => {
                    tracing::warn!(
                        collection = %self.collection,
                        key,
                        error = %e,
                        "skipping unreadable document"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(CollectionSnapshot::new(documents))
    }

    async fn merge(&self, key: &str, fields: Fields) -> Result<(), StoreError> {
        let path = self.path(key)?;
        {
            let _guard = self.write_lock.lock().await;
            let existing = match self.read(&path).await {
                Ok(doc) => doc,
                // Corrupt documents are overwritten.
                Err(StoreError::Serialization(_)) => None,
                Err(e) => return Err(e),
            };
            let body = serde_json::to_vec_pretty(&merge_fields(existing, fields))?;
            self.operator.write(&path, body).await?;
        }
        self.publish().await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path(key)?;
        let existed = {
            let _guard = self.write_lock.lock().await;
            match self.operator.stat(&path).await {
                Ok(_) => {
                    self.operator.delete(&path).await?;
                    true
                }
                Err(e) if e.kind() == ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            }
        };
        if existed {
            self.publish().await;
        }
        Ok(existed)
    }

    fn watch(&self) -> broadcast::Receiver<CollectionSnapshot> {
        self.snapshots.subscribe()
    }
}

/// Keys become file names, so they must be a single non-hidden path segment.
fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
