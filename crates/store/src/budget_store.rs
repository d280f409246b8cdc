//! The budget store: owns the in-memory tree and syncs it with the remote
//! collection.
//!
//! Remote snapshots replace the whole year map (last writer wins). Saving is
//! privileged and writes one year as one merged document. Local observers are
//! notified after every snapshot and every successful edit.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use desa_core::PrivilegeGate;
use desa_core::budget::document::UPDATED_AT;
use desa_core::budget::{BudgetError, BudgetTree, YearKey, decode_year, encode_year};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::document::{CollectionSnapshot, DocumentStore};
use crate::error::StoreError;

type Observer = Box<dyn Fn(&BudgetTree) + Send + Sync>;

/// Handle returned by [`BudgetStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// In-memory budget tree bound to a document collection.
pub struct BudgetStore {
    backend: Arc<dyn DocumentStore>,
    tree: BudgetTree,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl fmt::Debug for BudgetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BudgetStore")
            .field("collection", &self.backend.collection())
            .field("years", &self.tree.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl BudgetStore {
    /// Creates a store with an empty tree.
    #[must_use]
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self {
            backend,
            tree: BudgetTree::new(),
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// The current tree.
    #[must_use]
    pub fn tree(&self) -> &BudgetTree {
        &self.tree
    }

    /// The document backend.
    #[must_use]
    pub fn backend(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.backend)
    }

    /// Reads the whole collection and replaces the tree with it.
    ///
    /// Returns the number of years loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read; the tree is untouched.
    pub async fn load(&mut self) -> Result<usize, StoreError> {
        let snapshot = self.backend.list().await.inspect_err(|e| {
            error!(collection = %self.backend.collection(), error = %e, "failed to load budget years");
        })?;
        let years = self.apply_snapshot(&snapshot);
        info!(collection = %self.backend.collection(), years, "budget years loaded");
        Ok(years)
    }

    /// Replaces the entire year map with the snapshot's documents.
    ///
    /// Unsaved local edits are dropped. Malformed documents are degraded to
    /// defaults and logged; documents without any usable year are skipped.
    pub fn apply_snapshot(&mut self, snapshot: &CollectionSnapshot) -> usize {
        let mut years = Vec::with_capacity(snapshot.len());
        for doc in &snapshot.documents {
            match decode_year(&doc.key, &doc.body) {
                Ok(decoded) => {
                    if !decoded.issues.is_empty() {
                        warn!(key = %doc.key, issues = ?decoded.issues, "degraded budget document");
                    }
                    years.push(decoded.year);
                }
                Err(e) => warn!(key = %doc.key, error = %e, "skipping budget document"),
            }
        }

        self.tree.replace_all(years);
        debug!(years = self.tree.len(), "snapshot applied");
        self.notify();
        self.tree.len()
    }

    /// Runs a mutation against the tree, notifying observers when it succeeds.
    ///
    /// # Errors
    ///
    /// Returns whatever the mutation returns; observers are not notified then.
    pub fn edit<T, E>(
        &mut self,
        f: impl FnOnce(&mut BudgetTree) -> Result<T, E>,
    ) -> Result<T, E> {
        let out = f(&mut self.tree)?;
        self.notify();
        Ok(out)
    }

    /// Persists one year as a single document, merged into whatever the
    /// remote already holds and stamped with `updated_at`.
    ///
    /// # Errors
    ///
    /// - `StoreError::PermissionDenied` when the gate says no.
    /// - `StoreError::Budget(YearNotFound)` when the year is not in the tree.
    /// - `StoreError::Persistence` when the write fails; local edits stay.
    pub async fn save_year<G: PrivilegeGate + ?Sized>(
        &self,
        gate: &G,
        key: &YearKey,
    ) -> Result<(), StoreError> {
        if !gate.is_privileged() {
            return Err(StoreError::PermissionDenied);
        }
        let year = self
            .tree
            .get(key)
            .ok_or_else(|| BudgetError::YearNotFound(key.to_string()))?;

        let mut fields = encode_year(year);
        fields.insert(UPDATED_AT.to_string(), Value::String(Utc::now().to_rfc3339()));

        self.backend
            .merge(key.as_str(), fields)
            .await
            .inspect_err(|e| error!(year = %key, error = %e, "failed to save budget year"))?;

        info!(year = %key, total = year.total, sectors = year.sectors.len(), "budget year saved");
        Ok(())
    }

    /// Registers an observer called with the tree after every change.
    pub fn subscribe(&mut self, observer: impl Fn(&BudgetTree) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer; returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&self) {
        for (_, observer) in &self.observers {
            observer(&self.tree);
        }
    }
}
