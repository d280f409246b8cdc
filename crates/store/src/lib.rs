//! Persistence for the village budget portal.
//!
//! This crate keeps the in-memory budget tree in step with a remote document
//! collection:
//! - `document` - Keyed JSON document backends (in-process and OpenDAL)
//! - `budget_store` - The tree owner: load, snapshots, saves and observers
//! - `listener` - Background task applying remote snapshots

pub mod budget_store;
pub mod document;
pub mod error;
pub mod listener;

pub use budget_store::{BudgetStore, SubscriptionId};
pub use document::{CollectionSnapshot, DocumentStore, MemoryDocumentStore, OpendalDocumentStore};
pub use error::StoreError;
pub use listener::{ListenerHandle, SharedBudgetStore, spawn_listener};
