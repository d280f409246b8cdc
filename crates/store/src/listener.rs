//! Background task pumping remote snapshots into a shared budget store.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::budget_store::BudgetStore;

/// Budget store shared between request handlers and the snapshot listener.
pub type SharedBudgetStore = Arc<Mutex<BudgetStore>>;

/// Running snapshot listener.
#[derive(Debug)]
pub struct ListenerHandle {
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stops listening; no snapshot is applied after this returns.
    pub fn stop(self) {
        self.task.abort();
    }

    /// Whether the listener task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Subscribes to the store's backend and applies every snapshot it pushes.
///
/// Must be called inside a Tokio runtime.
pub async fn spawn_listener(store: SharedBudgetStore) -> ListenerHandle {
    let backend = store.lock().await.backend();
    let mut snapshots = backend.watch();
    let collection = backend.collection().to_string();

    let task = tokio::spawn(async move {
        info!(%collection, "budget snapshot listener started");
        loop {
            match snapshots.recv().await {
                Ok(snapshot) => {
                    let years = store.lock().await.apply_snapshot(&snapshot);
                    info!(%collection, years, "remote budget snapshot applied");
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Every snapshot is complete, so the next one catches up.
                    warn!(%collection, skipped, "budget snapshot listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!(%collection, "budget snapshot listener stopped");
    });

    ListenerHandle { task }
}
