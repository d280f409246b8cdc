//! End-to-end behaviour of the budget store against real backends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use desa_core::budget::{BudgetEditor, Field, FieldPath, YearKey};
use desa_core::privilege::StaticPrivilege;
use desa_store::document::Fields;
use desa_store::{
    BudgetStore, CollectionSnapshot, DocumentStore, MemoryDocumentStore, OpendalDocumentStore,
    StoreError, spawn_listener,
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tokio::sync::{Mutex, broadcast};

const ADMIN: StaticPrivilege = StaticPrivilege(true);

fn key(raw: &str) -> YearKey {
    YearKey::parse(raw).unwrap()
}

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Builds a year with one sub-item and a total, ready to save.
fn edit_sample_year(store: &mut BudgetStore, year: &YearKey) {
    let editor = BudgetEditor::new(ADMIN);
    store
        .edit(|tree| {
            let opened = editor.open_year(tree, year)?;
            let sector = opened.summary.sectors[0].id.clone();
            editor.set_field(tree, year, &FieldPath::total(), "Rp 100.000.000")?;
            let sub = match editor.add_sub(tree, year, &sector)?.created {
                Some(desa_core::budget::NodeRef::SubItem { id, .. }) => id,
                other => panic!("unexpected {other:?}"),
            };
            editor.set_field(tree, year, &FieldPath::sub(sector.clone(), sub.clone(), Field::Name), "Beasiswa")?;
            editor.set_field(tree, year, &FieldPath::sub(sector.clone(), sub.clone(), Field::Percentage), "50")?;
            editor.set_field(tree, year, &FieldPath::sub(sector, sub, Field::Note), "Program 2025")
        })
        .unwrap();
}

#[tokio::test]
async fn persist_then_reload_yields_equal_tree() {
    let dir = tempfile::tempdir().unwrap();
    let backend: Arc<dyn DocumentStore> =
        Arc::new(OpendalDocumentStore::local_fs(dir.path(), "apbdes").unwrap());
    let year = key("2025");

    let mut writer = BudgetStore::new(Arc::clone(&backend));
    edit_sample_year(&mut writer, &year);
    writer.save_year(&ADMIN, &year).await.unwrap();

    let mut reader = BudgetStore::new(backend);
    assert_eq!(reader.load().await.unwrap(), 1);
    assert_eq!(reader.tree(), writer.tree());

    let sector = &reader.tree().get(&year).unwrap().sectors[0];
    assert_eq!(sector.subs[0].percentage.value(), dec!(50));
}

#[tokio::test]
async fn save_merges_with_out_of_band_fields() {
    let backend = Arc::new(MemoryDocumentStore::new("apbdes"));
    backend
        .merge("2025", fields(json!({ "approved_by": "Kepala Desa", "total": 1 })))
        .await
        .unwrap();

    let mut store = BudgetStore::new(backend.clone());
    store.load().await.unwrap();
    let year = key("2025");
    store
        .edit(|tree| BudgetEditor::new(ADMIN).set_field(tree, &year, &FieldPath::total(), "500"))
        .unwrap();
    store.save_year(&ADMIN, &year).await.unwrap();

    let doc = backend.get("2025").await.unwrap().unwrap();
    assert_eq!(doc["approved_by"], "Kepala Desa");
    assert_eq!(doc["total"], 500);
    assert_eq!(doc["year"], "2025");
    assert!(doc["updated_at"].is_string());
    assert_eq!(doc["sectors"], json!([]));
}

#[tokio::test]
async fn malformed_documents_degrade_on_load() {
    let backend = Arc::new(MemoryDocumentStore::new("apbdes"));
    backend
        .merge("2024", fields(json!({ "total": "1.250.000" })))
        .await
        .unwrap();
    backend
        .merge("2023", fields(json!({ "year": 2023, "sectors": "nope" })))
        .await
        .unwrap();

    let mut store = BudgetStore::new(backend);
    assert_eq!(store.load().await.unwrap(), 2);

    let y2024 = store.tree().get(&key("2024")).unwrap();
    assert_eq!(y2024.total, 1_250_000);
    assert!(y2024.sectors.is_empty());
    let y2023 = store.tree().get(&key("2023")).unwrap();
    assert_eq!(y2023.total, 0);
}

/// Backend whose writes always fail.
struct OfflineStore {
    snapshots: broadcast::Sender<CollectionSnapshot>,
}

#[async_trait]
impl DocumentStore for OfflineStore {
    fn collection(&self) -> &str {
        "apbdes"
    }

    async fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
        Ok(None)
    }

    async fn list(&self) -> Result<CollectionSnapshot, StoreError> {
        Ok(CollectionSnapshot::default())
    }

    async fn merge(&self, _key: &str, _fields: Fields) -> Result<(), StoreError> {
        Err(StoreError::persistence("permission rules rejected the write"))
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::persistence("offline"))
    }

    fn watch(&self) -> broadcast::Receiver<CollectionSnapshot> {
        self.snapshots.subscribe()
    }
}

#[tokio::test]
async fn failed_save_keeps_local_edits() {
    let (snapshots, _) = broadcast::channel(1);
    let mut store = BudgetStore::new(Arc::new(OfflineStore { snapshots }));
    let year = key("2025");
    edit_sample_year(&mut store, &year);
    let before = store.tree().clone();

    let err = store.save_year(&ADMIN, &year).await.unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert_eq!(store.tree(), &before);
}

#[tokio::test]
async fn snapshot_during_edit_replaces_year() {
    let backend = Arc::new(MemoryDocumentStore::new("apbdes"));
    let mut store = BudgetStore::new(backend.clone());
    let year = key("2025");
    edit_sample_year(&mut store, &year);

    // Another admin saves the same year before this edit is persisted.
    backend
        .merge("2025", fields(json!({ "year": "2025", "total": 7, "sectors": [] })))
        .await
        .unwrap();
    let snapshot = backend.list().await.unwrap();
    store.apply_snapshot(&snapshot);

    let replaced = store.tree().get(&year).unwrap();
    assert_eq!(replaced.total, 7);
    assert!(replaced.sectors.is_empty());
}

#[tokio::test]
async fn listener_applies_remote_writes_until_stopped() {
    let backend = Arc::new(MemoryDocumentStore::new("apbdes"));
    let shared = Arc::new(Mutex::new(BudgetStore::new(backend.clone())));
    let handle = spawn_listener(Arc::clone(&shared)).await;
    assert!(handle.is_running());

    backend
        .merge("2026", fields(json!({ "year": "2026", "total": 42 })))
        .await
        .unwrap();

    let applied = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if shared.lock().await.tree().get(&key("2026")).is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(applied.is_ok(), "snapshot was not applied");

    handle.stop();
    tokio::time::sleep(Duration::from_millis(20)).await;
    backend
        .merge("2027", fields(json!({ "year": "2027" })))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(shared.lock().await.tree().get(&key("2027")).is_none());
}
