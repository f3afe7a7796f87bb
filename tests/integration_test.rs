//! Integration tests for tasklist.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::time::Duration;
use tasklist::config::{BackendKind, TasklistConfig};
use tasklist::services::{BackendFactory, DEFAULT_STORAGE_KEY};
use tasklist::{
    Error, FilesystemKeyValueStore, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore,
    StoreEvent, Task, TaskCollection, TaskId, TaskIntent, TaskStore,
};
use tempfile::TempDir;

#[test]
fn test_error_types() {
    let err = Error::InvalidInput("test message".to_string());
    let display = format!("{err}");
    assert!(display.contains("invalid input"));
    assert!(display.contains("test message"));

    let err = Error::PersistenceWrite {
        key: "tasks".to_string(),
        cause: "disk full".to_string(),
    };
    assert!(err.is_persistence());
    assert!(format!("{err}").contains("disk full"));

    let err = Error::NotFound(TaskId::new("42"));
    assert!(!err.is_persistence());
    assert!(format!("{err}").contains("42"));
}

#[tokio::test]
async fn test_milk_scenario_on_filesystem() {
    let dir = TempDir::new().unwrap();
    let store = TaskStore::new(FilesystemKeyValueStore::new(dir.path()));
    assert!(store.prepare().await.is_empty());

    let task = store.add_task("Buy milk").await.unwrap();
    assert_eq!(store.snapshot().len(), 1);
    assert!(!task.completed);

    let toggled = store.toggle_task(&task.id).await.unwrap();
    assert!(toggled.completed);

    assert!(store.delete_task(&task.id).await.unwrap());
    assert!(store.snapshot().is_empty());

    let blob = std::fs::read_to_string(dir.path().join("tasks.value")).unwrap();
    assert_eq!(blob, "{}");
}

#[tokio::test]
async fn test_reload_across_store_instances_sqlite() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("tasklist.db");

    let first = {
        let store = TaskStore::new(SqliteKeyValueStore::new(&db_path).unwrap());
        store.prepare().await;
        store.add_task("write report").await.unwrap();
        let second = store.add_task("file taxes").await.unwrap();
        store.toggle_task(&second.id).await.unwrap();
        store.snapshot()
    };

    let store = TaskStore::new(SqliteKeyValueStore::new(&db_path).unwrap());
    let loaded = store.load().await.unwrap();
    assert_eq!(loaded, first);

    let ordered = store.ordered();
    assert_eq!(ordered[0].text, "file taxes");
    assert!(ordered[0].completed);
    assert_eq!(ordered[1].text, "write report");
}

#[tokio::test]
async fn test_malformed_blob_prepares_empty_and_is_overwritten() {
    let dir = TempDir::new().unwrap();
    let backend = FilesystemKeyValueStore::with_create(dir.path()).unwrap();
    backend
        .set(DEFAULT_STORAGE_KEY, "not json".to_string())
        .await
        .unwrap();

    let store = TaskStore::new(backend);
    assert!(matches!(store.load().await, Err(Error::Parse(_))));
    assert!(store.prepare().await.is_empty());
    assert!(store.is_ready());

    store.add_task("fresh start").await.unwrap();
    let blob = store.backend().get(DEFAULT_STORAGE_KEY).await.unwrap().unwrap();
    let reparsed = TaskCollection::from_json(&blob).unwrap();
    assert_eq!(reparsed.len(), 1);
}

#[tokio::test]
async fn test_legacy_blob_without_created_at() {
    let legacy = r#"{
        "1700000000000": {"id": "1700000000000", "text": "older", "completed": true},
        "1700000005000": {"id": "1700000005000", "text": "newer", "completed": false}
    }"#;
    let store = TaskStore::new(MemoryKeyValueStore::with_value(DEFAULT_STORAGE_KEY, legacy));
    store.load().await.unwrap();

    let ordered = store.ordered();
    assert_eq!(ordered[0].text, "newer");
    assert_eq!(ordered[0].created_at, 1_700_000_005_000);
    assert_eq!(ordered[1].text, "older");
}

#[tokio::test]
async fn test_store_through_configured_backend() {
    let dir = TempDir::new().unwrap();
    let config = TasklistConfig::default()
        .with_data_dir(dir.path())
        .with_backend(BackendKind::Sqlite);

    let store = TaskStore::with_key(BackendFactory::create(&config).unwrap(), "inbox");
    store.prepare().await;
    let task = store.add_task("configured").await.unwrap();

    let reopened = TaskStore::with_key(BackendFactory::create(&config).unwrap(), "inbox");
    let loaded = reopened.load().await.unwrap();
    assert!(loaded.contains(&task.id));
    assert_eq!(reopened.storage_key(), "inbox");
}

#[tokio::test]
async fn test_dispatch_reports_failed_save() {
    let store = TaskStore::new(MemoryKeyValueStore::new());
    store.prepare().await;
    let mut events = store.events();

    store.backend().set_fail_writes(true);
    let after = store
        .dispatch(TaskIntent::Add {
            text: "lost".to_string(),
        })
        .await;
    assert!(after.is_empty());

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        StoreEvent::SaveFailed { operation, .. } => assert_eq!(operation, "add_task"),
        other => panic!("unexpected event: {}", other.event_type()),
    }
}

#[tokio::test]
async fn test_concurrent_adds_on_filesystem_keep_every_task() {
    let dir = TempDir::new().unwrap();
    let store = std::sync::Arc::new(TaskStore::new(FilesystemKeyValueStore::new(dir.path())));
    store.prepare().await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move { store.add_task(&format!("task {i}")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let reopened = TaskStore::new(FilesystemKeyValueStore::new(dir.path()));
    assert_eq!(reopened.load().await.unwrap().len(), 8);
}

#[tokio::test]
async fn test_updated_task_with_zero_created_at_reloads_unchanged() {
    let dir = TempDir::new().unwrap();
    let store = TaskStore::new(FilesystemKeyValueStore::new(dir.path()));
    store.prepare().await;

    store
        .update_task(Task::new(TaskId::new("1700000000000"), "edited elsewhere", 0))
        .await
        .unwrap();
    let in_memory = store.snapshot();

    let reopened = TaskStore::new(FilesystemKeyValueStore::new(dir.path()));
    let loaded = reopened.load().await.unwrap();
    assert_eq!(loaded, in_memory);
    assert_eq!(
        loaded.get(&TaskId::new("1700000000000")).unwrap().created_at,
        0
    );
}

#[tokio::test]
async fn test_dispatch_reports_unusable_storage_key_as_failed_save() {
    let dir = TempDir::new().unwrap();
    let store = TaskStore::with_key(FilesystemKeyValueStore::new(dir.path()), "../outside");
    store.prepare().await;
    let mut events = store.events();

    let after = store
        .dispatch(TaskIntent::Add {
            text: "nowhere to go".to_string(),
        })
        .await;
    assert!(after.is_empty());

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, StoreEvent::SaveFailed { .. }));
}
