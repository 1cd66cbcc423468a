//! Tests for the in-memory and JSON-lines batch stores

use tempfile::TempDir;
use tokio::fs;

use super::common::test_batch;
use crate::services::batch_store::{FileBatchStore, InMemoryBatchStore};
use crate::traits::BatchStore;
use shared::GroupId;

#[tokio::test]
async fn test_in_memory_history_is_newest_first() {
    let store = InMemoryBatchStore::new();
    let older = test_batch("g1", 1);
    let newer = test_batch("g1", 5);

    store.append(&newer).await.unwrap();
    store.append(&older).await.unwrap();

    let history = store.history(&GroupId::from("g1")).await.unwrap();
    let ids: Vec<_> = history.iter().map(|batch| batch.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    let latest = store.latest(&GroupId::from("g1")).await.unwrap();
    assert_eq!(latest.map(|batch| batch.id), Some(newer.id));
}

#[tokio::test]
async fn test_in_memory_same_timestamp_prefers_later_append() {
    let store = InMemoryBatchStore::new();
    let first = test_batch("g1", 3);
    let second = test_batch("g1", 3);

    store.append(&first).await.unwrap();
    store.append(&second).await.unwrap();

    let latest = store.latest(&GroupId::from("g1")).await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);
}

#[tokio::test]
async fn test_in_memory_groups_are_isolated() {
    let store = InMemoryBatchStore::new();
    store.append(&test_batch("g1", 1)).await.unwrap();

    assert!(store.latest(&GroupId::from("g2")).await.unwrap().is_none());
    assert!(store.history(&GroupId::from("g2")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_store_round_trips_batches() {
    let dir = TempDir::new().unwrap();
    let store = FileBatchStore::new(dir.path().to_path_buf());
    let older = test_batch("g1", 1);
    let newer = test_batch("g1", 2);

    store.append(&older).await.unwrap();
    store.append(&newer).await.unwrap();

    let history = store.history(&GroupId::from("g1")).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], newer);
    assert_eq!(history[1], older);

    // A second store over the same directory sees the same history
    let reopened = FileBatchStore::new(dir.path().to_path_buf());
    let latest = reopened.latest(&GroupId::from("g1")).await.unwrap();
    assert_eq!(latest, Some(newer));
}

#[tokio::test]
async fn test_file_store_missing_group_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = FileBatchStore::new(dir.path().to_path_buf());

    assert!(store.history(&GroupId::from("nobody")).await.unwrap().is_empty());
    assert!(store.latest(&GroupId::from("nobody")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_store_skips_unreadable_lines() {
    let dir = TempDir::new().unwrap();
    let store = FileBatchStore::new(dir.path().to_path_buf());
    let batch = test_batch("g1", 1);
    store.append(&batch).await.unwrap();

    let path = dir.path().join("g1").join("batches.jsonl");
    let mut content = fs::read_to_string(&path).await.unwrap();
    content.push_str("{\"truncated\": \n");
    fs::write(&path, content).await.unwrap();

    let history = store.history(&GroupId::from("g1")).await.unwrap();
    assert_eq!(history, vec![batch]);
}

#[tokio::test]
async fn test_file_store_sanitizes_group_directory() {
    let dir = TempDir::new().unwrap();
    let store = FileBatchStore::new(dir.path().to_path_buf());
    let batch = test_batch("../escape", 1);

    store.append(&batch).await.unwrap();

    assert!(dir.path().join("___escape").join("batches.jsonl").exists());
    let history = store.history(&GroupId::from("../escape")).await.unwrap();
    assert_eq!(history.len(), 1);

    // Another id sanitized to the same directory does not see the batch
    let other = store.history(&GroupId::from("__.escape")).await.unwrap();
    assert!(other.is_empty());
}
