//! Append-only quote batch stores
//!
//! `FileBatchStore` keeps one JSON line per batch under
//! `<base_dir>/<group_id>/batches.jsonl`. Each batch is written with a single
//! `write_all`, so a reader never observes half a batch.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::error::{EngineError, EngineResult};
use crate::traits::BatchStore;
use shared::{service_debug, service_warn, GroupId, QuoteBatch, ServiceId};

/// Newest first; equal timestamps put the later append first
fn newest_first(mut batches: Vec<QuoteBatch>) -> Vec<QuoteBatch> {
    batches.reverse();
    batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    batches
}

/// Batch store held in process memory
#[derive(Default)]
pub struct InMemoryBatchStore {
    batches: RwLock<HashMap<GroupId, Vec<QuoteBatch>>>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchStore for InMemoryBatchStore {
    async fn append(&self, batch: &QuoteBatch) -> EngineResult<()> {
        let mut batches = self.batches.write().await;
        batches
            .entry(batch.group_id.clone())
            .or_default()
            .push(batch.clone());
        Ok(())
    }

    async fn latest(&self, group_id: &GroupId) -> EngineResult<Option<QuoteBatch>> {
        Ok(self.history(group_id).await?.into_iter().next())
    }

    async fn history(&self, group_id: &GroupId) -> EngineResult<Vec<QuoteBatch>> {
        let batches = self.batches.read().await;
        Ok(newest_first(batches.get(group_id).cloned().unwrap_or_default()))
    }
}

/// Batch store persisted as JSON lines on disk
pub struct FileBatchStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBatchStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            write_lock: Mutex::new(()),
        }
    }

    /// Group ids become directory names; anything outside [A-Za-z0-9_-] is replaced
    fn group_dir(&self, group_id: &GroupId) -> PathBuf {
        let sanitized: String = group_id
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(sanitized)
    }

    fn batches_file(&self, group_id: &GroupId) -> PathBuf {
        self.group_dir(group_id).join("batches.jsonl")
    }

    async fn read_all(&self, group_id: &GroupId) -> EngineResult<Vec<QuoteBatch>> {
        let path = self.batches_file(group_id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut batches = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<QuoteBatch>(line) {
                // A sanitized directory can be shared by two ids
                Ok(batch) if &batch.group_id == group_id => batches.push(batch),
                Ok(_) => {}
                Err(e) => {
                    service_warn!(
                        ServiceId::current(),
                        "⚠️ Skipping unreadable batch at {}:{}: {}",
                        path.display(),
                        index + 1,
                        e
                    );
                }
            }
        }
        Ok(batches)
    }
}

#[async_trait]
impl BatchStore for FileBatchStore {
    async fn append(&self, batch: &QuoteBatch) -> EngineResult<()> {
        let mut line = serde_json::to_string(batch).map_err(EngineError::persistence)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        let dir = self.group_dir(&batch.group_id);
        fs::create_dir_all(&dir).await.map_err(EngineError::persistence)?;

        let path = self.batches_file(&batch.group_id);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(EngineError::persistence)?;

        file.write_all(line.as_bytes()).await.map_err(EngineError::persistence)?;
        file.flush().await.map_err(EngineError::persistence)?;
        file.sync_data().await.map_err(EngineError::persistence)?;

        service_debug!(
            ServiceId::current(),
            "💾 Persisted batch {} ({} entries) to {}",
            batch.id,
            batch.entries.len(),
            path.display()
        );
        Ok(())
    }

    async fn latest(&self, group_id: &GroupId) -> EngineResult<Option<QuoteBatch>> {
        Ok(newest_first(self.read_all(group_id).await?).into_iter().next())
    }

    async fn history(&self, group_id: &GroupId) -> EngineResult<Vec<QuoteBatch>> {
        Ok(newest_first(self.read_all(group_id).await?))
    }
}
