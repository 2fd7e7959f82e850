//! Poll Instance Store
//!
//! Durable mapping from poll id to the option messages posted for it.
//! Records are written once when a poll opens and deleted when it closes.

use crate::channels::MessageRef;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("corrupt store {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error("poll {0} is already recorded")]
    AlreadyExists(String),
}

/// An open poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollInstance {
    /// `<name>-<open timestamp>`
    pub id: String,
    /// Channel id the poll was announced in
    pub channel: String,
    /// One message per option, in option order
    pub option_messages: Vec<MessageRef>,
}

/// Key-value storage for open polls
#[async_trait]
pub trait PollInstanceStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<PollInstance>, StoreError>;

    /// Record a new poll; fails with `AlreadyExists` if the id is taken
    async fn insert(&self, instance: PollInstance) -> Result<(), StoreError>;

    /// Remove a record, returning whether it existed
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Ids of every open poll, sorted
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;
}

/// Store kept in process memory; lost on restart
#[derive(Debug, Default)]
pub struct MemoryInstanceStore {
    instances: RwLock<HashMap<String, PollInstance>>,
}

impl MemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PollInstanceStore for MemoryInstanceStore {
    async fn get(&self, id: &str) -> Result<Option<PollInstance>, StoreError> {
        Ok(self.instances.read().get(id).cloned())
    }

    async fn insert(&self, instance: PollInstance) -> Result<(), StoreError> {
        match self.instances.write().entry(instance.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(instance.id)),
            Entry::Vacant(slot) => {
                slot.insert(instance);
                Ok(())
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.instances.write().remove(id).is_some())
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.instances.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// Store persisted as a single JSON document.
///
/// Every mutation rewrites the file through a temp file and rename while
/// holding the write lock, so writers are serialized.
#[derive(Debug)]
pub struct FileInstanceStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl FileInstanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, PollInstance>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn write_all(
        &self,
        instances: &BTreeMap<String, PollInstance>,
    ) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::Storage(format!("failed to create store dir: {}", e))
                })?;
            }
        }

        let mut content = serde_json::to_string_pretty(instances)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        content.push('\n');

        let tmp_path = self.path.with_extension("json.tmp");
        let write_err =
            |e: std::io::Error| StoreError::Storage(format!("failed to write store: {}", e));
        let mut file = tokio::fs::File::create(&tmp_path).await.map_err(write_err)?;
        file.write_all(content.as_bytes()).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StoreError::Storage(format!("failed to replace store: {}", e)))
    }
}

#[async_trait]
impl PollInstanceStore for FileInstanceStore {
    async fn get(&self, id: &str) -> Result<Option<PollInstance>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(id))
    }

    async fn insert(&self, instance: PollInstance) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        if all.contains_key(&instance.id) {
            return Err(StoreError::AlreadyExists(instance.id));
        }
        debug!(poll_id = %instance.id, path = %self.path.display(), "Persisting poll instance");
        all.insert(instance.id.clone(), instance);
        self.write_all(&all).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        if all.remove(id).is_none() {
            return Ok(false);
        }
        self.write_all(&all).await?;
        Ok(true)
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.into_keys().collect())
    }
}
