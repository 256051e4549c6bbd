//! Durable snapshot of the records seen on the last run.
//!
//! The snapshot lives as one JSON blob under a fixed key:
//! `{"updates":[{"title":..,"date":..,"link":..,"source":..}, ..]}`.
//! It is read once per cycle and overwritten wholesale at most once.

pub mod file;
pub mod s3;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StageError;
use crate::ingest::types::UpdateRecord;

pub use file::FileBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(default)]
    pub updates: Vec<UpdateRecord>,
}

/// Minimal key/value blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<()>;
    /// Human-readable location for logs ("s3://bucket", "file://state").
    fn describe(&self) -> String;
}

pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        bail!("state key is empty");
    }
    if key.starts_with('/') || key.contains('\\') {
        bail!("state key must be relative: {key}");
    }
    if key.split('/').any(|seg| seg == "..") {
        bail!("state key must not contain '..' segments: {key}");
    }
    Ok(())
}

/// Snapshot reader/writer over any blob store.
#[derive(Clone)]
pub struct SnapshotStore {
    blob: Arc<dyn BlobStore>,
    key: String,
}

impl SnapshotStore {
    pub fn new(blob: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            blob,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored snapshot. `Ok(None)` when nothing was ever saved;
    /// unreadable or malformed content is an error.
    pub async fn load_existing(&self) -> Result<Option<Snapshot>, StageError> {
        let Some(bytes) = self
            .blob
            .get(&self.key)
            .await
            .with_context(|| format!("reading {} from {}", self.key, self.blob.describe()))
            .map_err(StageError::StateLoad)?
        else {
            return Ok(None);
        };
        let text = std::str::from_utf8(&bytes)
            .context("snapshot is not UTF-8")
            .map_err(StageError::StateLoad)?;
        serde_json::from_str(text)
            .map(Some)
            .context("snapshot is not valid JSON")
            .map_err(StageError::StateLoad)
    }

    /// Strict load: absent key, unreadable or malformed content are all errors.
    pub async fn load(&self) -> Result<Snapshot, StageError> {
        self.load_existing().await?.ok_or_else(|| {
            StageError::StateLoad(anyhow::anyhow!("no snapshot stored under {}", self.key))
        })
    }

    /// Bootstrap load: absence and failure both yield an empty snapshot
    /// (first run and store outage look the same downstream). Only real
    /// failures are counted.
    pub async fn load_or_empty(&self) -> Snapshot {
        match self.load_existing().await {
            Ok(Some(s)) => s,
            Ok(None) => {
                tracing::info!(key = %self.key, "no snapshot yet; starting from empty history");
                Snapshot::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "using empty history");
                counter!("state_load_errors_total").increment(1);
                Snapshot::default()
            }
        }
    }

    /// Overwrite the stored snapshot with `snapshot` (no merge).
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StageError> {
        let body = serde_json::to_vec(snapshot)
            .context("serialize snapshot")
            .map_err(StageError::StateSave)?;
        self.blob
            .put(&self.key, body)
            .await
            .with_context(|| format!("writing {} to {}", self.key, self.blob.describe()))
            .map_err(StageError::StateSave)
    }
}

/// In-process store. Counts writes so callers can assert on them.
#[derive(Default)]
pub struct MemoryBlobStore {
    inner: Mutex<HashMap<String, Vec<u8>>>,
    puts: Mutex<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a key, e.g. with a previous snapshot.
    pub fn with_entry(mut self, key: &str, data: impl Into<Vec<u8>>) -> Self {
        self.inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), data.into());
        self
    }

    pub fn put_count(&self) -> usize {
        *self.puts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored bytes for `key`; `None` when absent or the store is poisoned.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lock().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?
            .get(key)
            .cloned())
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<()> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?
            .insert(key.to_string(), data);
        *self
            .puts
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))? += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}
