//! Snapshot persistence for the clipboard history
//!
//! This module provides:
//! - The [`SnapshotStore`] seam the history store writes through
//! - A file-backed store keeping one JSON document per storage key
//! - An in-memory store with an optional byte quota
//! - Encoding and decoding of the snapshot format

use super::Entry;
use crate::error::{ClipError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable home for serialized history snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Snapshot stored under `key`, or `None` if nothing is stored
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the snapshot stored under `key`
    async fn save(&self, key: &str, snapshot: &str) -> Result<()>;
}

/// Serialize entries in the order given
pub fn encode_snapshot(entries: &[Entry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Parse a snapshot; order is whatever was stored
pub fn decode_snapshot(snapshot: &str) -> Result<Vec<Entry>> {
    serde_json::from_str(snapshot).map_err(|e| ClipError::load_parse(e.to_string()))
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    async fn save(&self, key: &str, snapshot: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, snapshot).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), bytes = snapshot.len(), "Wrote history snapshot");
        Ok(())
    }
}

/// Keeps snapshots in memory, optionally refusing ones above a byte limit
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse snapshots larger than `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            snapshots: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Seed `key` with raw snapshot text
    pub fn insert(&self, key: &str, snapshot: impl Into<String>) {
        self.snapshots.lock().insert(key.to_string(), snapshot.into());
    }

    /// Raw snapshot text stored under `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.snapshots.lock().get(key).cloned()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, snapshot: &str) -> Result<()> {
        if let Some(limit) = self.quota {
            if snapshot.len() > limit {
                return Err(ClipError::StorageQuota {
                    needed: snapshot.len(),
                    limit,
                });
            }
        }
        self.insert(key, snapshot);
        Ok(())
    }
}
