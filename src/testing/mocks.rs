//! Mock implementations for testing
//!
//! This module provides doubles for the history store's collaborators:
//! - A manually advanced clock
//! - A notification sink that records what it receives
//! - A snapshot store whose reads and writes can be made to fail

use crate::error::{ClipError, Result};
use crate::history::store::{MemorySnapshotStore, SnapshotStore};
use crate::history::Clock;
use crate::output::{Notification, NotificationSink};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Sink that keeps every notification
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}

/// Memory-backed snapshot store with switchable failures
#[derive(Debug, Default)]
pub struct FlakySnapshotStore {
    inner: MemorySnapshotStore,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl FlakySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw snapshot last written under `key`
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    pub fn seed(&self, key: &str, snapshot: impl Into<String>) {
        self.inner.insert(key, snapshot);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of save attempts, failed ones included
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for FlakySnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ClipError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "storage locked",
            )));
        }
        self.inner.load(key).await
    }

    async fn save(&self, key: &str, snapshot: &str) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ClipError::StorageQuota {
                needed: snapshot.len(),
                limit: 0,
            });
        }
        self.inner.save(key, snapshot).await
    }
}
