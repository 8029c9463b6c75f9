//! Clipboard history storage
//!
//! This module handles:
//! - Ordering, deduplication and eviction of captured snippets
//! - Pinning entries so they survive eviction
//! - Writing a snapshot through a [`SnapshotStore`] after every mutation
//! - Lookup and search for the presentation layer

pub mod store;


use crate::error::{Advisory, AdvisoryKind, ClipError, Result};
use crate::output::{Notification, NotificationSink, NullNotifier};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use store::SnapshotStore;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default cap on unpinned entries
pub const MAX_HISTORY_ITEMS: usize = 50;

/// Default key the snapshot is stored under
pub const STORAGE_KEY: &str = "clipboard-history";

/// One captured text snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub text: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub pinned: bool,
}

impl Entry {
    /// Create a new unpinned entry
    pub fn new(text: String, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            timestamp,
            pinned: false,
        }
    }

    /// Timestamp as a UTC date, if it is in chrono's range
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Text that may never become an entry
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Stable sort putting pinned entries first, newest first within each group
pub fn canonical_sort(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

/// Source of "now" for entry timestamps
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Settings a store is created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub max_history_items: usize,
    pub storage_key: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_items: MAX_HISTORY_ITEMS,
            storage_key: STORAGE_KEY.to_string(),
        }
    }
}

impl HistoryConfig {
    pub fn new(max_history_items: usize, storage_key: impl Into<String>) -> Result<Self> {
        if max_history_items == 0 {
            return Err(ClipError::configuration(
                "max history items must be greater than zero",
            ));
        }
        let storage_key = storage_key.into();
        if storage_key.trim().is_empty() {
            return Err(ClipError::configuration("storage key must not be empty"));
        }
        Ok(Self {
            max_history_items,
            storage_key,
        })
    }
}

/// Lifecycle of a store instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Loading,
    Ready,
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Result of [`HistoryStore::add_entry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Blank text, nothing changed
    Rejected,
    Inserted { id: String, evicted: usize },
    Promoted { id: String, evicted: usize },
}

impl AddOutcome {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Rejected => None,
            Self::Inserted { id, .. } | Self::Promoted { id, .. } => Some(id),
        }
    }

    pub fn evicted(&self) -> usize {
        match self {
            Self::Rejected => 0,
            Self::Inserted { evicted, .. } | Self::Promoted { evicted, .. } => *evicted,
        }
    }
}

/// Owner of the clipboard history
///
/// Mutations take `&mut self`, so one operation and its snapshot write finish
/// before the next starts. Share a store between tasks behind a
/// `tokio::sync::Mutex`.
pub struct HistoryStore {
    config: HistoryConfig,
    persistence: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    entries: Vec<Entry>,
    state: StoreState,
    last_error: Option<Advisory>,
    durable: bool,
    last_timestamp: i64,
}

impl HistoryStore {
    /// Create an uninitialized store; call [`HistoryStore::load`] before mutating it
    pub fn new(config: HistoryConfig, persistence: Arc<dyn SnapshotStore>) -> Self {
        Self {
            config,
            persistence,
            notifier: Arc::new(NullNotifier),
            clock: Arc::new(SystemClock),
            entries: Vec::new(),
            state: StoreState::Uninitialized,
            last_error: None,
            durable: true,
            last_timestamp: i64::MIN,
        }
    }

    /// Send notifications to `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Take timestamps from `clock`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a store and load its snapshot
    pub async fn open(config: HistoryConfig, persistence: Arc<dyn SnapshotStore>) -> Result<Self> {
        let mut store = Self::new(config, persistence);
        store.load().await?;
        Ok(store)
    }

    /// Read the stored snapshot and become ready
    ///
    /// A missing snapshot yields an empty history. A malformed or unreadable
    /// one also yields an empty history and records a load advisory.
    pub async fn load(&mut self) -> Result<()> {
        if self.state != StoreState::Uninitialized {
            return Err(ClipError::InvalidState(self.state));
        }
        self.state = StoreState::Loading;

        let loaded = match self.persistence.load(&self.config.storage_key).await {
            Ok(Some(snapshot)) => store::decode_snapshot(&snapshot),
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(ClipError::load_parse(e.to_string())),
        };

        match loaded {
            Ok(entries) => {
                self.entries = sanitize(entries);
                debug!(
                    key = %self.config.storage_key,
                    entries = self.entries.len(),
                    "Loaded clipboard history"
                );
            }
            Err(e) => {
                warn!("Discarding stored history: {}", e);
                self.entries = Vec::new();
                self.last_error = e.advisory();
            }
        }

        self.last_timestamp = self
            .entries
            .iter()
            .map(|e| e.timestamp)
            .max()
            .unwrap_or(i64::MIN);
        self.state = StoreState::Ready;
        Ok(())
    }

    /// Add `text`, promoting an existing entry with the same text
    pub async fn add_entry(&mut self, text: &str) -> Result<AddOutcome> {
        self.ensure_ready()?;
        if is_blank(text) {
            debug!("Ignoring blank clipboard text");
            return Ok(AddOutcome::Rejected);
        }

        let now = self.next_timestamp();
        let mut next = self.entries.clone();

        let (entry, promoted) = match next.iter().position(|e| e.text == text) {
            Some(index) => {
                let mut existing = next.remove(index);
                existing.timestamp = now;
                (existing, true)
            }
            None => (Entry::new(text.to_string(), now), false),
        };
        let id = entry.id.clone();
        next.insert(0, entry);

        let (mut pinned, mut unpinned): (Vec<Entry>, Vec<Entry>) =
            next.into_iter().partition(|e| e.pinned);
        let evicted = unpinned
            .len()
            .saturating_sub(self.config.max_history_items);
        unpinned.truncate(self.config.max_history_items);
        pinned.append(&mut unpinned);

        if evicted > 0 {
            debug!(evicted, "Evicted oldest unpinned entries");
        }
        self.commit(pinned).await;

        Ok(if promoted {
            AddOutcome::Promoted { id, evicted }
        } else {
            AddOutcome::Inserted { id, evicted }
        })
    }

    /// Remove the entry with `id`; returns false when there is none
    pub async fn delete_entry(&mut self, id: &str) -> Result<bool> {
        self.ensure_ready()?;
        if !self.entries.iter().any(|e| e.id == id) {
            return Ok(false);
        }

        let next = self.entries.iter().filter(|e| e.id != id).cloned().collect();
        self.commit(next).await;
        self.notifier.notify(Notification::ItemRemoved);
        Ok(true)
    }

    /// Drop every unpinned entry; returns how many were removed
    pub async fn clear_history(&mut self) -> Result<usize> {
        self.ensure_ready()?;
        let removed = self.unpinned_count();

        let next = self.entries.iter().filter(|e| e.pinned).cloned().collect();
        self.commit(next).await;
        if removed > 0 {
            self.notifier.notify(Notification::HistoryCleared);
        }
        Ok(removed)
    }

    /// Flip the pin flag of `id`; returns the new flag, or `None` if absent
    ///
    /// Unpinning never evicts. The unpinned count can exceed the cap until
    /// the next [`HistoryStore::add_entry`].
    pub async fn toggle_pin_entry(&mut self, id: &str) -> Result<Option<bool>> {
        self.ensure_ready()?;
        let mut next = self.entries.clone();
        let pinned = match next.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.pinned = !entry.pinned;
                entry.pinned
            }
            None => return Ok(None),
        };

        self.commit(next).await;
        self.notifier.notify(if pinned {
            Notification::ItemPinned
        } else {
            Notification::ItemUnpinned
        });
        Ok(Some(pinned))
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn find_by_text(&self, text: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.text == text)
    }

    /// Look up an entry by 1-based position or by id prefix
    pub fn resolve(&self, reference: &str) -> Option<&Entry> {
        let reference = reference.trim();
        if let Ok(position) = reference.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|index| self.entries.get(index));
        }
        if reference.is_empty() {
            return None;
        }
        let mut matches = self.entries.iter().filter(|e| e.id.starts_with(reference));
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Some(entry),
            _ => None,
        }
    }

    /// Case-insensitive substring search, paired with 1-based positions
    pub fn search(&self, query: &str) -> Vec<(usize, &Entry)> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.text.to_lowercase().contains(&needle))
            .map(|(index, e)| (index + 1, e))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pinned_count(&self) -> usize {
        self.entries.iter().filter(|e| e.pinned).count()
    }

    pub fn unpinned_count(&self) -> usize {
        self.entries.len() - self.pinned_count()
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state != StoreState::Ready
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn last_error(&self) -> Option<&Advisory> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) -> Option<Advisory> {
        self.last_error.take()
    }

    /// Record a failure from a collaborator such as the clipboard
    pub fn report_error(&mut self, advisory: Advisory) {
        warn!("{}", advisory);
        self.last_error = Some(advisory);
    }

    /// Whether the latest mutation reached storage
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            StoreState::Ready => Ok(()),
            state => Err(ClipError::InvalidState(state)),
        }
    }

    fn next_timestamp(&mut self) -> i64 {
        let now = self.clock.now_millis();
        let next = if now > self.last_timestamp {
            now
        } else {
            self.last_timestamp.saturating_add(1)
        };
        self.last_timestamp = next;
        next
    }

    /// Sort, persist and adopt `next`; a failed write only records an advisory
    async fn commit(&mut self, mut next: Vec<Entry>) {
        canonical_sort(&mut next);

        let saved = match store::encode_snapshot(&next) {
            Ok(snapshot) => self
                .persistence
                .save(&self.config.storage_key, &snapshot)
                .await
                .map_err(|e| ClipError::save_failure(e.to_string())),
            Err(e) => Err(ClipError::save_failure(e.to_string())),
        };

        match saved {
            Ok(()) => {
                self.durable = true;
                if matches!(&self.last_error, Some(a) if a.kind == AdvisoryKind::SaveFailure) {
                    self.last_error = None;
                }
            }
            Err(e) => {
                warn!("Keeping history in memory only: {}", e);
                self.durable = false;
                self.last_error = e.advisory();
            }
        }

        self.entries = next;
    }
}

/// Canonical order with blank texts dropped and duplicates collapsed to the newest copy
fn sanitize(mut entries: Vec<Entry>) -> Vec<Entry> {
    let before = entries.len();
    canonical_sort(&mut entries);

    // Pinned copies sort first, so a pinned duplicate wins over a newer unpinned one
    let mut texts = HashSet::new();
    let mut ids = HashSet::new();
    entries.retain(|e| {
        if is_blank(&e.text) || texts.contains(&e.text) || ids.contains(&e.id) {
            return false;
        }
        texts.insert(e.text.clone());
        ids.insert(e.id.clone());
        true
    });

    if entries.len() != before {
        warn!(
            dropped = before - entries.len(),
            "Dropped blank or duplicate entries from stored history"
        );
    }
    entries
}
