//! Clipboard access
//!
//! This module handles:
//! - The [`ClipboardAdapter`] seam between the presentation layer and the platform
//! - Platform clipboard access through arboard (`system-clipboard` feature)
//! - An in-memory clipboard for headless use and tests
//! - Polling the clipboard into a history store

use crate::error::{ClipError, Result};
use crate::history::{AddOutcome, HistoryStore};
use crate::output::{Notification, NotificationSink, NullNotifier};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Plain-text clipboard
#[async_trait]
pub trait ClipboardAdapter: Send + Sync {
    /// Current clipboard text
    ///
    /// Fails with `ClipboardPermissionDenied` or `ClipboardUnavailable`.
    async fn read_text(&self) -> Result<String>;

    /// Replace the clipboard contents with `text`
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Platform clipboard
#[cfg(feature = "system-clipboard")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "system-clipboard")]
fn map_arboard_error(err: arboard::Error) -> ClipError {
    match err {
        arboard::Error::ContentNotAvailable => {
            ClipError::clipboard_unavailable("clipboard holds no text")
        }
        other => ClipError::clipboard_unavailable(other.to_string()),
    }
}

#[cfg(feature = "system-clipboard")]
#[async_trait]
impl ClipboardAdapter for SystemClipboard {
    async fn read_text(&self) -> Result<String> {
        tokio::task::spawn_blocking(|| {
            let mut clipboard = arboard::Clipboard::new().map_err(map_arboard_error)?;
            clipboard.get_text().map_err(map_arboard_error)
        })
        .await?
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new().map_err(map_arboard_error)?;
            clipboard.set_text(text).map_err(map_arboard_error)
        })
        .await?
    }
}

/// Clipboard held in process memory
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    denied: Mutex<bool>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let clipboard = Self::new();
        clipboard.set(text);
        clipboard
    }

    /// Replace the contents, as another application would
    pub fn set(&self, text: impl Into<String>) {
        *self.contents.lock() = Some(text.into());
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }

    /// Make every subsequent read and write fail with a permission error
    pub fn deny_access(&self, denied: bool) {
        *self.denied.lock() = denied;
    }

    fn check_access(&self) -> Result<()> {
        if *self.denied.lock() {
            return Err(ClipError::clipboard_denied("access revoked"));
        }
        Ok(())
    }
}

#[async_trait]
impl ClipboardAdapter for MemoryClipboard {
    async fn read_text(&self) -> Result<String> {
        self.check_access()?;
        self.contents()
            .ok_or_else(|| ClipError::clipboard_unavailable("clipboard is empty"))
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        self.check_access()?;
        self.set(text);
        Ok(())
    }
}

/// Feeds clipboard changes into a history store
pub struct ClipboardWatcher {
    clipboard: Arc<dyn ClipboardAdapter>,
    notifier: Arc<dyn NotificationSink>,
    last_seen: Option<String>,
}

impl ClipboardWatcher {
    pub fn new(clipboard: Arc<dyn ClipboardAdapter>) -> Self {
        Self {
            clipboard,
            notifier: Arc::new(NullNotifier),
            last_seen: None,
        }
    }

    /// Announce each stored text on `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Treat `text` as already captured
    pub fn with_last_seen(mut self, text: impl Into<String>) -> Self {
        self.last_seen = Some(text.into());
        self
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// Read the clipboard once and add its text if it changed
    ///
    /// Clipboard failures are recorded on the store and yield `Ok(None)`.
    pub async fn poll_once(&mut self, store: &mut HistoryStore) -> Result<Option<AddOutcome>> {
        let text = match self.clipboard.read_text().await {
            Ok(text) => text,
            Err(e) => {
                let Some(advisory) = e.advisory() else {
                    return Err(e);
                };
                if store.last_error() != Some(&advisory) {
                    store.report_error(advisory);
                }
                return Ok(None);
            }
        };

        if self.last_seen.as_deref() == Some(text.as_str()) {
            return Ok(None);
        }
        self.last_seen = Some(text.clone());

        let outcome = store.add_entry(&text).await?;
        if outcome != AddOutcome::Rejected {
            debug!(?outcome, "Captured clipboard change");
            self.notifier.notify(Notification::Captured);
        }
        Ok(Some(outcome))
    }

    /// Poll every `interval` until `shutdown` resolves; returns how many texts were stored
    pub async fn run<F>(
        &mut self,
        store: &mut HistoryStore,
        interval: Duration,
        shutdown: F,
    ) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut captured = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Some(outcome) = self.poll_once(store).await? {
                        if outcome != AddOutcome::Rejected {
                            captured += 1;
                        }
                    }
                }
            }
        }

        info!(captured, "Stopped watching clipboard");
        Ok(captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisoryKind;
    use crate::history::store::MemorySnapshotStore;
    use crate::history::HistoryConfig;
    use crate::testing::RecordingNotifier;

    async fn ready_store() -> HistoryStore {
        HistoryStore::open(
            HistoryConfig::default(),
            Arc::new(MemorySnapshotStore::new()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_memory_clipboard_roundtrip() {
        let clipboard = MemoryClipboard::new();
        assert!(matches!(
            clipboard.read_text().await,
            Err(ClipError::ClipboardUnavailable(_))
        ));

        clipboard.write_text("hello").await.unwrap();
        assert_eq!(clipboard.read_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_memory_clipboard_denied() {
        let clipboard = MemoryClipboard::with_text("secret");
        clipboard.deny_access(true);

        assert!(matches!(
            clipboard.read_text().await,
            Err(ClipError::ClipboardPermissionDenied(_))
        ));
        assert!(matches!(
            clipboard.write_text("x").await,
            Err(ClipError::ClipboardPermissionDenied(_))
        ));
        assert_eq!(clipboard.contents(), Some("secret".to_string()));
    }

    #[tokio::test]
    async fn test_watcher_adds_only_changes() {
        let clipboard = Arc::new(MemoryClipboard::with_text("one"));
        let mut watcher = ClipboardWatcher::new(clipboard.clone());
        let mut store = ready_store().await;

        let first = watcher.poll_once(&mut store).await.unwrap();
        assert!(matches!(first, Some(AddOutcome::Inserted { .. })));

        // Unchanged clipboard is not re-added
        assert_eq!(watcher.poll_once(&mut store).await.unwrap(), None);

        clipboard.set("two");
        watcher.poll_once(&mut store).await.unwrap();

        let texts: Vec<_> = store.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "one"]);
        assert_eq!(watcher.last_seen(), Some("two"));
    }

    #[tokio::test]
    async fn test_watcher_announces_captures() {
        let clipboard = Arc::new(MemoryClipboard::with_text("seen"));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut watcher = ClipboardWatcher::new(clipboard.clone()).with_notifier(notifier.clone());
        let mut store = ready_store().await;

        watcher.poll_once(&mut store).await.unwrap();
        clipboard.set(" ");
        watcher.poll_once(&mut store).await.unwrap();

        assert_eq!(notifier.received(), vec![Notification::Captured]);
    }

    #[tokio::test]
    async fn test_watcher_with_last_seen_skips_current_text() {
        let clipboard = Arc::new(MemoryClipboard::with_text("already here"));
        let mut watcher = ClipboardWatcher::new(clipboard).with_last_seen("already here");
        let mut store = ready_store().await;

        assert_eq!(watcher.poll_once(&mut store).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_watcher_records_clipboard_failures() {
        let clipboard = Arc::new(MemoryClipboard::with_text("text"));
        clipboard.deny_access(true);
        let mut watcher = ClipboardWatcher::new(clipboard.clone());
        let mut store = ready_store().await;

        assert_eq!(watcher.poll_once(&mut store).await.unwrap(), None);
        assert_eq!(
            store.last_error().map(|a| a.kind),
            Some(AdvisoryKind::ClipboardPermissionDenied)
        );

        // Store stays usable and the watcher recovers once access returns
        clipboard.deny_access(false);
        watcher.poll_once(&mut store).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_watcher_blank_clipboard_is_rejected() {
        let clipboard = Arc::new(MemoryClipboard::with_text("   "));
        let mut watcher = ClipboardWatcher::new(clipboard);
        let mut store = ready_store().await;

        let outcome = watcher.poll_once(&mut store).await.unwrap();
        assert_eq!(outcome, Some(AddOutcome::Rejected));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_run_stops_on_shutdown() {
        let clipboard = Arc::new(MemoryClipboard::with_text("polled"));
        let mut watcher = ClipboardWatcher::new(clipboard);
        let mut store = ready_store().await;

        let shutdown = tokio::time::sleep(Duration::from_millis(250));
        let captured = watcher
            .run(&mut store, Duration::from_millis(100), shutdown)
            .await
            .unwrap();

        assert_eq!(captured, 1);
        assert_eq!(store.len(), 1);
    }
}
