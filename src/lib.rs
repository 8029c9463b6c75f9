//! Bounded clipboard history with pinning, deduplication and eviction.
//!
//! The [`HistoryStore`] keeps text snippets newest first, pinned ones ahead
//! of the rest, and writes a JSON snapshot through a [`SnapshotStore`] after
//! every change. Unpinned entries beyond the configured cap are evicted
//! oldest first.
//!
//! ```no_run
//! use clipstash::{FileSnapshotStore, HistoryConfig, HistoryStore};
//! use std::sync::Arc;
//!
//! # async fn demo() -> clipstash::Result<()> {
//! let persistence = Arc::new(FileSnapshotStore::new("/tmp/clipstash"));
//! let mut store = HistoryStore::open(HistoryConfig::default(), persistence).await?;
//!
//! let outcome = store.add_entry("cargo build --release").await?;
//! if let Some(id) = outcome.id() {
//!     store.toggle_pin_entry(id).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod clipboard;
pub mod config;
pub mod error;
pub mod history;
pub mod output;
pub mod testing;

#[cfg(feature = "cli")]
pub mod cli;


// Re-export commonly used types
pub use clipboard::{ClipboardAdapter, ClipboardWatcher, MemoryClipboard};
pub use config::Config;
pub use error::{Advisory, AdvisoryKind, ClipError, Result, UserFriendlyError};
pub use history::store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use history::{AddOutcome, Entry, HistoryConfig, HistoryStore, StoreState};
pub use output::{Notification, NotificationSink};

#[cfg(feature = "system-clipboard")]
pub use clipboard::SystemClipboard;

/// Version information for clipstash
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
