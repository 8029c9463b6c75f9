//! Informational events for the presentation layer
//!
//! The history store and the CLI report user-visible events through a
//! [`NotificationSink`]. Delivery is fire-and-forget.

use std::fmt;
use tokio::sync::mpsc;
use tracing::info;

/// A user-visible event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    ItemRemoved,
    HistoryCleared,
    ItemPinned,
    ItemUnpinned,
    Copied,
    Captured,
}

impl Notification {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ItemRemoved => "Item removed from history.",
            Self::HistoryCleared => "Unpinned history cleared.",
            Self::ItemPinned => "Item pinned.",
            Self::ItemUnpinned => "Item unpinned.",
            Self::Copied => "Copied to clipboard.",
            Self::Captured => "Clipboard captured.",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Receiver of notifications
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Logs notifications at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        info!("{}", notification);
    }
}

/// Forwards notifications over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(notification);
    }
}
