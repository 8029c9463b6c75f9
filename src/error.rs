use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::history::StoreState;

/// Comprehensive error type for clipstash
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("Failed to load history snapshot: {0}")]
    LoadParse(String),

    #[error("Failed to save history snapshot: {0}")]
    SaveFailure(String),

    #[error("Storage quota exceeded: snapshot needs {needed} bytes, limit is {limit}")]
    StorageQuota { needed: usize, limit: usize },

    #[error("Clipboard permission denied: {0}")]
    ClipboardPermissionDenied(String),

    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("Operation not allowed while store is {0}")]
    InvalidState(StoreState),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Async task error: {0}")]
    AsyncTask(#[from] tokio::task::JoinError),
}

impl ClipError {
    /// Create a load/parse error
    pub fn load_parse<S: Into<String>>(msg: S) -> Self {
        Self::LoadParse(msg.into())
    }

    /// Create a save failure
    pub fn save_failure<S: Into<String>>(msg: S) -> Self {
        Self::SaveFailure(msg.into())
    }

    /// Create a clipboard-unavailable error
    pub fn clipboard_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ClipboardUnavailable(msg.into())
    }

    /// Create a clipboard permission error
    pub fn clipboard_denied<S: Into<String>>(msg: S) -> Self {
        Self::ClipboardPermissionDenied(msg.into())
    }

    /// Create an entry-not-found error
    pub fn entry_not_found<S: Into<String>>(reference: S) -> Self {
        Self::EntryNotFound(reference.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SaveFailure(_) | Self::ClipboardUnavailable(_) | Self::Io(_) | Self::AsyncTask(_)
        )
    }

    /// Tagged advisory for errors the store and the presentation layer recover from.
    ///
    /// Returns `None` for errors that abort the current command instead.
    pub fn advisory(&self) -> Option<Advisory> {
        let kind = match self {
            Self::LoadParse(_) => AdvisoryKind::LoadParse,
            Self::SaveFailure(_) | Self::StorageQuota { .. } => AdvisoryKind::SaveFailure,
            Self::ClipboardPermissionDenied(_) => AdvisoryKind::ClipboardPermissionDenied,
            Self::ClipboardUnavailable(_) => AdvisoryKind::ClipboardUnavailable,
            _ => return None,
        };
        Some(Advisory::new(kind, self.to_string()))
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::EntryNotFound(reference) => {
                format!(
                    "No history entry matches '{}'. Run 'clipstash list' to see positions and ids.",
                    reference
                )
            }
            Self::ClipboardPermissionDenied(msg) => {
                format!(
                    "Clipboard access denied: {}. Grant clipboard access to your terminal and retry.",
                    msg
                )
            }
            Self::ClipboardUnavailable(msg) => {
                format!(
                    "Clipboard unavailable: {}. Is a display server running?",
                    msg
                )
            }
            Self::StorageQuota { needed, limit } => {
                format!(
                    "History snapshot ({} bytes) exceeds the storage limit of {} bytes. Clear or unpin some entries.",
                    needed, limit
                )
            }
            Self::Configuration(msg) => {
                format!(
                    "Configuration error: {}. Run 'clipstash config path' to locate the config file.",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Convenient result type for clipstash
pub type Result<T> = std::result::Result<T, ClipError>;

/// Trait for converting errors to user-friendly messages
pub trait UserFriendlyError {
    fn user_message(&self) -> String;
}

impl UserFriendlyError for ClipError {
    fn user_message(&self) -> String {
        self.user_message()
    }
}

/// Source of a recoverable failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    LoadParse,
    SaveFailure,
    ClipboardPermissionDenied,
    ClipboardUnavailable,
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LoadParse => "load",
            Self::SaveFailure => "save",
            Self::ClipboardPermissionDenied => "clipboard permission",
            Self::ClipboardUnavailable => "clipboard",
        };
        f.write_str(label)
    }
}

/// Recoverable failure kept by the store for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

impl Advisory {
    pub fn new<S: Into<String>>(kind: AdvisoryKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
