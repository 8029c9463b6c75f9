//! Command-line front end for the clipboard history.
//! ## Usage
//!
//! ```bash
//! # Record the current clipboard text
//! clipstash capture
//!
//! # Show the history, pinned entries first
//! clipstash list
//!
//! # Pin the second entry so it is never evicted
//! clipstash pin 2
//!
//! # Put an entry back on the clipboard
//! clipstash copy 1
//!
//! # Record every clipboard change until Ctrl-C
//! clipstash watch
//! ```

pub mod app;
pub mod commands;
pub mod render;


pub use app::{Cli, Commands, Terminal};
pub use commands::{CommandContext, ConfigAction, HistoryAction};

/// Default directory for storing history and configuration
pub fn default_data_dir() -> std::path::PathBuf {
    directories::ProjectDirs::from("", "", "clipstash")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            // Fallback to home directory if project dirs not available
            dirs::home_dir()
                .unwrap_or_else(|| std::path::PathBuf::from("."))
                .join(".clipstash")
        })
}

/// Initialize the data directory if it doesn't exist
pub fn ensure_data_dir() -> crate::Result<std::path::PathBuf> {
    let data_dir = default_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
    }
    Ok(data_dir)
}
