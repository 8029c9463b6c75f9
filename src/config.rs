use crate::error::{ClipError, Result};
use crate::history::{HistoryConfig, MAX_HISTORY_ITEMS, STORAGE_KEY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration settings for clipstash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default verbosity level
    #[serde(default)]
    pub verbose: bool,

    /// Default quiet mode
    #[serde(default)]
    pub quiet: bool,

    /// Custom data directory (if not using system default)
    pub data_dir: Option<PathBuf>,

    /// History store settings
    #[serde(default)]
    pub history: HistoryDefaults,

    /// Clipboard watcher settings
    #[serde(default)]
    pub watch: WatchDefaults,
}

/// History store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDefaults {
    /// Maximum number of unpinned entries kept
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Name the snapshot is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

/// Clipboard watcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchDefaults {
    /// Delay between clipboard polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            quiet: false,
            data_dir: None,
            history: HistoryDefaults::default(),
            watch: WatchDefaults::default(),
        }
    }
}

impl Default for HistoryDefaults {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            storage_key: default_storage_key(),
        }
    }
}

impl Default for WatchDefaults {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Config {
    /// Load configuration from file, with fallback to defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            // Create default config file
            let config = Self::default();
            config.save_to_file(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ClipError::configuration(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ClipError::configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the store and watcher cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.history.max_items == 0 {
            return Err(ClipError::configuration(
                "history.max_items must be greater than zero",
            ));
        }
        let key = self.history.storage_key.trim();
        if key.is_empty() {
            return Err(ClipError::configuration(
                "history.storage_key must not be empty",
            ));
        }
        if key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(ClipError::configuration(format!(
                "history.storage_key '{}' must be a plain name",
                key
            )));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(ClipError::configuration(
                "watch.poll_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Settings for the history store
    pub fn history_config(&self) -> Result<HistoryConfig> {
        HistoryConfig::new(self.history.max_items, self.history.storage_key.trim())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }

    /// Config file inside `data_dir`
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }

    /// Get the default config file path
    #[cfg(feature = "cli")]
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = crate::cli::ensure_data_dir()?;
        Ok(Self::path_in(&data_dir))
    }

    /// Load configuration from the default location
    #[cfg(feature = "cli")]
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from_file(path)
    }

    /// Merge with command-line arguments, giving priority to CLI args
    #[cfg(feature = "cli")]
    pub fn merge_with_cli_args(mut self, cli_args: &crate::cli::Cli) -> Self {
        if cli_args.verbose {
            self.verbose = true;
        }
        if cli_args.quiet {
            self.quiet = true;
        }
        if let Some(ref data_dir) = cli_args.data_dir {
            self.data_dir = Some(data_dir.clone());
        }
        if let Some(max_items) = cli_args.max_items {
            self.history.max_items = max_items;
        }

        self
    }
}

// Helper functions for default values
fn default_max_items() -> usize {
    MAX_HISTORY_ITEMS
}

fn default_storage_key() -> String {
    STORAGE_KEY.to_string()
}

fn default_poll_interval() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.verbose);
        assert!(!config.quiet);
        assert_eq!(config.history.max_items, MAX_HISTORY_ITEMS);
        assert_eq!(config.history.storage_key, "clipboard-history");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.verbose = true;
        config.history.max_items = 7;
        config.history.storage_key = "work".to_string();

        config.save_to_file(&config_path).unwrap();
        let loaded_config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(loaded_config, config);
        let history = loaded_config.history_config().unwrap();
        assert_eq!(history.max_history_items, 7);
        assert_eq!(history.storage_key, "work");
    }

    #[test]
    fn test_config_file_creation() {
        let temp_dir = tempdir().unwrap();
        let config_path = Config::path_in(temp_dir.path());

        // Should create default config file if it doesn't exist
        let config = Config::load_from_file(&config_path).unwrap();

        assert!(config_path.exists());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[history]\nmax_items = 3\n").unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.history.max_items, 3);
        assert_eq!(config.history.storage_key, STORAGE_KEY);
        assert_eq!(config.watch.poll_interval_ms, 500);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        std::fs::write(&config_path, "[history]\nmax_items = 0\n").unwrap();
        let err = Config::load_from_file(&config_path).unwrap_err();
        assert!(matches!(err, ClipError::Configuration(_)));

        std::fs::write(&config_path, "[history]\nstorage_key = \"../escape\"\n").unwrap();
        assert!(Config::load_from_file(&config_path).is_err());

        std::fs::write(&config_path, "verbose = \"yes\"\n").unwrap();
        assert!(Config::load_from_file(&config_path).is_err());
    }
}
