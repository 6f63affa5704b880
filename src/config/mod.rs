//! Configuration management for blogger-tracker.
//!
//! Configuration is read from `~/.config/blogger-tracker/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::refresh::RefreshConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file; defaults to `<data_dir>/blogger-tracker/tracker.db`
    pub database_path: Option<PathBuf>,
    pub refresh: RefreshConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing the commented default if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/blogger-tracker/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("blogger-tracker").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> &'static str {
        r##"# blogger-tracker configuration

# SQLite database file (default: <data_dir>/blogger-tracker/tracker.db)
# database_path = "/path/to/tracker.db"

[refresh]
# Random pause between two posts, in milliseconds
min_delay_ms = 500
max_delay_ms = 1500

# Page load timeout in milliseconds
navigation_timeout_ms = 30000

# Run the browser without a window. Leave this off until the profile is
# logged in, the first post waits for a manual login in the visible window.
headless = false

# Keep the browser open after a batch for inspection
debug_keep_session_open = false

# How long the first post waits for a manual login, in milliseconds
first_run_login_wait_ms = 60000

# How often the login prompt is re-checked while waiting, in milliseconds
login_poll_interval_ms = 1000

# Wait after page load for the counters to render, in milliseconds
settle_ms = 1000

# Browser profile holding cookies and login state
# (default: <data_dir>/blogger-tracker/browser-profile)
# profile_dir = "/path/to/profile"

# Chrome/Chromium binary (default: auto-detected)
# chrome_executable = "/usr/bin/chromium"

# Page phrases that mean the platform wants a login
login_phrases = ["登录", "请先登录", "立即登录", "去登录"]

# Save a screenshot of every post after it settles
# screenshot_dir = "/tmp/blogger-tracker-shots"
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let config: Config = toml::from_str(Config::default_config_content())
            .expect("Default config should be valid TOML");

        let defaults = RefreshConfig::default();
        assert!(config.database_path.is_none());
        assert_eq!(config.refresh.min_delay_ms, defaults.min_delay_ms);
        assert_eq!(config.refresh.max_delay_ms, defaults.max_delay_ms);
        assert_eq!(config.refresh.first_run_login_wait_ms, 60_000);
        assert_eq!(config.refresh.login_phrases, defaults.login_phrases);
        assert!(!config.refresh.headless);
        // Not in the file, still defaulted
        assert_eq!(config.refresh.user_agent, defaults.user_agent);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
database_path = "/tmp/tracker.db"

[refresh]
headless = true
max_delay_ms = 3000
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        // Custom values
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/tracker.db")));
        assert!(config.refresh.headless);
        assert_eq!(config.refresh.max_delay_ms, 3000);
        // Default values
        assert_eq!(config.refresh.min_delay_ms, 500);
        assert_eq!(config.refresh.navigation_timeout_ms, 30_000);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert!(config.database_path.is_none());
        assert_eq!(config.refresh.settle_ms, 1000);
        assert!(!config.refresh.debug_keep_session_open);
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[refresh]\nheadless = \"maybe\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_config_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.refresh.min_delay_ms, 500);
        assert!(path.exists());

        // The written file loads back to the same values
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.refresh.max_delay_ms, 1500);
    }
}
