use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the interaction refresh controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Lower bound of the random pause between items in milliseconds (default: 500)
    pub min_delay_ms: u64,

    /// Upper bound of the random pause between items in milliseconds (default: 1500)
    pub max_delay_ms: u64,

    /// Page load timeout in milliseconds (default: 30000)
    pub navigation_timeout_ms: u64,

    /// Whether to run the browser without a window (default: false)
    ///
    /// A visible window is needed for the manual login on the first item.
    pub headless: bool,

    /// Leave the browser open after a batch for inspection (default: false)
    pub debug_keep_session_open: bool,

    /// How long the first item waits for a manual login in milliseconds (default: 60000)
    pub first_run_login_wait_ms: u64,

    /// How often the login wall is re-checked while waiting in milliseconds (default: 1000)
    pub login_poll_interval_ms: u64,

    /// Wait after navigation for interaction counters to render in milliseconds (default: 1000)
    pub settle_ms: u64,

    /// Browser profile directory holding cookies and login state.
    /// Defaults to `<data_dir>/blogger-tracker/browser-profile`.
    pub profile_dir: Option<PathBuf>,

    /// Explicit Chrome/Chromium binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// Page phrases that mean the platform wants a login
    pub login_phrases: Vec<String>,

    /// Save a screenshot of every page after it settles (debugging aid)
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            max_delay_ms: 1500,
            navigation_timeout_ms: 30_000,
            headless: false,
            debug_keep_session_open: false,
            first_run_login_wait_ms: 60_000,
            login_poll_interval_ms: 1000,
            settle_ms: 1000,
            profile_dir: None,
            chrome_executable: None,
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            login_phrases: vec![
                "登录".to_string(),
                "请先登录".to_string(),
                "立即登录".to_string(),
                "去登录".to_string(),
            ],
            screenshot_dir: None,
        }
    }
}

impl RefreshConfig {
    /// Get the navigation timeout as a Duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Get the manual login ceiling as a Duration
    pub fn login_wait(&self) -> Duration {
        Duration::from_millis(self.first_run_login_wait_ms)
    }

    /// Get the login poll interval as a Duration, never zero
    pub fn login_poll_interval(&self) -> Duration {
        Duration::from_millis(self.login_poll_interval_ms.max(1))
    }

    /// Get the settle wait as a Duration
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Inclusive delay window in milliseconds, ordered even if configured backwards
    pub fn delay_bounds(&self) -> (u64, u64) {
        if self.min_delay_ms <= self.max_delay_ms {
            (self.min_delay_ms, self.max_delay_ms)
        } else {
            (self.max_delay_ms, self.min_delay_ms)
        }
    }

    /// Resolve the browser profile directory
    pub fn resolved_profile_dir(&self) -> Option<PathBuf> {
        self.profile_dir.clone().or_else(|| {
            dirs::data_dir().map(|d| d.join("blogger-tracker").join("browser-profile"))
        })
    }

    /// Create a config without any waiting, for scripted sessions
    pub fn immediate() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 0,
            settle_ms: 0,
            first_run_login_wait_ms: 0,
            login_poll_interval_ms: 1,
            ..Default::default()
        }
    }
}
