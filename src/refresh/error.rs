use thiserror::Error;

use crate::domain::ItemResult;

/// Failures raised by a browser session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Browser session is not open")]
    NotOpen,

    #[error("Browser session closed: {0}")]
    Closed(String),

    #[error("Navigation timed out after {timeout_ms}ms: {url}")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Whether the session itself is unusable, as opposed to a single page failing.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Launch(_) | SessionError::NotOpen | SessionError::Closed(_)
        )
    }
}

/// Failures that abort a whole batch. Results gathered before the abort are kept.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Login timeout: login prompt still shown after waiting {waited_ms}ms")]
    LoginTimeout {
        waited_ms: u64,
        partial: Vec<ItemResult>,
    },

    #[error("Browser session failed: {source}")]
    Session {
        #[source]
        source: SessionError,
        partial: Vec<ItemResult>,
    },
}

impl BatchError {
    pub fn partial_results(&self) -> &[ItemResult] {
        match self {
            BatchError::LoginTimeout { partial, .. } | BatchError::Session { partial, .. } => {
                partial
            }
        }
    }

    pub fn into_partial_results(self) -> Vec<ItemResult> {
        match self {
            BatchError::LoginTimeout { partial, .. } | BatchError::Session { partial, .. } => {
                partial
            }
        }
    }
}
