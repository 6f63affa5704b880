//! Interaction refresh for blogger post links.
//!
//! Visits each blogger's post page in a persistent Chrome profile, reads the
//! like/favorite/comment/share counters and stores them with a history row.
//!
//! # Architecture
//!
//! ```text
//! BatchItem → PageSession (navigate, login gate) → PageSnapshot
//!           → extract_metrics → Store (metrics + history) → ProgressEvent
//! ```
//!
//! The browser sits behind [`PageSession`] and metric extraction is a pure
//! function over a [`PageSnapshot`], so the controller and the heuristic can
//! both be exercised without launching Chrome.
//!
//! # Usage
//!
//! ```rust,ignore
//! use blogger_tracker::refresh::{ChromeSession, RefreshConfig, RefreshController};
//!
//! let config = RefreshConfig::default();
//! let session = ChromeSession::new(config.clone());
//! let mut controller = RefreshController::new(session, store, config);
//!
//! let results = controller
//!     .run_batch(&items, &|event| println!("{:?}", event))
//!     .await?;
//! ```
//!
//! # Streaming progress
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use blogger_tracker::refresh::spawn_batch;
//!
//! let mut run = spawn_batch(controller, items);
//! while let Some(event) = run.events.next().await {
//!     println!("{:?}", event);
//! }
//! let (controller, outcome) = run.handle.await?;
//! ```

mod chrome;
mod config;
mod controller;
mod error;
mod extractor;
mod login;
mod progress;

#[cfg(test)]
pub(crate) mod testing;

pub use chrome::ChromeSession;
pub use config::RefreshConfig;
pub use controller::{jittered_delay, RefreshController, MISSING_URL_ERROR, RELOGIN_ERROR};
pub use error::{BatchError, SessionError};
pub use extractor::{
    classify, extract_metrics, parse_count, CounterElement, Extraction, PageSnapshot,
};
pub use login::LoginDetector;
pub use progress::{
    spawn_batch, BatchOutcome, ChannelSink, ProgressSink, ProgressStream, RefreshRun,
};

use std::path::Path;

use async_trait::async_trait;

/// A browser tab the controller drives, one page at a time.
///
/// `open` must be idempotent and `close` must leave the session reopenable.
#[async_trait]
pub trait PageSession: Send {
    /// Launch the browser (or reuse a running one).
    async fn open(&mut self) -> Result<(), SessionError>;

    fn is_open(&self) -> bool;

    /// Load `url` and return once the document is ready.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Visible text of the current page.
    async fn page_text(&mut self) -> Result<String, SessionError>;

    /// Text and counter elements of the current page.
    async fn snapshot(&mut self) -> Result<PageSnapshot, SessionError>;

    async fn screenshot(&mut self, path: &Path) -> Result<(), SessionError>;

    async fn close(&mut self) -> Result<(), SessionError>;
}
