//! # blogger-tracker
//!
//! Keeps the interaction counts (likes, favorites, comments, shares) of
//! bloggers' Xiaohongshu posts up to date by reading them from a real browser.
//!
//! ## Architecture
//!
//! ```text
//! Store → BatchItem → RefreshController → PageSession (Chrome) → Store
//!                            ↓
//!                      ProgressEvent
//! ```
//!
//! - [`refresh`]: Batch refresh controller, Chrome session and metric extraction
//! - [`store`]: SQLite persistence layer
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a blogger with the post to track
//! blogger-tracker add Foodie --link https://www.xiaohongshu.com/explore/abc
//!
//! # Refresh every blogger (log in in the browser window when asked)
//! blogger-tracker refresh
//!
//! # Show the last 30 days of counts
//! blogger-tracker history 1
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the store to the
/// loaded configuration and builds refresh controllers.
pub mod app;

/// Command-line interface using clap.
///
/// - `add <nickname> [--link URL]` - Add a blogger
/// - `remove <id>` - Remove a blogger and its history
/// - `list` - List bloggers and their latest counts
/// - `refresh [--id ID]...` - Refresh counts in the browser
/// - `history <id> [--days N]` - Show recorded counts
pub mod cli;

/// Configuration loaded from `~/.config/blogger-tracker/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Blogger`](domain::Blogger): A tracked blogger and its latest counts
/// - [`BatchItem`](domain::BatchItem): One entry of a refresh batch
/// - [`ExtractedMetrics`](domain::ExtractedMetrics): The four interaction counts
/// - [`ProgressEvent`](domain::ProgressEvent): Batch progress notifications
pub mod domain;

/// Interaction refresh over a persistent Chrome profile.
///
/// - [`RefreshController`](refresh::RefreshController): Sequential batch driver
/// - [`ChromeSession`](refresh::ChromeSession): chromiumoxide-backed browser
/// - [`PageSession`](refresh::PageSession): Async trait over the browser
/// - [`extract_metrics`](refresh::extract_metrics): Counter heuristic
pub mod refresh;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
