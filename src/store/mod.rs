pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{BatchItem, Blogger, HistoryRecord, Platform};

pub use sqlite::SqliteStore;

/// Which bloggers go into a refresh batch.
#[derive(Debug, Clone, Default)]
pub struct RefreshFilter {
    /// Restrict to these ids; empty means every blogger.
    pub ids: Vec<i64>,
}

impl RefreshFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn matches(&self, id: i64) -> bool {
        self.ids.is_empty() || self.ids.contains(&id)
    }
}

pub trait Store {
    // Blogger operations
    fn add_blogger(&self, blogger: &Blogger) -> Result<i64>;
    fn get_blogger(&self, id: i64) -> Result<Option<Blogger>>;
    fn get_all_bloggers(&self) -> Result<Vec<Blogger>>;
    fn delete_blogger(&self, id: i64) -> Result<()>;

    // Refresh operations
    fn list_refreshable(&self, filter: &RefreshFilter) -> Result<Vec<BatchItem>>;
    /// Store the record's metrics on the blogger and append it to the history,
    /// both or neither. Returns the history row id.
    fn record_refresh(&self, record: &HistoryRecord) -> Result<i64>;
    fn get_history(
        &self,
        blogger_id: i64,
        platform: Platform,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>>;
}
