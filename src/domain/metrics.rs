use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Platform;

/// Interaction category a page counter is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Likes,
    Favorites,
    Comments,
    Shares,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetrics {
    pub likes: u64,
    pub favorites: u64,
    pub comments: u64,
    pub shares: u64,
}

impl ExtractedMetrics {
    pub fn new(likes: u64, favorites: u64, comments: u64, shares: u64) -> Self {
        Self {
            likes,
            favorites,
            comments,
            shares,
        }
    }

    /// Keep `value` for `kind` only if it exceeds what was seen so far.
    pub fn record_max(&mut self, kind: MetricKind, value: u64) {
        let slot = match kind {
            MetricKind::Likes => &mut self.likes,
            MetricKind::Favorites => &mut self.favorites,
            MetricKind::Comments => &mut self.comments,
            MetricKind::Shares => &mut self.shares,
        };
        if value > *slot {
            *slot = value;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.likes == 0 && self.favorites == 0 && self.comments == 0 && self.shares == 0
    }
}

/// Append-only audit row written once per successfully refreshed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub item_id: i64,
    pub platform: Platform,
    pub metrics: ExtractedMetrics,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(item_id: i64, platform: Platform, metrics: ExtractedMetrics) -> Self {
        Self {
            id: 0,
            item_id,
            platform,
            metrics,
            recorded_at: Utc::now(),
        }
    }
}
