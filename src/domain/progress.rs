use serde::{Deserialize, Serialize};

use crate::domain::{BatchItem, ExtractedMetrics, Platform};

/// Outcome of one batch item. Exactly one is produced per input item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub item_id: i64,
    pub display_name: String,
    pub platform: Platform,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ExtractedMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Soft warning on a successful item, e.g. every metric came back zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Extraction troubleshooting note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ItemResult {
    pub fn succeeded(item: &BatchItem, platform: Platform, metrics: ExtractedMetrics) -> Self {
        Self {
            item_id: item.id,
            display_name: item.display_name.clone(),
            platform,
            success: true,
            metrics: Some(metrics),
            error: None,
            warning: None,
            diagnostic: None,
        }
    }

    pub fn failed(item: &BatchItem, platform: Platform, error: impl Into<String>) -> Self {
        Self {
            item_id: item.id,
            display_name: item.display_name.clone(),
            platform,
            success: false,
            metrics: None,
            error: Some(error.into()),
            warning: None,
            diagnostic: None,
        }
    }
}

/// Events reported while a batch runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// Fired right before an item's navigation starts.
    Processing {
        current: usize,
        total: usize,
        display_name: String,
    },
    /// Fired exactly once per run, also for empty and aborted runs.
    Completed {
        current: usize,
        total: usize,
        results: Vec<ItemResult>,
    },
    /// Diagnostic only; the result list stays authoritative.
    Error {
        display_name: String,
        message: String,
    },
}

impl ProgressEvent {
    pub fn is_completed(&self) -> bool {
        matches!(self, ProgressEvent::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_serializes_with_status_tag() {
        let event = ProgressEvent::Processing {
            current: 1,
            total: 3,
            display_name: "Foodie".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "processing");
        assert_eq!(json["current"], 1);
        assert_eq!(json["display_name"], "Foodie");
    }

    #[test]
    fn test_failed_result_has_no_metrics() {
        let item = BatchItem::new(3, "Foodie", None);
        let result = ItemResult::failed(&item, Platform::Xiaohongshu, "missing target url");
        assert!(!result.success);
        assert_eq!(result.metrics, None);
        assert_eq!(result.error.as_deref(), Some("missing target url"));

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("metrics").is_none());
        assert_eq!(json["platform"], "xiaohongshu");
    }
}
