pub mod blogger;
pub mod metrics;
pub mod progress;

pub use blogger::{BatchItem, Blogger, Platform};
pub use metrics::{ExtractedMetrics, HistoryRecord, MetricKind};
pub use progress::{ItemResult, ProgressEvent};
