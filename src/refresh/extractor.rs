use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{ExtractedMetrics, MetricKind};

/// Marker class carried by every interaction counter on a post page.
pub const COUNT_SELECTOR: &str = ".count";

/// How many ancestors of a counter are inspected for category hints.
const HINT_DEPTH: usize = 3;

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)(?:\.([0-9]+))?\s*([wW万千百kK]?)").expect("count pattern is valid")
});

const LIKE_KEYWORDS: &[&str] = &["like", "zan", "praise", "thumb"];
const FAVORITE_KEYWORDS: &[&str] = &["collect", "star", "favorite", "fav"];
const COMMENT_KEYWORDS: &[&str] = &["chat", "comment", "reply"];
const SHARE_KEYWORDS: &[&str] = &["share", "forward", "repost"];

/// Serialisable view of a rendered page, produced in the browser by
/// [`snapshot_script`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Visible body text.
    #[serde(default)]
    pub text: String,
    /// Every element carrying the count marker, in document order.
    #[serde(default)]
    pub counters: Vec<CounterElement>,
    /// Error raised by the in-page script, if any.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterElement {
    pub text: String,
    /// Class names of the nearest ancestors, nearest first.
    #[serde(default)]
    pub hints: Vec<String>,
}

impl CounterElement {
    pub fn new(text: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hints: vec![hint.into()],
        }
    }
}

/// Metrics pulled out of one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub metrics: ExtractedMetrics,
    /// Number of counters that were classified into a category.
    pub matched: usize,
    /// Troubleshooting note for the operator.
    pub diagnostic: Option<String>,
}

impl Extraction {
    /// Zero metrics with a note, used when no snapshot could be taken.
    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            metrics: ExtractedMetrics::default(),
            matched: 0,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// Extract interaction metrics from a page snapshot.
///
/// Counters are classified by their ancestors' class names and the largest
/// value per category wins, since a post's summary counter is larger than
/// per-comment counters sharing the same marker. Never fails: problems end
/// up in [`Extraction::diagnostic`].
pub fn extract_metrics(snapshot: &PageSnapshot) -> Extraction {
    if let Some(ref error) = snapshot.error {
        return Extraction::failed(format!("page script error: {}", error));
    }

    let mut extraction = Extraction::default();
    let mut unclassified = 0usize;

    for counter in &snapshot.counters {
        match classify(counter.hints.as_slice()) {
            Some(kind) => {
                extraction
                    .metrics
                    .record_max(kind, parse_count(&counter.text));
                extraction.matched += 1;
            }
            None => unclassified += 1,
        }
    }

    if snapshot.counters.is_empty() {
        extraction.diagnostic = Some("no count elements found on page".to_string());
    } else if extraction.matched == 0 {
        extraction.diagnostic = Some(format!(
            "{} count elements found but none matched a known category",
            unclassified
        ));
    }

    extraction
}

/// Classify a counter by the first ancestor hint that matches a category.
pub fn classify<S: AsRef<str>>(hints: &[S]) -> Option<MetricKind> {
    hints.iter().find_map(|hint| {
        let hint = hint.as_ref().to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| hint.contains(k));

        if has(LIKE_KEYWORDS) {
            Some(MetricKind::Likes)
        } else if has(FAVORITE_KEYWORDS) {
            Some(MetricKind::Favorites)
        } else if has(COMMENT_KEYWORDS) {
            Some(MetricKind::Comments)
        } else if has(SHARE_KEYWORDS) {
            Some(MetricKind::Shares)
        } else {
            None
        }
    })
}

/// Parse an abbreviated count such as `1.2w`, `3千` or `850`.
///
/// `w`/`万` is ten thousand, `千`/`k` a thousand and `百` a hundred. The value
/// is truncated to an integer. Only ASCII digits count; text without them, or
/// with more digits than fit a `u64`, parses as 0.
pub fn parse_count(text: &str) -> u64 {
    let cleaned = text.trim().replace(',', "");
    let Some(caps) = COUNT_RE.captures(&cleaned) else {
        return 0;
    };

    let multiplier: u64 = match caps.get(3).map(|m| m.as_str()) {
        Some("w" | "W" | "万") => 10_000,
        Some("千" | "k" | "K") => 1_000,
        Some("百") => 100,
        _ => 1,
    };

    let Ok(whole) = caps[1].parse::<u64>() else {
        return 0;
    };
    let mut value = whole.saturating_mul(multiplier);

    if let Some(fraction) = caps.get(2) {
        // Digits past the multiplier's precision cannot change the truncated result.
        let digits: String = fraction.as_str().chars().take(4).collect();
        let scale = 10u64.pow(digits.len() as u32);
        let numerator = digits.parse::<u64>().unwrap_or(0);
        value = value.saturating_add(numerator * multiplier / scale);
    }

    value
}

/// JavaScript that collects a [`PageSnapshot`] from the current page.
pub fn snapshot_script() -> String {
    format!(
        r#"
        (() => {{
            const result = {{ text: '', counters: [], error: null }};
            try {{
                result.text = document.body ? document.body.innerText : '';
                document.querySelectorAll('{COUNT_SELECTOR}').forEach(el => {{
                    const hints = [];
                    let node = el.parentElement;
                    for (let depth = 0; node && depth < {HINT_DEPTH}; depth++) {{
                        const cls = typeof node.className === 'string' ? node.className.trim() : '';
                        if (cls) hints.push(cls.slice(0, 80));
                        node = node.parentElement;
                    }}
                    result.counters.push({{
                        text: (el.textContent || '').trim(),
                        hints: hints
                    }});
                }});
            }} catch (e) {{
                result.error = String(e);
            }}
            return result;
        }})()
        "#
    )
}

/// JavaScript returning the page's visible text.
pub fn page_text_script() -> &'static str {
    "document.body ? document.body.innerText : ''"
}
