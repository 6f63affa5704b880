use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ExtractedMetrics;

/// Platform a post link belongs to. Only Xiaohongshu is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Xiaohongshu,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Xiaohongshu => "xiaohongshu",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xiaohongshu" | "xhs" => Ok(Platform::Xiaohongshu),
            other => Err(format!("Unsupported platform: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blogger {
    pub id: i64,
    pub nickname: String,
    pub xhs_link: Option<String>,
    /// Latest extracted metrics; `None` until the first successful refresh.
    pub metrics: Option<ExtractedMetrics>,
    pub metrics_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Blogger {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            id: 0,
            nickname: nickname.into(),
            xhs_link: None,
            metrics: None,
            metrics_updated_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.xhs_link = Some(link.into());
        self
    }

    pub fn display_name(&self) -> &str {
        if self.nickname.trim().is_empty() {
            "(Unnamed)"
        } else {
            &self.nickname
        }
    }
}

/// One entry of a refresh batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: i64,
    pub display_name: String,
    pub target_url: Option<String>,
}

impl BatchItem {
    pub fn new(id: i64, display_name: impl Into<String>, target_url: Option<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            target_url,
        }
    }

    /// The trimmed target URL, or `None` when missing or blank.
    pub fn target_url(&self) -> Option<&str> {
        self.target_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

impl From<&Blogger> for BatchItem {
    fn from(blogger: &Blogger) -> Self {
        Self {
            id: blogger.id,
            display_name: blogger.display_name().to_string(),
            target_url: blogger.xhs_link.clone(),
        }
    }
}
