use linkrot_scanner::NO_TEXT;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A captured page, read back from the snapshot store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedPage {
    pub url: String,
    pub final_url: Option<String>,
    pub raw_html: String,
}

impl ScrapedPage {
    /// URL that relative links on this page resolve against.
    pub fn base_url(&self) -> &str {
        match self.final_url.as_deref() {
            Some(final_url) if !final_url.trim().is_empty() => final_url,
            _ => &self.url,
        }
    }
}

/// A broken internal link, identified by its `(url_from, url_to)` pair.
///
/// Records coming from traffic analytics may carry additional fields; those
/// are kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLinkRecord {
    pub url_from: String,
    pub url_to: String,
    #[serde(default = "default_anchor_text")]
    pub anchor_text: String,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub traffic_domain: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BrokenLinkRecord {
    pub fn new(url_from: &str, url_to: &str, anchor_text: &str) -> Self {
        Self {
            url_from: url_from.to_string(),
            url_to: url_to.to_string(),
            anchor_text: anchor_text.to_string(),
            traffic_domain: 0.0,
            extra: Map::new(),
        }
    }

    pub fn with_traffic(mut self, traffic_domain: f64) -> Self {
        self.traffic_domain = traffic_domain;
        self
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.url_from, &self.url_to)
    }
}

fn default_anchor_text() -> String {
    NO_TEXT.to_string()
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Cursor and cache carried between resumable batch calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchState {
    pub batch_start_index: usize,
    #[serde(default)]
    pub broken_urls_cache: Vec<String>,
    #[serde(default)]
    pub working_urls_cache: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiResult {
    pub projected_traffic_lost: f64,
    pub projected_traffic_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedLink {
    #[serde(flatten)]
    pub link: BrokenLinkRecord,
    pub priority: Priority,
}
