// Read access to previously scraped pages

use crate::error::{AuditError, Result};
use crate::model::ScrapedPage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub raw_body: Option<String>,
}

/// Stored scrape document as it sits in the object store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSnapshot {
    pub final_url: Option<String>,
    pub scrape_result: Option<ScrapeResult>,
}

impl StoredSnapshot {
    /// Turn the stored document into a page, or `None` when it has no body.
    pub fn into_scraped_page(self, url: &str) -> Option<ScrapedPage> {
        let raw_html = self.scrape_result?.raw_body?;
        Some(ScrapedPage {
            url: url.to_string(),
            final_url: self.final_url,
            raw_html,
        })
    }
}

/// Object store holding scraped page snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch one snapshot. `Ok(None)` means the key does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<StoredSnapshot>>;
}

/// Snapshot store backed by a directory tree: `<root>/<bucket>/<key>`.
pub struct DirectorySnapshotStore {
    root: PathBuf,
}

impl DirectorySnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(key.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AuditError::Snapshot(format!(
                "Refusing to read snapshot outside the store: {}/{}",
                bucket, key
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl SnapshotStore for DirectorySnapshotStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<StoredSnapshot>> {
        let path = self.object_path(bucket, key)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }
}
