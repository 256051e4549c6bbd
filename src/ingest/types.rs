// src/ingest/types.rs
use anyhow::Result;

/// One announcement item. `title` is the identity key across runs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct UpdateRecord {
    pub title: String,
    pub date: String,   // free-form, as printed by the source
    pub link: String,   // absolute URL
    pub source: String, // e.g. "What's New", "AWS Blog"
}

impl UpdateRecord {
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        link: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            link: link.into(),
            source: source.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    /// Retrieve and extract the current items, page order, capped per source.
    async fn fetch_latest(&self) -> Result<Vec<UpdateRecord>>;
    fn name(&self) -> &str;
}
