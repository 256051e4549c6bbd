use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use std::time::Duration;

use crate::ingest::config::SourceConfig;
use crate::ingest::extract::{Extractor, SelectorExtractor};
use crate::ingest::types::{SourceProvider, UpdateRecord};

/// An HTML page scraped with a pluggable extractor.
pub struct PageSource {
    name: String,
    mode: Mode,
    extractor: Box<dyn Extractor>,
}

enum Mode {
    // Owned copy of the page body; used by tests and offline runs.
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
        timeout: Duration,
    },
}

impl PageSource {
    /// Live source: one GET per fetch, no retries.
    pub fn from_config(cfg: &SourceConfig, client: reqwest::Client, timeout: Duration) -> Result<Self> {
        let extractor = SelectorExtractor::from_config(cfg)?;
        Ok(Self {
            name: cfg.name.clone(),
            mode: Mode::Http {
                url: cfg.url.clone(),
                client,
                timeout,
            },
            extractor: Box::new(extractor),
        })
    }

    /// Offline source over a fixed body, same extraction rules as the live one.
    pub fn from_fixture_str(cfg: &SourceConfig, body: &str) -> Result<Self> {
        let extractor = SelectorExtractor::from_config(cfg)?;
        Ok(Self {
            name: cfg.name.clone(),
            mode: Mode::Fixture(body.to_string()),
            extractor: Box::new(extractor),
        })
    }

    /// Swap in a custom extraction strategy (e.g. a JSON feed behind the same name).
    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    async fn fetch_body(&self) -> Result<String> {
        match &self.mode {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http {
                url,
                client,
                timeout,
            } => {
                let resp = client
                    .get(url)
                    .timeout(*timeout)
                    .send()
                    .await
                    .with_context(|| format!("GET {url}"))?
                    .error_for_status()
                    .with_context(|| format!("page returned error status: {url}"))?;
                resp.text().await.context("read page body")
            }
        }
    }
}

#[async_trait]
impl SourceProvider for PageSource {
    async fn fetch_latest(&self) -> Result<Vec<UpdateRecord>> {
        let body = self.fetch_body().await?;
        let out = self
            .extractor
            .extract(&body)
            .with_context(|| format!("extracting {}", self.name))?;
        counter!("updates_fetched_total").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
