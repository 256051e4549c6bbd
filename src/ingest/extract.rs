//! Per-source extraction strategies.
//!
//! A page source owns one `Extractor`; markup changes on a site are absorbed
//! here without touching the pipeline.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::ingest::config::SourceConfig;
use crate::ingest::types::UpdateRecord;

pub trait Extractor: Send + Sync {
    /// Turn a raw page body into records, page order, at most the source cap.
    fn extract(&self, raw: &str) -> Result<Vec<UpdateRecord>>;
}

/// CSS-selector driven extraction: item container + title/date/link inside it.
pub struct SelectorExtractor {
    source_name: String,
    base: Url,
    max_items: usize,
    item_rule: String,
    item: Selector,
    title: Selector,
    date: Selector,
    link: Selector,
    date_delimiter: Option<String>,
}

fn parse_selector(rule: &str, field: &str) -> Result<Selector> {
    Selector::parse(rule).map_err(|e| anyhow!("invalid {field} selector '{rule}': {e:?}"))
}

impl SelectorExtractor {
    pub fn from_config(cfg: &SourceConfig) -> Result<Self> {
        let base_raw = cfg.base_url.as_deref().unwrap_or(&cfg.url);
        let base = Url::parse(base_raw)
            .with_context(|| format!("source '{}' has invalid base url {base_raw}", cfg.name))?;

        Ok(Self {
            source_name: cfg.name.clone(),
            base,
            max_items: cfg.max_items,
            item_rule: cfg.item_selector.clone(),
            item: parse_selector(&cfg.item_selector, "item")?,
            title: parse_selector(&cfg.title_selector, "title")?,
            date: parse_selector(&cfg.date_selector, "date")?,
            link: parse_selector(&cfg.link_selector, "link")?,
            date_delimiter: cfg.date_delimiter.clone().filter(|d| !d.is_empty()),
        })
    }

    fn first_text(item: &ElementRef<'_>, sel: &Selector) -> Option<String> {
        item.select(sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    }

    fn absolutize(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        if href.starts_with("http://") || href.starts_with("https://") {
            return Some(href.to_string());
        }
        self.base.join(href).ok().map(String::from)
    }

    fn record_from(&self, item: &ElementRef<'_>) -> Option<UpdateRecord> {
        let title = Self::first_text(item, &self.title).filter(|t| !t.is_empty())?;
        let mut date = Self::first_text(item, &self.date)?;
        if let Some(delim) = &self.date_delimiter {
            date = date
                .split(delim.as_str())
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
        }
        let href = item.select(&self.link).next()?.value().attr("href")?;
        let link = self.absolutize(href)?;

        Some(UpdateRecord {
            title,
            date,
            link,
            source: self.source_name.clone(),
        })
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, raw: &str) -> Result<Vec<UpdateRecord>> {
        let document = Html::parse_document(raw);
        let items: Vec<ElementRef<'_>> = document.select(&self.item).take(self.max_items).collect();
        if items.is_empty() {
            bail!("no elements matched item selector '{}'", self.item_rule);
        }

        let mut out = Vec::with_capacity(items.len());
        for item in &items {
            match self.record_from(item) {
                Some(rec) => out.push(rec),
                None => tracing::debug!(source = %self.source_name, "item missing title/date/link, skipped"),
            }
        }
        Ok(out)
    }
}
