// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_PATH: &str = "SOURCES_CONFIG_PATH";

fn default_max_items() -> usize {
    10
}

/// One scraped page: where it lives, how items are found, how many to keep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    /// Host used to absolutize relative links. Defaults to the page URL.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    pub item_selector: String,
    pub title_selector: String,
    pub date_selector: String,
    pub link_selector: String,
    /// Keep only the date text before this delimiter ("Oct 1, 2026 | by Jane").
    #[serde(default)]
    pub date_delimiter: Option<String>,
}

/// The two pages the notifier watches out of the box.
pub fn builtin_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "What's New".to_string(),
            url: "https://aws.amazon.com/about-aws/whats-new/recent/".to_string(),
            base_url: Some("https://aws.amazon.com".to_string()),
            max_items: 10,
            item_selector: ".awsm-card-container".to_string(),
            title_selector: ".title-wrapper h3".to_string(),
            date_selector: ".date".to_string(),
            link_selector: "a".to_string(),
            date_delimiter: None,
        },
        SourceConfig {
            name: "AWS Blog".to_string(),
            url: "https://aws.amazon.com/blogs/aws/".to_string(),
            base_url: Some("https://aws.amazon.com".to_string()),
            max_items: 5,
            item_selector: ".blog-post".to_string(),
            title_selector: ".blog-post-title".to_string(),
            date_selector: ".blog-post-meta".to_string(),
            link_selector: ".blog-post-title a".to_string(),
            date_delimiter: Some("|".to_string()),
        },
    ]
}

/// Load sources from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<SourceConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load sources using env var + fallbacks:
/// 1) explicit override (normally $SOURCES_CONFIG_PATH)
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in What's New + AWS Blog
pub fn load_sources_default(override_path: Option<&str>) -> Result<Vec<SourceConfig>> {
    if let Some(p) = override_path {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        }
        bail!("{ENV_PATH} points to non-existent path {}", pb.display());
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(builtin_sources())
}

#[derive(Deserialize)]
struct SourcesFile {
    sources: Vec<SourceConfig>,
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<SourceConfig>> {
    let parsed = if hint_ext == "json" {
        serde_json::from_str::<SourcesFile>(s).map_err(anyhow::Error::from)
    } else {
        toml::from_str::<SourcesFile>(s)
            .map_err(anyhow::Error::from)
            .or_else(|_| serde_json::from_str::<SourcesFile>(s).map_err(anyhow::Error::from))
    };
    let file = parsed.map_err(|e| anyhow!("unsupported sources format: {e}"))?;
    clean_sources(file.sources)
}

fn clean_sources(items: Vec<SourceConfig>) -> Result<Vec<SourceConfig>> {
    let mut out = Vec::with_capacity(items.len());
    for mut it in items {
        it.name = it.name.trim().to_string();
        it.url = it.url.trim().to_string();
        if it.name.is_empty() || it.url.is_empty() {
            tracing::warn!(name = %it.name, "ignoring source without name or url");
            continue;
        }
        if it.max_items == 0 {
            bail!("source '{}' has max_items = 0", it.name);
        }
        if out.iter().any(|o: &SourceConfig| o.name == it.name) {
            bail!("duplicate source name '{}'", it.name);
        }
        out.push(it);
    }
    if out.is_empty() {
        bail!("no usable sources configured");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
[[sources]]
name = " Changelog "
url = "https://example.test/changes"
max_items = 3
item_selector = "li.entry"
title_selector = "h2"
date_selector = "time"
link_selector = "a"

[[sources]]
name = ""
url = "https://example.test/ignored"
item_selector = "x"
title_selector = "x"
date_selector = "x"
link_selector = "x"
"#;

    #[test]
    fn toml_is_trimmed_and_blank_entries_dropped() {
        let v = parse_sources(TOML, "toml").unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].name, "Changelog");
        assert_eq!(v[0].max_items, 3);
        assert_eq!(v[0].base_url, None);
    }

    #[test]
    fn json_format_is_accepted() {
        let json = r#"{"sources":[{"name":"A","url":"https://a.test/","item_selector":".i",
            "title_selector":".t","date_selector":".d","link_selector":"a"}]}"#;
        let v = parse_sources(json, "json").unwrap();
        assert_eq!(v[0].max_items, 10);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut both = builtin_sources();
        both.push(both[0].clone());
        assert!(clean_sources(both).is_err());
    }

    #[test]
    fn builtin_caps_match_deployment() {
        let b = builtin_sources();
        assert_eq!(b[0].name, "What's New");
        assert_eq!(b[0].max_items, 10);
        assert_eq!(b[1].name, "AWS Blog");
        assert_eq!(b[1].max_items, 5);
    }
}
