// tests/providers_page.rs
use anyhow::{Context, Result};
use aws_update_notifier::ingest::collect_updates;
use aws_update_notifier::ingest::config::builtin_sources;
use aws_update_notifier::ingest::extract::Extractor;
use aws_update_notifier::ingest::providers::PageSource;
use aws_update_notifier::ingest::types::{SourceProvider, UpdateRecord};

const WHATS_NEW: &str = include_str!("fixtures/whats_new.html");
const BLOG: &str = include_str!("fixtures/aws_blog.html");

#[tokio::test]
async fn whats_new_fixture_yields_complete_records() {
    let src = PageSource::from_fixture_str(&builtin_sources()[0], WHATS_NEW).unwrap();
    let items = src.fetch_latest().await.expect("whats new parse ok");

    let titles: Vec<_> = items.iter().map(|u| u.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Amazon S3 now supports conditional deletes",
            "AWS Lambda adds support for Python 3.14",
            "Amazon EC2 M8g instances now available in additional regions",
        ]
    );
    assert!(items.iter().all(|u| u.link.starts_with("https://aws.amazon.com/")));
    assert!(items.iter().all(|u| u.source == "What's New"));
    assert_eq!(items[0].date, "Oct 16, 2026");
}

#[tokio::test]
async fn blog_fixture_respects_cap_and_trims_meta() {
    let src = PageSource::from_fixture_str(&builtin_sources()[1], BLOG).unwrap();
    let items = src.fetch_latest().await.expect("blog parse ok");

    // Cap of 5 containers; the link-less draft among them is dropped.
    assert_eq!(items.len(), 4);
    assert!(items.iter().all(|u| u.title != "Post 6 beyond the cap"));
    assert_eq!(items[0].date, "17 OCT 2026");
    assert_eq!(
        items[1].link,
        "https://aws.amazon.com/blogs/aws/aws-weekly-roundup-2026-10-13/"
    );
    assert!(items.iter().all(|u| u.source == "AWS Blog"));
}

#[tokio::test]
async fn page_with_changed_markup_is_an_error() {
    let src = PageSource::from_fixture_str(&builtin_sources()[1], WHATS_NEW).unwrap();
    assert!(src.fetch_latest().await.is_err());
}

/// Reads `[{"title":..,"date":..,"url":..}]`; leaves `source` for the pipeline to fill.
struct JsonFeedExtractor;

impl Extractor for JsonFeedExtractor {
    fn extract(&self, raw: &str) -> Result<Vec<UpdateRecord>> {
        let items: Vec<serde_json::Value> = serde_json::from_str(raw).context("feed is not a JSON array")?;
        Ok(items
            .iter()
            .filter_map(|v| {
                Some(UpdateRecord::new(
                    v["title"].as_str()?,
                    v["date"].as_str()?,
                    v["url"].as_str()?,
                    "",
                ))
            })
            .collect())
    }
}

#[tokio::test]
async fn custom_extractor_feeds_the_collector_under_the_source_name() {
    let mut cfg = builtin_sources()[0].clone();
    cfg.name = "Release Feed".to_string();
    let feed = r#"[
        {"title": "Amazon EKS supports Kubernetes 1.35", "date": "2026-10-16", "url": "https://aws.amazon.com/eks/1-35"},
        {"title": "Amazon RDS adds PostgreSQL 18", "date": "2026-10-17", "url": "https://aws.amazon.com/rds/pg18"}
    ]"#;
    let src = PageSource::from_fixture_str(&cfg, feed)
        .unwrap()
        .with_extractor(Box::new(JsonFeedExtractor));
    let providers: Vec<Box<dyn SourceProvider>> = vec![Box::new(src)];

    let collected = collect_updates(&providers).await;
    assert!(collected.errors.is_empty());
    let titles: Vec<_> = collected.updates.iter().map(|u| u.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Amazon EKS supports Kubernetes 1.35", "Amazon RDS adds PostgreSQL 18"]
    );
    assert!(collected.updates.iter().all(|u| u.source == "Release Feed"));
    assert_eq!(collected.updates[1].link, "https://aws.amazon.com/rds/pg18");
}

#[tokio::test]
async fn custom_extractor_failure_is_isolated_per_source() {
    let mut cfg = builtin_sources()[0].clone();
    cfg.name = "Release Feed".to_string();
    let broken = PageSource::from_fixture_str(&cfg, "<html>not json</html>")
        .unwrap()
        .with_extractor(Box::new(JsonFeedExtractor));
    let blog = PageSource::from_fixture_str(&builtin_sources()[1], BLOG).unwrap();
    let providers: Vec<Box<dyn SourceProvider>> = vec![Box::new(broken), Box::new(blog)];

    let collected = collect_updates(&providers).await;
    assert_eq!(collected.errors.len(), 1);
    assert_eq!(collected.errors[0].kind(), "source_extraction");
    assert_eq!(collected.updates.len(), 4);
    assert!(collected.updates.iter().all(|u| u.source == "AWS Blog"));
}
