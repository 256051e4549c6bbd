// src/ingest/mod.rs
pub mod config;
pub mod extract;
pub mod providers;
pub mod types;

use crate::error::StageError;
use crate::ingest::types::{SourceProvider, UpdateRecord};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up once a recorder is installed).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("cycles_total", "Pipeline cycles executed.");
        describe_counter!("updates_fetched_total", "Records extracted from sources.");
        describe_counter!(
            "updates_source_errors_total",
            "Sources skipped due to fetch/extract errors."
        );
        describe_counter!("updates_new_total", "Records not present in the last snapshot.");
        describe_counter!(
            "summary_fallback_total",
            "Summaries rendered locally because generation failed."
        );
        describe_counter!("notify_errors_total", "Notification delivery failures.");
        describe_counter!(
            "state_load_errors_total",
            "Snapshot reads that failed (absent snapshot not counted)."
        );
        describe_counter!("state_save_errors_total", "Snapshot writes that failed.");
    });
}

/// Concatenate per-source results in configuration order. No de-duplication here.
pub fn aggregate(per_source: Vec<Vec<UpdateRecord>>) -> Vec<UpdateRecord> {
    per_source.into_iter().flatten().collect()
}

/// Outcome of fetching every source once.
#[derive(Debug, Default)]
pub struct Collected {
    pub updates: Vec<UpdateRecord>,
    pub errors: Vec<StageError>,
}

/// Run every provider once. A failing provider contributes zero records and
/// is reported in `errors`; the others are unaffected.
pub async fn collect_updates(providers: &[Box<dyn SourceProvider>]) -> Collected {
    ensure_metrics_described();

    let mut per_source = Vec::with_capacity(providers.len());
    let mut errors = Vec::new();
    for p in providers {
        match p.fetch_latest().await {
            Ok(mut v) => {
                for rec in v.iter_mut().filter(|r| r.source.is_empty()) {
                    rec.source = p.name().to_string();
                }
                tracing::debug!(source = p.name(), count = v.len(), "source fetched");
                per_source.push(v);
            }
            Err(e) => {
                let err = StageError::SourceExtraction {
                    source_name: p.name().to_string(),
                    reason: e,
                };
                tracing::warn!(error = %err, kind = err.kind(), source = p.name(), "source skipped");
                counter!("updates_source_errors_total").increment(1);
                errors.push(err);
            }
        }
    }

    Collected {
        updates: aggregate(per_source),
        errors,
    }
}
