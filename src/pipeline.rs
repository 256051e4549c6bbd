//! # Pipeline
//! One cycle: fetch → diff → (nothing new: done) | summarize → notify → persist.
//!
//! Every stage failure is absorbed here; the caller always gets a `RunResult`
//! with status 200. Persisting happens after the notify attempt regardless of
//! its outcome, so an undelivered message is not re-offered next cycle.

use chrono::{Local, NaiveDate};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::diff::new_updates;
use crate::error::StageError;
use crate::ingest::collect_updates;
use crate::ingest::types::SourceProvider;
use crate::notify::{compose_body, Notifier, SUBJECT};
use crate::state::{Snapshot, SnapshotStore};
use crate::summarize::Summarizer;

pub const NO_NEW_UPDATES: &str = "No new updates";

/// Externally observable outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl RunResult {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }
}

pub fn sent_message(count: usize) -> String {
    format!("Sent {count} new update(s)")
}

pub struct Pipeline {
    providers: Vec<Box<dyn SourceProvider>>,
    store: SnapshotStore,
    summarizer: Summarizer,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(
        providers: Vec<Box<dyn SourceProvider>>,
        store: SnapshotStore,
        summarizer: Summarizer,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            providers,
            store,
            summarizer,
            notifier,
        }
    }

    pub async fn run_cycle(&self) -> RunResult {
        self.run_cycle_on(Local::now().date_naive()).await
    }

    /// Same as `run_cycle` with the date printed in the message fixed.
    #[tracing::instrument(level = "info", skip(self), fields(sources = self.providers.len()))]
    pub async fn run_cycle_on(&self, today: NaiveDate) -> RunResult {
        counter!("cycles_total").increment(1);

        // FETCH
        let collected = collect_updates(&self.providers).await;
        info!(
            fetched = collected.updates.len(),
            failed_sources = collected.errors.len(),
            "fetch done"
        );

        // DIFF
        let last = self.store.load_or_empty().await;
        let fresh = new_updates(&collected.updates, &last.updates);
        if fresh.is_empty() {
            info!(known = last.updates.len(), "no new updates; nothing written");
            return RunResult::ok(NO_NEW_UPDATES);
        }
        counter!("updates_new_total").increment(fresh.len() as u64);
        info!(new = fresh.len(), "new updates found");

        // SUMMARIZE
        let summary = self.summarizer.summarize(&fresh).await;
        info!(origin = ?summary.origin, provider = self.summarizer.provider_name(), "summary ready");

        // NOTIFY
        let body = compose_body(today, &summary.text, &fresh);
        if let Err(e) = self.notifier.send(SUBJECT, &body).await {
            let err = StageError::NotificationDelivery(e);
            warn!(error = %err, kind = err.kind(), notifier = self.notifier.name(), "continuing to persist");
            counter!("notify_errors_total").increment(1);
        }

        // PERSIST: the full current aggregate, not just the new subset.
        let snapshot = Snapshot {
            updates: collected.updates,
        };
        if let Err(err) = self.store.save(&snapshot).await {
            warn!(error = %err, kind = err.kind(), key = self.store.key(), "snapshot not saved");
            counter!("state_save_errors_total").increment(1);
        }

        RunResult::ok(sent_message(fresh.len()))
    }
}

/// Entry point for a scheduled trigger. The event payload is not inspected.
pub async fn handle_event(pipeline: &Pipeline, _event: serde_json::Value) -> RunResult {
    pipeline.run_cycle().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_result_wire_shape() {
        let v = serde_json::to_value(RunResult::ok(sent_message(2))).unwrap();
        assert_eq!(v, serde_json::json!({"statusCode": 200, "body": "Sent 2 new update(s)"}));
    }
}
