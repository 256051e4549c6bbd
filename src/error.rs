//! Typed failure reasons for each pipeline stage.
//!
//! Adapters speak `anyhow`; the orchestrator only ever sees a `StageError`
//! and decides per variant whether the cycle continues (it always does).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    /// Network or markup failure for one source. The source contributes nothing.
    #[error("source '{source_name}' skipped: {reason:#}")]
    SourceExtraction {
        source_name: String,
        reason: anyhow::Error,
    },

    /// Snapshot missing, unreadable or corrupt. Treated as empty history.
    #[error("last snapshot unavailable: {0:#}")]
    StateLoad(anyhow::Error),

    /// Generation service failed. The summary falls back to a plain listing.
    #[error("summarization service failed: {0:#}")]
    Summarization(anyhow::Error),

    /// Mail transport rejected or never reached. Not retried.
    #[error("notification delivery failed: {0:#}")]
    NotificationDelivery(anyhow::Error),

    /// Snapshot write failed after notification.
    #[error("snapshot save failed: {0:#}")]
    StateSave(anyhow::Error),
}

impl StageError {
    /// Short stable label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::SourceExtraction { .. } => "source_extraction",
            StageError::StateLoad(_) => "state_load",
            StageError::Summarization(_) => "summarization",
            StageError::NotificationDelivery(_) => "notification_delivery",
            StageError::StateSave(_) => "state_save",
        }
    }
}
