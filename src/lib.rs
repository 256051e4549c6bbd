// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod bootstrap;
pub mod config;
pub mod diff;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod state;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::diff::new_updates;
pub use crate::error::StageError;
pub use crate::ingest::types::{SourceProvider, UpdateRecord};
pub use crate::notify::Notifier;
pub use crate::pipeline::{handle_event, Pipeline, RunResult};
pub use crate::state::{BlobStore, Snapshot, SnapshotStore};
pub use crate::summarize::{Summarizer, Summary};
