//! Summarizer: prose for the new updates, via a generation provider with a
//! deterministic local fallback. Summarization never loses the notification.

pub mod providers;

use metrics::counter;
use std::sync::Arc;

use crate::error::StageError;
use crate::ingest::types::UpdateRecord;

pub use providers::{
    BedrockProvider, DisabledProvider, DynProvider, GenerationProvider, MockProvider,
    OpenAiProvider,
};

pub const NO_UPDATES_MESSAGE: &str = "No new updates.";

/// Where the summary text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOrigin {
    Generated,
    Fallback,
    NoUpdates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    pub origin: SummaryOrigin,
}

pub struct Summarizer {
    provider: DynProvider,
    language: String,
    max_tokens: u32,
}

impl Summarizer {
    pub fn new(provider: DynProvider, language: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            language: language.into(),
            max_tokens,
        }
    }

    /// Summarizer that always renders the local listing.
    pub fn fallback_only() -> Self {
        Self::new(Arc::new(DisabledProvider), "English", 0)
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn prompt(&self, updates: &[UpdateRecord]) -> String {
        build_prompt(&self.language, updates)
    }

    pub async fn summarize(&self, updates: &[UpdateRecord]) -> Summary {
        if updates.is_empty() {
            return Summary {
                text: NO_UPDATES_MESSAGE.to_string(),
                origin: SummaryOrigin::NoUpdates,
            };
        }

        let prompt = self.prompt(updates);
        let generated = self
            .provider
            .generate(&prompt, self.max_tokens)
            .await
            .and_then(|text| {
                let text = text.trim().to_string();
                if text.is_empty() {
                    anyhow::bail!("provider returned empty text");
                }
                Ok(text)
            })
            .map_err(StageError::Summarization);

        match generated {
            Ok(text) => Summary {
                text,
                origin: SummaryOrigin::Generated,
            },
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), provider = self.provider.name(), "falling back to plain listing");
                counter!("summary_fallback_total").increment(1);
                Summary {
                    text: render_fallback(updates),
                    origin: SummaryOrigin::Fallback,
                }
            }
        }
    }
}

pub fn build_prompt(language: &str, updates: &[UpdateRecord]) -> String {
    let lines = updates
        .iter()
        .map(|u| format!("- {} ({})", u.title, u.source))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Summarize the following AWS service updates concisely in {language} and list the key points.\n\
         Also mention anything especially notable from a technical point of view and how it could be put to use.\n\
         \n\
         {lines}\n"
    )
}

/// Plain listing used when generation is unavailable.
pub fn render_fallback(updates: &[UpdateRecord]) -> String {
    updates
        .iter()
        .map(|u| format!("- {} ({})\n  {}", u.title, u.date, u.link))
        .collect::<Vec<_>>()
        .join("\n")
}
