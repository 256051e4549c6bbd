pub mod email;

use anyhow::Result;
use chrono::NaiveDate;

use crate::ingest::types::UpdateRecord;

pub use email::{EmailNotifier, SmtpSettings};

pub const SUBJECT: &str = "[AWS] Latest service updates";

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Plain-text message body: date header, summary, then every new update in full.
pub fn compose_body(today: NaiveDate, summary: &str, updates: &[UpdateRecord]) -> String {
    let details = updates
        .iter()
        .map(|u| {
            format!(
                "- {}\n  Date: {}\n  Source: {}\n  Link: {}",
                u.title, u.date, u.source, u.link
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "AWS latest updates ({})\n\n{}\n\nDetails:\n{}\n\n----\nThis message was sent by the AWS update notifier.\n",
        today.format("%Y-%m-%d"),
        summary.trim_end(),
        details
    )
}

/// Used when no SMTP relay is configured: the message only goes to the log.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        tracing::info!(subject, "email disabled (no SMTP_HOST); message follows\n{body}");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
