use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use std::time::Duration;

use super::Notifier;

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: String,
    pub timeout: Duration,
}

/// One message per call over a STARTTLS session with credential login.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn from_settings(s: &SmtpSettings) -> Result<Self> {
        let creds = Credentials::new(s.user.clone(), s.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&s.host)
            .with_context(|| format!("invalid SMTP_HOST {}", s.host))?
            .port(s.port)
            .credentials(creds)
            .timeout(Some(s.timeout))
            .build();

        let from = s.from.parse().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = s.to.parse().context("invalid NOTIFY_EMAIL_TO")?;

        Ok(Self { mailer, from, to })
    }

    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build email")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let msg = self.build_message(subject, body)?;
        self.mailer.send(msg).await.context("send email")?;
        tracing::info!(to = %self.to, "email sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.test".into(),
            port: 587,
            user: "user".into(),
            pass: "pass".into(),
            from: "AWS Updates <sender@example.test>".into(),
            to: "me@example.test".into(),
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn message_is_plain_utf8_to_single_recipient() {
        let sender = EmailNotifier::from_settings(&settings()).unwrap();
        let msg = sender.build_message(super::super::SUBJECT, "Amazon S3 — 新機能").unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("To: me@example.test"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8"));
        assert_eq!(msg.envelope().to().len(), 1);
    }

    #[tokio::test]
    async fn malformed_address_is_rejected() {
        let mut s = settings();
        s.to = "not an address".into();
        assert!(EmailNotifier::from_settings(&s).is_err());
    }
}
