// src/config.rs
//! Process-wide configuration, built once at startup and passed down.
//! Nothing below `bootstrap` reads the environment.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::ingest::config::{load_sources_default, SourceConfig, ENV_PATH as ENV_SOURCES_PATH};
use crate::notify::SmtpSettings;
use crate::state::s3::S3Settings;

pub const DEFAULT_STATE_KEY: &str = "last_update.json";
pub const DEFAULT_BEDROCK_MODEL: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub enum StateBackend {
    File { dir: PathBuf },
    S3(S3Settings),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    Bedrock { region: String, model_id: String },
    OpenAi { api_key: String, model: String },
    Disabled,
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub provider: ProviderConfig,
    /// Language the generated summary is requested in.
    pub language: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sources: Vec<SourceConfig>,
    pub state: StateBackend,
    pub state_key: String,
    pub summary: SummaryConfig,
    /// `None` → log-only notifier.
    pub smtp: Option<SmtpSettings>,
    /// Applied to every external call (pages, generation, SMTP, S3).
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_or = |k: &str, d: &str| get(k).unwrap_or_else(|| d.to_string());

        let http_timeout = Duration::from_secs(parse_num(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", 30u64)?);

        let sources = load_sources_default(get(ENV_SOURCES_PATH).as_deref())?;

        let state = match get_or("STATE_BACKEND", "file").to_ascii_lowercase().as_str() {
            "file" => StateBackend::File {
                dir: PathBuf::from(get_or("STATE_DIR", "state")),
            },
            "s3" => StateBackend::S3(S3Settings {
                bucket: get("STATE_BUCKET").ok_or_else(|| anyhow!("STATE_BUCKET is required for STATE_BACKEND=s3"))?,
                region: get_or("AWS_REGION", DEFAULT_REGION),
                endpoint: get("STATE_ENDPOINT"),
                timeout: http_timeout,
            }),
            other => bail!("unsupported STATE_BACKEND: {other}"),
        };
        let state_key = get_or("STATE_KEY", DEFAULT_STATE_KEY);
        crate::state::validate_key(&state_key).context("STATE_KEY")?;

        let provider = match get_or("SUMMARY_PROVIDER", "bedrock").to_ascii_lowercase().as_str() {
            "bedrock" => ProviderConfig::Bedrock {
                region: get_or("BEDROCK_REGION", DEFAULT_REGION),
                model_id: get_or("BEDROCK_MODEL_ID", DEFAULT_BEDROCK_MODEL),
            },
            "openai" => ProviderConfig::OpenAi {
                api_key: get("OPENAI_API_KEY").ok_or_else(|| anyhow!("Missing OPENAI_API_KEY env var"))?,
                model: get_or("OPENAI_MODEL", "gpt-4o-mini"),
            },
            "disabled" | "none" => ProviderConfig::Disabled,
            other => bail!("unsupported SUMMARY_PROVIDER: {other}"),
        };
        let summary = SummaryConfig {
            provider,
            language: get_or("SUMMARY_LANGUAGE", "Japanese"),
            max_tokens: parse_num(get("SUMMARY_MAX_TOKENS"), "SUMMARY_MAX_TOKENS", 1000u32)?,
        };

        let smtp = match get("SMTP_HOST") {
            None => None,
            Some(host) => {
                let need = |k: &str| get(k).ok_or_else(|| anyhow!("{k} missing (required with SMTP_HOST)"));
                Some(SmtpSettings {
                    host,
                    port: parse_num(get("SMTP_PORT"), "SMTP_PORT", 587u16)?,
                    user: need("SMTP_USER")?,
                    pass: need("SMTP_PASS")?,
                    from: need("NOTIFY_EMAIL_FROM")?,
                    to: need("NOTIFY_EMAIL_TO")?,
                    timeout: http_timeout,
                })
            }
        };

        Ok(Self {
            sources,
            state,
            state_key,
            summary,
            smtp,
            http_timeout,
        })
    }
}

fn parse_num<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| anyhow!("{key} must be a number, got '{v}'")),
    }
}
