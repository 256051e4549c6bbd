//! Generation providers behind the summarizer.
//! Each provider does one bounded remote call and reports failure as `Err`;
//! the caller owns the fallback.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::config::Region;
use aws_sdk_bedrockruntime::primitives::Blob;
use serde::{Deserialize, Serialize};

pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Low-level provider: does a *real* remote call (or pretends to, in tests).
pub trait GenerationProvider: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str, max_tokens: u32) -> GenerateFuture<'a>;
    fn name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynProvider = Arc<dyn GenerationProvider>;

pub const ANTHROPIC_BEDROCK_VERSION: &str = "bedrock-2023-05-31";

// ------------------------------------------------------------
// Bedrock (Anthropic messages API)
// ------------------------------------------------------------

pub struct BedrockProvider {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl BedrockProvider {
    pub async fn new(region: &str, model_id: &str, timeout: Duration) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build())
            .load()
            .await;
        Self {
            client: aws_sdk_bedrockruntime::Client::new(&shared),
            model_id: model_id.to_string(),
        }
    }

    pub fn request_body(prompt: &str, max_tokens: u32) -> Result<Vec<u8>> {
        let req = MessagesRequest {
            anthropic_version: ANTHROPIC_BEDROCK_VERSION,
            max_tokens,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };
        serde_json::to_vec(&req).context("encode bedrock request")
    }

    /// Concatenate the text blocks of an Anthropic messages response.
    pub fn parse_response(body: &[u8]) -> Result<String> {
        let resp: MessagesResponse =
            serde_json::from_slice(body).context("decode bedrock response")?;
        let text = resp
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            bail!("bedrock response carried no text content");
        }
        Ok(text)
    }
}

impl GenerationProvider for BedrockProvider {
    fn generate<'a>(&'a self, prompt: &'a str, max_tokens: u32) -> GenerateFuture<'a> {
        Box::pin(async move {
            let body = Self::request_body(prompt, max_tokens)?;
            let resp = self
                .client
                .invoke_model()
                .model_id(&self.model_id)
                .content_type("application/json")
                .accept("application/json")
                .body(Blob::new(body))
                .send()
                .await
                .with_context(|| format!("bedrock invoke_model {}", self.model_id))?;
            Self::parse_response(resp.body().as_ref())
        })
    }

    fn name(&self) -> &'static str {
        "bedrock"
    }
}

// ------------------------------------------------------------
// OpenAI (Chat Completions API)
// ------------------------------------------------------------

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("aws-update-notifier/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("build openai http client")?;
        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or("gpt-4o-mini").to_string(),
        })
    }
}

impl GenerationProvider for OpenAiProvider {
    fn generate<'a>(&'a self, prompt: &'a str, max_tokens: u32) -> GenerateFuture<'a> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                bail!("OPENAI_API_KEY is empty");
            }

            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                temperature: f32,
                max_tokens: u32,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: String,
            }

            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: "You summarize cloud service announcements for engineers. Be concise and technical.",
                    },
                    Msg {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: 0.2,
                max_tokens,
            };

            let body: Resp = self
                .http
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .context("openai request")?
                .error_for_status()
                .context("openai non-2xx")?
                .json()
                .await
                .context("decode openai response")?;

            body.choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| anyhow!("openai response had no choices"))
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Local providers
// ------------------------------------------------------------

/// Always fails; the summarizer then renders the plain listing.
pub struct DisabledProvider;

impl GenerationProvider for DisabledProvider {
    fn generate<'a>(&'a self, _prompt: &'a str, _max_tokens: u32) -> GenerateFuture<'a> {
        Box::pin(async { Err(anyhow!("generation disabled")) })
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns a fixed text; for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl MockProvider {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }
}

impl GenerationProvider for MockProvider {
    fn generate<'a>(&'a self, _prompt: &'a str, _max_tokens: u32) -> GenerateFuture<'a> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bedrock_request_carries_version_and_cap() {
        let body = BedrockProvider::request_body("hello", 1000).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(v["max_tokens"], 1000);
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["messages"][0]["content"], "hello");
    }

    #[test]
    fn bedrock_response_text_blocks_are_joined() {
        let body = br#"{"id":"m","content":[{"type":"text","text":"First"},{"type":"tool_use"},{"type":"text","text":"Second"}]}"#;
        assert_eq!(BedrockProvider::parse_response(body).unwrap(), "First\nSecond");
    }

    #[test]
    fn bedrock_response_without_text_is_error() {
        assert!(BedrockProvider::parse_response(br#"{"content":[]}"#).is_err());
        assert!(BedrockProvider::parse_response(b"not json").is_err());
    }

    #[tokio::test]
    async fn disabled_provider_always_errors() {
        assert!(DisabledProvider.generate("x", 10).await.is_err());
    }
}
