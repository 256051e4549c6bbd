// src/bootstrap.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, ProviderConfig, StateBackend};
use crate::ingest::providers::PageSource;
use crate::ingest::types::SourceProvider;
use crate::notify::{EmailNotifier, LogNotifier, Notifier};
use crate::pipeline::Pipeline;
use crate::state::{BlobStore, FileBlobStore, S3BlobStore, SnapshotStore};
use crate::summarize::{
    BedrockProvider, DisabledProvider, DynProvider, OpenAiProvider, Summarizer,
};

/// Wire every component from one config value. Fails only on invalid config.
pub async fn build_pipeline(cfg: &AppConfig) -> Result<Pipeline> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("aws-update-notifier/", env!("CARGO_PKG_VERSION")))
        .timeout(cfg.http_timeout)
        .build()
        .context("build http client")?;

    let providers = cfg
        .sources
        .iter()
        .map(|s| {
            PageSource::from_config(s, http.clone(), cfg.http_timeout)
                .map(|p| Box::new(p) as Box<dyn SourceProvider>)
        })
        .collect::<Result<Vec<_>>>()?;

    let blob: Arc<dyn BlobStore> = match &cfg.state {
        StateBackend::File { dir } => Arc::new(FileBlobStore::new(dir.clone())),
        StateBackend::S3(s3) => Arc::new(S3BlobStore::new(s3).await),
    };
    let store = SnapshotStore::new(blob.clone(), cfg.state_key.clone());

    let provider: DynProvider = match &cfg.summary.provider {
        ProviderConfig::Bedrock { region, model_id } => {
            Arc::new(BedrockProvider::new(region, model_id, cfg.http_timeout).await)
        }
        ProviderConfig::OpenAi { api_key, model } => Arc::new(OpenAiProvider::new(
            api_key.clone(),
            Some(model.as_str()),
            cfg.http_timeout,
        )?),
        ProviderConfig::Disabled => Arc::new(DisabledProvider),
    };
    let summarizer = Summarizer::new(provider, cfg.summary.language.clone(), cfg.summary.max_tokens);

    let notifier: Arc<dyn Notifier> = match &cfg.smtp {
        Some(smtp) => Arc::new(EmailNotifier::from_settings(smtp)?),
        None => Arc::new(LogNotifier),
    };

    // Safe diagnostics only: no credentials.
    info!(
        sources = providers.len(),
        state = %blob.describe(),
        key = %cfg.state_key,
        summarizer = summarizer.provider_name(),
        notifier = notifier.name(),
        "pipeline wired"
    );

    Ok(Pipeline::new(providers, store, summarizer, notifier))
}
