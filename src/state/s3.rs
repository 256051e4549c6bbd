use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::time::Duration;

use super::{validate_key, BlobStore};

/// Settings for the S3 snapshot bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// S3-compatible endpoint (MinIO, LocalStack); `None` for AWS.
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Credentials come from the default provider chain (env, profile, role).
    #[tracing::instrument(level = "debug", skip(cfg), fields(bucket = %cfg.bucket))]
    pub async fn new(cfg: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(cfg.timeout)
                    .build(),
            );
        if let Some(endpoint) = &cfg.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let mut s3_cfg = aws_sdk_s3::config::Builder::from(&shared);
        if cfg.endpoint.is_some() {
            s3_cfg = s3_cfg.force_path_style(true);
        }

        Self {
            client: Client::from_conf(s3_cfg.build()),
            bucket: cfg.bucket.clone(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    return Ok(None);
                }
                return Err(anyhow::Error::new(e).context("s3 get_object"));
            }
        };

        let data = resp
            .body
            .collect()
            .await
            .context("s3 collect body")?
            .into_bytes();
        Ok(Some(data.to_vec()))
    }

    #[tracing::instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<()> {
        validate_key(key)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json; charset=utf-8")
            .body(ByteStream::from(data))
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}
