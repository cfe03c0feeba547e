//! Document Fetcher: reads uploaded resumes back out of the content store.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::analysis::reference::DocumentReference;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("document '{0}' not found")]
    NotFound(String),

    /// Connectivity or service failure. Retryable by the caller.
    #[error("content store unavailable: {0}")]
    TransientIo(String),
}

/// Read-only access to previously uploaded objects.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, reference: &DocumentReference) -> Result<Bytes, FetchError>;
}

/// Fetches from an S3-compatible bucket (AWS, MinIO, Supabase storage).
#[derive(Clone)]
pub struct S3DocumentFetcher {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3DocumentFetcher {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Builds a client from static credentials. A custom endpoint switches to
    /// path-style addressing, which MinIO and most S3 gateways require.
    ///
    /// SDK retries are disabled: a failed read surfaces once as `TransientIo`
    /// and retrying is left to the caller.
    pub async fn connect(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "analyzer-static",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.s3_region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.s3_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.s3_endpoint.is_some())
            .retry_config(RetryConfig::disabled())
            .build();

        Self::new(
            aws_sdk_s3::Client::from_conf(s3_config),
            config.s3_bucket.clone(),
        )
    }
}

#[async_trait]
impl DocumentFetcher for S3DocumentFetcher {
    async fn fetch(&self, reference: &DocumentReference) -> Result<Bytes, FetchError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(reference.as_str())
            .send()
            .await
            .map_err(|err| {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                    || err
                        .raw_response()
                        .map(|r| r.status().as_u16() == 404)
                        .unwrap_or(false);
                if missing {
                    FetchError::NotFound(reference.to_string())
                } else {
                    FetchError::TransientIo(DisplayErrorContext(&err).to_string())
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| FetchError::TransientIo(e.to_string()))?
            .into_bytes();

        debug!(
            "Fetched s3://{}/{} ({} bytes)",
            self.bucket,
            reference,
            bytes.len()
        );
        Ok(bytes)
    }
}
