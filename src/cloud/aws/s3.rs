// ABOUTME: S3-backed artifact store.
// ABOUTME: Uploads files with content metadata and lists release prefixes.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use std::collections::BTreeSet;

use super::is_access_denied_code;
use crate::cloud::{ArtifactStore, StoreError, UploadRequest, object_url};

#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Use an explicitly configured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn message<E>(error: &E) -> String
where
    E: ProvideErrorMetadata + std::error::Error,
{
    error
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(error).to_string())
}

fn map_list_error<E>(error: &E, bucket: &str) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error.code() {
        code if is_access_denied_code(code) => StoreError::AccessDenied {
            bucket: bucket.to_string(),
            message: message(error),
        },
        Some("NoSuchBucket") => StoreError::BucketNotFound(bucket.to_string()),
        _ => StoreError::ListFailed {
            bucket: bucket.to_string(),
            message: message(error),
        },
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    async fn upload(&self, request: &UploadRequest) -> Result<String, StoreError> {
        let body = ByteStream::from_path(&request.local_path)
            .await
            .map_err(|e| StoreError::LocalFile {
                path: request.local_path.clone(),
                source: std::io::Error::other(e),
            })?;

        self.client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(body)
            .content_type(&request.content_type)
            .set_cache_control(request.cache_control.clone())
            .send()
            .await
            .map_err(|e| match e.code() {
                code if is_access_denied_code(code) => StoreError::AccessDenied {
                    bucket: request.bucket.clone(),
                    message: message(&e),
                },
                Some("NoSuchBucket") => StoreError::BucketNotFound(request.bucket.clone()),
                _ => StoreError::UploadFailed {
                    key: request.key.clone(),
                    message: message(&e),
                },
            })?;

        tracing::debug!(bucket = %request.bucket, key = %request.key, "uploaded object");
        Ok(object_url(&request.bucket, &request.key))
    }

    async fn list_top_level_prefixes(&self, bucket: &str) -> Result<BTreeSet<String>, StoreError> {
        let mut prefixes = BTreeSet::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .delimiter("/")
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| map_list_error(&e, bucket))?;

            prefixes.extend(
                page.common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix())
                    .map(str::to_string),
            );

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(prefixes)
    }

    async fn prefix_exists(&self, bucket: &str, prefix: &str) -> Result<bool, StoreError> {
        let page = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| map_list_error(&e, bucket))?;

        Ok(page.key_count().unwrap_or(0) > 0 || !page.contents().is_empty())
    }
}
