// ABOUTME: Object storage operations used for release artifacts.
// ABOUTME: Upload files, list top-level release prefixes, check prefix existence.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// One file to put into object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub bucket: String,
    pub key: String,
    pub local_path: PathBuf,
    pub content_type: String,
    pub cache_control: Option<String>,
}

/// Object storage: upload, list, existence.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload a local file. Returns the URL of the stored object.
    async fn upload(&self, request: &UploadRequest) -> Result<String, StoreError>;

    /// Top-level prefixes (first path segment followed by `/`) in a bucket.
    async fn list_top_level_prefixes(&self, bucket: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Whether any object key in the bucket starts with `prefix`.
    async fn prefix_exists(&self, bucket: &str, prefix: &str) -> Result<bool, StoreError>;
}

/// Errors from object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("access denied to bucket {bucket}: {message}")]
    AccessDenied { bucket: String, message: String },

    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("cannot read {}: {source}", .path.display())]
    LocalFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("upload of {key} failed: {message}")]
    UploadFailed { key: String, message: String },

    #[error("listing bucket {bucket} failed: {message}")]
    ListFailed { bucket: String, message: String },
}

impl StoreError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, StoreError::AccessDenied { .. })
    }
}
