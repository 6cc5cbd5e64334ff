// ABOUTME: CDN distribution configuration with optimistic concurrency.
// ABOUTME: Reads return an ETag; writes are rejected when the ETag is stale.

use async_trait::async_trait;
use std::fmt;

use crate::types::{DistributionId, InvalidationId};

/// Concurrency token returned by a distribution config read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag(String);

impl ETag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One origin a distribution pulls content from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginSettings {
    pub id: String,
    pub domain_name: String,
    /// Path under the origin, `/<release id>` for static releases.
    pub origin_path: String,
}

/// The part of a distribution's configuration the release switch touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionConfig {
    pub target_origin_id: String,
    pub compress: bool,
    pub origins: Vec<OriginSettings>,
}

impl DistributionConfig {
    /// Origin path of the first origin, which names the live release.
    pub fn current_origin_path(&self) -> Option<&str> {
        self.origins.first().map(|o| o.origin_path.as_str())
    }
}

/// CDN distribution operations.
#[async_trait]
pub trait EdgeDistribution: Send + Sync {
    /// First distribution whose first origin domain starts with `prefix`.
    async fn find_distribution_by_origin_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<DistributionId>, EdgeError>;

    async fn get_config(&self, id: &DistributionId)
    -> Result<(DistributionConfig, ETag), EdgeError>;

    /// Write `config` only if `etag` still matches the remote state.
    ///
    /// # Errors
    ///
    /// Returns `EdgeError::Conflict` if the distribution changed since the
    /// read that produced `etag`. Nothing is written in that case.
    async fn update_config(
        &self,
        id: &DistributionId,
        config: &DistributionConfig,
        etag: &ETag,
    ) -> Result<(), EdgeError>;

    async fn invalidate(
        &self,
        id: &DistributionId,
        paths: &[&str],
    ) -> Result<InvalidationId, EdgeError>;
}

/// Errors from CDN distribution operations.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    #[error("distribution not found: {0}")]
    NotFound(String),

    #[error(
        "distribution {id} was modified concurrently (etag {etag} is stale); re-run the deployment"
    )]
    Conflict { id: String, etag: String },

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("CDN error: {0}")]
    Api(String),
}

impl EdgeError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, EdgeError::AccessDenied(_))
    }
}
