// ABOUTME: In-memory backends that record every call.
// ABOUTME: Used by tests and dry-run checks to assert which remote operations happened.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

use super::{
    ArtifactStore, DistributionConfig, ETag, EdgeDistribution, EdgeError, OnFailure, StackError,
    StackOrchestrator, StackRequest, StoreError, UploadRequest, object_url,
};
use crate::types::{DistributionId, InvalidationId, StackName, StackParameters, TemplateRef};

// =============================================================================
// Object storage
// =============================================================================

/// Object storage held in memory. Uploads are recorded in order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeSet<String>>>,
    uploads: Mutex<Vec<UploadRequest>>,
    denied: Mutex<BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a bucket with existing keys.
    pub fn with_objects<I, S>(self, bucket: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buckets
            .lock()
            .entry(bucket.to_string())
            .or_default()
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Make every operation on `bucket` fail with access denied.
    pub fn deny(self, bucket: &str) -> Self {
        self.denied.lock().insert(bucket.to_string());
        self
    }

    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().clone()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .get(bucket)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn check_access(&self, bucket: &str) -> Result<(), StoreError> {
        if self.denied.lock().contains(bucket) {
            return Err(StoreError::AccessDenied {
                bucket: bucket.to_string(),
                message: "Access Denied".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn upload(&self, request: &UploadRequest) -> Result<String, StoreError> {
        self.check_access(&request.bucket)?;
        self.buckets
            .lock()
            .entry(request.bucket.clone())
            .or_default()
            .insert(request.key.clone());
        self.uploads.lock().push(request.clone());
        Ok(object_url(&request.bucket, &request.key))
    }

    async fn list_top_level_prefixes(&self, bucket: &str) -> Result<BTreeSet<String>, StoreError> {
        self.check_access(bucket)?;
        let buckets = self.buckets.lock();
        let Some(keys) = buckets.get(bucket) else {
            return Err(StoreError::BucketNotFound(bucket.to_string()));
        };
        Ok(keys
            .iter()
            .filter_map(|key| key.split_once('/').map(|(first, _)| format!("{first}/")))
            .collect())
    }

    async fn prefix_exists(&self, bucket: &str, prefix: &str) -> Result<bool, StoreError> {
        self.check_access(bucket)?;
        Ok(self
            .buckets
            .lock()
            .get(bucket)
            .is_some_and(|keys| keys.iter().any(|k| k.starts_with(prefix))))
    }
}

// =============================================================================
// Stack orchestration
// =============================================================================

/// A recorded stack orchestrator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackCall {
    Describe(StackName),
    Create {
        request: StackRequest,
        on_failure: OnFailure,
    },
    Update(StackRequest),
    Validate(TemplateRef),
}

impl StackCall {
    pub fn is_mutating(&self) -> bool {
        matches!(self, StackCall::Create { .. } | StackCall::Update(_))
    }
}

/// Stacks held in memory. Templates can be marked invalid by substring.
#[derive(Debug, Default)]
pub struct MemoryStacks {
    stacks: Mutex<BTreeMap<String, StackParameters>>,
    calls: Mutex<Vec<StackCall>>,
    rejected: Mutex<Vec<String>>,
}

impl MemoryStacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing stack with its current parameters.
    pub fn with_stack(self, stack: &str, parameters: StackParameters) -> Self {
        self.stacks.lock().insert(stack.to_string(), parameters);
        self
    }

    /// Fail validation of any template whose URL or body contains `needle`.
    pub fn reject_templates_containing(self, needle: &str) -> Self {
        self.rejected.lock().push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<StackCall> {
        self.calls.lock().clone()
    }

    pub fn mutating_calls(&self) -> Vec<StackCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.is_mutating())
            .cloned()
            .collect()
    }

    pub fn parameters(&self, stack: &str) -> Option<StackParameters> {
        self.stacks.lock().get(stack).cloned()
    }
}

#[async_trait]
impl StackOrchestrator for MemoryStacks {
    async fn describe_stack(
        &self,
        stack: &StackName,
    ) -> Result<Option<StackParameters>, StackError> {
        self.calls.lock().push(StackCall::Describe(stack.clone()));
        Ok(self.stacks.lock().get(stack.as_str()).cloned())
    }

    async fn create_stack(
        &self,
        request: &StackRequest,
        on_failure: OnFailure,
    ) -> Result<(), StackError> {
        self.calls.lock().push(StackCall::Create {
            request: request.clone(),
            on_failure,
        });
        let mut stacks = self.stacks.lock();
        if stacks.contains_key(request.stack.as_str()) {
            return Err(StackError::OperationFailed {
                stack: request.stack.to_string(),
                operation: "create",
                message: "stack already exists".to_string(),
            });
        }
        stacks.insert(request.stack.to_string(), request.parameters.clone());
        Ok(())
    }

    async fn update_stack(&self, request: &StackRequest) -> Result<(), StackError> {
        self.calls.lock().push(StackCall::Update(request.clone()));
        let mut stacks = self.stacks.lock();
        match stacks.get_mut(request.stack.as_str()) {
            Some(current) => {
                *current = request.parameters.clone();
                Ok(())
            }
            None => Err(StackError::OperationFailed {
                stack: request.stack.to_string(),
                operation: "update",
                message: "stack does not exist".to_string(),
            }),
        }
    }

    async fn validate_template(&self, template: &TemplateRef) -> Result<(), StackError> {
        self.calls.lock().push(StackCall::Validate(template.clone()));
        let text = match template {
            TemplateRef::Url(url) => url.as_str(),
            TemplateRef::Body(body) => body.as_str(),
        };
        if let Some(needle) = self.rejected.lock().iter().find(|n| text.contains(n.as_str())) {
            return Err(StackError::InvalidTemplate(format!(
                "template rejected: contains '{needle}'"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// CDN distribution
// =============================================================================

/// A recorded CDN call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeCall {
    Find(String),
    GetConfig(DistributionId),
    UpdateConfig {
        id: DistributionId,
        config: DistributionConfig,
    },
    Invalidate {
        id: DistributionId,
        paths: Vec<String>,
    },
}

impl EdgeCall {
    pub fn is_mutating(&self) -> bool {
        matches!(self, EdgeCall::UpdateConfig { .. } | EdgeCall::Invalidate { .. })
    }
}

#[derive(Debug)]
struct StoredDistribution {
    config: DistributionConfig,
    version: u64,
}

/// Distributions held in memory. Every successful write bumps the ETag.
#[derive(Debug, Default)]
pub struct MemoryEdge {
    distributions: Mutex<BTreeMap<String, StoredDistribution>>,
    calls: Mutex<Vec<EdgeCall>>,
    invalidations: Mutex<u64>,
}

impl MemoryEdge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distribution(self, id: &str, config: DistributionConfig) -> Self {
        self.distributions
            .lock()
            .insert(id.to_string(), StoredDistribution { config, version: 1 });
        self
    }

    /// Simulate another writer changing the distribution.
    pub fn touch(&self, id: &str) {
        if let Some(stored) = self.distributions.lock().get_mut(id) {
            stored.version += 1;
        }
    }

    pub fn config(&self, id: &str) -> Option<DistributionConfig> {
        self.distributions.lock().get(id).map(|d| d.config.clone())
    }

    pub fn calls(&self) -> Vec<EdgeCall> {
        self.calls.lock().clone()
    }

    pub fn mutating_calls(&self) -> Vec<EdgeCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.is_mutating())
            .cloned()
            .collect()
    }

    fn etag(version: u64) -> ETag {
        ETag::new(format!("E{version}"))
    }
}

#[async_trait]
impl EdgeDistribution for MemoryEdge {
    async fn find_distribution_by_origin_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<DistributionId>, EdgeError> {
        self.calls.lock().push(EdgeCall::Find(prefix.to_string()));
        Ok(self
            .distributions
            .lock()
            .iter()
            .find(|(_, d)| {
                d.config
                    .origins
                    .first()
                    .is_some_and(|o| o.domain_name.starts_with(prefix))
            })
            .map(|(id, _)| DistributionId::new(id.clone())))
    }

    async fn get_config(
        &self,
        id: &DistributionId,
    ) -> Result<(DistributionConfig, ETag), EdgeError> {
        self.calls.lock().push(EdgeCall::GetConfig(id.clone()));
        self.distributions
            .lock()
            .get(id.as_str())
            .map(|d| (d.config.clone(), Self::etag(d.version)))
            .ok_or_else(|| EdgeError::NotFound(id.to_string()))
    }

    async fn update_config(
        &self,
        id: &DistributionId,
        config: &DistributionConfig,
        etag: &ETag,
    ) -> Result<(), EdgeError> {
        let mut distributions = self.distributions.lock();
        let stored = distributions
            .get_mut(id.as_str())
            .ok_or_else(|| EdgeError::NotFound(id.to_string()))?;
        if Self::etag(stored.version) != *etag {
            return Err(EdgeError::Conflict {
                id: id.to_string(),
                etag: etag.to_string(),
            });
        }
        stored.config = config.clone();
        stored.version += 1;
        self.calls.lock().push(EdgeCall::UpdateConfig {
            id: id.clone(),
            config: config.clone(),
        });
        Ok(())
    }

    async fn invalidate(
        &self,
        id: &DistributionId,
        paths: &[&str],
    ) -> Result<InvalidationId, EdgeError> {
        if !self.distributions.lock().contains_key(id.as_str()) {
            return Err(EdgeError::NotFound(id.to_string()));
        }
        self.calls.lock().push(EdgeCall::Invalidate {
            id: id.clone(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
        });
        let mut counter = self.invalidations.lock();
        *counter += 1;
        Ok(InvalidationId::new(format!("I{counter}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::OriginSettings;
    use std::path::PathBuf;

    fn distribution(path: &str) -> DistributionConfig {
        DistributionConfig {
            target_origin_id: "S3-static/rel-0".to_string(),
            compress: false,
            origins: vec![OriginSettings {
                id: "S3-static/rel-0".to_string(),
                domain_name: "static.s3.amazonaws.com".to_string(),
                origin_path: path.to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn lists_first_segments_only() {
        let store =
            MemoryStore::new().with_objects("b", ["rel-1/index.html", "rel-1/a/b.css", "rel-2/x", "top"]);
        let prefixes = store.list_top_level_prefixes("b").await.unwrap();
        assert_eq!(
            prefixes.into_iter().collect::<Vec<_>>(),
            vec!["rel-1/".to_string(), "rel-2/".to_string()]
        );
    }

    #[tokio::test]
    async fn denied_bucket_refuses_upload() {
        let store = MemoryStore::new().deny("b");
        let err = store
            .upload(&UploadRequest {
                bucket: "b".to_string(),
                key: "k".to_string(),
                local_path: PathBuf::from("k"),
                content_type: "text/plain".to_string(),
                cache_control: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_access_denied());
        assert!(store.uploads().is_empty());
    }

    #[tokio::test]
    async fn stale_etag_is_a_conflict_and_writes_nothing() {
        let edge = MemoryEdge::new().with_distribution("D1", distribution("/rel-0"));
        let id = DistributionId::new("D1");
        let (mut config, etag) = edge.get_config(&id).await.unwrap();
        edge.touch("D1");

        config.origins[0].origin_path = "/rel-1".to_string();
        let err = edge.update_config(&id, &config, &etag).await.unwrap_err();

        assert!(matches!(err, EdgeError::Conflict { .. }));
        assert_eq!(edge.config("D1").unwrap().current_origin_path(), Some("/rel-0"));
        assert!(edge.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn finds_distribution_by_first_origin_domain() {
        let edge = MemoryEdge::new().with_distribution("D1", distribution("/rel-0"));
        let found = edge.find_distribution_by_origin_prefix("static.").await.unwrap();
        assert_eq!(found, Some(DistributionId::new("D1")));
        assert_eq!(edge.find_distribution_by_origin_prefix("other.").await.unwrap(), None);
    }
}
