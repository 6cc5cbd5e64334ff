// ABOUTME: Static release manager bound to one static bucket.
// ABOUTME: Origin switches use the distribution ETag and never retry on conflict.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::StaticReleaseError;
use crate::artifact::KeyBuilder;
use crate::cloud::{ArtifactStore, EdgeDistribution, UploadRequest};
use crate::config::ContentTypes;
use crate::diagnostics::{Diagnostics, Warning};
use crate::types::{DistributionId, InvalidationId, ReleaseId};

const INVALIDATE_ALL: &str = "/*";

/// Origin id used for a release: `S3-{bucket}/{release_id}`.
pub fn origin_id(bucket: &str, release_id: &ReleaseId) -> String {
    format!("S3-{bucket}/{release_id}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub release_id: String,
    pub current: bool,
}

/// Releases present in the static bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseListing {
    pub releases: Vec<ReleaseEntry>,
    pub distribution: Option<DistributionId>,
}

impl ReleaseListing {
    pub fn current(&self) -> Option<&str> {
        self.releases
            .iter()
            .find(|r| r.current)
            .map(|r| r.release_id.as_str())
    }

    pub fn contains(&self, release_id: &ReleaseId) -> bool {
        self.releases
            .iter()
            .any(|r| r.release_id == release_id.as_str())
    }
}

/// Inputs for uploading one static release.
#[derive(Debug, Clone)]
pub struct StaticUpload<'a> {
    pub source_root: &'a Path,
    pub exclusions: &'a [PathBuf],
    pub keys: &'a KeyBuilder,
    pub content_types: &'a ContentTypes,
    pub cache_control: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Keys uploaded, or planned in a dry run.
    pub keys: Vec<String>,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub distribution: DistributionId,
    pub previous_origin_path: Option<String>,
    /// `None` in a dry run.
    pub invalidation: Option<InvalidationId>,
}

/// Static release operations on one bucket and the distribution serving it.
pub struct StaticReleaseManager<'a> {
    store: &'a dyn ArtifactStore,
    edge: &'a dyn EdgeDistribution,
    bucket: String,
}

impl<'a> StaticReleaseManager<'a> {
    pub fn new(
        store: &'a dyn ArtifactStore,
        edge: &'a dyn EdgeDistribution,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            edge,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn distribution(&self) -> Result<Option<DistributionId>, StaticReleaseError> {
        Ok(self
            .edge
            .find_distribution_by_origin_prefix(&self.bucket)
            .await?)
    }

    /// List the release prefixes in the bucket, marking the one the
    /// distribution currently serves.
    pub async fn list_releases(&self) -> Result<ReleaseListing, StaticReleaseError> {
        let prefixes = self.store.list_top_level_prefixes(&self.bucket).await?;
        let distribution = self.distribution().await?;

        let current = match &distribution {
            Some(id) => {
                let (config, _) = self.edge.get_config(id).await?;
                config
                    .current_origin_path()
                    .map(|p| p.trim_matches('/').to_string())
            }
            None => None,
        };

        let releases = prefixes
            .into_iter()
            .map(|prefix| {
                let release_id = prefix.trim_matches('/').to_string();
                let current = current.as_deref() == Some(release_id.as_str());
                ReleaseEntry { release_id, current }
            })
            .collect::<Vec<_>>();

        for entry in &releases {
            tracing::info!(
                release = %entry.release_id,
                current = entry.current,
                bucket = %self.bucket,
                "static release"
            );
        }

        Ok(ReleaseListing {
            releases,
            distribution,
        })
    }

    /// Upload every file under the source root as release `release_id`.
    ///
    /// # Errors
    ///
    /// Returns `StaticReleaseError::ReleaseExists` before sending anything if
    /// the bucket already holds a prefix for `release_id`.
    pub async fn upload_release(
        &self,
        release_id: &ReleaseId,
        upload: &StaticUpload<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<UploadSummary, StaticReleaseError> {
        if !upload.source_root.is_dir() {
            return Err(StaticReleaseError::MissingSourceRoot(
                upload.source_root.to_path_buf(),
            ));
        }

        if self
            .store
            .prefix_exists(&self.bucket, &release_id.prefix())
            .await?
        {
            return Err(StaticReleaseError::ReleaseExists {
                release_id: release_id.to_string(),
                bucket: self.bucket.clone(),
            });
        }

        let excluded: Vec<PathBuf> = upload
            .exclusions
            .iter()
            .map(|e| upload.source_root.join(e))
            .collect();

        let mut summary = UploadSummary::default();
        for entry in WalkDir::new(upload.source_root).sort_by_file_name() {
            let entry = entry.map_err(|source| StaticReleaseError::Walk {
                path: upload.source_root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            if path
                .parent()
                .is_some_and(|parent| excluded.iter().any(|e| e == parent))
            {
                tracing::debug!(path = %path.display(), "excluded from static release");
                continue;
            }

            let Some(content_type) = upload.content_types.lookup(path) else {
                summary.skipped += 1;
                diagnostics.warn(Warning::skipped_static_file(format!(
                    "Skipping upload of {}, content type could not be determined",
                    path.display()
                )));
                continue;
            };

            let key = upload.keys.static_key(release_id, path)?;
            if upload.dry_run {
                tracing::info!(
                    key = %key,
                    url = %key.url(&self.bucket),
                    "dry run: would upload static file"
                );
            } else {
                self.store
                    .upload(&UploadRequest {
                        bucket: self.bucket.clone(),
                        key: key.as_str().to_string(),
                        local_path: path.to_path_buf(),
                        content_type: content_type.to_string(),
                        cache_control: Some(upload.cache_control.clone()),
                    })
                    .await?;
            }
            summary.keys.push(key.as_str().to_string());
        }

        tracing::info!(
            release = %release_id,
            files = summary.keys.len(),
            skipped = summary.skipped,
            "static release uploaded"
        );
        Ok(summary)
    }

    /// Point the distribution at `release_id` and invalidate its cache.
    ///
    /// # Errors
    ///
    /// Returns `EdgeError::Conflict` (wrapped) if the distribution changed
    /// between the read and the write. Nothing is written in that case.
    pub async fn switch_origin(
        &self,
        release_id: &ReleaseId,
        dry_run: bool,
    ) -> Result<SwitchOutcome, StaticReleaseError> {
        let id = self
            .distribution()
            .await?
            .ok_or_else(|| StaticReleaseError::DistributionNotFound(self.bucket.clone()))?;

        let (mut config, etag) = self.edge.get_config(&id).await?;
        let previous_origin_path = config.current_origin_path().map(str::to_string);

        let new_origin = origin_id(&self.bucket, release_id);
        config.target_origin_id = new_origin.clone();
        config.compress = true;
        for origin in &mut config.origins {
            origin.id = new_origin.clone();
            origin.origin_path = format!("/{release_id}");
        }

        if dry_run {
            tracing::info!(
                distribution = %id,
                from = previous_origin_path.as_deref().unwrap_or("-"),
                to = %format!("/{release_id}"),
                "dry run: would switch distribution origin and invalidate {INVALIDATE_ALL}"
            );
            return Ok(SwitchOutcome {
                distribution: id,
                previous_origin_path,
                invalidation: None,
            });
        }

        self.edge.update_config(&id, &config, &etag).await?;
        let invalidation = self.edge.invalidate(&id, &[INVALIDATE_ALL]).await?;
        tracing::info!(
            distribution = %id,
            release = %release_id,
            invalidation = %invalidation,
            "distribution origin switched"
        );

        Ok(SwitchOutcome {
            distribution: id,
            previous_origin_path,
            invalidation: Some(invalidation),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::memory::{MemoryEdge, MemoryStore};
    use crate::cloud::{DistributionConfig, OriginSettings};

    fn distribution(release: &str) -> DistributionConfig {
        DistributionConfig {
            target_origin_id: format!("S3-static-prod/{release}"),
            compress: false,
            origins: vec![OriginSettings {
                id: format!("S3-static-prod/{release}"),
                domain_name: "static-prod.s3.amazonaws.com".to_string(),
                origin_path: format!("/{release}"),
            }],
        }
    }

    #[tokio::test]
    async fn current_release_is_an_exact_match() {
        let store = MemoryStore::new()
            .with_objects("static-prod", ["rel-1/a.css", "rel-10/a.css", "rel-2/a.css"]);
        let edge = MemoryEdge::new().with_distribution("D1", distribution("rel-10"));
        let manager = StaticReleaseManager::new(&store, &edge, "static-prod");

        let listing = manager.list_releases().await.unwrap();

        assert_eq!(listing.releases.len(), 3);
        assert_eq!(listing.current(), Some("rel-10"));
        assert_eq!(listing.distribution, Some(DistributionId::new("D1")));
    }

    #[tokio::test]
    async fn switch_sets_origin_and_invalidates_everything() {
        let store = MemoryStore::new();
        let edge = MemoryEdge::new().with_distribution("D1", distribution("rel-1"));
        let manager = StaticReleaseManager::new(&store, &edge, "static-prod");
        let release = ReleaseId::new("rel-2").unwrap();

        let outcome = manager.switch_origin(&release, false).await.unwrap();

        assert_eq!(outcome.previous_origin_path.as_deref(), Some("/rel-1"));
        assert!(outcome.invalidation.is_some());
        let config = edge.config("D1").unwrap();
        assert_eq!(config.target_origin_id, "S3-static-prod/rel-2");
        assert_eq!(config.origins[0].id, "S3-static-prod/rel-2");
        assert_eq!(config.origins[0].origin_path, "/rel-2");
        assert!(config.compress);
    }

    #[tokio::test]
    async fn dry_run_switch_reads_but_does_not_write() {
        let store = MemoryStore::new();
        let edge = MemoryEdge::new().with_distribution("D1", distribution("rel-1"));
        let manager = StaticReleaseManager::new(&store, &edge, "static-prod");

        let outcome = manager
            .switch_origin(&ReleaseId::new("rel-2").unwrap(), true)
            .await
            .unwrap();

        assert!(outcome.invalidation.is_none());
        assert!(edge.mutating_calls().is_empty());
        assert_eq!(edge.config("D1").unwrap().origins[0].origin_path, "/rel-1");
    }

    #[tokio::test]
    async fn missing_distribution_is_an_error() {
        let store = MemoryStore::new();
        let edge = MemoryEdge::new();
        let manager = StaticReleaseManager::new(&store, &edge, "static-prod");

        let err = manager
            .switch_origin(&ReleaseId::new("rel-2").unwrap(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, StaticReleaseError::DistributionNotFound(_)));
    }
}
