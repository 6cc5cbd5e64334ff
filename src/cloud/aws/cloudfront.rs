// ABOUTME: CloudFront-backed CDN distribution operations.
// ABOUTME: Conditional config writes with If-Match and wildcard cache invalidation.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudfront::types::{DistributionConfig as CfDistributionConfig, InvalidationBatch, Paths};

use super::is_access_denied_code;
use crate::cloud::{DistributionConfig, ETag, EdgeDistribution, EdgeError, OriginSettings};
use crate::types::{DistributionId, InvalidationId};

#[derive(Debug, Clone)]
pub struct CloudFrontEdge {
    client: Client,
}

impl CloudFrontEdge {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, id: &DistributionId) -> Result<(CfDistributionConfig, ETag), EdgeError> {
        let output = self
            .client
            .get_distribution_config()
            .id(id.as_str())
            .send()
            .await
            .map_err(|e| map_error(&e, id))?;

        let etag = output
            .e_tag()
            .map(ETag::new)
            .ok_or_else(|| EdgeError::Api(format!("distribution {id} returned no ETag")))?;
        let config = output
            .distribution_config
            .ok_or_else(|| EdgeError::Api(format!("distribution {id} returned no config")))?;
        Ok((config, etag))
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

fn map_error<E>(error: &E, id: &DistributionId) -> EdgeError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error.code() {
        code if is_access_denied_code(code) => EdgeError::AccessDenied(message(error)),
        Some("NoSuchDistribution") => EdgeError::NotFound(id.to_string()),
        _ => EdgeError::Api(message(error)),
    }
}

fn to_model(config: &CfDistributionConfig) -> DistributionConfig {
    let behavior = config.default_cache_behavior();
    DistributionConfig {
        target_origin_id: behavior
            .map(|b| b.target_origin_id().to_string())
            .unwrap_or_default(),
        compress: behavior.and_then(|b| b.compress()).unwrap_or(false),
        origins: config
            .origins()
            .map(|o| o.items())
            .unwrap_or_default()
            .iter()
            .map(|o| OriginSettings {
                id: o.id().to_string(),
                domain_name: o.domain_name().to_string(),
                origin_path: o.origin_path().unwrap_or_default().to_string(),
            })
            .collect(),
    }
}

/// Copy the fields the release switch manages onto the full service config.
fn apply_model(raw: &mut CfDistributionConfig, model: &DistributionConfig) {
    if let Some(behavior) = raw.default_cache_behavior.as_mut() {
        behavior.target_origin_id = model.target_origin_id.clone();
        behavior.compress = Some(model.compress);
    }
    if let Some(origins) = raw.origins.as_mut() {
        for (origin, wanted) in origins.items.iter_mut().zip(&model.origins) {
            origin.id = wanted.id.clone();
            origin.origin_path = Some(wanted.origin_path.clone());
        }
    }
}

#[async_trait]
impl EdgeDistribution for CloudFrontEdge {
    async fn find_distribution_by_origin_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<DistributionId>, EdgeError> {
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_distributions()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| match e.code() {
                    code if is_access_denied_code(code) => EdgeError::AccessDenied(message(&e)),
                    _ => EdgeError::Api(message(&e)),
                })?;

            let Some(list) = output.distribution_list() else {
                return Ok(None);
            };

            let found = list.items().iter().find(|summary| {
                summary
                    .origins()
                    .and_then(|o| o.items().first())
                    .is_some_and(|o| o.domain_name().starts_with(prefix))
            });
            if let Some(summary) = found {
                return Ok(Some(DistributionId::new(summary.id())));
            }

            match list.next_marker() {
                Some(next) if list.is_truncated() => marker = Some(next.to_string()),
                _ => return Ok(None),
            }
        }
    }

    async fn get_config(
        &self,
        id: &DistributionId,
    ) -> Result<(DistributionConfig, ETag), EdgeError> {
        let (raw, etag) = self.fetch(id).await?;
        Ok((to_model(&raw), etag))
    }

    async fn update_config(
        &self,
        id: &DistributionId,
        config: &DistributionConfig,
        etag: &ETag,
    ) -> Result<(), EdgeError> {
        // The write is conditioned on the caller's etag, not the one from this re-read.
        let (mut raw, _) = self.fetch(id).await?;
        apply_model(&mut raw, config);

        self.client
            .update_distribution()
            .id(id.as_str())
            .if_match(etag.as_str())
            .distribution_config(raw)
            .send()
            .await
            .map_err(|e| match e.code() {
                Some("PreconditionFailed") | Some("InvalidIfMatchVersion") => EdgeError::Conflict {
                    id: id.to_string(),
                    etag: etag.to_string(),
                },
                _ => map_error(&e, id),
            })?;

        tracing::info!(distribution = %id, "distribution config updated");
        Ok(())
    }

    async fn invalidate(
        &self,
        id: &DistributionId,
        paths: &[&str],
    ) -> Result<InvalidationId, EdgeError> {
        let items: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        let paths = Paths::builder()
            .quantity(items.len() as i32)
            .set_items(Some(items))
            .build()
            .map_err(|e| EdgeError::Api(e.to_string()))?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(uuid::Uuid::new_v4().to_string())
            .build()
            .map_err(|e| EdgeError::Api(e.to_string()))?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(id.as_str())
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| map_error(&e, id))?;

        let invalidation = output
            .invalidation()
            .map(|i| InvalidationId::new(i.id()))
            .ok_or_else(|| EdgeError::Api(format!("invalidation of {id} returned no id")))?;
        tracing::info!(distribution = %id, invalidation = %invalidation, "cache invalidation created");
        Ok(invalidation)
    }
}
