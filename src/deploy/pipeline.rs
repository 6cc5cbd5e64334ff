// ABOUTME: End-to-end deploy run: app pipeline, static release, distribution switch.
// ABOUTME: Steps run strictly in order; the first failure stops the run.

use std::path::Path;

use crate::cloud::{ArtifactStore, EdgeDistribution, StackOrchestrator};
use crate::config::ResolvedConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::migrate::MigratorRegistry;
use crate::package::Packager;
use crate::release::ReleaseIdentity;
use crate::static_release::{
    ReleaseListing, StaticReleaseManager, StaticUpload, SwitchOutcome, UploadSummary,
};

use super::deployment::{AppDeployment, Deployment};
use super::error::DeployError;
use super::plan::{DeployOptions, DeploymentRequest, ReleaseAction};

/// The collaborators a deploy run talks to.
pub struct Backends<'a> {
    pub store: &'a dyn ArtifactStore,
    pub stacks: &'a dyn StackOrchestrator,
    pub edge: &'a dyn EdgeDistribution,
    pub packager: &'a dyn Packager,
    pub migrators: &'a MigratorRegistry,
}

/// What a deploy run did, or would have done in a dry run.
#[derive(Debug, Clone, Default)]
pub struct DeploymentReport {
    pub releases: Option<ReleaseListing>,
    pub static_upload: Option<UploadSummary>,
    pub app: Option<AppDeployment>,
    pub switch: Option<SwitchOutcome>,
}

/// Run the requested action for one stack.
///
/// For `DeployApp`: check the blessed guard, resolve and validate templates,
/// run migrations, upload static content (if enabled), finish the app
/// pipeline through stack apply, then switch the distribution if asked. Any
/// failure up to migrations leaves the static bucket untouched. For
/// `RevertTo`: switch the distribution to the given release, provided static
/// content is enabled.
pub async fn run_deployment(
    config: &ResolvedConfig,
    identity: &ReleaseIdentity,
    request: &DeploymentRequest,
    backends: &Backends<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<DeploymentReport, DeployError> {
    let manager = StaticReleaseManager::new(backends.store, backends.edge, &config.static_bucket);
    let mut report = DeploymentReport::default();
    let static_root = config
        .static_src_root
        .as_deref()
        .filter(|_| request.include_static);

    match &request.action {
        ReleaseAction::RevertTo(release_id) => {
            if static_root.is_none() {
                diagnostics.warn(Warning::distro_update_ignored(format!(
                    "revert to {release_id} ignored: static content is not enabled for this deployment"
                )));
                return Ok(report);
            }
            let listing = manager.list_releases().await?;
            if !listing.contains(release_id) {
                tracing::warn!(release = %release_id, "release not found in static bucket, switching anyway");
            }
            report.releases = Some(listing);
            tracing::info!(release = %release_id, "reverting distribution origin");
            report.switch = Some(manager.switch_origin(release_id, request.dry_run).await?);
        }
        ReleaseAction::DeployApp => {
            if request.update_distro && static_root.is_none() {
                diagnostics.warn(Warning::distro_update_ignored(
                    "--update-distro ignored: static content is not enabled for this deployment",
                ));
            }

            let migrated = Deployment::new(
                config.clone(),
                identity.clone(),
                DeployOptions::from(request),
            )
            .check_blessed_release(backends.store)
            .await?
            .resolve_templates(backends.store)
            .await?
            .validate(backends.stacks)
            .await?
            .run_migrations(backends.migrators)
            .await?;

            if let Some(root) = static_root {
                let (listing, upload) =
                    release_static(&manager, config, identity, request, root, diagnostics).await?;
                report.releases = Some(listing);
                report.static_upload = upload;
            }

            let app = migrated
                .package(backends.packager)
                .await?
                .upload_artifact(backends.store)
                .await?
                .assemble_parameters(backends.stacks)
                .await?
                .apply(backends.stacks)
                .await?
                .finish();
            report.app = Some(app);

            if request.update_distro && static_root.is_some() {
                report.switch = Some(
                    manager
                        .switch_origin(identity.release_id(), request.dry_run)
                        .await?,
                );
            }
        }
    }

    Ok(report)
}

/// List the static bucket and upload this release's static files.
///
/// An allowed blessed redeploy keeps a static release that is already there
/// instead of failing on it; every other existing release is refused.
async fn release_static(
    manager: &StaticReleaseManager<'_>,
    config: &ResolvedConfig,
    identity: &ReleaseIdentity,
    request: &DeploymentRequest,
    source_root: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<(ReleaseListing, Option<UploadSummary>), DeployError> {
    let listing = manager.list_releases().await?;
    let release_id = identity.release_id();

    if identity.is_blessed() && request.allow_blessed_redeploy && listing.contains(release_id) {
        diagnostics.warn(Warning::static_release_kept(format!(
            "static release {release_id} already exists in bucket {}, keeping it",
            manager.bucket()
        )));
        return Ok((listing, None));
    }

    let keys = config.key_builder();
    let upload = StaticUpload {
        source_root,
        exclusions: &config.static_folder_exclusions,
        keys: &keys,
        content_types: &config.content_types,
        cache_control: config.static_cache_control(),
        dry_run: request.dry_run,
    };
    let summary = manager
        .upload_release(release_id, &upload, diagnostics)
        .await?;
    Ok((listing, Some(summary)))
}
