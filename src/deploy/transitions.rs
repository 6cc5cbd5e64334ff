// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::path::{Path, PathBuf};

use crate::cloud::{
    ArtifactStore, Capability, OnFailure, StackOrchestrator, StackRequest, UploadRequest,
};
use crate::migrate::{MigrationOutcome, MigratorRegistry, MigratorSelection, run_migrations};
use crate::package::{PackageMetadata, Packager};
use crate::types::TemplateRef;

use super::Deployment;
use super::error::DeployError;
use super::parameters::{SystemParameters, merge_parameters};
use super::plan::TemplateSource;
use super::state::{
    Applied, ApplyOutcome, Initialized, Migrated, Packaged, ParametersAssembled,
    ResolvedTemplate, Templates, TemplatesResolved, Uploaded, Validated,
};

const TEMPLATE_CONTENT_TYPE: &str = "application/json";
const ARTIFACT_CONTENT_TYPE: &str = "application/octet-stream";

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Deployment<S> {
    /// Upload one template file, or in a dry run read it and plan its URL.
    async fn stage_template<A: ArtifactStore + ?Sized>(
        &self,
        store: &A,
        name: &str,
        path: &Path,
    ) -> Result<ResolvedTemplate, DeployError> {
        if !path.is_file() {
            return Err(DeployError::TemplateNotFound(path.to_path_buf()));
        }

        let key = self.keys.template_key(self.release_id(), path)?;
        let bucket = &self.config.app_bucket;

        let (reference, url) = if self.options.dry_run {
            let body = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| DeployError::TemplateRead {
                    path: path.to_path_buf(),
                    source,
                })?;
            let url = key.url(bucket);
            tracing::info!(template = name, url = %url, "dry run: would upload template");
            (TemplateRef::Body(body), url)
        } else {
            let url = store
                .upload(&UploadRequest {
                    bucket: bucket.clone(),
                    key: key.as_str().to_string(),
                    local_path: path.to_path_buf(),
                    content_type: TEMPLATE_CONTENT_TYPE.to_string(),
                    cache_control: None,
                })
                .await
                .map_err(|source| DeployError::Upload {
                    what: "template",
                    source,
                })?;
            tracing::info!(template = name, url = %url, "template uploaded");
            (TemplateRef::Url(url.clone()), url)
        };

        Ok(ResolvedTemplate {
            name: name.to_string(),
            local_path: Some(path.to_path_buf()),
            reference,
            url,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// Initialized -> TemplatesResolved
// =============================================================================

impl Deployment<Initialized> {
    /// Refuse a blessed release that has already been deployed.
    ///
    /// A blessed release counts as deployed once its templates are in the app
    /// bucket, or, when static content is configured, once its prefix is in
    /// the static bucket. Only reads; must run before anything is uploaded.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::BlessedReleaseExists` unless redeploying blessed
    /// releases was explicitly allowed.
    pub async fn check_blessed_release<A: ArtifactStore + ?Sized>(
        self,
        store: &A,
    ) -> Result<Self, DeployError> {
        if !self.identity.is_blessed() {
            return Ok(self);
        }

        let template_prefix = self.keys.template_release_prefix(self.release_id());
        let mut deployed = store
            .prefix_exists(&self.config.app_bucket, &template_prefix)
            .await?;
        if !deployed && self.config.static_src_root.is_some() {
            deployed = store
                .prefix_exists(&self.config.static_bucket, &self.release_id().prefix())
                .await?;
        }

        if deployed {
            if !self.options.allow_blessed_redeploy {
                return Err(DeployError::BlessedReleaseExists {
                    release_id: self.release_id().to_string(),
                });
            }
            tracing::warn!(release = %self.release_id(), "redeploying blessed release");
        }
        Ok(self)
    }

    /// Locate the root and nested templates and upload them.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::TemplateNotFound` if any template file is missing.
    pub async fn resolve_templates<A: ArtifactStore + ?Sized>(
        self,
        store: &A,
    ) -> Result<Deployment<TemplatesResolved>, DeployError> {
        let root = match &self.options.template {
            TemplateSource::Url(url) => {
                tracing::info!(url = %url, "using root template URL as given");
                ResolvedTemplate {
                    name: url.rsplit('/').next().unwrap_or(url).to_string(),
                    local_path: None,
                    reference: TemplateRef::Url(url.clone()),
                    url: url.clone(),
                }
            }
            TemplateSource::File(path) => {
                let path = self.config.project_dir.join(path);
                self.stage_template(store, &file_name(&path), &path).await?
            }
            TemplateSource::Configured => {
                let path = self.config.root_template_path();
                self.stage_template(store, &self.config.root_template_name, &path)
                    .await?
            }
        };

        let mut nested = Vec::with_capacity(self.config.nested_templates.len());
        for name in &self.config.nested_templates {
            let path = self.config.nested_template_path(name);
            nested.push(self.stage_template(store, name, &path).await?);
        }

        let templates = Templates { root, nested };
        Ok(self.transition(TemplatesResolved { templates }))
    }
}

// =============================================================================
// TemplatesResolved -> Validated
// =============================================================================

impl Deployment<TemplatesResolved> {
    /// Validate every template. The first rejection stops the deployment.
    pub async fn validate<O: StackOrchestrator + ?Sized>(
        self,
        stacks: &O,
    ) -> Result<Deployment<Validated>, DeployError> {
        for template in self.state.templates.iter() {
            tracing::debug!(template = %template.name, "validating template");
            stacks
                .validate_template(&template.reference)
                .await
                .map_err(|source| DeployError::TemplateInvalid {
                    name: template.name.clone(),
                    source,
                })?;
        }
        tracing::info!("templates validated");

        let templates = self.state.templates.clone();
        Ok(self.transition(Validated { templates }))
    }
}

// =============================================================================
// Validated -> Migrated
// =============================================================================

impl Deployment<Validated> {
    /// Run the configured database migrator.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::MigrationFailed` on a non-zero exit status,
    /// including a migrator name nothing is registered under.
    pub async fn run_migrations(
        self,
        registry: &MigratorRegistry,
    ) -> Result<Deployment<Migrated>, DeployError> {
        let selection = if self.options.run_migrations {
            MigratorSelection::from_name(self.config.db_migrator.as_deref())
        } else {
            MigratorSelection::None
        };

        let outcome = match &selection {
            MigratorSelection::Named(name) if self.options.dry_run => {
                if registry.contains(name) {
                    tracing::info!(migrator = %name, "dry run: would run db migrations");
                    MigrationOutcome {
                        status: 0,
                        stdout: String::new(),
                        stderr: String::new(),
                    }
                } else {
                    run_migrations(registry, &selection).await
                }
            }
            _ => run_migrations(registry, &selection).await,
        };

        if !outcome.success() {
            tracing::error!(status = outcome.status, stderr = %outcome.stderr, "db migrations failed");
            return Err(DeployError::MigrationFailed {
                status: outcome.status,
                stdout: outcome.stdout,
                stderr: outcome.stderr,
            });
        }
        tracing::info!(stdout = %outcome.stdout, "db migrations done");

        let templates = self.state.templates.clone();
        Ok(self.transition(Migrated {
            templates,
            migration: outcome,
        }))
    }
}

// =============================================================================
// Migrated -> Packaged
// =============================================================================

impl Deployment<Migrated> {
    pub fn migration(&self) -> &MigrationOutcome {
        &self.state.migration
    }

    /// Build the application archive.
    pub async fn package<P: Packager + ?Sized>(
        self,
        packager: &P,
    ) -> Result<Deployment<Packaged>, DeployError> {
        let metadata = PackageMetadata {
            name: self.identity.package_name().to_string(),
            version: self.identity.package_version().to_string(),
            source_dir: self.config.project_dir.clone(),
        };

        let artifact = if self.options.dry_run {
            let planned: PathBuf = self
                .config
                .setup
                .output_dir
                .join(packager.artifact_file_name(&metadata));
            tracing::info!(artifact = %planned.display(), "dry run: would build package");
            planned
        } else {
            packager.build(&metadata).await?
        };

        let templates = self.state.templates.clone();
        Ok(self.transition(Packaged {
            templates,
            artifact,
        }))
    }
}

// =============================================================================
// Packaged -> Uploaded
// =============================================================================

impl Deployment<Packaged> {
    /// Upload the application archive to the app bucket.
    pub async fn upload_artifact<A: ArtifactStore + ?Sized>(
        self,
        store: &A,
    ) -> Result<Deployment<Uploaded>, DeployError> {
        let key = self.keys.app_key(&self.state.artifact)?;
        let bucket = &self.config.app_bucket;

        let artifact_url = if self.options.dry_run {
            let url = key.url(bucket);
            tracing::info!(url = %url, "dry run: would upload application package");
            url
        } else {
            let url = store
                .upload(&UploadRequest {
                    bucket: bucket.clone(),
                    key: key.as_str().to_string(),
                    local_path: self.state.artifact.clone(),
                    content_type: ARTIFACT_CONTENT_TYPE.to_string(),
                    cache_control: None,
                })
                .await
                .map_err(|source| DeployError::Upload {
                    what: "application package",
                    source,
                })?;
            tracing::info!(url = %url, "application package uploaded");
            url
        };

        let templates = self.state.templates.clone();
        Ok(self.transition(Uploaded {
            templates,
            artifact_url,
        }))
    }
}

// =============================================================================
// Uploaded -> ParametersAssembled
// =============================================================================

impl Deployment<Uploaded> {
    pub fn artifact_url(&self) -> &str {
        &self.state.artifact_url
    }

    /// Merge live stack parameters, caller parameters and deployer values.
    pub async fn assemble_parameters<O: StackOrchestrator + ?Sized>(
        self,
        stacks: &O,
    ) -> Result<Deployment<ParametersAssembled>, DeployError> {
        let existing = stacks.describe_stack(self.stack()).await?;
        match &existing {
            Some(params) => tracing::info!(
                stack = %self.stack(),
                parameters = params.len(),
                "stack exists, updating"
            ),
            None => tracing::info!(stack = %self.stack(), "stack not found, creating"),
        }

        let nested: Vec<(&str, &str)> = self
            .state
            .templates
            .nested
            .iter()
            .map(|t| (t.name.as_str(), t.url.as_str()))
            .collect();
        let system = SystemParameters {
            names: &self.config.parameter_names,
            artifact_url: &self.state.artifact_url,
            release_id: self.identity.release_id(),
            stack: &self.config.stack,
            app_bucket: &self.config.app_bucket,
            nested_templates: nested,
            stack_vars: &self.config.stack_vars,
        }
        .to_parameters();

        let parameters = merge_parameters(existing.as_ref(), &self.options.parameters, &system);

        let templates = self.state.templates.clone();
        let artifact_url = self.state.artifact_url.clone();
        Ok(self.transition(ParametersAssembled {
            templates,
            artifact_url,
            parameters,
            stack_exists: existing.is_some(),
        }))
    }
}

// =============================================================================
// ParametersAssembled -> Applied
// =============================================================================

impl Deployment<ParametersAssembled> {
    /// Update the stack if it exists, create it otherwise.
    pub async fn apply<O: StackOrchestrator + ?Sized>(
        self,
        stacks: &O,
    ) -> Result<Deployment<Applied>, DeployError> {
        let request = StackRequest {
            stack: self.config.stack.clone(),
            template: self.state.templates.root.reference.clone(),
            parameters: self.state.parameters.clone(),
            capabilities: vec![Capability::Iam],
        };

        let outcome = if self.options.dry_run {
            let action = if self.state.stack_exists { "update" } else { "create" };
            tracing::info!(
                stack = %request.stack,
                template = %self.state.templates.root.url,
                parameters = %request.parameters,
                "dry run: would {action} stack"
            );
            ApplyOutcome::Planned {
                update: self.state.stack_exists,
            }
        } else if self.state.stack_exists {
            stacks.update_stack(&request).await?;
            ApplyOutcome::Updated
        } else {
            stacks.create_stack(&request, OnFailure::DoNothing).await?;
            ApplyOutcome::Created
        };

        let ParametersAssembled {
            templates,
            artifact_url,
            parameters,
            ..
        } = self.state.clone();
        Ok(self.transition(Applied {
            templates,
            artifact_url,
            parameters,
            outcome,
        }))
    }
}
