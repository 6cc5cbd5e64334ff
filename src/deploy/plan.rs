// ABOUTME: What a deploy invocation asks for, independent of how it was parsed.
// ABOUTME: Release action, template source, caller parameters and safety switches.

use std::path::PathBuf;

use crate::types::{ReleaseId, StackParameters};

/// The one thing a deploy run does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseAction {
    /// Upload static content, run the app pipeline and apply the stack.
    DeployApp,
    /// Point the distribution back at an existing static release.
    RevertTo(ReleaseId),
}

/// Where the root template comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TemplateSource {
    /// `{cfn-template-root-path}/{root-template-name}` from configuration.
    #[default]
    Configured,
    File(PathBuf),
    /// Already uploaded; used as-is.
    Url(String),
}

#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub action: ReleaseAction,
    pub dry_run: bool,
    /// Static content requested (no `--no-static`).
    pub include_static: bool,
    pub update_distro: bool,
    pub run_migrations: bool,
    pub allow_blessed_redeploy: bool,
    pub template: TemplateSource,
    pub parameters: StackParameters,
}

impl DeploymentRequest {
    pub fn new(action: ReleaseAction) -> Self {
        Self {
            action,
            dry_run: false,
            include_static: true,
            update_distro: false,
            run_migrations: true,
            allow_blessed_redeploy: false,
            template: TemplateSource::default(),
            parameters: StackParameters::new(),
        }
    }
}

/// The parts of a request the app pipeline reads.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub dry_run: bool,
    pub run_migrations: bool,
    pub allow_blessed_redeploy: bool,
    pub template: TemplateSource,
    pub parameters: StackParameters,
}

impl From<&DeploymentRequest> for DeployOptions {
    fn from(request: &DeploymentRequest) -> Self {
        Self {
            dry_run: request.dry_run,
            run_migrations: request.run_migrations,
            allow_blessed_redeploy: request.allow_blessed_redeploy,
            template: request.template.clone(),
            parameters: request.parameters.clone(),
        }
    }
}
