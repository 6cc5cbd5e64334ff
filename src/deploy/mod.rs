// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct and the end-to-end pipeline.

mod deployment;
mod error;
mod parameters;
mod pipeline;
mod plan;
mod state;
mod transitions;

pub use deployment::{AppDeployment, Deployment};
pub use error::DeployError;
pub use parameters::{DEFAULT_RELEASE_NOTES, SystemParameters, merge_parameters};
pub use pipeline::{Backends, DeploymentReport, run_deployment};
pub use plan::{DeployOptions, DeploymentRequest, ReleaseAction, TemplateSource};
pub use state::{
    Applied, ApplyOutcome, Initialized, Migrated, Packaged, ParametersAssembled,
    ResolvedTemplate, Templates, TemplatesResolved, Uploaded, Validated,
};
