// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: State types carry their own data for compile-time guarantees.

use crate::artifact::KeyBuilder;
use crate::config::ResolvedConfig;
use crate::release::ReleaseIdentity;
use crate::types::{ReleaseId, StackName, StackParameters};

use super::plan::DeployOptions;
use super::state::{Applied, ApplyOutcome, Initialized, ParametersAssembled, Templates};

/// A deployment in progress, parameterized by its current state.
///
/// The state type parameter `S` carries what earlier steps produced (uploaded
/// template URLs, the artifact URL, merged parameters), so a step that needs
/// it cannot be called before the step that makes it.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) config: ResolvedConfig,
    pub(crate) identity: ReleaseIdentity,
    pub(crate) options: DeployOptions,
    pub(crate) keys: KeyBuilder,
    pub(crate) state: S,
}

impl Deployment<Initialized> {
    pub fn new(config: ResolvedConfig, identity: ReleaseIdentity, options: DeployOptions) -> Self {
        let keys = config.key_builder();
        Deployment {
            config,
            identity,
            options,
            keys,
            state: Initialized,
        }
    }
}

impl<S> Deployment<S> {
    pub fn stack(&self) -> &StackName {
        &self.config.stack
    }

    pub fn release_id(&self) -> &ReleaseId {
        self.identity.release_id()
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn identity(&self) -> &ReleaseIdentity {
        &self.identity
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Move to the next state, keeping the shared context.
    pub(crate) fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            config: self.config,
            identity: self.identity,
            options: self.options,
            keys: self.keys,
            state,
        }
    }
}

impl Deployment<ParametersAssembled> {
    pub fn parameters(&self) -> &StackParameters {
        &self.state.parameters
    }

    pub fn stack_exists(&self) -> bool {
        self.state.stack_exists
    }
}

/// Summary of a finished app deployment.
#[derive(Debug, Clone)]
pub struct AppDeployment {
    pub release_id: ReleaseId,
    pub templates: Templates,
    pub artifact_url: String,
    pub parameters: StackParameters,
    pub outcome: ApplyOutcome,
}

impl Deployment<Applied> {
    pub fn outcome(&self) -> ApplyOutcome {
        self.state.outcome
    }

    pub fn finish(self) -> AppDeployment {
        AppDeployment {
            release_id: self.identity.release_id().clone(),
            templates: self.state.templates,
            artifact_url: self.state.artifact_url,
            parameters: self.state.parameters,
            outcome: self.state.outcome,
        }
    }
}
