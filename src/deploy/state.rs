// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Each state carries what earlier steps produced, so later steps cannot run without it.

use std::path::PathBuf;

use crate::migrate::MigrationOutcome;
use crate::types::{StackParameters, TemplateRef};

/// A template the deployment will validate and apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    /// File name, used to look up nested template parameter names.
    pub name: String,
    /// Local source, `None` when given as a URL.
    pub local_path: Option<PathBuf>,
    /// What the orchestrator is given: the uploaded URL, or the body in a dry run.
    pub reference: TemplateRef,
    /// Uploaded URL, or the planned URL in a dry run.
    pub url: String,
}

/// Root and nested templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub root: ResolvedTemplate,
    pub nested: Vec<ResolvedTemplate>,
}

impl Templates {
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedTemplate> {
        std::iter::once(&self.root).chain(self.nested.iter())
    }
}

/// Initial state: identity and configuration known, nothing touched.
/// Available actions: `check_blessed_release()`, `resolve_templates()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Templates located and uploaded.
/// Available actions: `validate()`
#[derive(Debug, Clone)]
pub struct TemplatesResolved {
    pub(crate) templates: Templates,
}

/// Every template accepted by the orchestrator.
/// Available actions: `run_migrations()`
#[derive(Debug, Clone)]
pub struct Validated {
    pub(crate) templates: Templates,
}

/// Database migrations ran (or were not requested).
/// Available actions: `package()`
#[derive(Debug, Clone)]
pub struct Migrated {
    pub(crate) templates: Templates,
    pub(crate) migration: MigrationOutcome,
}

/// Application artifact built.
/// Available actions: `upload_artifact()`
#[derive(Debug, Clone)]
pub struct Packaged {
    pub(crate) templates: Templates,
    /// Built archive, or its planned path in a dry run.
    pub(crate) artifact: PathBuf,
}

/// Application artifact in object storage.
/// Available actions: `assemble_parameters()`
#[derive(Debug, Clone)]
pub struct Uploaded {
    pub(crate) templates: Templates,
    pub(crate) artifact_url: String,
}

/// Stack parameters merged.
/// Available actions: `apply()`
#[derive(Debug, Clone)]
pub struct ParametersAssembled {
    pub(crate) templates: Templates,
    pub(crate) artifact_url: String,
    pub(crate) parameters: StackParameters,
    pub(crate) stack_exists: bool,
}

/// What applying the root template did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    /// Dry run; nothing was sent.
    Planned { update: bool },
}

/// Stack create or update issued.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Applied {
    pub(crate) templates: Templates,
    pub(crate) artifact_url: String,
    pub(crate) parameters: StackParameters,
    pub(crate) outcome: ApplyOutcome,
}
