// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers template, migration, packaging, upload and stack apply failures.

use std::path::PathBuf;

use crate::artifact::KeyError;
use crate::cloud::{StackError, StoreError};
use crate::package::PackageError;
use crate::static_release::StaticReleaseError;

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A template file named by configuration or the command line is missing.
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("cannot read template {}: {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The orchestrator rejected a template.
    #[error("template {name} failed validation: {source}")]
    TemplateInvalid { name: String, source: StackError },

    /// Migrations exited non-zero.
    #[error("db migrations failed with status {status}: {stderr}")]
    MigrationFailed {
        status: i32,
        stdout: String,
        stderr: String,
    },

    /// A blessed release with this id has already been deployed.
    #[error(
        "blessed release {release_id} has already been deployed; pass --allow-blessed-redeploy to deploy it again"
    )]
    BlessedReleaseExists { release_id: String },

    #[error("failed to build package: {0}")]
    Package(#[from] PackageError),

    #[error("failed to upload {what}: {source}")]
    Upload {
        what: &'static str,
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    StaticRelease(#[from] StaticReleaseError),
}

impl DeployError {
    pub fn is_access_denied(&self) -> bool {
        match self {
            DeployError::TemplateInvalid { source, .. } => source.is_access_denied(),
            DeployError::Upload { source, .. } | DeployError::Store(source) => {
                source.is_access_denied()
            }
            DeployError::Stack(e) => e.is_access_denied(),
            DeployError::StaticRelease(e) => e.is_access_denied(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_is_found_through_wrappers() {
        let err = DeployError::Upload {
            what: "application package",
            source: StoreError::AccessDenied {
                bucket: "b".to_string(),
                message: "denied".to_string(),
            },
        };
        assert!(err.is_access_denied());

        let err = DeployError::StaticRelease(StaticReleaseError::ReleaseExists {
            release_id: "rel-1".to_string(),
            bucket: "b".to_string(),
        });
        assert!(!err.is_access_denied());
    }
}
