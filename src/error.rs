// ABOUTME: Application-wide error types for stackship.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::release::IdentityError;
use crate::static_release::StaticReleaseError;
use crate::types::{ParametersError, ReleaseIdError, StackNameError};

/// Printed after an access-denied failure.
pub const CREDENTIALS_HINT: &str = "Check that AWS credentials are available, e.g. set \
AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY (or AWS_PROFILE) for an account allowed to \
write the deployment buckets and stacks.";

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("nothing to do: pass --deploy-app or --revert-to-release-id")]
    NothingToDo,

    #[error("invalid stack name: {0}")]
    InvalidStackName(#[from] StackNameError),

    #[error("invalid release id: {0}")]
    InvalidReleaseId(#[from] ReleaseIdError),

    #[error("invalid --parameters: {0}")]
    InvalidParameters(#[from] ParametersError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    StaticRelease(#[from] StaticReleaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether the failure came from missing or insufficient cloud credentials.
    pub fn is_access_denied(&self) -> bool {
        match self {
            Error::Deploy(e) => e.is_access_denied(),
            Error::StaticRelease(e) => e.is_access_denied(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::StoreError;

    #[test]
    fn access_denied_detected_through_deploy_errors() {
        let err = Error::from(DeployError::Store(StoreError::AccessDenied {
            bucket: "b".to_string(),
            message: "denied".to_string(),
        }));
        assert!(err.is_access_denied());
        assert!(!Error::NothingToDo.is_access_denied());
    }
}
