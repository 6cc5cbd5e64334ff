// ABOUTME: Release identity errors with SNAFU context selectors.
// ABOUTME: Distinguishes VCS failures from a missing version source.

use snafu::Snafu;
use std::path::PathBuf;

use crate::types::ReleaseIdError;
use crate::vcs::VcsError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum IdentityError {
    #[snafu(display("cannot read the current branch: {source}"))]
    Branch { source: VcsError },

    #[snafu(display("cannot read the current commit: {source}"))]
    Commit { source: VcsError },

    #[snafu(display(
        "branch '{branch}' has no version suffix and version file {} could not be read: {source}",
        path.display()
    ))]
    MissingVersion {
        branch: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display(
        "branch '{branch}' has no version suffix and version file {} is empty",
        path.display()
    ))]
    EmptyVersion { branch: String, path: PathBuf },

    #[snafu(display(
        "no product given and product file {} could not be read: {source}",
        path.display()
    ))]
    MissingProduct {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("product name is empty (from {origin})"))]
    EmptyProduct { origin: String },

    #[snafu(display("timestamp {stamp} is out of range"))]
    InvalidStamp { stamp: i64 },

    #[snafu(display("release id '{candidate}' is not usable: {source}"))]
    InvalidReleaseId {
        candidate: String,
        source: ReleaseIdError,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityErrorKind {
    /// Git could not report branch or commit.
    Vcs,
    /// Neither the branch nor the version file yields a version.
    NoVersionSource,
    /// No product prefix available.
    NoProduct,
    /// Inputs produced an unusable identifier.
    InvalidInput,
}

impl IdentityError {
    pub fn kind(&self) -> IdentityErrorKind {
        match self {
            IdentityError::Branch { .. } | IdentityError::Commit { .. } => IdentityErrorKind::Vcs,
            IdentityError::MissingVersion { .. } | IdentityError::EmptyVersion { .. } => {
                IdentityErrorKind::NoVersionSource
            }
            IdentityError::MissingProduct { .. } | IdentityError::EmptyProduct { .. } => {
                IdentityErrorKind::NoProduct
            }
            IdentityError::InvalidStamp { .. } | IdentityError::InvalidReleaseId { .. } => {
                IdentityErrorKind::InvalidInput
            }
        }
    }
}
