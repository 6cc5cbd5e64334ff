// ABOUTME: Error types for static release operations.
// ABOUTME: Wraps storage and CDN errors and adds release preconditions.

use std::path::PathBuf;

use crate::artifact::KeyError;
use crate::cloud::{EdgeError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum StaticReleaseError {
    /// A static release with this id was already uploaded.
    #[error("static release {release_id} already exists in bucket {bucket}")]
    ReleaseExists { release_id: String, bucket: String },

    #[error("no distribution has an origin in bucket {0}")]
    DistributionNotFound(String),

    #[error("static source directory {} does not exist", .0.display())]
    MissingSourceRoot(PathBuf),

    #[error("cannot walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Edge(#[from] EdgeError),
}

impl StaticReleaseError {
    pub fn is_access_denied(&self) -> bool {
        match self {
            StaticReleaseError::Store(e) => e.is_access_denied(),
            StaticReleaseError::Edge(e) => e.is_access_denied(),
            _ => false,
        }
    }
}
