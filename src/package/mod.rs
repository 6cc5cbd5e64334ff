// ABOUTME: Application packaging into a distributable archive.
// ABOUTME: Defines the Packager trait and the gzipped tarball implementation.

mod tarball;

pub use tarball::TarballPackager;

use async_trait::async_trait;
use std::path::PathBuf;

/// Name and version stamped on a package, plus where its sources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub source_dir: PathBuf,
}

impl PackageMetadata {
    /// `{name}-{version}`, the archive's base name and top-level directory.
    pub fn base_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Builds the application artifact that gets uploaded.
#[async_trait]
pub trait Packager: Send + Sync {
    /// File name the built artifact will have. Known before building, so a
    /// dry run can report the planned key.
    fn artifact_file_name(&self, metadata: &PackageMetadata) -> String;

    /// Build the artifact and return its local path.
    async fn build(&self, metadata: &PackageMetadata) -> Result<PathBuf, PackageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("source directory {} does not exist", .0.display())]
    MissingSource(PathBuf),

    #[error("cannot walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("cannot write archive {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("packaging task failed: {0}")]
    Task(String),
}
