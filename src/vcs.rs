// ABOUTME: Version-control state used to derive release identity.
// ABOUTME: Reads the current branch and HEAD commit by shelling out to git.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        source: std::io::Error,
    },

    #[error("git {args} exited with {status}: {stderr}")]
    Failed {
        args: String,
        status: String,
        stderr: String,
    },

    #[error("HEAD is not on a branch")]
    DetachedHead,

    #[error("git returned no commit hash")]
    NoCommit,
}

/// Read-only view of the working copy's version-control state.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Current branch name without the `refs/heads/` prefix.
    async fn current_branch(&self) -> Result<String, VcsError>;

    /// Full hash of the most recent commit.
    async fn head_commit(&self) -> Result<String, VcsError>;
}

/// Git working copy rooted at a directory.
#[derive(Debug, Clone)]
pub struct Git {
    work_tree: PathBuf,
}

impl Git {
    pub fn new(work_tree: &Path) -> Self {
        Self {
            work_tree: work_tree.to_path_buf(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let joined = args.join(" ");
        tracing::debug!(args = %joined, dir = %self.work_tree.display(), "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_tree)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| VcsError::Spawn {
                args: joined.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VcsError::Failed {
                args: joined,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl VersionControl for Git {
    async fn current_branch(&self) -> Result<String, VcsError> {
        let reference = self.run(&["symbolic-ref", "-q", "HEAD"]).await?;
        let branch = reference
            .strip_prefix("refs/heads/")
            .unwrap_or(&reference)
            .to_string();
        if branch.is_empty() {
            return Err(VcsError::DetachedHead);
        }
        Ok(branch)
    }

    async fn head_commit(&self) -> Result<String, VcsError> {
        let hash = self.run(&["rev-parse", "HEAD"]).await?;
        if hash.is_empty() {
            return Err(VcsError::NoCommit);
        }
        Ok(hash)
    }
}

/// Fixed branch and commit, for callers that already know them.
#[derive(Debug, Clone)]
pub struct StaticVcs {
    pub branch: String,
    pub commit: String,
}

impl StaticVcs {
    pub fn new(branch: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            commit: commit.into(),
        }
    }
}

#[async_trait]
impl VersionControl for StaticVcs {
    async fn current_branch(&self) -> Result<String, VcsError> {
        Ok(self.branch.clone())
    }

    async fn head_commit(&self) -> Result<String, VcsError> {
        if self.commit.is_empty() {
            return Err(VcsError::NoCommit);
        }
        Ok(self.commit.clone())
    }
}
