// ABOUTME: Deterministic release identity derived from VCS state and a timestamp.
// ABOUTME: Produces the release id, package name and package version for one deploy.

use chrono::{DateTime, Utc};
use regex::Regex;
use snafu::{OptionExt, ResultExt, ensure};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::types::ReleaseId;
use crate::vcs::VersionControl;

use super::error::{
    BranchSnafu, CommitSnafu, EmptyProductSnafu, EmptyVersionSnafu, IdentityError,
    InvalidReleaseIdSnafu, InvalidStampSnafu, MissingProductSnafu, MissingVersionSnafu,
};

/// File holding the product prefix when `--product` is not given.
pub const PRODUCT_FILE: &str = "PRODUCT";

/// File holding the version when the branch name carries none.
pub const VERSION_FILE: &str = "VERSION";

/// Datestamp format embedded in unblessed release ids (always UTC).
pub const DATESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

const SHORT_HASH_LEN: usize = 7;

static VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)(\d+\.\d+\.\d+)$").expect("version suffix pattern is valid")
});

/// Split `release1.2.3` into (`release`, `1.2.3`).
///
/// The prefix is the shortest non-empty head that leaves a full
/// `major.minor.patch` suffix, so `release12.0.0` yields `12.0.0`.
pub fn split_branch_version(branch: &str) -> Option<(&str, &str)> {
    let caps = VERSION_SUFFIX.captures(branch)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Make a branch prefix usable inside a release id.
///
/// Path separators become `-` so `feature/login` yields one path segment.
pub fn sanitize_branch_prefix(prefix: &str) -> String {
    prefix.replace(['/', '\\'], "-")
}

/// Render an epoch timestamp as `YYYYMMDDTHHMMSS` in UTC.
pub fn format_datestamp(stamp: i64) -> Result<String, IdentityError> {
    let at: DateTime<Utc> =
        DateTime::from_timestamp(stamp, 0).context(InvalidStampSnafu { stamp })?;
    Ok(at.format(DATESTAMP_FORMAT).to_string())
}

/// Resolve the product prefix from an explicit value or the product file.
pub fn resolve_product(explicit: Option<&str>, project_dir: &Path) -> Result<String, IdentityError> {
    if let Some(product) = explicit {
        let product = product.trim();
        ensure!(
            !product.is_empty(),
            EmptyProductSnafu {
                origin: "--product"
            }
        );
        return Ok(product.to_string());
    }

    let path = project_dir.join(PRODUCT_FILE);
    let content = std::fs::read_to_string(&path).context(MissingProductSnafu { path: &path })?;
    let product = content.trim();
    ensure!(
        !product.is_empty(),
        EmptyProductSnafu {
            origin: path.display().to_string()
        }
    );
    Ok(product.to_string())
}

/// Everything identity derivation needs besides VCS state.
#[derive(Debug, Clone)]
pub struct IdentityRequest {
    pub product: String,
    pub stamp: i64,
    pub blessed: bool,
    pub version_file: PathBuf,
}

impl IdentityRequest {
    pub fn new(product: impl Into<String>, stamp: i64, blessed: bool, project_dir: &Path) -> Self {
        Self {
            product: product.into(),
            stamp,
            blessed,
            version_file: project_dir.join(VERSION_FILE),
        }
    }
}

/// Identity of one deployment invocation. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIdentity {
    product_prefix: String,
    branch_prefix: String,
    sym_ver: String,
    timestamp: i64,
    is_blessed: bool,
    commit_hash_short: String,
    release_id: ReleaseId,
    package_name: String,
    package_version: String,
}

impl ReleaseIdentity {
    /// Derive the identity for the working copy behind `vcs`.
    ///
    /// # Errors
    ///
    /// Fails if git cannot report the branch or commit, if the branch has no
    /// version suffix and the version file is missing or empty, or if the
    /// resulting id is still not a valid release id (e.g. whitespace in the
    /// product prefix).
    pub async fn derive<V: VersionControl + ?Sized>(
        vcs: &V,
        request: &IdentityRequest,
    ) -> Result<Self, IdentityError> {
        let branch = vcs.current_branch().await.context(BranchSnafu)?;

        let (branch_prefix, sym_ver) = match split_branch_version(&branch) {
            Some((prefix, version)) => (prefix.to_string(), version.to_string()),
            None => {
                tracing::info!(
                    branch = %branch,
                    "branch has no version suffix, reading {}",
                    request.version_file.display()
                );
                let version = read_version_file(&branch, &request.version_file)?;
                (branch.clone(), version)
            }
        };
        let branch_prefix = sanitize_branch_prefix(&branch_prefix);

        let commit = vcs.head_commit().await.context(CommitSnafu)?;
        let commit_hash_short: String = commit.chars().take(SHORT_HASH_LEN).collect();

        let product = &request.product;
        let (candidate, package_version) = if request.blessed {
            (
                format!("{product}-{branch_prefix}-{sym_ver}"),
                sym_ver.clone(),
            )
        } else {
            let datestamp = format_datestamp(request.stamp)?;
            (
                format!("{product}-{branch_prefix}-{sym_ver}-{datestamp}-{commit_hash_short}"),
                format!("{sym_ver}+{datestamp}.{commit_hash_short}"),
            )
        };

        let release_id = ReleaseId::new(&candidate).context(InvalidReleaseIdSnafu {
            candidate: &candidate,
        })?;

        Ok(Self {
            package_name: format!("{product}-{branch_prefix}"),
            product_prefix: product.clone(),
            branch_prefix,
            sym_ver,
            timestamp: request.stamp,
            is_blessed: request.blessed,
            commit_hash_short,
            release_id,
            package_version,
        })
    }

    pub fn release_id(&self) -> &ReleaseId {
        &self.release_id
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn package_version(&self) -> &str {
        &self.package_version
    }

    pub fn product_prefix(&self) -> &str {
        &self.product_prefix
    }

    pub fn branch_prefix(&self) -> &str {
        &self.branch_prefix
    }

    pub fn sym_ver(&self) -> &str {
        &self.sym_ver
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_blessed(&self) -> bool {
        self.is_blessed
    }

    pub fn commit_hash_short(&self) -> &str {
        &self.commit_hash_short
    }
}

fn read_version_file(branch: &str, path: &Path) -> Result<String, IdentityError> {
    let content = std::fs::read_to_string(path).context(MissingVersionSnafu { branch, path })?;
    let version = content.trim();
    ensure!(!version.is_empty(), EmptyVersionSnafu { branch, path });
    Ok(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_version_suffix() {
        assert_eq!(
            split_branch_version("release1.2.3"),
            Some(("release", "1.2.3"))
        );
        assert_eq!(
            split_branch_version("release-12.0.4"),
            Some(("release-", "12.0.4"))
        );
        assert_eq!(split_branch_version("main"), None);
        assert_eq!(split_branch_version("1.2.3"), None);
        assert_eq!(split_branch_version("release1.2.3-rc"), None);
    }

    #[test]
    fn branch_separators_become_dashes() {
        assert_eq!(sanitize_branch_prefix("feature/login"), "feature-login");
        assert_eq!(sanitize_branch_prefix("release/"), "release-");
        assert_eq!(sanitize_branch_prefix("hotfix\\win"), "hotfix-win");
        assert_eq!(sanitize_branch_prefix("release"), "release");
    }

    #[test]
    fn datestamp_is_utc() {
        assert_eq!(format_datestamp(1_700_000_000).unwrap(), "20231114T221320");
        assert_eq!(format_datestamp(0).unwrap(), "19700101T000000");
    }

    #[test]
    fn out_of_range_stamp_is_rejected() {
        assert!(format_datestamp(i64::MAX).is_err());
    }

    #[test]
    fn explicit_product_wins() {
        let product = resolve_product(Some(" acme "), Path::new("/nonexistent")).unwrap();
        assert_eq!(product, "acme");
    }

    #[test]
    fn missing_product_file_is_reported() {
        let err = resolve_product(None, Path::new("/nonexistent")).unwrap_err();
        assert!(err.to_string().contains("PRODUCT"));
    }
}
