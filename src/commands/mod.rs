// ABOUTME: Command module aggregator for the stackship CLI.
// ABOUTME: Re-exports command handlers and the identity helper they share.

mod deploy;
mod release_id;
mod releases;

pub use deploy::deploy;
pub use release_id::release_id;
pub use releases::releases;

use crate::cli::IdentityArgs;
use stackship::error::Result;
use stackship::release::{IdentityRequest, ReleaseIdentity, resolve_product};
use stackship::vcs::Git;
use std::path::Path;

/// Derive the release identity of the working copy in `project_dir`.
pub(crate) async fn derive_identity(
    args: &IdentityArgs,
    project_dir: &Path,
) -> Result<ReleaseIdentity> {
    let product = resolve_product(args.product.as_deref(), project_dir)?;
    let stamp = args
        .stamp
        .unwrap_or_else(|| chrono::Utc::now().timestamp());
    let request = IdentityRequest::new(product, stamp, args.blessed, project_dir);
    let identity = ReleaseIdentity::derive(&Git::new(project_dir), &request).await?;
    tracing::info!(release = %identity.release_id(), "release identity derived");
    Ok(identity)
}
