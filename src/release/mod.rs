// ABOUTME: Release identity: the deterministic name of one deployable unit.
// ABOUTME: Exports the identity generator and its error types.

mod error;
mod identity;

pub use error::{IdentityError, IdentityErrorKind};
pub use identity::{
    DATESTAMP_FORMAT, IdentityRequest, PRODUCT_FILE, ReleaseIdentity, VERSION_FILE,
    format_datestamp, resolve_product, sanitize_branch_prefix, split_branch_version,
};
