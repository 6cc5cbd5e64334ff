// ABOUTME: Versioned static content releases behind a CDN distribution.
// ABOUTME: Lists release prefixes, uploads a new release, switches the live origin.

mod error;
mod manager;

pub use error::StaticReleaseError;
pub use manager::{
    ReleaseEntry, ReleaseListing, StaticReleaseManager, StaticUpload, SwitchOutcome,
    UploadSummary, origin_id,
};
