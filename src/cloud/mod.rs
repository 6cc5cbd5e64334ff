// ABOUTME: Capability traits for the remote services a deployment talks to.
// ABOUTME: Object storage, stack orchestration and CDN, with AWS and in-memory backends.

pub mod aws;
mod edge;
pub mod memory;
mod stack;
mod store;

pub use edge::{DistributionConfig, ETag, EdgeDistribution, EdgeError, OriginSettings};
pub use stack::{Capability, OnFailure, StackError, StackOrchestrator, StackRequest};
pub use store::{ArtifactStore, StoreError, UploadRequest};

/// Display URL of an object, with the final key segment URL-encoded.
pub fn object_url(bucket: &str, key: &str) -> String {
    let encoded = match key.rsplit_once('/') {
        Some((dir, name)) => format!("{dir}/{}", urlencoding::encode(name)),
        None => urlencoding::encode(key).into_owned(),
    };
    format!("https://{bucket}.s3.amazonaws.com/{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_url_encodes_only_the_file_name() {
        assert_eq!(
            object_url("b", "app/releases/my app-1.0.tar.gz"),
            "https://b.s3.amazonaws.com/app/releases/my%20app-1.0.tar.gz"
        );
        assert_eq!(object_url("b", "top.yaml"), "https://b.s3.amazonaws.com/top.yaml");
    }
}
