// ABOUTME: AWS implementations of the cloud capability traits.
// ABOUTME: S3 for artifacts, CloudFormation for stacks, CloudFront for the CDN.

mod cloudformation;
mod cloudfront;
mod s3;

pub use cloudformation::CloudFormationStacks;
pub use cloudfront::CloudFrontEdge;
pub use s3::S3Store;

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Error codes AWS services use when credentials lack a permission.
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "AllAccessDisabled",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidClientTokenId",
];

pub(crate) fn is_access_denied_code(code: Option<&str>) -> bool {
    code.is_some_and(|c| ACCESS_DENIED_CODES.contains(&c))
}

/// Load shared AWS configuration from the environment and profile files.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}

/// The three AWS clients a deployment needs, built from one shared config.
#[derive(Debug, Clone)]
pub struct AwsBackends {
    pub store: S3Store,
    pub stacks: CloudFormationStacks,
    pub edge: CloudFrontEdge,
}

impl AwsBackends {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            store: S3Store::new(config),
            stacks: CloudFormationStacks::new(config),
            edge: CloudFrontEdge::new(config),
        }
    }
}
