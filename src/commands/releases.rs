// ABOUTME: releases command implementation.
// ABOUTME: Lists static release prefixes for a stack and marks the live one.

use stackship::cloud::aws::{AwsBackends, load_sdk_config};
use stackship::config::{CliOverrides, DeployConfig};
use stackship::diagnostics::Diagnostics;
use stackship::error::Result;
use stackship::output::Output;
use stackship::static_release::{ReleaseListing, StaticReleaseManager};
use stackship::types::StackName;
use std::env;
use std::path::Path;

pub async fn releases(stack_name: &str, config_path: &Path, output: Output) -> Result<()> {
    let stack = StackName::new(stack_name)?;
    let cwd = env::current_dir()?;
    let config = DeployConfig::load(&cwd.join(config_path))?;
    let mut diag = Diagnostics::default();
    let resolved = config.resolve(&stack, &cwd, &CliOverrides::default(), &mut diag)?;

    let sdk = load_sdk_config(None).await;
    let aws = AwsBackends::new(&sdk);
    let manager = StaticReleaseManager::new(&aws.store, &aws.edge, &resolved.static_bucket);

    let listing = manager.list_releases().await?;
    print_listing(&listing, manager.bucket(), &output);
    Ok(())
}

/// Print one line per release, `*` marking the live one.
pub(crate) fn print_listing(listing: &ReleaseListing, bucket: &str, output: &Output) {
    output.progress(&format!("Static releases in {bucket}:"));
    for entry in &listing.releases {
        let marker = if entry.current { "*" } else { " " };
        output.progress(&format!(" {marker} {}", entry.release_id));
    }
    match listing.current() {
        Some(current) => output.success(&format!("Current release: {current}")),
        None => output.success("No current release"),
    }
}
