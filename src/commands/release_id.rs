// ABOUTME: release-id command implementation.
// ABOUTME: Prints the release id, package name and version a deploy would use.

use serde::Serialize;
use stackship::error::Result;
use stackship::output::{Output, OutputMode};
use std::env;

use super::derive_identity;
use crate::cli::IdentityArgs;

#[derive(Serialize)]
struct IdentitySummary<'a> {
    release_id: &'a str,
    package_name: &'a str,
    package_version: &'a str,
    blessed: bool,
}

pub async fn release_id(args: IdentityArgs, output: Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let identity = derive_identity(&args, &cwd).await?;

    if output.mode() == OutputMode::Json {
        let summary = IdentitySummary {
            release_id: identity.release_id().as_str(),
            package_name: identity.package_name(),
            package_version: identity.package_version(),
            blessed: identity.is_blessed(),
        };
        if let Ok(json) = serde_json::to_string(&summary) {
            println!("{json}");
        }
        return Ok(());
    }

    output.progress(&format!("Package name:    {}", identity.package_name()));
    output.progress(&format!("Package version: {}", identity.package_version()));
    output.success(identity.release_id().as_str());
    Ok(())
}
