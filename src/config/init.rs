// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes a commented sample deploy-config.yaml.

use std::path::Path;

use crate::error::{Error, Result};

/// Sample configuration written by `init`.
pub const SAMPLE_CONFIG: &str = r#"# Bucket names; {stack_name} is replaced with the deployed stack's name.
app-bucket-format: "{stack_name}-build"
static-bucket-format: "static-{stack_name}"

# Key prefixes inside the application bucket.
app-releases-path: app
cfn-template-releases-path: cfn-configs

# Directory (as path segments) holding the templates.
cfn-template-root-path: [app, conf, cfn]
root-template-name: root.json
nested-stack-templates: []

# Static content. Remove static-src-root to deploy without static files.
# static-src-root: static
# static-prefix: static
# static-folder-exclusions: [src]
static-cache-max-age: 1day
# content-types:
#   .webp: image/webp

# Per-stack variables live in {stack-vars-root}/{stack}-deploy.yaml.
# stack-vars-root: scripts/stacks

# db-migrator: django

template-parameter-names:
  application-source-parameter-name: ApplicationSource
  release-id-parameter-name: ReleaseID
  release-notes-parameter-name: ReleaseNotes
  root-stack-parameter-name: RootStackName
  app-bucket-parameter-name: BuildBucketName
  app-bucket-arn-param-name: BuildBucketAccessArn
  nested-stack-param-name-dict: {}

setup-parameters:
  search-path-exclusions: [static, tests]
  output-dir: dist
"#;

pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::AlreadyExists(path.to_path_buf()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, SAMPLE_CONFIG)?;

    Ok(())
}
