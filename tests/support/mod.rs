// ABOUTME: Test support utilities.
// ABOUTME: Project fixtures, a recording packager and tracing setup for integration tests.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use stackship::config::{CliOverrides, DeployConfig, ResolvedConfig};
use stackship::diagnostics::Diagnostics;
use stackship::migrate::{MigrationOutcome, MigrationRunner};
use stackship::package::{PackageError, PackageMetadata, Packager};
use stackship::release::{IdentityRequest, ReleaseIdentity};
use stackship::types::StackName;
use stackship::vcs::StaticVcs;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("stackship=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const STAMP: i64 = 1_700_000_000;
pub const COMMIT: &str = "abcdef1234567890abcdef1234567890abcdef12";

pub const CONFIG_YAML: &str = r#"
app-bucket-format: "{stack_name}-build"
static-bucket-format: "static-{stack_name}"
app-releases-path: app
cfn-template-releases-path: cfn-configs
cfn-template-root-path: [app, conf, cfn]
root-template-name: root.json
nested-stack-templates: [queue.json]
static-src-root: static
static-prefix: static
static-folder-exclusions: [src]
static-cache-max-age: 1h
stack-vars-root: scripts/stacks
template-parameter-names:
  application-source-parameter-name: ApplicationSource
  release-id-parameter-name: ReleaseID
  release-notes-parameter-name: ReleaseNotes
  root-stack-parameter-name: RootStackName
  app-bucket-parameter-name: BuildBucketName
  app-bucket-arn-param-name: BuildBucketAccessArn
  nested-stack-param-name-dict:
    queue.json: QueueTemplateURL
"#;

const STACK_VARS_YAML: &str = r#"
prod-vars:
  DbInstanceClass: {value: db.t3.small, type: str}
  MinInstances: {value: 2, type: int}
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A project directory with templates, static files and a stack vars file.
///
/// Static files: `index.html`, `css/site.css`, `img/logo.png`, `src/app.ts`
/// (excluded) and `notes.unknownext` (no content type).
pub fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "scripts/deploy-config.yaml", CONFIG_YAML);
    write(root, "scripts/stacks/prod-deploy.yaml", STACK_VARS_YAML);
    write(root, "PRODUCT", "acme\n");
    write(root, "VERSION", "9.9.9\n");
    write(root, "manage.py", "print('manage')\n");
    write(root, "app/conf/cfn/root.json", r#"{"Resources": {}}"#);
    write(root, "app/conf/cfn/queue.json", r#"{"Resources": {"Queue": {}}}"#);
    write(root, "static/index.html", "<html></html>");
    write(root, "static/css/site.css", "body {}");
    write(root, "static/img/logo.png", "png");
    write(root, "static/src/app.ts", "let x = 1;");
    write(root, "static/notes.unknownext", "?");
    dir
}

pub fn stack() -> StackName {
    StackName::new("prod").unwrap()
}

pub fn resolved(project_dir: &Path) -> ResolvedConfig {
    resolved_with(project_dir, &CliOverrides::default())
}

pub fn resolved_with(project_dir: &Path, cli: &CliOverrides) -> ResolvedConfig {
    let config = DeployConfig::from_yaml(CONFIG_YAML).unwrap();
    let mut diag = Diagnostics::default();
    config.resolve(&stack(), project_dir, cli, &mut diag).unwrap()
}

/// Identity for branch `release1.2.3` at `COMMIT`, stamped `STAMP`.
pub async fn identity(project_dir: &Path, blessed: bool) -> ReleaseIdentity {
    let vcs = StaticVcs::new("release1.2.3", COMMIT);
    let request = IdentityRequest::new("acme", STAMP, blessed, project_dir);
    ReleaseIdentity::derive(&vcs, &request).await.unwrap()
}

/// Packager that writes a placeholder archive and records each build.
#[derive(Default)]
pub struct RecordingPackager {
    builds: Mutex<Vec<PackageMetadata>>,
}

impl RecordingPackager {
    pub fn builds(&self) -> Vec<PackageMetadata> {
        self.builds.lock().clone()
    }
}

#[async_trait]
impl Packager for RecordingPackager {
    fn artifact_file_name(&self, metadata: &PackageMetadata) -> String {
        format!("{}.tar.gz", metadata.base_name())
    }

    async fn build(&self, metadata: &PackageMetadata) -> Result<PathBuf, PackageError> {
        self.builds.lock().push(metadata.clone());
        let path = metadata
            .source_dir
            .join("dist")
            .join(self.artifact_file_name(metadata));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "archive").unwrap();
        Ok(path)
    }
}

/// Migration runner with a fixed exit status that counts its runs.
pub struct CountingMigrator {
    status: i32,
    runs: std::sync::Arc<Mutex<u32>>,
}

impl CountingMigrator {
    pub fn new(status: i32, runs: std::sync::Arc<Mutex<u32>>) -> Self {
        Self { status, runs }
    }
}

#[async_trait]
impl MigrationRunner for CountingMigrator {
    async fn run(&self) -> MigrationOutcome {
        *self.runs.lock() += 1;
        MigrationOutcome {
            status: self.status,
            stdout: String::new(),
            stderr: if self.status == 0 {
                String::new()
            } else {
                "migration exploded".to_string()
            },
        }
    }
}
