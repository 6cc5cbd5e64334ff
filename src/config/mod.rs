// ABOUTME: Configuration types and parsing for deploy-config.yaml.
// ABOUTME: Loads the global file, applies per-stack and command-line overrides.

mod content_types;
mod deserialize;
mod init;
mod parameter_names;
mod stack_vars;

pub use content_types::ContentTypes;
pub use init::{SAMPLE_CONFIG, init_config};
pub use parameter_names::TemplateParameterNames;
pub use stack_vars::{ConfigOverrides, StackFile, StackVar, VarValue};

use deserialize::{deserialize_bucket_format, deserialize_path_segments};

use crate::artifact::KeyBuilder;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::types::StackName;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "scripts/deploy-config.yaml";

const STACK_NAME_PLACEHOLDER: &str = "{stack_name}";
const PRINTF_PLACEHOLDER: &str = "%(stack_name)s";

/// Bucket name pattern containing a stack name placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketFormat(String);

impl BucketFormat {
    /// Accepts `{stack_name}` or the printf-style `%(stack_name)s`.
    pub fn parse(format: &str) -> std::result::Result<Self, String> {
        if format.contains(STACK_NAME_PLACEHOLDER) || format.contains(PRINTF_PLACEHOLDER) {
            Ok(Self(format.to_string()))
        } else {
            Err(format!(
                "bucket format '{format}' must contain {STACK_NAME_PLACEHOLDER}"
            ))
        }
    }

    pub fn render(&self, stack: &StackName) -> String {
        self.0
            .replace(STACK_NAME_PLACEHOLDER, stack.as_str())
            .replace(PRINTF_PLACEHOLDER, stack.as_str())
    }
}

impl fmt::Display for BucketFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeployConfig {
    #[serde(deserialize_with = "deserialize_bucket_format")]
    pub app_bucket_format: BucketFormat,

    #[serde(deserialize_with = "deserialize_bucket_format")]
    pub static_bucket_format: BucketFormat,

    pub app_releases_path: String,

    pub cfn_template_releases_path: String,

    #[serde(deserialize_with = "deserialize_path_segments")]
    pub cfn_template_root_path: PathBuf,

    pub root_template_name: String,

    #[serde(default)]
    pub nested_stack_templates: Vec<String>,

    #[serde(default)]
    pub static_src_root: Option<PathBuf>,

    #[serde(default)]
    pub static_prefix: String,

    #[serde(default)]
    pub static_folder_exclusions: Vec<PathBuf>,

    #[serde(default = "default_static_cache_max_age", with = "humantime_serde")]
    pub static_cache_max_age: Duration,

    #[serde(default)]
    pub content_types: BTreeMap<String, String>,

    #[serde(default)]
    pub stack_vars_root: Option<PathBuf>,

    #[serde(default)]
    pub db_migrator: Option<String>,

    pub template_parameter_names: TemplateParameterNames,

    #[serde(default)]
    pub setup_parameters: SetupParameters,
}

/// Packager settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SetupParameters {
    #[serde(default)]
    pub search_path_exclusions: Vec<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for SetupParameters {
    fn default() -> Self {
        Self {
            search_path_exclusions: Vec::new(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_static_cache_max_age() -> Duration {
    Duration::from_secs(86_400)
}

/// Settings given on the command line, which win over both files.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub static_src_root: Option<PathBuf>,
    pub db_migrator: Option<String>,
}

/// Effective configuration for one stack.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub stack: StackName,
    pub project_dir: PathBuf,
    pub app_bucket: String,
    pub static_bucket: String,
    pub app_releases_path: String,
    pub template_releases_path: String,
    /// Directory holding the root and nested templates.
    pub template_dir: PathBuf,
    pub root_template_name: String,
    pub nested_templates: Vec<String>,
    /// Absolute static source directory; `None` disables static content.
    pub static_src_root: Option<PathBuf>,
    pub static_prefix: String,
    pub static_folder_exclusions: Vec<PathBuf>,
    pub static_cache_max_age: Duration,
    pub content_types: ContentTypes,
    pub db_migrator: Option<String>,
    pub parameter_names: TemplateParameterNames,
    /// Stack variables rendered as parameter values.
    pub stack_vars: BTreeMap<String, String>,
    pub setup: SetupParameters,
}

impl DeployConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.root_template_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "root-template-name must not be empty".to_string(),
            ));
        }
        self.template_parameter_names
            .validate(&self.nested_stack_templates)
    }

    /// Merge the per-stack file and command-line settings over this config.
    ///
    /// Relative paths are resolved against `project_dir`. A configured but
    /// missing stack file is reported as a warning and contributes nothing.
    pub fn resolve(
        &self,
        stack: &StackName,
        project_dir: &Path,
        cli: &CliOverrides,
        diagnostics: &mut Diagnostics,
    ) -> Result<ResolvedConfig> {
        let stack_file = match &self.stack_vars_root {
            Some(root) => {
                let root = project_dir.join(root);
                let loaded = StackFile::load(&root, stack)?;
                if loaded.is_none() {
                    diagnostics.warn(Warning::missing_stack_vars(format!(
                        "Could not find stack-specific variables at {}",
                        StackFile::path(&root, stack).display()
                    )));
                }
                loaded.unwrap_or_default()
            }
            None => StackFile::default(),
        };
        let overrides = &stack_file.overrides;

        let static_src_root = cli
            .static_src_root
            .clone()
            .or_else(|| overrides.static_src_root.clone())
            .or_else(|| self.static_src_root.clone())
            .map(|root| project_dir.join(root));

        let db_migrator = cli
            .db_migrator
            .clone()
            .or_else(|| overrides.db_migrator.clone())
            .or_else(|| self.db_migrator.clone());

        Ok(ResolvedConfig {
            stack: stack.clone(),
            project_dir: project_dir.to_path_buf(),
            app_bucket: self.app_bucket_format.render(stack),
            static_bucket: self.static_bucket_format.render(stack),
            app_releases_path: self.app_releases_path.clone(),
            template_releases_path: self.cfn_template_releases_path.clone(),
            template_dir: project_dir.join(&self.cfn_template_root_path),
            root_template_name: self.root_template_name.clone(),
            nested_templates: self.nested_stack_templates.clone(),
            static_src_root,
            static_prefix: overrides
                .static_prefix
                .clone()
                .unwrap_or_else(|| self.static_prefix.clone()),
            static_folder_exclusions: overrides
                .static_folder_exclusions
                .clone()
                .unwrap_or_else(|| self.static_folder_exclusions.clone()),
            static_cache_max_age: overrides
                .static_cache_max_age
                .unwrap_or(self.static_cache_max_age),
            content_types: ContentTypes::with_overrides(&self.content_types),
            db_migrator,
            parameter_names: self.template_parameter_names.clone(),
            stack_vars: stack_file.rendered_vars(),
            setup: self.setup_parameters.clone(),
        })
    }
}

impl ResolvedConfig {
    pub fn key_builder(&self) -> KeyBuilder {
        KeyBuilder::new(
            &self.app_releases_path,
            &self.template_releases_path,
            self.static_src_root.as_deref(),
            &self.static_prefix,
        )
    }

    pub fn static_enabled(&self) -> bool {
        self.static_src_root.is_some()
    }

    pub fn root_template_path(&self) -> PathBuf {
        self.template_dir.join(&self.root_template_name)
    }

    pub fn nested_template_path(&self, name: &str) -> PathBuf {
        self.template_dir.join(name)
    }

    /// `Cache-Control` header for static uploads.
    pub fn static_cache_control(&self) -> String {
        format!("max-age={}", self.static_cache_max_age.as_secs())
    }
}
