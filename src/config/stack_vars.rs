// ABOUTME: Per-stack variables file with typed values and configuration overrides.
// ABOUTME: String-typed values are single-quoted when passed as stack parameters.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::StackName;

/// A literal value as written in YAML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Number(serde_yaml::Number),
    Text(String),
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Bool(b) => write!(f, "{b}"),
            VarValue::Number(n) => write!(f, "{n}"),
            VarValue::Text(s) => f.write_str(s),
        }
    }
}

/// One stack variable and its declared type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StackVar {
    pub value: VarValue,
    #[serde(rename = "type", default = "default_var_type")]
    pub var_type: String,
}

fn default_var_type() -> String {
    "str".to_string()
}

impl StackVar {
    /// Parameter value: `'v'` for `str`/`unicode`, the bare value otherwise.
    pub fn render(&self) -> String {
        match self.var_type.as_str() {
            "str" | "unicode" => format!("'{}'", self.value),
            _ => self.value.to_string(),
        }
    }
}

/// Settings a stack file may override over the global configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub db_migrator: Option<String>,
    #[serde(default)]
    pub static_src_root: Option<PathBuf>,
    #[serde(default)]
    pub static_prefix: Option<String>,
    #[serde(default)]
    pub static_folder_exclusions: Option<Vec<PathBuf>>,
    #[serde(default, with = "humantime_serde")]
    pub static_cache_max_age: Option<Duration>,
}

/// Contents of `{stack}-deploy.yaml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackFile {
    pub vars: BTreeMap<String, StackVar>,
    pub overrides: ConfigOverrides,
}

#[derive(Deserialize)]
struct RawStackFile {
    #[serde(default)]
    overrides: Option<ConfigOverrides>,
    #[serde(flatten)]
    sections: BTreeMap<String, serde_yaml::Value>,
}

impl StackFile {
    /// Location of the stack file under `root`.
    pub fn path(root: &Path, stack: &StackName) -> PathBuf {
        root.join(format!("{stack}-deploy.yaml"))
    }

    pub fn from_yaml(yaml: &str, stack: &StackName) -> Result<Self> {
        let raw: RawStackFile = serde_yaml::from_str(yaml)?;
        let section = format!("{stack}-vars");

        let vars = match raw.sections.get(&section) {
            Some(value) => serde_yaml::from_value(value.clone())
                .map_err(|e| Error::InvalidConfig(format!("{section}: {e}")))?,
            None => BTreeMap::new(),
        };

        Ok(Self {
            vars,
            overrides: raw.overrides.unwrap_or_default(),
        })
    }

    /// Load the stack file, or `None` if it does not exist.
    pub fn load(root: &Path, stack: &StackName) -> Result<Option<Self>> {
        let path = Self::path(root, stack);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content, stack)
            .map(Some)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))
    }

    /// Every variable rendered as a stack parameter value.
    pub fn rendered_vars(&self) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.render()))
            .collect()
    }
}
