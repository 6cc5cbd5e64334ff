// ABOUTME: Name-to-factory registry of migration runners.
// ABOUTME: Populated at startup; unknown names are a distinct lookup error.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{CommandMigrator, MigrationRunner};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no db migrator registered as '{name}' (known: {known})")]
    NotFound { name: String, known: String },
}

/// Builds a runner for the project in the given directory.
pub type MigratorFactory = Box<dyn Fn(&Path) -> Box<dyn MigrationRunner> + Send + Sync>;

/// Registry of migration runners keyed by name.
pub struct MigratorRegistry {
    project_dir: PathBuf,
    factories: BTreeMap<String, MigratorFactory>,
}

impl fmt::Debug for MigratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigratorRegistry")
            .field("project_dir", &self.project_dir)
            .field("names", &self.names())
            .finish()
    }
}

impl MigratorRegistry {
    /// An empty registry.
    pub fn new(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            factories: BTreeMap::new(),
        }
    }

    /// A registry with the built-in runners (`django`).
    pub fn with_builtins(project_dir: &Path) -> Self {
        let mut registry = Self::new(project_dir);
        registry.register("django", |dir| Box::new(CommandMigrator::django(dir)));
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Path) -> Box<dyn MigrationRunner> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn lookup(&self, name: &str) -> Result<Box<dyn MigrationRunner>, LookupError> {
        self.factories
            .get(name)
            .map(|factory| factory(&self.project_dir))
            .ok_or_else(|| LookupError::NotFound {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_include_django() {
        let registry = MigratorRegistry::with_builtins(Path::new("."));
        assert!(registry.contains("django"));
        assert!(registry.lookup("django").is_ok());
    }

    #[test]
    fn unknown_name_is_not_found() {
        let registry = MigratorRegistry::with_builtins(Path::new("."));
        let err = registry.lookup("rails").err().unwrap();
        assert!(matches!(err, LookupError::NotFound { ref name, .. } if name == "rails"));
        assert!(err.to_string().contains("django"));
    }
}
