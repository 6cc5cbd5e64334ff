// ABOUTME: Pluggable database migration runners selected by name.
// ABOUTME: Resolves the configured migrator and runs it before packaging.

mod command;
mod registry;

pub use command::CommandMigrator;
pub use registry::{LookupError, MigratorFactory, MigratorRegistry};

use async_trait::async_trait;

/// Exit status and captured output of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl MigrationOutcome {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// A migration strategy. Runs to completion and reports how it went.
#[async_trait]
pub trait MigrationRunner: Send + Sync {
    async fn run(&self) -> MigrationOutcome;
}

/// Which migrator, if any, this deployment uses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MigratorSelection {
    /// No migrator configured or migrations disabled.
    #[default]
    None,
    Named(String),
}

impl MigratorSelection {
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some(n) if !n.is_empty() => Self::Named(n.to_string()),
            _ => Self::None,
        }
    }
}

/// Run the selected migrator.
///
/// No selection is a successful no-op. A name missing from the registry is
/// reported as exit status 1 with the reason on stderr.
pub async fn run_migrations(
    registry: &MigratorRegistry,
    selection: &MigratorSelection,
) -> MigrationOutcome {
    match selection {
        MigratorSelection::None => MigrationOutcome {
            status: 0,
            stdout: "No db migrator specified.".to_string(),
            stderr: String::new(),
        },
        MigratorSelection::Named(name) => match registry.lookup(name) {
            Ok(runner) => runner.run().await,
            Err(e) => {
                tracing::error!("{}", e);
                MigrationOutcome {
                    status: 1,
                    stdout: String::new(),
                    stderr: format!("Could not find db migrator [{name}]"),
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct Fixed(i32);

    #[async_trait]
    impl MigrationRunner for Fixed {
        async fn run(&self) -> MigrationOutcome {
            MigrationOutcome {
                status: self.0,
                stdout: "ran".to_string(),
                stderr: String::new(),
            }
        }
    }

    #[tokio::test]
    async fn no_selection_is_success() {
        let registry = MigratorRegistry::new(Path::new("."));
        let outcome = run_migrations(&registry, &MigratorSelection::None).await;
        assert!(outcome.success());
        assert_eq!(outcome.stdout, "No db migrator specified.");
    }

    #[tokio::test]
    async fn unknown_name_fails_with_status_one() {
        let registry = MigratorRegistry::new(Path::new("."));
        let outcome =
            run_migrations(&registry, &MigratorSelection::Named("flyway".to_string())).await;
        assert_eq!(outcome.status, 1);
        assert_eq!(outcome.stderr, "Could not find db migrator [flyway]");
    }

    #[tokio::test]
    async fn registered_runner_is_used() {
        let mut registry = MigratorRegistry::new(Path::new("."));
        registry.register("fixed", |_| Box::new(Fixed(3)));
        let outcome =
            run_migrations(&registry, &MigratorSelection::Named("fixed".to_string())).await;
        assert_eq!(outcome.status, 3);
    }

    #[test]
    fn blank_name_means_no_migrator() {
        assert_eq!(MigratorSelection::from_name(Some("  ")), MigratorSelection::None);
        assert_eq!(
            MigratorSelection::from_name(Some("django")),
            MigratorSelection::Named("django".to_string())
        );
    }
}
