// ABOUTME: Migration runner that executes an external command.
// ABOUTME: Captures exit status, stdout and stderr the way deploy hooks do.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{MigrationOutcome, MigrationRunner};

/// Runs `program args...` in the project directory.
#[derive(Debug, Clone)]
pub struct CommandMigrator {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandMigrator {
    pub fn new(program: impl Into<String>, args: &[&str], working_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Django's `python manage.py makemigrations`.
    pub fn django(project_dir: &Path) -> Self {
        Self::new("python", &["manage.py", "makemigrations"], project_dir)
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl MigrationRunner for CommandMigrator {
    async fn run(&self) -> MigrationOutcome {
        let command_line = self.command_line();
        tracing::info!(
            "Running migrations: {} (in {})",
            command_line,
            self.working_dir.display()
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => {
                let outcome = MigrationOutcome {
                    // Killed by a signal: no code, report as failure.
                    status: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if outcome.success() {
                    tracing::info!("{} completed successfully", command_line);
                } else {
                    tracing::warn!("{} failed with exit code {}", command_line, outcome.status);
                }

                outcome
            }
            Err(e) => {
                tracing::error!("Failed to execute {}: {}", command_line, e);
                MigrationOutcome {
                    status: 1,
                    stdout: String::new(),
                    stderr: format!("failed to execute {command_line}: {e}"),
                }
            }
        }
    }
}
