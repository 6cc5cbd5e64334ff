// ABOUTME: Entry point for the stackship CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use stackship::config;
use stackship::error::{CREDENTIALS_HINT, Result};
use stackship::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise debug with --verbose, warn without.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);
    let result = run(cli, mode).await;

    if let Err(e) = result {
        let message = if e.is_access_denied() {
            format!("{e}\n{CREDENTIALS_HINT}")
        } else {
            e.to_string()
        };
        Output::new(mode).error(&message);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    match cli.command {
        Commands::Init { config_path, force } => {
            let path = env::current_dir()?.join(&config_path);
            config::init_config(&path, force)?;
            Output::new(mode).success(&format!("Created {}", config_path.display()));
            Ok(())
        }
        Commands::Deploy(args) => {
            let output = Output::new(mode).with_dry_run(args.dry_run);
            commands::deploy(args, output).await
        }
        Commands::Releases {
            stack_name,
            config_path,
        } => commands::releases(&stack_name, &config_path, Output::new(mode)).await,
        Commands::ReleaseId(args) => commands::release_id(args, Output::new(mode)).await,
    }
}
