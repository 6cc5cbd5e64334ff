// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use stackship::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "stackship")]
#[command(about = "Release deployment for CloudFormation stacks, S3 artifacts and CloudFront static content")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a release to a stack, or revert its static content
    Deploy(DeployArgs),

    /// List static releases for a stack, marking the live one
    Releases {
        /// Stack whose static bucket to list
        stack_name: String,

        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config_path: PathBuf,
    },

    /// Print the release id a deploy from this working copy would use
    ReleaseId(IdentityArgs),

    /// Write a sample deploy-config.yaml
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config_path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Inputs to release identity derivation.
#[derive(Args, Debug, Clone)]
pub struct IdentityArgs {
    /// Product name (default: contents of the PRODUCT file)
    #[arg(long)]
    pub product: Option<String>,

    /// Epoch seconds used for the release timestamp (default: now)
    #[arg(long)]
    pub stamp: Option<i64>,

    /// Deploy a blessed release: id without timestamp or commit
    #[arg(long)]
    pub blessed: bool,
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Stack to deploy
    pub stack_name: String,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config_path: PathBuf,

    /// Log what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Build, upload and apply the application
    #[arg(long)]
    pub deploy_app: bool,

    /// Point the distribution at the newly uploaded static release
    #[arg(long)]
    pub update_distro: bool,

    /// Point the distribution at an existing static release
    #[arg(
        long,
        value_name = "ID",
        alias = "change-cloudfront-origin",
        conflicts_with = "deploy_app"
    )]
    pub revert_to_release_id: Option<String>,

    /// Skip static content
    #[arg(long)]
    pub no_static: bool,

    /// Skip database migrations
    #[arg(long)]
    pub no_db_migrations: bool,

    /// Database migrator to run (overrides configuration)
    #[arg(long, value_name = "NAME")]
    pub db_migrator: Option<String>,

    /// Deploy even if this blessed release was deployed before
    #[arg(long)]
    pub allow_blessed_redeploy: bool,

    /// Static content directory (overrides configuration)
    #[arg(long, value_name = "DIR")]
    pub static_src_root: Option<PathBuf>,

    /// Root template file (overrides configuration)
    #[arg(long, value_name = "FILE", conflicts_with = "template_url")]
    pub template: Option<PathBuf>,

    /// Root template URL, used without uploading
    #[arg(long, value_name = "URL")]
    pub template_url: Option<String>,

    /// Stack parameters as "Name=Value;Other=Value"
    #[arg(long, value_name = "K=V;K2=V2")]
    pub parameters: Option<String>,

    #[command(flatten)]
    pub identity: IdentityArgs,
}
