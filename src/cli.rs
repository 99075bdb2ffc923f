//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "orgdeploy",
    version,
    about = "Deploys a metadata package to an org and tracks the async deployment job"
)]
pub struct Cli {
    /// Path to a JSON configuration file (defaults to ./orgdeploy.json).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy a branch, or an existing package directory, to an org.
    Deploy(DeployArgs),
    /// Resume observation of an already-submitted deployment.
    Report(ReportArgs),
    /// Build a package descriptor from a list of members.
    Manifest(ManifestArgs),
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Repository URL, HTTPS or SSH.
    #[arg(short = 'r', long)]
    pub repository: Option<String>,

    /// Branch to deploy.
    #[arg(short = 'b', long)]
    pub branch: Option<String>,

    /// Alias of the target org.
    #[arg(short = 'u', long)]
    pub target_org: String,

    /// Validate the deployment and run tests without saving it to the org.
    #[arg(short = 'c', long)]
    pub check_only: bool,

    /// Deploy this existing package directory, skipping checkout and
    /// conversion.
    #[arg(long, conflicts_with_all = ["repository", "branch"])]
    pub package_dir: Option<PathBuf>,

    /// Directory the branch is cloned into.
    #[arg(long, default_value = "deploy-workspace")]
    pub workdir: PathBuf,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Deployment id echoed by a previous run.
    #[arg(short = 'i', long)]
    pub deployment_id: String,

    /// Alias of the target org.
    #[arg(short = 'u', long)]
    pub target_org: String,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Args)]
pub struct ManifestArgs {
    /// Component type shared by all members.
    #[arg(short = 't', long)]
    pub component_type: String,

    /// Member names, in order. Repeat for multiple members.
    #[arg(short = 'm', long = "member", required = true)]
    pub members: Vec<String>,

    /// Platform API version for the descriptor.
    #[arg(long)]
    pub api_version: Option<String>,

    /// Directory the descriptor is written into.
    #[arg(short = 'd', long, default_value = "packageToDeploy")]
    pub out_dir: PathBuf,
}

/// Flag-level overrides for values normally read from the config file.
#[derive(Debug, Args)]
pub struct ConfigOverrides {
    /// Base URL of the org, used for the status-page deep link.
    #[arg(long)]
    pub instance_url: Option<String>,

    /// Delay between status polls, in milliseconds.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Stop waiting after this many seconds (the remote job keeps running).
    #[arg(long)]
    pub max_wait_secs: Option<u64>,

    /// Name or path of the platform CLI binary.
    #[arg(long)]
    pub cli_binary: Option<String>,

    /// Distinct exit code for partial success.
    #[arg(long)]
    pub partial_success_exit_code: Option<i32>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.instance_url {
            config.instance_url = Some(url.clone());
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
        if let Some(max_wait) = self.max_wait_secs {
            config.max_wait_secs = Some(max_wait);
        }
        if let Some(binary) = &self.cli_binary {
            config.cli_binary = binary.clone();
        }
        if let Some(code) = self.partial_success_exit_code {
            config.partial_success_exit_code = Some(code);
        }
    }
}
