mod cli;
mod config;
mod deploy;
mod error;
mod exec;
mod manifest;
mod prepare;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, DeployArgs, ManifestArgs, ReportArgs};
use crate::config::Config;
use crate::deploy::{DeployRequest, DeploymentId, Orchestrator, ProgressReporter};
use crate::error::DeployError;
use crate::exec::ProcessRunner;
use crate::manifest::PackageManifest;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit = match run(cli).await {
        Ok(code) => code,
        Err(err @ DeployError::Interrupted) => {
            eprintln!("{err}");
            130
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    };
    std::process::exit(exit);
}

async fn run(cli: Cli) -> Result<i32, DeployError> {
    let mut config = Config::load(cli.config.as_deref()).await;

    match cli.command {
        Command::Deploy(args) => {
            args.overrides.apply(&mut config);
            deploy_command(args, &config).await
        }
        Command::Report(args) => {
            args.overrides.apply(&mut config);
            report_command(args, &config).await
        }
        Command::Manifest(args) => manifest_command(args).await,
    }
}

async fn deploy_command(args: DeployArgs, config: &Config) -> Result<i32, DeployError> {
    let runner = ProcessRunner;
    let cancel = install_interrupt_flag();

    let package_dir = match args.package_dir {
        Some(dir) => dir,
        None => {
            let (repository, branch) = match (&args.repository, &args.branch) {
                (Some(repository), Some(branch)) => (repository, branch),
                _ => {
                    return Err(DeployError::Config(
                        "either --package-dir or both --repository and --branch are required"
                            .to_string(),
                    ))
                }
            };
            prepare::checkout_branch(&runner, repository, branch, &args.workdir).await?;
            let package_dir = args.workdir.join("packageToDeploy");
            prepare::convert_source(&runner, config, &args.workdir, &package_dir).await?;
            package_dir
        }
    };

    let request = DeployRequest {
        package_dir,
        target_org: args.target_org,
        check_only: args.check_only,
    };

    let mut reporter = ProgressReporter::stdout();
    let outcome = Orchestrator::new(&runner, config)
        .run(&request, &mut reporter, &cancel)
        .await?;
    Ok(outcome.exit_code(config))
}

async fn report_command(args: ReportArgs, config: &Config) -> Result<i32, DeployError> {
    let runner = ProcessRunner;
    let cancel = install_interrupt_flag();

    let mut reporter = ProgressReporter::stdout();
    let outcome = Orchestrator::new(&runner, config)
        .observe(
            DeploymentId::new(args.deployment_id),
            &args.target_org,
            &mut reporter,
            &cancel,
        )
        .await?;
    Ok(outcome.exit_code(config))
}

async fn manifest_command(args: ManifestArgs) -> Result<i32, DeployError> {
    let mut builder = PackageManifest::builder(args.component_type).members(args.members);
    if let Some(version) = args.api_version {
        builder = builder.api_version(version);
    }
    let manifest = builder.build()?;
    let path = manifest.write_to(&args.out_dir).await?;
    println!("Wrote {}", path.display());
    Ok(0)
}

/// Flips a shared flag on Ctrl-C. The poll loop checks it at tick boundaries,
/// so an in-flight status call is never torn down mid-read; the remote
/// deployment itself keeps running either way.
fn install_interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping at the next tick");
            handler.store(true, Ordering::SeqCst);
        }
    });
    flag
}
