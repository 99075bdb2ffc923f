//! Workspace preparation: branch checkout and source-format conversion.
//!
//! Both steps are external tools invoked through the command executor; their
//! diagnostics are passed through verbatim when they fail. Failures here are
//! fatal, the same as a submission failure: without a package directory there
//! is nothing to deploy.

use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::DeployError;
use crate::exec::CommandRunner;

/// Clones the repository and checks out the requested branch into `workdir`.
pub async fn checkout_branch(
    runner: &dyn CommandRunner,
    repository: &str,
    branch: &str,
    workdir: &Path,
) -> Result<(), DeployError> {
    info!(repository, branch, "Cloning repository");
    let args: Vec<String> = vec![
        "clone".to_string(),
        "--branch".to_string(),
        branch.to_string(),
        repository.to_string(),
        workdir.display().to_string(),
    ];
    run_step(runner, "git", &args, None, "branch checkout").await
}

/// Converts a source-format working tree into a deployable metadata package.
pub async fn convert_source(
    runner: &dyn CommandRunner,
    config: &Config,
    source_dir: &Path,
    package_dir: &Path,
) -> Result<(), DeployError> {
    info!(
        source = %source_dir.display(),
        package = %package_dir.display(),
        "Converting source format to metadata format"
    );
    let args: Vec<String> = vec![
        "force:source:convert".to_string(),
        "-r".to_string(),
        source_dir.display().to_string(),
        "--outputdir".to_string(),
        package_dir.display().to_string(),
    ];
    run_step(
        runner,
        &config.cli_binary,
        &args,
        config.command_timeout(),
        "source conversion",
    )
    .await
}

async fn run_step(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
    timeout: Option<std::time::Duration>,
    step: &str,
) -> Result<(), DeployError> {
    let output = runner
        .run(program, args, timeout)
        .await
        .map_err(|err| DeployError::Prepare {
            step: step.to_string(),
            detail: err.to_string(),
        })?;

    if !output.success() {
        return Err(DeployError::Prepare {
            step: step.to_string(),
            detail: output.diagnostic().to_string(),
        });
    }

    Ok(())
}
