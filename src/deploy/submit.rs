//! Issues the "start deployment" request and extracts the deployment handle.

use tracing::info;

use crate::config::Config;
use crate::deploy::model::{DeployRequest, DeploymentId};
use crate::deploy::parse::parse_submit_response;
use crate::error::DeployError;
use crate::exec::CommandRunner;

/// Submits a deployment request against a package directory. Any failure
/// here means there is nothing to poll, so everything collapses into
/// [`DeployError::Submission`] with the raw diagnostic attached.
pub struct Submitter<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a Config,
}

impl<'a> Submitter<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    pub async fn submit(&self, request: &DeployRequest) -> Result<DeploymentId, DeployError> {
        let mut args: Vec<String> = vec!["force:mdapi:deploy".to_string()];
        if request.check_only {
            args.push("-c".to_string());
        }
        args.extend([
            "-d".to_string(),
            request.package_dir.display().to_string(),
            "-u".to_string(),
            request.target_org.clone(),
            "--json".to_string(),
        ]);

        let output = self
            .runner
            .run(&self.config.cli_binary, &args, self.config.command_timeout())
            .await
            .map_err(|err| DeployError::Submission {
                detail: err.to_string(),
            })?;

        if !output.success() {
            return Err(DeployError::Submission {
                detail: output.diagnostic().to_string(),
            });
        }

        let id = parse_submit_response(&output.stdout).map_err(|err| DeployError::Submission {
            detail: err.to_string(),
        })?;

        info!(id = %id, org = %request.target_org, check_only = request.check_only, "Deployment requested");
        Ok(id)
    }
}
