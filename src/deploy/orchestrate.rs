//! Sequences submission, polling and reporting, and owns the final verdict.

use std::io::Write;
use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Config;
use crate::deploy::model::{DeployRequest, DeploymentId, StatusRecord};
use crate::deploy::poll::Poller;
use crate::deploy::report::{failure_table, ProgressReporter};
use crate::deploy::submit::Submitter;
use crate::error::DeployError;
use crate::exec::CommandRunner;

/// Fixed path into the org's own deployment status console. Appending the
/// deployment id yields the full deep link.
pub const STATUS_PAGE_PATH: &str =
    "/lightning/setup/DeployStatus/page?address=%2Fchangemgmt%2FmonitorDeploymentsDetails.apexp%3FasyncId%3D";

/// Terminal result of one orchestration run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub id: DeploymentId,
    pub record: StatusRecord,
    pub finished_at: DateTime<Utc>,
}

impl Outcome {
    /// Process exit code for this outcome. Partial success maps to 0 unless
    /// the configuration assigns it a distinct code.
    pub fn exit_code(&self, config: &Config) -> i32 {
        use crate::deploy::model::DeployState::*;
        match self.record.state {
            Succeeded => 0,
            SucceededPartial => config.partial_success_exit_code.unwrap_or(0),
            _ => 1,
        }
    }
}

pub struct Orchestrator<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a Config,
}

impl<'a> Orchestrator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    /// Full run: submit, then observe until terminal. A submission failure
    /// aborts before any poll is issued.
    pub async fn run<W: Write + Send>(
        &self,
        request: &DeployRequest,
        reporter: &mut ProgressReporter<W>,
        cancel: &AtomicBool,
    ) -> Result<Outcome, DeployError> {
        let id = Submitter::new(self.runner, self.config)
            .submit(request)
            .await?;

        // Echoed before the first poll so an interrupted run can be resumed
        // with `orgdeploy report`.
        reporter.note(&format!(
            "\nThe deployment has been requested with id: {id}\n"
        ));

        self.observe(id, &request.target_org, reporter, cancel).await
    }

    /// Observes an already-submitted deployment until terminal. Used both by
    /// [`Orchestrator::run`] and to resume observation of an interrupted run.
    pub async fn observe<W: Write + Send>(
        &self,
        id: DeploymentId,
        target_org: &str,
        reporter: &mut ProgressReporter<W>,
        cancel: &AtomicBool,
    ) -> Result<Outcome, DeployError> {
        let record = Poller::new(self.runner, self.config)
            .poll(&id, target_org, reporter, cancel)
            .await?;

        let outcome = Outcome {
            id,
            record,
            finished_at: Utc::now(),
        };
        self.summarize(reporter, &outcome);
        Ok(outcome)
    }

    fn summarize<W: Write + Send>(&self, reporter: &mut ProgressReporter<W>, outcome: &Outcome) {
        info!(
            id = %outcome.id,
            state = %outcome.record.state,
            finished_at = %outcome.finished_at,
            "Deployment reached a terminal state"
        );

        reporter.note(&format!(
            "\nDeployment {} finished: {}",
            outcome.id, outcome.record.state
        ));

        // Failed and partial outcomes repeat the final failure list so it is
        // the last thing on screen.
        if !outcome.record.state.is_success() || outcome.record.error_count > 0 {
            if !outcome.record.component_failures.is_empty() {
                reporter.note(&format!(
                    "\n{}",
                    failure_table(&outcome.record.component_failures)
                ));
            }
        }

        match &self.config.instance_url {
            Some(base) => reporter.note(&format!(
                "\nLink to deployment page in the org:\n{}{}{}",
                base.trim_end_matches('/'),
                STATUS_PAGE_PATH,
                outcome.id
            )),
            None => info!(id = %outcome.id, "No instance URL configured, skipping deep link"),
        }
    }
}
