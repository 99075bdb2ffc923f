//! Status polling loop.
//!
//! Fixed delay between ticks, no backoff, and no iteration cap by default:
//! a platform that stays unreachable is the operator's call to interrupt.
//! `done == true` in a parsed record is the only thing that ends the loop.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::warn;

use crate::config::Config;
use crate::deploy::model::{DeploymentId, StatusRecord};
use crate::deploy::parse::{parse_status_response, ParsedResponse};
use crate::deploy::report::ProgressReporter;
use crate::error::DeployError;
use crate::exec::CommandRunner;

pub struct Poller<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a Config,
}

impl<'a> Poller<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    /// Polls until the deployment reports a terminal record, surfacing every
    /// update through the reporter. Cancellation is observed at tick
    /// boundaries only; ticks are strictly serialized, one outstanding status
    /// call at a time.
    pub async fn poll<W: Write + Send>(
        &self,
        id: &DeploymentId,
        target_org: &str,
        reporter: &mut ProgressReporter<W>,
        cancel: &AtomicBool,
    ) -> Result<StatusRecord, DeployError> {
        let args: Vec<String> = vec![
            "force:mdapi:deploy:report".to_string(),
            "-i".to_string(),
            id.as_str().to_string(),
            "-u".to_string(),
            target_org.to_string(),
            "--json".to_string(),
        ];

        let started = Instant::now();

        loop {
            if cancel.load(Ordering::SeqCst) {
                return Err(DeployError::Interrupted);
            }

            match self
                .runner
                .run(&self.config.cli_binary, &args, self.config.command_timeout())
                .await
            {
                Ok(output) => match parse_status_response(&output.stdout) {
                    ParsedResponse::Success(record) | ParsedResponse::Failure(record) => {
                        reporter.observe(&record);
                        if record.is_terminal() {
                            return Ok(record);
                        }
                    }
                    ParsedResponse::Unparseable(raw) => {
                        // Shown raw and kept in progress: the next tick may
                        // decode fine.
                        let text = if raw.trim().is_empty() {
                            output.diagnostic().to_string()
                        } else {
                            raw
                        };
                        warn!(id = %id, "Status response did not parse");
                        reporter.note(&text);
                    }
                },
                Err(err) => {
                    warn!(id = %id, error = %err, "Status call failed, retrying on next tick");
                    reporter.note(&err.to_string());
                }
            }

            if let Some(max_wait) = self.config.max_wait() {
                if started.elapsed() >= max_wait {
                    return Err(DeployError::WaitExpired {
                        seconds: max_wait.as_secs(),
                    });
                }
            }

            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }
}
