//! Child-process execution for the platform CLI and other external tools.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::DeployError;

/// Captured result of one external command invocation.
///
/// Both streams are preserved in full: callers decide what is diagnostic and
/// what is payload, and unparseable failures are shown to the operator raw.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Best-effort diagnostic text for display: stderr if present, stdout
    /// otherwise.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Runs external command lines. No retry at this layer; retry policy belongs
/// to callers.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, DeployError>;
}

/// [`CommandRunner`] backed by real OS processes.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, DeployError> {
        let rendered = render_command(program, args);
        debug!(command = %rendered, "Running external command");

        let pending = Command::new(program).args(args).output();

        let output = match timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(DeployError::ExecTimeout {
                        command: rendered,
                        seconds: limit.as_secs(),
                    })
                }
            },
            None => pending.await,
        }
        .map_err(|source| DeployError::Exec {
            command: rendered,
            source,
        })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = String::from(program);
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    enum Scripted {
        Output(CommandOutput),
        SpawnError,
    }

    /// Scripted [`CommandRunner`] for tests. Responses are consumed in order;
    /// the last one repeats once the script runs out. Every invocation is
    /// recorded as a rendered command line.
    pub struct ScriptedRunner {
        script: Mutex<Vec<Scripted>>,
        cursor: Mutex<usize>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn with_script(script: Vec<Scripted>) -> Self {
            assert!(!script.is_empty(), "script must not be empty");
            Self {
                script: Mutex::new(script),
                cursor: Mutex::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(stdout: &str) -> Self {
            Self::with_script(vec![Scripted::Output(output(0, stdout, ""))])
        }

        pub fn failing(exit_code: i32, stdout: &str, stderr: &str) -> Self {
            Self::with_script(vec![Scripted::Output(output(exit_code, stdout, stderr))])
        }

        pub fn spawn_error() -> Self {
            Self::with_script(vec![Scripted::SpawnError])
        }

        /// Builds a runner from (exit_code, stdout) pairs, one per tick.
        pub fn sequence(responses: &[(i32, &str)]) -> Self {
            Self::with_script(
                responses
                    .iter()
                    .map(|(code, stdout)| Scripted::Output(output(*code, stdout, "")))
                    .collect(),
            )
        }

        /// Like [`ScriptedRunner::sequence`] but a `None` entry simulates a
        /// spawn failure for that tick.
        pub fn sequence_with_gaps(responses: &[Option<(i32, &str)>]) -> Self {
            Self::with_script(
                responses
                    .iter()
                    .map(|entry| match entry {
                        Some((code, stdout)) => Scripted::Output(output(*code, stdout, "")),
                        None => Scripted::SpawnError,
                    })
                    .collect(),
            )
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    fn output(exit_code: i32, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(exit_code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            _timeout: Option<Duration>,
        ) -> Result<CommandOutput, DeployError> {
            let rendered = render_command(program, args);
            self.calls.lock().unwrap().push(rendered.clone());

            let script = self.script.lock().unwrap();
            let mut cursor = self.cursor.lock().unwrap();
            let index = (*cursor).min(script.len() - 1);
            *cursor += 1;

            match &script[index] {
                Scripted::Output(output) => Ok(output.clone()),
                Scripted::SpawnError => Err(DeployError::Exec {
                    command: rendered,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted"),
                }),
            }
        }
    }
}
