use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

/// Configuration for the deployment orchestrator.
///
/// Every field has a default so a missing or partial config file never blocks
/// a deployment; CLI flags override whatever was loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name (or path) of the platform CLI binary.
    #[serde(default = "default_cli_binary")]
    pub cli_binary: String,

    /// Delay between status polls, in milliseconds. Fixed, no backoff.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Optional wall-clock bound on polling, in seconds. Absent by default:
    /// polling is unbounded and the operator interrupts.
    #[serde(default)]
    pub max_wait_secs: Option<u64>,

    /// Base URL of the org, used to build the deep link to its deployment
    /// status page. When absent the link is omitted from the summary.
    #[serde(default)]
    pub instance_url: Option<String>,

    /// Per-command timeout for submit/status calls, in seconds. Absent means
    /// wait as long as the call takes.
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,

    /// Exit code to use for `SucceededPartial` outcomes. Defaults to 0, the
    /// same as full success.
    #[serde(default)]
    pub partial_success_exit_code: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cli_binary: default_cli_binary(),
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_secs: None,
            instance_url: None,
            command_timeout_secs: None,
            partial_success_exit_code: None,
        }
    }
}

fn default_cli_binary() -> String {
    "sfdx".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults if the
    /// file is absent or unreadable.
    pub async fn load(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("orgdeploy.json"));

        if !path.exists() {
            return Self::default();
        }

        match Self::try_load(&path).await {
            Ok(config) => {
                info!(path = %path.display(), "Loaded configuration");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    async fn try_load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|err| format!("failed to read config file: {err}"))?;
        serde_json::from_str(&contents).map_err(|err| format!("failed to parse config: {err}"))
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Option<std::time::Duration> {
        self.max_wait_secs.map(std::time::Duration::from_secs)
    }

    pub fn command_timeout(&self) -> Option<std::time::Duration> {
        self.command_timeout_secs.map(std::time::Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"poll_interval_ms": 250}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.cli_binary, "sfdx");
        assert!(config.max_wait_secs.is_none());
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/orgdeploy.json"))).await;
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[tokio::test]
    async fn unparseable_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not json").unwrap();
        let config = Config::load(Some(file.path())).await;
        assert_eq!(config.cli_binary, "sfdx");
    }

    #[tokio::test]
    async fn loads_instance_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"instance_url": "https://ecorp.my.salesforce.com"}}"#
        )
        .unwrap();
        let config = Config::load(Some(file.path())).await;
        assert_eq!(
            config.instance_url.as_deref(),
            Some("https://ecorp.my.salesforce.com")
        );
    }
}
