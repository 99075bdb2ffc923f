//! Deployment domain model.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Opaque identifier returned by the platform when a deployment is requested.
///
/// This is the sole correlation key for status polling. It is echoed to the
/// operator as soon as it is known so an interrupted run can be resumed with
/// the `report` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentId(String);

impl DeploymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the orchestrator asks the platform to do. Immutable once built.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub package_dir: PathBuf,
    pub target_org: String,
    /// Validate and run tests without saving the deployment to the org.
    pub check_only: bool,
}

/// Deployment job state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployState {
    Pending,
    InProgress,
    Canceling,
    Succeeded,
    SucceededPartial,
    Failed,
    Canceled,
}

impl DeployState {
    /// Maps the platform's status string. Unknown strings degrade
    /// conservatively: still-running jobs stay `InProgress`, finished jobs
    /// become `Failed`.
    pub fn from_api(raw: &str, done: bool) -> Self {
        match raw {
            "Pending" | "Queued" => DeployState::Pending,
            "InProgress" => DeployState::InProgress,
            "Canceling" => DeployState::Canceling,
            "Succeeded" => DeployState::Succeeded,
            "SucceededPartial" => DeployState::SucceededPartial,
            "Failed" => DeployState::Failed,
            "Canceled" => DeployState::Canceled,
            _ if done => DeployState::Failed,
            _ => DeployState::InProgress,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeployState::Succeeded | DeployState::SucceededPartial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeployState::Pending => "Pending",
            DeployState::InProgress => "InProgress",
            DeployState::Canceling => "Canceling",
            DeployState::Succeeded => "Succeeded",
            DeployState::SucceededPartial => "SucceededPartial",
            DeployState::Failed => "Failed",
            DeployState::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One component the platform refused to deploy, and why.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComponentFailure {
    #[serde(default, rename = "componentType")]
    pub component_type: String,
    #[serde(default, rename = "fullName")]
    pub full_name: String,
    #[serde(default, rename = "problemType")]
    pub problem_type: String,
    #[serde(default)]
    pub problem: String,
}

/// Snapshot of the remote job, produced fresh on every poll tick and never
/// mutated afterwards.
///
/// `done == true` is the sole authorized loop-exit condition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRecord {
    pub done: bool,
    pub state: DeployState,
    pub components_deployed: u64,
    pub components_total: u64,
    pub state_detail: Option<String>,
    pub error_count: u64,
    pub component_failures: Vec<ComponentFailure>,
}

impl StatusRecord {
    pub fn is_terminal(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_states_map_exactly() {
        assert_eq!(DeployState::from_api("Pending", false), DeployState::Pending);
        assert_eq!(
            DeployState::from_api("InProgress", false),
            DeployState::InProgress
        );
        assert_eq!(
            DeployState::from_api("Succeeded", true),
            DeployState::Succeeded
        );
        assert_eq!(
            DeployState::from_api("SucceededPartial", true),
            DeployState::SucceededPartial
        );
        assert_eq!(DeployState::from_api("Failed", true), DeployState::Failed);
        assert_eq!(
            DeployState::from_api("Canceled", true),
            DeployState::Canceled
        );
    }

    #[test]
    fn unknown_state_follows_done_flag() {
        assert_eq!(
            DeployState::from_api("SomethingNew", false),
            DeployState::InProgress
        );
        assert_eq!(
            DeployState::from_api("SomethingNew", true),
            DeployState::Failed
        );
    }

    #[test]
    fn partial_success_counts_as_success() {
        assert!(DeployState::SucceededPartial.is_success());
        assert!(!DeployState::Canceled.is_success());
    }

    #[test]
    fn component_failure_defaults_missing_fields_to_empty() {
        let failure: ComponentFailure =
            serde_json::from_str(r#"{"componentType":"ApexClass"}"#).unwrap();
        assert_eq!(failure.component_type, "ApexClass");
        assert_eq!(failure.full_name, "");
        assert_eq!(failure.problem_type, "");
        assert_eq!(failure.problem, "");
    }
}
