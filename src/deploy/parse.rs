//! Decodes raw platform CLI output into status records.
//!
//! The platform signals deployment-level failure with a non-zero exit code
//! and a differently shaped JSON payload than its success responses. A
//! non-zero exit is therefore not a transport problem: the error-shaped
//! payload is decoded here just like the success-shaped one, and both
//! collapse into a single [`ParsedResponse`] branch for the poller.

use serde::Deserialize;

use crate::deploy::model::{ComponentFailure, DeployState, DeploymentId, StatusRecord};
use crate::error::DeployError;

/// Outcome of decoding one raw status payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// Success-shaped payload. The record itself may still be terminal-failed.
    Success(StatusRecord),
    /// Error-shaped payload carrying component failures.
    Failure(StatusRecord),
    /// Neither shape matched; the raw text is kept for display.
    Unparseable(String),
}

#[derive(Deserialize)]
struct SuccessEnvelope {
    result: SuccessResult,
}

#[derive(Deserialize)]
struct SuccessResult {
    done: bool,
    status: String,
    #[serde(default, rename = "numberComponentsDeployed")]
    number_components_deployed: u64,
    #[serde(default, rename = "numberComponentsTotal")]
    number_components_total: u64,
    #[serde(default, rename = "stateDetail")]
    state_detail: Option<String>,
    #[serde(default, rename = "numberComponentErrors")]
    number_component_errors: u64,
    #[serde(default)]
    details: Option<Details>,
}

#[derive(Deserialize)]
struct FailureEnvelope {
    data: FailureData,
    #[serde(default)]
    result: Option<FailureResult>,
}

#[derive(Deserialize)]
struct FailureData {
    details: Details,
}

#[derive(Deserialize, Default)]
struct FailureResult {
    #[serde(default)]
    done: bool,
    #[serde(default, rename = "numberComponentErrors")]
    number_component_errors: u64,
}

#[derive(Deserialize, Default)]
struct Details {
    #[serde(default, rename = "componentFailures")]
    component_failures: Vec<ComponentFailure>,
}

/// Decodes a status-report payload. Pure: the same input always yields the
/// same record.
pub fn parse_status_response(raw: &str) -> ParsedResponse {
    if let Ok(envelope) = serde_json::from_str::<SuccessEnvelope>(raw) {
        let result = envelope.result;
        let state = DeployState::from_api(&result.status, result.done);
        return ParsedResponse::Success(StatusRecord {
            done: result.done,
            state,
            components_deployed: result.number_components_deployed,
            components_total: result.number_components_total,
            state_detail: result.state_detail.filter(|s| !s.is_empty()),
            error_count: result.number_component_errors,
            component_failures: result
                .details
                .map(|details| details.component_failures)
                .unwrap_or_default(),
        });
    }

    if let Ok(envelope) = serde_json::from_str::<FailureEnvelope>(raw) {
        let result = envelope.result.unwrap_or_default();
        let failures = envelope.data.details.component_failures;
        return ParsedResponse::Failure(StatusRecord {
            done: result.done,
            state: if result.done {
                DeployState::Failed
            } else {
                DeployState::InProgress
            },
            components_deployed: 0,
            components_total: 0,
            state_detail: None,
            error_count: result.number_component_errors,
            component_failures: failures,
        });
    }

    ParsedResponse::Unparseable(raw.to_string())
}

/// Decodes a submit payload, expecting `result.id`.
pub fn parse_submit_response(raw: &str) -> Result<DeploymentId, DeployError> {
    #[derive(Deserialize)]
    struct SubmitEnvelope {
        result: SubmitResult,
    }

    #[derive(Deserialize)]
    struct SubmitResult {
        id: String,
    }

    let envelope: SubmitEnvelope =
        serde_json::from_str(raw).map_err(|_| DeployError::Malformed {
            raw: raw.to_string(),
        })?;

    if envelope.result.id.is_empty() {
        return Err(DeployError::Malformed {
            raw: raw.to_string(),
        });
    }

    Ok(DeploymentId::new(envelope.result.id))
}
