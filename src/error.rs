use thiserror::Error;

/// Errors raised while orchestrating a deployment.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The external command could not be spawned at all.
    #[error("failed to run `{command}`: {source}")]
    Exec {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external command did not finish within the configured timeout.
    #[error("`{command}` did not finish within {seconds}s")]
    ExecTimeout { command: String, seconds: u64 },

    /// The platform answered, but the payload matched neither known shape.
    #[error("unrecognized response from the platform CLI:\n{raw}")]
    Malformed { raw: String },

    /// The submit call failed; there is no deployment to poll.
    #[error("deployment submission failed:\n{detail}")]
    Submission { detail: String },

    /// A preparation step (checkout, format conversion) failed.
    #[error("{step} failed:\n{detail}")]
    Prepare { step: String, detail: String },

    #[error("invalid package manifest: {0}")]
    Manifest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Operator interrupt observed at a tick boundary. The remote job keeps
    /// running; only local observation stops.
    #[error("interrupted by operator (the remote deployment continues)")]
    Interrupted,

    /// The optional wall-clock bound on polling was exceeded.
    #[error("gave up waiting for the deployment after {seconds}s (it may still be running)")]
    WaitExpired { seconds: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_error_keeps_raw_diagnostic() {
        let err = DeployError::Submission {
            detail: "ERROR: No org configuration found".to_string(),
        };
        assert!(err.to_string().contains("No org configuration found"));
    }

    #[test]
    fn malformed_error_echoes_raw_payload() {
        let err = DeployError::Malformed {
            raw: "not json at all".to_string(),
        };
        assert!(err.to_string().contains("not json at all"));
    }
}
