//! Deployment orchestration: submit, poll, report.

pub mod model;
pub mod orchestrate;
pub mod parse;
pub mod poll;
pub mod report;
pub mod submit;

pub use model::{ComponentFailure, DeployRequest, DeployState, DeploymentId, StatusRecord};
pub use orchestrate::{Orchestrator, Outcome};
pub use report::ProgressReporter;
