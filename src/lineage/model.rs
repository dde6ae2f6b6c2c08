// src/lineage/model.rs

//! Request and response shapes exchanged with the lineage service.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::ExecutionWindow;
use crate::types::RunState;

/// Job registration: one per workflow, re-sent on every run (idempotent on
/// the service side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateJob {
    pub job_name: String,
    pub location: Option<String>,
    pub input_urns: Vec<String>,
    pub output_urns: Vec<String>,
    pub description: Option<String>,
}

/// Run registration body.
///
/// Absent timestamps are sent as JSON `null`, never as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRun {
    /// Run arguments as a JSON-encoded string (`"{}"` when there are none).
    pub run_args: String,
    pub nominal_start_time: Option<String>,
    pub nominal_end_time: Option<String>,
}

impl CreateJobRun {
    pub fn for_window<Tz: TimeZone>(run_args: &serde_json::Value, window: &ExecutionWindow<Tz>) -> Self {
        Self {
            run_args: encode_run_args(run_args),
            nominal_start_time: Some(format_timestamp(&window.start)),
            nominal_end_time: window.end.as_ref().map(format_timestamp),
        }
    }
}

/// Job as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub input_dataset_urns: Vec<String>,
    #[serde(default)]
    pub output_dataset_urns: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Run as returned by the service; only `runId` is required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRun {
    pub run_id: String,
    #[serde(default)]
    pub run_state: Option<String>,
    #[serde(default)]
    pub nominal_start_time: Option<String>,
    #[serde(default)]
    pub nominal_end_time: Option<String>,
}

/// State change requested for an existing lineage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTransition {
    Running,
    Completed,
    Failed,
    Aborted,
}

impl RunTransition {
    /// Final path segment of the transition endpoint.
    pub fn path_segment(self) -> &'static str {
        match self {
            RunTransition::Running => "run",
            RunTransition::Completed => "complete",
            RunTransition::Failed => "fail",
            RunTransition::Aborted => "abort",
        }
    }
}

impl From<RunState> for RunTransition {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Success => RunTransition::Completed,
            RunState::Failed => RunTransition::Failed,
            RunState::Aborted => RunTransition::Aborted,
        }
    }
}

/// ISO-8601 in UTC with a `Z` suffix and second precision,
/// e.g. `2019-01-31T00:00:00Z`.
pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    ts.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Run arguments travel as a JSON string; a missing value means `{}`.
pub fn encode_run_args(run_args: &serde_json::Value) -> String {
    if run_args.is_null() {
        "{}".to_string()
    } else {
        run_args.to_string()
    }
}
