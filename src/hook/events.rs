// src/hook/events.rs

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::types::RunState;

/// Run lifecycle notifications coming from the host orchestrator.
///
/// On the wire these are JSON objects tagged by `event`:
///
/// ```json
/// {"event":"run_created","workflow_id":"etl","run_id":"scheduled__2019-01-31","execution_date":"2019-01-31T00:00:00Z"}
/// {"event":"run_finished","workflow_id":"etl","run_id":"scheduled__2019-01-31","state":"success"}
/// {"event":"shutdown"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// The host created a run; register it with the lineage service.
    RunCreated {
        workflow_id: String,
        run_id: String,
        /// Nominal time of the run, with the offset the host used.
        execution_date: DateTime<FixedOffset>,
        #[serde(default)]
        run_args: serde_json::Value,
    },

    /// A run reached a terminal state.
    RunFinished {
        workflow_id: String,
        run_id: String,
        state: RunState,
    },

    /// Stop consuming events.
    Shutdown,
}
