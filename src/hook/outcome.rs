// src/hook/outcome.rs

use crate::lineage::RunTransition;
use crate::store::RunIdentityRecord;

/// What happened when a run creation was reported.
///
/// None of these fail the host run; only an invalid schedule is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The lineage service accepted the run and the mapping was stored.
    Registered { record: RunIdentityRecord },

    /// No lineage client is configured. Nothing was called or stored.
    Skipped,

    /// The lineage service could not be reached or rejected the call.
    /// No mapping was stored.
    LineageUnavailable { reason: String },

    /// The lineage service issued a run id but the mapping could not be
    /// stored, so completion cannot be reported for this run.
    Orphaned {
        lineage_run_id: String,
        reason: String,
    },
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered { .. })
    }

    /// Run id issued by the lineage service, if one was issued at all.
    pub fn lineage_run_id(&self) -> Option<&str> {
        match self {
            RegistrationOutcome::Registered { record } => Some(&record.lineage_run_id),
            RegistrationOutcome::Orphaned { lineage_run_id, .. } => Some(lineage_run_id),
            RegistrationOutcome::Skipped | RegistrationOutcome::LineageUnavailable { .. } => None,
        }
    }
}

/// What happened when a run's terminal state was reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The lineage run was moved to its final state and the mapping removed.
    Reported {
        lineage_run_id: String,
        transition: RunTransition,
    },

    /// No lineage client is configured.
    Skipped,

    /// No (unexpired) mapping exists for the run.
    NotRegistered,

    LineageUnavailable { reason: String },

    StoreUnavailable { reason: String },
}
