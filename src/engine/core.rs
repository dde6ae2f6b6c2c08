// src/engine/core.rs

use std::collections::BTreeMap;

use tracing::{debug, error, warn};

use crate::errors::LineageError;
use crate::hook::{CompletionOutcome, HostEvent, LineageHook, RegistrationOutcome, WorkflowDefinition};

use super::RuntimeSummary;

/// Whether the runtime should keep consuming events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

/// Routes one [`HostEvent`] at a time to the hook and tallies the results.
///
/// Holds no channels; the async shell in [`super::runtime`] owns those.
#[derive(Debug)]
pub struct EventDispatcher {
    hook: LineageHook,
    workflows: BTreeMap<String, WorkflowDefinition>,
    summary: RuntimeSummary,
}

impl EventDispatcher {
    pub fn new(hook: LineageHook, workflows: BTreeMap<String, WorkflowDefinition>) -> Self {
        Self {
            hook,
            workflows,
            summary: RuntimeSummary::default(),
        }
    }

    pub fn hook(&self) -> &LineageHook {
        &self.hook
    }

    pub fn summary(&self) -> RuntimeSummary {
        self.summary
    }

    pub async fn dispatch(&mut self, event: HostEvent) -> Step {
        match event {
            HostEvent::RunCreated {
                workflow_id,
                run_id,
                execution_date,
                run_args,
            } => {
                let Some(workflow) = self.workflows.get(&workflow_id) else {
                    let err = LineageError::UnknownWorkflow(workflow_id.clone());
                    warn!(workflow = %workflow_id, run_id = %run_id, error = %err, "ignoring run");
                    self.summary.unknown_workflows += 1;
                    return Step::Continue;
                };

                match self
                    .hook
                    .on_run_created(workflow, &run_id, &execution_date, &run_args)
                    .await
                {
                    Ok(outcome) => self.record_registration(&outcome),
                    Err(err) => {
                        error!(workflow = %workflow_id, run_id = %run_id, error = %err, "run not registered");
                        self.summary.invalid_schedules += 1;
                    }
                }
                Step::Continue
            }

            HostEvent::RunFinished {
                workflow_id,
                run_id,
                state,
            } => {
                let outcome = self.hook.on_run_finished(&workflow_id, &run_id, state).await;
                self.record_completion(&outcome);
                Step::Continue
            }

            HostEvent::Shutdown => {
                debug!("shutdown event received");
                Step::Stop
            }
        }
    }

    /// Run an expiry sweep; failures are logged and otherwise ignored.
    pub async fn sweep(&mut self) {
        match self.hook.evict_expired().await {
            Ok(removed) => self.summary.evicted += removed,
            Err(err) => warn!(error = %err, "expiry sweep failed"),
        }
    }

    fn record_registration(&mut self, outcome: &RegistrationOutcome) {
        match outcome {
            RegistrationOutcome::Registered { .. } => self.summary.registered += 1,
            RegistrationOutcome::Skipped => self.summary.skipped += 1,
            RegistrationOutcome::LineageUnavailable { .. } => self.summary.lineage_unavailable += 1,
            RegistrationOutcome::Orphaned { .. } => self.summary.orphaned += 1,
        }
    }

    fn record_completion(&mut self, outcome: &CompletionOutcome) {
        match outcome {
            CompletionOutcome::Reported { .. } => self.summary.completed += 1,
            CompletionOutcome::Skipped => self.summary.skipped += 1,
            CompletionOutcome::NotRegistered => self.summary.not_registered += 1,
            CompletionOutcome::LineageUnavailable { .. }
            | CompletionOutcome::StoreUnavailable { .. } => self.summary.completion_failures += 1,
        }
    }
}
