// src/hook/registrar.rs

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::{LineageError, Result};
use crate::hook::outcome::{CompletionOutcome, RegistrationOutcome};
use crate::hook::workflow::WorkflowDefinition;
use crate::lineage::{CreateJobRun, JobRun, LineageClient, RunTransition};
use crate::store::{Clock, RunIdentityRecord, RunIdentityStore, RunKey, SystemClock};
use crate::types::RunState;

const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_WRITE_ATTEMPTS: u32 = 2;

/// Reports host run lifecycle events to the lineage service and keeps the
/// host-to-lineage run id mapping.
///
/// Transport failures never escape: they are logged and turned into an
/// outcome. The only error a caller sees is
/// [`LineageError::InvalidSchedule`], because a wrong window would corrupt
/// lineage data.
pub struct LineageHook {
    namespace: String,
    client: Option<Arc<dyn LineageClient>>,
    store: Arc<dyn RunIdentityStore>,
    clock: Arc<dyn Clock>,
    client_timeout: Duration,
    store_timeout: Duration,
    write_attempts: u32,
}

impl fmt::Debug for LineageHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineageHook")
            .field("namespace", &self.namespace)
            .field("client_configured", &self.client.is_some())
            .field("client_timeout", &self.client_timeout)
            .field("store_timeout", &self.store_timeout)
            .field("write_attempts", &self.write_attempts)
            .finish_non_exhaustive()
    }
}

impl LineageHook {
    pub fn new(
        namespace: impl Into<String>,
        client: Option<Arc<dyn LineageClient>>,
        store: Arc<dyn RunIdentityStore>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            client,
            store,
            clock: Arc::new(SystemClock),
            client_timeout: DEFAULT_CLIENT_TIMEOUT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            write_attempts: DEFAULT_WRITE_ATTEMPTS,
        }
    }

    /// Hook using the namespace, timeouts and retry count from `cfg`.
    pub fn from_config(
        cfg: &ConfigFile,
        client: Option<Arc<dyn LineageClient>>,
        store: Arc<dyn RunIdentityStore>,
    ) -> Self {
        Self::new(cfg.lineage.namespace.clone(), client, store)
            .with_timeouts(cfg.lineage.timeout, cfg.store.timeout)
            .with_write_attempts(cfg.store.write_attempts)
    }

    pub fn with_timeouts(mut self, client_timeout: Duration, store_timeout: Duration) -> Self {
        self.client_timeout = client_timeout;
        self.store_timeout = store_timeout;
        self
    }

    /// Number of store writes tried after the lineage service issued a run
    /// id. Clamped to at least one.
    pub fn with_write_attempts(mut self, attempts: u32) -> Self {
        self.write_attempts = attempts.max(1);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn store(&self) -> &Arc<dyn RunIdentityStore> {
        &self.store
    }

    pub fn run_key(&self, workflow_id: &str, run_id: &str) -> RunKey {
        RunKey::new(&self.namespace, workflow_id, run_id)
    }

    /// Handle run creation: compute the window, register job and run, then
    /// remember the lineage run id.
    pub async fn on_run_created<Tz: TimeZone>(
        &self,
        workflow: &WorkflowDefinition,
        run_id: &str,
        nominal_time: &DateTime<Tz>,
        run_args: &serde_json::Value,
    ) -> Result<RegistrationOutcome> {
        // Computed before anything else so a bad schedule is reported even
        // when lineage reporting is disabled.
        let window = workflow.window_for(nominal_time)?;
        let run = CreateJobRun::for_window(run_args, &window);

        let Some(client) = self.client.as_deref() else {
            debug!(workflow = %workflow.id, run_id, "no lineage client; skipping registration");
            return Ok(RegistrationOutcome::Skipped);
        };

        let lineage_run = match self.register(client, workflow, &run).await {
            Ok(lineage_run) => lineage_run,
            Err(err) => {
                warn!(
                    workflow = %workflow.id,
                    run_id,
                    namespace = %self.namespace,
                    error = %err,
                    "lineage registration failed; run continues unreported"
                );
                return Ok(RegistrationOutcome::LineageUnavailable {
                    reason: err.to_string(),
                });
            }
        };

        let key = self.run_key(&workflow.id, run_id);
        let record = RunIdentityRecord::new(lineage_run.run_id, self.clock.now());

        match self.store_mapping(&key, &record).await {
            Ok(()) => {
                info!(
                    workflow = %workflow.id,
                    run_id,
                    lineage_run_id = %record.lineage_run_id,
                    start = ?run.nominal_start_time,
                    end = ?run.nominal_end_time,
                    "registered run"
                );
                Ok(RegistrationOutcome::Registered { record })
            }
            Err(err) => {
                warn!(
                    workflow = %workflow.id,
                    run_id,
                    lineage_run_id = %record.lineage_run_id,
                    attempts = self.write_attempts,
                    error = %err,
                    "could not store run id mapping; lineage run is orphaned"
                );
                Ok(RegistrationOutcome::Orphaned {
                    lineage_run_id: record.lineage_run_id,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Handle a run reaching a terminal state: look up the lineage run,
    /// move it to the matching state and forget the mapping.
    pub async fn on_run_finished(
        &self,
        workflow_id: &str,
        run_id: &str,
        state: RunState,
    ) -> CompletionOutcome {
        let Some(client) = self.client.as_deref() else {
            debug!(workflow = workflow_id, run_id, "no lineage client; skipping completion");
            return CompletionOutcome::Skipped;
        };

        let key = self.run_key(workflow_id, run_id);
        let record = match self.lookup_key(&key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(key = %key, "no lineage run recorded; nothing to report");
                return CompletionOutcome::NotRegistered;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "run id lookup failed");
                return CompletionOutcome::StoreUnavailable {
                    reason: err.to_string(),
                };
            }
        };

        let transition = RunTransition::from(state);
        let marked = bounded(
            self.client_timeout,
            "marking lineage run",
            LineageError::LineageServiceUnavailable,
            client.mark_job_run(&record.lineage_run_id, transition),
        )
        .await;
        if let Err(err) = marked {
            // The mapping is kept; it expires with the retention window.
            warn!(
                key = %key,
                lineage_run_id = %record.lineage_run_id,
                %state,
                error = %err,
                "could not report run completion"
            );
            return CompletionOutcome::LineageUnavailable {
                reason: err.to_string(),
            };
        }

        let deleted = bounded(
            self.store_timeout,
            "deleting run id",
            LineageError::StoreUnavailable,
            self.store.delete(&key),
        )
        .await;
        if let Err(err) = deleted {
            warn!(key = %key, error = %err, "could not delete run id mapping; it will expire");
        }

        info!(
            workflow = workflow_id,
            run_id,
            lineage_run_id = %record.lineage_run_id,
            %state,
            "reported run completion"
        );
        CompletionOutcome::Reported {
            lineage_run_id: record.lineage_run_id,
            transition,
        }
    }

    /// Stored lineage run for a host run, if any.
    pub async fn lookup(&self, workflow_id: &str, run_id: &str) -> Result<Option<RunIdentityRecord>> {
        self.lookup_key(&self.run_key(workflow_id, run_id)).await
    }

    /// Sweep expired mappings from the store.
    pub async fn evict_expired(&self) -> Result<usize> {
        bounded(
            self.store_timeout,
            "evicting expired run ids",
            LineageError::StoreUnavailable,
            self.store.evict_expired(),
        )
        .await
    }

    async fn lookup_key(&self, key: &RunKey) -> Result<Option<RunIdentityRecord>> {
        bounded(
            self.store_timeout,
            "reading run id",
            LineageError::StoreUnavailable,
            self.store.get(key),
        )
        .await
    }

    async fn register(
        &self,
        client: &dyn LineageClient,
        workflow: &WorkflowDefinition,
        run: &CreateJobRun,
    ) -> Result<JobRun> {
        let job = workflow.to_create_job();

        bounded(
            self.client_timeout,
            "creating job",
            LineageError::LineageServiceUnavailable,
            client.create_job(&self.namespace, &job),
        )
        .await?;

        bounded(
            self.client_timeout,
            "creating job run",
            LineageError::LineageServiceUnavailable,
            client.create_job_run(&self.namespace, &job.job_name, run),
        )
        .await
    }

    /// Write the mapping, retrying up to `write_attempts` times.
    async fn store_mapping(&self, key: &RunKey, record: &RunIdentityRecord) -> Result<()> {
        let mut attempt = 1;
        loop {
            let result = bounded(
                self.store_timeout,
                "storing run id",
                LineageError::StoreUnavailable,
                self.store.put(key, record.clone()),
            )
            .await;

            match result {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.write_attempts => {
                    debug!(key = %key, attempt, error = %err, "run id write failed; retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Run `fut` with an upper bound; an elapsed timer becomes `on_timeout`.
async fn bounded<T, F>(
    limit: Duration,
    what: &str,
    on_timeout: fn(String) -> LineageError,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(format!("{what} timed out after {limit:?}"))),
    }
}
