use std::sync::Mutex;

use lineagehook::errors::LineageError;
use lineagehook::lineage::{
    ClientFuture, CreateJob, CreateJobRun, JobDescriptor, JobRun, LineageClient, RunTransition,
};
use tracing::debug;
use uuid::Uuid;

/// One call received by [`FakeLineageClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    CreateJob {
        namespace: String,
        job: CreateJob,
    },
    CreateJobRun {
        namespace: String,
        job_name: String,
        run: CreateJobRun,
    },
    MarkJobRun {
        run_id: String,
        transition: RunTransition,
    },
}

/// How the fake answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FakeMode {
    #[default]
    Healthy,
    /// Every call fails with `LineageServiceUnavailable`.
    Failing,
    /// Every call never completes.
    Hanging,
}

/// A lineage client that:
/// - records every call (also the ones it fails)
/// - issues a fixed run id, or a fresh uuid per run.
#[derive(Debug, Default)]
pub struct FakeLineageClient {
    calls: Mutex<Vec<RecordedCall>>,
    mode: Mutex<FakeMode>,
    run_id: Option<String>,
}

impl FakeLineageClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run_id(run_id: &str) -> Self {
        Self {
            run_id: Some(run_id.to_string()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let client = Self::default();
        client.set_mode(FakeMode::Failing);
        client
    }

    pub fn hanging() -> Self {
        let client = Self::default();
        client.set_mode(FakeMode::Hanging);
        client
    }

    pub fn set_mode(&self, mode: FakeMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn job_calls(&self) -> Vec<(String, CreateJob)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::CreateJob { namespace, job } => Some((namespace, job)),
                _ => None,
            })
            .collect()
    }

    pub fn run_calls(&self) -> Vec<(String, String, CreateJobRun)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::CreateJobRun {
                    namespace,
                    job_name,
                    run,
                } => Some((namespace, job_name, run)),
                _ => None,
            })
            .collect()
    }

    pub fn mark_calls(&self) -> Vec<(String, RunTransition)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::MarkJobRun { run_id, transition } => Some((run_id, transition)),
                _ => None,
            })
            .collect()
    }

    /// Record `call`, then apply the current mode.
    async fn answer(&self, call: RecordedCall) -> Result<(), LineageError> {
        debug!(?call, "fake lineage client called");
        self.calls.lock().unwrap().push(call);

        let mode = *self.mode.lock().unwrap();
        match mode {
            FakeMode::Healthy => Ok(()),
            FakeMode::Failing => Err(LineageError::LineageServiceUnavailable(
                "fake lineage client configured to fail".to_string(),
            )),
            FakeMode::Hanging => std::future::pending().await,
        }
    }
}

impl LineageClient for FakeLineageClient {
    fn create_job<'a>(&'a self, namespace: &'a str, job: &'a CreateJob)
    -> ClientFuture<'a, JobDescriptor> {
        Box::pin(async move {
            self.answer(RecordedCall::CreateJob {
                namespace: namespace.to_string(),
                job: job.clone(),
            })
            .await?;

            Ok(JobDescriptor {
                name: job.job_name.clone(),
                location: job.location.clone(),
                input_dataset_urns: job.input_urns.clone(),
                output_dataset_urns: job.output_urns.clone(),
                description: job.description.clone(),
            })
        })
    }

    fn create_job_run<'a>(
        &'a self,
        namespace: &'a str,
        job_name: &'a str,
        run: &'a CreateJobRun,
    ) -> ClientFuture<'a, JobRun> {
        Box::pin(async move {
            self.answer(RecordedCall::CreateJobRun {
                namespace: namespace.to_string(),
                job_name: job_name.to_string(),
                run: run.clone(),
            })
            .await?;

            let run_id = self
                .run_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            Ok(JobRun {
                run_id,
                run_state: Some("NEW".to_string()),
                nominal_start_time: run.nominal_start_time.clone(),
                nominal_end_time: run.nominal_end_time.clone(),
            })
        })
    }

    fn mark_job_run<'a>(&'a self, run_id: &'a str, transition: RunTransition)
    -> ClientFuture<'a, ()> {
        Box::pin(async move {
            self.answer(RecordedCall::MarkJobRun {
                run_id: run_id.to_string(),
                transition,
            })
            .await
        })
    }
}
