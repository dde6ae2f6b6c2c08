// src/lineage/client.rs

//! Boundary to the lineage-tracking service.
//!
//! The hook only talks to a [`LineageClient`]; production uses the HTTP
//! implementation in [`super::http`], tests plug in a fake that records calls
//! without any network.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::lineage::model::{CreateJob, CreateJobRun, JobDescriptor, JobRun, RunTransition};

/// Boxed future returned by client calls.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Calls the hook makes against the lineage service.
///
/// Every failure (transport, non-success status, undecodable body) is
/// reported as `LineageError::LineageServiceUnavailable`.
pub trait LineageClient: Send + Sync {
    /// Create or update the job for a workflow.
    fn create_job<'a>(&'a self, namespace: &'a str, job: &'a CreateJob)
    -> ClientFuture<'a, JobDescriptor>;

    /// Register a run of `job_name` and return the service's run id.
    fn create_job_run<'a>(
        &'a self,
        namespace: &'a str,
        job_name: &'a str,
        run: &'a CreateJobRun,
    ) -> ClientFuture<'a, JobRun>;

    /// Move an existing run to another state.
    fn mark_job_run<'a>(&'a self, run_id: &'a str, transition: RunTransition)
    -> ClientFuture<'a, ()>;
}
