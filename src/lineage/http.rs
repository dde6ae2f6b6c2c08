// src/lineage/http.rs

use std::time::Duration;

use reqwest::{Method, Response, Url};
use serde::Serialize;
use tracing::debug;

use crate::errors::{LineageError, Result};
use crate::lineage::client::{ClientFuture, LineageClient};
use crate::lineage::model::{CreateJob, CreateJobRun, JobDescriptor, JobRun, RunTransition};

/// `reqwest`-based client for the lineage service's v1 REST API.
///
/// - `PUT  /api/v1/namespaces/{ns}/jobs/{job}`
/// - `POST /api/v1/namespaces/{ns}/jobs/{job}/runs`
/// - `PUT  /api/v1/jobs/runs/{id}/{run|complete|fail|abort}`
#[derive(Debug, Clone)]
pub struct MarquezHttpClient {
    base_url: Url,
    http: reqwest::Client,
}

/// Body of the job upsert.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobBody<'a> {
    location: Option<&'a str>,
    input_dataset_urns: &'a [String],
    output_dataset_urns: &'a [String],
    description: Option<&'a str>,
}

impl MarquezHttpClient {
    /// Build a client for `base_url` whose requests give up after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            LineageError::ConfigError(format!("invalid lineage url '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(LineageError::ConfigError(format!(
                "lineage url '{base_url}' cannot carry a path"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LineageError::ConfigError(format!("building HTTP client: {e}")))?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded `segments` to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response> {
        debug!(%method, %url, "lineage request");

        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body_text = response.text().await.unwrap_or_default();
        Err(LineageError::LineageServiceUnavailable(format!(
            "{method} {url} returned {status}: {body_text}"
        )))
    }
}

impl LineageClient for MarquezHttpClient {
    fn create_job<'a>(&'a self, namespace: &'a str, job: &'a CreateJob)
    -> ClientFuture<'a, JobDescriptor> {
        Box::pin(async move {
            let url = self.endpoint(&["api", "v1", "namespaces", namespace, "jobs", &job.job_name]);
            let body = JobBody {
                location: job.location.as_deref(),
                input_dataset_urns: &job.input_urns,
                output_dataset_urns: &job.output_urns,
                description: job.description.as_deref(),
            };
            let response = self.send(Method::PUT, url, Some(&body)).await?;
            Ok(response.json::<JobDescriptor>().await?)
        })
    }

    fn create_job_run<'a>(
        &'a self,
        namespace: &'a str,
        job_name: &'a str,
        run: &'a CreateJobRun,
    ) -> ClientFuture<'a, JobRun> {
        Box::pin(async move {
            let url = self.endpoint(&["api", "v1", "namespaces", namespace, "jobs", job_name, "runs"]);
            let response = self.send(Method::POST, url, Some(run)).await?;
            Ok(response.json::<JobRun>().await?)
        })
    }

    fn mark_job_run<'a>(&'a self, run_id: &'a str, transition: RunTransition)
    -> ClientFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["api", "v1", "jobs", "runs", run_id, transition.path_segment()]);
            self.send::<()>(Method::PUT, url, None).await?;
            Ok(())
        })
    }
}
