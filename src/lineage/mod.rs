// src/lineage/mod.rs

//! Lineage-service boundary.
//!
//! - [`model`] holds the request/response shapes and timestamp formatting.
//! - [`client`] is the trait the hook depends on.
//! - [`http`] implements it against the service's REST API.

use std::sync::Arc;

use tracing::info;

use crate::config::LineageSettings;
use crate::errors::Result;

pub mod client;
pub mod http;
pub mod model;

pub use client::{ClientFuture, LineageClient};
pub use http::MarquezHttpClient;
pub use model::{
    encode_run_args, format_timestamp, CreateJob, CreateJobRun, JobDescriptor, JobRun,
    RunTransition,
};

/// Build the client described by `[lineage]`.
///
/// Returns `Ok(None)` when no URL is configured: the hook then skips lineage
/// reporting entirely and writes no mappings.
pub fn build_client(settings: &LineageSettings) -> Result<Option<Arc<dyn LineageClient>>> {
    let Some(url) = settings.url.as_deref() else {
        info!("no lineage url configured; run reporting disabled");
        return Ok(None);
    };

    let client = MarquezHttpClient::new(url, settings.timeout)?;
    info!(url = %client.base_url(), namespace = %settings.namespace, "lineage client ready");
    Ok(Some(Arc::new(client)))
}
