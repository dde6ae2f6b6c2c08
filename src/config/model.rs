// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::hook::WorkflowDefinition;
use crate::types::StoreBackend;

/// Configuration as read from `Lineagehook.toml`, before validation.
///
/// ```toml
/// [lineage]
/// url = "http://localhost:5000"
/// namespace = "analytics"
///
/// [store]
/// backend = "file"
/// retention = "48h"
///
/// [workflow.etl_daily]
/// schedule = "0 2 * * *"
/// timezone = "Europe/Berlin"
/// inputs = ["urn:dataset:raw"]
/// outputs = ["urn:dataset:clean"]
/// ```
///
/// All sections are optional and have defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub lineage: LineageSection,

    #[serde(default)]
    pub store: StoreSection,

    /// Workflows from `[workflow.<id>]`, keyed by workflow id.
    #[serde(default)]
    pub workflow: BTreeMap<String, WorkflowConfig>,
}

/// `[lineage]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LineageSection {
    /// Base URL of the lineage service. When absent no client is built and
    /// runs are not reported.
    #[serde(default)]
    pub url: Option<String>,

    /// Namespace jobs and runs are registered under. `MARQUEZ_NAMESPACE`
    /// takes precedence; falls back to `DEFAULT_NAMESPACE`.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Upper bound for a single lineage-service call.
    #[serde(default = "default_lineage_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_lineage_timeout_ms() -> u64 {
    5_000
}

impl Default for LineageSection {
    fn default() -> Self {
        Self {
            url: None,
            namespace: None,
            timeout_ms: default_lineage_timeout_ms(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Root directory for the file backend.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// How long a mapping is kept, e.g. `"48h"`. Should exceed the longest
    /// run the host can produce.
    #[serde(default = "default_retention")]
    pub retention: String,

    /// Upper bound for a single store operation.
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,

    /// How many times a mapping write is attempted after the lineage service
    /// has issued a run id.
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_retention() -> String {
    "48h".to_string()
}

fn default_store_timeout_ms() -> u64 {
    2_000
}

fn default_write_attempts() -> u32 {
    2
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
            retention: default_retention(),
            timeout_ms: default_store_timeout_ms(),
            write_attempts: default_write_attempts(),
        }
    }
}

/// `[workflow.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Cron expression, preset, interval or `@once`. Defaults to one day,
    /// like an orchestrator DAG without an explicit schedule.
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Where the workflow's code lives (reported as the job location).
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub inputs: Vec<String>,

    #[serde(default)]
    pub outputs: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// IANA zone the schedule is evaluated in (`"Europe/Berlin"`). Without
    /// it, a run's window uses the UTC offset its nominal time arrives with.
    #[serde(default)]
    pub timezone: Option<String>,
}

fn default_schedule() -> String {
    "1d".to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            schedule: default_schedule(),
            location: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            description: None,
            timezone: None,
        }
    }
}

/// Validated configuration, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub lineage: LineageSettings,
    pub store: StoreSettings,
    pub workflows: BTreeMap<String, WorkflowDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineageSettings {
    /// Base URL without a trailing slash.
    pub url: Option<String>,
    pub namespace: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub path: PathBuf,
    pub retention: chrono::Duration,
    pub timeout: Duration,
    pub write_attempts: u32,
}

impl ConfigFile {
    pub fn workflow(&self, id: &str) -> Option<&WorkflowDefinition> {
        self.workflows.get(id)
    }
}
