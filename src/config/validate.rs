// src/config/validate.rs

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::config::env::DEFAULT_NAMESPACE;
use crate::config::model::{
    ConfigFile, LineageSection, LineageSettings, RawConfigFile, StoreSection, StoreSettings,
};
use crate::errors::{LineageError, Result};
use crate::hook::WorkflowDefinition;
use crate::schedule::ScheduleSpec;
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = LineageError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let lineage = validate_lineage(&raw.lineage)?;
        let store = validate_store(&raw.store)?;
        let workflows = validate_workflows(raw.workflow)?;
        Ok(ConfigFile {
            lineage,
            store,
            workflows,
        })
    }
}

/// Run validation only, discarding the result.
pub fn validate_config(raw: &RawConfigFile) -> Result<()> {
    ConfigFile::try_from(raw.clone()).map(|_| ())
}

fn namespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.\-]{1,1024}$").expect("namespace pattern is a valid regex")
    })
}

/// Check a namespace against the characters the lineage service accepts in
/// URL paths.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace_pattern().is_match(namespace) {
        Ok(())
    } else {
        Err(LineageError::ConfigError(format!(
            "invalid namespace '{namespace}': expected 1-1024 characters from [A-Za-z0-9_.-]"
        )))
    }
}

fn validate_lineage(section: &LineageSection) -> Result<LineageSettings> {
    let namespace = section
        .namespace
        .clone()
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    validate_namespace(&namespace)?;

    let url = match section.url.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Some(url.trim_end_matches('/').to_string())
        }
        Some(url) => {
            return Err(LineageError::ConfigError(format!(
                "[lineage].url must start with http:// or https:// (got '{url}')"
            )));
        }
    };

    Ok(LineageSettings {
        url,
        namespace,
        timeout: positive_millis("[lineage].timeout_ms", section.timeout_ms)?,
    })
}

fn validate_store(section: &StoreSection) -> Result<StoreSettings> {
    let retention = parse_duration(&section.retention)
        .map_err(|e| LineageError::ConfigError(format!("[store].retention: {e}")))?;
    if retention.is_zero() {
        return Err(LineageError::ConfigError(
            "[store].retention must be greater than zero".to_string(),
        ));
    }
    let retention = chrono::Duration::from_std(retention)
        .map_err(|e| LineageError::ConfigError(format!("[store].retention: {e}")))?;

    if section.write_attempts == 0 {
        return Err(LineageError::ConfigError(
            "[store].write_attempts must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(StoreSettings {
        backend: section.backend,
        path: section.path.clone(),
        retention,
        timeout: positive_millis("[store].timeout_ms", section.timeout_ms)?,
        write_attempts: section.write_attempts,
    })
}

fn validate_workflows(
    raw: BTreeMap<String, crate::config::model::WorkflowConfig>,
) -> Result<BTreeMap<String, WorkflowDefinition>> {
    let mut workflows = BTreeMap::new();

    for (id, cfg) in raw {
        if id.trim().is_empty() {
            return Err(LineageError::ConfigError(
                "workflow ids must not be empty".to_string(),
            ));
        }

        // Schedules are parsed here so a bad expression fails at startup
        // instead of on the first run.
        let schedule = ScheduleSpec::parse(&cfg.schedule).map_err(|e| match e {
            LineageError::InvalidSchedule(msg) => {
                LineageError::InvalidSchedule(format!("workflow '{id}': {msg}"))
            }
            other => other,
        })?;

        let timezone = cfg
            .timezone
            .as_deref()
            .map(|zone| {
                zone.trim().parse::<chrono_tz::Tz>().map_err(|e| {
                    LineageError::ConfigError(format!(
                        "workflow '{id}': unknown timezone '{zone}': {e}"
                    ))
                })
            })
            .transpose()?;

        let definition = WorkflowDefinition {
            id: id.clone(),
            schedule,
            timezone,
            location: cfg.location,
            input_urns: cfg.inputs,
            output_urns: cfg.outputs,
            description: cfg.description,
        };
        workflows.insert(id, definition);
    }

    Ok(workflows)
}

fn positive_millis(field: &str, millis: u64) -> Result<Duration> {
    if millis == 0 {
        return Err(LineageError::ConfigError(format!(
            "{field} must be >= 1 (got 0)"
        )));
    }
    Ok(Duration::from_millis(millis))
}
