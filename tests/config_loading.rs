// tests/config_loading.rs

use std::collections::HashMap;
use std::fs;

use tempfile::tempdir;

use lineagehook::config::{
    load_for_cli, load_from_path, load_with_env, DEFAULT_NAMESPACE, NAMESPACE_ENV, URL_ENV,
};
use lineagehook::errors::LineageError;
use lineagehook::schedule::ScheduleSpec;
use lineagehook::types::StoreBackend;

const FULL_CONFIG: &str = r#"
[lineage]
url = "http://localhost:5000/"
namespace = "analytics"
timeout_ms = 1500

[store]
backend = "file"
path = "state"
retention = "72h"
timeout_ms = 250
write_attempts = 4

[workflow.etl_daily]
schedule = "0 2 * * *"
location = "https://github.com/org/repo/blob/main/dags/etl.py"
inputs = ["urn:dataset:raw"]
outputs = ["urn:dataset:clean"]
description = "Daily ETL"

[workflow.backfill]
schedule = "@once"
"#;

fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    move |name| map.get(name).map(|v| v.to_string())
}

#[test]
fn full_config_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lineagehook.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let cfg = load_with_env(Some(path.as_path()), env(&[])).unwrap();

    assert_eq!(cfg.lineage.url.as_deref(), Some("http://localhost:5000"));
    assert_eq!(cfg.lineage.namespace, "analytics");
    assert_eq!(cfg.lineage.timeout, std::time::Duration::from_millis(1500));

    assert_eq!(cfg.store.backend, StoreBackend::File);
    assert_eq!(cfg.store.path, std::path::PathBuf::from("state"));
    assert_eq!(cfg.store.retention, chrono::Duration::hours(72));
    assert_eq!(cfg.store.write_attempts, 4);

    let etl = cfg.workflow("etl_daily").unwrap();
    assert!(etl.schedule.is_recurring());
    assert_eq!(etl.input_urns, vec!["urn:dataset:raw".to_string()]);
    assert_eq!(etl.description.as_deref(), Some("Daily ETL"));

    assert_eq!(cfg.workflow("backfill").unwrap().schedule, ScheduleSpec::Once);
    assert!(cfg.workflow("missing").is_none());
}

#[test]
fn environment_overrides_file_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lineagehook.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let cfg = load_with_env(
        Some(path.as_path()),
        env(&[(NAMESPACE_ENV, "test_namespace"), (URL_ENV, "https://marquez.internal")]),
    )
    .unwrap();

    assert_eq!(cfg.lineage.namespace, "test_namespace");
    assert_eq!(cfg.lineage.url.as_deref(), Some("https://marquez.internal"));
}

#[test]
fn no_file_and_no_environment_gives_defaults() {
    let cfg = load_with_env(None, env(&[])).unwrap();

    assert_eq!(cfg.lineage.namespace, DEFAULT_NAMESPACE);
    assert_eq!(cfg.lineage.url, None);
    assert_eq!(cfg.store.backend, StoreBackend::Memory);
    assert!(cfg.workflows.is_empty());
}

#[test]
fn missing_default_file_is_fine_but_missing_explicit_file_is_not() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lineagehook.toml");

    assert!(load_for_cli(&path, false).is_ok());
    assert!(matches!(load_for_cli(&path, true), Err(LineageError::IoError(_))));
}

#[test]
fn bad_schedule_fails_at_load_time() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lineagehook.toml");
    fs::write(&path, "[workflow.etl]\nschedule = \"0 25 * * *\"\n").unwrap();

    match load_with_env(Some(path.as_path()), env(&[])) {
        Err(LineageError::InvalidSchedule(msg)) => assert!(msg.contains("etl"), "{msg}"),
        other => panic!("expected InvalidSchedule, got {other:?}"),
    }
}

#[test]
fn bad_environment_namespace_is_rejected() {
    let result = load_with_env(None, env(&[(NAMESPACE_ENV, "not a namespace")]));
    assert!(matches!(result, Err(LineageError::ConfigError(_))));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lineagehook.toml");
    fs::write(&path, "[store\nbackend = ").unwrap();

    assert!(matches!(load_from_path(&path), Err(LineageError::TomlError(_))));
}

#[test]
fn unknown_backend_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Lineagehook.toml");
    fs::write(&path, "[store]\nbackend = \"redis\"\n").unwrap();

    assert!(load_with_env(Some(path.as_path()), env(&[])).is_err());
}
