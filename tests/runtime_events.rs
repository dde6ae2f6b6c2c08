// tests/runtime_events.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, WorkflowConfigBuilder};
use crate::common::{init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use tokio::sync::mpsc;

use lineagehook::config::ConfigFile;
use lineagehook::engine::{
    spawn_line_reader, EventDispatcher, HookRuntime, RuntimeOptions, RuntimeSummary,
};
use lineagehook::hook::{HostEvent, LineageHook};
use lineagehook::lineage::RunTransition;
use lineagehook::store::{MemoryRunIdentityStore, RunIdentityRecord, RunIdentityStore, RunKey};
use lineagehook::types::RunState;
use lineagehook_test_utils::{FakeLineageClient, ManualClock};

fn config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_url("http://localhost:5000")
        .with_workflow("etl", WorkflowConfigBuilder::new("*/10 * * * *").build())
        .with_workflow("backfill", WorkflowConfigBuilder::new("@once").build())
        .build()
}

fn created(workflow: &str, run: &str) -> HostEvent {
    HostEvent::RunCreated {
        workflow_id: workflow.to_string(),
        run_id: run.to_string(),
        execution_date: DateTime::parse_from_rfc3339("2019-01-31T00:00:00Z").unwrap(),
        run_args: serde_json::Value::Null,
    }
}

fn finished(workflow: &str, run: &str, state: RunState) -> HostEvent {
    HostEvent::RunFinished {
        workflow_id: workflow.to_string(),
        run_id: run.to_string(),
        state,
    }
}

fn no_sweep() -> RuntimeOptions {
    RuntimeOptions {
        eviction_interval: None,
    }
}

#[tokio::test]
async fn runtime_registers_and_completes_runs() {
    init_tracing();

    let cfg = config();
    let client = Arc::new(FakeLineageClient::new());
    let store = Arc::new(MemoryRunIdentityStore::new(cfg.store.retention));
    let hook = LineageHook::from_config(&cfg, Some(client.clone()), store.clone());
    let dispatcher = EventDispatcher::new(hook, cfg.workflows.clone());

    let (tx, rx) = mpsc::channel(16);
    let runtime = tokio::spawn(HookRuntime::new(dispatcher, rx, no_sweep()).run());

    tx.send(created("etl", "run_1")).await.unwrap();
    tx.send(created("backfill", "run_2")).await.unwrap();
    tx.send(created("unknown", "run_3")).await.unwrap();
    tx.send(finished("etl", "run_1", RunState::Success)).await.unwrap();
    tx.send(finished("etl", "never_created", RunState::Success)).await.unwrap();
    tx.send(HostEvent::Shutdown).await.unwrap();

    let summary = with_timeout(runtime).await.unwrap();
    assert_eq!(
        summary,
        RuntimeSummary {
            registered: 2,
            completed: 1,
            not_registered: 1,
            unknown_workflows: 1,
            ..RuntimeSummary::default()
        }
    );

    assert_eq!(client.run_calls().len(), 2);
    let marks = client.mark_calls();
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].1, RunTransition::Completed);

    // run_1 was forgotten on completion; run_2 is still open.
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test]
async fn runtime_stops_when_senders_are_gone() {
    init_tracing();

    let cfg = config();
    let hook = LineageHook::from_config(
        &cfg,
        None,
        Arc::new(MemoryRunIdentityStore::new(cfg.store.retention)),
    );
    let (tx, rx) = mpsc::channel(4);
    tx.send(created("etl", "run_1")).await.unwrap();
    drop(tx);

    let summary = with_timeout(
        HookRuntime::new(EventDispatcher::new(hook, cfg.workflows.clone()), rx, no_sweep()).run(),
    )
    .await;
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn periodic_sweep_evicts_expired_mappings() {
    init_tracing();

    let cfg = config();
    let clock = ManualClock::at(chrono::Utc::now());
    let store = Arc::new(MemoryRunIdentityStore::with_clock(
        chrono::Duration::hours(1),
        clock.clone(),
    ));
    let stale = RunKey::new(cfg.lineage.namespace.clone(), "etl", "stale");
    store
        .put(&stale, RunIdentityRecord::new("abc", chrono::Utc::now() - chrono::Duration::hours(2)))
        .await
        .unwrap();

    let hook = LineageHook::from_config(&cfg, None, store.clone());
    let (tx, rx) = mpsc::channel(4);
    let options = RuntimeOptions {
        eviction_interval: Some(Duration::from_millis(20)),
    };
    let runtime = tokio::spawn(
        HookRuntime::new(EventDispatcher::new(hook, cfg.workflows.clone()), rx, options).run(),
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(HostEvent::Shutdown).await.unwrap();

    let summary = with_timeout(runtime).await.unwrap();
    assert_eq!(summary.evicted, 1);
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn json_lines_drive_the_runtime() {
    init_tracing();

    let cfg = config();
    let client = Arc::new(FakeLineageClient::with_run_id("71d29487-0b54-4ae1-9295"));
    let store = Arc::new(MemoryRunIdentityStore::new(cfg.store.retention));
    let hook = LineageHook::from_config(&cfg, Some(client.clone()), store.clone());

    let input: &'static [u8] = br#"{"event":"run_created","workflow_id":"etl","run_id":"r1","execution_date":"2019-01-31T00:00:00Z","run_args":{"full_refresh":true}}
this line is not an event
{"event":"run_finished","workflow_id":"etl","run_id":"r1","state":"aborted"}
"#;

    let (tx, rx) = mpsc::channel(16);
    let reader = spawn_line_reader(input, tx);
    let summary = with_timeout(
        HookRuntime::new(EventDispatcher::new(hook, cfg.workflows.clone()), rx, no_sweep()).run(),
    )
    .await;
    reader.await.unwrap();

    assert_eq!(summary.registered, 1);
    assert_eq!(summary.completed, 1);

    let (_, _, run) = client.run_calls().pop().unwrap();
    assert_eq!(run.run_args, r#"{"full_refresh":true}"#);
    assert_eq!(run.nominal_end_time.as_deref(), Some("2019-01-31T00:10:00Z"));
    assert_eq!(
        client.mark_calls(),
        vec![("71d29487-0b54-4ae1-9295".to_string(), RunTransition::Aborted)]
    );
    assert!(store.is_empty().unwrap());
}
