// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod hook;
pub mod lineage;
pub mod logging;
pub mod schedule;
pub mod store;
pub mod types;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, TimeZone};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{load_for_cli, ConfigFile};
use crate::engine::{spawn_line_reader, EventDispatcher, HookRuntime, RuntimeOptions};
use crate::hook::{HostEvent, LineageHook};
use crate::lineage::{build_client, format_timestamp};
use crate::schedule::ScheduleSpec;
use crate::store::build_store;
use crate::types::{parse_duration, StoreBackend};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    match &args.command {
        Command::Window {
            schedule,
            at,
            timezone,
        } => print_window(schedule, at, timezone.as_deref()),
        Command::Check => {
            let cfg = load_config(&args)?;
            print_summary(&cfg);
            Ok(())
        }
        Command::Lookup { workflow, run } => {
            let cfg = load_config(&args)?;
            lookup(&cfg, workflow, run).await
        }
        Command::Listen { sweep_interval } => {
            let cfg = load_config(&args)?;
            let interval = parse_duration(sweep_interval)
                .map_err(|e| anyhow::anyhow!("--sweep-interval: {e}"))?;
            listen(cfg, interval).await
        }
    }
}

fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let (path, explicit) = args.config_path();
    load_for_cli(&path, explicit).with_context(|| format!("loading config {}", path.display()))
}

/// Wire client, store, hook and runtime, then consume stdin until EOF or
/// Ctrl-C.
async fn listen(cfg: ConfigFile, sweep_interval: Duration) -> Result<()> {
    let client = build_client(&cfg.lineage)?;
    let store = build_store(&cfg.store);
    let hook = LineageHook::from_config(&cfg, client, store);
    let dispatcher = EventDispatcher::new(hook, cfg.workflows.clone());

    let (tx, rx) = mpsc::channel::<HostEvent>(64);

    let _reader = spawn_line_reader(tokio::io::stdin(), tx.clone());

    // Ctrl-C → graceful shutdown.
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(HostEvent::Shutdown).await;
        });
    }
    drop(tx);

    let options = RuntimeOptions {
        eviction_interval: (!sweep_interval.is_zero()).then_some(sweep_interval),
    };
    let summary = HookRuntime::new(dispatcher, rx, options).run().await;
    debug!(%summary, "listen finished");
    Ok(())
}

async fn lookup(cfg: &ConfigFile, workflow: &str, run: &str) -> Result<()> {
    if cfg.store.backend == StoreBackend::Memory {
        warn!("store backend is 'memory'; lookups from a separate process always come back empty");
    }

    let hook = LineageHook::from_config(cfg, None, build_store(&cfg.store));
    match hook.lookup(workflow, run).await? {
        Some(record) => {
            println!("{}", record.lineage_run_id);
            Ok(())
        }
        None => bail!(
            "no lineage run recorded for workflow '{workflow}' run '{run}' in namespace '{}'",
            hook.namespace()
        ),
    }
}

fn print_window(expr: &str, at: &str, timezone: Option<&str>) -> Result<()> {
    let spec = ScheduleSpec::parse(expr)?;
    let at = DateTime::parse_from_rfc3339(at).with_context(|| format!("parsing --at '{at}'"))?;

    println!("schedule: {spec}");
    match timezone {
        Some(zone) => {
            let zone: chrono_tz::Tz = zone
                .parse()
                .map_err(|e| anyhow::anyhow!("unknown timezone '{zone}': {e}"))?;
            println!("timezone: {zone}");
            show_window(&schedule::compute(&spec, &at.with_timezone(&zone))?);
        }
        None => show_window(&schedule::compute(&spec, &at)?),
    }
    Ok(())
}

fn show_window<Tz: TimeZone>(window: &schedule::ExecutionWindow<Tz>)
where
    Tz::Offset: std::fmt::Display,
{
    let show = |ts: &DateTime<Tz>| {
        format!("{} ({})", ts.to_rfc3339_opts(SecondsFormat::Secs, true), format_timestamp(ts))
    };

    println!("start:    {}", show(&window.start));
    match &window.end {
        Some(end) => println!("end:      {}", show(end)),
        None => println!("end:      none (schedule has no next occurrence)"),
    }
}

/// Print what the hook would report, without contacting anything.
fn print_summary(cfg: &ConfigFile) {
    println!("lineagehook check");
    println!(
        "  lineage.url = {}",
        cfg.lineage.url.as_deref().unwrap_or("(none: reporting disabled)")
    );
    println!("  lineage.namespace = {}", cfg.lineage.namespace);
    println!("  lineage.timeout = {:?}", cfg.lineage.timeout);
    println!("  store.backend = {:?}", cfg.store.backend);
    if cfg.store.backend == StoreBackend::File {
        println!("  store.path = {}", cfg.store.path.display());
    }
    println!("  store.retention = {}s", cfg.store.retention.num_seconds());
    println!("  store.timeout = {:?}", cfg.store.timeout);
    println!("  store.write_attempts = {}", cfg.store.write_attempts);
    println!();

    println!("workflows ({}):", cfg.workflows.len());
    for (id, workflow) in cfg.workflows.iter() {
        println!("  - {id}");
        println!("      schedule: {}", workflow.schedule);
        if let Some(ref location) = workflow.location {
            println!("      location: {location}");
        }
        if !workflow.input_urns.is_empty() {
            println!("      inputs: {:?}", workflow.input_urns);
        }
        if !workflow.output_urns.is_empty() {
            println!("      outputs: {:?}", workflow.output_urns);
        }
        if let Some(ref description) = workflow.description {
            println!("      description: {description}");
        }
    }

    debug!("check complete (nothing contacted)");
}
