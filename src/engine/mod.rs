// src/engine/mod.rs

//! Event loop that feeds host run lifecycle events into the hook.
//!
//! Events arrive on an mpsc channel, from the stdin reader in [`source`] or
//! from any embedding code holding a sender. The per-event semantics live
//! in [`core`]; [`runtime`] is the async shell around it that also runs the
//! periodic expiry sweep.

use std::fmt;
use std::time::Duration;

pub mod core;
pub mod runtime;
pub mod source;

pub use self::core::{EventDispatcher, Step};
pub use runtime::HookRuntime;
pub use source::{parse_event_line, spawn_line_reader};

/// Options for the async runtime shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// How often expired mappings are swept from the store. `None` disables
    /// the sweep; reads still ignore expired records.
    pub eviction_interval: Option<Duration>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            eviction_interval: Some(Duration::from_secs(15 * 60)),
        }
    }
}

/// Counts of what the runtime did, reported when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeSummary {
    pub registered: usize,
    pub skipped: usize,
    pub lineage_unavailable: usize,
    pub orphaned: usize,
    pub completed: usize,
    pub not_registered: usize,
    pub completion_failures: usize,
    pub unknown_workflows: usize,
    pub invalid_schedules: usize,
    pub evicted: usize,
}

impl fmt::Display for RuntimeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "registered={} skipped={} lineage_unavailable={} orphaned={} completed={} \
             not_registered={} completion_failures={} unknown_workflows={} \
             invalid_schedules={} evicted={}",
            self.registered,
            self.skipped,
            self.lineage_unavailable,
            self.orphaned,
            self.completed,
            self.not_registered,
            self.completion_failures,
            self.unknown_workflows,
            self.invalid_schedules,
            self.evicted,
        )
    }
}
