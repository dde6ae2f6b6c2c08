// src/schedule/mod.rs

//! Schedule parsing and execution-window computation.
//!
//! - [`spec`] parses a workflow's declared schedule into a [`ScheduleSpec`].
//! - [`cron_expr`] rewrites Unix cron syntax and presets for the `cron` crate.
//! - [`window`] turns a schedule plus a run's nominal time into the
//!   [`ExecutionWindow`] that gets reported to the lineage service.
//!
//! Everything here is pure: the same inputs always give the same window, so
//! re-registering a run that was already seen reports identical timestamps.

mod cron_expr;
pub mod spec;
pub mod window;

pub use spec::{CronSchedule, ScheduleSpec};
pub use window::{compute, ExecutionWindow};
