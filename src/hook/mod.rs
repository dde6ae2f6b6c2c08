// src/hook/mod.rs

//! Run lifecycle adapter.
//!
//! The embedding system calls [`LineageHook::on_run_created`] and
//! [`LineageHook::on_run_finished`] at the matching points of a run's life
//! (directly, or through [`crate::engine::HookRuntime`] with [`HostEvent`]s).

pub mod events;
pub mod outcome;
pub mod registrar;
pub mod workflow;

pub use events::HostEvent;
pub use outcome::{CompletionOutcome, RegistrationOutcome};
pub use registrar::LineageHook;
pub use workflow::WorkflowDefinition;
