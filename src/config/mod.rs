// src/config/mod.rs

//! Configuration loading and validation for lineagehook.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Overlay `MARQUEZ_*` environment values (`env.rs`).
//! - Validate and turn raw sections into typed settings (`validate.rs`).

pub mod env;
pub mod loader;
pub mod model;
pub mod validate;

pub use env::{DEFAULT_NAMESPACE, NAMESPACE_ENV, URL_ENV};
pub use loader::{default_config_path, load_and_validate, load_for_cli, load_from_path, load_with_env};
pub use model::{
    ConfigFile, LineageSection, LineageSettings, RawConfigFile, StoreSection, StoreSettings,
    WorkflowConfig,
};
pub use validate::{validate_config, validate_namespace};
