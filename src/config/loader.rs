// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::env::{apply_env_overrides, process_env};
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** apply the
/// environment or validate anything. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file, overlay the process environment and validate.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    load_with_env(Some(path.as_ref()), process_env)
}

/// Like [`load_and_validate`], with an explicit environment lookup.
///
/// With `path = None` the config starts from defaults, so a deployment can be
/// configured purely through the environment.
pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<ConfigFile>
where
    F: Fn(&str) -> Option<String>,
{
    let mut raw = match path {
        Some(path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };
    apply_env_overrides(&mut raw, lookup);
    ConfigFile::try_from(raw)
}

/// Resolve the config the CLI should use.
///
/// A missing file is only an error when the user named it explicitly; the
/// default `Lineagehook.toml` is optional.
pub fn load_for_cli(path: &Path, explicit: bool) -> Result<ConfigFile> {
    if !explicit && !path.exists() {
        debug!(path = ?path, "no config file found; using defaults and environment");
        return load_with_env(None, process_env);
    }
    load_and_validate(path)
}

/// Default config path: `Lineagehook.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Lineagehook.toml")
}
