// src/config/env.rs

//! Environment overlay applied on top of the config file.
//!
//! Lookups go through a caller-supplied function so tests can pass a plain
//! map instead of mutating the process environment.

use crate::config::model::RawConfigFile;

/// Namespace used when neither the environment nor the config names one.
pub const DEFAULT_NAMESPACE: &str = "default";

pub const NAMESPACE_ENV: &str = "MARQUEZ_NAMESPACE";
pub const URL_ENV: &str = "MARQUEZ_URL";

/// Overwrite config values with any non-empty environment values.
pub fn apply_env_overrides<F>(raw: &mut RawConfigFile, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(namespace) = get(NAMESPACE_ENV) {
        raw.lineage.namespace = Some(namespace.trim().to_string());
    }
    if let Some(url) = get(URL_ENV) {
        raw.lineage.url = Some(url.trim().to_string());
    }
}

/// Lookup function backed by the real process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn environment_wins_over_file() {
        let mut raw = RawConfigFile::default();
        raw.lineage.namespace = Some("from_file".into());

        apply_env_overrides(&mut raw, lookup(&[(NAMESPACE_ENV, "test_namespace")]));
        assert_eq!(raw.lineage.namespace.as_deref(), Some("test_namespace"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let mut raw = RawConfigFile::default();
        raw.lineage.namespace = Some("from_file".into());

        apply_env_overrides(&mut raw, lookup(&[(NAMESPACE_ENV, "  "), (URL_ENV, "")]));
        assert_eq!(raw.lineage.namespace.as_deref(), Some("from_file"));
        assert_eq!(raw.lineage.url, None);
    }

    #[test]
    fn url_comes_from_environment() {
        let mut raw = RawConfigFile::default();
        apply_env_overrides(&mut raw, lookup(&[(URL_ENV, "http://marquez:5000")]));
        assert_eq!(raw.lineage.url.as_deref(), Some("http://marquez:5000"));
    }
}
