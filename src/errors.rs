// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only [`LineageError::InvalidSchedule`] is meant to reach the host: the
//! transport-level variants (`LineageServiceUnavailable`, `StoreUnavailable`)
//! are logged and absorbed by the hook so a run is never blocked by lineage
//! reporting.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LineageError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Lineage service unavailable: {0}")]
    LineageServiceUnavailable(String),

    #[error("Run identity store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown workflow: {0}")]
    UnknownWorkflow(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LineageError {
    /// True for failures that are operational (network, storage) rather than
    /// configuration mistakes.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LineageError::LineageServiceUnavailable(_) | LineageError::StoreUnavailable(_)
        )
    }
}

impl From<reqwest::Error> for LineageError {
    fn from(err: reqwest::Error) -> Self {
        LineageError::LineageServiceUnavailable(err.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LineageError>;
