// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `lineagehook`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lineagehook",
    version,
    about = "Report workflow runs to a lineage-tracking service.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Lineagehook.toml` in the current working directory. The
    /// default file may be missing; an explicitly named one may not.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LINEAGEHOOK_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// Config path to load, and whether the user named it.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (default_config_path(), false),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Parse + validate the config and print what would be reported.
    Check,

    /// Print the execution window of a run.
    Window {
        /// Schedule expression: cron, preset, interval or `@once`.
        #[arg(long)]
        schedule: String,

        /// Nominal time of the run (RFC 3339, e.g. `2019-01-31T00:00:00Z`).
        #[arg(long, value_name = "TIMESTAMP")]
        at: String,

        /// IANA zone to evaluate the schedule in (e.g. `Europe/Berlin`).
        #[arg(long, value_name = "ZONE")]
        timezone: Option<String>,
    },

    /// Print the lineage run id stored for a host run.
    Lookup {
        #[arg(long, value_name = "ID")]
        workflow: String,

        #[arg(long, value_name = "ID")]
        run: String,
    },

    /// Consume JSON-lines run events from stdin until EOF or Ctrl-C.
    Listen {
        /// How often to sweep expired mappings (`0s` disables the sweep).
        #[arg(long, value_name = "DURATION", default_value = "15m")]
        sweep_interval: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
