// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::parse_duration;

/// Command-line arguments for `run-monitor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "run-monitor",
    version,
    about = "Dispatch demultiplexing and analysis for finished sequencing runs, once per run.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `RUN_MONITOR_CONFIG`, else `RunMonitor.toml` in the current
    /// working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only sweep this stage (repeatable).
    #[arg(long = "stage", value_name = "NAME")]
    pub stages: Vec<String>,

    /// Repeat the sweep every DURATION (e.g. `15m`) until Ctrl-C.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Discover and validate only; print the predicate breakdown per run.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 2 if any run ended in failure.
    #[arg(long)]
    pub fail_on_error: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUN_MONITOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_stages_and_interval() {
        let args = CliArgs::try_parse_from([
            "run-monitor",
            "--stage",
            "NGS580_demultiplexing",
            "--stage",
            "NGS580_analysis",
            "--interval",
            "15m",
            "--fail-on-error",
        ])
        .unwrap();

        assert_eq!(args.stages, vec!["NGS580_demultiplexing", "NGS580_analysis"]);
        assert_eq!(args.interval, Some(Duration::from_secs(900)));
        assert!(args.fail_on_error);
        assert!(!args.dry_run);
        assert!(args.config.is_none());
    }

    #[test]
    fn rejects_bad_interval() {
        assert!(CliArgs::try_parse_from(["run-monitor", "--interval", "soon"]).is_err());
    }
}
