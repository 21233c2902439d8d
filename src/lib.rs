// src/lib.rs

pub mod cli;
pub mod clock;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod run;
pub mod store;
pub mod sweep;
pub mod types;
pub mod validate;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate};
use crate::dispatch::RunOutcome;
use crate::sweep::{Collaborators, DryRunReport, Sweep, SweepReport};

/// How the invocation went, for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Clean,
    /// At least one run ended `Failed` (or a stage could not be swept).
    RunsFailed,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the real filesystem, clock, marker store, trigger and notifier
/// - one sweep, or a sweep every `--interval` until Ctrl-C
pub async fn run(args: CliArgs) -> Result<Status> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    let collaborators = Collaborators::from_config(&cfg);
    let sweep = Sweep::from_config(&cfg, &args.stages, collaborators)?;
    info!(stages = ?sweep.stage_names(), config = %config_path.display(), "run-monitor starting");

    if args.dry_run {
        let report = sweep.dry_run();
        print_dry_run(&report);
        return Ok(if report.errors.is_empty() {
            Status::Clean
        } else {
            Status::RunsFailed
        });
    }

    let Some(period) = args.interval else {
        let report = sweep.run().await;
        print_report(&report);
        return Ok(status_of(&report));
    };

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut status = Status::Clean;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = sweep.run().await;
                print_report(&report);
                if status_of(&report) == Status::RunsFailed {
                    status = Status::RunsFailed;
                }
            }
            res = &mut shutdown => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                info!("shutdown requested");
                break;
            }
        }
    }

    Ok(status)
}

fn status_of(report: &SweepReport) -> Status {
    if report.has_failures() {
        Status::RunsFailed
    } else {
        Status::Clean
    }
}

fn print_report(report: &SweepReport) {
    for entry in &report.entries {
        match &entry.outcome {
            RunOutcome::Failed { phase, error, .. } => {
                println!("{}\t{}\tfailed ({phase}): {error}", entry.stage, entry.run_id)
            }
            outcome => println!("{}\t{}\t{}", entry.stage, entry.run_id, outcome.label()),
        }
    }
    for err in &report.errors {
        println!("{}\t-\terror: {}", err.stage, err.message);
    }
}

/// Dry-run output: each candidate with its predicate breakdown.
fn print_dry_run(report: &DryRunReport) {
    println!("run-monitor dry-run");
    for entry in &report.entries {
        let processed = match entry.processed {
            Some(true) => "processed",
            Some(false) => "unprocessed",
            None => "marker unreadable",
        };
        println!(
            "  [{}] {} ({}, {})",
            entry.stage,
            entry.run_id,
            if entry.validation.passed() { "ready" } else { "not ready" },
            processed
        );
        for (predicate, ok) in entry.validation.checks() {
            println!("      {predicate}: {ok}");
        }
    }
    for err in &report.errors {
        println!("  [{}] error: {}", err.stage, err.message);
    }
}
