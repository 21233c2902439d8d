// src/sweep.rs

//! One discovery -> validate -> dispatch pass over the configured stages.
//!
//! Stages are swept one after another, demultiplexing stages first. Within
//! a stage, runs are dispatched on a `JoinSet` with at most `max_parallel`
//! in flight; the marker claim in the store is what keeps concurrent tasks
//! and overlapping sweeps from dispatching the same run twice.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ConfigFile;
use crate::config::validate::is_path_component;
use crate::discovery::{Candidate, DiscoverySource};
use crate::dispatch::notify::reply_to_address;
use crate::dispatch::{
    CommandNotifier, Dispatcher, LogNotifier, Notifier, RunOutcome, ShellTrigger, StagePlan,
    Trigger,
};
use crate::errors::{MonitorError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::run::{Run, SequencingProfile};
use crate::store::{FileMarkerStore, MarkerKey, MarkerStore};
use crate::types::DiscoveryMode;
use crate::validate::ValidationResult;

/// Upper bound on a single notification command.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(60);

/// External collaborators a sweep talks to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub fs: Arc<dyn FileSystem>,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn MarkerStore>,
    pub trigger: Arc<dyn Trigger>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// Real filesystem, wall clock, marker files under the state dir, shell
    /// trigger and the configured notification command.
    pub fn from_config(config: &ConfigFile) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = Arc::new(FileMarkerStore::new(Arc::clone(&fs), config.state_dir()));
        let notifier: Arc<dyn Notifier> = match &config.notify.command {
            Some(command) => {
                let reply_to = config
                    .notify
                    .reply_to_server
                    .as_deref()
                    .and_then(reply_to_address);
                Arc::new(CommandNotifier::new(command.clone(), reply_to, NOTIFY_TIMEOUT))
            }
            None => Arc::new(LogNotifier),
        };
        Self {
            fs,
            clock: Arc::new(SystemClock),
            store,
            trigger: Arc::new(ShellTrigger::new(config.trigger_timeout())),
            notifier,
        }
    }
}

#[derive(Debug)]
struct StageSweep {
    plan: Arc<StagePlan>,
    source: DiscoverySource,
}

/// Final state of one run in a sweep.
#[derive(Debug, Clone)]
pub struct SweepEntry {
    pub stage: String,
    pub run_id: String,
    pub outcome: RunOutcome,
}

/// A stage-level problem (discovery failed, a dispatch task died).
#[derive(Debug, Clone)]
pub struct SweepError {
    pub stage: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub entries: Vec<SweepEntry>,
    pub errors: Vec<SweepError>,
}

impl SweepReport {
    /// Any run ended `Failed`, or a stage could not be swept.
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty() || self.entries.iter().any(|e| e.outcome.is_failed())
    }

    pub fn dispatched(&self) -> impl Iterator<Item = &SweepEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, RunOutcome::Notified { .. }))
    }

    pub fn outcome(&self, stage: &str, run_id: &str) -> Option<&RunOutcome> {
        self.entries
            .iter()
            .find(|e| e.stage == stage && e.run_id == run_id)
            .map(|e| &e.outcome)
    }

    fn count(&self, stage: &str, label: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.stage == stage && e.outcome.label() == label)
            .count()
    }
}

/// What `--dry-run` reports for a candidate.
#[derive(Debug, Clone)]
pub struct DryRunEntry {
    pub stage: String,
    pub run_id: String,
    pub validation: ValidationResult,
    /// `None` when the marker could not be read.
    pub processed: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct DryRunReport {
    pub entries: Vec<DryRunEntry>,
    pub errors: Vec<SweepError>,
}

/// The controller: built once from configuration, run once per invocation.
#[derive(Debug)]
pub struct Sweep {
    stages: Vec<StageSweep>,
    sequencer_dir: PathBuf,
    fs: Arc<dyn FileSystem>,
    store: Arc<dyn MarkerStore>,
    dispatcher: Arc<Dispatcher>,
    max_parallel: usize,
}

impl Sweep {
    /// Build a sweep over every configured stage, or only `only_stages` if
    /// non-empty.
    pub fn from_config(
        config: &ConfigFile,
        only_stages: &[String],
        collaborators: Collaborators,
    ) -> Result<Self> {
        if let Some(unknown) = only_stages.iter().find(|s| !config.stage.contains_key(*s)) {
            return Err(MonitorError::Config(format!("unknown stage '{unknown}'")));
        }

        let sequencer_dir = config.config.sequencer_dir.clone();
        let mut stages = Vec::new();
        for (name, stage) in &config.stage {
            if !only_stages.is_empty() && !only_stages.contains(name) {
                continue;
            }

            let source = match stage.discovery_mode() {
                DiscoveryMode::SampleSheet => {
                    let dir = stage.samplesheet_source_dir.clone().ok_or_else(|| {
                        MonitorError::Config(format!(
                            "stage '{name}': samplesheet discovery needs samplesheet_source_dir"
                        ))
                    })?;
                    DiscoverySource::sample_sheets(dir)
                }
                DiscoveryMode::Directory => DiscoverySource::directories(
                    &sequencer_dir,
                    &config.discovery_excludes(stage),
                )?,
            };

            stages.push(StageSweep {
                plan: Arc::new(StagePlan {
                    name: name.clone(),
                    profile: SequencingProfile::new(stage.seqtype, stage.kind),
                    script: stage.script.clone(),
                    processed_dir: stage.samplesheet_processed_dir.clone(),
                    recipients: stage.effective_recipients(&config.notify),
                }),
                source,
            });
        }

        // Demultiplexing before analysis; name order within a kind.
        stages.sort_by_key(|s| s.plan.profile.stage);

        let Collaborators {
            fs,
            clock,
            store,
            trigger,
            notifier,
        } = collaborators;

        let dispatcher = Dispatcher::new(
            Arc::clone(&fs),
            Arc::clone(&store),
            trigger,
            notifier,
            clock,
            config.quiescence(),
        )
        .with_failure_policy(config.config.failure_policy)
        .with_log_dir(config.config.log_dir.clone());

        Ok(Self {
            stages,
            sequencer_dir,
            fs,
            store,
            dispatcher: Arc::new(dispatcher),
            max_parallel: config.config.max_parallel.max(1),
        })
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.plan.name.as_str()).collect()
    }

    /// Sweep every stage. Never fails as a whole; problems end up in the
    /// report.
    pub async fn run(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for stage in &self.stages {
            let name = &stage.plan.name;
            let Some(candidates) = self.discover(stage, &mut report.errors) else {
                continue;
            };
            info!(stage = %name, candidates = candidates.len(), "sweeping stage");

            let semaphore = Arc::new(Semaphore::new(self.max_parallel));
            let mut tasks = JoinSet::new();

            for (idx, candidate) in candidates.into_iter().enumerate() {
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let run = self.build_run(stage, candidate);
                let plan = Arc::clone(&stage.plan);
                let dispatcher = Arc::clone(&self.dispatcher);

                tasks.spawn(async move {
                    let _permit = permit;
                    let run_id = run.id().to_string();
                    let outcome = dispatcher.dispatch(&plan, run).await;
                    (idx, run_id, outcome)
                });
            }

            let mut finished = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(done) => finished.push(done),
                    Err(err) => {
                        error!(stage = %name, error = %err, "dispatch task failed");
                        report.errors.push(SweepError {
                            stage: name.clone(),
                            message: format!("dispatch task failed: {err}"),
                        });
                    }
                }
            }
            finished.sort_by_key(|(idx, _, _)| *idx);

            for (_, run_id, outcome) in finished {
                debug!(stage = %name, run = %run_id, outcome = outcome.label(), "run finished");
                report.entries.push(SweepEntry {
                    stage: name.clone(),
                    run_id,
                    outcome,
                });
            }

            info!(
                stage = %name,
                dispatched = report.count(name, "dispatched"),
                failed = report.count(name, "failed"),
                already_processed = report.count(name, "already-processed"),
                not_ready = report.count(name, "not-ready"),
                already_demultiplexed = report.count(name, "already-demultiplexed"),
                "stage sweep finished"
            );
        }

        report
    }

    /// Discovery and validation only. Reads markers but writes nothing.
    pub fn dry_run(&self) -> DryRunReport {
        let mut report = DryRunReport::default();

        for stage in &self.stages {
            let Some(candidates) = self.discover(stage, &mut report.errors) else {
                continue;
            };
            for candidate in candidates {
                let run = self.build_run(stage, candidate);
                let validation = self.dispatcher.validator().validate(&run);
                let key = MarkerKey::new(run.stage(), run.seqtype(), run.id());
                let processed = match self.store.is_processed(&key) {
                    Ok(p) => Some(p),
                    Err(err) => {
                        warn!(stage = %stage.plan.name, run = %run.id(), error = %err, "cannot read marker");
                        None
                    }
                };
                report.entries.push(DryRunEntry {
                    stage: stage.plan.name.clone(),
                    run_id: run.id().to_string(),
                    validation,
                    processed,
                });
            }
        }

        report
    }

    fn discover(&self, stage: &StageSweep, errors: &mut Vec<SweepError>) -> Option<Vec<Candidate>> {
        let name = &stage.plan.name;
        match stage.source.discover(self.fs.as_ref()) {
            Ok(candidates) => Some(
                candidates
                    .into_iter()
                    .filter(|c| {
                        let ok = is_path_component(&c.run_id);
                        if !ok {
                            warn!(stage = %name, run = %c.run_id, "ignoring candidate with unusable run id");
                        }
                        ok
                    })
                    .collect(),
            ),
            Err(err) => {
                let message = format!("{err:#}");
                error!(stage = %name, error = %message, "discovery failed");
                errors.push(SweepError {
                    stage: name.clone(),
                    message,
                });
                None
            }
        }
    }

    fn build_run(&self, stage: &StageSweep, candidate: Candidate) -> Run {
        let run = Run::new(candidate.run_id, stage.plan.profile, &self.sequencer_dir);
        match candidate.sample_sheet {
            Some(sheet) => run.with_sample_sheet(sheet),
            None => run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_failures_include_stage_errors() {
        let mut report = SweepReport::default();
        assert!(!report.has_failures());
        report.errors.push(SweepError {
            stage: "s".into(),
            message: "boom".into(),
        });
        assert!(report.has_failures());
    }
}
