// src/dispatch/mod.rs

//! Per-run dispatch.
//!
//! `Dispatcher::dispatch` drives one run through
//! `Validated -> Claimed -> Staged -> Triggered -> Marked -> Notified`
//! and always ends in a terminal [`RunOutcome`]. Nothing that goes wrong
//! for one run is returned as an `Err`; the sweep keeps going.
//!
//! The processed marker is claimed before any side effect. A sweep that
//! loses the claim never stages or triggers.

pub mod notify;
pub mod runlog;
pub mod staging;
pub mod trigger;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::errors::MonitorError;
use crate::fs::FileSystem;
use crate::run::{Run, SequencingProfile};
use crate::store::{MarkOutcome, MarkerKey, MarkerStore};
use crate::types::{FailurePolicy, StageKind};
use crate::validate::{Readiness, ValidationResult, Validator};

pub use notify::{CommandNotifier, LogNotifier, Notification, Notifier};
pub use runlog::RunLog;
pub use trigger::{ShellTrigger, Trigger, TriggerOutput, trigger_command};

/// What a configured stage does to each of its runs.
#[derive(Debug, Clone)]
pub struct StagePlan {
    /// Name of the `[stage.<name>]` section.
    pub name: String,
    pub profile: SequencingProfile,
    /// Invoked as `<script> <runId>`.
    pub script: String,
    /// Inbound sample sheets are archived here after dispatch.
    pub processed_dir: Option<PathBuf>,
    pub recipients: Vec<String>,
}

/// Step at which a dispatch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePhase {
    /// Checking for an existing marker failed.
    Store,
    /// Creating the marker failed (not "already exists").
    Claim,
    Staging,
    Trigger,
}

impl fmt::Display for FailurePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailurePhase::Store => "store",
            FailurePhase::Claim => "claim",
            FailurePhase::Staging => "staging",
            FailurePhase::Trigger => "trigger",
        };
        f.write_str(s)
    }
}

/// Terminal state of one run in one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Validation failed; retried next sweep.
    Skipped {
        readiness: Readiness,
        validation: ValidationResult,
    },
    /// A marker already existed, or another sweep won the claim.
    AlreadyProcessed,
    /// Triggered successfully.
    Notified {
        exit_code: i32,
        notification_sent: bool,
    },
    Failed {
        phase: FailurePhase,
        error: String,
        /// Whether the processed marker still exists after this sweep.
        marker_retained: bool,
    },
}

impl RunOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Skipped { readiness: Readiness::AlreadyDemultiplexed, .. } => {
                "already-demultiplexed"
            }
            RunOutcome::Skipped { .. } => "not-ready",
            RunOutcome::AlreadyProcessed => "already-processed",
            RunOutcome::Notified { .. } => "dispatched",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

/// Content written to a marker once the trigger has returned.
pub fn marker_payload(timestamp: &str, exit_code: i32) -> String {
    format!("{timestamp}\nexit_code={exit_code}\n")
}

/// Owns the collaborators needed to dispatch runs.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    fs: Arc<dyn FileSystem>,
    store: Arc<dyn MarkerStore>,
    trigger: Arc<dyn Trigger>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    validator: Validator,
    policy: FailurePolicy,
    log_dir: Option<PathBuf>,
}

impl Dispatcher {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn MarkerStore>,
        trigger: Arc<dyn Trigger>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        quiescence: Duration,
    ) -> Self {
        let validator = Validator::new(Arc::clone(&fs), Arc::clone(&clock), quiescence);
        Self {
            fs,
            store,
            trigger,
            notifier,
            clock,
            validator,
            policy: FailurePolicy::default(),
            log_dir: None,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub async fn dispatch(&self, plan: &StagePlan, run: Run) -> RunOutcome {
        let mut log = RunLog::new(&plan.name, run.id(), Arc::clone(&self.clock));

        // Validated
        let validation = self.validator.validate(&run);
        if !validation.passed() {
            let readiness = validation.readiness();
            let failed: Vec<_> = validation.failed().map(|p| p.as_str()).collect();
            debug!(
                stage = %plan.name,
                run = %run.id(),
                ?readiness,
                failed = ?failed,
                "run not ready"
            );
            return RunOutcome::Skipped {
                readiness,
                validation,
            };
        }
        log.info(format!("Run {} passed validation", run.id()));

        let key = MarkerKey::new(run.stage(), run.seqtype(), run.id());
        match self.store.is_processed(&key) {
            Ok(true) => {
                debug!(stage = %plan.name, run = %run.id(), "run already processed");
                return RunOutcome::AlreadyProcessed;
            }
            Ok(false) => {}
            Err(err) => {
                log.error(format!("Could not read processed marker: {err}"));
                return RunOutcome::Failed {
                    phase: FailurePhase::Store,
                    error: err.to_string(),
                    marker_retained: false,
                };
            }
        }

        // Claimed
        let timestamp = self.clock.timestamp();
        match self.store.mark_processed(&key, &timestamp) {
            Ok(MarkOutcome::Marked) => {
                log.info(format!("Claimed run {} for {}", run.id(), plan.name));
            }
            Ok(MarkOutcome::AlreadyProcessed) => {
                info!(
                    stage = %plan.name,
                    run = %run.id(),
                    "another sweep claimed the run first"
                );
                return RunOutcome::AlreadyProcessed;
            }
            Err(err) => {
                log.error(format!("Could not create processed marker: {err}"));
                return RunOutcome::Failed {
                    phase: FailurePhase::Claim,
                    error: err.to_string(),
                    marker_retained: false,
                };
            }
        }

        // Staged
        if let Err(err) = self.stage(&run, &timestamp, &mut log) {
            let error = MonitorError::Staging {
                run: run.id().to_string(),
                message: format!("{err:#}"),
            };
            log.error(error.to_string());
            let marker_retained = self.release(&key, &mut log);
            return RunOutcome::Failed {
                phase: FailurePhase::Staging,
                error: error.to_string(),
                marker_retained,
            };
        }

        // Triggered
        let command = trigger_command(&plan.script, run.id());
        log.info(format!("Running command: {command}"));
        let (exit_code, trigger_error) = match self.trigger.trigger(&command).await {
            Ok(output) => {
                if !output.stdout.trim().is_empty() {
                    log.info(format!("Command output: {}", output.stdout.trim()));
                }
                if output.success() {
                    log.info(format!("Command exited with status {}", output.exit_code));
                    (output.exit_code, None)
                } else {
                    let msg = format!(
                        "command exited with status {}: {}",
                        output.exit_code,
                        output.stderr.trim()
                    );
                    (output.exit_code, Some(msg))
                }
            }
            Err(err) => (-1, Some(format!("{err:#}"))),
        };

        // Marked
        let marker_retained = match &trigger_error {
            None => {
                self.update_marker(&key, &timestamp, exit_code, &mut log);
                true
            }
            Some(msg) => {
                log.error(format!("Dispatch failed: {msg}"));
                match self.policy {
                    FailurePolicy::KeepMarker => {
                        log.warn("Keeping processed marker; the run will not be retried");
                        self.update_marker(&key, &timestamp, exit_code, &mut log);
                        true
                    }
                    FailurePolicy::ReleaseMarker => self.release(&key, &mut log),
                }
            }
        };

        if trigger_error.is_none() {
            self.record_started(&run, &timestamp, &mut log);
        }
        if marker_retained {
            self.archive(plan, &run, &timestamp, &mut log);
        }

        // Notified
        let event = if trigger_error.is_none() { "Started" } else { "Failed" };
        self.write_log_file(&run, &timestamp, &log);
        let notification = Notification {
            subject: notify::subject(run.stage(), event, run.id()),
            body: log.body(),
            recipients: plan.recipients.clone(),
        };
        let notification_sent = match self.notifier.notify(&notification).await {
            Ok(()) => true,
            Err(err) => {
                let error = format!("{err:#}");
                warn!(stage = %plan.name, run = %run.id(), error = %error, "notification failed");
                false
            }
        };

        match trigger_error {
            None => RunOutcome::Notified {
                exit_code,
                notification_sent,
            },
            Some(message) => RunOutcome::Failed {
                phase: FailurePhase::Trigger,
                error: MonitorError::Trigger {
                    run: run.id().to_string(),
                    message,
                }
                .to_string(),
                marker_retained,
            },
        }
    }

    fn stage(&self, run: &Run, timestamp: &str, log: &mut RunLog) -> anyhow::Result<()> {
        if run.stage() != StageKind::Demultiplexing {
            return Ok(());
        }
        let Some(sheet) = run.sample_sheet() else {
            return Ok(());
        };
        let paths = run.paths();
        let backup = staging::stage_sample_sheet(
            self.fs.as_ref(),
            sheet,
            &paths.sample_sheet_output_file,
            &paths.sample_sheet_backup_dir(),
            timestamp,
        )?;
        if let Some(backup) = backup {
            log.warn(format!(
                "Existing sample sheet moved to {}",
                backup.display()
            ));
        }
        log.info(format!(
            "Copied sample sheet {} to {}",
            sheet.display(),
            paths.sample_sheet_output_file.display()
        ));
        Ok(())
    }

    /// Remove the claim; returns whether a marker is still present.
    fn release(&self, key: &MarkerKey, log: &mut RunLog) -> bool {
        match self.store.release(key) {
            Ok(()) => {
                log.info("Released processed marker; the run will be retried");
                false
            }
            Err(err) => {
                log.error(format!("Could not release processed marker: {err}"));
                true
            }
        }
    }

    fn update_marker(&self, key: &MarkerKey, timestamp: &str, exit_code: i32, log: &mut RunLog) {
        if let Err(err) = self.store.update(key, &marker_payload(timestamp, exit_code)) {
            log.warn(format!("Could not record exit status in marker: {err}"));
        }
    }

    fn record_started(&self, run: &Run, timestamp: &str, log: &mut RunLog) {
        let paths = run.paths();
        let started = paths.started_marker(run.stage());
        if let Err(err) = self.fs.write(&started, format!("{timestamp}\n").as_bytes()) {
            log.warn(format!("Could not write {}: {err:#}", started.display()));
        }

        if run.stage() == StageKind::Demultiplexing {
            let tag = run.seqtype().tag();
            match self.fs.write(&paths.seqtype_file, format!("{tag}\n").as_bytes()) {
                Ok(()) => log.info(format!("Marked run as {tag}")),
                Err(err) => log.error(format!(
                    "Could not write {}: {err:#}",
                    paths.seqtype_file.display()
                )),
            }
        }
    }

    fn archive(&self, plan: &StagePlan, run: &Run, timestamp: &str, log: &mut RunLog) {
        let (Some(processed_dir), Some(sheet)) = (&plan.processed_dir, run.sample_sheet()) else {
            return;
        };
        match staging::archive_sample_sheet(self.fs.as_ref(), sheet, processed_dir, timestamp) {
            Ok(target) => log.info(format!("Archived sample sheet to {}", target.display())),
            Err(err) => log.warn(format!("Could not archive sample sheet: {err:#}")),
        }
    }

    fn write_log_file(&self, run: &Run, timestamp: &str, log: &RunLog) {
        let Some(dir) = &self.log_dir else {
            return;
        };
        let path = dir.join(format!("{}.{timestamp}.log", run.id()));
        if let Err(err) = self.fs.write(&path, log.body().as_bytes()) {
            let error = format!("{err:#}");
            warn!(run = %run.id(), path = ?path, error = %error, "could not write run log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::fs::mock::MockFileSystem;
    use crate::store::{FileMarkerStore, MemoryMarkerStore};
    use crate::types::SequencingType;
    use crate::validate::{DEFAULT_QUIESCENCE, Predicate};
    use anyhow::anyhow;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use std::path::Path;
    use std::sync::Mutex;

    use super::notify::NotifyFuture;
    use super::trigger::TriggerFuture;

    const RUN: &str = "170809_NB501073_0019_AH5FFYBGX3";
    const SHEET: &str = "/inbox/170809_NB501073_0019_AH5FFYBGX3-SampleSheet.csv";

    #[derive(Debug, Default)]
    struct StubTrigger {
        exit_code: i32,
        fail_to_start: bool,
        commands: Mutex<Vec<String>>,
    }

    impl Trigger for StubTrigger {
        fn trigger<'a>(&'a self, command: &'a str) -> TriggerFuture<'a> {
            Box::pin(async move {
                self.commands.lock().unwrap().push(command.to_string());
                if self.fail_to_start {
                    return Err(anyhow!("no such file"));
                }
                Ok(TriggerOutput {
                    exit_code: self.exit_code,
                    stdout: String::new(),
                    stderr: String::new(),
                })
            })
        }
    }

    #[derive(Debug, Default)]
    struct StubNotifier {
        fail: bool,
        sent: Mutex<Vec<Notification>>,
    }

    impl Notifier for StubNotifier {
        fn notify<'a>(&'a self, notification: &'a Notification) -> NotifyFuture<'a> {
            Box::pin(async move {
                if self.fail {
                    return Err(anyhow!("smtp down"));
                }
                self.sent.lock().unwrap().push(notification.clone());
                Ok(())
            })
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 8, 10)
            .and_then(|d| d.and_hms_opt(15, 0, 0))
            .unwrap()
    }

    fn complete_run(fs: &MockFileSystem) {
        let root = Path::new("/seq").join(RUN);
        let done = now() - TimeDelta::hours(2);
        fs.add_file(
            root.join("RTAComplete.txt"),
            format!("RTA 2.4.11 completed on {}\n", done.format("%-m/%-d/%Y %-I:%M:%S %p")),
        );
        fs.add_file(root.join("RunInfo.xml"), "<RunInfo/>");
        fs.add_file(root.join("RunCompletionStatus.xml"), "<Status/>");
        fs.add_dir(root.join("Data/Intensities/BaseCalls"));
        fs.add_file(SHEET, "[Header]\n");
    }

    fn plan() -> StagePlan {
        StagePlan {
            name: "NGS580_demultiplexing".to_string(),
            profile: SequencingProfile::new(SequencingType::Ngs580, StageKind::Demultiplexing),
            script: "/scripts/demux.sh".to_string(),
            processed_dir: None,
            recipients: vec!["lab@example.org".to_string()],
        }
    }

    fn run() -> Run {
        Run::new(RUN, plan().profile, Path::new("/seq")).with_sample_sheet(SHEET)
    }

    struct Harness {
        fs: MockFileSystem,
        store: Arc<dyn MarkerStore>,
        trigger: Arc<StubTrigger>,
        notifier: Arc<StubNotifier>,
    }

    impl Harness {
        fn new(trigger: StubTrigger, notifier: StubNotifier) -> Self {
            let fs = MockFileSystem::new();
            complete_run(&fs);
            let store: Arc<dyn MarkerStore> =
                Arc::new(FileMarkerStore::new(Arc::new(fs.clone()), "/state"));
            Self {
                fs,
                store,
                trigger: Arc::new(trigger),
                notifier: Arc::new(notifier),
            }
        }

        fn dispatcher(&self) -> Dispatcher {
            Dispatcher::new(
                Arc::new(self.fs.clone()),
                Arc::clone(&self.store),
                self.trigger.clone(),
                self.notifier.clone(),
                Arc::new(FixedClock(now())),
                DEFAULT_QUIESCENCE,
            )
        }

        fn key(&self) -> MarkerKey {
            MarkerKey::new(StageKind::Demultiplexing, SequencingType::Ngs580, RUN)
        }
    }

    #[tokio::test]
    async fn ready_run_is_staged_triggered_marked_and_notified() {
        let h = Harness::new(StubTrigger::default(), StubNotifier::default());

        let outcome = h.dispatcher().dispatch(&plan(), run()).await;

        assert_eq!(
            outcome,
            RunOutcome::Notified {
                exit_code: 0,
                notification_sent: true
            }
        );
        let run_dir = Path::new("/seq").join(RUN);
        assert_eq!(
            h.fs.read_to_string(&run_dir.join("Data/Intensities/BaseCalls/SampleSheet.csv"))
                .unwrap(),
            "[Header]\n"
        );
        assert_eq!(h.fs.read_to_string(&run_dir.join("seqtype.txt")).unwrap(), "NGS580\n");
        assert!(h.fs.is_file(&run_dir.join("demultiplexing.started")));
        assert_eq!(
            h.store.read(&h.key()).unwrap().as_deref(),
            Some("2017-08-10-15-00-00\nexit_code=0\n")
        );
        assert_eq!(
            *h.trigger.commands.lock().unwrap(),
            vec![format!("/scripts/demux.sh {RUN}")]
        );
        let sent = h.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, format!("[Demultiplexing] Started {RUN}"));
        assert!(sent[0].body.contains("Copied sample sheet"));
    }

    #[tokio::test]
    async fn unready_run_is_skipped_with_breakdown() {
        let h = Harness::new(StubTrigger::default(), StubNotifier::default());
        h.fs.remove_file(&Path::new("/seq").join(RUN).join("RunInfo.xml"))
            .unwrap();

        match h.dispatcher().dispatch(&plan(), run()).await {
            RunOutcome::Skipped {
                readiness,
                validation,
            } => {
                assert_eq!(readiness, Readiness::NotReady);
                assert_eq!(validation.failed().collect::<Vec<_>>(), vec![Predicate::RunInfoFile]);
            }
            other => panic!("expected skip, got {other:?}"),
        }
        assert!(h.trigger.commands.lock().unwrap().is_empty());
        assert!(!h.store.is_processed(&h.key()).unwrap());
    }

    #[tokio::test]
    async fn existing_marker_short_circuits() {
        let h = Harness::new(StubTrigger::default(), StubNotifier::default());
        h.store.mark_processed(&h.key(), "earlier").unwrap();

        let outcome = h.dispatcher().dispatch(&plan(), run()).await;

        assert_eq!(outcome, RunOutcome::AlreadyProcessed);
        assert!(h.trigger.commands.lock().unwrap().is_empty());
        assert!(h.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn staging_failure_releases_the_claim() {
        let h = Harness::new(StubTrigger::default(), StubNotifier::default());
        h.fs.deny_writes(Path::new("/seq").join(RUN).join("Data"));

        match h.dispatcher().dispatch(&plan(), run()).await {
            RunOutcome::Failed {
                phase,
                error,
                marker_retained,
            } => {
                assert_eq!(phase, FailurePhase::Staging);
                assert!(error.starts_with(&format!("Staging failed for run {RUN}: ")), "{error}");
                assert!(!marker_retained);
            }
            other => panic!("expected staging failure, got {other:?}"),
        }
        assert!(!h.store.is_processed(&h.key()).unwrap());
        assert!(h.trigger.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn trigger_failure_keeps_marker_by_default() {
        let h = Harness::new(
            StubTrigger {
                exit_code: 2,
                ..Default::default()
            },
            StubNotifier::default(),
        );

        match h.dispatcher().dispatch(&plan(), run()).await {
            RunOutcome::Failed {
                phase,
                error,
                marker_retained,
            } => {
                assert_eq!(phase, FailurePhase::Trigger);
                assert!(
                    error.starts_with(&format!(
                        "Trigger failed for run {RUN}: command exited with status 2"
                    )),
                    "{error}"
                );
                assert!(marker_retained);
            }
            other => panic!("expected trigger failure, got {other:?}"),
        }
        assert_eq!(
            h.store.read(&h.key()).unwrap().as_deref(),
            Some("2017-08-10-15-00-00\nexit_code=2\n")
        );
        let sent = h.notifier.sent.lock().unwrap();
        assert_eq!(sent[0].subject, format!("[Demultiplexing] Failed {RUN}"));
        assert!(!h.fs.exists(&Path::new("/seq").join(RUN).join("seqtype.txt")));
    }

    #[tokio::test]
    async fn trigger_failure_can_release_marker() {
        let h = Harness::new(
            StubTrigger {
                fail_to_start: true,
                ..Default::default()
            },
            StubNotifier::default(),
        );

        let outcome = h
            .dispatcher()
            .with_failure_policy(FailurePolicy::ReleaseMarker)
            .dispatch(&plan(), run())
            .await;

        assert!(matches!(
            outcome,
            RunOutcome::Failed {
                phase: FailurePhase::Trigger,
                marker_retained: false,
                ..
            }
        ));
        assert!(!h.store.is_processed(&h.key()).unwrap());
    }

    #[tokio::test]
    async fn notification_failure_does_not_undo_dispatch() {
        let h = Harness::new(
            StubTrigger::default(),
            StubNotifier {
                fail: true,
                ..Default::default()
            },
        );

        let outcome = h.dispatcher().dispatch(&plan(), run()).await;

        assert_eq!(
            outcome,
            RunOutcome::Notified {
                exit_code: 0,
                notification_sent: false
            }
        );
        assert!(h.store.is_processed(&h.key()).unwrap());
    }

    #[tokio::test]
    async fn store_error_fails_before_any_side_effect() {
        let h = Harness::new(StubTrigger::default(), StubNotifier::default());
        h.fs.deny_writes("/state");

        match h.dispatcher().dispatch(&plan(), run()).await {
            RunOutcome::Failed { phase, .. } => assert_eq!(phase, FailurePhase::Claim),
            other => panic!("expected claim failure, got {other:?}"),
        }
        assert!(!h.fs.exists(&Path::new("/seq").join(RUN).join("Data/Intensities/BaseCalls/SampleSheet.csv")));
        assert!(h.trigger.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn archive_and_log_file_when_configured() {
        let h = Harness::new(StubTrigger::default(), StubNotifier::default());
        let mut plan = plan();
        plan.processed_dir = Some(PathBuf::from("/inbox/processed"));

        h.dispatcher()
            .with_log_dir(Some(PathBuf::from("/logs")))
            .dispatch(&plan, run())
            .await;

        assert!(!h.fs.exists(Path::new(SHEET)));
        assert!(h.fs.is_file(Path::new(&format!(
            "/inbox/processed/{RUN}-SampleSheet.2017-08-10-15-00-00.csv"
        ))));
        let log = h
            .fs
            .read_to_string(Path::new(&format!("/logs/{RUN}.2017-08-10-15-00-00.log")))
            .unwrap();
        assert!(log.starts_with("2017-08-10 15:00:00 INFO: "), "{log}");
    }

    #[tokio::test]
    async fn memory_store_works_as_ledger() {
        let h = Harness::new(StubTrigger::default(), StubNotifier::default());
        let store: Arc<dyn MarkerStore> = Arc::new(MemoryMarkerStore::new());
        let dispatcher = Dispatcher::new(
            Arc::new(h.fs.clone()),
            Arc::clone(&store),
            h.trigger.clone(),
            h.notifier.clone(),
            Arc::new(FixedClock(now())),
            DEFAULT_QUIESCENCE,
        );

        assert!(matches!(
            dispatcher.dispatch(&plan(), run()).await,
            RunOutcome::Notified { .. }
        ));
        assert_eq!(dispatcher.dispatch(&plan(), run()).await, RunOutcome::AlreadyProcessed);
        assert_eq!(h.trigger.commands.lock().unwrap().len(), 1);
    }
}
