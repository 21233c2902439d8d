// src/validate/mod.rs

//! Readiness validation.
//!
//! Every applicable predicate is evaluated, even after one has failed, so
//! the caller always gets the full breakdown. A missing or malformed file is
//! a failed predicate, never an error.

pub mod rta;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::fs::FileSystem;
use crate::run::Run;

pub use rta::{parse_rta_complete, quiescence_elapsed};

/// Default quiescence window after the RTAComplete stamp (90 minutes).
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_secs(5400);

/// A named readiness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Predicate {
    /// The RTAComplete stamp parses and is older than the quiescence window.
    RtaCompletionTime,
    RunDir,
    BasecallsDir,
    RtaCompleteFile,
    RunInfoFile,
    RunCompletionStatusFile,
    /// Demultiplexing only: `Unaligned/` must not exist yet.
    UnalignedDirAbsent,
    /// Demultiplexing only: the inbound sample sheet is still a file.
    SampleSheetExists,
    /// Analysis only: `Unaligned/Demultiplex_Stats.htm` exists.
    DemultiplexingComplete,
    /// Analysis only: `seqtype.txt` names the stage's sequencing type.
    SeqtypeMatch,
}

impl Predicate {
    pub fn as_str(self) -> &'static str {
        match self {
            Predicate::RtaCompletionTime => "rta_completion_time",
            Predicate::RunDir => "run_dir",
            Predicate::BasecallsDir => "basecalls_dir",
            Predicate::RtaCompleteFile => "rta_complete_file",
            Predicate::RunInfoFile => "run_info_file",
            Predicate::RunCompletionStatusFile => "run_completion_status_file",
            Predicate::UnalignedDirAbsent => "unaligned_dir_absent",
            Predicate::SampleSheetExists => "sample_sheet_exists",
            Predicate::DemultiplexingComplete => "demultiplexing_complete",
            Predicate::SeqtypeMatch => "seqtype_match",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run is (not) dispatchable this sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// At least one gate failed; retry on a later sweep.
    NotReady,
    /// `Unaligned/` already exists: the run was demultiplexed before. Blocks
    /// dispatch like `NotReady` but is reported separately.
    AlreadyDemultiplexed,
}

/// Full predicate breakdown for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    checks: Vec<(Predicate, bool)>,
    rta_complete_time: Option<NaiveDateTime>,
}

impl ValidationResult {
    pub fn new(checks: Vec<(Predicate, bool)>, rta_complete_time: Option<NaiveDateTime>) -> Self {
        Self {
            checks,
            rta_complete_time,
        }
    }

    /// Logical AND of every evaluated predicate.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|(_, ok)| *ok)
    }

    pub fn get(&self, predicate: Predicate) -> Option<bool> {
        self.checks
            .iter()
            .find(|(p, _)| *p == predicate)
            .map(|(_, ok)| *ok)
    }

    pub fn checks(&self) -> &[(Predicate, bool)] {
        &self.checks
    }

    pub fn failed(&self) -> impl Iterator<Item = Predicate> + '_ {
        self.checks.iter().filter(|(_, ok)| !*ok).map(|(p, _)| *p)
    }

    /// Parsed RTAComplete stamp, if the file was readable and well formed.
    pub fn rta_complete_time(&self) -> Option<NaiveDateTime> {
        self.rta_complete_time
    }

    pub fn readiness(&self) -> Readiness {
        if self.get(Predicate::UnalignedDirAbsent) == Some(false) {
            Readiness::AlreadyDemultiplexed
        } else if self.passed() {
            Readiness::Ready
        } else {
            Readiness::NotReady
        }
    }

    /// One line per predicate, e.g. `run_info_file: false`.
    pub fn summary(&self) -> String {
        self.checks
            .iter()
            .map(|(p, ok)| format!("{p}: {ok}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Evaluates the readiness gates of a run's profile.
#[derive(Debug, Clone)]
pub struct Validator {
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    quiescence: Duration,
}

impl Validator {
    pub fn new(fs: Arc<dyn FileSystem>, clock: Arc<dyn Clock>, quiescence: Duration) -> Self {
        Self {
            fs,
            clock,
            quiescence,
        }
    }

    pub fn validate(&self, run: &Run) -> ValidationResult {
        let paths = run.paths();
        let rta_complete_time = self.read_rta_complete_time(run);

        let predicates = run.profile().predicates(run.sample_sheet().is_some());
        let mut checks = Vec::with_capacity(predicates.len());

        for predicate in predicates {
            let ok = match predicate {
                Predicate::RtaCompletionTime => self.quiescent(run, rta_complete_time),
                Predicate::RunDir => self.fs.is_dir(&paths.run_dir),
                Predicate::BasecallsDir => self.fs.is_dir(&paths.basecalls_dir),
                Predicate::RtaCompleteFile => self.fs.is_file(&paths.rta_complete_file),
                Predicate::RunInfoFile => self.fs.is_file(&paths.run_info_file),
                Predicate::RunCompletionStatusFile => {
                    self.fs.is_file(&paths.run_completion_status_file)
                }
                Predicate::UnalignedDirAbsent => !self.fs.is_dir(&paths.unaligned_dir),
                Predicate::SampleSheetExists => run
                    .sample_sheet()
                    .is_some_and(|sheet| self.fs.is_file(sheet)),
                Predicate::DemultiplexingComplete => {
                    self.fs.is_file(&paths.demultiplex_stats_file)
                }
                Predicate::SeqtypeMatch => self.seqtype_matches(run),
            };
            debug!(run = %run.id(), predicate = %predicate, ok, "evaluated predicate");
            checks.push((predicate, ok));
        }

        let result = ValidationResult::new(checks, rta_complete_time);
        info!(
            run = %run.id(),
            stage = %run.stage(),
            passed = result.passed(),
            "validated run"
        );
        result
    }

    fn read_rta_complete_time(&self, run: &Run) -> Option<NaiveDateTime> {
        let path = &run.paths().rta_complete_file;
        match self.fs.read_to_string(path) {
            Ok(contents) => {
                let parsed = parse_rta_complete(&contents);
                if parsed.is_none() {
                    debug!(run = %run.id(), contents = %contents.trim(), "unparseable RTAComplete stamp");
                }
                parsed
            }
            Err(err) => {
                debug!(run = %run.id(), error = %err, "RTAComplete file not readable");
                None
            }
        }
    }

    fn quiescent(&self, run: &Run, completed: Option<NaiveDateTime>) -> bool {
        let Some(completed) = completed else {
            return false;
        };
        let now = self.clock.now();
        let ok = quiescence_elapsed(completed, now, self.quiescence);
        if !ok {
            info!(
                run = %run.id(),
                completed = %completed,
                now = %now,
                window_secs = self.quiescence.as_secs(),
                "quiescence window has not elapsed since RTA completion"
            );
        }
        ok
    }

    fn seqtype_matches(&self, run: &Run) -> bool {
        let path = &run.paths().seqtype_file;
        let Ok(contents) = self.fs.read_to_string(path) else {
            return false;
        };
        let found = contents.lines().next().map(str::trim).unwrap_or("");
        found == run.seqtype().tag()
    }
}
