// src/run/mod.rs

//! Runs and their on-disk layout.
//!
//! A [`Run`] is rebuilt from scratch on every sweep; the only state that
//! outlives a sweep is the processed marker kept by [`crate::store`].

pub mod paths;

use std::path::{Path, PathBuf};

use crate::types::{SequencingType, StageKind};
use crate::validate::Predicate;

pub use paths::RunPaths;

/// The combination that decides which readiness gates apply to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequencingProfile {
    pub seqtype: SequencingType,
    pub stage: StageKind,
}

impl SequencingProfile {
    pub fn new(seqtype: SequencingType, stage: StageKind) -> Self {
        Self { seqtype, stage }
    }

    /// Predicates evaluated for a run under this profile.
    ///
    /// `has_sample_sheet` is true for runs registered through an inbound
    /// sample sheet; only those get the sample-sheet existence gate.
    pub fn predicates(&self, has_sample_sheet: bool) -> Vec<Predicate> {
        let mut preds = vec![
            Predicate::RtaCompletionTime,
            Predicate::RunDir,
            Predicate::BasecallsDir,
            Predicate::RtaCompleteFile,
            Predicate::RunInfoFile,
            Predicate::RunCompletionStatusFile,
        ];
        match self.stage {
            StageKind::Demultiplexing => {
                preds.push(Predicate::UnalignedDirAbsent);
                if has_sample_sheet {
                    preds.push(Predicate::SampleSheetExists);
                }
            }
            StageKind::Analysis => {
                preds.push(Predicate::DemultiplexingComplete);
                preds.push(Predicate::SeqtypeMatch);
            }
        }
        preds
    }
}

/// One sequencer output unit, as seen by a single stage.
#[derive(Debug, Clone)]
pub struct Run {
    id: String,
    profile: SequencingProfile,
    paths: RunPaths,
    sample_sheet: Option<PathBuf>,
}

impl Run {
    pub fn new(id: impl Into<String>, profile: SequencingProfile, sequencer_root: &Path) -> Self {
        let id = id.into();
        let paths = RunPaths::new(&id, sequencer_root);
        Self {
            id,
            profile,
            paths,
            sample_sheet: None,
        }
    }

    /// Associate an inbound sample sheet with the run.
    pub fn with_sample_sheet(mut self, sample_sheet: impl Into<PathBuf>) -> Self {
        self.sample_sheet = Some(sample_sheet.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn profile(&self) -> SequencingProfile {
        self.profile
    }

    pub fn seqtype(&self) -> SequencingType {
        self.profile.seqtype
    }

    pub fn stage(&self) -> StageKind {
        self.profile.stage
    }

    pub fn paths(&self) -> &RunPaths {
        &self.paths
    }

    pub fn sample_sheet(&self) -> Option<&Path> {
        self.sample_sheet.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demultiplexing_profile_gates_on_sample_sheet_only_when_present() {
        let p = SequencingProfile::new(SequencingType::Ngs580, StageKind::Demultiplexing);
        assert!(p.predicates(true).contains(&Predicate::SampleSheetExists));
        assert!(!p.predicates(false).contains(&Predicate::SampleSheetExists));
        assert!(p.predicates(false).contains(&Predicate::UnalignedDirAbsent));
        assert!(!p.predicates(true).contains(&Predicate::SeqtypeMatch));
    }

    #[test]
    fn analysis_profile_requires_seqtype_and_finished_demultiplexing() {
        let p = SequencingProfile::new(SequencingType::Ngs580, StageKind::Analysis);
        let preds = p.predicates(false);
        assert!(preds.contains(&Predicate::SeqtypeMatch));
        assert!(preds.contains(&Predicate::DemultiplexingComplete));
        assert!(!preds.contains(&Predicate::UnalignedDirAbsent));
    }
}
