// src/run/paths.rs

use std::path::{Path, PathBuf};

use crate::types::StageKind;

/// Illumina output layout, relative to the run directory.
pub const BASECALLS_SUBDIR: [&str; 3] = ["Data", "Intensities", "BaseCalls"];
pub const UNALIGNED_DIR: &str = "Unaligned";
pub const DEMULTIPLEX_STATS_FILE: &str = "Demultiplex_Stats.htm";
pub const SAMPLE_SHEET_FILE: &str = "SampleSheet.csv";
pub const RTA_COMPLETE_FILE: &str = "RTAComplete.txt";
pub const RUN_INFO_FILE: &str = "RunInfo.xml";
pub const RUN_COMPLETION_STATUS_FILE: &str = "RunCompletionStatus.xml";
pub const SEQTYPE_FILE: &str = "seqtype.txt";

/// Canonical filesystem locations for one run.
///
/// Built once from the run id and the sequencer root; pure path arithmetic,
/// nothing here touches the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub run_dir: PathBuf,
    pub basecalls_dir: PathBuf,
    pub unaligned_dir: PathBuf,
    pub demultiplex_stats_file: PathBuf,
    pub sample_sheet_output_file: PathBuf,
    pub rta_complete_file: PathBuf,
    pub run_info_file: PathBuf,
    pub run_completion_status_file: PathBuf,
    pub seqtype_file: PathBuf,
}

impl RunPaths {
    pub fn new(run_id: &str, sequencer_root: &Path) -> Self {
        let run_dir = sequencer_root.join(run_id);
        let basecalls_dir = BASECALLS_SUBDIR
            .iter()
            .fold(run_dir.clone(), |acc, part| acc.join(part));
        let unaligned_dir = basecalls_dir.join(UNALIGNED_DIR);

        Self {
            demultiplex_stats_file: unaligned_dir.join(DEMULTIPLEX_STATS_FILE),
            sample_sheet_output_file: basecalls_dir.join(SAMPLE_SHEET_FILE),
            rta_complete_file: run_dir.join(RTA_COMPLETE_FILE),
            run_info_file: run_dir.join(RUN_INFO_FILE),
            run_completion_status_file: run_dir.join(RUN_COMPLETION_STATUS_FILE),
            seqtype_file: run_dir.join(SEQTYPE_FILE),
            run_dir,
            basecalls_dir,
            unaligned_dir,
        }
    }

    /// `<run_dir>/<stage>.started`, written once the stage's external
    /// command has been launched.
    pub fn started_marker(&self, stage: StageKind) -> PathBuf {
        self.run_dir.join(format!("{}.started", stage.as_str()))
    }

    /// Directory that receives backups of a previously staged sample sheet.
    pub fn sample_sheet_backup_dir(&self) -> PathBuf {
        self.basecalls_dir.join("old")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_illumina_layout_from_run_id() {
        let p = RunPaths::new("170809_NB501073_0019_AH5FFYBGX3", Path::new("/seq"));
        let run = PathBuf::from("/seq/170809_NB501073_0019_AH5FFYBGX3");
        let basecalls = run.join("Data/Intensities/BaseCalls");

        assert_eq!(p.run_dir, run);
        assert_eq!(p.basecalls_dir, basecalls);
        assert_eq!(p.unaligned_dir, basecalls.join("Unaligned"));
        assert_eq!(p.sample_sheet_output_file, basecalls.join("SampleSheet.csv"));
        assert_eq!(p.rta_complete_file, run.join("RTAComplete.txt"));
        assert_eq!(p.run_info_file, run.join("RunInfo.xml"));
        assert_eq!(p.run_completion_status_file, run.join("RunCompletionStatus.xml"));
        assert_eq!(p.seqtype_file, run.join("seqtype.txt"));
        assert_eq!(
            p.started_marker(StageKind::Demultiplexing),
            run.join("demultiplexing.started")
        );
    }
}
