#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use run_monitor::fs::mock::MockFileSystem;

/// The instant every fixture is built relative to.
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 8, 10)
        .and_then(|d| d.and_hms_opt(15, 0, 0))
        .expect("valid fixture date")
}

/// `fixed_now()` formatted the way markers and backups are named.
pub const FIXED_TIMESTAMP: &str = "2017-08-10-15-00-00";

/// First line of an `RTAComplete.txt` written at `t`.
pub fn rta_stamp(t: NaiveDateTime) -> String {
    format!("RTA 2.4.11 completed on {}\n", t.format("%-m/%-d/%Y %-I:%M:%S %p"))
}

/// `<dir>/<run_id>-SampleSheet.csv`.
pub fn sample_sheet_path(dir: impl AsRef<Path>, run_id: &str) -> PathBuf {
    dir.as_ref().join(format!("{run_id}-SampleSheet.csv"))
}

/// Lays out a sequencer run directory.
///
/// By default the run is complete: every marker file exists and RTA
/// finished two hours before [`fixed_now`].
#[derive(Debug, Clone)]
pub struct RunFixture {
    pub root: PathBuf,
    pub run_id: String,
    age_secs: i64,
    omit: Vec<&'static str>,
    unaligned: bool,
    seqtype: Option<String>,
}

impl RunFixture {
    pub fn new(root: impl Into<PathBuf>, run_id: &str) -> Self {
        Self {
            root: root.into(),
            run_id: run_id.to_string(),
            age_secs: 2 * 60 * 60,
            omit: Vec::new(),
            unaligned: false,
            seqtype: None,
        }
    }

    pub fn completed_secs_ago(mut self, secs: i64) -> Self {
        self.age_secs = secs;
        self
    }

    /// Leave out one of `RTAComplete.txt`, `RunInfo.xml`,
    /// `RunCompletionStatus.xml`.
    pub fn without(mut self, file: &'static str) -> Self {
        self.omit.push(file);
        self
    }

    /// Demultiplexing output present, as the analysis stage expects.
    pub fn demultiplexed(mut self, seqtype: &str) -> Self {
        self.unaligned = true;
        self.seqtype = Some(seqtype.to_string());
        self
    }

    pub fn run_dir(&self) -> PathBuf {
        self.root.join(&self.run_id)
    }

    pub fn basecalls_dir(&self) -> PathBuf {
        self.run_dir().join("Data/Intensities/BaseCalls")
    }

    fn files(&self) -> Vec<(PathBuf, String)> {
        let dir = self.run_dir();
        let completed = fixed_now() - TimeDelta::seconds(self.age_secs);
        let mut files = vec![
            (dir.join("RTAComplete.txt"), rta_stamp(completed)),
            (dir.join("RunInfo.xml"), "<RunInfo/>\n".to_string()),
            (dir.join("RunCompletionStatus.xml"), "<RunCompletionStatus/>\n".to_string()),
        ];
        files.retain(|(p, _)| {
            p.file_name()
                .map(|n| !self.omit.iter().any(|o| n == *o))
                .unwrap_or(true)
        });
        if self.unaligned {
            files.push((
                self.basecalls_dir().join("Unaligned/Demultiplex_Stats.htm"),
                "<html/>\n".to_string(),
            ));
        }
        if let Some(tag) = &self.seqtype {
            files.push((dir.join("seqtype.txt"), format!("{tag}\n")));
        }
        files
    }

    pub fn install(&self, fs: &MockFileSystem) {
        fs.add_dir(self.basecalls_dir());
        for (path, contents) in self.files() {
            fs.add_file(path, contents);
        }
    }

    pub fn install_on_disk(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.basecalls_dir())?;
        for (path, contents) in self.files() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
        }
        Ok(())
    }
}
