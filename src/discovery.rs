// src/discovery.rs

//! Candidate run enumeration.
//!
//! Discovery only lists candidates; it never looks at readiness or at the
//! processed markers. Results are sorted by run id purely so logs read
//! nicely.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Inbound sample sheets are named `<runId>-SampleSheet.csv`.
pub const SAMPLE_SHEET_GLOB: &str = "*-SampleSheet.csv";

/// Hidden entries are never runs, whatever a stage's `exclude` says.
pub const HIDDEN_EXCLUDE: &str = ".*";

/// Sequencer-root entries that are never runs, used when a stage doesn't
/// configure its own `exclude` list.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    HIDDEN_EXCLUDE,
    "to_be_demultiplexed",
    "run_index",
    "automatic_demultiplexing_logs",
    "test*",
];

/// A run id found by discovery, plus the sample sheet that named it (for
/// sample-sheet driven discovery).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub run_id: String,
    pub sample_sheet: Option<PathBuf>,
}

/// Where a stage looks for candidate runs.
#[derive(Debug, Clone)]
pub enum DiscoverySource {
    SampleSheets { source_dir: PathBuf },
    Directories { root: PathBuf, exclude: GlobSet },
}

impl DiscoverySource {
    pub fn sample_sheets(source_dir: impl Into<PathBuf>) -> Self {
        DiscoverySource::SampleSheets {
            source_dir: source_dir.into(),
        }
    }

    pub fn directories(root: impl Into<PathBuf>, exclude_patterns: &[String]) -> Result<Self> {
        Ok(DiscoverySource::Directories {
            root: root.into(),
            exclude: build_globset(exclude_patterns).context("building discovery exclude globset")?,
        })
    }

    pub fn discover(&self, fs: &dyn FileSystem) -> Result<Vec<Candidate>> {
        match self {
            DiscoverySource::SampleSheets { source_dir } => find_sample_sheets(fs, source_dir),
            DiscoverySource::Directories { root, exclude } => find_run_dirs(fs, root, exclude),
        }
    }
}

/// Run id encoded in an inbound sample sheet file name: everything before
/// the first `-`.
pub fn run_id_from_sample_sheet(file_name: &str) -> Option<&str> {
    let id = file_name.split('-').next()?;
    if id.is_empty() { None } else { Some(id) }
}

/// Scan `source_dir` (one level, files only) for inbound sample sheets.
pub fn find_sample_sheets(fs: &dyn FileSystem, source_dir: &Path) -> Result<Vec<Candidate>> {
    let matcher = sample_sheet_matcher()?;
    let mut found = Vec::new();

    for path in fs
        .read_dir(source_dir)
        .with_context(|| format!("listing sample sheet source dir {:?}", source_dir))?
    {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !matcher.is_match(name) || !fs.is_file(&path) {
            continue;
        }
        match run_id_from_sample_sheet(name) {
            Some(run_id) => {
                debug!(run = %run_id, sample_sheet = ?path, "found inbound sample sheet");
                found.push(Candidate {
                    run_id: run_id.to_string(),
                    sample_sheet: Some(path.clone()),
                });
            }
            None => warn!(sample_sheet = ?path, "sample sheet name has an empty run id; ignoring"),
        }
    }

    found.sort_by(|a, b| a.run_id.cmp(&b.run_id));
    Ok(found)
}

/// List subdirectories of the sequencer root whose basename matches none of
/// the exclusion globs.
pub fn find_run_dirs(fs: &dyn FileSystem, root: &Path, exclude: &GlobSet) -> Result<Vec<Candidate>> {
    let mut found = Vec::new();

    for path in fs
        .read_dir(root)
        .with_context(|| format!("listing sequencer dir {:?}", root))?
    {
        if !fs.is_dir(&path) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if exclude.is_match(name) {
            debug!(dir = %name, "excluded from run discovery");
            continue;
        }
        found.push(Candidate {
            run_id: name.to_string(),
            sample_sheet: None,
        });
    }

    found.sort_by(|a, b| a.run_id.cmp(&b.run_id));
    Ok(found)
}

fn sample_sheet_matcher() -> Result<GlobMatcher> {
    Ok(Glob::new(SAMPLE_SHEET_GLOB)
        .with_context(|| format!("invalid glob pattern: {SAMPLE_SHEET_GLOB}"))?
        .compile_matcher())
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
