// src/dispatch/staging.rs

//! Filesystem hand-off steps around the trigger: placing the sample sheet,
//! backing up what it replaces, archiving the inbound copy.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::fs::FileSystem;

/// `<dir>/<stem>.<timestamp><.ext>` for a file name like `SampleSheet.csv`.
pub fn timestamped_name(dir: &Path, original: &Path, timestamp: &str) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match original.extension() {
        Some(ext) => format!("{stem}.{timestamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{timestamp}"),
    };
    dir.join(name)
}

/// Copy `source` to `dest`.
///
/// A file already at `dest` is first renamed into `backup_dir` with a
/// timestamp suffix; the returned path is where it went.
pub fn stage_sample_sheet(
    fs: &dyn FileSystem,
    source: &Path,
    dest: &Path,
    backup_dir: &Path,
    timestamp: &str,
) -> Result<Option<PathBuf>> {
    let backup = if fs.is_file(dest) {
        fs.create_dir_all(backup_dir)
            .with_context(|| format!("creating backup dir {:?}", backup_dir))?;
        let target = timestamped_name(backup_dir, dest, timestamp);
        fs.rename(dest, &target)
            .with_context(|| format!("backing up existing sample sheet {:?}", dest))?;
        Some(target)
    } else {
        None
    };

    fs.copy(source, dest)
        .with_context(|| format!("staging sample sheet {:?} to {:?}", source, dest))?;

    Ok(backup)
}

/// Move an inbound sample sheet into `processed_dir` so later sweeps don't
/// pick it up again.
pub fn archive_sample_sheet(
    fs: &dyn FileSystem,
    sample_sheet: &Path,
    processed_dir: &Path,
    timestamp: &str,
) -> Result<PathBuf> {
    fs.create_dir_all(processed_dir)
        .with_context(|| format!("creating processed dir {:?}", processed_dir))?;
    let target = timestamped_name(processed_dir, sample_sheet, timestamp);
    fs.rename(sample_sheet, &target)
        .with_context(|| format!("archiving sample sheet {:?}", sample_sheet))?;
    Ok(target)
}
