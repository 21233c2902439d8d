// src/store.rs

//! Processed-run ledger.
//!
//! A run counts as processed for a stage exactly when its marker exists.
//! Creating the marker is an exclusive create, which makes it the single
//! serialization point between overlapping sweeps: whoever creates the
//! marker owns the dispatch, everyone else sees `AlreadyProcessed`.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::errors::{MonitorError, Result};
use crate::fs::{CreateOutcome, FileSystem};
use crate::types::{SequencingType, StageKind};

/// Identity of a marker.
///
/// The stage is part of the key so that demultiplexing and analysis of the
/// same run keep separate ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerKey {
    pub stage: StageKind,
    pub seqtype: SequencingType,
    pub run_id: String,
}

impl MarkerKey {
    pub fn new(stage: StageKind, seqtype: SequencingType, run_id: impl Into<String>) -> Self {
        Self {
            stage,
            seqtype,
            run_id: run_id.into(),
        }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.stage, self.seqtype, self.run_id)
    }
}

/// Result of trying to create a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// This caller created the marker and now owns the dispatch.
    Marked,
    /// A marker was already present; not an error.
    AlreadyProcessed,
}

/// Abstract storage for processed markers.
pub trait MarkerStore: Send + Sync + Debug {
    fn is_processed(&self, key: &MarkerKey) -> Result<bool>;

    /// Exclusively create the marker with `timestamp` as payload.
    fn mark_processed(&self, key: &MarkerKey, timestamp: &str) -> Result<MarkOutcome>;

    /// Replace the payload of an existing marker.
    fn update(&self, key: &MarkerKey, payload: &str) -> Result<()>;

    /// Remove a marker this sweep created, so the run is retried later.
    fn release(&self, key: &MarkerKey) -> Result<()>;

    fn read(&self, key: &MarkerKey) -> Result<Option<String>>;
}

/// Stores one marker file per key under
/// `<state_dir>/<stage>/<seqtype>/<run_id>.processed`.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    fs: Arc<dyn FileSystem>,
    state_dir: PathBuf,
}

impl FileMarkerStore {
    pub fn new(fs: Arc<dyn FileSystem>, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            state_dir: state_dir.into(),
        }
    }

    pub fn marker_path(&self, key: &MarkerKey) -> PathBuf {
        self.state_dir
            .join(key.stage.as_str())
            .join(key.seqtype.tag())
            .join(format!("{}.processed", key.run_id))
    }
}

fn store_error(path: &Path, err: impl fmt::Display) -> MonitorError {
    MonitorError::Store {
        path: path.display().to_string(),
        message: format!("{err:#}"),
    }
}

impl MarkerStore for FileMarkerStore {
    fn is_processed(&self, key: &MarkerKey) -> Result<bool> {
        Ok(self.read(key)?.is_some())
    }

    fn mark_processed(&self, key: &MarkerKey, timestamp: &str) -> Result<MarkOutcome> {
        let path = self.marker_path(key);
        let payload = format!("{timestamp}\n");
        match self.fs.create_new(&path, payload.as_bytes()) {
            Ok(CreateOutcome::Created) => {
                info!(marker = %key, path = ?path, "created processed marker");
                Ok(MarkOutcome::Marked)
            }
            Ok(CreateOutcome::AlreadyExists) => {
                debug!(marker = %key, "processed marker already exists");
                Ok(MarkOutcome::AlreadyProcessed)
            }
            Err(err) => Err(store_error(&path, err)),
        }
    }

    fn update(&self, key: &MarkerKey, payload: &str) -> Result<()> {
        let path = self.marker_path(key);
        self.fs
            .write(&path, payload.as_bytes())
            .map_err(|err| store_error(&path, err))
    }

    fn release(&self, key: &MarkerKey) -> Result<()> {
        let path = self.marker_path(key);
        self.fs
            .remove_file(&path)
            .map_err(|err| store_error(&path, err))?;
        info!(marker = %key, "released processed marker");
        Ok(())
    }

    fn read(&self, key: &MarkerKey) -> Result<Option<String>> {
        let path = self.marker_path(key);
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        // Present but unreadable is a store error, not "unprocessed".
        self.fs
            .read_to_string(&path)
            .map(Some)
            .map_err(|err| store_error(&path, err))
    }
}

/// Stores markers in memory only (lost on restart).
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    map: Mutex<HashMap<MarkerKey, String>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> Result<MutexGuard<'_, HashMap<MarkerKey, String>>> {
        self.map.lock().map_err(|_| MonitorError::Store {
            path: "<memory>".to_string(),
            message: "marker map lock poisoned".to_string(),
        })
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn is_processed(&self, key: &MarkerKey) -> Result<bool> {
        Ok(self.map()?.contains_key(key))
    }

    fn mark_processed(&self, key: &MarkerKey, timestamp: &str) -> Result<MarkOutcome> {
        let mut map = self.map()?;
        if map.contains_key(key) {
            return Ok(MarkOutcome::AlreadyProcessed);
        }
        map.insert(key.clone(), format!("{timestamp}\n"));
        info!(marker = %key, "created processed marker (memory)");
        Ok(MarkOutcome::Marked)
    }

    fn update(&self, key: &MarkerKey, payload: &str) -> Result<()> {
        self.map()?.insert(key.clone(), payload.to_string());
        Ok(())
    }

    fn release(&self, key: &MarkerKey) -> Result<()> {
        self.map()?.remove(key);
        info!(marker = %key, "released processed marker (memory)");
        Ok(())
    }

    fn read(&self, key: &MarkerKey) -> Result<Option<String>> {
        Ok(self.map()?.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn key() -> MarkerKey {
        MarkerKey::new(StageKind::Demultiplexing, SequencingType::Ngs580, "170101_X_0001")
    }

    #[test]
    fn marker_path_is_keyed_by_stage_seqtype_and_run() {
        let store = FileMarkerStore::new(Arc::new(MockFileSystem::new()), "/state");
        assert_eq!(
            store.marker_path(&key()),
            PathBuf::from("/state/demultiplexing/NGS580/170101_X_0001.processed")
        );
    }

    #[test]
    fn second_mark_observes_already_processed() {
        let fs = MockFileSystem::new();
        let store = FileMarkerStore::new(Arc::new(fs.clone()), "/state");

        assert!(!store.is_processed(&key()).unwrap());
        assert_eq!(
            store.mark_processed(&key(), "2017-08-10-15-00-00").unwrap(),
            MarkOutcome::Marked
        );
        assert_eq!(
            store.mark_processed(&key(), "2017-08-10-15-05-00").unwrap(),
            MarkOutcome::AlreadyProcessed
        );
        assert!(store.is_processed(&key()).unwrap());
        assert_eq!(
            store.read(&key()).unwrap().as_deref(),
            Some("2017-08-10-15-00-00\n")
        );
    }

    #[test]
    fn io_failure_is_a_store_error_not_already_processed() {
        let fs = MockFileSystem::new();
        fs.deny_writes("/state");
        let store = FileMarkerStore::new(Arc::new(fs), "/state");

        match store.mark_processed(&key(), "ts") {
            Err(MonitorError::Store { path, .. }) => assert!(path.ends_with(".processed")),
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_marker_is_a_store_error() {
        let fs = MockFileSystem::new();
        let store = FileMarkerStore::new(Arc::new(fs.clone()), "/state");
        // A directory where the marker file should be cannot be read.
        fs.add_dir(store.marker_path(&key()));

        assert!(matches!(store.is_processed(&key()), Err(MonitorError::Store { .. })));
    }

    #[test]
    fn release_allows_a_new_claim() {
        let store = FileMarkerStore::new(Arc::new(MockFileSystem::new()), "/state");
        store.mark_processed(&key(), "a").unwrap();
        store.release(&key()).unwrap();

        assert!(!store.is_processed(&key()).unwrap());
        assert_eq!(store.mark_processed(&key(), "b").unwrap(), MarkOutcome::Marked);
    }

    #[test]
    fn real_files_serialize_concurrent_claims() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileMarkerStore::new(
            Arc::new(crate::fs::RealFileSystem),
            dir.path(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.mark_processed(&key(), &format!("t{i}")).unwrap())
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|o| *o == MarkOutcome::Marked)
            .count();

        assert_eq!(wins, 1);
    }

    #[test]
    fn memory_store_is_exclusive_too() {
        let store = MemoryMarkerStore::new();
        assert_eq!(store.mark_processed(&key(), "a").unwrap(), MarkOutcome::Marked);
        assert_eq!(
            store.mark_processed(&key(), "b").unwrap(),
            MarkOutcome::AlreadyProcessed
        );
    }
}
