// src/fs/mock.rs

use super::{CreateOutcome, FileSystem};
use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

type Entries = HashMap<PathBuf, MockEntry>;

/// In-memory filesystem.
///
/// Paths are stored exactly as given; tests are expected to use absolute
/// paths (e.g. `/seq/170101_X_0001`). Writes below a path registered with
/// [`MockFileSystem::deny_writes`] fail, which lets tests drive the I/O
/// error branches.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    files: Arc<Mutex<Entries>>,
    denied: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("/"), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            denied: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut files = self.lock();
        insert_file(&mut files, path.as_ref(), content.into());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.lock();
        ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Make every mutating call at or below `prefix` fail.
    pub fn deny_writes(&self, prefix: impl AsRef<Path>) {
        self.denied
            .lock()
            .unwrap()
            .push(prefix.as_ref().to_path_buf());
    }

    /// Every file path currently stored, sorted. Handy for asserting that a
    /// sweep performed no writes.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let files = self.lock();
        let mut paths: Vec<PathBuf> = files
            .iter()
            .filter(|(_, e)| matches!(e, MockEntry::File(_)))
            .map(|(p, _)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.files.lock().unwrap()
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        let denied = self.denied.lock().unwrap();
        if denied.iter().any(|prefix| path.starts_with(prefix)) {
            bail!("Permission denied (mock): {:?}", path);
        }
        Ok(())
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("/"),
    }
}

fn link_child(files: &mut Entries, path: &Path) {
    let parent = parent_of(path);
    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

fn unlink_child(files: &mut Entries, path: &Path) {
    let parent = parent_of(path);
    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            children.retain(|c| c != name);
        }
    }
}

fn ensure_dir_entry(files: &mut Entries, path: &Path) {
    if files.contains_key(path) {
        return;
    }
    files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    let parent = parent_of(path);
    if parent != path {
        // Avoid infinite loop at root
        ensure_dir_entry(files, parent);
        link_child(files, path);
    }
}

fn insert_file(files: &mut Entries, path: &Path, content: Vec<u8>) {
    ensure_dir_entry(files, parent_of(path));
    files.insert(path.to_path_buf(), MockEntry::File(content));
    link_child(files, path);
}

fn file_contents(files: &Entries, path: &Path) -> Result<Vec<u8>> {
    match files.get(path) {
        Some(MockEntry::File(content)) => Ok(content.clone()),
        Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
        None => Err(anyhow!("File not found: {:?}", path)),
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.lock();
        let content = file_contents(&files, path)?;
        String::from_utf8(content).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.lock();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.check_writable(path)?;
        let mut files = self.lock();
        if let Some(MockEntry::Dir(_)) = files.get(path) {
            bail!("Is a directory: {:?}", path);
        }
        insert_file(&mut files, path, contents.to_vec());
        Ok(())
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> Result<CreateOutcome> {
        self.check_writable(path)?;
        let mut files = self.lock();
        if files.contains_key(path) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        insert_file(&mut files, path, contents.to_vec());
        Ok(CreateOutcome::Created)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.check_writable(path)?;
        let mut files = self.lock();
        if let Some(MockEntry::File(_)) = files.get(path) {
            bail!("File exists: {:?}", path);
        }
        ensure_dir_entry(&mut files, path);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        self.check_writable(to)?;
        let mut files = self.lock();
        let content = file_contents(&files, from)?;
        if !matches!(files.get(parent_of(to)), Some(MockEntry::Dir(_))) {
            bail!("No such directory: {:?}", parent_of(to));
        }
        insert_file(&mut files, to, content);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.check_writable(from)?;
        self.check_writable(to)?;
        let mut files = self.lock();
        let content = file_contents(&files, from)?;
        if !matches!(files.get(parent_of(to)), Some(MockEntry::Dir(_))) {
            bail!("No such directory: {:?}", parent_of(to));
        }
        files.remove(from);
        unlink_child(&mut files, from);
        insert_file(&mut files, to, content);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.check_writable(path)?;
        let mut files = self.lock();
        file_contents(&files, path)?;
        files.remove(path);
        unlink_child(&mut files, path);
        Ok(())
    }
}
