//! In-memory adapters for deterministic tests and dry runs.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Clock, FileSystem};
use crate::error::CacheError;

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: String,
    mtime: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, MemoryFile>,
    dirs: BTreeSet<PathBuf>,
    read_only: BTreeSet<PathBuf>,
    failing_writes: BTreeSet<PathBuf>,
    undeletable: BTreeSet<PathBuf>,
    locked_permissions: BTreeSet<PathBuf>,
    write_mtime: u64,
}

/// A filesystem that lives entirely in memory.
///
/// Besides plain files and directories it can simulate read-only paths,
/// failing writes, undeletable files and failing permission changes.
/// Writes require the parent directory to exist.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: Mutex<MemoryState>,
}

impl MemoryFileSystem {
    /// Creates an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a directory and all of its ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state();
        for ancestor in path.as_ref().ancestors() {
            if !ancestor.as_os_str().is_empty() {
                state.dirs.insert(ancestor.to_path_buf());
            }
        }
    }

    /// Adds a file with the given contents and modification time, creating
    /// its parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: &str, mtime: u64) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.state().files.insert(
            path.to_path_buf(),
            MemoryFile {
                contents: contents.to_string(),
                mtime,
            },
        );
    }

    /// Sets the modification time of an existing file.
    pub fn touch(&self, path: impl AsRef<Path>, mtime: u64) {
        if let Some(file) = self.state().files.get_mut(path.as_ref()) {
            file.mtime = mtime;
        }
    }

    /// Returns the contents of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state()
            .files
            .get(path.as_ref())
            .map(|f| f.contents.clone())
    }

    /// Marks a path read-only (or writable again).
    pub fn set_read_only(&self, path: impl AsRef<Path>, read_only: bool) {
        let mut state = self.state();
        let path = path.as_ref().to_path_buf();
        if read_only {
            state.read_only.insert(path);
        } else {
            state.read_only.remove(&path);
        }
    }

    /// Makes every subsequent write to `path` fail.
    pub fn fail_writes_to(&self, path: impl AsRef<Path>) {
        self.state().failing_writes.insert(path.as_ref().to_path_buf());
    }

    /// Makes deletion of `path` fail.
    pub fn make_undeletable(&self, path: impl AsRef<Path>) {
        self.state().undeletable.insert(path.as_ref().to_path_buf());
    }

    /// Makes permission changes on `path` fail.
    pub fn lock_permissions(&self, path: impl AsRef<Path>) {
        self.state()
            .locked_permissions
            .insert(path.as_ref().to_path_buf());
    }

    /// Sets the modification time stamped on files created by `write`.
    pub fn set_write_mtime(&self, mtime: u64) {
        self.state().write_mtime = mtime;
    }
}

fn not_found(path: &Path) -> CacheError {
    CacheError::io(path, std::io::Error::new(ErrorKind::NotFound, "no such file"))
}

fn denied(path: &Path) -> CacheError {
    CacheError::io(
        path,
        std::io::Error::new(ErrorKind::PermissionDenied, "permission denied"),
    )
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state().dirs.contains(path)
    }

    fn is_writable(&self, path: &Path) -> bool {
        let state = self.state();
        let exists = state.files.contains_key(path) || state.dirs.contains(path);
        exists && !state.read_only.contains(path)
    }

    fn modified(&self, path: &Path) -> Result<u64, CacheError> {
        self.state()
            .files
            .get(path)
            .map(|f| f.mtime)
            .ok_or_else(|| not_found(path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String, CacheError> {
        self.contents(path).ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), CacheError> {
        let mut state = self.state();
        if state.failing_writes.contains(path) || state.read_only.contains(path) {
            return Err(denied(path));
        }
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                if !state.dirs.contains(parent) {
                    return Err(not_found(parent));
                }
                if state.read_only.contains(parent) {
                    return Err(denied(parent));
                }
            }
            _ => {}
        }
        let mtime = state.write_mtime;
        state.files.insert(
            path.to_path_buf(),
            MemoryFile {
                contents: contents.to_string(),
                mtime,
            },
        );
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), CacheError> {
        let mut state = self.state();
        if state.undeletable.contains(path) {
            return Err(denied(path));
        }
        state.read_only.remove(path);
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn set_permissions(&self, path: &Path, _mode: u32) -> Result<(), CacheError> {
        let mut state = self.state();
        if state.locked_permissions.contains(path) {
            return Err(denied(path));
        }
        if !state.files.contains_key(path) && !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        state.read_only.remove(path);
        Ok(())
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}
