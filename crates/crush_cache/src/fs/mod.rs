//! Filesystem and clock capabilities consumed by the cache.
//!
//! The cache never touches `std::fs` directly. Everything it needs from the
//! outside world goes through [`FileSystem`] and [`Clock`], so the decision
//! logic can be exercised against [`MemoryFileSystem`] and [`FixedClock`].

pub mod local;
pub mod memory;

use std::path::Path;

use crate::error::CacheError;

pub use local::{LocalFileSystem, SystemClock};
pub use memory::{FixedClock, MemoryFileSystem};

/// Permission mode applied when an output directory turns out to be unwritable.
pub const REPAIR_MODE: u32 = 0o755;

/// Filesystem operations needed to validate and persist cached output.
pub trait FileSystem {
    /// Returns `true` if a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns `true` if `path` exists and may be written to.
    fn is_writable(&self, path: &Path) -> bool;

    /// Returns the modification time of `path` in whole seconds since the
    /// Unix epoch.
    fn modified(&self, path: &Path) -> Result<u64, CacheError>;

    /// Reads the entire contents of a file as UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, CacheError>;

    /// Writes `contents` to `path`, replacing any previous file.
    ///
    /// The previous contents must stay intact if the write fails part way.
    fn write(&self, path: &Path, contents: &str) -> Result<(), CacheError>;

    /// Deletes a file.
    fn remove_file(&self, path: &Path) -> Result<(), CacheError>;

    /// Changes the permission bits of `path`.
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), CacheError>;
}

/// Source of wall-clock time.
pub trait Clock {
    /// Returns the current time in whole seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}
