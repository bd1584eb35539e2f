//! Live adapters backed by `std::fs` and the system clock.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{Clock, FileSystem};
use crate::error::CacheError;

/// Filesystem adapter backed by real disk I/O.
///
/// Writes go to a hidden temporary sibling first and are renamed over the
/// target, so a failed write never truncates an existing file.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    fn temp_sibling(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{name}.tmp"))
    }
}

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    #[cfg(unix)]
    fn is_writable(&self, path: &Path) -> bool {
        use nix::unistd::{access, AccessFlags};
        access(path, AccessFlags::W_OK).is_ok()
    }

    #[cfg(not(unix))]
    fn is_writable(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    }

    fn modified(&self, path: &Path) -> Result<u64, CacheError> {
        let mtime = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| CacheError::io(path, e))?;
        Ok(mtime
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0))
    }

    fn read_to_string(&self, path: &Path) -> Result<String, CacheError> {
        std::fs::read_to_string(path).map_err(|e| CacheError::io(path, e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), CacheError> {
        let tmp = Self::temp_sibling(path);
        std::fs::write(&tmp, contents).map_err(|e| CacheError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            CacheError::io(path, e)
        })
    }

    fn remove_file(&self, path: &Path) -> Result<(), CacheError> {
        std::fs::remove_file(path).map_err(|e| CacheError::io(path, e))
    }

    #[cfg(unix)]
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), CacheError> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .map_err(|e| CacheError::io(path, e))
    }

    #[cfg(not(unix))]
    fn set_permissions(&self, path: &Path, _mode: u32) -> Result<(), CacheError> {
        let mut perms = std::fs::metadata(path)
            .map_err(|e| CacheError::io(path, e))?
            .permissions();
        perms.set_readonly(false);
        std::fs::set_permissions(path, perms).map_err(|e| CacheError::io(path, e))
    }
}

/// Clock that returns the real current time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
