//! Description of the stylesheet being compiled.

use std::path::{Path, PathBuf};

use crate::error::CacheError;
use crate::fs::FileSystem;

/// The input stylesheet of one build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// The reference exactly as the caller gave it (relative or absolute).
    pub raw: String,
    /// Resolved path of the input file.
    pub path: PathBuf,
    /// Directory containing the input file.
    pub dir: PathBuf,
    /// Modification time in whole seconds since the Unix epoch.
    pub mtime: u64,
}

impl InputFile {
    /// Creates an input description from already known facts.
    pub fn new(raw: impl Into<String>, path: impl Into<PathBuf>, mtime: u64) -> Self {
        let path = path.into();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            raw: raw.into(),
            path,
            dir,
            mtime,
        }
    }

    /// Describes the input at `resolved`, reading its modification time.
    pub fn open(
        raw: impl Into<String>,
        resolved: &Path,
        fs: &dyn FileSystem,
    ) -> Result<Self, CacheError> {
        let mtime = fs.modified(resolved)?;
        Ok(Self::new(raw, resolved, mtime))
    }

    /// File name of the input, without directories.
    pub fn filename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// File name of the input without a trailing `.css`.
    pub fn basename(&self) -> &str {
        crush_common::css_basename(self.filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    #[test]
    fn new_derives_dir_and_names() {
        let input = InputFile::new("css/site.css", "/srv/www/css/site.css", 100);
        assert_eq!(input.dir, PathBuf::from("/srv/www/css"));
        assert_eq!(input.filename(), "site.css");
        assert_eq!(input.basename(), "site");
    }

    #[test]
    fn open_reads_mtime() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/srv/a.css", "a{}", 321);
        let input = InputFile::open("/srv/a.css", Path::new("/srv/a.css"), &fs).unwrap();
        assert_eq!(input.mtime, 321);
    }

    #[test]
    fn open_missing_input_errors() {
        let fs = MemoryFileSystem::new();
        assert!(InputFile::open("a.css", Path::new("/srv/a.css"), &fs).is_err());
    }
}
