//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Most cache operations are fail-safe: errors result in cache misses or a
/// recorded message rather than hard failures. This enum is used for
/// filesystem capability results and for `ManifestStore::save`.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing a file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache file could not be parsed as a JSON object.
    #[error("failed to parse cache data: {reason}")]
    ManifestParse {
        /// Description of the parse failure.
        reason: String,
    },

    /// A serialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl CacheError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::io(
            "/srv/css/.csscrush",
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains(".csscrush"));
    }

    #[test]
    fn manifest_parse_display() {
        let err = CacheError::ManifestParse {
            reason: "unexpected EOF".to_string(),
        };
        assert!(err.to_string().contains("unexpected EOF"));
    }

    #[test]
    fn serialization_error_display() {
        let err = CacheError::Serialization {
            reason: "key must be a string".to_string(),
        };
        assert!(err.to_string().contains("key must be a string"));
    }
}
