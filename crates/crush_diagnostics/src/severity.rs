//! How loud a cache message is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Level attached to every [`Message`](crate::Message).
///
/// Levels map onto `tracing` levels when forwarded: `Debug` to `DEBUG`,
/// `Notice` to `INFO`, `Warning` to `WARN`, `Error` to `ERROR`. Comparison
/// follows that order, so `sev >= Severity::Warning` selects what a user
/// should see.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Why a cache hit or miss was decided.
    Debug,
    /// A recoverable hiccup, e.g. a cache file that could not be deleted.
    Notice,
    /// The output directory is missing or unwritable.
    Warning,
    /// A write failed.
    Error,
}

impl Severity {
    /// Only `Error` counts towards [`DiagnosticSink::error_count`](crate::DiagnosticSink::error_count).
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Debug => "debug",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}
