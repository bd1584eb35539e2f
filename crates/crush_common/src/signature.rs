//! Additive freshness signatures for cache invalidation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The sum of modification timestamps (whole seconds) of an input file and
/// every file it imports.
///
/// The sum is order-independent and not content-based: two different sets of
/// timestamps with the same total produce the same signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FreshnessSignature(u64);

impl FreshnessSignature {
    /// Wraps a raw signature value, as read from a manifest.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Sums a sequence of modification timestamps.
    pub fn from_mtimes<I>(mtimes: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        Self(mtimes.into_iter().fold(0u64, u64::saturating_add))
    }

    /// Returns the raw value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FreshnessSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
