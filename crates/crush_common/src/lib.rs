//! Shared foundational types used across the crush stylesheet cache.
//!
//! This crate provides the build option values recorded in cache manifests,
//! the additive freshness signature, and the path/URL helpers used when
//! resolving imports and output URLs.

#![warn(missing_docs)]

pub mod option;
pub mod path;
pub mod signature;

pub use option::{OptionValue, Options};
pub use path::{css_basename, is_relative_reference, link_between_paths, resolve_import};
pub use signature::FreshnessSignature;
