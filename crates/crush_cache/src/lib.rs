//! Output cache management for compiled stylesheets.
//!
//! Given one input stylesheet, this crate decides whether a previously
//! written `.crush.css` output is still valid, computes the output's name,
//! directory and URL, and persists new output together with a manifest
//! (`.csscrush`) describing how it was produced. Validity is judged from the
//! summed modification times of the input and its imports plus the build
//! options recorded at the last compile.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod fs;
pub mod input;
pub mod locator;
pub mod manifest;
pub mod staleness;
pub mod writer;

pub use cache::{BuildCache, CompiledArtifact};
pub use error::CacheError;
pub use fs::{Clock, FileSystem, FixedClock, LocalFileSystem, MemoryFileSystem, SystemClock};
pub use input::InputFile;
pub use locator::{output_file_name, OutputLocation, OutputLocator, OUTPUT_SUFFIX};
pub use manifest::{ArtifactManifest, ManifestStore, CACHE_FILE};
pub use staleness::{MissReason, StalenessEvaluator, Verdict};
pub use writer::Writer;
