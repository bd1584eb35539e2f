//! Persisted per-artifact metadata.
//!
//! The store is a single JSON object saved as `.csscrush` in the output
//! directory, keyed by output file name:
//!
//! ```json
//! { "site.crush.css": { "datem_sum": 150, "imports": ["b.css"], "options": { "minify": true } } }
//! ```
//!
//! Unknown keys are ignored on load. A missing or corrupt file never fails a
//! build; it only costs a recompile.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crush_common::{FreshnessSignature, OptionValue, Options};
use crush_diagnostics::{DiagnosticSink, Message};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CacheError;
use crate::fs::FileSystem;

/// Name of the cache file within the output directory.
pub const CACHE_FILE: &str = ".csscrush";

/// Metadata describing how one output file was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Sum of the input and import modification times at the last compile.
    #[serde(rename = "datem_sum")]
    pub signature: FreshnessSignature,

    /// Imports, either docroot-relative (leading `/`) or input-relative.
    #[serde(default)]
    pub imports: Vec<String>,

    /// Build options active at the last compile.
    #[serde(default, deserialize_with = "deserialize_options")]
    pub options: Options,
}

/// Accepts any JSON shape for `options`. Objects are normalized; anything
/// else (an empty list written by older tools, `null`) becomes empty.
fn deserialize_options<'de, D>(deserializer: D) -> Result<Options, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Object(map) => OptionValue::normalize_map(&map),
        _ => Options::new(),
    })
}

/// All manifest entries of one output directory.
///
/// Loaded once per build, mutated in memory, and written back by an explicit
/// [`save`](Self::save).
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
    entries: BTreeMap<String, ArtifactManifest>,
    degraded: bool,
}

impl ManifestStore {
    /// Creates an empty in-memory store backed by `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            degraded: false,
        }
    }

    /// Loads the store from `path`.
    ///
    /// - absent: an empty store is written and returned;
    /// - present, readable, writable and a JSON object: decoded entries are
    ///   returned (malformed entries are skipped);
    /// - otherwise the file is deleted and recreated empty. If deletion fails
    ///   a notice is recorded and the store runs degraded for this build.
    pub fn load(path: &Path, fs: &dyn FileSystem, sink: &DiagnosticSink) -> Self {
        let mut store = Self::empty(path);
        let exists = fs.exists(path);

        if exists && fs.is_writable(path) {
            match fs
                .read_to_string(path)
                .and_then(|text| parse_entries(&text, sink))
            {
                Ok(entries) => {
                    sink.debug("Cache data loaded.");
                    store.entries = entries;
                    return store;
                }
                Err(err) => {
                    sink.emit(Message::debug("Cache data is unreadable.").with_note(err.to_string()));
                }
            }
        }

        if exists {
            if let Err(err) = fs.remove_file(path) {
                sink.emit(
                    Message::notice("Could not delete cache data file.").with_note(err.to_string()),
                );
                store.degraded = true;
                return store;
            }
        } else {
            sink.debug("Creating cache data file.");
        }

        if let Err(err) = fs.write(path, "{}") {
            sink.emit(Message::error("Could not create cache data file.").with_note(err.to_string()));
        }
        store
    }

    /// Serializes every entry and overwrites the cache file.
    ///
    /// The buffer is complete before the file is touched. Failures are
    /// recorded in `sink` and returned; the artifact itself stays valid and
    /// the next build simply treats it as stale.
    pub fn save(&self, fs: &dyn FileSystem, sink: &DiagnosticSink) -> Result<(), CacheError> {
        sink.debug("Saving config.");
        let result = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })
            .and_then(|json| fs.write(&self.path, &json));
        if let Err(err) = &result {
            sink.emit(Message::error("Could not save cache data.").with_note(err.to_string()));
        }
        result
    }

    /// Path of the backing cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a corrupt cache file could not be removed, so no
    /// previous entries are available this build and every evaluation misses.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Returns the entry for an output file name.
    pub fn get(&self, output_name: &str) -> Option<&ArtifactManifest> {
        self.entries.get(output_name)
    }

    /// Returns a mutable entry for an output file name.
    pub fn get_mut(&mut self, output_name: &str) -> Option<&mut ArtifactManifest> {
        self.entries.get_mut(output_name)
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, output_name: impl Into<String>, entry: ArtifactManifest) {
        self.entries.insert(output_name.into(), entry);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entries(
    text: &str,
    sink: &DiagnosticSink,
) -> Result<BTreeMap<String, ArtifactManifest>, CacheError> {
    let raw: Value = serde_json::from_str(text).map_err(|e| CacheError::ManifestParse {
        reason: e.to_string(),
    })?;
    let Value::Object(map) = raw else {
        return Err(CacheError::ManifestParse {
            reason: "cache data is not a JSON object".to_string(),
        });
    };

    let mut entries = BTreeMap::new();
    for (name, value) in map {
        match serde_json::from_value::<ArtifactManifest>(value) {
            Ok(entry) => {
                entries.insert(name, entry);
            }
            Err(err) => sink.emit(
                Message::debug(format!("Ignoring malformed cache entry '{name}'."))
                    .with_note(err.to_string()),
            ),
        }
    }
    Ok(entries)
}
