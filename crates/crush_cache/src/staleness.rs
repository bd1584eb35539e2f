//! Decides whether a previously written output can be reused.
//!
//! A cached output is reused only when all of these hold:
//!
//! 1. the output file exists;
//! 2. the store has an entry for it;
//! 3. every recorded import still resolves to an existing file;
//! 4. the input mtime plus the import mtimes sums to the recorded signature;
//! 5. no recorded option differs from the active value of the same key.
//!
//! A store whose corrupt cache file could not be removed never hits.
//! Steps 1-3 short-circuit. Steps 4 and 5 are both evaluated; on a miss the
//! entry's signature is refreshed in memory.

use std::path::Path;

use crush_common::{resolve_import, FreshnessSignature, Options};
use crush_diagnostics::{DiagnosticSink, Message};

use crate::fs::FileSystem;
use crate::input::InputFile;
use crate::locator::OutputLocation;
use crate::manifest::ManifestStore;

/// Outcome of a staleness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The cached output is current and can be reused.
    Hit,
    /// The output must be recompiled.
    Miss(MissReason),
}

impl Verdict {
    /// Returns `true` for [`Verdict::Hit`].
    pub fn is_hit(&self) -> bool {
        matches!(self, Verdict::Hit)
    }
}

/// Why a cached output cannot be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// No output file exists at the computed location.
    NotCached,
    /// The cache file was corrupt and could not be replaced this build.
    Degraded,
    /// An output file exists but the store has no entry for it.
    Unregistered,
    /// A recorded import no longer resolves to a file.
    ImportMissing {
        /// The import as recorded in the manifest.
        import: String,
    },
    /// Files or options changed since the last compile.
    Stale {
        /// The aggregate modification time differs from the recorded one.
        files_changed: bool,
        /// A recorded option has a different active value.
        options_changed: bool,
        /// The freshly computed signature, now stored in memory.
        signature: FreshnessSignature,
    },
}

/// Evaluates cached outputs against the current files and options.
pub struct StalenessEvaluator<'a> {
    fs: &'a dyn FileSystem,
    sink: &'a DiagnosticSink,
    doc_root: &'a Path,
}

impl<'a> StalenessEvaluator<'a> {
    /// Creates an evaluator resolving docroot-relative imports against `doc_root`.
    pub fn new(fs: &'a dyn FileSystem, sink: &'a DiagnosticSink, doc_root: &'a Path) -> Self {
        Self { fs, sink, doc_root }
    }

    /// Checks whether the output at `location` can be reused for `input`.
    ///
    /// Never fails: anything that cannot be verified is a miss.
    pub fn evaluate(
        &self,
        input: &InputFile,
        location: &OutputLocation,
        active: &Options,
        store: &mut ManifestStore,
    ) -> Verdict {
        if !self.fs.exists(&location.path()) {
            self.sink.debug("No file cached.");
            return Verdict::Miss(MissReason::NotCached);
        }

        if store.is_degraded() {
            self.sink.debug("Cache data is unavailable. Recompiling.");
            return Verdict::Miss(MissReason::Degraded);
        }

        let Some(entry) = store.get_mut(&location.filename) else {
            self.sink.debug("Cached file exists but is not registered.");
            return Verdict::Miss(MissReason::Unregistered);
        };

        let mut mtimes = Vec::with_capacity(entry.imports.len() + 1);
        mtimes.push(input.mtime);
        for import in &entry.imports {
            let path = resolve_import(import, self.doc_root, &input.dir);
            match self.fs.exists(&path).then(|| self.fs.modified(&path)) {
                Some(Ok(mtime)) => mtimes.push(mtime),
                _ => {
                    self.sink.emit(
                        Message::debug("Recompiling - an import file has been moved.")
                            .with_note(path.display().to_string()),
                    );
                    return Verdict::Miss(MissReason::ImportMissing {
                        import: import.clone(),
                    });
                }
            }
        }

        let signature = FreshnessSignature::from_mtimes(mtimes);
        let files_changed = entry.signature != signature;
        if files_changed {
            self.sink.debug("Files have been modified. Recompiling.");
        }

        let changed_option = entry
            .options
            .iter()
            .find(|(key, recorded)| active.get(*key).is_some_and(|value| value != *recorded));
        let options_changed = changed_option.is_some();
        if let Some((key, _)) = changed_option {
            self.sink.emit(
                Message::debug("Options have been changed. Recompiling.")
                    .with_note(format!("option '{key}'")),
            );
        }

        if !files_changed && !options_changed {
            self.sink
                .debug("Files and options have not been modified, returning cached file.");
            return Verdict::Hit;
        }

        entry.signature = signature;
        Verdict::Miss(MissReason::Stale {
            files_changed,
            options_changed,
            signature,
        })
    }
}
