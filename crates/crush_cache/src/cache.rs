//! High-level cache orchestrator for one build invocation.
//!
//! `BuildCache` ties together the manifest store, the output locator, the
//! staleness evaluator and the writer. It owns the store for the lifetime of
//! the build: loaded on first use, mutated in memory, saved explicitly.

use std::path::{Path, PathBuf};

use crush_common::{resolve_import, FreshnessSignature};
use crush_config::CrushConfig;
use crush_diagnostics::{DiagnosticSink, Message};
use serde_json::Value;

use crate::error::CacheError;
use crate::fs::{Clock, FileSystem, REPAIR_MODE};
use crate::input::InputFile;
use crate::locator::{OutputLocation, OutputLocator};
use crate::manifest::{ArtifactManifest, ManifestStore, CACHE_FILE};
use crate::staleness::{StalenessEvaluator, Verdict};
use crate::writer::Writer;

/// Result of the upstream stylesheet compiler, as handed to the cache.
#[derive(Debug, Clone, Default)]
pub struct CompiledArtifact {
    /// The compiled stylesheet text.
    pub css: String,
    /// Every file imported while compiling, as docroot-relative (`/x.css`)
    /// or input-relative paths.
    pub imports: Vec<String>,
    /// Source map payload, if one was produced.
    pub source_map: Option<Value>,
    /// Compile statistics, if collected.
    pub stats: Option<Value>,
}

/// Cache manager for a single input stylesheet.
pub struct BuildCache<'a> {
    config: &'a CrushConfig,
    input: InputFile,
    fs: &'a dyn FileSystem,
    clock: &'a dyn Clock,
    sink: &'a DiagnosticSink,
    cache_file: PathBuf,
    store: Option<ManifestStore>,
}

impl<'a> BuildCache<'a> {
    /// Prepares the cache for `input`. Nothing is read until first use.
    pub fn new(
        config: &'a CrushConfig,
        input: InputFile,
        fs: &'a dyn FileSystem,
        clock: &'a dyn Clock,
        sink: &'a DiagnosticSink,
    ) -> Self {
        let cache_file = OutputLocator::new(config, &input)
            .output_directory()
            .join(CACHE_FILE);
        Self {
            config,
            input,
            fs,
            clock,
            sink,
            cache_file,
            store: None,
        }
    }

    /// The input this cache manages.
    pub fn input(&self) -> &InputFile {
        &self.input
    }

    /// Path of the cache file.
    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Checks that the output directory exists and is writable, attempting
    /// a permission repair if it is not writable.
    pub fn check_output_dir(&self) -> bool {
        let dir = OutputLocator::new(self.config, &self.input).output_directory();

        if !self.fs.is_dir(&dir) {
            self.sink.warning(format!(
                "Output directory '{}' doesn't exist.",
                dir.display()
            ));
            return false;
        }

        if !self.fs.is_writable(&dir) {
            self.sink.debug("Attempting to change permissions.");
            if let Err(err) = self.fs.set_permissions(&dir, REPAIR_MODE) {
                self.sink.emit(
                    Message::warning(format!(
                        "Output directory '{}' is unwritable.",
                        dir.display()
                    ))
                    .with_note(err.to_string()),
                );
                return false;
            }
            self.sink.debug("Permissions updated.");
        }

        true
    }

    /// The manifest store, loaded on first access.
    pub fn store(&mut self) -> &mut ManifestStore {
        self.loaded().1
    }

    fn loaded(&mut self) -> (&InputFile, &mut ManifestStore) {
        let store = self
            .store
            .get_or_insert_with(|| ManifestStore::load(&self.cache_file, self.fs, self.sink));
        (&self.input, store)
    }

    /// Computes the current output location, URL included.
    pub fn location(&mut self) -> OutputLocation {
        let (config, clock) = (self.config, self.clock);
        let (input, store) = self.loaded();
        OutputLocator::new(config, input).locate(store, clock)
    }

    /// Public URL of the output, versioned with the latest known signature.
    pub fn output_url(&mut self) -> String {
        self.location().url
    }

    /// Decides whether the existing output can be reused with the
    /// configured options.
    pub fn validate(&mut self) -> Verdict {
        let (config, clock, fs, sink) = (self.config, self.clock, self.fs, self.sink);
        let (input, store) = self.loaded();
        let location = OutputLocator::new(config, input).locate(store, clock);
        StalenessEvaluator::new(fs, sink, &config.paths.doc_root).evaluate(
            input,
            &location,
            &config.options,
            store,
        )
    }

    /// Writes a freshly compiled artifact and records it in the store.
    ///
    /// Returns `false` if the output directory is unusable or the main file
    /// could not be written; the store is left untouched in that case. A
    /// failure to save the store afterwards is recorded but still returns
    /// `true`, since the output itself is in place.
    pub fn persist(&mut self, artifact: &CompiledArtifact) -> bool {
        if !self.check_output_dir() {
            return false;
        }

        let (config, clock, fs, sink) = (self.config, self.clock, self.fs, self.sink);
        let (input, store) = self.loaded();
        let location = OutputLocator::new(config, input).locate(store, clock);

        let source_map = artifact
            .source_map
            .as_ref()
            .filter(|_| config.output.source_map);
        let written = Writer::new(fs, sink, &config.output.stat_dump).write(
            &location,
            &artifact.css,
            source_map,
            artifact.stats.as_ref(),
        );
        if !written {
            return false;
        }

        let mut mtimes = vec![input.mtime];
        for import in &artifact.imports {
            let path = resolve_import(import, &config.paths.doc_root, &input.dir);
            match fs.modified(&path) {
                Ok(mtime) => mtimes.push(mtime),
                Err(err) => sink.emit(
                    Message::debug(format!("Import '{import}' has no modification time."))
                        .with_note(err.to_string()),
                ),
            }
        }

        store.insert(
            location.filename,
            ArtifactManifest {
                signature: FreshnessSignature::from_mtimes(mtimes),
                imports: artifact.imports.clone(),
                options: config.options.clone(),
            },
        );
        // Recorded in the sink by `save`.
        let _ = store.save(fs, sink);
        true
    }

    /// Saves the store, if it was loaded.
    pub fn save(&mut self) -> Result<(), CacheError> {
        match &self.store {
            Some(store) => store.save(self.fs, self.sink),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FixedClock, MemoryFileSystem};
    use crate::staleness::MissReason;
    use crush_common::OptionValue;

    fn config(extra: &str) -> CrushConfig {
        let text = format!(
            "[paths]\ndoc_root = \"/srv/www\"\nscript_dir = \"/srv/www\"\n\n{extra}"
        );
        crush_config::load_config_from_str(&text).unwrap()
    }

    fn project() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.add_file("/srv/www/css/a.css", "@import 'b.css';", 100);
        fs.add_file("/srv/www/css/b.css", "b{}", 50);
        fs
    }

    fn artifact() -> CompiledArtifact {
        CompiledArtifact {
            css: "b{}a{}".into(),
            imports: vec!["b.css".into()],
            ..CompiledArtifact::default()
        }
    }

    fn input() -> InputFile {
        InputFile::new("/css/a.css", "/srv/www/css/a.css", 100)
    }

    #[test]
    fn cache_file_lives_in_output_dir() {
        let cfg = config("[output]\ndir = \"/srv/www/build\"\n");
        let fs = project();
        let sink = DiagnosticSink::new();
        let cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);
        assert_eq!(cache.cache_file(), Path::new("/srv/www/build/.csscrush"));
    }

    #[test]
    fn store_is_loaded_once() {
        let cfg = config("");
        let fs = project();
        let sink = DiagnosticSink::new();
        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);
        cache.store().insert(
            "x.crush.css",
            ArtifactManifest {
                signature: FreshnessSignature::new(1),
                imports: vec![],
                options: Default::default(),
            },
        );
        assert!(cache.store().get("x.crush.css").is_some());
        assert_eq!(
            sink.messages()
                .iter()
                .filter(|m| m.message == "Creating cache data file.")
                .count(),
            1
        );
    }

    #[test]
    fn first_compile_then_hit() {
        let cfg = config("[output]\nurl = \"/css\"\n");
        let fs = project();
        let sink = DiagnosticSink::new();

        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);
        assert_eq!(cache.validate(), Verdict::Miss(MissReason::NotCached));
        assert!(cache.persist(&artifact()));
        assert_eq!(cache.output_url(), "/css/a.crush.css?150");

        let mut next = BuildCache::new(&cfg, input(), &fs, &FixedClock(2), &sink);
        assert_eq!(next.validate(), Verdict::Hit);
    }

    #[test]
    fn persist_records_entry_and_saves() {
        let cfg = config("[options]\nminify = true\n");
        let fs = project();
        let sink = DiagnosticSink::new();
        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);
        assert!(cache.persist(&artifact()));

        let saved: Value =
            serde_json::from_str(&fs.contents("/srv/www/css/.csscrush").unwrap()).unwrap();
        assert_eq!(saved["a.crush.css"]["datem_sum"], 150);
        assert_eq!(saved["a.crush.css"]["imports"][0], "b.css");
        assert_eq!(saved["a.crush.css"]["options"]["minify"], true);
        assert_eq!(
            cache.store().get("a.crush.css").unwrap().options["minify"],
            OptionValue::Bool(true)
        );
    }

    #[test]
    fn missing_output_dir_aborts_write_path() {
        let cfg = config("[output]\ndir = \"/srv/www/missing\"\n");
        let fs = project();
        let sink = DiagnosticSink::new();
        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);
        assert!(!cache.check_output_dir());
        assert!(!cache.persist(&artifact()));
        assert!(sink.contains("Output directory '/srv/www/missing' doesn't exist."));
        assert!(fs.contents("/srv/www/missing/a.crush.css").is_none());
    }

    #[test]
    fn unwritable_output_dir_is_repaired() {
        let cfg = config("");
        let fs = project();
        fs.set_read_only("/srv/www/css", true);
        let sink = DiagnosticSink::new();
        let cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);
        assert!(cache.check_output_dir());
        assert!(sink.contains("Permissions updated."));
    }

    #[test]
    fn unrepairable_output_dir_fails() {
        let cfg = config("");
        let fs = project();
        fs.set_read_only("/srv/www/css", true);
        fs.lock_permissions("/srv/www/css");
        let sink = DiagnosticSink::new();
        let cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);
        assert!(!cache.check_output_dir());
        assert!(sink.contains("Output directory '/srv/www/css' is unwritable."));
    }

    #[test]
    fn main_write_failure_leaves_store_untouched() {
        let cfg = config("[output]\nsource_map = true\nstat_dump = true\n");
        let fs = project();
        fs.fail_writes_to("/srv/www/css/a.crush.css");
        let sink = DiagnosticSink::new();
        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);

        let mut art = artifact();
        art.source_map = Some(serde_json::json!({"version": 3}));
        art.stats = Some(serde_json::json!({"rules": 2}));
        assert!(!cache.persist(&art));

        assert!(cache.store().is_empty());
        assert_eq!(fs.contents("/srv/www/css/.csscrush").as_deref(), Some("{}"));
        assert!(fs.contents("/srv/www/css/a.crush.css.map").is_none());
        assert!(fs.contents("/srv/www/css/a.crush.css.json").is_none());
    }

    #[test]
    fn manifest_save_failure_still_reports_success() {
        let cfg = config("");
        let fs = project();
        let sink = DiagnosticSink::new();
        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);
        cache.store();
        fs.fail_writes_to("/srv/www/css/.csscrush");
        assert!(cache.persist(&artifact()));
        assert!(sink.contains("Could not save cache data."));
        assert!(cache.save().is_err());
    }

    #[test]
    fn source_map_disabled_skips_map_and_trailer() {
        let cfg = config("");
        let fs = project();
        let sink = DiagnosticSink::new();
        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);

        let mut art = artifact();
        art.source_map = Some(serde_json::json!({"version": 3}));
        assert!(cache.persist(&art));

        assert_eq!(fs.contents("/srv/www/css/a.crush.css").as_deref(), Some("b{}a{}"));
        assert!(fs.contents("/srv/www/css/a.crush.css.map").is_none());
    }

    #[test]
    fn source_map_enabled_writes_map_and_trailer() {
        let cfg = config("[output]\nsource_map = true\n");
        let fs = project();
        let sink = DiagnosticSink::new();
        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);

        let mut art = artifact();
        art.source_map = Some(serde_json::json!({"version": 3}));
        assert!(cache.persist(&art));

        assert_eq!(
            fs.contents("/srv/www/css/a.crush.css").as_deref(),
            Some("b{}a{}\n/*# sourceMappingURL=a.crush.css.map */")
        );
        assert!(fs.contents("/srv/www/css/a.crush.css.map").is_some());
    }

    #[test]
    fn degraded_store_never_hits() {
        let cfg = config("");
        let fs = project();
        fs.add_file("/srv/www/css/.csscrush", "garbage", 1);
        fs.make_undeletable("/srv/www/css/.csscrush");
        let sink = DiagnosticSink::new();
        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);

        assert!(cache.store().is_degraded());
        assert!(cache.persist(&artifact()));
        assert_eq!(cache.validate(), Verdict::Miss(MissReason::Degraded));
    }

    #[test]
    fn save_without_load_is_noop() {
        let cfg = config("");
        let fs = project();
        let sink = DiagnosticSink::new();
        let mut cache = BuildCache::new(&cfg, input(), &fs, &FixedClock(1), &sink);
        cache.save().unwrap();
        assert!(!fs.exists(Path::new("/srv/www/css/.csscrush")));
    }
}
