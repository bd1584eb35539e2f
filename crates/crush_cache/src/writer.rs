//! Persists compiled output and its side files.

use std::path::{Path, PathBuf};

use crush_config::StatDump;
use crush_diagnostics::{DiagnosticSink, Message};
use serde_json::Value;

use crate::fs::FileSystem;
use crate::locator::OutputLocation;

/// Writes the main output file, then the optional source map and stats dump.
pub struct Writer<'a> {
    fs: &'a dyn FileSystem,
    sink: &'a DiagnosticSink,
    stat_dump: &'a StatDump,
}

impl<'a> Writer<'a> {
    /// Creates a writer with the given stats dump policy.
    pub fn new(fs: &'a dyn FileSystem, sink: &'a DiagnosticSink, stat_dump: &'a StatDump) -> Self {
        Self {
            fs,
            sink,
            stat_dump,
        }
    }

    /// Writes `stream` to the output location.
    ///
    /// With a source map, a `sourceMappingURL` trailer pointing at the
    /// `.map` sibling is appended first. Returns `false` only when the main
    /// file could not be written, in which case nothing else is touched.
    /// Side-file failures are recorded but do not change the result.
    pub fn write(
        &self,
        location: &OutputLocation,
        stream: &str,
        source_map: Option<&Value>,
        stats: Option<&Value>,
    ) -> bool {
        let map_filename = location.source_map_filename();
        let output_path = location.path();

        let mut contents = stream.to_string();
        if source_map.is_some() {
            contents.push_str(&format!("\n/*# sourceMappingURL={map_filename} */"));
        }

        if let Err(err) = self.fs.write(&output_path, &contents) {
            self.sink.emit(
                Message::error("Could not write output file.").with_note(err.to_string()),
            );
            return false;
        }

        if let Some(map) = source_map {
            self.write_json(&location.directory.join(&map_filename), map);
        }

        if let (Some(dest), Some(stats)) = (self.stat_path(&output_path), stats) {
            self.write_json(&dest, stats);
        }

        true
    }

    fn stat_path(&self, output_path: &Path) -> Option<PathBuf> {
        match self.stat_dump {
            StatDump::Disabled => None,
            StatDump::Default => {
                let mut path = output_path.as_os_str().to_owned();
                path.push(".json");
                Some(PathBuf::from(path))
            }
            StatDump::Path(path) => Some(path.clone()),
        }
    }

    fn write_json(&self, path: &Path, payload: &Value) {
        let result = serde_json::to_string_pretty(payload)
            .map_err(|e| e.to_string())
            .and_then(|json| self.fs.write(path, &json).map_err(|e| e.to_string()));
        if let Err(reason) = result {
            self.sink.emit(
                Message::error(format!("Could not write '{}'.", path.display())).with_note(reason),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use serde_json::json;

    fn location() -> OutputLocation {
        OutputLocation {
            directory: PathBuf::from("/out"),
            filename: "a.crush.css".into(),
            url: "/out/a.crush.css".into(),
        }
    }

    fn memory() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.add_dir("/out");
        fs
    }

    #[test]
    fn writes_plain_output() {
        let fs = memory();
        let sink = DiagnosticSink::new();
        let writer = Writer::new(&fs, &sink, &StatDump::Disabled);
        assert!(writer.write(&location(), "a{color:red}", None, Some(&json!({}))));
        assert_eq!(fs.contents("/out/a.crush.css").as_deref(), Some("a{color:red}"));
        assert!(fs.contents("/out/a.crush.css.map").is_none());
        assert!(fs.contents("/out/a.crush.css.json").is_none());
    }

    #[test]
    fn source_map_adds_trailer_and_sibling() {
        let fs = memory();
        let sink = DiagnosticSink::new();
        let writer = Writer::new(&fs, &sink, &StatDump::Disabled);
        let map = json!({"version": 3, "sources": ["a.css"]});
        assert!(writer.write(&location(), "a{}", Some(&map), None));
        assert_eq!(
            fs.contents("/out/a.crush.css").as_deref(),
            Some("a{}\n/*# sourceMappingURL=a.crush.css.map */")
        );
        let written: Value =
            serde_json::from_str(&fs.contents("/out/a.crush.css.map").unwrap()).unwrap();
        assert_eq!(written, map);
    }

    #[test]
    fn stats_default_destination() {
        let fs = memory();
        let sink = DiagnosticSink::new();
        let writer = Writer::new(&fs, &sink, &StatDump::Default);
        assert!(writer.write(&location(), "a{}", None, Some(&json!({"rules": 1}))));
        assert!(fs.contents("/out/a.crush.css.json").is_some());
    }

    #[test]
    fn stats_explicit_destination() {
        let fs = memory();
        fs.add_dir("/stats");
        let sink = DiagnosticSink::new();
        let dump = StatDump::Path(PathBuf::from("/stats/site.json"));
        let writer = Writer::new(&fs, &sink, &dump);
        assert!(writer.write(&location(), "a{}", None, Some(&json!({"rules": 1}))));
        assert!(fs.contents("/stats/site.json").is_some());
        assert!(fs.contents("/out/a.crush.css.json").is_none());
    }

    #[test]
    fn main_write_failure_writes_nothing_else() {
        let fs = memory();
        fs.fail_writes_to("/out/a.crush.css");
        let sink = DiagnosticSink::new();
        let writer = Writer::new(&fs, &sink, &StatDump::Default);
        let ok = writer.write(
            &location(),
            "a{}",
            Some(&json!({"version": 3})),
            Some(&json!({"rules": 1})),
        );
        assert!(!ok);
        assert!(sink.has_errors());
        assert!(fs.contents("/out/a.crush.css.map").is_none());
        assert!(fs.contents("/out/a.crush.css.json").is_none());
    }

    #[test]
    fn sibling_failure_keeps_success() {
        let fs = memory();
        fs.fail_writes_to("/out/a.crush.css.map");
        let sink = DiagnosticSink::new();
        let writer = Writer::new(&fs, &sink, &StatDump::Default);
        let ok = writer.write(
            &location(),
            "a{}",
            Some(&json!({"version": 3})),
            Some(&json!({"rules": 1})),
        );
        assert!(ok);
        assert!(sink.has_errors());
        assert!(fs.contents("/out/a.crush.css.json").is_some());
    }
}
