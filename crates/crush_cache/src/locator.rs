//! Output file naming, directory selection and public URLs.

use std::path::{Path, PathBuf};

use crush_common::{css_basename, is_relative_reference, link_between_paths};
use crush_config::CrushConfig;

use crate::fs::Clock;
use crate::input::InputFile;
use crate::manifest::ManifestStore;

/// Suffix appended to every output basename.
pub const OUTPUT_SUFFIX: &str = ".crush.css";

/// Where the compiled output of one input lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    /// Directory the output is written to.
    pub directory: PathBuf,
    /// Output file name, e.g. `site.crush.css`.
    pub filename: String,
    /// Public URL of the output, including any cache-busting query.
    pub url: String,
}

impl OutputLocation {
    /// Full path of the output file.
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }

    /// File name of the source map sibling.
    pub fn source_map_filename(&self) -> String {
        format!("{}.map", self.filename)
    }
}

/// Builds the output file name from the input basename and an optional
/// override. A non-empty override wins; `.css` is stripped from either.
pub fn output_file_name(input_basename: &str, override_basename: Option<&str>) -> String {
    let base = match override_basename.map(css_basename) {
        Some(name) if !name.is_empty() => name,
        _ => css_basename(input_basename),
    };
    format!("{base}{OUTPUT_SUFFIX}")
}

/// Derives output names and URLs from configuration and the input reference.
pub struct OutputLocator<'a> {
    config: &'a CrushConfig,
    input: &'a InputFile,
}

impl<'a> OutputLocator<'a> {
    /// Creates a locator for one input.
    pub fn new(config: &'a CrushConfig, input: &'a InputFile) -> Self {
        Self { config, input }
    }

    /// The configured output directory, or the input's own directory.
    pub fn output_directory(&self) -> PathBuf {
        match &self.config.output.dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => self.input.dir.clone(),
        }
    }

    /// The output file name for this input.
    pub fn output_file_name(&self) -> String {
        output_file_name(self.input.filename(), self.config.output.file.as_deref())
    }

    /// The public URL of the output file.
    ///
    /// Relative input references produce a URL relative to the runtime root
    /// (`paths.script_dir`); absolute ones are joined onto `output.url`. With
    /// versioning enabled, the recorded signature is appended as a query, or
    /// the current time when the output has no manifest entry yet.
    pub fn output_url(
        &self,
        directory: &Path,
        filename: &str,
        store: &ManifestStore,
        clock: &dyn Clock,
    ) -> String {
        let mut url = if is_relative_reference(&self.input.raw) {
            let link = link_between_paths(&self.config.paths.script_dir, directory);
            format!("{link}{filename}")
        } else {
            format!(
                "{}/{filename}",
                self.config.output.url.trim_end_matches('/')
            )
        };

        if self.config.output.versioning {
            let version = match store.get(filename) {
                Some(entry) => entry.signature.value(),
                None => clock.now_secs(),
            };
            url.push('?');
            url.push_str(&version.to_string());
        }
        url
    }

    /// Computes the full output location.
    pub fn locate(&self, store: &ManifestStore, clock: &dyn Clock) -> OutputLocation {
        let directory = self.output_directory();
        let filename = self.output_file_name();
        let url = self.output_url(&directory, &filename, store, clock);
        OutputLocation {
            directory,
            filename,
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FixedClock;
    use crate::manifest::ArtifactManifest;
    use crush_common::{FreshnessSignature, Options};

    fn config(extra: &str) -> CrushConfig {
        let text = format!(
            "[paths]\ndoc_root = \"/srv/www\"\nscript_dir = \"/srv/www/app\"\n\n{extra}"
        );
        crush_config::load_config_from_str(&text).unwrap()
    }

    fn store_with(name: &str, sum: u64) -> ManifestStore {
        let mut store = ManifestStore::empty("/srv/www/css/.csscrush");
        store.insert(
            name,
            ArtifactManifest {
                signature: FreshnessSignature::new(sum),
                imports: Vec::new(),
                options: Options::new(),
            },
        );
        store
    }

    #[test]
    fn file_name_from_input() {
        assert_eq!(output_file_name("site.css", None), "site.crush.css");
        assert_eq!(output_file_name("site.css", Some("")), "site.crush.css");
    }

    #[test]
    fn file_name_override_wins() {
        assert_eq!(
            output_file_name("site.css", Some("build/bundle.css")),
            "bundle.crush.css"
        );
        assert_eq!(output_file_name("site.css", Some("bundle")), "bundle.crush.css");
    }

    #[test]
    fn directory_defaults_to_input_dir() {
        let cfg = config("");
        let input = InputFile::new("/css/site.css", "/srv/www/css/site.css", 1);
        let locator = OutputLocator::new(&cfg, &input);
        assert_eq!(locator.output_directory(), PathBuf::from("/srv/www/css"));
    }

    #[test]
    fn directory_from_config() {
        let cfg = config("[output]\ndir = \"/srv/www/build\"\n");
        let input = InputFile::new("/css/site.css", "/srv/www/css/site.css", 1);
        let locator = OutputLocator::new(&cfg, &input);
        assert_eq!(locator.output_directory(), PathBuf::from("/srv/www/build"));
    }

    #[test]
    fn absolute_input_uses_configured_url_root() {
        let cfg = config("[output]\nurl = \"/css/\"\n");
        let input = InputFile::new("/css/site.css", "/srv/www/css/site.css", 1);
        let loc = OutputLocator::new(&cfg, &input)
            .locate(&store_with("site.crush.css", 150), &FixedClock(9));
        assert_eq!(loc.url, "/css/site.crush.css?150");
    }

    #[test]
    fn relative_input_uses_runtime_root() {
        let cfg = config("[output]\nurl = \"/css\"\n");
        let input = InputFile::new("../css/site.css", "/srv/www/css/site.css", 1);
        let loc = OutputLocator::new(&cfg, &input)
            .locate(&store_with("site.crush.css", 150), &FixedClock(9));
        assert_eq!(loc.url, "../css/site.crush.css?150");
    }

    #[test]
    fn relative_input_in_runtime_root() {
        let cfg = config("[output]\nurl = \"/app\"\n");
        let input = InputFile::new("site.css", "/srv/www/app/site.css", 1);
        let loc = OutputLocator::new(&cfg, &input)
            .locate(&store_with("site.crush.css", 150), &FixedClock(9));
        assert_eq!(loc.url, "site.crush.css?150");
    }

    #[test]
    fn unknown_signature_falls_back_to_clock() {
        let cfg = config("[output]\nurl = \"/css\"\n");
        let input = InputFile::new("/css/site.css", "/srv/www/css/site.css", 1);
        let store = ManifestStore::empty("/srv/www/css/.csscrush");
        let loc = OutputLocator::new(&cfg, &input).locate(&store, &FixedClock(1_700_000_000));
        assert_eq!(loc.url, "/css/site.crush.css?1700000000");
    }

    #[test]
    fn versioning_disabled_has_no_query() {
        let cfg = config("[output]\nurl = \"/css\"\nversioning = false\n");
        let input = InputFile::new("/css/site.css", "/srv/www/css/site.css", 1);
        let loc = OutputLocator::new(&cfg, &input)
            .locate(&store_with("site.crush.css", 150), &FixedClock(9));
        assert_eq!(loc.url, "/css/site.crush.css");
    }

    #[test]
    fn location_paths() {
        let cfg = config("");
        let input = InputFile::new("/css/site.css", "/srv/www/css/site.css", 1);
        let store = ManifestStore::empty("/srv/www/css/.csscrush");
        let loc = OutputLocator::new(&cfg, &input).locate(&store, &FixedClock(1));
        assert_eq!(loc.path(), PathBuf::from("/srv/www/css/site.crush.css"));
        assert_eq!(loc.source_map_filename(), "site.crush.css.map");
    }
}
