//! Configuration types deserialized from `crush.toml`.

use crush_common::Options;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// The top-level configuration parsed from `crush.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CrushConfig {
    /// Filesystem roots used to resolve imports and relative URLs.
    pub paths: PathsConfig,
    /// Output naming, location and side-file policy.
    #[serde(default)]
    pub output: OutputConfig,
    /// Active build options, compared against the snapshot in each manifest entry.
    #[serde(default)]
    pub options: Options,
}

/// Filesystem roots.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Document root. Imports starting with `/` resolve against it.
    pub doc_root: PathBuf,
    /// Runtime root. Output URLs for relative input references are computed
    /// relative to this directory.
    pub script_dir: PathBuf,
}

/// Output policy.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output directory. Defaults to the input file's directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Override for the output basename (directories and `.css` are stripped).
    #[serde(default)]
    pub file: Option<String>,
    /// Public URL of the output directory.
    #[serde(default)]
    pub url: String,
    /// Append a cache-busting query string to output URLs.
    #[serde(default = "default_true")]
    pub versioning: bool,
    /// Emit a source map next to the output file.
    #[serde(default)]
    pub source_map: bool,
    /// Where to dump compile statistics, if anywhere.
    ///
    /// Accepts `false`, `true` (next to the output file), or an explicit path.
    #[serde(default, deserialize_with = "deserialize_stat_dump")]
    pub stat_dump: StatDump,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file: None,
            url: String::new(),
            versioning: true,
            source_map: false,
            stat_dump: StatDump::Disabled,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Destination of the optional statistics dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatDump {
    /// No statistics are written.
    #[default]
    Disabled,
    /// Statistics go to `<output path>.json`.
    Default,
    /// Statistics go to an explicit path.
    Path(PathBuf),
}

/// Deserializes `stat_dump = true|false|"path"`.
fn deserialize_stat_dump<'de, D>(deserializer: D) -> Result<StatDump, D::Error>
where
    D: Deserializer<'de>,
{
    struct BoolOrPath;

    impl<'de> Visitor<'de> for BoolOrPath {
        type Value = StatDump;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a boolean or a path string")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(if v { StatDump::Default } else { StatDump::Disabled })
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            if v.is_empty() {
                Ok(StatDump::Disabled)
            } else {
                Ok(StatDump::Path(PathBuf::from(v)))
            }
        }
    }

    deserializer.deserialize_any(BoolOrPath)
}
