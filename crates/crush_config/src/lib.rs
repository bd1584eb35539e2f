//! Parsing and validation of `crush.toml` configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`CrushConfig`] describing the project roots, the output naming policy,
//! and the active build options recorded in cache manifests.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
