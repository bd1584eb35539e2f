//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::CrushConfig;
use std::path::Path;

/// Name of the configuration file within a project directory.
pub const CONFIG_FILE: &str = "crush.toml";

/// Loads and validates a `crush.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<CrushConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `crush.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<CrushConfig, ConfigError> {
    let config: CrushConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are consistent.
fn validate_config(config: &CrushConfig) -> Result<(), ConfigError> {
    if config.paths.doc_root.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("paths.doc_root".to_string()));
    }
    if config.paths.script_dir.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("paths.script_dir".to_string()));
    }
    if let Some(file) = &config.output.file {
        if !file.is_empty() && crush_common::css_basename(file).is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "output.file '{file}' has no basename"
            )));
        }
    }
    Ok(())
}
