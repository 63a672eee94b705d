//! Configuration module.
//!
//! Handles loading, validating, and merging `catmd.toml`. Stock defaults are
//! the base layer; a config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! `catmd.toml` is looked up in the scope directory, or given explicitly with
//! `--config`:
//!
//! ```text
//! docs/
//! ├── catmd.toml       # Applies to runs scoped to docs/
//! ├── index.md
//! └── guide/
//!     └── setup.md
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! extensions = ["md", "markdown"]  # Files followed by traversal
//! separator = "\n\n"               # Written between documents
//!
//! [footnotes]
//! trim_trailing_period = true      # "See more." inlines as "(See more)"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the scope directory.
pub const CONFIG_FILE_NAME: &str = "catmd.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `catmd.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// File extensions (no leading dot) treated as markdown documents.
    pub extensions: Vec<String>,
    /// Text written between consecutive documents in the output.
    pub separator: String,
    /// Footnote inlining settings.
    pub footnotes: FootnotesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "markdown".to_string()],
            separator: "\n\n".to_string(),
            footnotes: FootnotesConfig::default(),
        }
    }
}

impl Config {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        for ext in &self.extensions {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(ConfigError::Validation(format!(
                    "extension {ext:?} must be non-empty and have no leading dot"
                )));
            }
        }
        Ok(())
    }
}

/// Footnote inlining settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FootnotesConfig {
    /// Drop a single trailing `.` from inlined footnote content.
    pub trim_trailing_period: bool,
}

impl Default for FootnotesConfig {
    fn default() -> Self {
        Self {
            trim_trailing_period: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `catmd.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    read_toml(&config_path).map(Some)
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `catmd.toml` in the given directory, or the defaults.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    resolve_config(load_raw_config(dir)?)
}

/// Load config from an explicit file, which must exist.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    resolve_config(Some(read_toml(path)?))
}

/// Returns a fully-commented stock `catmd.toml`.
///
/// Used by the `--gen-config` flag.
pub fn stock_config_toml() -> &'static str {
    r##"# catmd Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as catmd.toml in the scope directory (by default the
# directory of the root document), or pass it with --config.
# Unknown keys will cause an error.

# File extensions (without the dot) treated as markdown documents.
# Links to other files are left as written and never followed.
extensions = ["md", "markdown"]

# Text written between consecutive documents in the output.
separator = "\n\n"

# ---------------------------------------------------------------------------
# Footnotes
# ---------------------------------------------------------------------------
[footnotes]
# Footnote references are replaced with their content in parentheses.
# When true, a single trailing period is dropped from the content, so
# "Text[^1]." with "[^1]: See more." becomes "Text (See more).".
trim_trailing_period = true
"##
}
