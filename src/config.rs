//! Run settings.
//!
//! Settings live in an optional TOML file (by default `augment.toml` next
//! to the chain configuration). Stock defaults are the base layer; the
//! user file is merged on top, then command-line flags override both.
//!
//! ## Settings
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_dir = "Output"     # Output root; an existing one is moved to Output_<k>
//!
//! [encoding]
//! jpeg_quality = 95         # JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! seed = 42                 # Fixes noise output (omit for OS entropy)
//! ```
//!
//! Settings files are sparse: override just the values you want. Unknown
//! keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up next to the chain configuration.
pub const SETTINGS_FILE_NAME: &str = "augment.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Run settings loaded from `augment.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Output root directory name.
    pub output_dir: String,
    /// Encoder settings.
    pub encoding: EncodingConfig,
    /// Parallelism and randomness.
    pub processing: ProcessingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: "Output".to_string(),
            encoding: EncodingConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl RunConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_dir must not be empty".into(),
            ));
        }
        if !(1..=100).contains(&self.encoding.jpeg_quality) {
            return Err(ConfigError::Validation(
                "encoding.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub jpeg_quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self { jpeg_quality: 95 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Base seed for noise. Each output derives its own seed from it.
    pub seed: Option<u64>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(RunConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults: {e}")))
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

/// Load a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RunConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RunConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load settings from `path`, merged over stock defaults.
///
/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `augment.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# batch-augment settings
# ======================
#
# Place this file next to your chain configuration as `augment.toml`, or
# pass it with `--settings`. Every key is optional; the values below are
# the defaults. Command-line flags override this file.

# Output root. If it already exists it is moved to `<output_dir>_<k>`
# (lowest free k) before a fresh, empty directory is created.
output_dir = "Output"

[encoding]
# JPEG quality (1-100), used when the source image is a .jpg/.jpeg.
# Other formats are written losslessly.
jpeg_quality = 95

[processing]
# Maximum number of images processed in parallel.
# Omit to use every CPU core. Larger values are clamped to the core count.
# max_processes = 4

# Base seed for the `noise` operation. With a seed, each output file gets a
# reproducible random stream. Omit for fresh randomness on every run.
# seed = 42
"##
}
