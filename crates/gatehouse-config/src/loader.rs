//! Config loading: embedded defaults with an optional file merged on top.
//!
//! The algorithm:
//! 1. Parse the embedded `defaults.toml` → base tree
//! 2. Merge the deployment file over it, if one was given
//! 3. Deserialize the merged tree → [`GatewayConfig`]
//! 4. Validate
//!
//! Tables merge recursively; scalars and arrays from the overlay replace the
//! base value. Replacing arrays means a deployment that touches `[[tools]]`
//! owns the whole catalog, which beats silently mixing stock entries into a
//! curated one.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::GatewayConfig;
use crate::validate::validate;

/// Embedded default configuration, including the stock tool catalog.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Load the configuration, merging `path` over the embedded defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, either layer fails
/// to parse, or the merged configuration fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<GatewayConfig> {
    let mut merged = parse_value(DEFAULTS_TOML, "<embedded defaults>")?;

    if let Some(path) = path {
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: display.clone(),
            source,
        })?;
        let overlay = parse_value(&text, &display)?;
        merge_value(&mut merged, overlay);
        info!(path = %display, "loaded config file");
    } else {
        debug!("no config file given, using embedded defaults");
    }

    finish(merged, path)
}

/// Load the embedded defaults alone.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the embedded defaults are malformed; that is
/// a build defect, caught by the crate's own tests.
pub fn load_default() -> ConfigResult<GatewayConfig> {
    load(None)
}

/// Parse `text` as a complete overlay over the embedded defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if either layer fails to parse or the merged
/// configuration fails validation.
pub fn load_str(text: &str) -> ConfigResult<GatewayConfig> {
    let mut merged = parse_value(DEFAULTS_TOML, "<embedded defaults>")?;
    let overlay = parse_value(text, "<inline>")?;
    merge_value(&mut merged, overlay);
    finish(merged, None)
}

fn parse_value(text: &str, path: &str) -> ConfigResult<toml::Value> {
    toml::from_str(text).map_err(|source| ConfigError::ParseError {
        path: path.to_string(),
        source,
    })
}

fn finish(merged: toml::Value, path: Option<&Path>) -> ConfigResult<GatewayConfig> {
    let config: GatewayConfig = merged.try_into().map_err(|source| ConfigError::ParseError {
        path: path.map_or_else(|| "<merged config>".to_string(), |p| p.display().to_string()),
        source,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Merge `overlay` into `base`. Tables merge key-by-key; everything else
/// (scalars, arrays) replaces the base value.
fn merge_value(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(base_value) => merge_value(base_value, overlay_value),
                    None => {
                        base_table.insert(key, overlay_value);
                    },
                }
            }
        },
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}
