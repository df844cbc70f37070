//! Configuration document loaders.
//!
//! Both loaders produce a [`Config`] whose tables keep the entry order of the
//! source document, which is the order Registration assembles components in.

use portico_core::{Config, ConfigError};
use serde_json::Value;

/// Parse a TOML document.
pub fn from_toml_str(text: &str) -> Result<Config, ConfigError> {
    let value: Value = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Config::from_value(value)
}

/// Parse a JSON document.
pub fn from_json_str(text: &str) -> Result<Config, ConfigError> {
    let value: Value = serde_json::from_str(text)?;
    Config::from_value(value)
}
