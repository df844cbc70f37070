//! Read-only view over a configuration table.
//!
//! Configuration documents are parsed elsewhere (see `portico_std::config`)
//! into JSON values. [`Config`] wraps one table of such a document and offers
//! typed accessors. Entry order is preserved.

use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::time::Duration;

/// A configuration table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    table: Map<String, Value>,
}

impl Config {
    /// An empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an existing table.
    pub fn new(table: Map<String, Value>) -> Self {
        Self { table }
    }

    /// Wrap a value that must be a table.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(table) => Ok(Self { table }),
            _ => Err(ConfigError::NotATable("<root>".to_string())),
        }
    }

    /// Whether the table has no keys.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Raw value access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.table.get(key)
    }

    /// Iterate over entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A nested table. Missing keys yield an empty table.
    pub fn child(&self, key: &str) -> Result<Config, ConfigError> {
        match self.table.get(key) {
            None | Some(Value::Null) => Ok(Config::empty()),
            Some(Value::Object(table)) => Ok(Config::new(table.clone())),
            Some(_) => Err(ConfigError::NotATable(key.to_string())),
        }
    }

    /// A string value. Non-string values read as `None`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.table.get(key).and_then(Value::as_str)
    }

    /// A string value, treating the empty string as absent.
    pub fn get_non_empty_str(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    /// A boolean flag. Absent keys read as `false`.
    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        match self.table.get(key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(invalid(key, "a boolean")),
        }
    }

    /// An integer value.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        match self.table.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| invalid(key, "an integer")),
        }
    }

    /// A non-negative integer value with a default.
    pub fn get_usize_or(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        match self.table.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| invalid(key, "a non-negative integer")),
        }
    }

    /// An array of strings. Absent keys yield an empty vector.
    pub fn get_str_array(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        match self.table.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid(key, "an array of strings"))
                })
                .collect(),
            Some(_) => Err(invalid(key, "an array of strings")),
        }
    }

    /// A duration with a default.
    ///
    /// Integers are milliseconds. Strings accept an `ms`, `s` or `m` suffix
    /// (`"500ms"`, `"3s"`, `"1m"`).
    pub fn get_duration_or(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        match self.table.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Duration::from_millis)
                .ok_or_else(|| invalid(key, "a non-negative duration")),
            Some(Value::String(s)) => parse_duration(s).ok_or_else(|| invalid(key, "a duration")),
            Some(_) => Err(invalid(key, "a duration")),
        }
    }
}

fn invalid(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        expected,
    }
}

fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (digits, unit) = match text.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => text.split_at(split),
        None => (text, "ms"),
    };
    let value: u64 = digits.parse().ok()?;
    match unit {
        "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => Some(Duration::from_secs(value.checked_mul(60)?)),
        _ => None,
    }
}

impl From<Map<String, Value>> for Config {
    fn from(table: Map<String, Value>) -> Self {
        Self::new(table)
    }
}
