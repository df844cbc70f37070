//! Engine-wide context passed to components.

use serde_json::{Map, Value};
use std::sync::Arc;

/// Read-only, cheaply clonable context shared by every dispatch.
///
/// Holds process-scoped values (gateway identity, site labels, ...) that the
/// embedding run loop wants every driver, interceptor and device to see.
/// Unlike [`Attributes`](crate::Attributes), a context is not scoped to one
/// dispatch and is never mutated once handed out.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: Arc<Map<String, Value>>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion. Only use while constructing the context.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.values).insert(key.into(), value.into());
        self
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up a string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }
}
