//! Argument parsing for tool dispatch.

use serde_json::{Map, Value};
use tracing::warn;

use super::ToolError;

/// Keyword arguments passed to a capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    /// Parses the provider's serialized arguments.
    ///
    /// Anything that is not a JSON object (malformed text, an array, a bare
    /// string) degrades to an empty argument set.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self(map),
            Ok(other) => {
                warn!(kind = %value_kind(&other), "tool arguments are not an object; using none");
                Self::default()
            }
            Err(e) => {
                warn!(err = %e, "malformed tool arguments; using none");
                Self::default()
            }
        }
    }

    /// A required string argument.
    pub fn str(&self, key: &str) -> Result<&str, ToolError> {
        self.opt_str(key)
            .ok_or_else(|| ToolError::InvalidArgument(format!("missing required argument '{key}'")))
    }

    /// An optional string argument; non-string values count as absent.
    pub fn opt_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// An unsigned integer argument with a fallback. Accepts numeric strings.
    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Whether no arguments were supplied.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
