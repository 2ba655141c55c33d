//! Values exchanged with controllers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::manifest::Properties;

/// Key/value entries returned by a controller method, in insertion order.
///
/// Keys are arbitrary values so that a misbehaving controller can be reported
/// precisely; only string keys are accepted by the result mapper. Serialized
/// as a JSON array of `[key, value]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultMap {
    entries: Vec<(Value, Value)>,
}

impl ResultMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Later entries win when keys repeat.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Builder-style [`ResultMap::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ResultMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(Value, Value)> for ResultMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<serde_json::Map<String, Value>> for ResultMap {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().map(|(k, v)| (Value::String(k), v)).collect()
    }
}

/// Runtime type name of a JSON value, used in key-type diagnostics.
#[must_use]
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Argument passed to a controller method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Argument {
    /// Property table handed to the property setter.
    Properties(Properties),
}
