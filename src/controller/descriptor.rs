//! Declared shape of a controller type.
//!
//! A [`TypeDescriptor`] lists the methods a controller type exposes together
//! with their parameter and return types. The contract checks run against the
//! descriptor alone, before anything is instantiated or invoked.
//!
//! Dynamic-library controllers report their descriptor as JSON:
//!
//! ```json
//! {
//!   "name": "com.example.Greeting",
//!   "methods": [
//!     { "name": "data", "returns": "map" },
//!     { "name": "set_properties", "params": ["properties"], "returns": "unit" },
//!     { "name": "defaults", "returns": "map", "static": true }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter type of a controller method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// A string-to-string property table.
    Properties,
    /// A single string.
    String,
    /// Any value.
    Any,
}

/// Declared return type of a controller method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    /// A key/value map.
    Map,
    /// Any value; a map may be returned at run time.
    Any,
    /// A single string.
    String,
    /// A sequence of values.
    List,
    /// Nothing.
    Unit,
}

impl ReturnType {
    /// Whether a key/value map can be returned through this type.
    #[must_use]
    pub const fn is_map_assignable(self) -> bool {
        matches!(self, Self::Map | Self::Any)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Map => "map",
            Self::Any => "any",
            Self::String => "string",
            Self::List => "list",
            Self::Unit => "unit",
        };
        f.write_str(name)
    }
}

/// One declared method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamType>,
    pub returns: ReturnType,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl MethodSignature {
    /// A zero-argument instance method.
    pub fn instance(name: impl Into<String>, returns: ReturnType) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns,
            is_static: false,
        }
    }

    /// A zero-argument static method.
    pub fn associated(name: impl Into<String>, returns: ReturnType) -> Self {
        Self {
            is_static: true,
            ..Self::instance(name, returns)
        }
    }

    /// Replace the parameter list.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParamType>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn is_zero_arg(&self) -> bool {
        self.params.is_empty()
    }
}

/// Declared shape of a controller type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully-qualified, dot-separated type name.
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodSignature>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// All overloads declared under `name`.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodSignature> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// The type name without its package.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "name": "com.example.Greeting",
            "methods": [
                { "name": "data", "returns": "map" },
                { "name": "set_properties", "params": ["properties"], "returns": "unit" },
                { "name": "defaults", "returns": "any", "static": true }
            ]
        }"#;

        let descriptor: TypeDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.simple_name(), "Greeting");
        assert_eq!(descriptor.methods.len(), 3);
        assert_eq!(descriptor.methods[0], MethodSignature::instance("data", ReturnType::Map));
        assert_eq!(descriptor.methods[1].params, vec![ParamType::Properties]);
        assert!(descriptor.methods[2].is_static);
    }

    #[test]
    fn test_map_assignability() {
        assert!(ReturnType::Map.is_map_assignable());
        assert!(ReturnType::Any.is_map_assignable());
        assert!(!ReturnType::String.is_map_assignable());
        assert!(!ReturnType::List.is_map_assignable());
        assert!(!ReturnType::Unit.is_map_assignable());
    }
}
