//! The configuration node model shared by the parser, renderer, trees and the
//! convergence engine.

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

/// An ordered mapping from key to node. Insertion order is kept so rendered
/// files stay stable; equality ignores order.
pub type Object = IndexMap<String, ConfigValue>;

/// A node in a configuration tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum ConfigValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Verbatim HOCON text, written out byte-for-byte by the renderer.
    Raw(String),
    Array(Vec<ConfigValue>),
    Object(Object),
}

impl ConfigValue {
    /// Short name of the node's runtime shape, used in type-mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Boolean(_) => "boolean",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::Raw(_) => "text",
            ConfigValue::Array(_) => "array",
            ConfigValue::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) | ConfigValue::Raw(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<ConfigValue>> {
        match self {
            ConfigValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<ConfigValue>> {
        match self {
            ConfigValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Recursively flatten nested arrays into their leaf elements.
    ///
    /// `[1, [2, [3]]]` yields `[1, 2, 3]`. A non-array yields itself.
    pub fn flattened(&self) -> Vec<&ConfigValue> {
        let mut out = Vec::new();
        flatten_into(self, &mut out);
        out
    }
}

fn flatten_into<'a>(value: &'a ConfigValue, out: &mut Vec<&'a ConfigValue>) {
    match value {
        ConfigValue::Array(items) => items.iter().for_each(|item| flatten_into(item, out)),
        other => out.push(other),
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        use ConfigValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Integer(i), Float(f)) | (Float(f), Integer(i)) => (*i as f64) == *f,
            (String(a), String(b)) => a == b,
            (Raw(a), Raw(b)) => a.trim() == b.trim(),
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            _ => false,
        }
    }
}

/// Compact single-line form used in change descriptions.
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => f.write_str("null"),
            ConfigValue::Boolean(b) => write!(f, "{b}"),
            ConfigValue::Integer(i) => write!(f, "{i}"),
            ConfigValue::Float(x) => write!(f, "{x:?}"),
            ConfigValue::String(s) | ConfigValue::Raw(s) => f.write_str(s),
            ConfigValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ConfigValue::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(b) => ConfigValue::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ConfigValue::Integer(i),
                None => ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => ConfigValue::String(s),
            serde_json::Value::Array(items) => {
                ConfigValue::Array(items.into_iter().map(ConfigValue::from).collect())
            }
            serde_json::Value::Object(map) => ConfigValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Boolean(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<i32> for ConfigValue {
    fn from(i: i32) -> Self {
        ConfigValue::Integer(i64::from(i))
    }
}

impl From<f64> for ConfigValue {
    fn from(x: f64) -> Self {
        ConfigValue::Float(x)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(items: Vec<T>) -> Self {
        ConfigValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Object> for ConfigValue {
    fn from(map: Object) -> Self {
        ConfigValue::Object(map)
    }
}
