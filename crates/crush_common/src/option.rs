//! Build option values as recorded in cache manifests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A snapshot of build options keyed by option name.
///
/// A `BTreeMap` keeps the serialized manifest stable between runs.
pub type Options = BTreeMap<String, OptionValue>;

/// A single build option value.
///
/// Option values are restricted to a closed set of primitive kinds so that
/// comparison between a recorded snapshot and the active options never depends
/// on how the snapshot was stored. Equality is strict: `Integer(1)` and
/// `Float(1.0)` are different values.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// A boolean switch such as `minify`.
    Bool(bool),
    /// An integral value.
    Integer(i64),
    /// A non-integral number.
    Float(f64),
    /// A string value. Structured values are carried as their JSON text.
    String(String),
}

impl OptionValue {
    /// Normalizes an untyped JSON value into an option value.
    ///
    /// Returns `None` for `null`, which is treated as "not set". Arrays and
    /// objects are folded into their compact JSON text.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => Some(Self::String(value.to_string())),
        }
    }

    /// Normalizes a whole untyped options object, dropping unset entries.
    pub fn normalize_map(raw: &serde_json::Map<String, Value>) -> Options {
        raw.iter()
            .filter_map(|(key, value)| Self::from_json(value).map(|v| (key.clone(), v)))
            .collect()
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Integer(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
