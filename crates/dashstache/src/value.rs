//! Data store values.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// A node of the data store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    List(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

/// Scalars that count as "nothing here" for sections.
pub fn is_falsy_scalar(s: &str) -> bool {
    matches!(s, "" | "0" | "n" | "N")
}

impl Value {
    pub fn scalar(s: impl Into<String>) -> Self {
        Value::Scalar(s.into())
    }

    pub fn empty_mapping() -> Self {
        Value::Mapping(IndexMap::new())
    }

    /// Convert JSON into a store value.
    ///
    /// Numbers keep their decimal text, booleans become `"1"` / `"0"` and
    /// `null` becomes an empty scalar.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Scalar(String::new()),
            JsonValue::Bool(b) => Value::Scalar(if b { "1" } else { "0" }.to_string()),
            JsonValue::Number(n) => Value::Scalar(n.to_string()),
            JsonValue::String(s) => Value::Scalar(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(obj) => Value::Mapping(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// How many times a section bound to this value repeats.
    pub fn iteration_count(&self) -> usize {
        match self {
            Value::List(items) => items.len(),
            Value::Scalar(s) if is_falsy_scalar(s) => 0,
            Value::Scalar(_) | Value::Mapping(_) => 1,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Look up a key, reading through lists to their first element.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(map) => map.get(key),
            Value::List(items) => items.first()?.get_key(key),
            Value::Scalar(_) => None,
        }
    }

    /// Deep-merge `other` into `self`. Mappings merge key by key,
    /// anything else replaces.
    pub fn merge(&mut self, other: Value) {
        match (self, other) {
            (Value::Mapping(existing), Value::Mapping(incoming)) => {
                for (key, value) in incoming {
                    match existing.get_mut(&key) {
                        Some(slot) => slot.merge(value),
                        None => {
                            existing.insert(key, value);
                        }
                    }
                }
            }
            (slot, other) => *slot = other,
        }
    }

    /// The mapping inside this value, replacing a non-mapping with an
    /// empty one first.
    pub(crate) fn mapping_mut(&mut self) -> &mut IndexMap<String, Value> {
        if !matches!(self, Value::Mapping(_)) {
            *self = Value::empty_mapping();
        }
        match self {
            Value::Mapping(map) => map,
            _ => unreachable!("value was just replaced by a mapping"),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::List(_) => "list",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Value::from_json(json)
    }
}
