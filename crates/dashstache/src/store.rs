//! The hierarchical data store a template renders against.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::{DashstacheError, Result};
use crate::value::Value;

/// One step of a path into the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// A path into the store: keys, each optionally followed by list indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ResolvedPath {
    steps: Vec<PathStep>,
}

impl ResolvedPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse dotted text. All-digit segments become list indices.
    pub fn parse(dotted: &str) -> Self {
        let steps = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<usize>() {
                Ok(i) if s.bytes().all(|b| b.is_ascii_digit()) => PathStep::Index(i),
                _ => PathStep::Key(s.to_string()),
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// The keys of the path, without indices.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| match step {
            PathStep::Key(k) => Some(k.as_str()),
            PathStep::Index(_) => None,
        })
    }

    /// The list indices of the path, in order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().filter_map(|step| match step {
            PathStep::Index(i) => Some(*i),
            PathStep::Key(_) => None,
        })
    }

    /// The first `len` steps followed by `tail`.
    pub fn prefix_join(&self, len: usize, tail: &[PathStep]) -> Self {
        let mut steps = self.steps[..len.min(self.steps.len())].to_vec();
        steps.extend_from_slice(tail);
        Self { steps }
    }

    /// Length of the prefix left after dropping the last key together
    /// with the indices that follow it.
    pub fn parent_len(&self, len: usize) -> usize {
        let mut len = len.min(self.steps.len());
        while len > 0 && matches!(self.steps[len - 1], PathStep::Index(_)) {
            len -= 1;
        }
        len.saturating_sub(1)
    }

    pub fn with_index(&self, index: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Index(index));
        Self { steps }
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match step {
                PathStep::Key(k) => f.write_str(k)?,
                PathStep::Index(n) => write!(f, "{n}")?,
            }
        }
        Ok(())
    }
}

/// Read side of the data store, rooted at a mapping.
///
/// The renderer only ever reads it; updates come from whatever keeps the
/// store in sync with the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStore {
    root: Value,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            root: Value::empty_mapping(),
        }
    }

    /// Build a store from a JSON object.
    pub fn from_json(json: JsonValue) -> Result<Self> {
        match json {
            JsonValue::Object(_) => Ok(Self {
                root: Value::from_json(json),
            }),
            other => Err(DashstacheError::Data {
                message: format!("Root data must be an object, got {}", json_type(&other)),
            }),
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Follow `steps` from the root.
    ///
    /// A key applied to a list reads the list's first element. An index
    /// applied to a mapping reads the key with that number.
    pub fn get(&self, steps: &[PathStep]) -> Option<&Value> {
        let mut current = &self.root;
        for step in steps {
            current = match (step, current) {
                (PathStep::Key(key), value) => value.get_key(key)?,
                (PathStep::Index(i), Value::List(items)) => items.get(*i)?,
                (PathStep::Index(i), Value::Mapping(map)) => map.get(&i.to_string())?,
                (PathStep::Index(_), Value::Scalar(_)) => return None,
            };
        }
        Some(current)
    }

    pub fn get_dotted(&self, dotted: &str) -> Option<&Value> {
        self.get(ResolvedPath::parse(dotted).steps())
    }

    /// Set the value at a dotted path, creating mappings on the way.
    ///
    /// Existing lists are never replaced: an index past the end of a list,
    /// or a key applied to a list, is a `Data` error.
    pub fn set_dotted(&mut self, dotted: &str, value: impl Into<Value>) -> Result<()> {
        let path = ResolvedPath::parse(dotted);
        let mut current = &mut self.root;
        for step in path.steps() {
            current = child_mut(current, step, dotted)?;
        }
        *current = value.into();
        Ok(())
    }

    /// Deep-merge an incoming JSON update into the store.
    pub fn merge_json(&mut self, update: JsonValue) -> Result<()> {
        if !update.is_object() {
            return Err(DashstacheError::Data {
                message: format!("Update must be an object, got {}", json_type(&update)),
            });
        }
        self.root.merge(Value::from_json(update));
        Ok(())
    }
}

fn child_mut<'v>(current: &'v mut Value, step: &PathStep, dotted: &str) -> Result<&'v mut Value> {
    match current {
        Value::List(items) => match step {
            PathStep::Index(i) => {
                let len = items.len();
                items.get_mut(*i).ok_or_else(|| DashstacheError::Data {
                    message: format!("Index {i} out of range for list of {len} in '{dotted}'"),
                })
            }
            PathStep::Key(key) => Err(DashstacheError::Data {
                message: format!("Cannot set key '{key}' on a list in '{dotted}'"),
            }),
        },
        other => {
            let key = match step {
                PathStep::Key(key) => key.clone(),
                PathStep::Index(i) => i.to_string(),
            };
            Ok(other
                .mapping_mut()
                .entry(key)
                .or_insert_with(Value::empty_mapping))
        }
    }
}

fn json_type(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
