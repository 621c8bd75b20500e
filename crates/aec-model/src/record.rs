//! Nested product records and their flat, dotted-path form.
//!
//! [`ProductRecord::flatten`] and [`FlatRecord::unflatten`] are the two halves
//! of the mapping between the API's nested JSON objects and table rows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AecError, Result};
use crate::value::CellValue;

/// Separator between the segments of a column path.
pub const PATH_SEPARATOR: char = '.';

/// One product as returned by the catalog API: a JSON object whose key
/// order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductRecord(Map<String, Value>);

impl ProductRecord {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(AecError::UnsupportedInputType {
                found: json_kind(&other).to_string(),
            }),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a value by dotted path, e.g. `material_facts.declared_unit`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split(PATH_SEPARATOR);
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Flatten into dotted-path leaves, depth first, in key order.
    ///
    /// Lists are leaves. Empty objects produce no entry.
    pub fn flatten(&self) -> FlatRecord {
        let mut entries = Vec::new();
        flatten_into("", &self.0, &mut entries);
        FlatRecord { entries }
    }
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, CellValue)>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{PATH_SEPARATOR}{key}")
        };
        match value {
            Value::Object(child) => flatten_into(&path, child, out),
            leaf => out.push((path, CellValue::from_json(leaf))),
        }
    }
}

/// Name of the JSON type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered `(path, value)` pairs of one flattened record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    entries: Vec<(String, CellValue)>,
}

/// Result of rebuilding a nested record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unflattened {
    pub record: ProductRecord,
    /// Non-null paths skipped because they would nest under an existing
    /// scalar value or replace an existing mapping with a scalar.
    pub conflicts: Vec<String>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, value: CellValue) {
        self.entries.push((path.into(), value));
    }

    pub fn entries(&self) -> &[(String, CellValue)] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&CellValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == path)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the nested record by splitting every path on `.`.
    ///
    /// Null leaves are kept; pruning is a separate step. A null placeholder
    /// is replaced by a mapping when a deeper path needs it, and a null
    /// nested under a scalar is dropped silently.
    pub fn unflatten(&self) -> Unflattened {
        let mut root = Map::new();
        let mut conflicts = Vec::new();
        for (path, value) in &self.entries {
            let parts: Vec<&str> = path.split(PATH_SEPARATOR).collect();
            let Some((leaf, parents)) = parts.split_last() else {
                continue;
            };
            let Some(parent) = descend(&mut root, parents) else {
                if !value.is_null() {
                    conflicts.push(path.clone());
                }
                continue;
            };
            match parent.get(*leaf) {
                Some(Value::Object(_)) if value.is_null() => {}
                Some(Value::Object(_)) => conflicts.push(path.clone()),
                _ => {
                    parent.insert((*leaf).to_string(), value.to_json());
                }
            }
        }
        Unflattened {
            record: ProductRecord(root),
            conflicts,
        }
    }
}

impl FromIterator<(String, CellValue)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn descend<'a>(root: &'a mut Map<String, Value>, parents: &[&str]) -> Option<&'a mut Map<String, Value>> {
    let mut current = root;
    for part in parents {
        let slot = current
            .entry(*part)
            .or_insert_with(|| Value::Object(Map::new()));
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        current = slot.as_object_mut()?;
    }
    Some(current)
}
