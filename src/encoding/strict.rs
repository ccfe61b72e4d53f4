//! Closed-schema object decoding
//!
//! Every mapping node of a document is read through [`StrictObject`], which
//! is given the node's [`Schema`] up front. Opening an object rejects keys
//! outside the schema and required fields that are absent or empty, so the
//! per-type decoders only deal with well-formed nodes.

use crate::errors::DecodeError;
use crate::object::Labels;
use serde_yaml::{Mapping, Value};

/// Path label of the document root
pub const ROOT: &str = "(root)";

/// One known key of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Key as written in the input
    pub name: &'static str,
    /// Whether the key must carry a non-empty value
    pub required: bool,
}

impl Field {
    /// A key that must be present and non-empty
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    /// A key that may be omitted
    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }
}

/// The closed key set of one node type
pub type Schema = &'static [Field];

/// Appends `key` to `parent`
pub fn join_path(parent: &str, key: impl std::fmt::Display) -> String {
    if parent == ROOT {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "~".to_string(),
        other => format!("{other:?}"),
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Tagged(tagged) => is_zero(&tagged.value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Reads a scalar as text
///
/// Numbers and booleans are accepted and rendered in their canonical form,
/// so `port: 8080` and `port: "8080"` decode the same.
pub fn scalar_string(value: &Value, path: &str) -> Result<String, DecodeError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value, path),
        _ => Err(DecodeError::InvalidType {
            path: path.to_string(),
            expected: "a scalar",
        }),
    }
}

/// A mapping node that passed its schema check
#[derive(Debug)]
pub struct StrictObject<'a> {
    path: String,
    map: &'a Mapping,
}

impl<'a> StrictObject<'a> {
    /// Opens `node` against `schema`
    ///
    /// # Errors
    ///
    /// Fails when `node` is not a mapping, carries keys outside `schema`
    /// (all of them are listed), or lacks a required field.
    pub fn open(node: &'a Value, path: &str, schema: Schema) -> Result<Self, DecodeError> {
        let Value::Mapping(map) = node else {
            return Err(DecodeError::InvalidType {
                path: path.to_string(),
                expected: "a mapping",
            });
        };

        let excess: Vec<String> = map
            .keys()
            .filter(|key| {
                key.as_str()
                    .is_none_or(|name| !schema.iter().any(|f| f.name == name))
            })
            .map(key_text)
            .collect();
        if !excess.is_empty() {
            return Err(DecodeError::ExcessKeys {
                path: path.to_string(),
                keys: excess,
            });
        }

        for field in schema.iter().filter(|f| f.required) {
            if map.get(field.name).is_none_or(is_zero) {
                return Err(DecodeError::MissingField {
                    path: path.to_string(),
                    field: field.name,
                });
            }
        }

        Ok(Self {
            path: path.to_string(),
            map,
        })
    }

    /// Path of this node
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of one of this node's fields
    pub fn field_path(&self, key: &str) -> String {
        join_path(&self.path, key)
    }

    /// Raw value of `key`; an explicit null counts as absent
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Whether `key` carries a value, empty or not
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Counts how many of `keys` carry a value
    pub fn count_present(&self, keys: &[&str]) -> usize {
        keys.iter().filter(|key| self.has(key)).count()
    }

    /// Optional scalar as text
    pub fn string(&self, key: &str) -> Result<Option<String>, DecodeError> {
        self.get(key)
            .map(|value| scalar_string(value, &self.field_path(key)))
            .transpose()
    }

    /// Required scalar as text
    ///
    /// Presence was checked on open; this only reads it.
    pub fn required_string(&self, key: &'static str) -> Result<String, DecodeError> {
        self.string(key)?.ok_or_else(|| DecodeError::MissingField {
            path: self.path.clone(),
            field: key,
        })
    }

    /// Optional boolean
    pub fn bool(&self, key: &str) -> Result<Option<bool>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(DecodeError::InvalidType {
                path: self.field_path(key),
                expected: "a boolean",
            }),
        }
    }

    /// Optional 32-bit integer
    pub fn i32(&self, key: &str) -> Result<Option<i32>, DecodeError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| DecodeError::InvalidType {
                    path: self.field_path(key),
                    expected: "a 32-bit integer",
                }),
        }
    }

    /// Items of an optional sequence, each paired with its path
    pub fn sequence(&self, key: &str) -> Result<Vec<(String, &'a Value)>, DecodeError> {
        let path = self.field_path(key);
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Sequence(items)) => Ok(items
                .iter()
                .enumerate()
                .map(|(i, item)| (join_path(&path, i), item))
                .collect()),
            Some(_) => Err(DecodeError::InvalidType {
                path,
                expected: "a sequence",
            }),
        }
    }

    /// Optional string-to-string mapping
    pub fn string_map(&self, key: &str) -> Result<Labels, DecodeError> {
        let path = self.field_path(key);
        match self.get(key) {
            None => Ok(Labels::new()),
            Some(Value::Mapping(map)) => map
                .iter()
                .map(|(k, v)| {
                    let k = scalar_string(k, &path)?;
                    let v = if v.is_null() {
                        String::new()
                    } else {
                        scalar_string(v, &join_path(&path, &k))?
                    };
                    Ok((k, v))
                })
                .collect(),
            Some(_) => Err(DecodeError::InvalidType {
                path,
                expected: "a mapping",
            }),
        }
    }
}
