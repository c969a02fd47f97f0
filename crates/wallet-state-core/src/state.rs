//! Persisted state tree
//!
//! A snapshot is a JSON object whose top-level keys are feature slices
//! (`account`, `app`, `identity`, ...) plus the `_persist` bookkeeping entry.
//! A field that the application left undefined is simply absent; `null` is a
//! real value and is kept as such.

use crate::{MigrationError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level key holding the persistence metadata
pub const PERSIST_KEY: &str = "_persist";

/// Version of a snapshot that carries no version tag
pub const UNVERSIONED: i64 = -1;

/// Persistence metadata stored under `_persist`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistMeta {
    /// Schema version of the snapshot
    pub version: i64,
    /// Whether the snapshot was produced by a completed rehydration
    #[serde(default)]
    pub rehydrated: bool,
}

/// A persisted application state tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedState {
    root: Map<String, Value>,
}

impl PersistedState {
    /// Create an empty (unversioned) state
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; anything but an object is rejected
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(MigrationError::InvalidSnapshot(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.root)?)
    }

    /// Unwrap into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Schema version of this snapshot, [`UNVERSIONED`] when untagged
    pub fn version(&self) -> Result<i64> {
        let persist = match self.root.get(PERSIST_KEY) {
            None | Some(Value::Null) => return Ok(UNVERSIONED),
            Some(Value::Object(persist)) => persist,
            Some(other) => {
                return Err(MigrationError::InvalidSnapshot(format!(
                    "`{PERSIST_KEY}` is a {}, expected an object",
                    json_type_name(other)
                )))
            }
        };
        match persist.get("version") {
            None | Some(Value::Null) => Ok(UNVERSIONED),
            Some(version) => match version.as_i64() {
                Some(v) if v >= UNVERSIONED => Ok(v),
                Some(v) => Err(MigrationError::InvalidSnapshot(format!(
                    "`{PERSIST_KEY}.version` {v} is below {UNVERSIONED}"
                ))),
                None => Err(MigrationError::InvalidSnapshot(format!(
                    "`{PERSIST_KEY}.version` is not an integer: {version}"
                ))),
            },
        }
    }

    /// Typed view of `_persist`, if present and well formed
    pub fn meta(&self) -> Option<PersistMeta> {
        let persist = self.root.get(PERSIST_KEY)?;
        serde_json::from_value(persist.clone()).ok()
    }

    /// Tag the snapshot with a version, keeping the other `_persist` fields
    pub fn set_version(&mut self, version: i64) {
        match self.root.get_mut(PERSIST_KEY) {
            Some(Value::Object(persist)) => {
                persist.insert("version".to_string(), Value::from(version));
            }
            _ => {
                let mut persist = Map::new();
                persist.insert("version".to_string(), Value::from(version));
                self.root.insert(PERSIST_KEY.to_string(), Value::Object(persist));
            }
        }
    }

    /// Get a top-level slice
    pub fn slice(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Names of the feature slices (everything but `_persist`)
    pub fn slice_names(&self) -> impl Iterator<Item = &str> {
        self.root
            .keys()
            .map(String::as_str)
            .filter(|key| *key != PERSIST_KEY)
    }

    /// Look up a nested value by dotted path, e.g. `account.dailyLimitCusd`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.root.get(segments.next()?)?;
        segments.try_fold(first, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Whether a dotted path resolves to a value (`null` included)
    pub fn contains_path(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }

    /// Borrow a slice that a step cannot do without
    ///
    /// Fails with [`MigrationError::MalformedInput`] naming `version` when the
    /// slice is absent or not an object.
    pub fn require_slice(&self, version: i64, key: &str) -> Result<&Map<String, Value>> {
        self.root
            .get(key)
            .and_then(Value::as_object)
            .ok_or_else(|| MigrationError::malformed(version, key))
    }

    /// Rebuild a slice in place
    ///
    /// An absent or non-object slice is replaced by an empty object first, so
    /// this behaves like spreading the old slice into a new one.
    pub fn with_slice<R>(&mut self, key: &str, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        let mut slice = match self.root.remove(key) {
            Some(Value::Object(slice)) => slice,
            _ => Map::new(),
        };
        let out = f(&mut slice);
        self.root.insert(key.to_string(), Value::Object(slice));
        out
    }

    /// Set one field of a slice, creating the slice when absent
    pub fn set_field(&mut self, key: &str, field: &str, value: Value) {
        self.with_slice(key, |slice| {
            slice.insert(field.to_string(), value);
        });
    }

    /// Drop `fields` from a slice, creating the slice when absent
    pub fn omit_fields(&mut self, key: &str, fields: &[&str]) {
        self.with_slice(key, |slice| omit(slice, fields));
    }

    /// Replace a whole slice
    pub fn set_slice(&mut self, key: &str, value: Value) {
        self.root.insert(key.to_string(), value);
    }

    /// Remove a whole slice
    pub fn remove_slice(&mut self, key: &str) -> Option<Value> {
        self.root.remove(key)
    }
}

/// Remove several keys from an object
pub fn omit(map: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        map.remove(*field);
    }
}

/// Assign a possibly-undefined value: `None` removes the key
pub fn set_opt(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            map.insert(key.to_string(), value);
        }
        None => {
            map.remove(key);
        }
    }
}

/// Loose truthiness of a persisted value
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy; everything else, including
/// empty arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
