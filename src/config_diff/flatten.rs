//! Flattening of nested connector configuration into path/value pairs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Path used when the configuration root is itself a scalar or `null`.
pub const ROOT_VALUE_PATH: &str = "value";

/// Literal rendering of a `null` leaf.
const NULL_LITERAL: &str = "null";

/// Flattened configuration keyed by dotted/indexed path.
///
/// Paths are ordered lexicographically, so two flattenings of equivalent
/// configurations compare equal regardless of source key order.
///
/// # Examples
///
/// ```
/// use connector_versions::config_diff::flatten_config;
/// use serde_json::json;
///
/// let flat = flatten_config(&json!({"tables": ["t1", "t2"], "opts": {}}));
/// assert_eq!(flat.get("tables[0]"), Some("t1"));
/// assert_eq!(flat.get("tables[1]"), Some("t2"));
/// assert_eq!(flat.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatConfig(BTreeMap<String, String>);

impl FlatConfig {
    /// Creates an empty flattened configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the rendered value stored at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Returns whether `path` is present.
    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Returns the number of leaf paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no leaf paths are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(path, value)` pairs in lexicographic path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(path, value)| (path.as_str(), value.as_str()))
    }

    /// Iterates over paths in lexicographic order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn insert(&mut self, path: String, value: String) {
        self.0.insert(path, value);
    }
}

impl FromIterator<(String, String)> for FlatConfig {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Flattens a configuration tree.
///
/// Maps contribute `.key` path segments and sequences `[i]` segments. Empty
/// maps and sequences contribute nothing. `null` leaves render as `"null"`.
/// Strings pass through verbatim; any other scalar uses its JSON rendering.
/// A string holding embedded JSON is treated as an opaque scalar.
///
/// Keys are not escaped, so a literal dotted key and a nested path can
/// produce the same path: `{"a.b": 1, "a": {"b": 2}}` yields one `a.b`
/// entry. The key visited last wins; with `serde_json`'s default sorted
/// maps that is the literal dotted key.
#[must_use]
pub fn flatten_config(config: &Value) -> FlatConfig {
    let mut flat = FlatConfig::new();
    walk(config, "", &mut flat);
    flat
}

fn walk(value: &Value, path: &str, flat: &mut FlatConfig) {
    match value {
        Value::Object(entries) => {
            for (key, child) in entries {
                walk(child, &join_key(path, key), flat);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                walk(child, &format!("{path}[{index}]"), flat);
            }
        }
        scalar => flat.insert(leaf_path(path), render_scalar(scalar)),
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn leaf_path(path: &str) -> String {
    if path.is_empty() {
        ROOT_VALUE_PATH.to_owned()
    } else {
        path.to_owned()
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => NULL_LITERAL.to_owned(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
