//! Persistable pair of flattened configurations.

use super::engine::{ConfigDiff, diff_flat};
use super::flatten::{FlatConfig, flatten_config};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Both flattened sides of a comparison, kept so a diff can be re-rendered
/// later without reloading either configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSnapshot {
    /// Flattened configuration before the change.
    pub previous: FlatConfig,
    /// Flattened configuration after the change.
    pub current: FlatConfig,
}

impl DiffSnapshot {
    /// Captures both sides of a comparison.
    #[must_use]
    pub fn capture(previous: &Value, current: &Value) -> Self {
        Self {
            previous: flatten_config(previous),
            current: flatten_config(current),
        }
    }

    /// Computes the diff between the captured sides.
    #[must_use]
    pub fn to_diff(&self) -> ConfigDiff {
        diff_flat(&self.previous, &self.current)
    }
}
