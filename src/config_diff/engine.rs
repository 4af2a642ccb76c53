//! Path-level comparison of two flattened configurations.

use super::flatten::{FlatConfig, flatten_config};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Summary rendered when two configurations are identical.
pub const NO_CHANGES_SUMMARY: &str = "No changes";

/// Number of differing paths named in a summary before truncation.
const SUMMARY_PATH_LIMIT: usize = 3;

/// Classification of a single path in a configuration diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    /// Present on both sides with equal values.
    Unchanged,
    /// Present on both sides with different values.
    Changed,
    /// Present only in the current configuration.
    Added,
    /// Present only in the previous configuration.
    Removed,
}

impl DiffStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Changed => "changed",
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }

    /// Returns `true` for every status except [`DiffStatus::Unchanged`].
    #[must_use]
    pub const fn is_difference(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One path of a configuration diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Flattened path.
    pub path: String,
    /// Path classification.
    pub status: DiffStatus,
    /// Value in the previous configuration, if present.
    pub previous: Option<String>,
    /// Value in the current configuration, if present.
    pub current: Option<String>,
}

impl DiffEntry {
    /// Renders the human-readable detail line for a differing entry.
    ///
    /// Returns `None` for unchanged entries.
    #[must_use]
    pub fn detail_line(&self) -> Option<String> {
        match (self.status, self.previous.as_deref(), self.current.as_deref()) {
            (DiffStatus::Changed, Some(previous), Some(current)) => Some(format!(
                "{}: {} -> {}",
                self.path,
                quote(previous),
                quote(current)
            )),
            (DiffStatus::Removed, Some(previous), _) => {
                Some(format!("{}: removed ({})", self.path, quote(previous)))
            }
            (DiffStatus::Added, _, Some(current)) => {
                Some(format!("{}: added {}", self.path, quote(current)))
            }
            _ => None,
        }
    }
}

/// Result of comparing two configurations.
///
/// # Examples
///
/// ```
/// use connector_versions::config_diff::diff_configs;
/// use serde_json::json;
///
/// let diff = diff_configs(
///     &json!({"host": "a", "port": 5432}),
///     &json!({"host": "b", "port": 5432}),
/// );
/// assert_eq!(diff.summary(), "host");
/// assert_eq!(diff.details(), ["host: \"a\" -> \"b\""]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDiff {
    entries: Vec<DiffEntry>,
    summary: String,
    details: Vec<String>,
}

impl ConfigDiff {
    /// Returns every compared path, including unchanged ones, in path order.
    #[must_use]
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// Returns the compact change summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns one rendered line per differing path.
    #[must_use]
    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// Iterates over entries that differ between the two sides.
    pub fn differences(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status.is_difference())
    }

    /// Iterates over entries with the given status.
    pub fn with_status(&self, status: DiffStatus) -> impl Iterator<Item = &DiffEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.status == status)
    }

    /// Returns the number of differing paths.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.differences().count()
    }

    /// Returns `true` when at least one path differs.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.differences().next().is_some()
    }
}

/// Compares two flattened configurations path by path.
#[must_use]
pub fn diff_flat(previous: &FlatConfig, current: &FlatConfig) -> ConfigDiff {
    let paths: BTreeSet<&str> = previous.paths().chain(current.paths()).collect();

    let entries: Vec<DiffEntry> = paths
        .into_iter()
        .map(|path| classify(path, previous.get(path), current.get(path)))
        .collect();

    let details = entries.iter().filter_map(DiffEntry::detail_line).collect();
    let summary = summarize(&entries);

    ConfigDiff {
        entries,
        summary,
        details,
    }
}

/// Flattens and compares two configuration trees.
#[must_use]
pub fn diff_configs(previous: &Value, current: &Value) -> ConfigDiff {
    diff_flat(&flatten_config(previous), &flatten_config(current))
}

fn classify(path: &str, previous: Option<&str>, current: Option<&str>) -> DiffEntry {
    let status = match (previous, current) {
        (Some(before), Some(after)) if before == after => DiffStatus::Unchanged,
        (Some(_), Some(_)) => DiffStatus::Changed,
        (None, _) => DiffStatus::Added,
        (Some(_), None) => DiffStatus::Removed,
    };

    DiffEntry {
        path: path.to_owned(),
        status,
        previous: previous.map(str::to_owned),
        current: current.map(str::to_owned),
    }
}

fn summarize(entries: &[DiffEntry]) -> String {
    let differing: Vec<&str> = entries
        .iter()
        .filter(|entry| entry.status.is_difference())
        .map(|entry| entry.path.as_str())
        .collect();

    if differing.is_empty() {
        return NO_CHANGES_SUMMARY.to_owned();
    }

    let named = differing
        .iter()
        .take(SUMMARY_PATH_LIMIT)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    let remaining = differing.len().saturating_sub(SUMMARY_PATH_LIMIT);

    if remaining == 0 {
        named
    } else {
        format!("{named} (+{remaining} more)")
    }
}

fn quote(value: &str) -> String {
    Value::String(value.to_owned()).to_string()
}
