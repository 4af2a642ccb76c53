//! Flattening and comparison of connector configuration trees.
//!
//! Everything in this module is a pure, total function: flattening and
//! diffing never fail, whatever the shape of the input. Configuration is
//! compared as text, path by path, matching how connector settings travel
//! as flat string key/value pairs on the wire.

mod engine;
mod flatten;
mod snapshot;

pub use engine::{ConfigDiff, DiffEntry, DiffStatus, NO_CHANGES_SUMMARY, diff_configs, diff_flat};
pub use flatten::{FlatConfig, ROOT_VALUE_PATH, flatten_config};
pub use snapshot::DiffSnapshot;
