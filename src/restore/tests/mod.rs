//! Unit tests for the restore module.
