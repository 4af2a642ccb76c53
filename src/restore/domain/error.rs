//! Error types for restore domain validation.

use thiserror::Error;

/// Errors returned while constructing restore domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RestoreDomainError {
    /// The connector type is neither `source` nor `sink`.
    #[error("unknown connector type '{0}', expected 'source' or 'sink'")]
    InvalidConnectorType(String),
}
