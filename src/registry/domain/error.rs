//! Error types for registry domain validation.

use super::{ConfigChecksum, RegistryName, VersionNumber};
use thiserror::Error;

/// Errors returned while constructing registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryDomainError {
    /// The registry name is empty after trimming.
    #[error("registry name must not be empty")]
    EmptyRegistryName,

    /// The registry name contains characters outside `[A-Za-z0-9_.-]`.
    #[error(
        "registry name '{0}' contains invalid characters (only alphanumerics, '_', '-' and '.' allowed)"
    )]
    InvalidRegistryName(String),

    /// The registry name exceeds the 255-character storage limit.
    #[error("registry name exceeds 255 character limit: {0}")]
    RegistryNameTooLong(String),

    /// Version numbers start at one.
    #[error("invalid version number {0}, expected a positive integer")]
    InvalidVersionNumber(i64),

    /// The version counter cannot advance further.
    #[error("version counter exhausted for registry '{0}'")]
    VersionOverflow(RegistryName),

    /// The checksum is not a 64-character lowercase hex SHA-256 digest.
    #[error("invalid configuration checksum '{0}'")]
    InvalidChecksum(String),

    /// A stored configuration no longer matches its recorded checksum.
    #[error("checksum mismatch for {registry_name} v{version}: recorded {recorded}, computed {computed}")]
    ChecksumMismatch {
        /// Registry the version belongs to.
        registry_name: RegistryName,
        /// Version whose payload was verified.
        version: VersionNumber,
        /// Checksum stored alongside the payload.
        recorded: ConfigChecksum,
        /// Checksum recomputed from the payload.
        computed: ConfigChecksum,
    },
}
