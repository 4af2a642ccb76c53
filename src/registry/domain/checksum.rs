//! SHA-256 checksums over canonical configuration serialization.

use super::RegistryDomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a hex-encoded SHA-256 digest.
const CHECKSUM_HEX_LENGTH: usize = 64;

/// Hex-encoded SHA-256 digest of a configuration's canonical serialization.
///
/// `serde_json` maps keep their keys sorted, so the serialized form (and the
/// checksum) does not depend on the key order of the original payload.
///
/// # Examples
///
/// ```
/// use connector_versions::registry::domain::ConfigChecksum;
/// use serde_json::json;
///
/// let first = ConfigChecksum::compute(&json!({"a": 1, "b": 2}));
/// let second = ConfigChecksum::compute(&json!({"b": 2, "a": 1}));
/// assert_eq!(first, second);
/// assert_eq!(first.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigChecksum(String);

impl ConfigChecksum {
    /// Computes the checksum of a configuration payload.
    #[must_use]
    pub fn compute(config: &Value) -> Self {
        let digest = Sha256::digest(config.to_string().as_bytes());
        Self(format!("{digest:x}"))
    }

    /// Parses a stored hex checksum.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::InvalidChecksum`] unless the input is
    /// 64 lowercase hex characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let raw = value.into();
        let is_valid = raw.len() == CHECKSUM_HEX_LENGTH
            && raw
                .chars()
                .all(|character| character.is_ascii_digit() || matches!(character, 'a'..='f'));
        if !is_valid {
            return Err(RegistryDomainError::InvalidChecksum(raw));
        }
        Ok(Self(raw))
    }

    /// Returns `true` when `config` hashes to this checksum.
    #[must_use]
    pub fn matches(&self, config: &Value) -> bool {
        *self == Self::compute(config)
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ConfigChecksum {
    type Error = RegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ConfigChecksum> for String {
    fn from(value: ConfigChecksum) -> Self {
        value.0
    }
}

impl fmt::Display for ConfigChecksum {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
