//! Identifier, name, and version-number types for the configuration registry.

use super::RegistryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for a registry name, matching `VARCHAR(255)`.
const MAX_REGISTRY_NAME_LENGTH: usize = 255;

/// Unique identifier for a deployed connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorId(Uuid);

impl ConnectorId {
    /// Creates a new random connector identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a connector identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ConnectorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated name under which a connector's configuration history is kept.
///
/// The same name addresses the connector on the deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryName(String);

impl RegistryName {
    /// Creates a validated registry name.
    ///
    /// The input is trimmed. Only ASCII alphanumerics, `_`, `-`, and `.` are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let normalized = value.into().trim().to_owned();

        if normalized.is_empty() {
            return Err(RegistryDomainError::EmptyRegistryName);
        }

        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_alphanumeric() || matches!(character, '_' | '-' | '.')
        });
        if !is_valid {
            return Err(RegistryDomainError::InvalidRegistryName(normalized));
        }

        if normalized.len() > MAX_REGISTRY_NAME_LENGTH {
            return Err(RegistryDomainError::RegistryNameTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the registry name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RegistryName {
    type Error = RegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegistryName> for String {
    fn from(value: RegistryName) -> Self {
        value.0
    }
}

impl AsRef<str> for RegistryName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RegistryName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Positive, per-registry configuration version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct VersionNumber(u32);

impl VersionNumber {
    /// The first version assigned in any registry.
    pub const FIRST: Self = Self(1);

    /// Creates a validated version number.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::InvalidVersionNumber`] for zero.
    pub const fn new(value: u32) -> Result<Self, RegistryDomainError> {
        if value == 0 {
            return Err(RegistryDomainError::InvalidVersionNumber(0));
        }
        Ok(Self(value))
    }

    /// Returns the raw version number.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the following version number, or `None` on overflow.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl TryFrom<i64> for VersionNumber {
    type Error = RegistryDomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let raw =
            u32::try_from(value).map_err(|_| RegistryDomainError::InvalidVersionNumber(value))?;
        Self::new(raw).map_err(|_| RegistryDomainError::InvalidVersionNumber(value))
    }
}

impl TryFrom<i32> for VersionNumber {
    type Error = RegistryDomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<VersionNumber> for i64 {
    fn from(value: VersionNumber) -> Self {
        Self::from(value.0)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
