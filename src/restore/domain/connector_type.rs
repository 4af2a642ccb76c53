//! Direction of a connector relative to the data-movement process.

use super::RestoreDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a connector reads into or writes out of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    /// Reads from an external system.
    Source,
    /// Writes to an external system.
    Sink,
}

impl ConnectorType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Sink => "sink",
        }
    }
}

impl TryFrom<&str> for ConnectorType {
    type Error = RestoreDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "sink" => Ok(Self::Sink),
            _ => Err(RestoreDomainError::InvalidConnectorType(value.to_owned())),
        }
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
