//! Runtime configuration for the version registry and restore services.
//!
//! Configuration is read from YAML, with environment variables taking
//! precedence for connection endpoints.
//!
//! # Examples
//!
//! ```
//! use connector_versions::config::{AppendPolicy, ConnectorVersionsConfig};
//!
//! let config = ConnectorVersionsConfig::from_yaml_str(
//!     "history_limit: 5\nappend_policy: require_existing\n",
//! )
//! .expect("valid configuration");
//! assert_eq!(config.history_limit, 5);
//! assert_eq!(config.append_policy, AppendPolicy::RequireExisting);
//! assert_eq!(config.max_append_attempts, 3);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`ConnectorVersionsConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "CONNECTOR_VERSIONS_DATABASE_URL";

/// Environment variable overriding the deployment target base URL.
pub const DEPLOYMENT_URL_ENV: &str = "CONNECTOR_VERSIONS_DEPLOYMENT_URL";

const DEFAULT_HISTORY_LIMIT: usize = 10;
const DEFAULT_DEPLOYMENT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_APPEND_ATTEMPTS: u32 = 3;
const DEFAULT_DEPLOYMENT_URL: &str = "http://localhost:8083";

/// Behaviour when appending to a registry name with no entry yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppendPolicy {
    /// Create the registry entry on first append.
    #[default]
    AutoCreate,
    /// Reject appends to unregistered names.
    RequireExisting,
}

/// Connection settings for the live deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentTargetConfig {
    /// Base URL of the connector-management REST API.
    pub base_url: String,
}

impl Default for DeploymentTargetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DEPLOYMENT_URL.to_owned(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorVersionsConfig {
    /// Number of versions offered as restore candidates.
    pub history_limit: usize,
    /// Upper bound on a single deployment-target activation, in milliseconds.
    pub deployment_timeout_ms: u64,
    /// Attempts made when concurrent appends contend for a version number.
    pub max_append_attempts: u32,
    /// Behaviour for appends to unregistered names.
    pub append_policy: AppendPolicy,
    /// Deployment target settings.
    pub deployment_target: DeploymentTargetConfig,
    /// `PostgreSQL` connection URL for the persistent adapters.
    pub database_url: Option<String>,
}

impl Default for ConnectorVersionsConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            deployment_timeout_ms: DEFAULT_DEPLOYMENT_TIMEOUT_MS,
            max_append_attempts: DEFAULT_MAX_APPEND_ATTEMPTS,
            append_policy: AppendPolicy::default(),
            deployment_target: DeploymentTargetConfig::default(),
            database_url: None,
        }
    }
}

/// Errors returned while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(Arc<std::io::Error>),

    /// The configuration document is not valid YAML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(Arc<serde_yaml::Error>),

    /// A field holds an unusable value.
    #[error("invalid configuration value for '{field}': {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(Arc::new(err))
    }
}

impl ConnectorVersionsConfig {
    /// Parses and validates configuration from a YAML document.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_yaml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a YAML file, applies environment overrides, and validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// the resulting configuration is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&document)?;
        let overridden = config.with_env_overrides();
        overridden.validate()?;
        Ok(overridden)
    }

    /// Applies [`DATABASE_URL_ENV`] and [`DEPLOYMENT_URL_ENV`] when set and
    /// non-empty.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(database_url) = non_empty_env(DATABASE_URL_ENV) {
            self.database_url = Some(database_url);
        }
        if let Some(base_url) = non_empty_env(DEPLOYMENT_URL_ENV) {
            self.deployment_target.base_url = base_url;
        }
        self
    }

    /// Checks limits and endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero limits, timeouts, or attempt
    /// counts and for a deployment URL without an `http(s)://` scheme.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(invalid("history_limit", "must be at least 1"));
        }
        if self.deployment_timeout_ms == 0 {
            return Err(invalid("deployment_timeout_ms", "must be at least 1"));
        }
        if self.max_append_attempts == 0 {
            return Err(invalid("max_append_attempts", "must be at least 1"));
        }

        let base_url = self.deployment_target.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(invalid(
                "deployment_target.base_url",
                format!("'{base_url}' must start with 'http://' or 'https://'"),
            ));
        }
        Ok(())
    }

    /// Returns the activation timeout as a [`Duration`].
    #[must_use]
    pub const fn deployment_timeout(&self) -> Duration {
        Duration::from_millis(self.deployment_timeout_ms)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
