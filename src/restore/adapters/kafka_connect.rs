//! Deployment target speaking the Kafka Connect REST API.

use crate::config::ConnectorVersionsConfig;
use crate::registry::domain::ConfigVersion;
use crate::restore::{
    domain::{ConnectorRuntimeState, RuntimeStatus},
    ports::{DeploymentTarget, DeploymentTargetError, DeploymentTargetResult},
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize)]
struct ConnectErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct ConnectorStatusBody {
    connector: ConnectorStateBody,
}

#[derive(Deserialize)]
struct ConnectorStateBody {
    state: String,
}

impl From<reqwest::Error> for DeploymentTargetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return Self::unreachable(err);
        }
        match err.status() {
            Some(StatusCode::NOT_FOUND) => Self::NotFound(err.to_string()),
            Some(status) => Self::Unexpected(format!("{err} (status {})", status.as_u16())),
            None => Self::Unexpected(format!("request to deployment target failed: {err}")),
        }
    }
}

/// Kafka Connect client implementing [`DeploymentTarget`].
///
/// Activation is `PUT /connectors/{name}/config`, which creates or
/// reconfigures the connector. Status combines `GET /connectors/{name}/status`
/// with `GET /connectors/{name}/config`.
#[derive(Debug, Clone)]
pub struct KafkaConnectDeploymentTarget {
    client: Client,
    base_url: String,
}

impl KafkaConnectDeploymentTarget {
    /// Creates a client for the worker at `base_url` with a per-request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentTargetError::Unexpected`] when the HTTP client
    /// cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> DeploymentTargetResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DeploymentTargetError::Unexpected(err.to_string()))?;
        let raw_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: raw_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Creates a client from the crate configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentTargetError::Unexpected`] when the HTTP client
    /// cannot be built.
    pub fn from_config(config: &ConnectorVersionsConfig) -> DeploymentTargetResult<Self> {
        Self::new(
            config.deployment_target.base_url.clone(),
            config.deployment_timeout(),
        )
    }

    /// Returns the normalised worker base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn connector_url(&self, connector_name: &str, resource: &str) -> String {
        format!("{}/connectors/{connector_name}/{resource}", self.base_url)
    }

    async fn fetch_config(&self, connector_name: &str) -> DeploymentTargetResult<Option<Value>> {
        let response = self
            .client
            .get(self.connector_url(connector_name, "config"))
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(Some(response.json::<Value>().await?));
        }
        Ok(None)
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    response
        .json::<ConnectErrorBody>()
        .await
        .map_or_else(|_| format!("status {}", status.as_u16()), |body| body.message)
}

#[async_trait]
impl DeploymentTarget for KafkaConnectDeploymentTarget {
    async fn activate(
        &self,
        connector_name: &str,
        version: &ConfigVersion,
    ) -> DeploymentTargetResult<()> {
        let response = self
            .client
            .put(self.connector_url(connector_name, "config"))
            .json(version.config())
            .send()
            .await?;

        match response.status() {
            StatusCode::OK
            | StatusCode::CREATED
            | StatusCode::ACCEPTED
            | StatusCode::NO_CONTENT => {
                debug!(
                    connector = connector_name,
                    version = %version.version(),
                    "deployment target accepted configuration"
                );
                Ok(())
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(DeploymentTargetError::Rejected {
                    connector_name: connector_name.to_owned(),
                    message: error_message(response).await,
                })
            }
            StatusCode::NOT_FOUND => {
                Err(DeploymentTargetError::NotFound(connector_name.to_owned()))
            }
            StatusCode::CONFLICT => {
                Err(DeploymentTargetError::Conflict(connector_name.to_owned()))
            }
            status => Err(DeploymentTargetError::Unexpected(format!(
                "activating '{connector_name}' returned status {}: {}",
                status.as_u16(),
                error_message(response).await
            ))),
        }
    }

    async fn current_status(&self, connector_name: &str) -> DeploymentTargetResult<RuntimeStatus> {
        let response = self
            .client
            .get(self.connector_url(connector_name, "status"))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: ConnectorStatusBody = response.json().await?;
                let config = self.fetch_config(connector_name).await?;
                Ok(RuntimeStatus {
                    state: ConnectorRuntimeState::parse(&body.connector.state),
                    config,
                })
            }
            StatusCode::NOT_FOUND => {
                Err(DeploymentTargetError::NotFound(connector_name.to_owned()))
            }
            status => Err(DeploymentTargetError::Unexpected(format!(
                "status of '{connector_name}' returned status {}: {}",
                status.as_u16(),
                error_message(response).await
            ))),
        }
    }
}
