//! Runtime status reported by a deployment target.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of a running connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorRuntimeState {
    /// Processing records.
    Running,
    /// Suspended by an operator.
    Paused,
    /// Stopped, with configuration retained.
    Stopped,
    /// Not yet scheduled on a worker.
    Unassigned,
    /// Restarting after a reconfiguration.
    Restarting,
    /// Halted by an error.
    Failed,
    /// A state this crate does not model.
    Other(String),
}

impl ConnectorRuntimeState {
    /// Parses the upper-case state names used by Kafka Connect.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => Self::Running,
            "PAUSED" => Self::Paused,
            "STOPPED" => Self::Stopped,
            "UNASSIGNED" => Self::Unassigned,
            "RESTARTING" => Self::Restarting,
            "FAILED" => Self::Failed,
            _ => Self::Other(raw.to_owned()),
        }
    }
}

/// Runtime view of a connector on the deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    /// Connector state.
    pub state: ConnectorRuntimeState,
    /// Configuration the target is currently running, when reported.
    pub config: Option<Value>,
}
