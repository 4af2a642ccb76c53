//! Adapter implementations for restore ports.

pub mod kafka_connect;
pub mod memory;
pub mod postgres;

pub use kafka_connect::KafkaConnectDeploymentTarget;
pub use memory::{InMemoryDeploymentTarget, InMemoryStagingRepository};
