//! Connector versions: configuration history and restores for data-pipeline
//! connectors.
//!
//! The crate keeps an append-only, checksummed history of every
//! configuration registered under a connector name. It tracks which version
//! each connector runs, reports drift against the registry, and stages
//! restores that are applied to a live deployment target on confirmation.
//!
//! # Architecture
//!
//! Each feature follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence and deployment
//! - **Adapters**: In-memory, `PostgreSQL`, and Kafka Connect implementations
//! - **Services**: Orchestration generic over the ports
//!
//! # Modules
//!
//! - [`config`]: YAML configuration with environment overrides
//! - [`config_diff`]: Flattening and path-level comparison of configurations
//! - [`registry`]: Version registry and drift detection
//! - [`restore`]: Staged restores and activation on the deployment target

pub mod config;
pub mod config_diff;
pub mod registry;
pub mod restore;
