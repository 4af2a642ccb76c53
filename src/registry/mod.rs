//! Append-only configuration version registry and drift detection.
//!
//! Each connector registry name owns a gapless, strictly increasing history
//! of configuration snapshots. Connector deployment state records which
//! version is live and which is pinned, from which drift is derived. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
