//! Staging and applying restores of historical connector configuration.
//!
//! At most one restore is staged per pipeline and connector. Applying a
//! restore activates the target version on the deployment target, then
//! records the deployment, then clears the staged row, so an interrupted
//! apply leaves the staged row in place for retry.
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
