//! `PostgreSQL` adapter for staged restores.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresStagingRepository, StagingPgPool};
