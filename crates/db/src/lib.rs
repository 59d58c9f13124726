//! `db` crate — pure persistence layer.
//!
//! Provides the batch's single connection, the schema initializer, typed row
//! structs and repository functions for the `pipeline_runs` table.

pub mod connection;
pub mod error;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::ConnectParams;
pub use error::DbError;
pub use models::{NormalizedRun, PipelineRunRow, UpsertOutcome};
pub use sqlx::PgConnection;
