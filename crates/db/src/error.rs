//! Typed error type for the db crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,

    /// The connection was already closed by the caller.
    #[error("connection already closed")]
    ConnectionClosed,

    /// The DDL script could not be read.
    #[error("schema file {} not found or unreadable: {source}", .path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
