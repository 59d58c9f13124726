//! Pipeline-level error types.

use thiserror::Error;

/// Problems with the job's configuration. All of them are fatal and are
/// raised before any network or database activity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GITHUB_TOKEN environment variable not set; cannot fetch data from GitHub")]
    MissingToken,

    /// `GITHUB_REPOSITORY` is set but is not `owner/repo`.
    #[error("invalid repository '{0}': expected 'owner/repo'")]
    InvalidRepository(String),

    #[error("invalid DB_PORT '{0}': expected a port number")]
    InvalidPort(String),
}

/// Errors that abort a whole batch.
///
/// Per-run problems never show up here: they are counted in the
/// [`BatchSummary`](crate::driver::BatchSummary) instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connecting or initialising the schema failed.
    #[error("database error: {0}")]
    Database(#[from] db::DbError),

    /// The provider client could not be built.
    #[error("fetch error: {0}")]
    Fetch(#[from] github::FetchError),
}
