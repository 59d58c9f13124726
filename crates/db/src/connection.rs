//! Postgres connection.
//!
//! A batch holds exactly one connection for its whole lifetime, so this is a
//! plain `PgConnection` rather than a pool.

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::info;

use crate::DbError;

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl Default for ConnectParams {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "password".to_string(),
            dbname: "pipeline_pulse_db".to_string(),
        }
    }
}

impl ConnectParams {
    pub fn to_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
    }
}

/// Open a single connection described by `params`.
pub async fn connect(params: &ConnectParams) -> Result<PgConnection, DbError> {
    info!(
        "Connecting to database '{}' at {}:{}...",
        params.dbname, params.host, params.port
    );
    let conn = params.to_options().connect().await?;
    info!("Successfully connected to database.");
    Ok(conn)
}

/// Close a connection, logging instead of failing: by the time we close,
/// every row has already been committed or rolled back.
pub async fn close(conn: PgConnection) {
    match conn.close().await {
        Ok(()) => info!("Database connection closed."),
        Err(e) => tracing::warn!("Error while closing database connection: {e}"),
    }
}
