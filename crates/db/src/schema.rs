//! Schema initialisation from the static DDL script.

use std::path::Path;

use sqlx::{Connection, PgConnection};
use tracing::{error, info, instrument, warn};

use crate::DbError;

/// Default location of the DDL script, relative to the working directory.
pub const DEFAULT_SCHEMA_PATH: &str = "schema/schema.sql";

/// Run the DDL script at `path` inside one transaction and commit it.
///
/// The script must be idempotent (`IF NOT EXISTS` everywhere); this is
/// called on every batch.
///
/// # Errors
/// - [`DbError::Schema`] when the file cannot be read (no database call made).
/// - [`DbError::Sqlx`] when execution fails, after the transaction has been
///   rolled back.
#[instrument(skip(conn), fields(path = %path.display()))]
pub async fn ensure_schema(conn: &mut PgConnection, path: &Path) -> Result<(), DbError> {
    let ddl = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DbError::Schema {
            path: path.to_path_buf(),
            source,
        })?;

    let mut tx = conn.begin().await?;
    // A plain `&str` goes through the simple-query protocol, which accepts
    // the multi-statement script.
    match sqlx::Executor::execute(&mut *tx, ddl.as_str()).await {
        Ok(_) => {
            tx.commit().await?;
            info!("Successfully ensured 'pipeline_runs' table and indexes exist.");
            Ok(())
        }
        Err(e) => {
            error!("Database error during table creation: {e}");
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback of schema transaction failed: {rollback_err}");
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sinks call this from `#[async_trait]` methods, which need a `Send`
    // future. Type-checked only; never awaited.
    #[allow(dead_code)]
    fn ensure_schema_future_is_send(conn: &mut PgConnection, path: &Path) {
        fn assert_send<T: Send>(_: &T) {}
        let fut = ensure_schema(conn, path);
        assert_send(&fut);
    }
}
