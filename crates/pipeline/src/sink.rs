//! Where normalized runs end up.
//!
//! The driver opens a sink through a [`SinkConnector`] only after the fetch
//! succeeded, so a failed fetch never touches the database.

use std::path::PathBuf;

use async_trait::async_trait;

use db::{ConnectParams, DbError, NormalizedRun, PgConnection, UpsertOutcome};

/// Opens the single sink a batch writes to.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    type Sink: RunSink;

    async fn connect(&self) -> Result<Self::Sink, DbError>;
}

/// The persistence operations the batch driver needs.
#[async_trait]
pub trait RunSink: Send {
    /// Make sure the target table and its indexes exist.
    async fn ensure_schema(&mut self) -> Result<(), DbError>;

    /// Insert or overwrite one run. Each call commits on its own.
    async fn upsert(&mut self, run: &NormalizedRun) -> UpsertOutcome;

    /// Release the underlying connection. Called exactly once per batch.
    async fn close(&mut self);
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

/// Connects to Postgres with the configured parameters.
pub struct PgConnector {
    pub params: ConnectParams,
    pub schema_path: PathBuf,
}

impl PgConnector {
    pub fn new(params: ConnectParams, schema_path: impl Into<PathBuf>) -> Self {
        Self {
            params,
            schema_path: schema_path.into(),
        }
    }
}

#[async_trait]
impl SinkConnector for PgConnector {
    type Sink = PgSink;

    async fn connect(&self) -> Result<PgSink, DbError> {
        let conn = db::connection::connect(&self.params).await?;
        Ok(PgSink {
            conn: Some(conn),
            schema_path: self.schema_path.clone(),
        })
    }
}

/// One open Postgres connection.
pub struct PgSink {
    // `None` once closed.
    conn: Option<PgConnection>,
    schema_path: PathBuf,
}

impl PgSink {
    fn conn(&mut self) -> Result<&mut PgConnection, DbError> {
        self.conn.as_mut().ok_or(DbError::ConnectionClosed)
    }
}

#[async_trait]
impl RunSink for PgSink {
    async fn ensure_schema(&mut self) -> Result<(), DbError> {
        let path = self.schema_path.clone();
        db::schema::ensure_schema(self.conn()?, &path).await
    }

    async fn upsert(&mut self, run: &NormalizedRun) -> UpsertOutcome {
        match self.conn() {
            Ok(conn) => db::repository::pipeline_runs::upsert_run(conn, run).await,
            Err(e) => UpsertOutcome::Failed(e),
        }
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            db::connection::close(conn).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_sink() -> PgSink {
        PgSink {
            conn: None,
            schema_path: PathBuf::from(db::schema::DEFAULT_SCHEMA_PATH),
        }
    }

    #[tokio::test]
    async fn closed_sink_reports_closed_connection() {
        let mut sink = closed_sink();

        let err = sink.ensure_schema().await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionClosed));

        let run = NormalizedRun { run_id: Some(1), ..Default::default() };
        assert!(matches!(
            sink.upsert(&run).await,
            UpsertOutcome::Failed(DbError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn closing_twice_is_a_no_op() {
        let mut sink = closed_sink();
        sink.close().await;
        assert!(sink.conn.is_none());
    }
}
