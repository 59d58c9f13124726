//! `pipeline_runs` repository functions.
//!
//! Every write is its own transaction: one run's failure never undoes
//! another run's commit.

use sqlx::{Connection, PgConnection};
use tracing::{error, info, warn};

use crate::{
    models::{NormalizedRun, PipelineRunRow, UpsertOutcome},
    DbError,
};

const UPSERT_RUN: &str = r#"
    INSERT INTO pipeline_runs (
        run_id, workflow_id, workflow_name, status, conclusion, event,
        branch, commit_sha, actor, run_number, run_attempt,
        run_started_at, created_at, updated_at, duration_ms, html_url
    ) VALUES (
        $1, $2, $3, $4, $5, $6,
        $7, $8, $9, $10, $11,
        $12, $13, $14, $15, $16
    )
    ON CONFLICT (run_id) DO UPDATE SET
        workflow_id    = EXCLUDED.workflow_id,
        workflow_name  = EXCLUDED.workflow_name,
        status         = EXCLUDED.status,
        conclusion     = EXCLUDED.conclusion,
        event          = EXCLUDED.event,
        branch         = EXCLUDED.branch,
        commit_sha     = EXCLUDED.commit_sha,
        actor          = EXCLUDED.actor,
        run_number     = EXCLUDED.run_number,
        run_attempt    = EXCLUDED.run_attempt,
        run_started_at = EXCLUDED.run_started_at,
        updated_at     = EXCLUDED.updated_at,
        duration_ms    = EXCLUDED.duration_ms,
        html_url       = EXCLUDED.html_url
    RETURNING (xmax = 0) AS inserted
"#;

const SELECT_RUN_BY_ID: &str = r#"
    SELECT run_id, workflow_id, workflow_name, status, conclusion, event,
           branch, commit_sha, actor, run_number, run_attempt,
           run_started_at, created_at, updated_at, duration_ms, html_url
    FROM pipeline_runs
    WHERE run_id = $1
"#;

const SELECT_ALL_RUNS: &str = r#"
    SELECT run_id, workflow_id, workflow_name, status, conclusion, event,
           branch, commit_sha, actor, run_number, run_attempt,
           run_started_at, created_at, updated_at, duration_ms, html_url
    FROM pipeline_runs
    ORDER BY run_id
"#;

/// Insert `run`, or overwrite the existing row with the same `run_id`.
///
/// On conflict every column except `run_id` and `created_at` takes the new
/// value (last write wins). Errors never escape: they are rolled back and
/// returned as [`UpsertOutcome::Failed`] so the caller can move on.
pub async fn upsert_run(conn: &mut PgConnection, run: &NormalizedRun) -> UpsertOutcome {
    let Some(run_id) = run.run_id else {
        warn!("Skipping run due to missing run_id: {run:?}");
        return UpsertOutcome::Rejected;
    };

    match write_run(conn, run_id, run).await {
        Ok(true) => {
            info!("Inserted run ID: {run_id}");
            UpsertOutcome::Inserted
        }
        Ok(false) => {
            info!("Updated run ID: {run_id}");
            UpsertOutcome::Updated
        }
        Err(e) => {
            error!("Database error inserting/updating run ID {run_id}: {e}");
            UpsertOutcome::Failed(e)
        }
    }
}

/// Returns `true` when the row was freshly inserted.
async fn write_run(
    conn: &mut PgConnection,
    run_id: i64,
    run: &NormalizedRun,
) -> Result<bool, DbError> {
    let mut tx = conn.begin().await?;

    let result = sqlx::query_scalar::<_, bool>(UPSERT_RUN)
        .bind(run_id)
        .bind(run.workflow_id)
        .bind(run.workflow_name.as_deref())
        .bind(run.status.as_deref())
        .bind(run.conclusion.as_deref())
        .bind(run.event.as_deref())
        .bind(run.branch.as_deref())
        .bind(run.commit_sha.as_deref())
        .bind(run.actor.as_deref())
        .bind(run.run_number)
        .bind(run.run_attempt)
        .bind(run.run_started_at)
        .bind(run.created_at)
        .bind(run.updated_at)
        .bind(run.duration_ms)
        .bind(run.html_url.as_deref())
        .fetch_one(&mut *tx)
        .await;

    match result {
        Ok(inserted) => {
            tx.commit().await?;
            Ok(inserted)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed for run ID {run_id}: {rollback_err}");
            }
            Err(e.into())
        }
    }
}

/// Fetch a single run by its provider ID.
pub async fn get_run(conn: &mut PgConnection, run_id: i64) -> Result<PipelineRunRow, DbError> {
    sqlx::query_as::<_, PipelineRunRow>(SELECT_RUN_BY_ID)
        .bind(run_id)
        .fetch_optional(conn)
        .await?
        .ok_or(DbError::NotFound)
}

/// Return every stored run ordered by `run_id`.
pub async fn list_runs(conn: &mut PgConnection) -> Result<Vec<PipelineRunRow>, DbError> {
    let rows = sqlx::query_as::<_, PipelineRunRow>(SELECT_ALL_RUNS)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}
