//! Row structs for the `pipeline_runs` table.
//!
//! Persistence shapes only. The mapping from the provider's JSON lives in
//! `pipeline::normalize`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A normalized workflow run, ready to be upserted.
///
/// `run_id` is optional because the provider may omit it; such a run is
/// rejected before any database call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRun {
    pub run_id: Option<i64>,
    pub workflow_id: Option<i64>,
    pub workflow_name: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub event: Option<String>,
    /// Source branch (`head_branch` on the provider side).
    pub branch: Option<String>,
    /// Head commit (`head_sha` on the provider side).
    pub commit_sha: Option<String>,
    /// Login of the triggering user.
    pub actor: Option<String>,
    pub run_number: Option<i64>,
    pub run_attempt: Option<i64>,
    pub run_started_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// `updated_at - run_started_at`, never negative.
    pub duration_ms: Option<i64>,
    pub html_url: Option<String>,
}

/// A persisted `pipeline_runs` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PipelineRunRow {
    pub run_id: i64,
    pub workflow_id: Option<i64>,
    pub workflow_name: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub event: Option<String>,
    pub branch: Option<String>,
    pub commit_sha: Option<String>,
    pub actor: Option<String>,
    pub run_number: Option<i64>,
    pub run_attempt: Option<i64>,
    pub run_started_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub html_url: Option<String>,
}

/// Result of a single upsert.
#[derive(Debug)]
pub enum UpsertOutcome {
    /// A new row was created.
    Inserted,
    /// An existing row with the same `run_id` was overwritten.
    Updated,
    /// The run had no `run_id`; nothing was sent to the database.
    Rejected,
    /// The write failed and its transaction was rolled back.
    Failed(crate::DbError),
}

impl UpsertOutcome {
    /// `Inserted` or `Updated`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Inserted | Self::Updated)
    }
}
