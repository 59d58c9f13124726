//! The `RunSource` trait — the contract every run provider must fulfil.

use async_trait::async_trait;

use crate::{FetchError, WorkflowRunsPage};

/// Something that can list the workflow runs of one repository.
///
/// The batch driver only ever talks to this trait, so tests can swap the
/// real HTTP client for [`MockSource`](crate::mock::MockSource).
#[async_trait]
pub trait RunSource: Send + Sync {
    /// Fetch the first page of workflow runs for `owner/repo`.
    ///
    /// Exactly one request, no retries, no pagination.
    async fn fetch_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<WorkflowRunsPage, FetchError>;
}
