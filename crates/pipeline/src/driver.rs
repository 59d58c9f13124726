//! Batch driver.
//!
//! One batch is:
//! 1. Fetch the first page of workflow runs for the repository.
//! 2. If that failed or carried no run list, stop: nothing touches the database.
//! 3. Open one sink (database connection) and make sure the schema exists.
//! 4. Normalize and upsert every run in order; each upsert commits on its own.
//! 5. Close the sink, whatever happened in 4, and report the tallies.

use std::fmt;

use tracing::{error, info, instrument, warn};

use github::{FetchError, GitHubClient, RawWorkflowRun, RunSource};

use crate::config::{PipelineConfig, RepoRef};
use crate::normalize::normalize;
use crate::sink::{PgConnector, RunSink, SinkConnector};
use crate::PipelineError;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Per-outcome counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Runs received from the provider.
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Runs without a `run_id`; never sent to the database.
    pub rejected: usize,
    /// Runs whose write failed and was rolled back.
    pub failed: usize,
}

impl BatchSummary {
    /// Inserted plus updated.
    pub fn succeeded(&self) -> usize {
        self.inserted + self.updated
    }

    /// Rejected plus failed.
    pub fn unsuccessful(&self) -> usize {
        self.rejected + self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successful inserts/updates: {} ({} inserted, {} updated), \
             Failed: {} ({} rejected, {} database errors), Fetched: {}",
            self.succeeded(),
            self.inserted,
            self.updated,
            self.unsuccessful(),
            self.rejected,
            self.failed,
            self.fetched,
        )
    }
}

/// Why a batch ended without processing anything.
#[derive(Debug)]
pub enum NoWorkReason {
    /// The fetch itself failed.
    FetchFailed(FetchError),
    /// The provider answered, but without a `workflow_runs` list.
    MissingRunList,
}

impl fmt::Display for NoWorkReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            Self::MissingRunList => write!(f, "response carried no workflow_runs list"),
        }
    }
}

/// How a batch that did not abort ended.
#[derive(Debug)]
pub enum BatchReport {
    /// Nothing was fetched; the database was never touched.
    NoWork(NoWorkReason),
    /// Every fetched run went through normalize + upsert.
    Completed(BatchSummary),
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Run one batch against GitHub and Postgres as described by `config`.
pub async fn run(config: &PipelineConfig) -> Result<BatchReport, PipelineError> {
    let source = GitHubClient::new(config.api_url.as_str(), config.token.as_str())?;
    let connector = PgConnector::new(config.db.clone(), config.schema_path.clone());
    run_batch(&config.repository, &source, &connector).await
}

/// Run one batch for `repository`.
///
/// # Errors
/// Only connection-level problems abort the batch: failing to open the sink
/// or to initialise the schema. Per-run rejections and write failures are
/// counted in the returned summary instead.
#[instrument(skip_all, fields(repository = %repository))]
pub async fn run_batch<S, C>(
    repository: &RepoRef,
    source: &S,
    connector: &C,
) -> Result<BatchReport, PipelineError>
where
    S: RunSource + ?Sized,
    C: SinkConnector,
{
    let page = match source
        .fetch_workflow_runs(&repository.owner, &repository.repo)
        .await
    {
        Ok(page) => page,
        Err(e) => {
            error!("Failed to fetch workflow runs for {repository}: {e}");
            return Ok(BatchReport::NoWork(NoWorkReason::FetchFailed(e)));
        }
    };

    let Some(runs) = page.workflow_runs else {
        warn!("Failed to fetch or no workflow runs found for {repository}.");
        return Ok(BatchReport::NoWork(NoWorkReason::MissingRunList));
    };
    info!("Successfully fetched {} workflow runs for {repository}.", runs.len());

    let mut sink = connector.connect().await?;
    let result = ingest(&mut sink, &runs).await;
    sink.close().await;

    let summary = result?;
    info!("Finished processing runs. {summary}");
    Ok(BatchReport::Completed(summary))
}

/// Schema, then normalize + upsert every run. The caller closes the sink.
async fn ingest<K: RunSink>(
    sink: &mut K,
    runs: &[RawWorkflowRun],
) -> Result<BatchSummary, PipelineError> {
    sink.ensure_schema().await?;

    let mut summary = BatchSummary {
        fetched: runs.len(),
        ..Default::default()
    };
    if runs.is_empty() {
        info!("No workflow runs to process.");
        return Ok(summary);
    }

    for raw in runs {
        let row = normalize(raw);
        match sink.upsert(&row).await {
            db::UpsertOutcome::Inserted => summary.inserted += 1,
            db::UpsertOutcome::Updated => summary.updated += 1,
            db::UpsertOutcome::Rejected => summary.rejected += 1,
            db::UpsertOutcome::Failed(e) => {
                warn!("Run {:?} not stored: {e}", row.run_id);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
