//! `MemoryConnector`: an in-process stand-in for the Postgres sink.
//!
//! Applies the same upsert rules as the `pipeline_runs` table (keyed on
//! `run_id`, `created_at` kept from the first write) and records what the
//! driver did, so driver tests need no database.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use db::{DbError, NormalizedRun, UpsertOutcome};

use crate::sink::{RunSink, SinkConnector};

/// Everything the in-memory database has seen.
#[derive(Debug, Default)]
pub struct MemoryState {
    /// Stored rows, keyed by `run_id`.
    pub rows: BTreeMap<i64, NormalizedRun>,
    pub connects: usize,
    pub schema_inits: usize,
    /// Upserts that reached the store (rejected runs never do).
    pub writes: usize,
    pub closes: usize,
    /// Refuse connections.
    pub fail_connect: bool,
    /// Fail schema initialisation.
    pub fail_schema: bool,
    /// Fail the write for these `run_id`s.
    pub fail_run_ids: HashSet<i64>,
}

/// Hands out sinks that all share one [`MemoryState`].
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    pub state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored rows in `run_id` order.
    pub fn rows(&self) -> Vec<NormalizedRun> {
        self.state.lock().unwrap().rows.values().cloned().collect()
    }
}

#[async_trait]
impl SinkConnector for MemoryConnector {
    type Sink = MemorySink;

    async fn connect(&self) -> Result<MemorySink, DbError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_connect {
            return Err(simulated("connection refused"));
        }
        state.connects += 1;
        Ok(MemorySink {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl RunSink for MemorySink {
    async fn ensure_schema(&mut self) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_schema {
            return Err(simulated("schema initialisation failed"));
        }
        state.schema_inits += 1;
        Ok(())
    }

    async fn upsert(&mut self, run: &NormalizedRun) -> UpsertOutcome {
        let Some(run_id) = run.run_id else {
            return UpsertOutcome::Rejected;
        };

        let mut state = self.state.lock().unwrap();
        state.writes += 1;
        if state.fail_run_ids.contains(&run_id) {
            return UpsertOutcome::Failed(simulated("write failed"));
        }

        match state.rows.get_mut(&run_id) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = NormalizedRun {
                    created_at,
                    ..run.clone()
                };
                UpsertOutcome::Updated
            }
            None => {
                state.rows.insert(run_id, run.clone());
                UpsertOutcome::Inserted
            }
        }
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().closes += 1;
    }
}

fn simulated(message: &str) -> DbError {
    DbError::Sqlx(sqlx::Error::Protocol(format!("simulated: {message}")))
}
