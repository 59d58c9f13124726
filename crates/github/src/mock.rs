//! `MockSource` — a test double for `RunSource`.
//!
//! Replays a canned HTTP status and body through the same decoding path the
//! real client uses, so tests exercise `Http` and `Decode` failures exactly
//! as they happen in production.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::{client::decode_runs_response, FetchError, RunSource, WorkflowRunsPage};

/// A mock source that records every request and answers with a fixed
/// status and body.
pub struct MockSource {
    pub status: u16,
    pub body: String,
    /// All `(owner, repo)` pairs requested so far, in call order.
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockSource {
    /// Answer `200 OK` with the given JSON.
    pub fn ok(body: serde_json::Value) -> Self {
        Self::responding(200, body.to_string())
    }

    /// Answer with an arbitrary status and raw body.
    pub fn responding(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of fetches performed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RunSource for MockSource {
    async fn fetch_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<WorkflowRunsPage, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((owner.to_string(), repo.to_string()));
        decode_runs_response(self.status, &self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_calls_and_replays_body() {
        let source = MockSource::ok(json!({ "workflow_runs": [{ "id": 5 }] }));
        let page = source.fetch_workflow_runs("octo", "hello").await.unwrap();

        assert_eq!(page.workflow_runs.unwrap()[0].id, Some(5));
        assert_eq!(source.call_count(), 1);
        assert_eq!(
            source.calls.lock().unwrap()[0],
            ("octo".to_string(), "hello".to_string())
        );
    }

    #[tokio::test]
    async fn replays_error_status() {
        let source = MockSource::responding(401, "Bad credentials");
        let err = source.fetch_workflow_runs("o", "r").await.unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 401, .. }));
    }
}
