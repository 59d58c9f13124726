//! Typed view of the "list workflow runs for a repository" response.
//!
//! Every field is optional: the provider omits fields freely and a single odd
//! run must not sink the whole page. Timestamps stay as raw strings; turning
//! them into instants is the normalizer's job.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Body of `GET /repos/{owner}/{repo}/actions/runs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRunsPage {
    /// Total runs the provider knows about, across all pages.
    #[serde(default, deserialize_with = "lenient")]
    pub total_count: Option<i64>,
    /// The runs on this (first) page. `None` when the key is absent.
    #[serde(default, deserialize_with = "lenient_runs")]
    pub workflow_runs: Option<Vec<RawWorkflowRun>>,
}

/// One run as the provider reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWorkflowRun {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub workflow_id: Option<i64>,
    /// Workflow name.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub conclusion: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub event: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub head_branch: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub head_sha: Option<String>,
    #[serde(default, deserialize_with = "lenient_actor")]
    pub actor: Option<Actor>,
    #[serde(default, deserialize_with = "lenient")]
    pub run_number: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub run_attempt: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub run_started_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub html_url: Option<String>,
}

/// The user that triggered a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub login: String,
}

/// Keep a field only when its value has the expected type. A wrong-typed
/// value (a string `id`, a fractional `run_number`) is dropped with a
/// warning so the rest of the run survives.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match T::deserialize(&value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!("Ignoring malformed field value {value}: {e}");
            Ok(None)
        }
    }
}

/// Decode the run list item by item. An entry that is not a run object
/// becomes an empty run, which the sink later rejects for lack of an id.
fn lenient_runs<'de, D>(deserializer: D) -> Result<Option<Vec<RawWorkflowRun>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(items) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let runs = items
        .into_iter()
        .map(|item| {
            if !item.is_object() {
                warn!("Ignoring workflow run entry that is not an object: {item}");
                return RawWorkflowRun::default();
            }
            serde_json::from_value(item).unwrap_or_else(|e| {
                warn!("Ignoring malformed workflow run entry: {e}");
                RawWorkflowRun::default()
            })
        })
        .collect();
    Ok(Some(runs))
}

/// Accept any JSON for `actor`; keep it only when it is an object carrying a
/// string `login`.
fn lenient_actor<'de, D>(deserializer: D) -> Result<Option<Actor>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.get("login"))
        .and_then(Value::as_str)
        .map(|login| Actor { login: login.to_string() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run_with_actor(actor: Value) -> RawWorkflowRun {
        serde_json::from_value(json!({ "id": 1, "actor": actor })).unwrap()
    }

    #[test]
    fn actor_object_with_login_is_kept() {
        let run = run_with_actor(json!({ "login": "alice", "id": 7 }));
        assert_eq!(run.actor, Some(Actor { login: "alice".into() }));
    }

    #[test]
    fn malformed_actor_becomes_none() {
        assert_eq!(run_with_actor(json!("alice")).actor, None);
        assert_eq!(run_with_actor(json!({ "id": 7 })).actor, None);
        assert_eq!(run_with_actor(json!({ "login": 7 })).actor, None);
        assert_eq!(run_with_actor(Value::Null).actor, None);
    }

    #[test]
    fn missing_fields_default_to_none() {
        let run: RawWorkflowRun = serde_json::from_value(json!({})).unwrap();
        assert_eq!(run, RawWorkflowRun::default());
    }

    #[test]
    fn wrong_typed_fields_are_dropped_not_fatal() {
        let run: RawWorkflowRun = serde_json::from_value(json!({
            "id": 3,
            "run_number": 1.5,
            "run_attempt": "2",
            "name": 17,
            "head_branch": "main"
        }))
        .unwrap();
        assert_eq!(run.id, Some(3));
        assert_eq!(run.run_number, None);
        assert_eq!(run.run_attempt, None);
        assert_eq!(run.name, None);
        assert_eq!(run.head_branch.as_deref(), Some("main"));
    }

    #[test]
    fn one_bad_run_does_not_sink_the_page() {
        let page: WorkflowRunsPage = serde_json::from_value(json!({
            "total_count": 4,
            "workflow_runs": [
                { "id": 1 },
                { "id": "not-a-number" },
                7,
                { "id": 3, "run_number": 1.5 }
            ]
        }))
        .unwrap();
        let ids: Vec<_> = page.workflow_runs.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(1), None, None, Some(3)]);
    }

    #[test]
    fn page_without_run_list_decodes() {
        let page: WorkflowRunsPage =
            serde_json::from_value(json!({ "message": "Not Found" })).unwrap();
        assert!(page.workflow_runs.is_none());
        assert!(page.total_count.is_none());
    }
}
