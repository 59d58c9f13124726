//! HTTP client for the GitHub Actions REST API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::{info, instrument, warn};

use crate::{FetchError, RunSource, WorkflowRunsPage};

/// Public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const ACCEPT_V3_JSON: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = "pipeline-pulse";

/// Authenticated client bound to one API root and one token.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    /// Build a client with the standard GitHub headers.
    ///
    /// The token is sent as `Authorization: token <token>` on every request.
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3_JSON));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// `{api_url}/repos/{owner}/{repo}/actions/runs`
    pub fn runs_url(&self, owner: &str, repo: &str) -> String {
        runs_url(&self.api_url, owner, repo)
    }
}

fn runs_url(api_url: &str, owner: &str, repo: &str) -> String {
    format!("{api_url}/repos/{owner}/{repo}/actions/runs")
}

#[async_trait]
impl RunSource for GitHubClient {
    #[instrument(skip(self))]
    async fn fetch_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<WorkflowRunsPage, FetchError> {
        let url = self.runs_url(owner, repo);
        info!("Fetching workflow runs from: {url}");

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("token {}", self.token))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        decode_runs_response(status, &body)
    }
}

/// Turn a raw status + body into a run page.
///
/// Non-2xx statuses win over the body: a JSON error document from the
/// provider is reported as [`FetchError::Http`], not decoded.
pub fn decode_runs_response(status: u16, body: &str) -> Result<WorkflowRunsPage, FetchError> {
    if !(200..300).contains(&status) {
        let body = (!body.is_empty()).then(|| body.to_string());
        return Err(FetchError::Http { status, body });
    }

    let page: WorkflowRunsPage = serde_json::from_str(body)?;

    if let (Some(total), Some(runs)) = (page.total_count, page.workflow_runs.as_ref()) {
        if total > runs.len() as i64 {
            warn!(
                "Provider reports {total} runs but only the first {} were returned; \
                 later pages are not fetched",
                runs.len()
            );
        }
    }

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_url_trims_trailing_slash_of_api_root() {
        let client = GitHubClient::new("https://ghe.example.com/api/v3/", "t").unwrap();
        assert_eq!(
            client.runs_url("octo", "hello"),
            "https://ghe.example.com/api/v3/repos/octo/hello/actions/runs"
        );
    }

    #[test]
    fn default_runs_url() {
        assert_eq!(
            runs_url(DEFAULT_API_URL, "GoogleCloudPlatform", "generative-ai-docs"),
            "https://api.github.com/repos/GoogleCloudPlatform/generative-ai-docs/actions/runs"
        );
    }

    #[test]
    fn not_found_is_http_error_with_body() {
        let err = decode_runs_response(404, r#"{"message":"Not Found"}"#).unwrap_err();
        match err {
            FetchError::Http { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body.as_deref(), Some(r#"{"message":"Not Found"}"#));
            }
            other => panic!("expected Http, got {other:?}"),
        }
    }

    #[test]
    fn empty_error_body_is_none() {
        let err = decode_runs_response(502, "").unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 502, body: None }));
        assert_eq!(err.to_string(), "HTTP 502: No content");
    }

    #[test]
    fn invalid_json_on_success_is_decode_error() {
        let err = decode_runs_response(200, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn success_body_decodes_runs() {
        let body = r#"{
            "total_count": 2,
            "workflow_runs": [
                { "id": 1, "head_branch": "main", "actor": { "login": "alice" } },
                { "id": 2, "actor": null }
            ]
        }"#;
        let page = decode_runs_response(200, body).unwrap();
        let runs = page.workflow_runs.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].head_branch.as_deref(), Some("main"));
        assert_eq!(runs[1].actor, None);
    }
}
