//! `github` crate — the `RunSource` trait, the provider's run models and the
//! REST client that fetches them.
//!
//! The batch driver in the `pipeline` crate depends only on [`RunSource`];
//! [`GitHubClient`] is the production implementation and
//! [`mock::MockSource`] the test double.

pub mod client;
pub mod error;
pub mod mock;
pub mod models;
pub mod traits;

pub use client::{decode_runs_response, GitHubClient, DEFAULT_API_URL};
pub use error::FetchError;
pub use models::{Actor, RawWorkflowRun, WorkflowRunsPage};
pub use traits::RunSource;
