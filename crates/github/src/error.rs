//! Fetch-level error type.

use thiserror::Error;

/// Errors returned by a [`RunSource`](crate::RunSource).
///
/// The driver treats every variant the same way (nothing to process, the
/// batch ends without touching the database), but the variants keep the
/// log lines precise:
/// - `Transport` — DNS, connect, timeout, reset, or body read failure.
/// - `Http`      — the provider answered with a non-2xx status.
/// - `Decode`    — a 2xx answer whose body is not the expected JSON.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {}", .body.as_deref().unwrap_or("No content"))]
    Http {
        status: u16,
        /// Response body, `None` when the provider sent nothing.
        body: Option<String>,
    },

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
