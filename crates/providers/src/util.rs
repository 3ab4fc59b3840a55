//! Shared utility functions for backend adapters.

use std::time::Duration;

use cr_domain::error::{Error, GenerationError, Result};

/// Upper bound on any single outbound backend call.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client every adapter uses.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    http_client_with_timeout(REQUEST_TIMEOUT)
}

pub(crate) fn http_client_with_timeout(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Other(format!("building HTTP client: {e}")))
}

/// Convert a [`reqwest::Error`] into a provider failure.
///
/// Timeouts and transport errors are both [`GenerationError::Provider`];
/// the message says which.
pub(crate) fn from_reqwest(provider: &str, e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::provider(provider, format!("request timed out: {e}"))
    } else {
        GenerationError::provider(provider, format!("HTTP: {e}"))
    }
}

/// Build the failure for a non-success HTTP status.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> GenerationError {
    GenerationError::provider(provider, format!("HTTP {} - {}", status.as_u16(), snippet(body)))
}

/// Parse a response body as JSON, reporting malformed bodies as provider errors.
pub(crate) fn parse_json(provider: &str, body: &str) -> std::result::Result<serde_json::Value, GenerationError> {
    serde_json::from_str(body)
        .map_err(|e| GenerationError::provider(provider, format!("malformed response body: {e}")))
}

/// Read an API key from the named environment variable.
///
/// Unset and blank variables both count as "no key".
pub(crate) fn resolve_api_key(env_var: &str) -> Option<String> {
    resolve_api_key_from(env_var, |k| std::env::var(k).ok())
}

pub(crate) fn resolve_api_key_from(
    env_var: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    lookup(env_var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First 200 characters of a body, for error messages.
fn snippet(body: &str) -> String {
    let mut s: String = body.chars().take(200).collect();
    if body.chars().count() > 200 {
        s.push('…');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_counts_as_missing() {
        assert_eq!(resolve_api_key_from("K", |_| Some("   ".into())), None);
        assert_eq!(resolve_api_key_from("K", |_| None), None);
    }

    #[test]
    fn key_is_trimmed() {
        assert_eq!(
            resolve_api_key_from("K", |_| Some(" sk-abc \n".into())).as_deref(),
            Some("sk-abc")
        );
    }

    #[test]
    fn status_error_truncates_long_bodies() {
        let body = "x".repeat(1_000);
        let err = status_error("openai", reqwest::StatusCode::BAD_GATEWAY, &body);
        let msg = err.to_string();
        assert!(msg.contains("HTTP 502"));
        assert!(msg.len() < 300);
    }

    #[test]
    fn malformed_json_is_a_provider_error() {
        let err = parse_json("ollama", "<html>").unwrap_err();
        assert!(matches!(err, GenerationError::Provider { .. }));
    }
}
