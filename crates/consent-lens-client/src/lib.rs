#![warn(missing_docs)]
//! # consent-lens-client
//!
//! ## Purpose
//! Executes remote analyzer calls through an injectable transport
//! abstraction.
//!
//! ## Responsibilities
//! - Validate analyzer endpoint policy (HTTPS only).
//! - Select the endpoint for the requested backend variant.
//! - Perform the bounded-timeout HTTP call and classify its failures.
//! - Format failures into bounded human-readable detail strings.
//!
//! ## Data flow
//! Coordinator builds an [`AnalyzeRequest`] -> [`AnalyzerTransport::analyze`]
//! posts it to the mode-selected endpoint -> raw JSON value returns for
//! normalization.
//!
//! ## Error model
//! Endpoint policy violations and every transport failure mode (timeout,
//! network, non-2xx, malformed body) surface as [`ClientError`]; callers
//! decide retry behavior — this crate never retries.
//!
//! ## Security and privacy notes
//! Failure details carry at most a 300-char response-body snippet and never
//! echo the submitted page text.

use std::time::Duration;

use consent_lens_core::{Mode, bounded_chars};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default full-analysis endpoint.
pub const DEFAULT_FULL_ENDPOINT: &str = "https://swai-backend.onrender.com/api/check";

/// Default free-tier endpoint.
pub const DEFAULT_FREE_ENDPOINT: &str = "https://swai-backend.onrender.com/api/check-free";

/// Hard deadline for one analyzer call; the call is aborted afterwards.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest response-body snippet kept on a failed call.
pub const BODY_SNIPPET_LIMIT: usize = 300;

/// Longest body excerpt repeated inside a formatted detail string.
const DETAIL_BODY_LIMIT: usize = 200;

/// Wire payload for one analyzer call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Bounded page-text sample.
    pub text: String,
}

/// Pair of analyzer endpoints, one per backend variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerEndpoints {
    full: String,
    free: String,
}

impl AnalyzerEndpoints {
    /// Creates a validated endpoint pair.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidEndpoint`] when either URL is not HTTPS.
    pub fn new(
        full: impl Into<String>,
        free: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let full = full.into();
        let free = free.into();
        validate_endpoint(&full)?;
        validate_endpoint(&free)?;
        Ok(Self { full, free })
    }

    /// Returns the built-in production endpoint pair.
    pub fn defaults() -> Self {
        Self {
            full: DEFAULT_FULL_ENDPOINT.to_string(),
            free: DEFAULT_FREE_ENDPOINT.to_string(),
        }
    }

    /// Selects the endpoint for `mode`.
    pub fn for_mode(&self, mode: Mode) -> &str {
        match mode {
            Mode::Full => &self.full,
            Mode::Free => &self.free,
        }
    }
}

impl Default for AnalyzerEndpoints {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Validates analyzer endpoint policy.
///
/// # Errors
/// Returns [`ClientError::InvalidEndpoint`] for unparseable or non-HTTPS
/// URLs.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ClientError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| ClientError::InvalidEndpoint(format!("invalid analyzer url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(ClientError::InvalidEndpoint(
            "analyzer endpoint must use https".to_string(),
        ));
    }

    Ok(())
}

/// Abstract transport used by the coordinator.
pub trait AnalyzerTransport: Send + Sync {
    /// Posts one analyze request and returns the raw response JSON.
    ///
    /// # Errors
    /// Returns [`ClientError`] for every failure mode; implementations must
    /// not retry internally.
    fn analyze(
        &self,
        endpoint: &str,
        request: &AnalyzeRequest,
    ) -> Result<serde_json::Value, ClientError>;
}

/// Blocking HTTP transport with the bounded call timeout baked in.
#[derive(Debug, Clone)]
pub struct HttpAnalyzerTransport {
    client: reqwest::blocking::Client,
}

impl HttpAnalyzerTransport {
    /// Builds the transport with [`REQUEST_TIMEOUT`] applied to every call.
    ///
    /// # Errors
    /// Returns [`ClientError::Network`] when the underlying client cannot be
    /// constructed.
    pub fn new() -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| ClientError::Network(error.to_string()))?;

        Ok(Self { client })
    }
}

impl AnalyzerTransport for HttpAnalyzerTransport {
    fn analyze(
        &self,
        endpoint: &str,
        request: &AnalyzeRequest,
    ) -> Result<serde_json::Value, ClientError> {
        validate_endpoint(endpoint)?;

        let response = self
            .client
            .post(endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body_snippet: bounded_chars(&body, BODY_SNIPPET_LIMIT).to_string(),
            });
        }

        let body = response
            .text()
            .map_err(|error| ClientError::Network(error.to_string()))?;
        serde_json::from_str(&body).map_err(|error| ClientError::MalformedBody(error.to_string()))
    }
}

fn classify_send_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        return ClientError::Timeout;
    }
    ClientError::Network(error.to_string())
}

/// Formats a transport failure into the bounded detail string surfaced to
/// callers.
///
/// HTTP failures produce `"Analyzer HTTP {n} | status {n} | body: …"` with
/// the body excerpt capped at 200 chars.
pub fn format_error(error: &ClientError) -> String {
    match error {
        ClientError::Http {
            status,
            body_snippet,
        } => {
            let mut parts = vec![format!("Analyzer HTTP {status}"), format!("status {status}")];
            if !body_snippet.is_empty() {
                parts.push(format!(
                    "body: {}",
                    bounded_chars(body_snippet, DETAIL_BODY_LIMIT)
                ));
            }
            parts.join(" | ")
        }
        other => other.to_string(),
    }
}

/// Analyzer transport error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Endpoint violates transport policy.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Call exceeded [`REQUEST_TIMEOUT`] and was aborted.
    #[error("analyzer request timed out")]
    Timeout,
    /// Analyzer answered outside the 2xx range.
    #[error("Analyzer HTTP {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt, capped at [`BODY_SNIPPET_LIMIT`] chars.
        body_snippet: String,
    },
    /// Connection-level failure.
    #[error("analyzer network failure: {0}")]
    Network(String),
    /// 2xx response whose body was not valid JSON.
    #[error("malformed analyzer response: {0}")]
    MalformedBody(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for endpoint policy and failure formatting.

    use super::*;

    #[test]
    fn endpoint_policy_requires_https() {
        validate_endpoint("https://analyzer.example.test/api/check").expect("https should pass");
        assert!(validate_endpoint("http://analyzer.example.test/api/check").is_err());
        assert!(validate_endpoint("not a url").is_err());
    }

    #[test]
    fn endpoints_select_by_mode() {
        let endpoints = AnalyzerEndpoints::defaults();
        assert_eq!(endpoints.for_mode(Mode::Full), DEFAULT_FULL_ENDPOINT);
        assert_eq!(endpoints.for_mode(Mode::Free), DEFAULT_FREE_ENDPOINT);
    }

    #[test]
    fn http_failure_detail_names_status_and_bounds_body() {
        let error = ClientError::Http {
            status: 500,
            body_snippet: "b".repeat(BODY_SNIPPET_LIMIT),
        };
        let detail = format_error(&error);
        assert!(detail.contains("status 500"));
        assert!(detail.contains("Analyzer HTTP 500"));
        assert!(detail.len() < BODY_SNIPPET_LIMIT + 100);
    }

    #[test]
    fn timeout_detail_is_human_readable() {
        assert_eq!(format_error(&ClientError::Timeout), "analyzer request timed out");
    }
}
