#![warn(missing_docs)]
//! # consent-lens-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `consent-lens` workspace.
//!
//! ## Responsibilities
//! - Represent the canonical normalized analysis record and its tags.
//! - Define the inter-context request/response message contract.
//! - Provide bounded-text and score-clamping helpers used by every stage.
//!
//! ## Data flow
//! Scanner output enters the coordinator as a [`Request`], the coordinator
//! produces an [`AnalysisResult`] wrapped in a [`Response`], and the
//! presentation layer consumes the result or its [`ErrorCode`].
//!
//! ## Ownership and lifetimes
//! Messages and results own their backing strings (`String`, `Vec<String>`)
//! so values can cross the scanner/coordinator/presentation boundaries
//! without borrow coupling.
//!
//! ## Error model
//! JSON codec failures return [`CoreError`]; all other failure modes are
//! expressed in-band as [`ErrorCode`] descriptors, never as panics.
//!
//! ## Security and privacy notes
//! This crate never logs analyzed page text. Callers bounding text for
//! hashing or echo fields must use [`bounded_chars`] so multi-byte
//! characters are never split.
//!
//! ## Example
//! ```rust
//! use consent_lens_core::{bounded_chars, clamp_score, Mode};
//!
//! assert_eq!(clamp_score(150.0), 100);
//! assert_eq!(bounded_chars("abcdef", 3), "abc");
//! assert_eq!(Mode::from_use_summary(true), Mode::Free);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum input prefix (in chars) fed into the cache-key hash.
///
/// Texts differing only after this prefix intentionally collide; the bound
/// keeps hashing cost and collision surface fixed.
pub const HASH_INPUT_CHAR_LIMIT: usize = 5_000;

/// Maximum consent-text sample length (in chars) emitted by the scanner.
pub const SAMPLE_CHAR_LIMIT: usize = 15_000;

/// Bound for the short input echo carried in [`AnalysisResult::original_text`].
pub const ORIGINAL_TEXT_CHAR_LIMIT: usize = 500;

/// Label used when the backend supplies none and preview recovery fails.
pub const PLACEHOLDER_LABEL: &str = "(no label provided)";

/// Backend variant that produced a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Full inline analysis.
    #[default]
    Full,
    /// Free tier; results may carry a link-out instead of full detail.
    Free,
}

impl Mode {
    /// Maps the wire-level `useSummary` flag onto a mode.
    pub fn from_use_summary(use_summary: bool) -> Self {
        if use_summary { Mode::Free } else { Mode::Full }
    }

    /// Returns the wire spelling of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Full => "full",
            Mode::Free => "free",
        }
    }
}

/// Where an analysis result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Served from the persistent cache without a network call.
    Cache,
    /// Produced by a live remote call.
    Api,
}

/// Canonical normalized analysis record.
///
/// All fields use serde defaults so legacy cache entries written before a
/// field existed still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Risk score clamped to `0..=100`.
    pub score: u8,
    /// Short human-readable risk tier; never empty after normalization.
    pub label: String,
    /// Short findings in backend order.
    #[serde(default)]
    pub bullets: Vec<String>,
    /// Free-text summary, possibly empty.
    #[serde(default)]
    pub summary: String,
    /// Sanitized detailed-report link; only meaningful in free mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_link: Option<String>,
    /// Backend variant that produced this record.
    #[serde(default)]
    pub mode: Mode,
    /// Bounded echo of the analyzed input.
    #[serde(default)]
    pub original_text: String,
    /// Longer bounded echo of the analyzed input.
    #[serde(default)]
    pub original_text_full: String,
    /// Backend-supplied auxiliary fields preserved verbatim.
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl AnalysisResult {
    /// Serializes the record into a storable JSON value.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON encoding fails.
    pub fn to_json_value(&self) -> Result<serde_json::Value, CoreError> {
        serde_json::to_value(self).map_err(CoreError::Codec)
    }

    /// Decodes a record from a stored JSON value.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when the value does not decode.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(CoreError::Codec)
    }
}

/// Failure category surfaced to callers in-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Required tab context unavailable; retryable only after navigation.
    NoTab,
    /// Remote call failed (network, timeout, non-2xx, malformed body).
    ApiError,
    /// Unexpected failure during coordination.
    ProcessingFailed,
    /// Companion scanner unreachable in the current page context.
    NoContent,
}

impl ErrorCode {
    /// Returns the wire spelling of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoTab => "no_tab",
            ErrorCode::ApiError => "api_error",
            ErrorCode::ProcessingFailed => "processing_failed",
            ErrorCode::NoContent => "no_content",
        }
    }
}

/// Inter-context request message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Scanner found consent text on a qualifying page load.
    #[serde(rename = "FOUND_CONSENT")]
    FoundConsent {
        /// Bounded consent-text sample.
        text: String,
    },
    /// UI asks for a fresh analysis of already-fetched page text.
    #[serde(rename = "ANALYZE_TEXT_DIRECT", rename_all = "camelCase")]
    AnalyzeTextDirect {
        /// Bounded page-text sample.
        text: String,
        /// Tab the overlay should target.
        tab_id: Option<u32>,
        /// `true` selects the free backend variant.
        use_summary: bool,
    },
    /// UI asks whether a cached result exists; never triggers a remote call.
    #[serde(rename = "GET_CACHED_RESULT", rename_all = "camelCase")]
    GetCachedResult {
        /// Bounded page-text sample.
        text: String,
        /// `true` selects the free backend variant.
        use_summary: bool,
    },
    /// UI asks to open the sanitized full-report link.
    #[serde(rename = "OPEN_FULL_RESULT")]
    OpenFullResult {
        /// Sanitized report URL.
        url: String,
        /// Result the link belongs to, if the caller still holds it.
        payload: Option<AnalysisResult>,
    },
}

/// Inter-context response message.
///
/// Shapes match the wire contract: `{source, result}`, `{error, detail?}`,
/// `{ok}`, and `{result}` (nullable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// Completed analysis with its provenance tag.
    Analysis {
        /// Cache or live provenance.
        source: ResultSource,
        /// Normalized record.
        result: AnalysisResult,
    },
    /// Structured failure descriptor.
    Failure {
        /// Failure category.
        error: ErrorCode,
        /// Bounded human-readable detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// Acknowledgement for fire-and-forget style requests.
    Opened {
        /// `true` when the link was accepted and opened.
        ok: bool,
    },
    /// Cache-only lookup answer; `None` means miss.
    Cached {
        /// Cached record when present.
        result: Option<AnalysisResult>,
    },
}

/// Truncates `text` to at most `limit` chars without splitting a character.
pub fn bounded_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Rounds and clamps a raw backend score into `0..=100`.
///
/// Non-finite inputs clamp to `0`.
pub fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

/// Core codec error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON encoding/decoding error.
    #[error("result codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for the shared data model.

    use super::*;

    #[test]
    fn clamp_score_bounds_and_rounds() {
        assert_eq!(clamp_score(150.0), 100);
        assert_eq!(clamp_score(-3.0), 0);
        assert_eq!(clamp_score(42.6), 43);
        assert_eq!(clamp_score(f64::NAN), 0);
    }

    #[test]
    fn bounded_chars_respects_char_boundaries() {
        assert_eq!(bounded_chars("개인정보 수집", 4), "개인정보");
        assert_eq!(bounded_chars("short", 100), "short");
    }

    #[test]
    fn request_round_trips_wire_tag() {
        let request = Request::GetCachedResult {
            text: "sample".to_string(),
            use_summary: true,
        };
        let encoded = serde_json::to_value(&request).expect("request should encode");
        assert_eq!(encoded["type"], "GET_CACHED_RESULT");
        assert_eq!(encoded["useSummary"], true);

        let decoded: Request = serde_json::from_value(encoded).expect("request should decode");
        assert_eq!(decoded, request);
    }

    #[test]
    fn legacy_result_without_mode_defaults_to_full() {
        let legacy = serde_json::json!({
            "score": 10,
            "label": "Low"
        });
        let decoded = AnalysisResult::from_json_value(legacy).expect("legacy entry should decode");
        assert_eq!(decoded.mode, Mode::Full);
        assert!(decoded.bullets.is_empty());
    }

    #[test]
    fn failure_response_carries_snake_case_code() {
        let response = Response::Failure {
            error: ErrorCode::ApiError,
            detail: Some("status 500".to_string()),
        };
        let encoded = serde_json::to_value(&response).expect("response should encode");
        assert_eq!(encoded["error"], "api_error");
    }
}
