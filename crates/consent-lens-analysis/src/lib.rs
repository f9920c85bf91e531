#![warn(missing_docs)]
//! # consent-lens-analysis
//!
//! ## Purpose
//! Implements the analysis coordinator: the content-addressed cache, the
//! single-flight analyze pipeline, and the inter-context message router.
//!
//! ## Responsibilities
//! - Derive the mode-independent cache key from bounded input text.
//! - Serve cache hits without network involvement; treat mode mismatches as
//!   misses.
//! - Run the remote call on a miss, normalize, and write the cache exactly
//!   once per successful call.
//! - Recover every failure into an in-band error descriptor.
//!
//! ## Data flow
//! [`Request`] -> [`MessageRouter::handle`] -> [`AnalysisCoordinator::analyze`]
//! -> cache lookup -> (miss) transport call -> normalization -> cache write
//! -> [`Response`].
//!
//! ## Ownership and lifetimes
//! Transport, store, and link opener are shared `Arc<dyn …>` collaborators;
//! the coordinator owns no mutable state of its own, so concurrent calls
//! need no coordination. Duplicate in-flight calls for identical input may
//! both write the same key; last writer wins on idempotent results.
//!
//! ## Error model
//! [`AnalysisError`] carries the failure taxonomy (`no_tab`, `api_error`,
//! `processing_failed`, `no_content`); the router converts it into
//! [`Response::Failure`] so no failure escapes as an unhandled fault.
//!
//! ## Security and privacy notes
//! Cache keys are hashes, never raw text. Error details carry bounded
//! transport snippets only, never the analyzed input.
//!
//! ## Example
//! ```rust
//! use consent_lens_analysis::cache_key_for_text;
//!
//! let key = cache_key_for_text("개인정보 수집 동의 안내");
//! assert!(key.starts_with("analysis:"));
//! assert_eq!(key.len(), "analysis:".len() + 64);
//! ```

use std::sync::Arc;

use consent_lens_client::{AnalyzeRequest, AnalyzerEndpoints, AnalyzerTransport, format_error};
use consent_lens_contract::{normalize_response, sanitize_full_link};
use consent_lens_core::{
    AnalysisResult, ErrorCode, HASH_INPUT_CHAR_LIMIT, Mode, ORIGINAL_TEXT_CHAR_LIMIT, Request,
    Response, ResultSource, SAMPLE_CHAR_LIMIT, bounded_chars,
};
use consent_lens_store::{ANALYSIS_KEY_PREFIX, KeyValueStore, Preferences, StoreError};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Completed analysis plus its provenance tag.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedOutcome {
    /// Cache or live provenance.
    pub source: ResultSource,
    /// Normalized record.
    pub result: AnalysisResult,
}

/// Derives the cache key for `text`.
///
/// Key = `"analysis:"` + lowercase hex SHA-256 over the UTF-8 bytes of the
/// first [`HASH_INPUT_CHAR_LIMIT`] chars. Texts sharing that prefix share a
/// key; the collision window is documented, not a bug. The key is a pure
/// function of the text prefix only — never of mode.
pub fn cache_key_for_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bounded_chars(text, HASH_INPUT_CHAR_LIMIT).as_bytes());
    format!("{ANALYSIS_KEY_PREFIX}{}", hex::encode(hasher.finalize()))
}

/// Opens sanitized report links in the host surface.
pub trait LinkOpener: Send + Sync {
    /// Opens `url`; the router has already re-checked sanitization.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Processing`] when the host refuses.
    fn open(&self, url: &str) -> Result<(), AnalysisError>;
}

/// The analysis coordinator described in the module docs.
#[derive(Clone)]
pub struct AnalysisCoordinator {
    transport: Arc<dyn AnalyzerTransport>,
    store: Arc<dyn KeyValueStore>,
    endpoints: AnalyzerEndpoints,
}

impl AnalysisCoordinator {
    /// Creates a coordinator over the given collaborators.
    pub fn new(
        transport: Arc<dyn AnalyzerTransport>,
        store: Arc<dyn KeyValueStore>,
        endpoints: AnalyzerEndpoints,
    ) -> Self {
        Self {
            transport,
            store,
            endpoints,
        }
    }

    /// Returns the mode selected by the stored free-mode preference.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Store`] on backend failure.
    pub fn preferred_mode(&self) -> Result<Mode, AnalysisError> {
        Ok(Preferences::load(self.store.as_ref())?.mode())
    }

    /// Runs one full analyze invocation for `text` in `mode`.
    ///
    /// Cache lookup strictly precedes any remote call; a remote call
    /// strictly precedes the single cache write. No retry happens here —
    /// failure is terminal for this invocation and retry is caller-driven.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Api`] for transport failures (nothing is
    /// cached on that path) and [`AnalysisError::Store`] when the cache
    /// backend fails.
    pub fn analyze(&self, text: &str, mode: Mode) -> Result<AnalyzedOutcome, AnalysisError> {
        let key = cache_key_for_text(text);

        if let Some(result) = self.cached_under_key(&key, mode)? {
            return Ok(AnalyzedOutcome {
                source: ResultSource::Cache,
                result,
            });
        }

        let request = AnalyzeRequest {
            text: text.to_string(),
        };
        let raw = self
            .transport
            .analyze(self.endpoints.for_mode(mode), &request)
            .map_err(|error| AnalysisError::Api {
                detail: format_error(&error),
            })?;

        let mut result = normalize_response(&raw, mode);
        result.original_text = bounded_chars(text, ORIGINAL_TEXT_CHAR_LIMIT).to_string();
        result.original_text_full = bounded_chars(text, SAMPLE_CHAR_LIMIT).to_string();

        let value = result
            .to_json_value()
            .map_err(|error| AnalysisError::Processing(error.to_string()))?;
        self.store.set(&key, value)?;

        Ok(AnalyzedOutcome {
            source: ResultSource::Api,
            result,
        })
    }

    /// Cache-only lookup for `text` in `mode`; never calls the network.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Store`] on backend failure.
    pub fn lookup_cached(
        &self,
        text: &str,
        mode: Mode,
    ) -> Result<Option<AnalysisResult>, AnalysisError> {
        let key = cache_key_for_text(text);
        self.cached_under_key(&key, mode)
    }

    /// Reads and mode-checks one cache entry.
    ///
    /// Entries written before the `mode` field existed match any requested
    /// mode and come back stamped with it. Undecodable entries are misses;
    /// the next successful call overwrites them wholesale.
    fn cached_under_key(
        &self,
        key: &str,
        mode: Mode,
    ) -> Result<Option<AnalysisResult>, AnalysisError> {
        let Some(value) = self.store.get(key)? else {
            return Ok(None);
        };

        // Invariant:
        // - The key never encodes mode, so a stored-mode mismatch must read
        //   as a miss rather than serve a free result to a full request.
        let legacy = value.get("mode").is_none();
        let Ok(mut result) = AnalysisResult::from_json_value(value) else {
            return Ok(None);
        };

        if legacy {
            result.mode = mode;
            return Ok(Some(result));
        }

        if result.mode == mode {
            Ok(Some(result))
        } else {
            Ok(None)
        }
    }
}

/// Dispatches inter-context requests onto the coordinator.
#[derive(Clone)]
pub struct MessageRouter {
    coordinator: AnalysisCoordinator,
    opener: Arc<dyn LinkOpener>,
}

impl MessageRouter {
    /// Creates a router over a coordinator and a link opener.
    pub fn new(coordinator: AnalysisCoordinator, opener: Arc<dyn LinkOpener>) -> Self {
        Self {
            coordinator,
            opener,
        }
    }

    /// Handles one request; every failure returns as [`Response::Failure`].
    ///
    /// `sender_tab` is the tab context attached by the host platform, used
    /// when the request payload carries none of its own.
    pub fn handle(&self, request: Request, sender_tab: Option<u32>) -> Response {
        match self.dispatch(request, sender_tab) {
            Ok(response) => response,
            Err(error) => Response::Failure {
                detail: error.public_detail(),
                error: error.code(),
            },
        }
    }

    fn dispatch(
        &self,
        request: Request,
        sender_tab: Option<u32>,
    ) -> Result<Response, AnalysisError> {
        match request {
            Request::FoundConsent { text } => {
                if sender_tab.is_none() {
                    return Err(AnalysisError::NoTab);
                }
                let mode = self.coordinator.preferred_mode()?;
                let outcome = self.coordinator.analyze(&text, mode)?;
                Ok(Response::Analysis {
                    source: outcome.source,
                    result: outcome.result,
                })
            }
            Request::AnalyzeTextDirect {
                text,
                tab_id,
                use_summary,
            } => {
                if tab_id.or(sender_tab).is_none() {
                    return Err(AnalysisError::NoTab);
                }
                let outcome = self
                    .coordinator
                    .analyze(&text, Mode::from_use_summary(use_summary))?;
                Ok(Response::Analysis {
                    source: outcome.source,
                    result: outcome.result,
                })
            }
            Request::GetCachedResult { text, use_summary } => {
                let result = self
                    .coordinator
                    .lookup_cached(&text, Mode::from_use_summary(use_summary))?;
                Ok(Response::Cached { result })
            }
            Request::OpenFullResult { url, payload } => {
                let mode = match payload {
                    Some(result) => result.mode,
                    None => self.coordinator.preferred_mode()?,
                };
                // Only links that are a fixed point of sanitization may open.
                let ok = sanitize_full_link(&url, mode).as_deref() == Some(url.as_str())
                    && self.opener.open(&url).is_ok();
                Ok(Response::Opened { ok })
            }
        }
    }
}

/// Coordinator error taxonomy.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Required tab context unavailable.
    #[error("no tab context available")]
    NoTab,
    /// Remote analyzer call failed; nothing was cached.
    #[error("analyzer call failed: {detail}")]
    Api {
        /// Bounded human-readable failure detail.
        detail: String,
    },
    /// Persistent store failure.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    /// Unexpected failure during coordination.
    #[error("processing failed: {0}")]
    Processing(String),
    /// Companion scanner unreachable in the current page context.
    #[error("page content unavailable")]
    NoContent,
}

impl AnalysisError {
    /// Maps the error onto its wire code.
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::NoTab => ErrorCode::NoTab,
            AnalysisError::Api { .. } => ErrorCode::ApiError,
            AnalysisError::Store(_) | AnalysisError::Processing(_) => ErrorCode::ProcessingFailed,
            AnalysisError::NoContent => ErrorCode::NoContent,
        }
    }

    /// Returns the detail string exposed in responses.
    ///
    /// Only `api_error` carries detail on the wire; other categories stay
    /// terse for the user and keep internals out of band.
    pub fn public_detail(&self) -> Option<String> {
        match self {
            AnalysisError::Api { detail } => Some(detail.clone()),
            _ => None,
        }
    }
}
