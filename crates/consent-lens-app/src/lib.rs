#![warn(missing_docs)]
//! # consent-lens-app
//!
//! ## Purpose
//! Orchestrates scanner, coordinator, presentation, store, and news-feed
//! state for `consent-lens`.
//!
//! ## Responsibilities
//! - Drive the popup scan flow (scheme gate, sampling, cached-first lookup,
//!   direct analysis, panel projection).
//! - Show a cached result automatically once per popup session.
//! - Expose the env kill switch and endpoint overrides.
//! - Keep news-feed read-state bookkeeping mode-scoped.
//! - Provide run logging with redaction of analyzed-text payloads.
//!
//! ## Data flow
//! Page source -> scanner sample -> coordinator analyze/lookup -> inline
//! card + status text -> host panel rendering.
//!
//! ## Ownership and lifetimes
//! Flow functions borrow shared collaborators and return owned
//! [`PanelUpdate`] snapshots; nothing here holds long-lived mutable state
//! beyond the per-popup session guard.
//!
//! ## Error model
//! Popup flows convert every failure into status text; programmatic entry
//! points return [`AppError`] wrapping the subsystem errors.
//!
//! ## Security and privacy notes
//! - Scanning honors the `CONSENT_LENS_SCAN_ENABLED` kill switch.
//! - Log redaction strips `text=` payloads and token material before any
//!   line reaches the run log.

pub mod logging;
pub mod news;

use consent_lens_analysis::{AnalysisCoordinator, AnalysisError};
use consent_lens_client::{
    AnalyzerEndpoints, ClientError, DEFAULT_FREE_ENDPOINT, DEFAULT_FULL_ENDPOINT,
};
use consent_lens_core::ResultSource;
use consent_lens_scanner::{PageTextSource, ScanError, is_blocked_scheme, sample_with_fallback};
use consent_lens_store::StoreError;
use consent_lens_ui::{InlineCard, inline_card, status};
use thiserror::Error;

/// Build-time application version loaded from the root `VERSION` file.
pub const APP_VERSION: &str = env!("CONSENT_LENS_VERSION");

/// Env var overriding the full-analysis endpoint.
pub const ENV_FULL_ENDPOINT: &str = "CONSENT_LENS_FULL_ENDPOINT";

/// Env var overriding the free-tier endpoint.
pub const ENV_FREE_ENDPOINT: &str = "CONSENT_LENS_FREE_ENDPOINT";

/// Env var for the runtime scan kill switch.
pub const ENV_SCAN_ENABLED: &str = "CONSENT_LENS_SCAN_ENABLED";

/// Returns the app version sourced from the root `VERSION` file.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Checks the runtime scan kill switch.
///
/// Semantics:
/// - Unset => scanning enabled.
/// - `0`, `false`, `off` (case-insensitive) => scanning disabled.
/// - Any other value => scanning enabled.
pub fn scan_enabled_from_env() -> bool {
    match std::env::var(ENV_SCAN_ENABLED) {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Builds the analyzer endpoint pair, honoring env overrides.
///
/// # Errors
/// Returns [`AppError::Client`] when an override violates endpoint policy.
pub fn endpoints_from_env() -> Result<AnalyzerEndpoints, AppError> {
    let full = std::env::var(ENV_FULL_ENDPOINT)
        .unwrap_or_else(|_| DEFAULT_FULL_ENDPOINT.to_string());
    let free = std::env::var(ENV_FREE_ENDPOINT)
        .unwrap_or_else(|_| DEFAULT_FREE_ENDPOINT.to_string());
    Ok(AnalyzerEndpoints::new(full, free)?)
}

/// Redacts common payload markers in log-safe output.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for key in ["text", "token", "authorization"] {
        redacted = redact_key_value(&redacted, key);
    }
    redacted
}

fn redact_key_value(input: &str, key: &str) -> String {
    let marker = format!("{key}=");
    let lower = input.to_ascii_lowercase();
    if let Some(position) = lower.find(&marker) {
        let prefix = &input[..position];
        return format!("{prefix}{key}=<redacted>");
    }

    input.to_string()
}

/// One popup panel refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelUpdate {
    /// Status line shown under the scan button.
    pub status: String,
    /// Secondary notice (fallback sampling warning).
    pub notice: Option<String>,
    /// Inline result card, when a result rendered.
    pub card: Option<InlineCard>,
    /// `true` once a result is on screen and the scan button hides.
    pub hide_scan_button: bool,
}

impl PanelUpdate {
    fn status_only(status: &str) -> Self {
        Self {
            status: status.to_string(),
            notice: None,
            card: None,
            hide_scan_button: false,
        }
    }
}

/// Runs the user-triggered popup scan flow end to end.
///
/// Order matches the shipped flow: scheme gate, sampling with whole-page
/// fallback, cached-first lookup, then one direct analysis. Every failure
/// lands in the status line; retry stays user-driven.
pub fn run_popup_scan(
    coordinator: &AnalysisCoordinator,
    source: &dyn PageTextSource,
) -> PanelUpdate {
    if is_blocked_scheme(&source.page_url()) {
        return PanelUpdate::status_only(status::RESTRICTED_PAGE);
    }

    let sampled = match sample_with_fallback(source) {
        Ok(Some(sampled)) => sampled,
        Ok(None) => return PanelUpdate::status_only(status::NO_CONSENT_TEXT),
        Err(ScanError::Source(_)) => {
            return PanelUpdate::status_only(status::CONTENT_UNAVAILABLE);
        }
    };
    let notice = sampled
        .from_fallback
        .then(|| status::FALLBACK_NOTICE.to_string());

    let mode = coordinator.preferred_mode().unwrap_or_default();

    if let Ok(Some(result)) = coordinator.lookup_cached(&sampled.text, mode) {
        return PanelUpdate {
            status: status::CACHED_SHOWN.to_string(),
            notice,
            card: Some(inline_card(&result, ResultSource::Cache)),
            hide_scan_button: true,
        };
    }

    match coordinator.analyze(&sampled.text, mode) {
        Ok(outcome) => PanelUpdate {
            status: status::RESULT_READY.to_string(),
            notice,
            card: Some(inline_card(&outcome.result, outcome.source)),
            hide_scan_button: true,
        },
        Err(_) => PanelUpdate {
            status: status::ANALYSIS_FAILED.to_string(),
            notice,
            card: None,
            hide_scan_button: false,
        },
    }
}

/// Per-popup-open session state.
///
/// Owns the "already tried the automatic cached display" guard, so opening
/// the popup probes the cache at most once.
#[derive(Debug, Default)]
pub struct PopupSession {
    tried_auto_cache: bool,
}

impl PopupSession {
    /// Creates a fresh session for a newly opened popup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a cached result for the current page, at most once per session.
    ///
    /// Silent by design: any miss, gate, or failure returns `None` and the
    /// panel stays untouched.
    pub fn show_cached_if_available(
        &mut self,
        coordinator: &AnalysisCoordinator,
        source: &dyn PageTextSource,
    ) -> Option<PanelUpdate> {
        if self.tried_auto_cache {
            return None;
        }
        self.tried_auto_cache = true;

        if is_blocked_scheme(&source.page_url()) {
            return None;
        }

        let sampled = sample_with_fallback(source).ok()??;
        let mode = coordinator.preferred_mode().ok()?;
        let result = coordinator.lookup_cached(&sampled.text, mode).ok()??;

        Some(PanelUpdate {
            status: status::CACHED_SHOWN.to_string(),
            notice: None,
            card: Some(inline_card(&result, ResultSource::Cache)),
            hide_scan_button: true,
        })
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Scanner subsystem error.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
    /// Coordinator subsystem error.
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    /// Store subsystem error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Transport subsystem error.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    /// News feed decode error.
    #[error("news feed decode error: {0}")]
    Feed(serde_json::Error),
    /// Run logger error.
    #[error("logging error: {0}")]
    Logging(String),
    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
