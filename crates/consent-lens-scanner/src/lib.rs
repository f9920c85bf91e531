#![warn(missing_docs)]
//! # consent-lens-scanner
//!
//! ## Purpose
//! Decides whether a loaded page carries personal-data consent text and
//! produces a bounded sample of it.
//!
//! ## Responsibilities
//! - Match page text against the fixed consent keyword set.
//! - Bound qualifying samples to [`consent_lens_core::SAMPLE_CHAR_LIMIT`].
//! - Own the per-page-load send guard so auto scans fire at most once.
//! - Abstract the host page behind a text-source trait.
//! - Refuse restricted URL schemes before any scan attempt.
//!
//! ## Data flow
//! Host page text -> [`extract_consent_sample`] (or the whole-page fallback)
//! -> bounded sample -> coordinator request.
//!
//! ## Ownership and lifetimes
//! Samples are owned `String`s; nothing borrows from the host page once a
//! sample leaves this crate.
//!
//! ## Error model
//! An unreachable page source returns [`ScanError::Source`]; a reachable
//! page without qualifying text is `None`, not an error.
//!
//! ## Security and privacy notes
//! Samples are the only page content this crate emits, and they are always
//! length-bounded before leaving.
//!
//! ## Example
//! ```rust
//! use consent_lens_scanner::{ScanSession, ScanTrigger};
//!
//! let mut session = ScanSession::new();
//! let page = "본 약관은 개인정보 수집 및 이용에 동의하는 절차를 설명합니다.";
//! assert!(session.observe(ScanTrigger::Auto, page).is_some());
//! assert!(session.observe(ScanTrigger::Auto, page).is_none());
//! assert!(session.observe(ScanTrigger::Manual, page).is_some());
//! ```

use consent_lens_core::{SAMPLE_CHAR_LIMIT, bounded_chars};
use thiserror::Error;

/// Fixed consent keyword set.
///
/// Substring match, case-sensitive, first hit wins. The phrases are the
/// Korean consent-law wording the scanner was built to detect.
pub const CONSENT_KEYWORDS: [&str; 5] = [
    "개인정보 수집",
    "개인정보 활용",
    "개인정보 동의",
    "민감정보",
    "제3자 제공",
];

/// URL scheme prefixes the host platform refuses to script.
pub const BLOCKED_SCHEME_PREFIXES: [&str; 5] = [
    "chrome://",
    "edge://",
    "about:",
    "chrome-extension://",
    "view-source:",
];

/// What initiated a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTrigger {
    /// Fired once by the page-load hook.
    Auto,
    /// Explicit user action; bypasses the once-per-load guard.
    Manual,
}

/// Bounded page sample plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledText {
    /// Bounded, trimmed page text.
    pub text: String,
    /// `true` when the keyword gate failed and the whole-page fallback ran.
    pub from_fallback: bool,
}

/// Source of the current page's visible text.
pub trait PageTextSource: Send + Sync {
    /// Returns the page URL used for scheme policy checks.
    fn page_url(&self) -> String;

    /// Returns the page's visible text.
    ///
    /// # Errors
    /// Returns [`ScanError::Source`] when the page context is unreachable.
    fn page_text(&self) -> Result<String, ScanError>;
}

/// Deterministic in-memory page source for tests and the CLI path.
#[derive(Debug, Clone)]
pub struct StaticPageSource {
    url: String,
    text: String,
}

impl StaticPageSource {
    /// Creates a source backed by fixed URL and text values.
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

impl PageTextSource for StaticPageSource {
    fn page_url(&self) -> String {
        self.url.clone()
    }

    fn page_text(&self) -> Result<String, ScanError> {
        Ok(self.text.clone())
    }
}

/// Per-page-load scan state.
///
/// One session exists per page load; it is never shared across loads, so the
/// auto-send guard resets naturally with navigation.
#[derive(Debug, Default)]
pub struct ScanSession {
    auto_sent: bool,
}

impl ScanSession {
    /// Creates a fresh session for a new page load.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the keyword gate over `body_text` and returns a bounded sample.
    ///
    /// `Auto` triggers produce at most one sample per session; `Manual`
    /// triggers bypass the guard. Any successful send arms the guard.
    pub fn observe(&mut self, trigger: ScanTrigger, body_text: &str) -> Option<String> {
        let sample = extract_consent_sample(body_text)?;
        if trigger == ScanTrigger::Auto && self.auto_sent {
            return None;
        }

        self.auto_sent = true;
        Some(sample)
    }

    /// Returns `true` once a sample has been emitted this page load.
    pub fn has_sent(&self) -> bool {
        self.auto_sent
    }
}

/// Extracts a bounded consent sample when the keyword gate passes.
///
/// Returns `None` for blank pages and for pages without any keyword hit.
pub fn extract_consent_sample(body_text: &str) -> Option<String> {
    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let has_match = CONSENT_KEYWORDS
        .iter()
        .any(|keyword| trimmed.contains(keyword));
    if !has_match {
        return None;
    }

    Some(bounded_chars(trimmed, SAMPLE_CHAR_LIMIT).to_string())
}

/// Bounded whole-page sample used when the keyword gate finds nothing but
/// the caller explicitly asked for page text.
pub fn fallback_sample(body_text: &str) -> Option<String> {
    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(bounded_chars(trimmed, SAMPLE_CHAR_LIMIT).to_string())
}

/// Returns `true` for URL schemes the platform refuses to script.
pub fn is_blocked_scheme(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    BLOCKED_SCHEME_PREFIXES
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Fetches page text and applies the keyword gate with whole-page fallback.
///
/// # Returns
/// - `Ok(Some(sample))` with `from_fallback` marking which path produced it.
/// - `Ok(None)` for a reachable page with no usable text.
///
/// # Errors
/// Returns [`ScanError::Source`] when the page source is unreachable.
pub fn sample_with_fallback(
    source: &dyn PageTextSource,
) -> Result<Option<SampledText>, ScanError> {
    let body_text = source.page_text()?;

    if let Some(text) = extract_consent_sample(&body_text) {
        return Ok(Some(SampledText {
            text,
            from_fallback: false,
        }));
    }

    Ok(fallback_sample(&body_text).map(|text| SampledText {
        text,
        from_fallback: true,
    }))
}

/// Scanner error type.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Page context could not be reached.
    #[error("page source unreachable: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for the keyword gate and session guard.

    use super::*;

    const CONSENT_PAGE: &str =
        "서비스 이용을 위해 개인정보 수집 및 이용에 동의해 주세요. 수집 항목: 이메일.";

    #[test]
    fn keyword_gate_requires_exact_substring() {
        assert!(extract_consent_sample(CONSENT_PAGE).is_some());
        assert!(extract_consent_sample("nothing sensitive here").is_none());
        assert!(extract_consent_sample("   \n\t  ").is_none());
    }

    #[test]
    fn sample_is_bounded_and_trimmed() {
        let long_page = format!("  개인정보 동의 {}", "가".repeat(SAMPLE_CHAR_LIMIT * 2));
        let sample = extract_consent_sample(&long_page).expect("keyword page should sample");
        assert_eq!(sample.chars().count(), SAMPLE_CHAR_LIMIT);
        assert!(sample.starts_with("개인정보 동의"));
    }

    #[test]
    fn auto_guard_blocks_second_send_but_not_manual() {
        let mut session = ScanSession::new();
        assert!(session.observe(ScanTrigger::Auto, CONSENT_PAGE).is_some());
        assert!(session.observe(ScanTrigger::Auto, CONSENT_PAGE).is_none());
        assert!(session.observe(ScanTrigger::Manual, CONSENT_PAGE).is_some());
    }

    #[test]
    fn blocked_schemes_match_prefixes_only() {
        assert!(is_blocked_scheme("chrome://settings"));
        assert!(is_blocked_scheme("view-source:https://example.test"));
        assert!(!is_blocked_scheme("https://example.test/chrome://fake"));
        assert!(!is_blocked_scheme(""));
    }

    #[test]
    fn fallback_runs_only_without_keyword_hit() {
        let source = StaticPageSource::new("https://example.test", "plain page body");
        let sampled = sample_with_fallback(&source)
            .expect("static source should be reachable")
            .expect("non-empty page should sample");
        assert!(sampled.from_fallback);

        let source = StaticPageSource::new("https://example.test", CONSENT_PAGE);
        let sampled = sample_with_fallback(&source)
            .expect("static source should be reachable")
            .expect("consent page should sample");
        assert!(!sampled.from_fallback);
    }
}
