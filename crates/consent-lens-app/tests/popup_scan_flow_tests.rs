//! Integration tests for the end-to-end popup scan flow.

mod common;

use std::sync::Arc;

use common::{CONSENT_PAGE, ScriptedTransport, coordinator_with};
use consent_lens_app::{PopupSession, run_popup_scan};
use consent_lens_scanner::StaticPageSource;
use consent_lens_ui::status;
use serde_json::json;

#[test]
fn popup_scan_flow_tests_blocked_scheme_refuses_before_sampling() {
    let transport = Arc::new(ScriptedTransport::success(json!({"score": 50})));
    let (coordinator, _store) = coordinator_with(transport.clone());

    let source = StaticPageSource::new("chrome://settings", CONSENT_PAGE);
    let update = run_popup_scan(&coordinator, &source);

    assert_eq!(update.status, status::RESTRICTED_PAGE);
    assert!(update.card.is_none());
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn popup_scan_flow_tests_empty_page_reports_no_consent_text() {
    let transport = Arc::new(ScriptedTransport::success(json!({"score": 50})));
    let (coordinator, _store) = coordinator_with(transport.clone());

    let source = StaticPageSource::new("https://example.test", "   ");
    let update = run_popup_scan(&coordinator, &source);

    assert_eq!(update.status, status::NO_CONSENT_TEXT);
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn popup_scan_flow_tests_fallback_page_carries_notice() {
    let transport = Arc::new(ScriptedTransport::success(json!({"score": 35, "label": "Low"})));
    let (coordinator, _store) = coordinator_with(transport);

    let source = StaticPageSource::new("https://example.test", "plain page without keywords");
    let update = run_popup_scan(&coordinator, &source);

    assert_eq!(update.status, status::RESULT_READY);
    assert_eq!(update.notice.as_deref(), Some(status::FALLBACK_NOTICE));
    assert!(update.hide_scan_button);
}

#[test]
fn popup_scan_flow_tests_failed_analysis_keeps_scan_button() {
    let transport = Arc::new(ScriptedTransport::failure(500));
    let (coordinator, _store) = coordinator_with(transport);

    let source = StaticPageSource::new("https://example.test", CONSENT_PAGE);
    let update = run_popup_scan(&coordinator, &source);

    assert_eq!(update.status, status::ANALYSIS_FAILED);
    assert!(update.card.is_none());
    assert!(!update.hide_scan_button);
}

#[test]
fn popup_scan_flow_tests_second_scan_is_served_from_cache() {
    let transport = Arc::new(ScriptedTransport::success(json!({"score": 61, "label": "High"})));
    let (coordinator, _store) = coordinator_with(transport.clone());
    let source = StaticPageSource::new("https://example.test", CONSENT_PAGE);

    let first = run_popup_scan(&coordinator, &source);
    assert_eq!(first.status, status::RESULT_READY);

    let second = run_popup_scan(&coordinator, &source);
    assert_eq!(second.status, status::CACHED_SHOWN);
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn popup_scan_flow_tests_auto_cache_probe_runs_once_per_session() {
    let transport = Arc::new(ScriptedTransport::success(json!({"score": 61, "label": "High"})));
    let (coordinator, _store) = coordinator_with(transport);
    let source = StaticPageSource::new("https://example.test", CONSENT_PAGE);

    // Seed the cache with one live call.
    let _ = run_popup_scan(&coordinator, &source);

    let mut session = PopupSession::new();
    let shown = session
        .show_cached_if_available(&coordinator, &source)
        .expect("cached entry should display");
    assert_eq!(shown.status, status::CACHED_SHOWN);

    assert!(session.show_cached_if_available(&coordinator, &source).is_none());
}
