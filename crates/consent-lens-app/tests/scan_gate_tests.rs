//! Integration tests for the per-page-load scan gate.

use consent_lens_core::SAMPLE_CHAR_LIMIT;
use consent_lens_scanner::{ScanSession, ScanTrigger, extract_consent_sample};

const CONSENT_PAGE: &str =
    "서비스 이용을 위해 개인정보 수집 및 이용에 동의해 주세요. 수집 항목: 이메일, 연락처.";

#[test]
fn scan_gate_tests_auto_fires_once_manual_bypasses() {
    let mut session = ScanSession::new();

    assert!(session.observe(ScanTrigger::Auto, CONSENT_PAGE).is_some());
    assert!(session.observe(ScanTrigger::Auto, CONSENT_PAGE).is_none());
    assert!(session.observe(ScanTrigger::Manual, CONSENT_PAGE).is_some());
    assert!(session.observe(ScanTrigger::Auto, CONSENT_PAGE).is_none());
}

#[test]
fn scan_gate_tests_fresh_session_resets_guard() {
    let mut first_load = ScanSession::new();
    assert!(first_load.observe(ScanTrigger::Auto, CONSENT_PAGE).is_some());

    let mut second_load = ScanSession::new();
    assert!(second_load.observe(ScanTrigger::Auto, CONSENT_PAGE).is_some());
}

#[test]
fn scan_gate_tests_sample_is_bounded() {
    let long_page = format!("개인정보 동의 {}", "가".repeat(SAMPLE_CHAR_LIMIT * 2));
    let sample = extract_consent_sample(&long_page).expect("keyword page should sample");
    assert_eq!(sample.chars().count(), SAMPLE_CHAR_LIMIT);
}
