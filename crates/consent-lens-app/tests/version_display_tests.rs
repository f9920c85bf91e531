//! Integration tests for build-time version wiring.

use consent_lens_app::app_version;

#[test]
fn version_display_tests_version_comes_from_root_file() {
    let expected = include_str!("../../../VERSION").trim();
    assert_eq!(app_version(), expected);
    assert!(!app_version().is_empty());
}
