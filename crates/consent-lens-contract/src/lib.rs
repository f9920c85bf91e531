#![warn(missing_docs)]
//! # consent-lens-contract
//!
//! ## Purpose
//! Normalizes arbitrary analyzer backend responses into the canonical
//! [`AnalysisResult`] record.
//!
//! ## Responsibilities
//! - Extract each result field through an explicit priority chain across the
//!   historical backend response shapes.
//! - Recover score/label from the `preview` string when structured fields
//!   are missing.
//! - Sanitize report links so free-mode results never expose the analyzer
//!   API host or query-embedded page text.
//! - Preserve unrecognized backend fields under `meta`.
//!
//! ## Data flow
//! Raw backend JSON value -> [`normalize_response`] -> [`AnalysisResult`]
//! consumed by the coordinator and cache.
//!
//! ## Ownership and lifetimes
//! Normalized values are owned; nothing borrows from the transient response
//! buffer after normalization.
//!
//! ## Error model
//! Normalization is total: absent or malformed fields fall through the
//! documented chains to defaults rather than failing.
//!
//! ## Security and privacy notes
//! [`sanitize_full_link`] is a hard contract: in free mode the returned link
//! never carries the analyzer API hostname or a `text` query parameter.

use std::sync::OnceLock;

use consent_lens_core::{AnalysisResult, Mode, PLACEHOLDER_LABEL, clamp_score};
use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

/// Analyzer backend host that must never leak into user-facing links.
pub const ANALYZER_API_HOST: &str = "swai-backend.onrender.com";

/// Public results page substituted when a free-mode link still points at the
/// analyzer host after sanitization.
pub const PUBLIC_RESULTS_URL: &str = "https://gaeinjjeongbo.netlify.app/results";

/// Results-API path prefix rewritten to the public results page in free mode.
pub const RESULTS_API_PATH_PREFIX: &str = "/api/results";

/// Score field priority chain, highest first.
const SCORE_PATHS: [&[&str]; 3] = [&["score"], &["riskScore"], &["result", "score"]];

/// Label field priority chain.
const LABEL_PATHS: [&[&str]; 2] = [&["label"], &["result", "label"]];

/// Bullet-list field priority chain.
const BULLET_PATHS: [&[&str]; 3] = [&["bullets"], &["issues"], &["result", "bullets"]];

/// Summary field priority chain.
const SUMMARY_PATHS: [&[&str]; 3] = [&["summary"], &["result", "summary"], &["description"]];

/// Link alias names probed inside `meta` first, then at the top level.
const LINK_ALIASES: [&str; 4] = ["fullLink", "fullUrl", "url", "link"];

/// Top-level fields consumed by normalization; everything else is preserved
/// under `meta`.
const KNOWN_FIELDS: [&str; 13] = [
    "score",
    "riskScore",
    "result",
    "label",
    "bullets",
    "issues",
    "summary",
    "description",
    "fullLink",
    "fullUrl",
    "url",
    "link",
    "meta",
];

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"score:\s*(\d+)").expect("score pattern is a fixed literal"))
}

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"label:\s*(.+)").expect("label pattern is a fixed literal"))
}

/// Normalizes one raw backend response into the canonical record.
///
/// `mode` tags the record and selects the free-mode link sanitization rules.
/// The input-echo fields are left empty; the coordinator stamps them because
/// only it holds the original input text.
pub fn normalize_response(raw: &Value, mode: Mode) -> AnalysisResult {
    let preview = preview_text(raw);

    let score = extract_numeric(raw, &SCORE_PATHS)
        .map(clamp_score)
        .or_else(|| preview.and_then(extract_score_from_preview))
        .unwrap_or(0);

    let label = extract_non_empty_string(raw, &LABEL_PATHS)
        .or_else(|| preview.and_then(extract_label_from_preview))
        .unwrap_or_else(|| PLACEHOLDER_LABEL.to_string());

    let bullets = BULLET_PATHS
        .iter()
        .find_map(|path| value_at(raw, path).and_then(Value::as_array))
        .map(|items| items.iter().map(stringify_bullet).collect())
        .unwrap_or_default();

    let summary = extract_non_empty_string(raw, &SUMMARY_PATHS)
        .or_else(|| preview.map(str::to_string))
        .unwrap_or_default();

    let full_link = raw_link(raw).and_then(|link| sanitize_full_link(link, mode));

    AnalysisResult {
        score,
        label,
        bullets,
        summary,
        full_link,
        mode,
        original_text: String::new(),
        original_text_full: String::new(),
        meta: collect_meta(raw),
    }
}

/// Recovers a clamped score from a `score: <digits>` preview line.
pub fn extract_score_from_preview(preview: &str) -> Option<u8> {
    let captures = score_pattern().captures(preview)?;
    let digits = captures.get(1)?.as_str();
    digits.parse::<f64>().ok().map(clamp_score)
}

/// Recovers a label from a `label: <text>` preview line.
pub fn extract_label_from_preview(preview: &str) -> Option<String> {
    let captures = label_pattern().captures(preview)?;
    let label = captures.get(1)?.as_str().trim();
    if label.is_empty() {
        return None;
    }
    Some(label.to_string())
}

/// Sanitizes a report link before it may reach the user.
///
/// Always strips a `text` query parameter. In free mode additionally strips
/// every query parameter, rewrites the results-API path to the public
/// results path, and replaces any link still pointing at the analyzer host
/// with [`PUBLIC_RESULTS_URL`]. Unparseable links are dropped entirely.
pub fn sanitize_full_link(link: &str, mode: Mode) -> Option<String> {
    let mut parsed = Url::parse(link).ok()?;

    // The analyzed text must never ride along in a link query.
    let retained: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "text")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if retained.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(retained);
    }

    if mode == Mode::Free {
        parsed.set_query(None);

        if let Some(rest) = parsed.path().strip_prefix(RESULTS_API_PATH_PREFIX) {
            let public_path = format!("/results{rest}");
            parsed.set_path(&public_path);
        }

        if parsed.host_str() == Some(ANALYZER_API_HOST) {
            return Some(PUBLIC_RESULTS_URL.to_string());
        }
    }

    Some(parsed.to_string())
}

fn value_at<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = raw;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

fn extract_numeric(raw: &Value, paths: &[&[&str]]) -> Option<f64> {
    paths
        .iter()
        .find_map(|path| value_at(raw, path).and_then(Value::as_f64))
}

fn extract_non_empty_string(raw: &Value, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| {
        value_at(raw, path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })
}

fn preview_text(raw: &Value) -> Option<&str> {
    value_at(raw, &["meta", "preview"])
        .or_else(|| value_at(raw, &["preview"]))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn stringify_bullet(item: &Value) -> String {
    match item {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn raw_link(raw: &Value) -> Option<&str> {
    let meta = raw.get("meta");
    LINK_ALIASES
        .iter()
        .find_map(|alias| meta.and_then(|meta| meta.get(alias)).and_then(Value::as_str))
        .or_else(|| {
            LINK_ALIASES
                .iter()
                .find_map(|alias| raw.get(alias).and_then(Value::as_str))
        })
}

fn collect_meta(raw: &Value) -> Map<String, Value> {
    let mut meta = raw
        .get("meta")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if let Some(fields) = raw.as_object() {
        for (key, value) in fields {
            if KNOWN_FIELDS.contains(&key.as_str()) || meta.contains_key(key) {
                continue;
            }
            meta.insert(key.clone(), value.clone());
        }
    }

    meta
}
