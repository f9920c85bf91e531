#![warn(missing_docs)]
//! # consent-lens-ui
//!
//! ## Purpose
//! Models the presentation layer: the risk gauge, its animation, overlay
//! lifecycle, and the popup panel state.
//!
//! ## Responsibilities
//! - Map scores onto gauge hues through the fixed piecewise-linear bands.
//! - Drive the cancellable 1-second ease-out gauge animation.
//! - Decide overlay render/remove/auto-dismiss policy, including zero-score
//!   suppression.
//! - Prepare inline-card content (summary line stripping, pills, status
//!   text).
//!
//! ## Data flow
//! Coordinator outcome -> [`overlay_for_result`] / [`inline_card`] ->
//! host-surface rendering (DOM and styling stay outside this crate).
//!
//! ## Ownership and lifetimes
//! All models own their strings; the animator is deterministic and clocked
//! by caller-supplied elapsed milliseconds, never a wall clock.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors; every input is
//! total-mapped to a render model.
//!
//! ## Security and privacy notes
//! Render models only ever carry the bounded fields of a normalized result.

use consent_lens_core::{AnalysisResult, Mode, ResultSource};

/// Gauge animation duration.
pub const ANIMATION_DURATION_MS: u64 = 1_000;

/// Auto-dismiss delay for rendered result overlays.
pub const RESULT_OVERLAY_TTL_MS: u64 = 6_000;

/// Auto-dismiss delay for error overlays.
pub const ERROR_OVERLAY_TTL_MS: u64 = 5_000;

/// Popup status lines for the scan flow.
pub mod status {
    /// Scan started.
    pub const SCANNING: &str = "Scanning...";
    /// A cached result was rendered.
    pub const CACHED_SHOWN: &str = "Cached result shown!";
    /// A live result was rendered.
    pub const RESULT_READY: &str = "Result ready!";
    /// The coordinator answered without a result.
    pub const NO_RESULT: &str = "No result returned.";
    /// The analyze call failed; the user may retry.
    pub const ANALYSIS_FAILED: &str = "Analysis failed. Try again.";
    /// The page held no qualifying text.
    pub const NO_CONSENT_TEXT: &str = "No consent text found on this page.";
    /// No active tab to scan.
    pub const NO_ACTIVE_TAB: &str = "No active tab available.";
    /// The page scheme is refused by the platform.
    pub const RESTRICTED_PAGE: &str = "Cannot run on this page (restricted by the browser).";
    /// The companion scanner is unreachable.
    pub const CONTENT_UNAVAILABLE: &str = "Content script unavailable on this page.";
    /// The keyword detector produced nothing; whole-page text was analyzed.
    pub const FALLBACK_NOTICE: &str = "Detector failed; analyzing full page text.";
}

/// Maps a (possibly mid-animation, fractional) score onto a gauge hue.
///
/// Bands: `[0,30]` constant 200, `(30,50]` linear 200→120, `(50,80]` linear
/// 120→50, above 80 linear 30→0. The step from 50 to 30 at the last band
/// boundary is intentional and carried from the shipped gauge. Result is
/// rounded and clamped to `[0,360]`.
pub fn score_to_hue(score: f64) -> u16 {
    let hue = if score <= 30.0 {
        200.0
    } else if score <= 50.0 {
        let t = (score - 30.0) / 20.0;
        200.0 - t * (200.0 - 120.0)
    } else if score <= 80.0 {
        let t = (score - 50.0) / 30.0;
        120.0 - t * (120.0 - 50.0)
    } else {
        let t = (score - 80.0) / 20.0;
        30.0 - t * 30.0
    };

    hue.round().clamp(0.0, 360.0) as u16
}

/// Water-fill color pair for one hue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaterColors {
    /// Main fill color.
    pub body: String,
    /// Gradient highlight color.
    pub highlight: String,
}

/// Returns the gauge fill colors for `hue`.
pub fn water_colors(hue: u16) -> WaterColors {
    WaterColors {
        body: format!("hsl({hue} 85% 52%)"),
        highlight: format!("hsl({hue} 90% 70%)"),
    }
}

/// Cubic ease-out curve over `t` in `[0,1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// One sampled animation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeFrame {
    /// Interpolated score value; also the fill percentage.
    pub value: f64,
    /// Hue for the interpolated value.
    pub hue: u16,
    /// Rounded value for the numeric readout.
    pub display_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveAnimation {
    from: f64,
    target: f64,
}

/// Deterministic, cancellable gauge animator.
///
/// Retargeting cancels any in-flight animation and restarts from the last
/// *committed* value; the committed value only advances when an animation
/// runs to completion. Callers clock frames with elapsed milliseconds since
/// the most recent [`GaugeAnimator::animate_to`].
#[derive(Debug, Default)]
pub struct GaugeAnimator {
    prev: f64,
    active: Option<ActiveAnimation>,
}

impl GaugeAnimator {
    /// Creates an animator resting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) an animation toward `target`.
    pub fn animate_to(&mut self, target: f64) {
        let target = target.clamp(0.0, 100.0);
        self.active = Some(ActiveAnimation {
            from: self.prev,
            target,
        });
    }

    /// Samples the frame at `elapsed_ms` since the animation started.
    ///
    /// Returns `None` when idle. The frame at or past
    /// [`ANIMATION_DURATION_MS`] is final: it commits the target and stops
    /// the animation, so a repeated call returns `None` (idempotent under
    /// re-entry).
    pub fn frame_at(&mut self, elapsed_ms: u64) -> Option<GaugeFrame> {
        let active = self.active?;

        let progress = (elapsed_ms as f64 / ANIMATION_DURATION_MS as f64).min(1.0);
        let eased = ease_out_cubic(progress);
        let value = active.from + (active.target - active.from) * eased;

        if progress >= 1.0 {
            self.prev = active.target;
            self.active = None;
        }

        Some(GaugeFrame {
            value,
            hue: score_to_hue(value),
            display_score: value.round().clamp(0.0, 100.0) as u8,
        })
    }

    /// Returns `true` while an animation is in flight.
    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Returns the last committed gauge value.
    pub fn committed(&self) -> f64 {
        self.prev
    }
}

/// What an overlay shows.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    /// Rendered analysis result.
    Result {
        /// Normalized record to render.
        result: AnalysisResult,
        /// Provenance pill.
        source: ResultSource,
    },
    /// Transient error card.
    Error {
        /// Short human-readable message.
        message: String,
        /// Optional bounded detail line.
        detail: Option<String>,
    },
}

/// One transient overlay with its auto-dismiss delay.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    /// Card content.
    pub content: OverlayContent,
    /// Auto-dismiss delay; user close may preempt it.
    pub ttl_ms: u64,
}

/// Instruction for the host page surface.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayDirective {
    /// Replace any existing overlay with this one.
    Render(Overlay),
    /// Remove any existing overlay and show nothing.
    Remove,
}

/// Builds the overlay directive for a successful result.
///
/// A score of exactly zero suppresses the overlay instead of rendering a
/// zero gauge. Whether zero means "no risk" or "no data" is a known
/// ambiguity in the scoring contract; the boundary keeps the shipped
/// suppression behavior.
pub fn overlay_for_result(result: &AnalysisResult, source: ResultSource) -> OverlayDirective {
    if result.score == 0 {
        return OverlayDirective::Remove;
    }

    OverlayDirective::Render(Overlay {
        content: OverlayContent::Result {
            result: result.clone(),
            source,
        },
        ttl_ms: RESULT_OVERLAY_TTL_MS,
    })
}

/// Builds the transient error overlay.
pub fn overlay_for_error(message: impl Into<String>, detail: Option<String>) -> Overlay {
    Overlay {
        content: OverlayContent::Error {
            message: message.into(),
            detail,
        },
        ttl_ms: ERROR_OVERLAY_TTL_MS,
    }
}

/// Returns the provenance pill text.
pub fn source_pill(source: ResultSource) -> &'static str {
    match source {
        ResultSource::Cache => "cached",
        ResultSource::Api => "live",
    }
}

/// Returns the mode pill text.
pub fn mode_pill(mode: Mode) -> &'static str {
    match mode {
        Mode::Free => "free",
        Mode::Full => "full",
    }
}

/// Strips `score:`/`label:` lines from a summary before display.
///
/// Those lines are machine-recovery material, not prose; matching is
/// case-insensitive on the line prefix.
pub fn strip_score_label_lines(summary: &str) -> String {
    summary
        .lines()
        .filter(|line| {
            let lower = line.trim().to_ascii_lowercase();
            !(lower.starts_with("score:") || lower.starts_with("label:"))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Inline result card model for the popup panel.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineCard {
    /// Gauge target score.
    pub score: u8,
    /// Risk tier line.
    pub label: String,
    /// Findings list in source order.
    pub bullets: Vec<String>,
    /// Display summary with recovery lines stripped.
    pub summary: String,
    /// Sanitized link-out, shown only in free mode.
    pub full_link: Option<String>,
    /// Mode pill text.
    pub mode_pill: &'static str,
    /// Provenance pill text.
    pub source_pill: &'static str,
}

/// Builds the inline card for a result.
///
/// The link-out renders only for free-mode results; full results carry
/// their detail inline.
pub fn inline_card(result: &AnalysisResult, source: ResultSource) -> InlineCard {
    let full_link = if result.mode == Mode::Free {
        result.full_link.clone()
    } else {
        None
    };

    InlineCard {
        score: result.score,
        label: result.label.clone(),
        bullets: result.bullets.clone(),
        summary: strip_score_label_lines(&result.summary),
        full_link,
        mode_pill: mode_pill(result.mode),
        source_pill: source_pill(source),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the gauge mapping, animation, and overlay policy.

    use super::*;

    fn sample_result(score: u8) -> AnalysisResult {
        AnalysisResult {
            score,
            label: "Medium".to_string(),
            bullets: vec!["collects email".to_string()],
            summary: "score: 42\nlabel: Medium\ncollects and shares email".to_string(),
            full_link: Some("https://gaeinjjeongbo.netlify.app/results/abc".to_string()),
            mode: Mode::Free,
            original_text: String::new(),
            original_text_full: String::new(),
            meta: serde_json::Map::new(),
        }
    }

    #[test]
    fn hue_bands_match_fixed_points() {
        assert_eq!(score_to_hue(0.0), 200);
        assert_eq!(score_to_hue(30.0), 200);
        assert_eq!(score_to_hue(50.0), 120);
        assert_eq!(score_to_hue(80.0), 50);
        assert_eq!(score_to_hue(81.0), 29);
        assert_eq!(score_to_hue(100.0), 0);
    }

    #[test]
    fn animation_completes_and_commits_target() {
        let mut animator = GaugeAnimator::new();
        animator.animate_to(60.0);

        let mid = animator
            .frame_at(ANIMATION_DURATION_MS / 2)
            .expect("mid frame should sample");
        assert!(mid.value > 0.0 && mid.value < 60.0);

        let last = animator
            .frame_at(ANIMATION_DURATION_MS)
            .expect("final frame should sample");
        assert_eq!(last.display_score, 60);
        assert!(!animator.is_animating());
        assert_eq!(animator.committed(), 60.0);
        assert!(animator.frame_at(ANIMATION_DURATION_MS + 1).is_none());
    }

    #[test]
    fn retarget_cancels_and_restarts_from_committed_value() {
        let mut animator = GaugeAnimator::new();
        animator.animate_to(80.0);
        let _ = animator.frame_at(200);

        // Retarget mid-flight: the unfinished run commits nothing.
        animator.animate_to(20.0);
        let first = animator.frame_at(0).expect("frame should sample");
        assert_eq!(first.value, 0.0);

        let _ = animator.frame_at(ANIMATION_DURATION_MS);
        assert_eq!(animator.committed(), 20.0);
    }

    #[test]
    fn zero_score_suppresses_overlay() {
        let directive = overlay_for_result(&sample_result(0), ResultSource::Api);
        assert_eq!(directive, OverlayDirective::Remove);

        match overlay_for_result(&sample_result(42), ResultSource::Api) {
            OverlayDirective::Render(overlay) => {
                assert_eq!(overlay.ttl_ms, RESULT_OVERLAY_TTL_MS);
            }
            OverlayDirective::Remove => panic!("non-zero score should render"),
        }
    }

    #[test]
    fn inline_card_strips_recovery_lines_and_gates_link_by_mode() {
        let card = inline_card(&sample_result(42), ResultSource::Cache);
        assert_eq!(card.summary, "collects and shares email");
        assert_eq!(card.source_pill, "cached");
        assert!(card.full_link.is_some());

        let mut full = sample_result(42);
        full.mode = Mode::Full;
        let card = inline_card(&full, ResultSource::Api);
        assert!(card.full_link.is_none());
        assert_eq!(card.mode_pill, "full");
    }
}
