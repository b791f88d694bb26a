//! Text measurement and block layout.
//!
//! Hit-testing, selection outlines, the floating editor, and both renderers
//! must agree on how big a text annotation is, so the layout math lives here
//! behind a small measurement trait. Native code and tests use the character
//! heuristic; the browser build substitutes real Canvas2D metrics.

use rp_core::model::{STICKY_NOTE_WIDTH, TextOptions};

/// Horizontal/vertical padding inside a text annotation's box.
pub const TEXT_PADDING: f64 = 8.0;
/// A text annotation's box never shrinks below this, so short labels stay
/// clickable.
pub const TEXT_MIN_WIDTH: f64 = 120.0;
pub const TEXT_MIN_HEIGHT: f64 = 40.0;
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;
/// Flat page-space padding around text/sticky boxes for hit-testing.
/// Deliberately not divided by scale — grabbing text stays easy when
/// zoomed out.
pub const SELECTION_PADDING: f64 = 20.0;
/// Sticky-note interior padding and fixed line height.
pub const STICKY_PADDING: f64 = 10.0;
pub const STICKY_LINE_HEIGHT: f64 = 16.0;

/// Measures a single line of text in page units.
pub trait TextMetrics {
    fn line_width(&self, text: &str, options: &TextOptions) -> f64;
}

/// Width heuristic for native builds and tests: 0.6 × font size per
/// character, a workable average for Arial at the sizes the toolbar offers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMetrics;

impl TextMetrics for HeuristicMetrics {
    fn line_width(&self, text: &str, options: &TextOptions) -> f64 {
        text.chars().count() as f64 * options.font_size * 0.6
    }
}

pub fn line_height(options: &TextOptions) -> f64 {
    options.font_size * LINE_HEIGHT_FACTOR
}

/// Full box of a text annotation: widest line plus padding, one line height
/// per `\n`-separated line, clamped to the minimum footprint.
pub fn text_block_size(text: &str, options: &TextOptions, metrics: &dyn TextMetrics) -> (f64, f64) {
    let mut max_width: f64 = 0.0;
    let mut lines = 0usize;
    for line in text.split('\n') {
        max_width = max_width.max(metrics.line_width(line, options));
        lines += 1;
    }
    let width = (max_width + TEXT_PADDING * 2.0).max(TEXT_MIN_WIDTH);
    let height = (lines as f64 * line_height(options) + TEXT_PADDING * 2.0).max(TEXT_MIN_HEIGHT);
    (width, height)
}

/// Greedy word wrap against the sticky note's content width. Explicit
/// newlines are preserved; a single word wider than the content width is
/// kept whole and overflows, exactly as the product renders it.
pub fn wrap_sticky_text(
    text: &str,
    options: &TextOptions,
    metrics: &dyn TextMetrics,
) -> Vec<String> {
    let max_width = STICKY_NOTE_WIDTH - STICKY_PADDING * 2.0;
    let mut wrapped = Vec::new();
    for line in text.split('\n') {
        if line.is_empty() {
            wrapped.push(String::new());
            continue;
        }
        if metrics.line_width(line, options) <= max_width {
            wrapped.push(line.to_string());
            continue;
        }
        let mut current = String::new();
        for word in line.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if metrics.line_width(&candidate, options) <= max_width {
                current = candidate;
            } else {
                if !current.is_empty() {
                    wrapped.push(current);
                }
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            wrapped.push(current);
        }
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_text_gets_the_minimum_box() {
        let (w, h) = text_block_size("", &TextOptions::default(), &HeuristicMetrics);
        assert_eq!((w, h), (TEXT_MIN_WIDTH, TEXT_MIN_HEIGHT));
    }

    #[test]
    fn wide_text_grows_past_the_minimum() {
        // 30 chars at 14px × 0.6 = 252, plus 16 padding.
        let text = "a".repeat(30);
        let (w, _) = text_block_size(&text, &TextOptions::default(), &HeuristicMetrics);
        assert_eq!(w, 252.0 + 16.0);
    }

    #[test]
    fn height_tracks_line_count() {
        let (_, h) = text_block_size("a\nb\nc\nd", &TextOptions::default(), &HeuristicMetrics);
        // 4 lines × 16.8 + 16 padding.
        assert_eq!(h, 4.0 * 14.0 * LINE_HEIGHT_FACTOR + 16.0);
    }

    #[test]
    fn short_lines_pass_through_the_wrapper() {
        let lines = wrap_sticky_text("hello world", &TextOptions::default(), &HeuristicMetrics);
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn long_lines_wrap_at_word_boundaries() {
        // Content width is 180; each 10-char word measures 84, so two fit
        // (84 + space + 84 = 176.4) but not three.
        let text = "aaaaaaaaaa bbbbbbbbbb cccccccccc dddddddddd";
        let lines = wrap_sticky_text(text, &TextOptions::default(), &HeuristicMetrics);
        assert_eq!(
            lines,
            vec!["aaaaaaaaaa bbbbbbbbbb", "cccccccccc dddddddddd"]
        );
    }

    #[test]
    fn explicit_newlines_and_blank_lines_survive_wrapping() {
        let lines = wrap_sticky_text("one\n\ntwo", &TextOptions::default(), &HeuristicMetrics);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn an_overlong_word_is_kept_whole() {
        let word = "w".repeat(40); // measures 336, wider than the content box
        let lines = wrap_sticky_text(&word, &TextOptions::default(), &HeuristicMetrics);
        assert_eq!(lines, vec![word]);
    }
}
