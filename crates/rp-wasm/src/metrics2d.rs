//! Real text measurement through the browser's Canvas2D `measureText`.
//!
//! The rest of the engine measures text behind the
//! [`TextMetrics`](rp_render::TextMetrics) trait; this adapter is the
//! browser-side implementation, so hit boxes match what the canvas actually
//! draws. `measureText` ignores the current transform, so widths come back
//! in CSS pixels, which at font sizes given in page units are page units.

use rp_core::model::TextOptions;
use rp_render::TextMetrics;
use web_sys::CanvasRenderingContext2d;

/// CSS font shorthand for a text options set, shared by measurement and
/// rendering so they can never disagree.
pub(crate) fn font_string(options: &TextOptions) -> String {
    let mut font = String::new();
    if options.italic {
        font.push_str("italic ");
    }
    if options.bold {
        font.push_str("bold ");
    }
    font.push_str(&format!("{}px {}", options.font_size, options.font_family));
    font
}

#[derive(Debug, Clone)]
pub struct CanvasMetrics {
    ctx: CanvasRenderingContext2d,
}

impl CanvasMetrics {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl TextMetrics for CanvasMetrics {
    fn line_width(&self, text: &str, options: &TextOptions) -> f64 {
        self.ctx.set_font(&font_string(options));
        match self.ctx.measure_text(text) {
            Ok(measured) => measured.width(),
            // Context lost or detached: fall back to the native heuristic.
            Err(_) => text.chars().count() as f64 * options.font_size * 0.6,
        }
    }
}
