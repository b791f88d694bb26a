//! Canvas2D frame renderer.
//!
//! Mirrors the Vello painter in `rp-render` against a browser
//! `CanvasRenderingContext2d`: same frame input, same draw order
//! (committed annotations with selection decorations, then the transient
//! overlay), same palette. Geometry is emitted in page units under a
//! `ctx.scale(scale, scale)` transform; screen-constant decorations divide
//! by the scale.
//!
//! Unlike the native path, this backend draws glyphs today: text blocks,
//! wrapped sticky-note lines, and stamp labels all render through
//! `fillText`.

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use rp_core::geom::{Bounds, Point};
use rp_core::model::{
    Annotation, AnnotationKind, AnnotationStyle, Color, STICKY_NOTE_FOLD, STICKY_NOTE_HEIGHT,
    STICKY_NOTE_WIDTH, TextOptions,
};
use rp_render::paint::{
    BADGE_COLOR, Draft, FrameState, Ghost, MARQUEE_COLOR, SELECTION_MULTI, SELECTION_SINGLE,
    STICKY_COLOR, TEXT_GHOST_HEIGHT, TEXT_GHOST_WIDTH, TextDrag,
};
use rp_render::resize::handle_position;
use rp_render::text::{
    LINE_HEIGHT_FACTOR, STICKY_LINE_HEIGHT, STICKY_PADDING, TEXT_PADDING, line_height,
    wrap_sticky_text,
};
use rp_render::{Handle, TextMetrics, annotation_bounds};

use crate::metrics2d::font_string;

// ─── Frame entry point ───────────────────────────────────────────────────

/// Paint one page's frame. The caller has already cleared the canvas (or
/// drawn the PDF raster beneath); this layer is annotations only.
pub fn render_page(
    ctx: &CanvasRenderingContext2d,
    frame: &FrameState<'_>,
    metrics: &dyn TextMetrics,
    time_ms: f64,
) {
    ctx.save();
    let _ = ctx.scale(frame.scale, frame.scale);

    let multi = frame.selected.len() > 1;
    for annotation in frame.annotations {
        if annotation.page_number != frame.page || annotation.points.is_empty() {
            continue;
        }
        if frame.editing == Some(annotation.id) {
            // The live editor overlays this one.
            continue;
        }
        draw_annotation(ctx, annotation, metrics);
        if frame.selected.contains(&annotation.id) {
            draw_selection(ctx, annotation, multi, frame.scale, metrics);
        }
    }

    let transient = frame.transient;
    if let Some(draft) = &transient.draft {
        draw_draft(ctx, draft);
    }
    if let Some(drag) = &transient.text_drag {
        draw_text_drag(ctx, drag, frame.scale);
    }
    if let Some((a, b)) = transient.marquee {
        draw_marquee(ctx, a, b, frame.scale);
    }
    if let Some(center) = transient.uniform_badge {
        draw_uniform_badge(ctx, center, frame.scale, metrics);
    }
    if let Some(ghost) = &transient.ghost {
        // Gentle pulse so the armed tool reads as live.
        let pulse = 0.75 + 0.25 * (time_ms / 400.0).sin();
        draw_ghost(ctx, ghost, frame.scale, pulse);
    }

    ctx.restore();
}

// ─── Committed annotations ───────────────────────────────────────────────

/// Draw one committed annotation, dispatching by kind. Shared with the
/// export path, which replays the same painters at a different scale.
pub(crate) fn draw_annotation(
    ctx: &CanvasRenderingContext2d,
    annotation: &Annotation,
    metrics: &dyn TextMetrics,
) {
    let style = &annotation.style;
    let points = &annotation.points;
    ctx.save();
    match annotation.kind {
        AnnotationKind::Freehand => {
            set_stroke(ctx, style);
            trace_freehand(ctx, points);
            ctx.stroke();
        }
        AnnotationKind::Line => {
            if points.len() >= 2 {
                set_stroke(ctx, style);
                ctx.begin_path();
                ctx.move_to(points[0].x, points[0].y);
                ctx.line_to(points[1].x, points[1].y);
                ctx.stroke();
            }
        }
        AnnotationKind::Rectangle => {
            if let Some(b) = annotation.point_bounds() {
                set_stroke(ctx, style);
                ctx.stroke_rect(b.left, b.top, b.width(), b.height());
            }
        }
        AnnotationKind::Circle => {
            if let Some((center, radius)) = annotation.circle_geometry() {
                set_stroke(ctx, style);
                ctx.begin_path();
                let _ = ctx.arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU);
                ctx.stroke();
            }
        }
        AnnotationKind::Triangle => {
            if let Some(b) = annotation.point_bounds() {
                set_stroke(ctx, style);
                trace_triangle(ctx, &b);
                ctx.stroke();
            }
        }
        AnnotationKind::Star => {
            if let Some(b) = annotation.point_bounds() {
                set_stroke(ctx, style);
                trace_star(ctx, &b);
                ctx.stroke();
            }
        }
        AnnotationKind::Arrow | AnnotationKind::DoubleArrow => {
            if points.len() >= 2 {
                set_stroke(ctx, style);
                let both = annotation.kind == AnnotationKind::DoubleArrow;
                trace_arrow(ctx, points[0], points[1], style.line_width, both);
                ctx.stroke();
            }
        }
        AnnotationKind::Highlight => {
            // Filled polygon at the forced highlight opacity.
            ctx.set_fill_style_str(&style.color.to_hex());
            ctx.set_global_alpha(style.opacity);
            trace_polygon(ctx, points);
            ctx.fill();
        }
        AnnotationKind::Text => draw_text_block(ctx, annotation, metrics),
        AnnotationKind::StickyNote => draw_sticky_note(ctx, annotation, metrics),
        kind if kind.is_stamp() => draw_stamp(ctx, annotation, metrics),
        _ => {}
    }
    ctx.restore();
}

/// Committed text: colored glyph runs at 8-unit padding and 1.2 line
/// height, no background, no border. Underline is a hand-drawn rule since
/// Canvas2D fonts have no decoration.
fn draw_text_block(
    ctx: &CanvasRenderingContext2d,
    annotation: &Annotation,
    metrics: &dyn TextMetrics,
) {
    let anchor = annotation.points[0];
    let options = annotation.style.text_options.clone().unwrap_or_default();
    let color = annotation.style.color.to_hex();
    ctx.set_font(&font_string(&options));
    ctx.set_fill_style_str(&color);
    ctx.set_global_alpha(annotation.style.opacity);
    ctx.set_text_baseline("top");
    ctx.set_text_align("left");

    let step = line_height(&options);
    let mut y = anchor.y + TEXT_PADDING;
    for line in annotation.text.as_deref().unwrap_or("").split('\n') {
        let _ = ctx.fill_text(line, anchor.x + TEXT_PADDING, y);
        if options.underline && !line.is_empty() {
            let width = metrics.line_width(line, &options);
            ctx.fill_rect(anchor.x + TEXT_PADDING, y + options.font_size + 1.0, width, 1.0);
        }
        y += step;
    }
}

fn draw_sticky_note(
    ctx: &CanvasRenderingContext2d,
    annotation: &Annotation,
    metrics: &dyn TextMetrics,
) {
    let anchor = annotation.points[0];
    draw_sticky_body(ctx, anchor, STICKY_NOTE_WIDTH, STICKY_NOTE_HEIGHT, 1.0);

    let options = annotation.style.text_options.clone().unwrap_or_default();
    ctx.set_font(&font_string(&options));
    ctx.set_fill_style_str("#000000");
    ctx.set_text_baseline("top");
    ctx.set_text_align("left");
    let lines = wrap_sticky_text(annotation.text.as_deref().unwrap_or(""), &options, metrics);
    for (i, line) in lines.iter().enumerate() {
        let y = anchor.y + STICKY_PADDING + i as f64 * STICKY_LINE_HEIGHT;
        // Clip to the paper: anything past the bottom edge is dropped.
        if y + STICKY_LINE_HEIGHT > anchor.y + STICKY_NOTE_HEIGHT - STICKY_PADDING {
            break;
        }
        let _ = ctx.fill_text(line, anchor.x + STICKY_PADDING, y);
    }
}

/// Yellow paper plus the folded top-right corner, shared by the committed
/// note and both previews.
fn draw_sticky_body(ctx: &CanvasRenderingContext2d, at: Point, width: f64, height: f64, alpha: f64) {
    ctx.set_global_alpha(alpha);
    ctx.set_fill_style_str(&STICKY_COLOR.to_hex());
    ctx.fill_rect(at.x, at.y, width, height);

    let fold = STICKY_NOTE_FOLD.min(width / 5.0).min(height / 5.0);
    ctx.set_fill_style_str(&rgba(&Color::BLACK, 0.1));
    ctx.begin_path();
    ctx.move_to(at.x + width - fold, at.y);
    ctx.line_to(at.x + width, at.y + fold);
    ctx.line_to(at.x + width, at.y);
    ctx.close_path();
    ctx.fill();
    ctx.set_global_alpha(1.0);
}

/// Stamps are a rounded badge: tinted fill, solid border, centered label.
fn draw_stamp(
    ctx: &CanvasRenderingContext2d,
    annotation: &Annotation,
    metrics: &dyn TextMetrics,
) {
    let Some(b) = annotation_bounds(annotation, metrics) else {
        return;
    };
    let color = &annotation.style.color;
    trace_rounded_rect(ctx, &b, 4.0);
    ctx.set_fill_style_str(&rgba(color, 0.15));
    ctx.fill();
    ctx.set_stroke_style_str(&color.to_hex());
    ctx.set_global_alpha(annotation.style.opacity);
    ctx.set_line_width(2.0);
    ctx.stroke();

    if let Some(label) = annotation.kind.stamp_label() {
        let center = b.center();
        ctx.set_font("bold 16px Arial");
        ctx.set_fill_style_str(&color.to_hex());
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        let _ = ctx.fill_text(label, center.x, center.y);
    }
}

// ─── Selection decorations ───────────────────────────────────────────────

fn draw_selection(
    ctx: &CanvasRenderingContext2d,
    annotation: &Annotation,
    multi: bool,
    scale: f64,
    metrics: &dyn TextMetrics,
) {
    let color = if multi { SELECTION_MULTI } else { SELECTION_SINGLE };
    let Some(bounds) = annotation_bounds(annotation, metrics) else {
        return;
    };
    ctx.save();

    // Tint first, dashed outline on top.
    ctx.set_fill_style_str(&rgba(&color, 0.125));
    ctx.fill_rect(bounds.left, bounds.top, bounds.width(), bounds.height());
    ctx.set_stroke_style_str(&color.to_hex());
    ctx.set_line_width(1.5);
    set_dash(ctx, &[4.0, 3.0]);
    ctx.stroke_rect(bounds.left, bounds.top, bounds.width(), bounds.height());
    set_dash(ctx, &[]);

    // Handle knobs mark the grab zones of a single selection.
    if !multi {
        if annotation.kind.is_text_like() {
            for corner in bounds.corners() {
                draw_handle_ring(ctx, corner, scale, &color);
            }
        } else if annotation.kind == AnnotationKind::Circle {
            if let Some((center, radius)) = annotation.circle_geometry() {
                for i in 0..8 {
                    let angle = i as f64 * std::f64::consts::FRAC_PI_4;
                    let at = Point::new(
                        center.x + angle.cos() * radius,
                        center.y + angle.sin() * radius,
                    );
                    draw_handle_ring(ctx, at, scale, &color);
                }
            }
        } else if annotation.kind.resizable() && annotation.points.len() == 2 {
            for handle in [
                Handle::TopLeft,
                Handle::Top,
                Handle::TopRight,
                Handle::Right,
                Handle::BottomRight,
                Handle::Bottom,
                Handle::BottomLeft,
                Handle::Left,
            ] {
                draw_handle_ring(ctx, handle_position(&bounds, handle), scale, &color);
            }
        }
    }
    ctx.restore();
}

/// A white-filled ring, 4 screen pixels in radius, at one handle position.
fn draw_handle_ring(ctx: &CanvasRenderingContext2d, at: Point, scale: f64, color: &Color) {
    ctx.begin_path();
    let _ = ctx.arc(at.x, at.y, 4.0 / scale, 0.0, std::f64::consts::TAU);
    ctx.set_fill_style_str("#FFFFFF");
    ctx.fill();
    ctx.set_stroke_style_str(&color.to_hex());
    ctx.set_line_width(1.0);
    ctx.stroke();
}

// ─── Transient overlay ───────────────────────────────────────────────────

fn draw_draft(ctx: &CanvasRenderingContext2d, draft: &Draft) {
    if draft.points.len() < 2 {
        return;
    }
    let style = &draft.style;
    ctx.save();
    match draft.kind {
        AnnotationKind::Highlight => {
            // Preview as a filled rectangle matching the final polygon.
            let b = Bounds::new(
                draft.points[0].x,
                draft.points[0].y,
                draft.points[1].x,
                draft.points[1].y,
            );
            ctx.set_fill_style_str(&style.color.to_hex());
            ctx.set_global_alpha(0.3);
            ctx.fill_rect(b.left, b.top, b.width(), b.height());
        }
        AnnotationKind::Freehand => {
            set_stroke(ctx, style);
            trace_freehand(ctx, &draft.points);
            ctx.stroke();
        }
        AnnotationKind::Line => {
            set_stroke(ctx, style);
            ctx.begin_path();
            ctx.move_to(draft.points[0].x, draft.points[0].y);
            ctx.line_to(draft.points[1].x, draft.points[1].y);
            ctx.stroke();
        }
        AnnotationKind::Circle => {
            let (a, b) = (draft.points[0], draft.points[1]);
            let (center, radius) = if style.circle_diameter_mode {
                (a.midpoint(b), a.distance_to(b) / 2.0)
            } else {
                (a, a.distance_to(b))
            };
            set_stroke(ctx, style);
            ctx.begin_path();
            let _ = ctx.arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU);
            ctx.stroke();
        }
        AnnotationKind::Arrow | AnnotationKind::DoubleArrow => {
            set_stroke(ctx, style);
            let both = draft.kind == AnnotationKind::DoubleArrow;
            trace_arrow(ctx, draft.points[0], draft.points[1], style.line_width, both);
            ctx.stroke();
        }
        _ => {
            if let Some(b) = Bounds::from_points(&draft.points) {
                set_stroke(ctx, style);
                match draft.kind {
                    AnnotationKind::Triangle => {
                        trace_triangle(ctx, &b);
                        ctx.stroke();
                    }
                    AnnotationKind::Star => {
                        trace_star(ctx, &b);
                        ctx.stroke();
                    }
                    _ => ctx.stroke_rect(b.left, b.top, b.width(), b.height()),
                }
            }
        }
    }
    ctx.restore();
}

fn draw_marquee(ctx: &CanvasRenderingContext2d, a: Point, b: Point, scale: f64) {
    let bounds = Bounds::new(a.x, a.y, b.x, b.y);
    ctx.save();
    ctx.set_fill_style_str(&rgba(&MARQUEE_COLOR, 0.1));
    ctx.fill_rect(bounds.left, bounds.top, bounds.width(), bounds.height());
    // Screen-constant rubber band: 1px stroke, 5px dashes.
    ctx.set_stroke_style_str(&MARQUEE_COLOR.to_hex());
    ctx.set_line_width(1.0 / scale);
    set_dash(ctx, &[5.0 / scale, 5.0 / scale]);
    ctx.stroke_rect(bounds.left, bounds.top, bounds.width(), bounds.height());
    ctx.restore();
}

fn draw_text_drag(ctx: &CanvasRenderingContext2d, drag: &TextDrag, scale: f64) {
    let b = Bounds::new(drag.start.x, drag.start.y, drag.end.x, drag.end.y);
    let (w, h) = (b.width(), b.height());
    let at = Point::new(b.left, b.top);
    ctx.save();

    if drag.sticky {
        draw_sticky_body(ctx, at, w, h, 0.6);
        // Placeholder rules sketch the writable area.
        if w > STICKY_PADDING * 2.0 && h > STICKY_PADDING * 2.0 {
            let rows = (((h - STICKY_PADDING * 2.0) / STICKY_LINE_HEIGHT) as usize).min(5);
            ctx.set_fill_style_str(&rgba(&Color::BLACK, 0.3));
            for i in 0..rows {
                let len = (w - STICKY_PADDING * 2.0).min(150.0 - i as f64 * 20.0);
                if len <= 0.0 {
                    break;
                }
                ctx.fill_rect(
                    at.x + STICKY_PADDING,
                    at.y + STICKY_PADDING + i as f64 * STICKY_LINE_HEIGHT,
                    len,
                    2.0,
                );
            }
        }
        ctx.set_stroke_style_str(&rgba(&Color::BLACK, 0.18));
        ctx.set_line_width(1.0 / scale);
        ctx.stroke_rect(b.left, b.top, w, h);
    } else {
        ctx.set_fill_style_str(&rgba(&Color::WHITE, 0.7));
        ctx.fill_rect(b.left, b.top, w, h);
        ctx.set_stroke_style_str(&drag.color.to_hex());
        ctx.set_line_width(1.0 / scale);
        set_dash(ctx, &[3.0 / scale, 3.0 / scale]);
        ctx.stroke_rect(b.left, b.top, w, h);
        set_dash(ctx, &[]);

        let step = 14.0 * LINE_HEIGHT_FACTOR;
        if w > TEXT_PADDING * 3.0 && h > TEXT_PADDING * 3.0 {
            let rows = (((h - TEXT_PADDING * 2.0 - step) / step) as usize).min(3);
            ctx.set_fill_style_str(&drag.color.to_hex());
            for i in 0..rows {
                let len = (w - TEXT_PADDING * 2.0).min(90.0 - i as f64 * 15.0);
                if len <= 0.0 {
                    break;
                }
                ctx.fill_rect(
                    at.x + TEXT_PADDING,
                    at.y + TEXT_PADDING + step + i as f64 * step,
                    len,
                    1.0,
                );
            }
        }
    }
    ctx.restore();
}

/// Badge shown over a circle while shift forces uniform scaling. Fixed
/// screen size, centered on the circle.
fn draw_uniform_badge(
    ctx: &CanvasRenderingContext2d,
    center: Point,
    scale: f64,
    metrics: &dyn TextMetrics,
) {
    let options = TextOptions {
        font_size: 12.0,
        ..TextOptions::default()
    };
    let w = (metrics.line_width("Uniform", &options) + 16.0) / scale;
    let h = 24.0 / scale;
    let badge = Bounds::new(center.x - w / 2.0, center.y - h / 2.0, center.x + w / 2.0, center.y + h / 2.0);
    ctx.save();
    trace_rounded_rect(ctx, &badge, 4.0 / scale);
    ctx.set_fill_style_str(&rgba(&BADGE_COLOR, 0.3));
    ctx.fill();
    ctx.set_stroke_style_str(&BADGE_COLOR.to_hex());
    ctx.set_line_width(1.0 / scale);
    ctx.stroke();

    ctx.set_fill_style_str("#FFFFFF");
    ctx.set_font(&font_string(&options));
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    // Keep the label screen-sized too.
    let _ = ctx.scale(1.0 / scale, 1.0 / scale);
    let _ = ctx.fill_text("Uniform", center.x * scale, center.y * scale);
    ctx.restore();
}

fn draw_ghost(ctx: &CanvasRenderingContext2d, ghost: &Ghost, scale: f64, pulse: f64) {
    let at = ghost.at;
    ctx.save();
    ctx.set_global_alpha(pulse);
    if ghost.sticky {
        draw_sticky_body(ctx, at, STICKY_NOTE_WIDTH, STICKY_NOTE_HEIGHT, 0.5 * pulse);
        ctx.set_global_alpha(pulse);
        ctx.set_fill_style_str(&rgba(&Color::BLACK, 0.5));
        for i in 0..3 {
            let len = 150.0 - i as f64 * 25.0;
            ctx.fill_rect(
                at.x + STICKY_PADDING,
                at.y + STICKY_PADDING + i as f64 * STICKY_LINE_HEIGHT,
                len,
                2.0,
            );
        }
        ctx.set_stroke_style_str(&rgba(&Color::BLACK, 0.1));
        ctx.set_line_width(0.5);
        ctx.stroke_rect(at.x, at.y, STICKY_NOTE_WIDTH, STICKY_NOTE_HEIGHT);
    } else {
        let w = TEXT_GHOST_WIDTH / scale;
        let h = TEXT_GHOST_HEIGHT / scale;
        ctx.set_fill_style_str(&rgba(&Color::WHITE, 0.7));
        ctx.fill_rect(at.x, at.y, w, h);
        ctx.set_stroke_style_str(&ghost.color.to_hex());
        ctx.set_line_width(1.0 / scale);
        set_dash(ctx, &[3.0 / scale, 3.0 / scale]);
        ctx.stroke_rect(at.x, at.y, w, h);
        set_dash(ctx, &[]);

        let options = TextOptions {
            font_size: ghost.font_size,
            ..TextOptions::default()
        };
        ctx.set_font(&font_string(&options));
        ctx.set_fill_style_str(&ghost.color.to_hex());
        ctx.set_text_baseline("top");
        ctx.set_text_align("left");
        let _ = ctx.fill_text("Text", at.x + TEXT_PADDING, at.y + TEXT_PADDING);
        let step = line_height(&options);
        for i in 0..2 {
            let len = 90.0 - i as f64 * 30.0;
            ctx.fill_rect(
                at.x + TEXT_PADDING,
                at.y + TEXT_PADDING + step + i as f64 * step,
                len,
                1.0,
            );
        }
    }
    ctx.restore();
}

// ─── Path tracing ────────────────────────────────────────────────────────

/// Midpoint-smoothed freehand stroke: quadratics through each interior
/// point, straight tail to the last. Two points degrade to a line.
fn trace_freehand(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    ctx.begin_path();
    let Some(first) = points.first() else {
        return;
    };
    ctx.move_to(first.x, first.y);
    if points.len() == 2 {
        ctx.line_to(points[1].x, points[1].y);
        return;
    }
    for i in 1..points.len() - 1 {
        let control = points[i];
        let mid = control.midpoint(points[i + 1]);
        ctx.quadratic_curve_to(control.x, control.y, mid.x, mid.y);
    }
    if let Some(last) = points.last() {
        ctx.line_to(last.x, last.y);
    }
}

fn trace_polygon(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    ctx.begin_path();
    let Some(first) = points.first() else {
        return;
    };
    ctx.move_to(first.x, first.y);
    for p in &points[1..] {
        ctx.line_to(p.x, p.y);
    }
    ctx.close_path();
}

/// Isoceles triangle: apex at the top-center of the box, base along the
/// bottom edge.
fn trace_triangle(ctx: &CanvasRenderingContext2d, b: &Bounds) {
    ctx.begin_path();
    ctx.move_to((b.left + b.right) / 2.0, b.top);
    ctx.line_to(b.right, b.bottom);
    ctx.line_to(b.left, b.bottom);
    ctx.close_path();
}

/// Five-point star inscribed in the box, starting straight up.
fn trace_star(ctx: &CanvasRenderingContext2d, b: &Bounds) {
    let center = b.center();
    let outer = (b.width().min(b.height())) / 2.0;
    let inner = outer * 0.5;
    ctx.begin_path();
    for i in 0..10 {
        let radius = if i % 2 == 0 { outer } else { inner };
        let angle = -std::f64::consts::FRAC_PI_2 + i as f64 * std::f64::consts::PI / 5.0;
        let (x, y) = (center.x + angle.cos() * radius, center.y + angle.sin() * radius);
        if i == 0 {
            ctx.move_to(x, y);
        } else {
            ctx.line_to(x, y);
        }
    }
    ctx.close_path();
}

/// Shaft plus an open two-wing head at `to`; `both_ends` adds a mirrored
/// head at `from`. Head length tracks the stroke width.
fn trace_arrow(
    ctx: &CanvasRenderingContext2d,
    from: Point,
    to: Point,
    line_width: f64,
    both_ends: bool,
) {
    ctx.begin_path();
    ctx.move_to(from.x, from.y);
    ctx.line_to(to.x, to.y);

    let head = 12.0_f64.max(line_width * 3.0);
    let wing = std::f64::consts::FRAC_PI_6;
    let add_head = |tip: Point, tail: Point| {
        let angle = (tip.y - tail.y).atan2(tip.x - tail.x);
        for side in [-1.0, 1.0] {
            ctx.move_to(tip.x, tip.y);
            ctx.line_to(
                tip.x - head * (angle + side * wing).cos(),
                tip.y - head * (angle + side * wing).sin(),
            );
        }
    };
    add_head(to, from);
    if both_ends {
        add_head(from, to);
    }
}

fn trace_rounded_rect(ctx: &CanvasRenderingContext2d, b: &Bounds, radius: f64) {
    let r = radius.min(b.width() / 2.0).min(b.height() / 2.0);
    ctx.begin_path();
    ctx.move_to(b.left + r, b.top);
    ctx.line_to(b.right - r, b.top);
    let _ = ctx.arc_to(b.right, b.top, b.right, b.top + r, r);
    ctx.line_to(b.right, b.bottom - r);
    let _ = ctx.arc_to(b.right, b.bottom, b.right - r, b.bottom, r);
    ctx.line_to(b.left + r, b.bottom);
    let _ = ctx.arc_to(b.left, b.bottom, b.left, b.bottom - r, r);
    ctx.line_to(b.left, b.top + r);
    let _ = ctx.arc_to(b.left, b.top, b.left + r, b.top, r);
    ctx.close_path();
}

// ─── Styling helpers ─────────────────────────────────────────────────────

fn set_stroke(ctx: &CanvasRenderingContext2d, style: &AnnotationStyle) {
    ctx.set_stroke_style_str(&style.color.to_hex());
    ctx.set_line_width(style.line_width);
    ctx.set_global_alpha(style.opacity);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
}

/// Model color → `rgba()` string with an extra alpha multiplier.
fn rgba(color: &Color, alpha: f64) -> String {
    format!(
        "rgba({}, {}, {}, {})",
        (color.r * 255.0).round() as u8,
        (color.g * 255.0).round() as u8,
        (color.b * 255.0).round() as u8,
        (color.a as f64 * alpha).min(1.0),
    )
}

fn set_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) {
    let dash = js_sys::Array::new();
    for segment in segments {
        dash.push(&JsValue::from_f64(*segment));
    }
    let _ = ctx.set_line_dash(&dash);
}
