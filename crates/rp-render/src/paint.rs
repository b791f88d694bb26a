//! Annotations → Vello drawing commands.
//!
//! Emits one page's frame: committed annotations in store order with their
//! selection decorations, then the transient gesture overlay (in-progress
//! draft, marquee, text-drag preview, uniform badge, armed-tool ghost).
//! Painting never mutates the model; everything is rebuilt per frame.
//!
//! Geometry is emitted in page units under an `Affine::scale` transform.
//! Decorations that stay a fixed size on screen divide by the scale.
//!
//! Glyph runs (text blocks, sticky lines, stamp and badge labels) need a
//! font context the scene builder does not carry yet; their placement is
//! traced and the Canvas2D backend draws them. Boxes, paper, and badges
//! render on both paths.

use kurbo::{Affine, BezPath, Cap, Circle as KurboCircle, Join, Line as KurboLine, Rect,
    RoundedRect, Stroke as KurboStroke};
use peniko::Fill;
use vello::Scene;

use crate::hit::{Handle, annotation_bounds};
use crate::resize::handle_position;
use crate::text::{
    LINE_HEIGHT_FACTOR, STICKY_LINE_HEIGHT, STICKY_PADDING, TEXT_PADDING, TextMetrics,
    line_height, wrap_sticky_text,
};
use rp_core::geom::{Bounds, Point};
use rp_core::id::AnnotationId;
use rp_core::model::{
    Annotation, AnnotationKind, AnnotationStyle, Color, STICKY_NOTE_FOLD, STICKY_NOTE_HEIGHT,
    STICKY_NOTE_WIDTH, TextOptions,
};

// ─── Fixed palette ───────────────────────────────────────────────────────

/// Outline color for a single selected annotation.
pub const SELECTION_SINGLE: Color = Color::rgba(59.0 / 255.0, 130.0 / 255.0, 246.0 / 255.0, 1.0);
/// Outline color when more than one annotation is selected.
pub const SELECTION_MULTI: Color = Color::rgba(66.0 / 255.0, 153.0 / 255.0, 225.0 / 255.0, 1.0);
/// Marquee (rubber-band) stroke color.
pub const MARQUEE_COLOR: Color = Color::rgba(0.0, 102.0 / 255.0, 1.0, 1.0);
/// Uniform-scaling badge stroke/fill base.
pub const BADGE_COLOR: Color = Color::rgba(37.0 / 255.0, 99.0 / 255.0, 235.0 / 255.0, 1.0);
/// Fixed sticky-note paper color.
pub const STICKY_COLOR: Color = Color::rgba(1.0, 215.0 / 255.0, 0.0, 1.0);

/// Armed text-tool ghost footprint (screen pixels).
pub const TEXT_GHOST_WIDTH: f64 = 120.0;
pub const TEXT_GHOST_HEIGHT: f64 = 60.0;

// ─── Frame input ─────────────────────────────────────────────────────────

/// An uncommitted drawing gesture, repainted every frame until it commits.
#[derive(Debug, Clone)]
pub struct Draft {
    pub kind: AnnotationKind,
    pub points: Vec<Point>,
    pub style: AnnotationStyle,
}

/// Drag-to-size preview for the text and sticky-note tools.
#[derive(Debug, Clone)]
pub struct TextDrag {
    pub start: Point,
    pub end: Point,
    pub sticky: bool,
    pub color: Color,
}

/// Hover ghost shown while a text or sticky-note tool is armed.
#[derive(Debug, Clone)]
pub struct Ghost {
    pub at: Point,
    pub sticky: bool,
    pub color: Color,
    pub font_size: f64,
}

/// Per-frame overlay state owned by the gesture layer. Discarded on tool
/// or page change; never serialized, never stored.
#[derive(Debug, Clone, Default)]
pub struct Transient {
    pub draft: Option<Draft>,
    pub marquee: Option<(Point, Point)>,
    pub text_drag: Option<TextDrag>,
    /// Page-space center of the circle being shift-resized.
    pub uniform_badge: Option<Point>,
    pub ghost: Option<Ghost>,
}

/// Everything one frame needs. Committed annotations come straight from
/// the store at paint time; nothing is cached between frames.
#[derive(Debug)]
pub struct FrameState<'a> {
    pub annotations: &'a [Annotation],
    pub selected: &'a [AnnotationId],
    /// Annotation hidden behind an open text editor.
    pub editing: Option<AnnotationId>,
    pub page: u32,
    pub scale: f64,
    pub transient: &'a Transient,
}

// ─── Frame entry point ───────────────────────────────────────────────────

/// Paint one page into a freshly-cleared `Scene`. The caller presents the
/// scene via wgpu.
pub fn paint_page(scene: &mut Scene, frame: &FrameState<'_>, metrics: &dyn TextMetrics) {
    let to_screen = Affine::scale(frame.scale);

    for annotation in frame.annotations {
        if annotation.page_number != frame.page || annotation.points.is_empty() {
            continue;
        }
        if frame.editing == Some(annotation.id) {
            // The live editor overlays this one.
            continue;
        }
        paint_annotation(scene, annotation, to_screen, metrics);
        if frame.selected.contains(&annotation.id) {
            paint_selection(scene, annotation, frame, to_screen, metrics);
        }
    }

    if let Some(draft) = &frame.transient.draft {
        paint_draft(scene, draft, to_screen);
    }
    if let Some(drag) = &frame.transient.text_drag {
        paint_text_drag(scene, drag, to_screen, frame.scale);
    }
    if let Some((a, b)) = frame.transient.marquee {
        paint_marquee(scene, a, b, to_screen, frame.scale);
    }
    if let Some(center) = frame.transient.uniform_badge {
        paint_uniform_badge(scene, center, to_screen, frame.scale, metrics);
    }
    if let Some(ghost) = &frame.transient.ghost {
        paint_ghost(scene, ghost, to_screen, frame.scale);
    }
}

// ─── Committed annotations ───────────────────────────────────────────────

/// Paint one committed annotation, dispatching by kind.
pub fn paint_annotation(
    scene: &mut Scene,
    annotation: &Annotation,
    transform: Affine,
    metrics: &dyn TextMetrics,
) {
    let style = &annotation.style;
    let points = &annotation.points;
    match annotation.kind {
        AnnotationKind::Freehand => {
            stroke_shape(scene, transform, &freehand_path(points), style);
        }
        AnnotationKind::Line => {
            if points.len() >= 2 {
                let line = KurboLine::new(
                    (points[0].x, points[0].y),
                    (points[1].x, points[1].y),
                );
                stroke_shape(scene, transform, &line, style);
            }
        }
        AnnotationKind::Rectangle => {
            if let Some(b) = annotation.point_bounds() {
                stroke_shape(scene, transform, &bounds_rect(&b), style);
            }
        }
        AnnotationKind::Circle => {
            if let Some((center, radius)) = annotation.circle_geometry() {
                let circle = KurboCircle::new((center.x, center.y), radius);
                stroke_shape(scene, transform, &circle, style);
            }
        }
        AnnotationKind::Triangle => {
            if let Some(b) = annotation.point_bounds() {
                stroke_shape(scene, transform, &triangle_path(&b), style);
            }
        }
        AnnotationKind::Star => {
            if let Some(b) = annotation.point_bounds() {
                stroke_shape(scene, transform, &star_path(&b), style);
            }
        }
        AnnotationKind::Arrow | AnnotationKind::DoubleArrow => {
            if points.len() >= 2 {
                let both = annotation.kind == AnnotationKind::DoubleArrow;
                let path = arrow_path(points[0], points[1], style.line_width, both);
                stroke_shape(scene, transform, &path, style);
            }
        }
        AnnotationKind::Highlight => {
            // Filled polygon at the forced highlight opacity.
            let path = polygon_path(points);
            scene.fill(
                Fill::NonZero,
                transform,
                vello_color(&style.color, style.opacity),
                None,
                &path,
            );
        }
        AnnotationKind::Text => paint_text_block(annotation),
        AnnotationKind::StickyNote => {
            paint_sticky_note(scene, annotation, transform, metrics);
        }
        kind if kind.is_stamp() => paint_stamp(scene, annotation, transform, metrics),
        _ => {}
    }
}

/// Committed text on the native path: the box has no background and no
/// border, and glyph runs are deferred until the scene gets a font
/// context, so only the placement is traced. The Canvas2D backend draws
/// the runs at 8-unit padding and 1.2 line height.
fn paint_text_block(annotation: &Annotation) {
    let anchor = annotation.points[0];
    log::trace!(
        "TEXT {} {:?} at ({}, {})",
        annotation.id,
        annotation.text.as_deref().unwrap_or(""),
        anchor.x + TEXT_PADDING,
        anchor.y + TEXT_PADDING,
    );
    // Full text shaping requires a font context; deferred to the font
    // milestone. The Canvas2D backend renders glyphs today.
}

fn paint_sticky_note(
    scene: &mut Scene,
    annotation: &Annotation,
    transform: Affine,
    metrics: &dyn TextMetrics,
) {
    let anchor = annotation.points[0];
    paint_sticky_body(scene, transform, anchor, STICKY_NOTE_WIDTH, STICKY_NOTE_HEIGHT, 1.0);

    let options = annotation.style.text_options.clone().unwrap_or_default();
    let lines = wrap_sticky_text(annotation.text.as_deref().unwrap_or(""), &options, metrics);
    log::trace!(
        "STICKY {} {} wrapped lines at ({}, {})",
        annotation.id,
        lines.len(),
        anchor.x + STICKY_PADDING,
        anchor.y + STICKY_PADDING,
    );
    // Glyphs deferred alongside TEXT; the paper and fold render everywhere.
}

/// Yellow paper with the folded top-right corner, shared by the committed
/// note and both previews.
fn paint_sticky_body(
    scene: &mut Scene,
    transform: Affine,
    at: Point,
    width: f64,
    height: f64,
    alpha: f64,
) {
    let paper = Rect::new(at.x, at.y, at.x + width, at.y + height);
    scene.fill(Fill::NonZero, transform, vello_color(&STICKY_COLOR, alpha), None, &paper);

    let fold = STICKY_NOTE_FOLD.min(width / 5.0).min(height / 5.0);
    let mut corner = BezPath::new();
    corner.move_to((at.x + width - fold, at.y));
    corner.line_to((at.x + width, at.y + fold));
    corner.line_to((at.x + width, at.y));
    corner.close_path();
    scene.fill(
        Fill::NonZero,
        transform,
        vello_color(&Color::BLACK, 0.1 * alpha),
        None,
        &corner,
    );
}

/// Stamps render as a rounded badge: tinted fill, solid border. The
/// centered label is traced only; glyphs are deferred with the rest of
/// the native text path.
fn paint_stamp(
    scene: &mut Scene,
    annotation: &Annotation,
    transform: Affine,
    metrics: &dyn TextMetrics,
) {
    let Some(b) = annotation_bounds(annotation, metrics) else {
        return;
    };
    let badge = RoundedRect::new(b.left, b.top, b.right, b.bottom, 4.0);
    let color = &annotation.style.color;
    scene.fill(Fill::NonZero, transform, vello_color(color, 0.15), None, &badge);
    let stroke = KurboStroke {
        width: 2.0,
        ..Default::default()
    };
    scene.stroke(&stroke, transform, vello_color(color, annotation.style.opacity), None, &badge);

    if let Some(label) = annotation.kind.stamp_label() {
        log::trace!("STAMP {} {:?} centered at {:?}", annotation.id, label, b.center());
    }
}

// ─── Selection decorations ───────────────────────────────────────────────

fn paint_selection(
    scene: &mut Scene,
    annotation: &Annotation,
    frame: &FrameState<'_>,
    transform: Affine,
    metrics: &dyn TextMetrics,
) {
    let multi = frame.selected.len() > 1;
    let color = if multi { SELECTION_MULTI } else { SELECTION_SINGLE };
    let Some(bounds) = annotation_bounds(annotation, metrics) else {
        return;
    };
    let rect = bounds_rect(&bounds);

    // Tint first, dashed outline on top.
    scene.fill(Fill::NonZero, transform, vello_color(&color, 0.125), None, &rect);
    let outline = KurboStroke::new(1.5).with_dashes(0.0, [4.0, 3.0]);
    scene.stroke(&outline, transform, vello_color(&color, 1.0), None, &rect);

    if multi {
        return;
    }
    // Handle knobs mark the grab zones of a single selection.
    if annotation.kind.is_text_like() {
        for corner in bounds.corners() {
            paint_handle_ring(scene, transform, corner, frame.scale, &color);
        }
    } else if annotation.kind == AnnotationKind::Circle {
        if let Some((center, radius)) = annotation.circle_geometry() {
            for i in 0..8 {
                let angle = i as f64 * std::f64::consts::FRAC_PI_4;
                let at = Point::new(
                    center.x + angle.cos() * radius,
                    center.y + angle.sin() * radius,
                );
                paint_handle_ring(scene, transform, at, frame.scale, &color);
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
            paint_handle_ring(scene, transform, handle_position(&bounds, handle), frame.scale, &color);
        }
    }
}

/// A white-filled ring, 4 screen pixels in radius, at one handle position.
fn paint_handle_ring(scene: &mut Scene, transform: Affine, at: Point, scale: f64, color: &Color) {
    let ring = KurboCircle::new((at.x, at.y), 4.0 / scale);
    scene.fill(Fill::NonZero, transform, vello_color(&Color::WHITE, 1.0), None, &ring);
    let stroke = KurboStroke {
        width: 1.0,
        ..Default::default()
    };
    scene.stroke(&stroke, transform, vello_color(color, 1.0), None, &ring);
}

// ─── Transient overlay ───────────────────────────────────────────────────

fn paint_draft(scene: &mut Scene, draft: &Draft, transform: Affine) {
    if draft.points.len() < 2 {
        return;
    }
    let style = &draft.style;
    match draft.kind {
        AnnotationKind::Highlight => {
            // Preview as a filled rectangle matching the final polygon.
            let b = Bounds::new(
                draft.points[0].x,
                draft.points[0].y,
                draft.points[1].x,
                draft.points[1].y,
            );
            scene.fill(
                Fill::NonZero,
                transform,
                vello_color(&style.color, 0.3),
                None,
                &bounds_rect(&b),
            );
        }
        AnnotationKind::Freehand => {
            stroke_shape(scene, transform, &freehand_path(&draft.points), style);
        }
        AnnotationKind::Line => {
            let line = KurboLine::new(
                (draft.points[0].x, draft.points[0].y),
                (draft.points[1].x, draft.points[1].y),
            );
            stroke_shape(scene, transform, &line, style);
        }
        AnnotationKind::Circle => {
            let (a, b) = (draft.points[0], draft.points[1]);
            let (center, radius) = if style.circle_diameter_mode {
                (a.midpoint(b), a.distance_to(b) / 2.0)
            } else {
                (a, a.distance_to(b))
            };
            let circle = KurboCircle::new((center.x, center.y), radius);
            stroke_shape(scene, transform, &circle, style);
        }
        AnnotationKind::Arrow | AnnotationKind::DoubleArrow => {
            let both = draft.kind == AnnotationKind::DoubleArrow;
            let path = arrow_path(draft.points[0], draft.points[1], style.line_width, both);
            stroke_shape(scene, transform, &path, style);
        }
        _ => {
            let Some(b) = Bounds::from_points(&draft.points) else {
                return;
            };
            match draft.kind {
                AnnotationKind::Triangle => stroke_shape(scene, transform, &triangle_path(&b), style),
                AnnotationKind::Star => stroke_shape(scene, transform, &star_path(&b), style),
                _ => stroke_shape(scene, transform, &bounds_rect(&b), style),
            }
        }
    }
}

fn paint_marquee(scene: &mut Scene, a: Point, b: Point, transform: Affine, scale: f64) {
    let rect = bounds_rect(&Bounds::new(a.x, a.y, b.x, b.y));
    scene.fill(
        Fill::NonZero,
        transform,
        vello_color(&MARQUEE_COLOR, 0.1),
        None,
        &rect,
    );
    // Screen-constant rubber band: 1px stroke, 5px dashes.
    let stroke = KurboStroke::new(1.0 / scale).with_dashes(0.0, [5.0 / scale, 5.0 / scale]);
    scene.stroke(&stroke, transform, vello_color(&MARQUEE_COLOR, 1.0), None, &rect);
}

fn paint_text_drag(scene: &mut Scene, drag: &TextDrag, transform: Affine, scale: f64) {
    let b = Bounds::new(drag.start.x, drag.start.y, drag.end.x, drag.end.y);
    let (w, h) = (b.width(), b.height());
    let at = Point::new(b.left, b.top);

    if drag.sticky {
        paint_sticky_body(scene, transform, at, w, h, 0.6);
        // Placeholder rules sketch the writable area.
        if w > STICKY_PADDING * 2.0 && h > STICKY_PADDING * 2.0 {
            let rows = (((h - STICKY_PADDING * 2.0) / STICKY_LINE_HEIGHT) as usize).min(5);
            for i in 0..rows {
                let len = (w - STICKY_PADDING * 2.0).min(150.0 - i as f64 * 20.0);
                if len <= 0.0 {
                    break;
                }
                let row = Rect::new(
                    at.x + STICKY_PADDING,
                    at.y + STICKY_PADDING + i as f64 * STICKY_LINE_HEIGHT,
                    at.x + STICKY_PADDING + len,
                    at.y + STICKY_PADDING + i as f64 * STICKY_LINE_HEIGHT + 2.0,
                );
                scene.fill(Fill::NonZero, transform, vello_color(&Color::BLACK, 0.3), None, &row);
            }
        }
        let border = KurboStroke {
            width: 1.0 / scale,
            ..Default::default()
        };
        scene.stroke(
            &border,
            transform,
            vello_color(&Color::BLACK, 0.18),
            None,
            &bounds_rect(&b),
        );
    } else {
        let rect = bounds_rect(&b);
        scene.fill(Fill::NonZero, transform, vello_color(&Color::WHITE, 0.7), None, &rect);
        let border = KurboStroke::new(1.0 / scale).with_dashes(0.0, [3.0 / scale, 3.0 / scale]);
        scene.stroke(&border, transform, vello_color(&drag.color, 1.0), None, &rect);

        let step = 14.0 * LINE_HEIGHT_FACTOR;
        if w > TEXT_PADDING * 3.0 && h > TEXT_PADDING * 3.0 {
            let rows = (((h - TEXT_PADDING * 2.0 - step) / step) as usize).min(3);
            for i in 0..rows {
                let len = (w - TEXT_PADDING * 2.0).min(90.0 - i as f64 * 15.0);
                if len <= 0.0 {
                    break;
                }
                let row = Rect::new(
                    at.x + TEXT_PADDING,
                    at.y + TEXT_PADDING + step + i as f64 * step,
                    at.x + TEXT_PADDING + len,
                    at.y + TEXT_PADDING + step + i as f64 * step + 1.0,
                );
                scene.fill(Fill::NonZero, transform, vello_color(&drag.color, 1.0), None, &row);
            }
        }
    }
}

/// Badge shown over a circle while shift forces uniform scaling. Fixed
/// screen size, centered on the circle.
fn paint_uniform_badge(
    scene: &mut Scene,
    center: Point,
    transform: Affine,
    scale: f64,
    metrics: &dyn TextMetrics,
) {
    let options = TextOptions {
        font_size: 12.0,
        ..TextOptions::default()
    };
    let w = (metrics.line_width("Uniform", &options) + 16.0) / scale;
    let h = 24.0 / scale;
    let badge = RoundedRect::new(
        center.x - w / 2.0,
        center.y - h / 2.0,
        center.x + w / 2.0,
        center.y + h / 2.0,
        4.0 / scale,
    );
    scene.fill(Fill::NonZero, transform, vello_color(&BADGE_COLOR, 0.3), None, &badge);
    let stroke = KurboStroke {
        width: 1.0 / scale,
        ..Default::default()
    };
    scene.stroke(&stroke, transform, vello_color(&BADGE_COLOR, 1.0), None, &badge);
    log::trace!("BADGE \"Uniform\" centered at ({}, {})", center.x, center.y);
}

fn paint_ghost(scene: &mut Scene, ghost: &Ghost, transform: Affine, scale: f64) {
    let at = ghost.at;
    if ghost.sticky {
        paint_sticky_body(scene, transform, at, STICKY_NOTE_WIDTH, STICKY_NOTE_HEIGHT, 0.5);
        for i in 0..3 {
            let len = 150.0 - i as f64 * 25.0;
            let row = Rect::new(
                at.x + STICKY_PADDING,
                at.y + STICKY_PADDING + i as f64 * STICKY_LINE_HEIGHT,
                at.x + STICKY_PADDING + len,
                at.y + STICKY_PADDING + i as f64 * STICKY_LINE_HEIGHT + 2.0,
            );
            scene.fill(Fill::NonZero, transform, vello_color(&Color::BLACK, 0.5), None, &row);
        }
        let paper = Rect::new(
            at.x,
            at.y,
            at.x + STICKY_NOTE_WIDTH,
            at.y + STICKY_NOTE_HEIGHT,
        );
        let border = KurboStroke {
            width: 0.5,
            ..Default::default()
        };
        scene.stroke(&border, transform, vello_color(&Color::BLACK, 0.1), None, &paper);
    } else {
        let w = TEXT_GHOST_WIDTH / scale;
        let h = TEXT_GHOST_HEIGHT / scale;
        let rect = Rect::new(at.x, at.y, at.x + w, at.y + h);
        scene.fill(Fill::NonZero, transform, vello_color(&Color::WHITE, 0.7), None, &rect);
        let border = KurboStroke::new(1.0 / scale).with_dashes(0.0, [3.0 / scale, 3.0 / scale]);
        scene.stroke(&border, transform, vello_color(&ghost.color, 1.0), None, &rect);

        let options = TextOptions {
            font_size: ghost.font_size,
            ..TextOptions::default()
        };
        log::trace!(
            "GHOST \"Text\" {}px at ({}, {})",
            options.font_size,
            at.x + TEXT_PADDING,
            at.y + TEXT_PADDING,
        );
        let step = line_height(&options);
        for i in 0..2 {
            let len = 90.0 - i as f64 * 30.0;
            let row = Rect::new(
                at.x + TEXT_PADDING,
                at.y + TEXT_PADDING + step + i as f64 * step,
                at.x + TEXT_PADDING + len,
                at.y + TEXT_PADDING + step + i as f64 * step + 1.0,
            );
            scene.fill(Fill::NonZero, transform, vello_color(&ghost.color, 1.0), None, &row);
        }
    }
}

// ─── Path builders ───────────────────────────────────────────────────────

/// Midpoint-smoothed freehand stroke: quadratics through each interior
/// point, straight tail to the last. Two points degrade to a line.
pub fn freehand_path(points: &[Point]) -> BezPath {
    let mut bez = BezPath::new();
    let Some(first) = points.first() else {
        return bez;
    };
    bez.move_to((first.x, first.y));
    if points.len() == 2 {
        bez.line_to((points[1].x, points[1].y));
        return bez;
    }
    for i in 1..points.len() - 1 {
        let control = points[i];
        let mid = control.midpoint(points[i + 1]);
        bez.quad_to((control.x, control.y), (mid.x, mid.y));
    }
    if let Some(last) = points.last() {
        bez.line_to((last.x, last.y));
    }
    bez
}

/// Closed polygon through every point.
pub fn polygon_path(points: &[Point]) -> BezPath {
    let mut bez = BezPath::new();
    let Some(first) = points.first() else {
        return bez;
    };
    bez.move_to((first.x, first.y));
    for p in &points[1..] {
        bez.line_to((p.x, p.y));
    }
    bez.close_path();
    bez
}

/// Isoceles triangle: apex at the top-center of the box, base along the
/// bottom edge.
pub fn triangle_path(b: &Bounds) -> BezPath {
    let mut bez = BezPath::new();
    bez.move_to(((b.left + b.right) / 2.0, b.top));
    bez.line_to((b.right, b.bottom));
    bez.line_to((b.left, b.bottom));
    bez.close_path();
    bez
}

/// Five-point star inscribed in the box: ten vertices alternating between
/// the outer radius and half of it, starting straight up.
pub fn star_path(b: &Bounds) -> BezPath {
    let center = b.center();
    let outer = (b.width().min(b.height())) / 2.0;
    let inner = outer * 0.5;
    let mut bez = BezPath::new();
    for i in 0..10 {
        let radius = if i % 2 == 0 { outer } else { inner };
        let angle = -std::f64::consts::FRAC_PI_2 + i as f64 * std::f64::consts::PI / 5.0;
        let vertex = (center.x + angle.cos() * radius, center.y + angle.sin() * radius);
        if i == 0 {
            bez.move_to(vertex);
        } else {
            bez.line_to(vertex);
        }
    }
    bez.close_path();
    bez
}

/// Shaft plus an open two-wing head at `to`; `both_ends` adds a mirrored
/// head at `from`. Head length tracks the stroke width so fat arrows keep
/// their proportions.
pub fn arrow_path(from: Point, to: Point, line_width: f64, both_ends: bool) -> BezPath {
    let mut bez = BezPath::new();
    bez.move_to((from.x, from.y));
    bez.line_to((to.x, to.y));

    let head = 12.0_f64.max(line_width * 3.0);
    let wing = std::f64::consts::FRAC_PI_6;
    let mut add_head = |tip: Point, tail: Point| {
        let angle = (tip.y - tail.y).atan2(tip.x - tail.x);
        for side in [-1.0, 1.0] {
            bez.move_to((tip.x, tip.y));
            bez.line_to((
                tip.x - head * (angle + side * wing).cos(),
                tip.y - head * (angle + side * wing).sin(),
            ));
        }
    };
    add_head(to, from);
    if both_ends {
        add_head(from, to);
    }
    bez
}

// ─── Fill and stroke ─────────────────────────────────────────────────────

fn bounds_rect(b: &Bounds) -> Rect {
    Rect::new(b.left, b.top, b.right, b.bottom)
}

fn stroke_shape<S: kurbo::Shape>(
    scene: &mut Scene,
    transform: Affine,
    shape: &S,
    style: &AnnotationStyle,
) {
    let stroke = KurboStroke {
        width: style.line_width,
        join: Join::Round,
        start_cap: Cap::Round,
        end_cap: Cap::Round,
        ..Default::default()
    };
    scene.stroke(
        &stroke,
        transform,
        vello_color(&style.color, style.opacity),
        None,
        shape,
    );
}

/// Model color → peniko color with an extra alpha multiplier.
pub fn vello_color(color: &Color, alpha: f64) -> peniko::Color {
    peniko::Color::new([color.r, color.g, color.b, color.a * alpha as f32])
}
