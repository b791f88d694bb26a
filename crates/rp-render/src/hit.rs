//! Hit testing: point → annotation and point → resize handle lookup.
//!
//! Tolerances are defined in screen pixels but geometry lives in page
//! space, so every tolerance is divided by the render scale on entry. Two
//! exceptions, both deliberate: stamps hit only on their exact footprint,
//! and text/sticky boxes carry a flat page-space grab margin.

use crate::text::{SELECTION_PADDING, TextMetrics, text_block_size};
use rp_core::geom::{Bounds, Point, point_in_polygon, segments_intersect};
use rp_core::id::AnnotationId;
use rp_core::model::{
    Annotation, AnnotationKind, STAMP_HEIGHT, STAMP_WIDTH, STICKY_NOTE_HEIGHT, STICKY_NOTE_WIDTH,
};

/// Screen-pixel radius of a resize-handle hit zone.
pub const HANDLE_HIT_RADIUS: f64 = 8.0;
/// Screen-pixel floor for the hit slop around thin strokes.
pub const SHAPE_HIT_SLOP: f64 = 5.0;

// ─── Footprints ───────────────────────────────────────────────────────────

/// The rendered footprint of an annotation. Point bounds for drawn shapes;
/// fixed boxes for sticky notes and stamps; a measured box for text.
/// `None` for empty `points` — corrupt entries are skipped, never fatal.
pub fn annotation_bounds(
    annotation: &Annotation,
    metrics: &dyn TextMetrics,
) -> Option<Bounds> {
    let anchor = *annotation.points.first()?;
    let footprint = match annotation.kind {
        AnnotationKind::StickyNote => (STICKY_NOTE_WIDTH, STICKY_NOTE_HEIGHT),
        kind if kind.is_stamp() => (STAMP_WIDTH, STAMP_HEIGHT),
        AnnotationKind::Text => {
            let options = annotation.style.text_options.clone().unwrap_or_default();
            text_block_size(annotation.text.as_deref().unwrap_or(""), &options, metrics)
        }
        _ => return annotation.point_bounds(),
    };
    Some(Bounds::new(
        anchor.x,
        anchor.y,
        anchor.x + footprint.0,
        anchor.y + footprint.1,
    ))
}

// ─── Point hits ───────────────────────────────────────────────────────────

/// Whether `point` hits `annotation`, dispatching by kind.
pub fn hit_test_point(
    point: Point,
    annotation: &Annotation,
    scale: f64,
    metrics: &dyn TextMetrics,
) -> bool {
    if annotation.points.is_empty() {
        return false;
    }
    match annotation.kind {
        // Stamps are clicked precisely on their rendered badge.
        kind if kind.is_stamp() => annotation_bounds(annotation, metrics)
            .is_some_and(|b| b.contains(point)),
        AnnotationKind::Highlight => point_in_polygon(point, &annotation.points),
        AnnotationKind::Circle => annotation
            .circle_geometry()
            .is_some_and(|(center, radius)| center.distance_to(point) <= radius),
        AnnotationKind::Text | AnnotationKind::StickyNote => {
            annotation_bounds(annotation, metrics)
                .is_some_and(|b| b.expand(SELECTION_PADDING).contains(point))
        }
        _ => {
            let slop = annotation.style.line_width.max(SHAPE_HIT_SLOP) / scale;
            annotation
                .point_bounds()
                .is_some_and(|b| b.expand(slop).contains(point))
        }
    }
}

/// Topmost annotation of `page` under `point`: later entries paint on top,
/// so the committed list is scanned back to front.
pub fn topmost_hit(
    point: Point,
    annotations: &[Annotation],
    page: u32,
    scale: f64,
    metrics: &dyn TextMetrics,
) -> Option<AnnotationId> {
    annotations
        .iter()
        .rev()
        .find(|a| a.page_number == page && hit_test_point(point, a, scale, metrics))
        .map(|a| a.id)
}

// ─── Resize handles ───────────────────────────────────────────────────────

/// The eight resize-handle positions around a shape's bounds (or around a
/// circle's perimeter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            Handle::TopLeft | Handle::TopRight | Handle::BottomLeft | Handle::BottomRight
        )
    }

    /// CSS cursor for hover/drag feedback over this handle.
    pub fn cursor(&self) -> &'static str {
        match self {
            Handle::TopLeft | Handle::BottomRight => "nwse-resize",
            Handle::TopRight | Handle::BottomLeft => "nesw-resize",
            Handle::Left | Handle::Right => "ew-resize",
            Handle::Top | Handle::Bottom => "ns-resize",
        }
    }
}

fn near(point: Point, target: Point, radius: f64) -> bool {
    (point.x - target.x).abs() <= radius && (point.y - target.y).abs() <= radius
}

/// Handle under `point` for a two-point shape: the four corners take
/// priority (they double as edge-adjacent points), then the edge midlines.
pub fn handle_at(point: Point, annotation: &Annotation, scale: f64) -> Option<Handle> {
    if annotation.points.len() != 2 {
        return None;
    }
    let b = annotation.point_bounds()?;
    let radius = HANDLE_HIT_RADIUS / scale;
    let candidates = [
        (Handle::TopLeft, Point::new(b.left, b.top)),
        (Handle::TopRight, Point::new(b.right, b.top)),
        (Handle::BottomLeft, Point::new(b.left, b.bottom)),
        (Handle::BottomRight, Point::new(b.right, b.bottom)),
        (Handle::Left, Point::new(b.left, (b.top + b.bottom) / 2.0)),
        (Handle::Right, Point::new(b.right, (b.top + b.bottom) / 2.0)),
        (Handle::Top, Point::new((b.left + b.right) / 2.0, b.top)),
        (Handle::Bottom, Point::new((b.left + b.right) / 2.0, b.bottom)),
    ];
    candidates
        .into_iter()
        .find(|(_, at)| near(point, *at, radius))
        .map(|(handle, _)| handle)
}

/// Handle under `point` on a circle's perimeter: eight handles at 45°
/// steps, index 0 at angle 0 (right), proceeding clockwise in y-down
/// coordinates.
pub fn circle_handle_at(point: Point, annotation: &Annotation, scale: f64) -> Option<Handle> {
    const COMPASS: [Handle; 8] = [
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
    ];
    let (center, radius) = annotation.circle_geometry()?;
    let hit_radius = HANDLE_HIT_RADIUS / scale;
    for (i, handle) in COMPASS.iter().enumerate() {
        let angle = i as f64 * std::f64::consts::FRAC_PI_4;
        let at = Point::new(
            center.x + angle.cos() * radius,
            center.y + angle.sin() * radius,
        );
        if near(point, at, hit_radius) {
            return Some(*handle);
        }
    }
    None
}

// ─── Marquee containment ──────────────────────────────────────────────────

/// Whether `annotation` falls inside the marquee box spanned by `a`/`b`.
/// Policy differs by kind: text/sticky select when their content-box center
/// is inside; stamps only when fully contained; every other shape when any
/// bounds corner is inside or any bounds edge crosses a box edge. The
/// corner+edge test is an accepted approximation, not exact clipping.
pub fn in_selection_box(
    annotation: &Annotation,
    a: Point,
    b: Point,
    metrics: &dyn TextMetrics,
) -> bool {
    let Some(bounds) = annotation_bounds(annotation, metrics) else {
        return false;
    };
    let marquee = Bounds::new(a.x, a.y, b.x, b.y);

    if annotation.kind.is_text_like() {
        return marquee.contains(bounds.center());
    }
    if annotation.kind.is_stamp() {
        return marquee.contains_bounds(&bounds);
    }

    if bounds.corners().iter().any(|c| marquee.contains(*c)) {
        return true;
    }
    bounds.edges().iter().any(|(e1, e2)| {
        marquee
            .edges()
            .iter()
            .any(|(m1, m2)| segments_intersect(*e1, *e2, *m1, *m2))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::HeuristicMetrics;
    use rp_core::model::{AnnotationStyle, Provenance, TextOptions};

    fn who() -> Provenance {
        Provenance {
            page_number: 1,
            author: "tester".into(),
            at_ms: 0,
        }
    }

    fn shape(kind: AnnotationKind, start: (f64, f64), end: (f64, f64)) -> Annotation {
        Annotation::shape(
            kind,
            Point::new(start.0, start.1),
            Point::new(end.0, end.1),
            AnnotationStyle::default(),
            &who(),
        )
    }

    #[test]
    fn circle_diameter_mode_hits_inside_the_disc() {
        let mut circle = shape(AnnotationKind::Circle, (0.0, 0.0), (10.0, 0.0));
        circle.style.circle_diameter_mode = true;
        // Center (5,0), radius 5.
        assert!(hit_test_point(Point::new(5.0, 0.0), &circle, 1.0, &HeuristicMetrics));
        assert!(!hit_test_point(Point::new(5.0, 10.0), &circle, 1.0, &HeuristicMetrics));
    }

    #[test]
    fn circle_radius_mode_reaches_further() {
        let circle = shape(AnnotationKind::Circle, (0.0, 0.0), (10.0, 0.0));
        // Center (0,0), radius 10: (5,8) lies inside (distance ≈ 9.4).
        assert!(hit_test_point(Point::new(5.0, 8.0), &circle, 1.0, &HeuristicMetrics));
        assert!(!hit_test_point(Point::new(8.0, 8.0), &circle, 1.0, &HeuristicMetrics));
    }

    #[test]
    fn stamps_hit_exactly_on_their_footprint() {
        let stamp = Annotation::stamp(
            AnnotationKind::StampApproved,
            Point::new(10.0, 10.0),
            AnnotationStyle::default(),
            &who(),
        );
        assert!(hit_test_point(Point::new(70.0, 30.0), &stamp, 1.0, &HeuristicMetrics));
        // One unit outside the 120×40 badge: no slop.
        assert!(!hit_test_point(Point::new(131.0, 30.0), &stamp, 1.0, &HeuristicMetrics));
    }

    #[test]
    fn shape_slop_shrinks_as_scale_grows() {
        let rect = shape(AnnotationKind::Rectangle, (0.0, 0.0), (10.0, 10.0));
        let just_outside = Point::new(14.0, 5.0);
        // lineWidth 2 → slop = 5/scale.
        assert!(hit_test_point(just_outside, &rect, 1.0, &HeuristicMetrics));
        assert!(!hit_test_point(just_outside, &rect, 4.0, &HeuristicMetrics));
    }

    #[test]
    fn text_grab_margin_ignores_scale() {
        let text = Annotation::note(
            Point::new(0.0, 0.0),
            "hi".into(),
            AnnotationStyle::default(),
            &who(),
        );
        // Minimum 120×40 box plus the flat 20-unit margin, at high zoom.
        assert!(hit_test_point(Point::new(-15.0, -15.0), &text, 8.0, &HeuristicMetrics));
        assert!(!hit_test_point(Point::new(-25.0, 0.0), &text, 8.0, &HeuristicMetrics));
    }

    #[test]
    fn empty_points_never_hit() {
        let mut rect = shape(AnnotationKind::Rectangle, (0.0, 0.0), (10.0, 10.0));
        rect.points.clear();
        assert!(!hit_test_point(Point::new(5.0, 5.0), &rect, 1.0, &HeuristicMetrics));
        assert_eq!(annotation_bounds(&rect, &HeuristicMetrics), None);
    }

    #[test]
    fn topmost_hit_prefers_the_latest_annotation() {
        let lower = shape(AnnotationKind::Rectangle, (0.0, 0.0), (20.0, 20.0));
        let upper = shape(AnnotationKind::Rectangle, (5.0, 5.0), (25.0, 25.0));
        let upper_id = upper.id;
        let annotations = vec![lower, upper];
        let hit = topmost_hit(
            Point::new(10.0, 10.0),
            &annotations,
            1,
            1.0,
            &HeuristicMetrics,
        );
        assert_eq!(hit, Some(upper_id));
    }

    #[test]
    fn topmost_hit_respects_the_page() {
        let mut other_page = shape(AnnotationKind::Rectangle, (0.0, 0.0), (20.0, 20.0));
        other_page.page_number = 2;
        let annotations = vec![other_page];
        assert_eq!(
            topmost_hit(Point::new(5.0, 5.0), &annotations, 1, 1.0, &HeuristicMetrics),
            None
        );
    }

    #[test]
    fn corners_take_priority_over_edge_midlines() {
        // A 12-unit-tall shape at scale 1: the top-left corner zone (radius 8)
        // overlaps the left edge midline zone; the corner must win.
        let rect = shape(AnnotationKind::Rectangle, (0.0, 0.0), (100.0, 12.0));
        let handle = handle_at(Point::new(0.0, 4.0), &rect, 1.0);
        assert_eq!(handle, Some(Handle::TopLeft));
    }

    #[test]
    fn edge_midline_handles_resolve() {
        let rect = shape(AnnotationKind::Rectangle, (0.0, 0.0), (100.0, 100.0));
        assert_eq!(handle_at(Point::new(0.0, 50.0), &rect, 1.0), Some(Handle::Left));
        assert_eq!(handle_at(Point::new(50.0, 100.0), &rect, 1.0), Some(Handle::Bottom));
        assert_eq!(handle_at(Point::new(50.0, 50.0), &rect, 1.0), None);
    }

    #[test]
    fn circle_compass_mapping_is_clockwise_from_east() {
        // Radius large enough that neighboring handle zones don't overlap;
        // on a small circle the first zone in scan order wins.
        let circle = shape(AnnotationKind::Circle, (0.0, 0.0), (100.0, 0.0));
        assert_eq!(circle_handle_at(Point::new(100.0, 0.0), &circle, 1.0), Some(Handle::Right));
        // 45° in y-down space is down-right.
        let d = 100.0 / 2.0_f64.sqrt();
        assert_eq!(circle_handle_at(Point::new(d, d), &circle, 1.0), Some(Handle::BottomRight));
        assert_eq!(circle_handle_at(Point::new(0.0, 100.0), &circle, 1.0), Some(Handle::Bottom));
        assert_eq!(circle_handle_at(Point::new(-100.0, 0.0), &circle, 1.0), Some(Handle::Left));
        assert_eq!(circle_handle_at(Point::new(0.0, -100.0), &circle, 1.0), Some(Handle::Top));
    }

    #[test]
    fn marquee_selects_text_by_center() {
        let text = Annotation::note(
            Point::new(0.0, 30.0),
            "hi".into(),
            AnnotationStyle::default(),
            &who(),
        );
        // 120×40 box at (0,30): center (60,50).
        assert!(in_selection_box(&text, Point::new(0.0, 0.0), Point::new(100.0, 100.0), &HeuristicMetrics));
        // Box ends left of the center.
        assert!(!in_selection_box(&text, Point::new(0.0, 0.0), Point::new(55.0, 100.0), &HeuristicMetrics));
    }

    #[test]
    fn marquee_requires_full_containment_for_stamps() {
        let stamp = Annotation::stamp(
            AnnotationKind::Stamp,
            Point::new(50.0, 50.0),
            AnnotationStyle::default(),
            &who(),
        );
        // Footprint 50..170 × 50..90 — partly outside a 100×100 box.
        assert!(!in_selection_box(&stamp, Point::new(0.0, 0.0), Point::new(100.0, 100.0), &HeuristicMetrics));
        assert!(in_selection_box(&stamp, Point::new(0.0, 0.0), Point::new(200.0, 100.0), &HeuristicMetrics));
    }

    #[test]
    fn marquee_catches_shapes_by_corner_or_edge_crossing() {
        // Corner inside.
        let rect = shape(AnnotationKind::Rectangle, (90.0, 90.0), (150.0, 150.0));
        assert!(in_selection_box(&rect, Point::new(0.0, 0.0), Point::new(100.0, 100.0), &HeuristicMetrics));
        // No corner inside, but edges cross (shape straddles the box).
        let tall = shape(AnnotationKind::Rectangle, (40.0, -50.0), (60.0, 150.0));
        assert!(in_selection_box(&tall, Point::new(0.0, 0.0), Point::new(100.0, 100.0), &HeuristicMetrics));
        // Fully outside.
        let far = shape(AnnotationKind::Rectangle, (300.0, 300.0), (320.0, 320.0));
        assert!(!in_selection_box(&far, Point::new(0.0, 0.0), Point::new(100.0, 100.0), &HeuristicMetrics));
    }

    #[test]
    fn default_text_options_drive_text_bounds() {
        let mut text = Annotation::note(
            Point::new(0.0, 0.0),
            "measure me please".into(),
            AnnotationStyle::default(),
            &who(),
        );
        text.style.text_options = Some(TextOptions {
            font_size: 28.0,
            ..TextOptions::default()
        });
        let b = annotation_bounds(&text, &HeuristicMetrics).unwrap();
        // 17 chars × 28 × 0.6 + 16 padding.
        assert_eq!(b.width(), 17.0 * 28.0 * 0.6 + 16.0);
    }
}
