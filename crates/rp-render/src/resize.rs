//! Resize math for two-point shapes.
//!
//! All functions are pure: they take the annotation as committed and return
//! the replacement point list, leaving the caller (the gesture layer) to
//! write it back through the store. Shapes resize through their bounding
//! box, segments through their endpoints, circles through their radius.

use smallvec::{SmallVec, smallvec};

use crate::hit::Handle;
use rp_core::geom::{Bounds, Point};
use rp_core::model::{Annotation, AnnotationKind};

/// Smallest box span (page units) a resize may leave on either axis. The
/// same floor halves into the minimum circle radius.
pub const MIN_RESIZE_SIZE: f64 = 10.0;

fn is_segment(kind: AnnotationKind) -> bool {
    matches!(
        kind,
        AnnotationKind::Line | AnnotationKind::Arrow | AnnotationKind::DoubleArrow
    )
}

/// Whether `handle` may start a resize on `annotation`. Segments expose
/// only their endpoints (the bounds corners); edge midlines would have no
/// endpoint to move.
#[must_use]
pub fn valid_resize(annotation: &Annotation, handle: Handle) -> bool {
    if !annotation.kind.resizable() || annotation.points.len() != 2 {
        return false;
    }
    !is_segment(annotation.kind) || handle.is_corner()
}

/// Page-space position of `handle` on `bounds`.
#[must_use]
pub fn handle_position(bounds: &Bounds, handle: Handle) -> Point {
    let center = bounds.center();
    match handle {
        Handle::TopLeft => Point::new(bounds.left, bounds.top),
        Handle::Top => Point::new(center.x, bounds.top),
        Handle::TopRight => Point::new(bounds.right, bounds.top),
        Handle::Right => Point::new(bounds.right, center.y),
        Handle::BottomRight => Point::new(bounds.right, bounds.bottom),
        Handle::Bottom => Point::new(center.x, bounds.bottom),
        Handle::BottomLeft => Point::new(bounds.left, bounds.bottom),
        Handle::Left => Point::new(bounds.left, center.y),
    }
}

/// The replacement point list after dragging `handle` to `to`, or `None`
/// when the combination is not resizable. Sides opposite the handle are
/// anchored: dragging bottom-right never moves the top-left corner.
pub fn resized_points(
    annotation: &Annotation,
    handle: Handle,
    to: Point,
) -> Option<SmallVec<[Point; 4]>> {
    if !valid_resize(annotation, handle) {
        return None;
    }
    match annotation.kind {
        AnnotationKind::Circle => resize_circle(annotation, to),
        kind if is_segment(kind) => {
            let bounds = annotation.point_bounds()?;
            Some(resize_segment(
                &annotation.points,
                handle_position(&bounds, handle),
                to,
            ))
        }
        _ => {
            let bounds = annotation.point_bounds()?;
            Some(resize_box(&bounds, handle, to))
        }
    }
}

/// Move the endpoint nearest the grabbed corner; the other endpoint stays
/// put, so the segment's orientation survives (no bounds normalization).
fn resize_segment(points: &[Point], grabbed: Point, to: Point) -> SmallVec<[Point; 4]> {
    let mut out: SmallVec<[Point; 4]> = smallvec![points[0], points[1]];
    if points[0].distance_to(grabbed) <= points[1].distance_to(grabbed) {
        out[0] = to;
    } else {
        out[1] = to;
    }
    out
}

/// Keep the center, set the radius to the cursor distance, then restate the
/// two points under the annotation's own radius/diameter convention.
fn resize_circle(annotation: &Annotation, to: Point) -> Option<SmallVec<[Point; 4]>> {
    let (center, _) = annotation.circle_geometry()?;
    let radius = center.distance_to(to).max(MIN_RESIZE_SIZE / 2.0);
    let length = center.distance_to(to);
    let direction = if length == 0.0 {
        Point::new(1.0, 0.0)
    } else {
        Point::new((to.x - center.x) / length, (to.y - center.y) / length)
    };
    let rim = Point::new(center.x + direction.x * radius, center.y + direction.y * radius);
    if annotation.style.circle_diameter_mode {
        let mirror = Point::new(center.x - direction.x * radius, center.y - direction.y * radius);
        Some(smallvec![mirror, rim])
    } else {
        Some(smallvec![center, rim])
    }
}

/// Move the box sides adjacent to `handle`, clamping each moved side
/// against its anchored opposite so the span never drops below
/// [`MIN_RESIZE_SIZE`]. Output is normalized to `[(left, top), (right,
/// bottom)]`.
fn resize_box(bounds: &Bounds, handle: Handle, to: Point) -> SmallVec<[Point; 4]> {
    let Bounds {
        mut left,
        mut top,
        mut right,
        mut bottom,
    } = *bounds;

    match handle {
        Handle::TopLeft | Handle::Left | Handle::BottomLeft => {
            left = to.x.min(right - MIN_RESIZE_SIZE);
        }
        Handle::TopRight | Handle::Right | Handle::BottomRight => {
            right = to.x.max(left + MIN_RESIZE_SIZE);
        }
        Handle::Top | Handle::Bottom => {}
    }
    match handle {
        Handle::TopLeft | Handle::Top | Handle::TopRight => {
            top = to.y.min(bottom - MIN_RESIZE_SIZE);
        }
        Handle::BottomLeft | Handle::Bottom | Handle::BottomRight => {
            bottom = to.y.max(top + MIN_RESIZE_SIZE);
        }
        Handle::Left | Handle::Right => {}
    }

    smallvec![Point::new(left, top), Point::new(right, bottom)]
}
