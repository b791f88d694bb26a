//! The gesture state machine's states.
//!
//! Exactly one gesture exists per page surface at a time. Variants that
//! mutate the store mid-gesture (`Moving`, `Resizing`, `CircleRecentering`)
//! carry the pre-gesture annotation values so one undo command can be
//! recorded when the gesture ends.

use rp_core::geom::Point;
use rp_core::id::AnnotationId;
use rp_core::model::Annotation;
use rp_core::store::Tool;
use rp_render::Handle;

use crate::text_session::TextSession;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// A drawing tool is laying down points. Two-point shapes keep
    /// `[start, current]`; freehand accumulates the whole trace; stamps
    /// keep only the down point.
    Drawing { tool: Tool, points: Vec<Point> },
    /// Marquee selection. The selection is recomputed from scratch on
    /// every move, so shrinking the box deselects.
    Selecting { start: Point, end: Point },
    /// Dragging the current selection. Deltas apply incrementally against
    /// `last`, never against the gesture origin.
    Moving {
        last: Point,
        before: Vec<Annotation>,
    },
    /// Dragging one resize handle of a single selected shape.
    Resizing {
        handle: Handle,
        target: AnnotationId,
        before: Annotation,
    },
    /// Dragging a selected circle's interior: the circle translates,
    /// keeping its radius.
    CircleRecentering {
        last: Point,
        target: AnnotationId,
        before: Annotation,
    },
    /// Drag-to-size for the text and sticky-note tools, before the editor
    /// opens.
    TextDragging { start: Point, end: Point },
    /// A floating text editor is open; pointer traffic is suspended.
    TextEditing(TextSession),
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    pub fn is_text_editing(&self) -> bool {
        matches!(self, Gesture::TextEditing(_))
    }

    /// Short tag for trace logging.
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Idle => "idle",
            Gesture::Drawing { .. } => "drawing",
            Gesture::Selecting { .. } => "selecting",
            Gesture::Moving { .. } => "moving",
            Gesture::Resizing { .. } => "resizing",
            Gesture::CircleRecentering { .. } => "circle-recentering",
            Gesture::TextDragging { .. } => "text-dragging",
            Gesture::TextEditing(_) => "text-editing",
        }
    }
}
