//! Floating text-editor sessions.
//!
//! A session is the model half of the overlay textarea the host shows while
//! a text or sticky-note annotation is being written. The host owns the DOM
//! widget and keystrokes; the session owns the buffer, the anchor, and the
//! new-vs-existing distinction. Commit and cancel run through the surface,
//! which has the store and the history.

use rp_core::geom::Point;
use rp_core::id::AnnotationId;
use rp_core::model::Annotation;

/// An open text-editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSession {
    /// Page-space top-left corner of the editor box.
    pub anchor: Point,
    /// Explicit box from a drag-to-size gesture; `None` means the committed
    /// annotation auto-sizes to its content.
    pub dims: Option<(f64, f64)>,
    /// Whether commit produces a sticky note instead of free text.
    pub sticky: bool,
    /// Set when the session re-edits a committed annotation; that
    /// annotation stays hidden under the editor until the session ends.
    pub existing: Option<AnnotationId>,
    /// Current editor content, mirrored from the host widget.
    pub buffer: String,
}

impl TextSession {
    /// A fresh session for a new annotation.
    pub fn new(anchor: Point, dims: Option<(f64, f64)>, sticky: bool) -> Self {
        Self {
            anchor,
            dims,
            sticky,
            existing: None,
            buffer: String::new(),
        }
    }

    /// Re-edit a committed text or sticky-note annotation, prefilled with
    /// its current content.
    pub fn edit(annotation: &Annotation) -> Self {
        Self {
            anchor: annotation.points.first().copied().unwrap_or(Point::new(0.0, 0.0)),
            dims: None,
            sticky: annotation.kind == rp_core::model::AnnotationKind::StickyNote,
            existing: Some(annotation.id),
            buffer: annotation.text.clone().unwrap_or_default(),
        }
    }

    /// Replace the buffer with the host widget's current content.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.to_string();
    }

    pub fn insert_newline(&mut self) {
        self.buffer.push('\n');
    }

    /// Blank buffers commit as a cancel: no empty annotations.
    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}
