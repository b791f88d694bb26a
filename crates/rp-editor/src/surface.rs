//! One page's gesture engine.
//!
//! A `PageSurface` owns the interaction state for a single visible page:
//! the current gesture, hover position, and the page/scale pair that maps
//! screen pixels to page units. It mutates the shared store synchronously
//! as events arrive and records one undo command per finished gesture.
//!
//! The surface never paints. It exposes the transient overlay
//! ([`PageSurface::transient`]) for the renderer to pick up each frame.

use std::mem;

use smallvec::SmallVec;

use rp_core::geom::{Bounds, Point};
use rp_core::id::{AnnotationId, DocumentId};
use rp_core::model::{Annotation, AnnotationKind, Provenance, TextOptions};
use rp_core::store::{AnnotationStore, ChangeSource, Tool};
use rp_render::{
    Draft, Ghost, TextDrag, TextMetrics, Transient, circle_handle_at, handle_at, in_selection_box,
    resized_points, topmost_hit, valid_resize,
};

use crate::commands::{Command, CommandStack, EditOp};
use crate::input::{InputEvent, Modifiers};
use crate::state::Gesture;
use crate::text_session::TextSession;

/// Minimum bounding-box span (page units, either axis) for a two-point
/// shape to commit. Accidental clicks with a shape tool armed draw nothing.
pub const COMMIT_MIN_SPAN: f64 = 5.0;
/// Screen-pixel drag distance separating click-to-place from drag-to-size
/// for the text tools.
pub const TEXT_DRAG_THRESHOLD: f64 = 5.0;

/// What the editor overlay did as a result of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorSignal {
    Opened,
    Closed,
}

/// Result of feeding one event to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceUpdate {
    pub repaint: bool,
    pub editor: Option<EditorSignal>,
}

impl SurfaceUpdate {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn repaint() -> Self {
        Self {
            repaint: true,
            editor: None,
        }
    }

    fn editor(signal: EditorSignal) -> Self {
        Self {
            repaint: true,
            editor: Some(signal),
        }
    }
}

/// Gesture engine for one page of one document.
#[derive(Debug)]
pub struct PageSurface {
    document: DocumentId,
    page: u32,
    scale: f64,
    gesture: Gesture,
    hover: Option<Point>,
    shift_down: bool,
}

impl PageSurface {
    pub fn new(document: DocumentId, page: u32, scale: f64) -> Self {
        Self {
            document,
            page,
            scale,
            gesture: Gesture::Idle,
            hover: None,
            shift_down: false,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Zoom changed. Page-space state is zoom-independent, so the gesture
    /// survives; only the pixel→page mapping moves.
    pub fn set_scale(&mut self, scale: f64) {
        if scale > 0.0 {
            self.scale = scale;
        }
    }

    /// Navigate this surface to a different page: transient state and the
    /// selection are meaningless across pages and are dropped.
    pub fn set_page(&mut self, page: u32, store: &mut AnnotationStore) {
        if self.page == page {
            return;
        }
        self.page = page;
        self.gesture = Gesture::Idle;
        self.hover = None;
        store.clear_selection(self.document);
    }

    /// The host switched tools; any in-flight gesture is abandoned.
    pub fn tool_changed(&mut self) {
        if !self.gesture.is_idle() {
            log::trace!("tool change abandons {} gesture", self.gesture.name());
            self.gesture = Gesture::Idle;
        }
    }

    /// The open text session, if any.
    pub fn session(&self) -> Option<&TextSession> {
        match &self.gesture {
            Gesture::TextEditing(session) => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut TextSession> {
        match &mut self.gesture {
            Gesture::TextEditing(session) => Some(session),
            _ => None,
        }
    }

    /// Annotation hidden under the open editor, for the renderer.
    pub fn editing(&self) -> Option<AnnotationId> {
        self.session().and_then(|s| s.existing)
    }

    // ─── Event entry point ───────────────────────────────────────────────

    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        store: &mut AnnotationStore,
        history: &mut CommandStack,
        metrics: &dyn TextMetrics,
    ) -> SurfaceUpdate {
        if let Some(time_ms) = event.time_ms() {
            store.touch(time_ms);
        }
        match event {
            InputEvent::PointerDown { x, y, mods, .. } => {
                self.pointer_down(Point::new(*x, *y), *mods, store, history, metrics)
            }
            InputEvent::PointerMove { x, y, mods, .. } => {
                self.pointer_move(Point::new(*x, *y), *mods, store, metrics)
            }
            InputEvent::PointerUp { x, y, .. } => {
                self.pointer_up(Point::new(*x, *y), store, history)
            }
            InputEvent::PointerLeave => self.pointer_leave(store, history),
            InputEvent::DoubleClick { x, y, .. } => {
                self.double_click(Point::new(*x, *y), store, metrics)
            }
            InputEvent::Key { key, mods, .. } => self.key(key, *mods, store, history),
        }
    }

    // ─── Pointer down ────────────────────────────────────────────────────

    fn pointer_down(
        &mut self,
        at: Point,
        mods: Modifiers,
        store: &mut AnnotationStore,
        history: &mut CommandStack,
        metrics: &dyn TextMetrics,
    ) -> SurfaceUpdate {
        self.hover = Some(at);
        self.shift_down = mods.shift;

        if self.gesture.is_text_editing() {
            // Clicking anywhere else blurs the floating editor.
            self.commit_text(store, history);
            return SurfaceUpdate::editor(EditorSignal::Closed);
        }

        let update = match store.tool() {
            Tool::Select => self.select_down(at, mods, store, metrics),
            Tool::Text | Tool::StickyNote => {
                self.gesture = Gesture::TextDragging { start: at, end: at };
                SurfaceUpdate::repaint()
            }
            tool if tool.is_stamp() => {
                self.gesture = Gesture::Drawing {
                    tool,
                    points: vec![at],
                };
                SurfaceUpdate::none()
            }
            Tool::Freehand => {
                self.gesture = Gesture::Drawing {
                    tool: Tool::Freehand,
                    points: vec![at],
                };
                SurfaceUpdate::repaint()
            }
            tool => {
                self.gesture = Gesture::Drawing {
                    tool,
                    points: vec![at, at],
                };
                SurfaceUpdate::repaint()
            }
        };
        log::trace!("pointer down -> {}", self.gesture.name());
        update
    }

    /// Select-tool pointer down: handles beat bodies, bodies beat empty
    /// space. Circles check their perimeter compass before anything else,
    /// and an off-handle grab on a selected circle recenters it.
    fn select_down(
        &mut self,
        at: Point,
        mods: Modifiers,
        store: &mut AnnotationStore,
        metrics: &dyn TextMetrics,
    ) -> SurfaceUpdate {
        let doc = self.document;
        let hit = topmost_hit(at, store.annotations(doc), self.page, self.scale, metrics);
        let Some(id) = hit else {
            store.clear_selection(doc);
            self.gesture = Gesture::Selecting { start: at, end: at };
            return SurfaceUpdate::repaint();
        };

        if store.is_selected(doc, id) {
            let Some(target) = store.get(doc, id).cloned() else {
                return SurfaceUpdate::none();
            };
            if target.kind == AnnotationKind::Circle {
                if let Some(handle) = circle_handle_at(at, &target, self.scale) {
                    if valid_resize(&target, handle) {
                        self.gesture = Gesture::Resizing {
                            handle,
                            target: id,
                            before: target,
                        };
                        return SurfaceUpdate::repaint();
                    }
                }
                self.gesture = Gesture::CircleRecentering {
                    last: at,
                    target: id,
                    before: target,
                };
                return SurfaceUpdate::repaint();
            }
            if let Some(handle) = handle_at(at, &target, self.scale) {
                if valid_resize(&target, handle) {
                    self.gesture = Gesture::Resizing {
                        handle,
                        target: id,
                        before: target,
                    };
                    return SurfaceUpdate::repaint();
                }
            }
            let before = store
                .selected_annotations(doc)
                .into_iter()
                .cloned()
                .collect();
            self.gesture = Gesture::Moving { last: at, before };
            return SurfaceUpdate::repaint();
        }

        if mods.shift {
            // Additive toggle; no drag starts from a shift-click.
            store.toggle_selection(doc, id);
            return SurfaceUpdate::repaint();
        }

        store.select_annotations(doc, vec![id]);
        let before = store
            .selected_annotations(doc)
            .into_iter()
            .cloned()
            .collect();
        self.gesture = Gesture::Moving { last: at, before };
        SurfaceUpdate::repaint()
    }

    // ─── Pointer move ────────────────────────────────────────────────────

    fn pointer_move(
        &mut self,
        at: Point,
        mods: Modifiers,
        store: &mut AnnotationStore,
        metrics: &dyn TextMetrics,
    ) -> SurfaceUpdate {
        self.hover = Some(at);
        self.shift_down = mods.shift;
        let doc = self.document;

        match &mut self.gesture {
            Gesture::Drawing { tool, points } => {
                match tool {
                    Tool::Freehand => points.push(at),
                    tool if tool.is_stamp() => {} // stamps place at the down point
                    _ => {
                        if let Some(end) = points.last_mut() {
                            *end = at;
                        }
                    }
                }
                SurfaceUpdate::repaint()
            }
            Gesture::Selecting { start, end } => {
                *end = at;
                let start = *start;
                // Recomputed from scratch so a shrinking box deselects.
                let ids: Vec<AnnotationId> = store
                    .annotations_for_page(doc, self.page)
                    .filter(|a| in_selection_box(a, start, at, metrics))
                    .map(|a| a.id)
                    .collect();
                store.select_annotations(doc, ids);
                SurfaceUpdate::repaint()
            }
            Gesture::Moving { last, .. } => {
                let (dx, dy) = (at.x - last.x, at.y - last.y);
                *last = at;
                let moved: Vec<Annotation> = store
                    .selected_annotations(doc)
                    .into_iter()
                    .cloned()
                    .map(|mut a| {
                        a.translate(dx, dy);
                        a
                    })
                    .collect();
                for annotation in moved {
                    store.update_annotation(doc, annotation, ChangeSource::Editing);
                }
                SurfaceUpdate::repaint()
            }
            Gesture::Resizing { handle, target, .. } => {
                let handle = *handle;
                let target = *target;
                let Some(current) = store.get(doc, target).cloned() else {
                    return SurfaceUpdate::none();
                };
                let Some(points) = resized_points(&current, handle, at) else {
                    return SurfaceUpdate::none();
                };
                let mut resized = current;
                resized.points = points;
                store.update_annotation(doc, resized, ChangeSource::Editing);
                SurfaceUpdate::repaint()
            }
            Gesture::CircleRecentering { last, target, .. } => {
                let (dx, dy) = (at.x - last.x, at.y - last.y);
                *last = at;
                let target = *target;
                let Some(mut circle) = store.get(doc, target).cloned() else {
                    return SurfaceUpdate::none();
                };
                circle.translate(dx, dy);
                store.update_annotation(doc, circle, ChangeSource::Editing);
                SurfaceUpdate::repaint()
            }
            Gesture::TextDragging { end, .. } => {
                *end = at;
                SurfaceUpdate::repaint()
            }
            Gesture::TextEditing(_) => SurfaceUpdate::none(),
            Gesture::Idle => {
                // The armed-tool ghost tracks the hover point.
                if store.tool().is_text_like() {
                    SurfaceUpdate::repaint()
                } else {
                    SurfaceUpdate::none()
                }
            }
        }
    }

    // ─── Pointer up ──────────────────────────────────────────────────────

    fn pointer_up(
        &mut self,
        at: Point,
        store: &mut AnnotationStore,
        history: &mut CommandStack,
    ) -> SurfaceUpdate {
        match mem::take(&mut self.gesture) {
            Gesture::Drawing { tool, points } => {
                self.commit_drawing(tool, &points, store, history);
                SurfaceUpdate::repaint()
            }
            Gesture::Selecting { .. } => SurfaceUpdate::repaint(),
            Gesture::Moving { before, .. } => {
                self.finish_replacements(before, store, history, "move");
                SurfaceUpdate::repaint()
            }
            Gesture::CircleRecentering { before, .. } => {
                self.finish_replacements(vec![before], store, history, "move");
                SurfaceUpdate::repaint()
            }
            Gesture::Resizing { before, .. } => {
                self.finish_replacements(vec![before], store, history, "resize");
                SurfaceUpdate::repaint()
            }
            Gesture::TextDragging { start, end } => {
                let sticky = store.tool() == Tool::StickyNote;
                let threshold = TEXT_DRAG_THRESHOLD / self.scale;
                let dragged =
                    (end.x - start.x).abs() >= threshold || (end.y - start.y).abs() >= threshold;
                let session = if dragged {
                    let b = Bounds::new(start.x, start.y, end.x, end.y);
                    TextSession::new(
                        Point::new(b.left, b.top),
                        Some((b.right - b.left, b.bottom - b.top)),
                        sticky,
                    )
                } else {
                    // Click-to-place anchors at the down point; let go of
                    // wherever the pointer drifted to.
                    let _ = at;
                    TextSession::new(start, None, sticky)
                };
                self.gesture = Gesture::TextEditing(session);
                SurfaceUpdate::editor(EditorSignal::Opened)
            }
            gesture @ Gesture::TextEditing(_) => {
                self.gesture = gesture;
                SurfaceUpdate::none()
            }
            Gesture::Idle => SurfaceUpdate::none(),
        }
    }

    /// Commit or discard a finished drawing gesture.
    fn commit_drawing(
        &mut self,
        tool: Tool,
        points: &[Point],
        store: &mut AnnotationStore,
        history: &mut CommandStack,
    ) {
        let Some(kind) = tool.kind() else { return };
        let who = self.provenance(store);
        let style = store.style().clone();

        let committed = if kind.is_stamp() {
            points
                .first()
                .map(|anchor| Annotation::stamp(kind, *anchor, style, &who))
        } else if kind == AnnotationKind::Freehand {
            (points.len() >= 2).then(|| {
                Annotation::freehand(SmallVec::from_slice(points), style, &who)
            })
        } else if points.len() >= 2 && span_reaches(points, COMMIT_MIN_SPAN) {
            if kind == AnnotationKind::Highlight {
                Some(Annotation::highlight(points[0], points[1], style, &who))
            } else {
                Some(Annotation::shape(kind, points[0], points[1], style, &who))
            }
        } else {
            None
        };

        let Some(annotation) = committed else {
            log::trace!("{} draw below minimum span, discarded", kind.as_str());
            return;
        };
        let doc = self.document;
        store.add_annotation(doc, annotation.clone(), ChangeSource::Drawing);
        let index = store.annotations(doc).len() - 1;
        history.push(Command::new(
            "draw",
            vec![EditOp::Insert {
                doc,
                annotation,
                index,
            }],
        ));
        store.clear_selection(doc);
    }

    /// Record one undo command covering whatever a move/resize gesture
    /// changed. Annotations that ended up exactly where they started
    /// produce no ops, so a zero-length drag records nothing.
    fn finish_replacements(
        &self,
        before: Vec<Annotation>,
        store: &AnnotationStore,
        history: &mut CommandStack,
        label: &str,
    ) {
        let doc = self.document;
        let ops: Vec<EditOp> = before
            .into_iter()
            .filter_map(|before| {
                let after = store.get(doc, before.id)?.clone();
                (after != before).then_some(EditOp::Replace { doc, before, after })
            })
            .collect();
        history.push(Command::new(label, ops));
    }

    // ─── Pointer leave ───────────────────────────────────────────────────

    /// The pointer left the surface. Freehand traces commit (ink already on
    /// the page is kept); draft shapes and the marquee vanish; move/resize
    /// gestures end where they are and still record their undo command. An
    /// open editor is unaffected.
    fn pointer_leave(
        &mut self,
        store: &mut AnnotationStore,
        history: &mut CommandStack,
    ) -> SurfaceUpdate {
        self.hover = None;
        match mem::take(&mut self.gesture) {
            Gesture::Drawing {
                tool: Tool::Freehand,
                points,
            } => {
                self.commit_drawing(Tool::Freehand, &points, store, history);
                SurfaceUpdate::repaint()
            }
            Gesture::Drawing { tool, .. } => {
                log::trace!("{} draw abandoned on leave", tool.name());
                SurfaceUpdate::repaint()
            }
            Gesture::Moving { before, .. } => {
                self.finish_replacements(before, store, history, "move");
                SurfaceUpdate::repaint()
            }
            Gesture::CircleRecentering { before, .. } => {
                self.finish_replacements(vec![before], store, history, "move");
                SurfaceUpdate::repaint()
            }
            Gesture::Resizing { before, .. } => {
                self.finish_replacements(vec![before], store, history, "resize");
                SurfaceUpdate::repaint()
            }
            Gesture::Selecting { .. } | Gesture::TextDragging { .. } => SurfaceUpdate::repaint(),
            gesture @ Gesture::TextEditing(_) => {
                self.gesture = gesture;
                SurfaceUpdate::none()
            }
            Gesture::Idle => SurfaceUpdate::none(),
        }
    }

    // ─── Double click ────────────────────────────────────────────────────

    /// Double-clicking a text or sticky-note annotation reopens it in the
    /// floating editor, prefilled. Everything else ignores double clicks.
    fn double_click(
        &mut self,
        at: Point,
        store: &mut AnnotationStore,
        metrics: &dyn TextMetrics,
    ) -> SurfaceUpdate {
        if self.gesture.is_text_editing() {
            return SurfaceUpdate::none();
        }
        let doc = self.document;
        let Some(id) = topmost_hit(at, store.annotations(doc), self.page, self.scale, metrics)
        else {
            return SurfaceUpdate::none();
        };
        let Some(annotation) = store.get(doc, id) else {
            return SurfaceUpdate::none();
        };
        if !annotation.kind.is_text_like() {
            return SurfaceUpdate::none();
        }
        self.gesture = Gesture::TextEditing(TextSession::edit(annotation));
        SurfaceUpdate::editor(EditorSignal::Opened)
    }

    // ─── Keys ────────────────────────────────────────────────────────────

    /// Keys the surface handles itself: editor control while a session is
    /// open, and Delete/Backspace on the selection. Tool letters, undo
    /// chords, and the global Escape binding live in the host bridge.
    fn key(
        &mut self,
        key: &str,
        mods: Modifiers,
        store: &mut AnnotationStore,
        history: &mut CommandStack,
    ) -> SurfaceUpdate {
        if self.gesture.is_text_editing() {
            return match key {
                "Enter" if mods.shift => {
                    if let Some(session) = self.session_mut() {
                        session.insert_newline();
                    }
                    SurfaceUpdate::repaint()
                }
                "Enter" => {
                    self.commit_text(store, history);
                    SurfaceUpdate::editor(EditorSignal::Closed)
                }
                "Escape" => {
                    self.cancel_text();
                    SurfaceUpdate::editor(EditorSignal::Closed)
                }
                _ => SurfaceUpdate::none(),
            };
        }

        match key {
            "Delete" | "Backspace" => {
                if self.delete_selected(store, history) {
                    SurfaceUpdate::repaint()
                } else {
                    SurfaceUpdate::none()
                }
            }
            _ => SurfaceUpdate::none(),
        }
    }

    /// Delete every selected annotation as one undoable command.
    pub fn delete_selected(
        &mut self,
        store: &mut AnnotationStore,
        history: &mut CommandStack,
    ) -> bool {
        let doc = self.document;
        let ids: Vec<AnnotationId> = store.selected_ids(doc).to_vec();
        if ids.is_empty() {
            return false;
        }
        // Capture indices against the pre-delete list, ascending, so undo
        // can re-insert in reverse and restore paint order.
        let mut captured: Vec<(usize, Annotation)> = ids
            .iter()
            .filter_map(|id| {
                let index = store.index_of(doc, *id)?;
                let annotation = store.get(doc, *id)?.clone();
                Some((index, annotation))
            })
            .collect();
        captured.sort_by_key(|(index, _)| *index);

        let ops: Vec<EditOp> = captured
            .iter()
            .map(|(index, annotation)| EditOp::Delete {
                doc,
                annotation: annotation.clone(),
                index: *index,
            })
            .collect();
        for (_, annotation) in &captured {
            store.delete_annotation(doc, annotation.id, ChangeSource::Editing);
        }
        store.clear_selection(doc);
        history.push(Command::new("delete", ops));
        true
    }

    // ─── Text session commit/cancel ──────────────────────────────────────

    /// Commit the open text session. A blank buffer cancels instead; a new
    /// annotation switches the tool back to select so the next click edits
    /// rather than creates.
    pub fn commit_text(&mut self, store: &mut AnnotationStore, history: &mut CommandStack) -> bool {
        if !self.gesture.is_text_editing() {
            return false;
        }
        let Gesture::TextEditing(session) = mem::take(&mut self.gesture) else {
            return false;
        };
        if session.is_blank() {
            log::trace!("blank text session cancelled");
            return false;
        }
        let doc = self.document;

        if let Some(id) = session.existing {
            let Some(before) = store.get(doc, id).cloned() else {
                return false;
            };
            let mut after = before.clone();
            after.text = Some(session.buffer);
            store.update_annotation(doc, after.clone(), ChangeSource::Editing);
            history.push(Command::new(
                "edit text",
                vec![EditOp::Replace { doc, before, after }],
            ));
            return true;
        }

        let who = self.provenance(store);
        let annotation = if session.sticky {
            Annotation::sticky(session.anchor, session.buffer, &who)
        } else {
            let mut style = store.style().clone();
            if style.text_options.is_none() {
                style.text_options = Some(TextOptions::default());
            }
            Annotation::note(session.anchor, session.buffer, style, &who)
        };
        store.add_annotation(doc, annotation.clone(), ChangeSource::Drawing);
        let index = store.annotations(doc).len() - 1;
        history.push(Command::new(
            "add note",
            vec![EditOp::Insert {
                doc,
                annotation,
                index,
            }],
        ));
        store.set_tool(doc, Tool::Select);
        true
    }

    /// Discard the open text session without touching the store.
    pub fn cancel_text(&mut self) -> bool {
        if self.gesture.is_text_editing() {
            self.gesture = Gesture::Idle;
            true
        } else {
            false
        }
    }

    // ─── Renderer feed ───────────────────────────────────────────────────

    /// The per-frame overlay derived from the current gesture.
    pub fn transient(&self, store: &AnnotationStore) -> Transient {
        let mut transient = Transient::default();
        match &self.gesture {
            Gesture::Drawing { tool, points } => {
                if let Some(kind) = tool.kind() {
                    if !kind.is_stamp() {
                        transient.draft = Some(Draft {
                            kind,
                            points: points.clone(),
                            style: store.style().clone(),
                        });
                    }
                }
            }
            Gesture::Selecting { start, end } => {
                transient.marquee = Some((*start, *end));
            }
            Gesture::TextDragging { start, end } => {
                transient.text_drag = Some(TextDrag {
                    start: *start,
                    end: *end,
                    sticky: store.tool() == Tool::StickyNote,
                    color: store.style().color,
                });
            }
            Gesture::Resizing { target, .. } if self.shift_down => {
                if let Some((center, _)) = store
                    .get(self.document, *target)
                    .and_then(|a| a.circle_geometry())
                {
                    transient.uniform_badge = Some(center);
                }
            }
            Gesture::Idle if store.tool().is_text_like() => {
                if let Some(at) = self.hover {
                    let style = store.style();
                    transient.ghost = Some(Ghost {
                        at,
                        sticky: store.tool() == Tool::StickyNote,
                        color: style.color,
                        font_size: style
                            .text_options
                            .as_ref()
                            .map_or(14.0, |options| options.font_size),
                    });
                }
            }
            _ => {}
        }
        transient
    }

    /// CSS cursor name for the current pointer state.
    pub fn cursor(&self, store: &AnnotationStore, metrics: &dyn TextMetrics) -> &'static str {
        match &self.gesture {
            Gesture::Moving { .. } | Gesture::CircleRecentering { .. } => "move",
            Gesture::Resizing { handle, .. } => handle.cursor(),
            Gesture::Drawing { .. } => "crosshair",
            Gesture::Selecting { .. } => "default",
            Gesture::TextDragging { .. } | Gesture::TextEditing(_) => "text",
            Gesture::Idle => match store.tool() {
                Tool::Select => self.hover_cursor(store, metrics),
                Tool::Text | Tool::StickyNote => "text",
                _ => "crosshair",
            },
        }
    }

    fn hover_cursor(&self, store: &AnnotationStore, metrics: &dyn TextMetrics) -> &'static str {
        let Some(at) = self.hover else {
            return "default";
        };
        let doc = self.document;
        // Handle feedback only over a lone selection, matching where
        // handles actually render.
        if let [id] = store.selected_ids(doc) {
            if let Some(annotation) = store.get(doc, *id) {
                let handle = if annotation.kind == AnnotationKind::Circle {
                    circle_handle_at(at, annotation, self.scale)
                } else {
                    handle_at(at, annotation, self.scale)
                };
                if let Some(handle) = handle.filter(|h| valid_resize(annotation, *h)) {
                    return handle.cursor();
                }
            }
        }
        if topmost_hit(at, store.annotations(doc), self.page, self.scale, metrics).is_some() {
            "move"
        } else {
            "default"
        }
    }

    fn provenance(&self, store: &AnnotationStore) -> Provenance {
        Provenance {
            page_number: self.page,
            author: store.author().to_string(),
            at_ms: store.now_ms(),
        }
    }
}

fn span_reaches(points: &[Point], minimum: f64) -> bool {
    let Some(bounds) = Bounds::from_points(points) else {
        return false;
    };
    bounds.right - bounds.left >= minimum || bounds.bottom - bounds.top >= minimum
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rp_render::HeuristicMetrics;

    fn doc() -> DocumentId {
        DocumentId::intern("doc-1")
    }

    fn fixture() -> (PageSurface, AnnotationStore, CommandStack) {
        (
            PageSurface::new(doc(), 1, 1.0),
            AnnotationStore::new(),
            CommandStack::new(crate::commands::DEFAULT_HISTORY_DEPTH),
        )
    }

    fn feed(
        surface: &mut PageSurface,
        store: &mut AnnotationStore,
        history: &mut CommandStack,
        event: InputEvent,
    ) -> SurfaceUpdate {
        surface.handle_event(&event, store, history, &HeuristicMetrics)
    }

    fn drag(
        surface: &mut PageSurface,
        store: &mut AnnotationStore,
        history: &mut CommandStack,
        from: (f64, f64),
        to: (f64, f64),
    ) {
        feed(
            surface,
            store,
            history,
            InputEvent::pointer_down(from.0, from.1, Modifiers::NONE, 0),
        );
        feed(
            surface,
            store,
            history,
            InputEvent::pointer_move(to.0, to.1, Modifiers::NONE, 1),
        );
        feed(
            surface,
            store,
            history,
            InputEvent::pointer_up(to.0, to.1, Modifiers::NONE, 2),
        );
    }

    #[test]
    fn rectangle_drag_commits_one_annotation() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (60.0, 40.0));

        let annotations = store.annotations(doc());
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, AnnotationKind::Rectangle);
        assert_eq!(
            annotations[0].points.as_slice(),
            &[Point::new(10.0, 10.0), Point::new(60.0, 40.0)]
        );
        assert!(history.can_undo());
        assert!(store.selected_ids(doc()).is_empty());
        assert!(surface.gesture.is_idle());
    }

    #[test]
    fn tiny_shape_drag_is_discarded() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (13.0, 12.0));
        assert!(store.annotations(doc()).is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn one_point_freehand_is_discarded() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Freehand);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(10.0, 10.0, Modifiers::NONE, 0),
        );
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_up(10.0, 10.0, Modifiers::NONE, 1),
        );
        assert!(store.annotations(doc()).is_empty());
    }

    #[test]
    fn freehand_keeps_the_whole_trace() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Freehand);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(0.0, 0.0, Modifiers::NONE, 0),
        );
        for i in 1..=4 {
            feed(
                &mut surface,
                &mut store,
                &mut history,
                InputEvent::pointer_move(i as f64, i as f64, Modifiers::NONE, i),
            );
        }
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_up(4.0, 4.0, Modifiers::NONE, 5),
        );
        assert_eq!(store.annotations(doc())[0].points.len(), 5);
    }

    #[test]
    fn freehand_commits_when_the_pointer_leaves() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Freehand);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(0.0, 0.0, Modifiers::NONE, 0),
        );
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(30.0, 30.0, Modifiers::NONE, 1),
        );
        feed(&mut surface, &mut store, &mut history, InputEvent::PointerLeave);
        assert_eq!(store.annotations(doc()).len(), 1);
        assert_eq!(store.annotations(doc())[0].kind, AnnotationKind::Freehand);
    }

    #[test]
    fn shape_draft_vanishes_when_the_pointer_leaves() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(0.0, 0.0, Modifiers::NONE, 0),
        );
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(50.0, 50.0, Modifiers::NONE, 1),
        );
        feed(&mut surface, &mut store, &mut history, InputEvent::PointerLeave);
        assert!(store.annotations(doc()).is_empty());
        assert!(surface.gesture.is_idle());
    }

    #[test]
    fn highlight_commits_as_a_four_corner_polygon() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Highlight);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (80.0, 24.0));
        let highlight = &store.annotations(doc())[0];
        assert_eq!(highlight.kind, AnnotationKind::Highlight);
        assert_eq!(highlight.points.len(), 4);
        assert_eq!(highlight.style.opacity, rp_core::model::HIGHLIGHT_OPACITY);
    }

    #[test]
    fn stamp_places_at_the_down_point() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::StampApproved);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(200.0, 300.0, Modifiers::NONE, 0),
        );
        // Drift before release must not move the stamp.
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(220.0, 320.0, Modifiers::NONE, 1),
        );
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_up(220.0, 320.0, Modifiers::NONE, 2),
        );
        let stamp = &store.annotations(doc())[0];
        assert_eq!(stamp.kind, AnnotationKind::StampApproved);
        assert_eq!(stamp.points.as_slice(), &[Point::new(200.0, 300.0)]);
    }

    #[test]
    fn click_selects_and_drag_moves_the_selection() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (60.0, 40.0));
        let id = store.annotations(doc())[0].id;

        store.set_tool(doc(), Tool::Select);
        surface.tool_changed();
        drag(&mut surface, &mut store, &mut history, (30.0, 20.0), (50.0, 45.0));

        assert_eq!(store.selected_ids(doc()), &[id]);
        let moved = store.get(doc(), id).unwrap();
        assert_eq!(
            moved.points.as_slice(),
            &[Point::new(30.0, 35.0), Point::new(80.0, 65.0)]
        );
        // One draw + one move on the history.
        store.touch(10);
        assert_eq!(history.undo(&mut store), Some("move".into()));
        assert_eq!(
            store.get(doc(), id).unwrap().points.as_slice(),
            &[Point::new(10.0, 10.0), Point::new(60.0, 40.0)]
        );
    }

    #[test]
    fn zero_length_click_records_no_move_command() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (60.0, 40.0));

        store.set_tool(doc(), Tool::Select);
        surface.tool_changed();
        drag(&mut surface, &mut store, &mut history, (30.0, 20.0), (30.0, 20.0));

        assert_eq!(history.undo(&mut store), Some("draw".into()));
    }

    #[test]
    fn marquee_recomputes_from_scratch() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (40.0, 40.0));
        drag(&mut surface, &mut store, &mut history, (100.0, 10.0), (140.0, 40.0));
        store.set_tool(doc(), Tool::Select);
        surface.tool_changed();

        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(0.0, 0.0, Modifiers::NONE, 0),
        );
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(150.0, 50.0, Modifiers::NONE, 1),
        );
        assert_eq!(store.selected_ids(doc()).len(), 2);

        // Shrink the box back over just the first shape.
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(50.0, 50.0, Modifiers::NONE, 2),
        );
        assert_eq!(store.selected_ids(doc()).len(), 1);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_up(50.0, 50.0, Modifiers::NONE, 3),
        );
        assert_eq!(store.selected_ids(doc()).len(), 1);
    }

    #[test]
    fn shift_click_toggles_membership_without_dragging() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (40.0, 40.0));
        drag(&mut surface, &mut store, &mut history, (100.0, 10.0), (140.0, 40.0));
        let (a, b) = (store.annotations(doc())[0].id, store.annotations(doc())[1].id);
        store.set_tool(doc(), Tool::Select);
        surface.tool_changed();

        drag(&mut surface, &mut store, &mut history, (20.0, 20.0), (20.0, 20.0));
        assert_eq!(store.selected_ids(doc()), &[a]);

        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(120.0, 20.0, Modifiers::shift(), 0),
        );
        assert_eq!(store.selected_ids(doc()), &[a, b]);
        assert!(surface.gesture.is_idle());
    }

    #[test]
    fn resize_drags_the_grabbed_corner() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (60.0, 40.0));
        let id = store.annotations(doc())[0].id;
        store.set_tool(doc(), Tool::Select);
        surface.tool_changed();
        store.select_annotations(doc(), vec![id]);

        drag(&mut surface, &mut store, &mut history, (60.0, 40.0), (90.0, 70.0));
        assert_eq!(
            store.get(doc(), id).unwrap().points.as_slice(),
            &[Point::new(10.0, 10.0), Point::new(90.0, 70.0)]
        );
        assert_eq!(history.undo(&mut store), Some("resize".into()));
    }

    #[test]
    fn selected_circle_body_drag_recenters_it() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Circle);
        drag(&mut surface, &mut store, &mut history, (50.0, 50.0), (80.0, 50.0));
        let id = store.annotations(doc())[0].id;
        store.set_tool(doc(), Tool::Select);
        surface.tool_changed();
        store.select_annotations(doc(), vec![id]);

        // Grab the interior, away from the 30-radius perimeter.
        drag(&mut surface, &mut store, &mut history, (55.0, 50.0), (65.0, 60.0));
        let circle = store.get(doc(), id).unwrap();
        let (center, radius) = circle.circle_geometry().unwrap();
        assert_eq!(center, Point::new(60.0, 60.0));
        assert_eq!(radius, 30.0);
    }

    #[test]
    fn delete_key_removes_the_selection_as_one_command() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (40.0, 40.0));
        drag(&mut surface, &mut store, &mut history, (100.0, 10.0), (140.0, 40.0));
        let ids: Vec<_> = store.annotations(doc()).iter().map(|a| a.id).collect();
        store.select_annotations(doc(), ids.clone());

        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::key("Delete", Modifiers::NONE, 9),
        );
        assert!(store.annotations(doc()).is_empty());
        assert!(store.selected_ids(doc()).is_empty());

        history.undo(&mut store);
        let restored: Vec<_> = store.annotations(doc()).iter().map(|a| a.id).collect();
        assert_eq!(restored, ids);
    }

    #[test]
    fn text_click_opens_an_auto_sized_session() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Text);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(40.0, 50.0, Modifiers::NONE, 0),
        );
        let update = feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_up(42.0, 51.0, Modifiers::NONE, 1),
        );
        assert_eq!(update.editor, Some(EditorSignal::Opened));
        let session = surface.session().unwrap();
        assert_eq!(session.anchor, Point::new(40.0, 50.0));
        assert_eq!(session.dims, None);
        assert!(!session.sticky);
    }

    #[test]
    fn text_drag_opens_a_sized_session_at_the_top_left() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Text);
        // Drag up-left so normalization matters.
        drag(&mut surface, &mut store, &mut history, (90.0, 80.0), (40.0, 50.0));
        let session = surface.session().unwrap();
        assert_eq!(session.anchor, Point::new(40.0, 50.0));
        assert_eq!(session.dims, Some((50.0, 30.0)));
    }

    #[test]
    fn committing_text_creates_the_note_and_reverts_to_select() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Text);
        drag(&mut surface, &mut store, &mut history, (40.0, 50.0), (40.0, 50.0));
        surface.session_mut().unwrap().set_text("hello there");

        let update = feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::key("Enter", Modifiers::NONE, 5),
        );
        assert_eq!(update.editor, Some(EditorSignal::Closed));
        let note = &store.annotations(doc())[0];
        assert_eq!(note.kind, AnnotationKind::Text);
        assert_eq!(note.text.as_deref(), Some("hello there"));
        assert!(note.style.text_options.is_some());
        assert_eq!(store.tool(), Tool::Select);
    }

    #[test]
    fn shift_enter_inserts_a_newline_instead_of_committing() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Text);
        drag(&mut surface, &mut store, &mut history, (40.0, 50.0), (40.0, 50.0));
        surface.session_mut().unwrap().set_text("line one");
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::key("Enter", Modifiers::shift(), 5),
        );
        assert_eq!(surface.session().unwrap().buffer, "line one\n");
        assert!(store.annotations(doc()).is_empty());
    }

    #[test]
    fn blank_commit_and_escape_both_leave_no_annotation() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Text);
        drag(&mut surface, &mut store, &mut history, (40.0, 50.0), (40.0, 50.0));
        surface.session_mut().unwrap().set_text("   ");
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::key("Enter", Modifiers::NONE, 5),
        );
        assert!(store.annotations(doc()).is_empty());
        assert!(!history.can_undo());

        drag(&mut surface, &mut store, &mut history, (40.0, 50.0), (40.0, 50.0));
        surface.session_mut().unwrap().set_text("discarded");
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::key("Escape", Modifiers::NONE, 6),
        );
        assert!(store.annotations(doc()).is_empty());
    }

    #[test]
    fn sticky_commit_ignores_the_active_style() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::StickyNote);
        drag(&mut surface, &mut store, &mut history, (40.0, 50.0), (40.0, 50.0));
        surface.session_mut().unwrap().set_text("todo");
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::key("Enter", Modifiers::NONE, 5),
        );
        let sticky = &store.annotations(doc())[0];
        assert_eq!(sticky.kind, AnnotationKind::StickyNote);
        assert_eq!(sticky.style.color.to_hex(), "#FFD700");
    }

    #[test]
    fn double_click_reopens_a_note_prefilled() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Text);
        drag(&mut surface, &mut store, &mut history, (40.0, 50.0), (40.0, 50.0));
        surface.session_mut().unwrap().set_text("first draft");
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::key("Enter", Modifiers::NONE, 5),
        );
        let id = store.annotations(doc())[0].id;

        let update = feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::double_click(50.0, 60.0, 6),
        );
        assert_eq!(update.editor, Some(EditorSignal::Opened));
        assert_eq!(surface.editing(), Some(id));
        assert_eq!(surface.session().unwrap().buffer, "first draft");

        surface.session_mut().unwrap().set_text("second draft");
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::key("Enter", Modifiers::NONE, 7),
        );
        assert_eq!(store.annotations(doc()).len(), 1);
        assert_eq!(
            store.get(doc(), id).unwrap().text.as_deref(),
            Some("second draft")
        );
        assert_eq!(history.undo(&mut store), Some("edit text".into()));
        assert_eq!(
            store.get(doc(), id).unwrap().text.as_deref(),
            Some("first draft")
        );
    }

    #[test]
    fn clicking_away_blurs_and_commits_the_editor() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Text);
        drag(&mut surface, &mut store, &mut history, (40.0, 50.0), (40.0, 50.0));
        surface.session_mut().unwrap().set_text("kept on blur");

        let update = feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(300.0, 300.0, Modifiers::NONE, 9),
        );
        assert_eq!(update.editor, Some(EditorSignal::Closed));
        assert_eq!(store.annotations(doc()).len(), 1);
        assert!(surface.gesture.is_idle());
    }

    #[test]
    fn page_change_clears_gesture_and_selection() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (60.0, 40.0));
        let id = store.annotations(doc())[0].id;
        store.select_annotations(doc(), vec![id]);

        surface.set_page(2, &mut store);
        assert!(store.selected_ids(doc()).is_empty());
        assert!(surface.gesture.is_idle());
        // The annotation itself stays on page 1.
        assert_eq!(store.get(doc(), id).unwrap().page_number, 1);
    }

    #[test]
    fn events_thread_their_timestamp_into_the_store() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(0.0, 0.0, Modifiers::NONE, 1_111),
        );
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(50.0, 50.0, Modifiers::NONE, 1_500),
        );
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_up(50.0, 50.0, Modifiers::NONE, 2_222),
        );
        assert_eq!(store.annotations(doc())[0].created_at_ms, 2_222);
    }

    #[test]
    fn transient_exposes_the_draft_and_marquee() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Rectangle);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_down(0.0, 0.0, Modifiers::NONE, 0),
        );
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(30.0, 30.0, Modifiers::NONE, 1),
        );
        let transient = surface.transient(&store);
        let draft = transient.draft.unwrap();
        assert_eq!(draft.kind, AnnotationKind::Rectangle);
        assert_eq!(draft.points, vec![Point::new(0.0, 0.0), Point::new(30.0, 30.0)]);

        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_up(30.0, 30.0, Modifiers::NONE, 2),
        );
        assert!(surface.transient(&store).draft.is_none());
    }

    #[test]
    fn armed_text_tool_ghost_follows_the_hover_point() {
        let (mut surface, mut store, mut history) = fixture();
        store.set_tool(doc(), Tool::Text);
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(70.0, 80.0, Modifiers::NONE, 0),
        );
        let ghost = surface.transient(&store).ghost.unwrap();
        assert_eq!(ghost.at, Point::new(70.0, 80.0));
        assert!(!ghost.sticky);

        feed(&mut surface, &mut store, &mut history, InputEvent::PointerLeave);
        assert!(surface.transient(&store).ghost.is_none());
    }

    #[test]
    fn cursor_tracks_gesture_and_tool() {
        let (mut surface, mut store, mut history) = fixture();
        assert_eq!(surface.cursor(&store, &HeuristicMetrics), "default");
        store.set_tool(doc(), Tool::Freehand);
        assert_eq!(surface.cursor(&store, &HeuristicMetrics), "crosshair");
        store.set_tool(doc(), Tool::Text);
        assert_eq!(surface.cursor(&store, &HeuristicMetrics), "text");

        store.set_tool(doc(), Tool::Rectangle);
        drag(&mut surface, &mut store, &mut history, (10.0, 10.0), (60.0, 40.0));
        let id = store.annotations(doc())[0].id;
        store.set_tool(doc(), Tool::Select);
        surface.tool_changed();
        store.select_annotations(doc(), vec![id]);

        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(60.0, 40.0, Modifiers::NONE, 0),
        );
        assert_eq!(surface.cursor(&store, &HeuristicMetrics), "nwse-resize");
        feed(
            &mut surface,
            &mut store,
            &mut history,
            InputEvent::pointer_move(30.0, 20.0, Modifiers::NONE, 1),
        );
        assert_eq!(surface.cursor(&store, &HeuristicMetrics), "move");
    }
}
