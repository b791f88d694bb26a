//! The shared annotation store.
//!
//! One store per application, shared by every visible page surface of a
//! document. It owns, per document, the ordered annotation list (the paint
//! order) and the selection set, plus the cross-cutting UI state: active
//! tool, active style, author. All mutations are synchronous and total —
//! there is exactly one user-driven gesture at a time, so no partial state
//! is ever observable.
//!
//! Every mutation emits one [`ChangeEvent`] to subscribers, fire-and-forget.
//! Surfaces re-derive their page's annotation list from the store on every
//! paint rather than caching it, which is what makes the "a render after a
//! change sees that change" ordering guarantee hold trivially.

use crate::id::{AnnotationId, DocumentId};
use crate::model::{Annotation, AnnotationKind, AnnotationStyle, StylePatch};
use std::collections::HashMap;
use std::fmt;

// ─── Tools ───────────────────────────────────────────────────────────────

/// The active tool. `Select` is a pure mode — every other variant maps to
/// the annotation kind it draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Freehand,
    Line,
    Rectangle,
    Circle,
    Triangle,
    Star,
    Arrow,
    DoubleArrow,
    Highlight,
    Text,
    StickyNote,
    Stamp,
    StampApproved,
    StampRejected,
    StampRevision,
}

impl Tool {
    /// The annotation kind this tool produces; `None` for the select tool.
    pub fn kind(&self) -> Option<AnnotationKind> {
        match self {
            Tool::Select => None,
            Tool::Freehand => Some(AnnotationKind::Freehand),
            Tool::Line => Some(AnnotationKind::Line),
            Tool::Rectangle => Some(AnnotationKind::Rectangle),
            Tool::Circle => Some(AnnotationKind::Circle),
            Tool::Triangle => Some(AnnotationKind::Triangle),
            Tool::Star => Some(AnnotationKind::Star),
            Tool::Arrow => Some(AnnotationKind::Arrow),
            Tool::DoubleArrow => Some(AnnotationKind::DoubleArrow),
            Tool::Highlight => Some(AnnotationKind::Highlight),
            Tool::Text => Some(AnnotationKind::Text),
            Tool::StickyNote => Some(AnnotationKind::StickyNote),
            Tool::Stamp => Some(AnnotationKind::Stamp),
            Tool::StampApproved => Some(AnnotationKind::StampApproved),
            Tool::StampRejected => Some(AnnotationKind::StampRejected),
            Tool::StampRevision => Some(AnnotationKind::StampRevision),
        }
    }

    pub fn is_text_like(&self) -> bool {
        matches!(self, Tool::Text | Tool::StickyNote)
    }

    pub fn is_stamp(&self) -> bool {
        self.kind().is_some_and(|k| k.is_stamp())
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        let tool = match name {
            "select" => Tool::Select,
            "freehand" => Tool::Freehand,
            "line" => Tool::Line,
            "rectangle" => Tool::Rectangle,
            "circle" => Tool::Circle,
            "triangle" => Tool::Triangle,
            "star" => Tool::Star,
            "arrow" => Tool::Arrow,
            "doubleArrow" => Tool::DoubleArrow,
            "highlight" => Tool::Highlight,
            "text" => Tool::Text,
            "stickyNote" => Tool::StickyNote,
            "stamp" => Tool::Stamp,
            "stampApproved" => Tool::StampApproved,
            "stampRejected" => Tool::StampRejected,
            "stampRevision" => Tool::StampRevision,
            _ => return None,
        };
        Some(tool)
    }

    pub fn name(&self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.as_str(),
            None => "select",
        }
    }
}

// ─── Change notifications ────────────────────────────────────────────────

/// Where a mutation originated. Subscribers use this to avoid feedback
/// loops (a surface ignores the echo of its own edit) and for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// A drawing gesture committed.
    Drawing,
    /// Move/resize/delete/select activity.
    Editing,
    /// Tool or style switched.
    Toolbar,
    /// A payload was imported or a snapshot loaded.
    Import,
    /// Undo/redo replay.
    History,
}

/// Fire-and-forget notification emitted after every store mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeEvent {
    pub document: DocumentId,
    /// The affected page, or `None` when the whole document changed
    /// (imports, highlight sweeps, selection resets).
    pub page: Option<u32>,
    pub source: ChangeSource,
    /// Repaint even if the surface believes nothing visible changed.
    pub force: bool,
    /// Milliseconds timestamp of the input event that caused the change.
    pub at_ms: u64,
}

/// Handle returned by [`AnnotationStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

type Listener = Box<dyn FnMut(&ChangeEvent)>;

// ─── Store ───────────────────────────────────────────────────────────────

/// Per-document annotation state, created lazily on first touch and kept
/// for the life of the session.
#[derive(Default)]
pub struct DocumentState {
    /// Committed annotations in paint order (oldest first).
    pub annotations: Vec<Annotation>,
    /// Ids of currently selected annotations, in selection order.
    pub selected: Vec<AnnotationId>,
}

/// The single authoritative annotation state shared by all page surfaces.
pub struct AnnotationStore {
    documents: HashMap<DocumentId, DocumentState>,
    tool: Tool,
    style: AnnotationStyle,
    author: String,
    listeners: Vec<(SubscriberId, Listener)>,
    next_subscriber: u64,
    /// Timestamp of the input event currently being processed; stamps
    /// outgoing change events. The store never reads a clock itself.
    now_ms: u64,
}

impl fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("documents", &self.documents.len())
            .field("tool", &self.tool)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            tool: Tool::Select,
            style: AnnotationStyle::default(),
            author: "current-user".into(),
            listeners: Vec::new(),
            next_subscriber: 0,
            now_ms: 0,
        }
    }

    /// Record the timestamp of the input event being processed. Called once
    /// per host event before any mutation it triggers.
    pub fn touch(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    // ─── Annotation mutations ────────────────────────────────────────────

    /// Append an annotation. The document state is lazily created. There is
    /// deliberately no duplicate-id check — callers own id freshness.
    pub fn add_annotation(&mut self, doc: DocumentId, annotation: Annotation, source: ChangeSource) {
        log::trace!("add {:?} on page {}", annotation.id, annotation.page_number);
        let page = annotation.page_number;
        self.state_mut(doc).annotations.push(annotation);
        self.emit(doc, Some(page), source, false);
    }

    /// Re-insert an annotation at a specific paint-order index (undo of a
    /// delete). Indices past the end append.
    pub fn insert_annotation(
        &mut self,
        doc: DocumentId,
        annotation: Annotation,
        index: usize,
        source: ChangeSource,
    ) {
        let page = annotation.page_number;
        let annotations = &mut self.state_mut(doc).annotations;
        let index = index.min(annotations.len());
        annotations.insert(index, annotation);
        self.emit(doc, Some(page), source, false);
    }

    /// Replace the annotation with the same id. Silent no-op when the id is
    /// unknown — this must never insert.
    pub fn update_annotation(&mut self, doc: DocumentId, annotation: Annotation, source: ChangeSource) {
        let state = self.state_mut(doc);
        let Some(slot) = state.annotations.iter_mut().find(|a| a.id == annotation.id) else {
            log::trace!("update for unknown {:?} ignored", annotation.id);
            return;
        };
        let page = annotation.page_number;
        *slot = annotation;
        self.emit(doc, Some(page), source, false);
    }

    /// Remove by id; no-op when absent. Also drops the id from the
    /// selection so no stale reference keeps rendering or hit-testing.
    pub fn delete_annotation(&mut self, doc: DocumentId, id: AnnotationId, source: ChangeSource) {
        let state = self.state_mut(doc);
        let Some(index) = state.annotations.iter().position(|a| a.id == id) else {
            return;
        };
        let removed = state.annotations.remove(index);
        state.selected.retain(|s| *s != id);
        log::trace!("delete {:?} from page {}", id, removed.page_number);
        self.emit(doc, Some(removed.page_number), source, false);
    }

    /// Delete every highlight in the document and clear the selection.
    /// Returns how many were removed. Bound to Escape by hosts.
    pub fn clear_highlights(&mut self, doc: DocumentId) -> usize {
        let state = self.state_mut(doc);
        let before = state.annotations.len();
        state
            .annotations
            .retain(|a| a.kind != AnnotationKind::Highlight);
        let removed = before - state.annotations.len();
        if removed > 0 {
            state.selected.clear();
            log::trace!("cleared {removed} highlights");
            self.emit(doc, None, ChangeSource::Editing, true);
        }
        removed
    }

    /// Replace the whole annotation list (snapshot load / JSON import).
    pub fn replace_annotations(&mut self, doc: DocumentId, annotations: Vec<Annotation>) {
        let state = self.state_mut(doc);
        state.annotations = annotations;
        state.selected.clear();
        self.emit(doc, None, ChangeSource::Import, true);
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Replace the selection outright (marquee result, exclusive click).
    pub fn select_annotations(&mut self, doc: DocumentId, ids: Vec<AnnotationId>) {
        let state = self.state_mut(doc);
        if state.selected == ids {
            return;
        }
        state.selected = ids;
        self.emit(doc, None, ChangeSource::Editing, false);
    }

    /// Shift-click semantics: toggle membership instead of replacing.
    pub fn toggle_selection(&mut self, doc: DocumentId, id: AnnotationId) {
        let state = self.state_mut(doc);
        if let Some(pos) = state.selected.iter().position(|s| *s == id) {
            state.selected.remove(pos);
        } else {
            state.selected.push(id);
        }
        self.emit(doc, None, ChangeSource::Editing, false);
    }

    pub fn clear_selection(&mut self, doc: DocumentId) {
        let state = self.state_mut(doc);
        if state.selected.is_empty() {
            return;
        }
        state.selected.clear();
        self.emit(doc, None, ChangeSource::Editing, false);
    }

    // ─── Tool & style ────────────────────────────────────────────────────

    pub fn set_tool(&mut self, doc: DocumentId, tool: Tool) {
        if self.tool == tool {
            return;
        }
        log::trace!("tool -> {}", tool.name());
        self.tool = tool;
        self.emit(doc, None, ChangeSource::Toolbar, true);
    }

    /// Merge a partial style update into the active style.
    pub fn set_style(&mut self, doc: DocumentId, patch: &StylePatch) {
        self.style.apply(patch);
        self.emit(doc, None, ChangeSource::Toolbar, true);
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// All annotations of a document in paint order (empty for untouched
    /// documents — lazily created state is indistinguishable from empty).
    pub fn annotations(&self, doc: DocumentId) -> &[Annotation] {
        self.documents
            .get(&doc)
            .map(|s| s.annotations.as_slice())
            .unwrap_or(&[])
    }

    /// The paint-order index of an annotation, for undo bookkeeping.
    pub fn index_of(&self, doc: DocumentId, id: AnnotationId) -> Option<usize> {
        self.annotations(doc).iter().position(|a| a.id == id)
    }

    pub fn get(&self, doc: DocumentId, id: AnnotationId) -> Option<&Annotation> {
        self.annotations(doc).iter().find(|a| a.id == id)
    }

    pub fn annotations_for_page(
        &self,
        doc: DocumentId,
        page: u32,
    ) -> impl Iterator<Item = &Annotation> {
        self.annotations(doc)
            .iter()
            .filter(move |a| a.page_number == page)
    }

    pub fn selected_ids(&self, doc: DocumentId) -> &[AnnotationId] {
        self.documents
            .get(&doc)
            .map(|s| s.selected.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_annotations(&self, doc: DocumentId) -> Vec<&Annotation> {
        let ids = self.selected_ids(doc);
        ids.iter().filter_map(|id| self.get(doc, *id)).collect()
    }

    pub fn is_selected(&self, doc: DocumentId, id: AnnotationId) -> bool {
        self.selected_ids(doc).contains(&id)
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    /// Register a change listener. Listeners run synchronously, in
    /// subscription order, after every mutation.
    pub fn subscribe(&mut self, listener: Listener) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.listeners.retain(|(sid, _)| *sid != id);
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn state_mut(&mut self, doc: DocumentId) -> &mut DocumentState {
        self.documents.entry(doc).or_default()
    }

    fn emit(&mut self, document: DocumentId, page: Option<u32>, source: ChangeSource, force: bool) {
        let event = ChangeEvent {
            document,
            page,
            source,
            force,
            at_ms: self.now_ms,
        };
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;
    use crate::model::Provenance;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc() -> DocumentId {
        DocumentId::intern("doc-1")
    }

    fn who() -> Provenance {
        Provenance {
            page_number: 1,
            author: "current-user".into(),
            at_ms: 42,
        }
    }

    fn rect(x: f64) -> Annotation {
        Annotation::shape(
            AnnotationKind::Rectangle,
            Point::new(x, 0.0),
            Point::new(x + 10.0, 10.0),
            AnnotationStyle::default(),
            &who(),
        )
    }

    #[test]
    fn documents_are_created_lazily() {
        let mut store = AnnotationStore::new();
        assert!(store.annotations(doc()).is_empty());
        store.add_annotation(doc(), rect(0.0), ChangeSource::Drawing);
        assert_eq!(store.annotations(doc()).len(), 1);
    }

    #[test]
    fn page_filter_yields_ids_in_store_order() {
        let mut store = AnnotationStore::new();
        let mut elsewhere = rect(50.0);
        elsewhere.page_number = 2;
        store.add_annotation(doc(), rect(0.0), ChangeSource::Drawing);
        store.add_annotation(doc(), elsewhere, ChangeSource::Drawing);
        store.add_annotation(doc(), rect(20.0), ChangeSource::Drawing);

        // Consumed straight off the iterator, the way select-all does.
        let ids: Vec<AnnotationId> = store.annotations_for_page(doc(), 1).map(|a| a.id).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], store.annotations(doc())[0].id);
        assert_eq!(ids[1], store.annotations(doc())[2].id);
    }

    #[test]
    fn duplicate_ids_append_silently() {
        let mut store = AnnotationStore::new();
        let a = rect(0.0);
        store.add_annotation(doc(), a.clone(), ChangeSource::Drawing);
        store.add_annotation(doc(), a, ChangeSource::Drawing);
        assert_eq!(store.annotations(doc()).len(), 2);
    }

    #[test]
    fn update_of_unknown_id_is_a_noop() {
        let mut store = AnnotationStore::new();
        store.add_annotation(doc(), rect(0.0), ChangeSource::Drawing);
        let stray = rect(50.0);
        store.update_annotation(doc(), stray, ChangeSource::Editing);
        // Must not insert, must not replace.
        assert_eq!(store.annotations(doc()).len(), 1);
        assert_eq!(store.annotations(doc())[0].points[0].x, 0.0);
    }

    #[test]
    fn update_replaces_by_id_preserving_order() {
        let mut store = AnnotationStore::new();
        let first = rect(0.0);
        let id = first.id;
        store.add_annotation(doc(), first.clone(), ChangeSource::Drawing);
        store.add_annotation(doc(), rect(30.0), ChangeSource::Drawing);

        let mut moved = first;
        moved.translate(5.0, 5.0);
        store.update_annotation(doc(), moved, ChangeSource::Editing);

        assert_eq!(store.annotations(doc())[0].id, id);
        assert_eq!(store.annotations(doc())[0].points[0], Point::new(5.0, 5.0));
    }

    #[test]
    fn delete_is_noop_when_absent_and_clears_selection_when_present() {
        let mut store = AnnotationStore::new();
        let a = rect(0.0);
        let id = a.id;
        store.add_annotation(doc(), a, ChangeSource::Drawing);
        store.delete_annotation(doc(), AnnotationId::intern("missing"), ChangeSource::Editing);
        assert_eq!(store.annotations(doc()).len(), 1);

        store.select_annotations(doc(), vec![id]);
        store.delete_annotation(doc(), id, ChangeSource::Editing);
        assert!(store.annotations(doc()).is_empty());
        assert!(store.selected_ids(doc()).is_empty());
    }

    #[test]
    fn toggle_selection_is_additive() {
        let mut store = AnnotationStore::new();
        let a = rect(0.0);
        let b = rect(30.0);
        let (ia, ib) = (a.id, b.id);
        store.add_annotation(doc(), a, ChangeSource::Drawing);
        store.add_annotation(doc(), b, ChangeSource::Drawing);

        store.select_annotations(doc(), vec![ia]);
        store.toggle_selection(doc(), ib);
        assert_eq!(store.selected_ids(doc()), &[ia, ib]);
        store.toggle_selection(doc(), ia);
        assert_eq!(store.selected_ids(doc()), &[ib]);
    }

    #[test]
    fn set_style_merges() {
        let mut store = AnnotationStore::new();
        let original_color = store.style().color;
        store.set_style(
            doc(),
            &StylePatch {
                line_width: Some(6.0),
                ..StylePatch::default()
            },
        );
        assert_eq!(store.style().line_width, 6.0);
        assert_eq!(store.style().color, original_color);
    }

    #[test]
    fn clear_highlights_removes_only_highlights() {
        let mut store = AnnotationStore::new();
        let who = who();
        store.add_annotation(doc(), rect(0.0), ChangeSource::Drawing);
        store.add_annotation(
            doc(),
            Annotation::highlight(
                Point::new(0.0, 0.0),
                Point::new(20.0, 10.0),
                AnnotationStyle::default(),
                &who,
            ),
            ChangeSource::Drawing,
        );
        assert_eq!(store.clear_highlights(doc()), 1);
        assert_eq!(store.annotations(doc()).len(), 1);
        assert_eq!(store.clear_highlights(doc()), 0);
    }

    #[test]
    fn every_mutation_emits_exactly_one_event() {
        let mut store = AnnotationStore::new();
        let seen: Rc<RefCell<Vec<ChangeEvent>>> = Rc::default();
        let sink = seen.clone();
        store.subscribe(Box::new(move |e| sink.borrow_mut().push(*e)));

        store.touch(99);
        let a = rect(0.0);
        let id = a.id;
        store.add_annotation(doc(), a, ChangeSource::Drawing);
        store.select_annotations(doc(), vec![id]);
        store.delete_annotation(doc(), id, ChangeSource::Editing);

        let events = seen.borrow();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].source, ChangeSource::Drawing);
        assert_eq!(events[0].page, Some(1));
        assert_eq!(events[0].at_ms, 99);
        assert!(events.iter().all(|e| e.document == doc()));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut store = AnnotationStore::new();
        let count = Rc::new(RefCell::new(0usize));
        let sink = count.clone();
        let sub = store.subscribe(Box::new(move |_| *sink.borrow_mut() += 1));
        store.add_annotation(doc(), rect(0.0), ChangeSource::Drawing);
        store.unsubscribe(sub);
        store.add_annotation(doc(), rect(30.0), ChangeSource::Drawing);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn insert_restores_paint_order() {
        let mut store = AnnotationStore::new();
        let a = rect(0.0);
        let b = rect(30.0);
        let a_id = a.id;
        store.add_annotation(doc(), a.clone(), ChangeSource::Drawing);
        store.add_annotation(doc(), b, ChangeSource::Drawing);
        store.delete_annotation(doc(), a_id, ChangeSource::Editing);
        store.insert_annotation(doc(), a, 0, ChangeSource::History);
        assert_eq!(store.annotations(doc())[0].id, a_id);
    }

    #[test]
    fn tool_names_roundtrip() {
        for tool in [
            Tool::Select,
            Tool::Freehand,
            Tool::DoubleArrow,
            Tool::StickyNote,
            Tool::StampApproved,
        ] {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("lasso"), None);
    }
}
