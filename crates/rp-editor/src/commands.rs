//! Undo/redo.
//!
//! Gestures mutate the store directly while they run; when one finishes it
//! records a [`Command`] describing the net effect. Pushing never re-applies
//! the ops — the store already holds the result. Undo applies each op's
//! inverse in reverse order, redo replays them forward, both through the
//! store with [`ChangeSource::History`] so subscribers see the replay.

use rp_core::id::DocumentId;
use rp_core::model::Annotation;
use rp_core::store::{AnnotationStore, ChangeSource};

/// Default history depth.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// One reversible store edit. `Insert` and `Delete` carry the paint-order
/// index so undoing a delete restores stacking, not just existence.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    Insert {
        doc: DocumentId,
        annotation: Annotation,
        index: usize,
    },
    Delete {
        doc: DocumentId,
        annotation: Annotation,
        index: usize,
    },
    Replace {
        doc: DocumentId,
        before: Annotation,
        after: Annotation,
    },
}

impl EditOp {
    pub fn inverse(&self) -> EditOp {
        match self {
            EditOp::Insert {
                doc,
                annotation,
                index,
            } => EditOp::Delete {
                doc: *doc,
                annotation: annotation.clone(),
                index: *index,
            },
            EditOp::Delete {
                doc,
                annotation,
                index,
            } => EditOp::Insert {
                doc: *doc,
                annotation: annotation.clone(),
                index: *index,
            },
            EditOp::Replace { doc, before, after } => EditOp::Replace {
                doc: *doc,
                before: after.clone(),
                after: before.clone(),
            },
        }
    }

    pub fn apply(&self, store: &mut AnnotationStore) {
        match self {
            EditOp::Insert {
                doc,
                annotation,
                index,
            } => store.insert_annotation(*doc, annotation.clone(), *index, ChangeSource::History),
            EditOp::Delete { doc, annotation, .. } => {
                store.delete_annotation(*doc, annotation.id, ChangeSource::History)
            }
            EditOp::Replace { doc, after, .. } => {
                store.update_annotation(*doc, after.clone(), ChangeSource::History)
            }
        }
    }
}

/// A finished gesture's net effect, as one undoable unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub label: String,
    pub ops: Vec<EditOp>,
}

impl Command {
    pub fn new(label: impl Into<String>, ops: Vec<EditOp>) -> Self {
        Self {
            label: label.into(),
            ops,
        }
    }
}

/// Bounded undo/redo stacks.
#[derive(Debug, Default)]
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Record a finished gesture. Any redo branch is abandoned; the oldest
    /// command falls off when the stack is full.
    pub fn push(&mut self, command: Command) {
        if command.ops.is_empty() {
            return;
        }
        log::trace!("command: {} ({} ops)", command.label, command.ops.len());
        self.redo_stack.clear();
        self.undo_stack.push(command);
        if self.max_depth > 0 && self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent command; returns its label when one existed.
    pub fn undo(&mut self, store: &mut AnnotationStore) -> Option<String> {
        let command = self.undo_stack.pop()?;
        for op in command.ops.iter().rev() {
            op.inverse().apply(store);
        }
        let label = command.label.clone();
        self.redo_stack.push(command);
        Some(label)
    }

    /// Replay the most recently undone command.
    pub fn redo(&mut self, store: &mut AnnotationStore) -> Option<String> {
        let command = self.redo_stack.pop()?;
        for op in &command.ops {
            op.apply(store);
        }
        let label = command.label.clone();
        self.undo_stack.push(command);
        Some(label)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rp_core::geom::Point;
    use rp_core::model::{AnnotationKind, AnnotationStyle, Provenance};

    fn doc() -> DocumentId {
        DocumentId::intern("doc-1")
    }

    fn who() -> Provenance {
        Provenance {
            page_number: 1,
            author: "tester".into(),
            at_ms: 0,
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

    fn add(store: &mut AnnotationStore, stack: &mut CommandStack, a: Annotation) {
        store.add_annotation(doc(), a.clone(), ChangeSource::Drawing);
        let index = store.annotations(doc()).len() - 1;
        stack.push(Command::new(
            "draw",
            vec![EditOp::Insert {
                doc: doc(),
                annotation: a,
                index,
            }],
        ));
    }

    #[test]
    fn draw_undo_redo_roundtrip() {
        let mut store = AnnotationStore::new();
        let mut stack = CommandStack::new(10);
        add(&mut store, &mut stack, rect(0.0));

        assert_eq!(stack.undo(&mut store), Some("draw".into()));
        assert!(store.annotations(doc()).is_empty());
        assert!(stack.can_redo());

        assert_eq!(stack.redo(&mut store), Some("draw".into()));
        assert_eq!(store.annotations(doc()).len(), 1);
    }

    #[test]
    fn undo_of_a_delete_restores_paint_order() {
        let mut store = AnnotationStore::new();
        let mut stack = CommandStack::new(10);
        let (a, b, c) = (rect(0.0), rect(20.0), rect(40.0));
        let b_id = b.id;
        for x in [a, b, c] {
            store.add_annotation(doc(), x, ChangeSource::Drawing);
        }

        // Delete the middle entry through a command.
        let deleted = store.get(doc(), b_id).cloned().unwrap();
        store.delete_annotation(doc(), b_id, ChangeSource::Editing);
        stack.push(Command::new(
            "delete",
            vec![EditOp::Delete {
                doc: doc(),
                annotation: deleted,
                index: 1,
            }],
        ));

        stack.undo(&mut store);
        assert_eq!(store.annotations(doc())[1].id, b_id);
    }

    #[test]
    fn multi_delete_undoes_in_reverse_index_order() {
        let mut store = AnnotationStore::new();
        let mut stack = CommandStack::new(10);
        let (a, b, c) = (rect(0.0), rect(20.0), rect(40.0));
        let ids = [a.id, b.id, c.id];
        let (a2, c2) = (a.clone(), c.clone());
        for x in [a, b, c] {
            store.add_annotation(doc(), x, ChangeSource::Drawing);
        }

        // Ops captured against the pre-delete list, ascending by index.
        let ops = vec![
            EditOp::Delete {
                doc: doc(),
                annotation: a2,
                index: 0,
            },
            EditOp::Delete {
                doc: doc(),
                annotation: c2,
                index: 2,
            },
        ];
        store.delete_annotation(doc(), ids[0], ChangeSource::Editing);
        store.delete_annotation(doc(), ids[2], ChangeSource::Editing);
        stack.push(Command::new("delete", ops));

        stack.undo(&mut store);
        let order: Vec<_> = store.annotations(doc()).iter().map(|x| x.id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn move_replace_roundtrip() {
        let mut store = AnnotationStore::new();
        let mut stack = CommandStack::new(10);
        let a = rect(0.0);
        let id = a.id;
        store.add_annotation(doc(), a.clone(), ChangeSource::Drawing);

        let mut moved = a.clone();
        moved.translate(7.0, -3.0);
        store.update_annotation(doc(), moved.clone(), ChangeSource::Editing);
        stack.push(Command::new(
            "move",
            vec![EditOp::Replace {
                doc: doc(),
                before: a,
                after: moved,
            }],
        ));

        stack.undo(&mut store);
        assert_eq!(store.get(doc(), id).unwrap().points[0], Point::new(0.0, 0.0));
        stack.redo(&mut store);
        assert_eq!(store.get(doc(), id).unwrap().points[0], Point::new(7.0, -3.0));
    }

    #[test]
    fn new_command_clears_the_redo_branch() {
        let mut store = AnnotationStore::new();
        let mut stack = CommandStack::new(10);
        add(&mut store, &mut stack, rect(0.0));
        stack.undo(&mut store);
        assert!(stack.can_redo());

        add(&mut store, &mut stack, rect(20.0));
        assert!(!stack.can_redo());
        assert_eq!(stack.redo(&mut store), None);
    }

    #[test]
    fn depth_limit_drops_the_oldest_command() {
        let mut store = AnnotationStore::new();
        let mut stack = CommandStack::new(2);
        add(&mut store, &mut stack, rect(0.0));
        add(&mut store, &mut stack, rect(20.0));
        add(&mut store, &mut stack, rect(40.0));

        assert!(stack.undo(&mut store).is_some());
        assert!(stack.undo(&mut store).is_some());
        // The first draw fell off the stack.
        assert_eq!(stack.undo(&mut store), None);
        assert_eq!(store.annotations(doc()).len(), 1);
    }

    #[test]
    fn empty_commands_are_not_recorded() {
        let mut stack = CommandStack::new(10);
        stack.push(Command::new("noop", vec![]));
        assert!(!stack.can_undo());
    }

    #[test]
    fn undo_on_empty_stack_is_a_noop() {
        let mut store = AnnotationStore::new();
        let mut stack = CommandStack::new(10);
        assert_eq!(stack.undo(&mut store), None);
        assert_eq!(stack.redo(&mut store), None);
    }
}
