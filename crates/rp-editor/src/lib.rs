//! Interaction engine: gestures, text sessions, shortcuts, and undo/redo.
//!
//! The store (`rp-core`) holds what exists; the render crate knows where
//! things are; this crate decides what pointer and key events mean. One
//! [`PageSurface`] per visible page feeds on normalized [`InputEvent`]s and
//! drives the shared [`AnnotationStore`](rp_core::store::AnnotationStore),
//! recording a [`Command`] per finished gesture.

pub mod commands;
pub mod input;
pub mod shortcuts;
pub mod state;
pub mod surface;
pub mod text_session;
pub mod ticker;

pub use commands::{Command, CommandStack, DEFAULT_HISTORY_DEPTH, EditOp};
pub use input::{InputEvent, Modifiers};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use state::Gesture;
pub use surface::{COMMIT_MIN_SPAN, EditorSignal, PageSurface, SurfaceUpdate, TEXT_DRAG_THRESHOLD};
pub use text_session::TextSession;
pub use ticker::{GhostTicker, TickerCommand};
