//! Keyboard shortcut resolution.
//!
//! Pure key → action mapping; dispatch lives in the host bridge. Modifier
//! chords resolve before bare letters so Ctrl+A never switches to the arrow
//! tool. "Command" means Ctrl or ⌘, whichever the platform sends.

use rp_core::store::Tool;

/// What a recognized shortcut asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ─── Tool switching ──────────────────────────────────────────────────
    SwitchTool(Tool),

    // ─── Editing ─────────────────────────────────────────────────────────
    Undo,
    Redo,
    DeleteSelection,
    SelectAll,
    /// Cancel an open text session, else clear every highlight.
    Escape,
}

/// Resolves host key events to actions. Stateless; one map per app.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortcutMap;

impl ShortcutMap {
    pub fn resolve(
        &self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let command = ctrl || meta;
        if alt {
            return None;
        }

        // Modifier combos first.
        if command && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }
        if command {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                _ => None,
            };
        }

        // Bare keys.
        let action = match key {
            "v" | "V" => ShortcutAction::SwitchTool(Tool::Select),
            "p" | "P" => ShortcutAction::SwitchTool(Tool::Freehand),
            "l" | "L" => ShortcutAction::SwitchTool(Tool::Line),
            "r" | "R" => ShortcutAction::SwitchTool(Tool::Rectangle),
            "c" | "C" => ShortcutAction::SwitchTool(Tool::Circle),
            "a" | "A" => ShortcutAction::SwitchTool(Tool::Arrow),
            "h" | "H" => ShortcutAction::SwitchTool(Tool::Highlight),
            "t" | "T" => ShortcutAction::SwitchTool(Tool::Text),
            "n" | "N" => ShortcutAction::SwitchTool(Tool::StickyNote),
            "Delete" | "Backspace" => ShortcutAction::DeleteSelection,
            "Escape" => ShortcutAction::Escape,
            _ => return None,
        };
        Some(action)
    }
}
