//! Normalized input events.
//!
//! Hosts translate whatever event system they sit on (DOM pointer events,
//! winit, a test script) into this one enum before handing it to a page
//! surface. Coordinates are already in unscaled page space — the host
//! divides client pixels by its render scale. Timed variants carry the
//! host's event timestamp; nothing in the engine reads a clock.

/// Keyboard modifier state captured with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Modifiers {
        Modifiers {
            shift: true,
            ..Modifiers::NONE
        }
    }

    /// The platform-neutral "command" chord: Ctrl on Linux/Windows, ⌘ on
    /// macOS. Either satisfies it.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// One normalized input event, in page-space coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        mods: Modifiers,
        time_ms: u64,
    },
    PointerMove {
        x: f64,
        y: f64,
        mods: Modifiers,
        time_ms: u64,
    },
    PointerUp {
        x: f64,
        y: f64,
        mods: Modifiers,
        time_ms: u64,
    },
    /// The pointer left the page surface mid-gesture.
    PointerLeave,
    DoubleClick {
        x: f64,
        y: f64,
        time_ms: u64,
    },
    Key {
        key: String,
        mods: Modifiers,
        time_ms: u64,
    },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64, mods: Modifiers, time_ms: u64) -> Self {
        Self::PointerDown { x, y, mods, time_ms }
    }

    pub fn pointer_move(x: f64, y: f64, mods: Modifiers, time_ms: u64) -> Self {
        Self::PointerMove { x, y, mods, time_ms }
    }

    pub fn pointer_up(x: f64, y: f64, mods: Modifiers, time_ms: u64) -> Self {
        Self::PointerUp { x, y, mods, time_ms }
    }

    pub fn double_click(x: f64, y: f64, time_ms: u64) -> Self {
        Self::DoubleClick { x, y, time_ms }
    }

    pub fn key(key: impl Into<String>, mods: Modifiers, time_ms: u64) -> Self {
        Self::Key {
            key: key.into(),
            mods,
            time_ms,
        }
    }

    /// Page-space position, for the pointer variants.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::DoubleClick { x, y, .. } => Some((*x, *y)),
            Self::PointerLeave | Self::Key { .. } => None,
        }
    }

    /// Host timestamp of the event, when it carries one.
    pub fn time_ms(&self) -> Option<u64> {
        match self {
            Self::PointerDown { time_ms, .. }
            | Self::PointerMove { time_ms, .. }
            | Self::PointerUp { time_ms, .. }
            | Self::DoubleClick { time_ms, .. }
            | Self::Key { time_ms, .. } => Some(*time_ms),
            Self::PointerLeave => None,
        }
    }
}
