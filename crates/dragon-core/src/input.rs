//! Input events as the host window layer hands them to the scene.

use crate::geometry::Point;
use std::path::PathBuf;

/// Modifier keys held while an event was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        shift: true,
        alt: false,
    };
}

/// Key identity. Printable keys are reported lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Delete,
    Left,
    Right,
    Space,
    Enter,
    Escape,
}

impl Key {
    /// The lower-cased character of a printable key.
    pub fn char(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(c.to_ascii_lowercase()),
            _ => None,
        }
    }

    pub fn is_char(&self, c: char) -> bool {
        self.char() == Some(c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// A single raw input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMotion {
        pos: Point,
    },
    ButtonDown {
        pos: Point,
        button: MouseButton,
    },
    ButtonUp {
        pos: Point,
        button: MouseButton,
    },
    /// `delta` is in wheel notches; its sign gives the direction.
    Wheel {
        pos: Point,
        delta: f32,
        modifiers: Modifiers,
    },
    KeyDown {
        key: Key,
        modifiers: Modifiers,
    },
    DropText {
        pos: Point,
        text: String,
    },
    DropFile {
        pos: Point,
        path: PathBuf,
    },
    FocusGained,
    FocusLost,
    WindowRestored,
}

impl InputEvent {
    /// Pointer position carried by the event, if any.
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::PointerMotion { pos }
            | InputEvent::ButtonDown { pos, .. }
            | InputEvent::ButtonUp { pos, .. }
            | InputEvent::Wheel { pos, .. }
            | InputEvent::DropText { pos, .. }
            | InputEvent::DropFile { pos, .. } => Some(*pos),
            _ => None,
        }
    }

    pub fn is_motion(&self) -> bool {
        matches!(self, InputEvent::PointerMotion { .. })
    }
}

/// How much of the world an event changed. Ordered: a higher level implies
/// the lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum UpdateLevel {
    #[default]
    None,
    /// Only the picture changed (drag preview); nothing to persist yet.
    ViewChanged,
    /// A persisted property changed.
    SettingsChanged,
}

/// Pointer shape requested by whoever handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

/// Result of offering an event to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResponse {
    pub handled: bool,
    pub update: UpdateLevel,
}

impl EventResponse {
    pub const IGNORED: EventResponse = EventResponse {
        handled: false,
        update: UpdateLevel::None,
    };

    pub fn consumed(update: UpdateLevel) -> Self {
        Self {
            handled: true,
            update,
        }
    }

    pub fn settings_changed() -> Self {
        Self::consumed(UpdateLevel::SettingsChanged)
    }

    pub fn view_changed() -> Self {
        Self::consumed(UpdateLevel::ViewChanged)
    }
}
