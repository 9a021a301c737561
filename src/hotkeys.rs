// Keyboard shortcut classification, kept free of any GUI types so the
// table can be tested without an event loop.

use crate::document::Mark;

/// A normalized keystroke: the primary modifier is Ctrl on most
/// platforms and Cmd on macOS, mapped by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub command: bool,
    pub shift: bool,
    pub key: Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Tab,
}

impl Keystroke {
    pub fn command(key: Key) -> Self {
        Keystroke {
            command: true,
            shift: false,
            key,
        }
    }

    pub fn plain(key: Key) -> Self {
        Keystroke {
            command: false,
            shift: false,
            key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    ToggleMark(Mark),
    Indent,
    Outdent,
}

/// Map a keystroke to an editing action. Returns None for anything not
/// in the table; the caller must let those keys through untouched.
pub fn classify(stroke: Keystroke) -> Option<HotkeyAction> {
    match stroke.key {
        Key::Char(c) if stroke.command && !stroke.shift => match c {
            'b' => Some(HotkeyAction::ToggleMark(Mark::Bold)),
            'i' => Some(HotkeyAction::ToggleMark(Mark::Italic)),
            'u' => Some(HotkeyAction::ToggleMark(Mark::Underlined)),
            '`' => Some(HotkeyAction::ToggleMark(Mark::Code)),
            _ => None,
        },
        Key::Tab if !stroke.command => {
            if stroke.shift {
                Some(HotkeyAction::Outdent)
            } else {
                Some(HotkeyAction::Indent)
            }
        }
        _ => None,
    }
}
