// Toolbar presentation model: the closed set of buttons, their labels,
// and how their state derives from the session.

use crate::document::{BlockKind, Mark};
use crate::session::{Session, SnapshotStore};

/// Every toolbar button, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarItem {
    Bold,
    Italic,
    Underlined,
    Code,
    HeadingOne,
    HeadingTwo,
    BlockQuote,
    NumberedList,
    BulletedList,
    Image,
    Restore,
    Save,
}

pub const TOOLBAR_ORDER: [ToolbarItem; 12] = [
    ToolbarItem::Bold,
    ToolbarItem::Italic,
    ToolbarItem::Underlined,
    ToolbarItem::Code,
    ToolbarItem::HeadingOne,
    ToolbarItem::HeadingTwo,
    ToolbarItem::BlockQuote,
    ToolbarItem::NumberedList,
    ToolbarItem::BulletedList,
    ToolbarItem::Image,
    ToolbarItem::Restore,
    ToolbarItem::Save,
];

/// What pressing a button does; `InsertImage` needs a source path the
/// caller obtains from a file chooser before applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    ToggleMark(Mark),
    ToggleBlock(BlockKind),
    InsertImage,
    Restore,
    Save,
}

impl ToolbarItem {
    pub fn label(self) -> &'static str {
        match self {
            ToolbarItem::Bold => "B",
            ToolbarItem::Italic => "I",
            ToolbarItem::Underlined => "U",
            ToolbarItem::Code => "</>",
            ToolbarItem::HeadingOne => "H1",
            ToolbarItem::HeadingTwo => "H2",
            ToolbarItem::BlockQuote => "\u{201d}",
            ToolbarItem::NumberedList => "1.",
            ToolbarItem::BulletedList => "\u{2022}",
            ToolbarItem::Image => "Img",
            ToolbarItem::Restore => "Restore",
            ToolbarItem::Save => "Save",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            ToolbarItem::Bold => "Bold (Ctrl+B)",
            ToolbarItem::Italic => "Italic (Ctrl+I)",
            ToolbarItem::Underlined => "Underline (Ctrl+U)",
            ToolbarItem::Code => "Code (Ctrl+`)",
            ToolbarItem::HeadingOne => "Heading 1",
            ToolbarItem::HeadingTwo => "Heading 2",
            ToolbarItem::BlockQuote => "Block quote",
            ToolbarItem::NumberedList => "Numbered list",
            ToolbarItem::BulletedList => "Bulleted list",
            ToolbarItem::Image => "Insert image",
            ToolbarItem::Restore => "Restore the saved document",
            ToolbarItem::Save => "Save the document",
        }
    }

    pub fn action(self) -> ItemAction {
        match self {
            ToolbarItem::Bold => ItemAction::ToggleMark(Mark::Bold),
            ToolbarItem::Italic => ItemAction::ToggleMark(Mark::Italic),
            ToolbarItem::Underlined => ItemAction::ToggleMark(Mark::Underlined),
            ToolbarItem::Code => ItemAction::ToggleMark(Mark::Code),
            ToolbarItem::HeadingOne => ItemAction::ToggleBlock(BlockKind::HeadingOne),
            ToolbarItem::HeadingTwo => ItemAction::ToggleBlock(BlockKind::HeadingTwo),
            ToolbarItem::BlockQuote => ItemAction::ToggleBlock(BlockKind::BlockQuote),
            ToolbarItem::NumberedList => ItemAction::ToggleBlock(BlockKind::NumberedList),
            ToolbarItem::BulletedList => ItemAction::ToggleBlock(BlockKind::BulletedList),
            ToolbarItem::Image => ItemAction::InsertImage,
            ToolbarItem::Restore => ItemAction::Restore,
            ToolbarItem::Save => ItemAction::Save,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub active: bool,
    pub enabled: bool,
}

/// Derive a button's highlight and clickability from the session
pub fn button_state<S: SnapshotStore>(item: ToolbarItem, session: &Session<S>) -> ButtonState {
    let editor = session.editor();
    match item.action() {
        ItemAction::ToggleMark(mark) => ButtonState {
            active: editor.active_marks().contains(mark),
            enabled: true,
        },
        ItemAction::ToggleBlock(kind) if kind.is_list_container() => ButtonState {
            // List buttons light up for the nearest enclosing list's kind
            active: editor.in_list_item() && editor.nearest_list_kind() == Some(kind),
            enabled: true,
        },
        ItemAction::ToggleBlock(kind) => ButtonState {
            active: editor.is_block_active(kind),
            enabled: true,
        },
        ItemAction::InsertImage | ItemAction::Restore => ButtonState {
            active: false,
            enabled: true,
        },
        ItemAction::Save => ButtonState {
            active: false,
            enabled: session.is_dirty() && session.can_save(),
        },
    }
}

/// Dispatch a button press. `Image` is handled by the caller, which owns
/// the file chooser; activating it here is a no-op.
pub fn activate<S: SnapshotStore>(
    item: ToolbarItem,
    session: &mut Session<S>,
) -> Result<(), String> {
    match item.action() {
        ItemAction::ToggleMark(mark) => session
            .apply(|editor| editor.toggle_mark(mark))
            .map_err(|err| err.to_string()),
        ItemAction::ToggleBlock(kind) => session
            .apply(|editor| editor.toggle_block(kind))
            .map_err(|err| err.to_string()),
        ItemAction::InsertImage => Ok(()),
        ItemAction::Restore => {
            session.restore();
            Ok(())
        }
        ItemAction::Save => session.save(),
    }
}
