// Flat styled-text rendering of a document for an fltk text display:
// one display line per leaf block, a parallel style-character buffer and
// a line map back to block ids for caret placement.

use crate::document::{Block, BlockKind, Document, Marks, NodeId};
use crate::editor::Position;
use fltk::{enums, text};

pub const DEFAULT_FONT_SIZE: i32 = 15;

pub const STYLE_PLAIN: char = 'A';
pub const STYLE_BOLD: char = 'B';
pub const STYLE_ITALIC: char = 'C';
pub const STYLE_BOLD_ITALIC: char = 'D';
pub const STYLE_CODE: char = 'E';
pub const STYLE_UNDERLINED: char = 'F';
pub const STYLE_HEADING1: char = 'G';
pub const STYLE_HEADING2: char = 'H';
pub const STYLE_QUOTE: char = 'I';
pub const STYLE_MARKER: char = 'J';
pub const STYLE_IMAGE: char = 'K';

/// Style table matching the style characters above, in order
pub fn style_table() -> Vec<text::StyleTableEntry> {
    vec![
        // STYLE_PLAIN
        text::StyleTableEntry {
            color: enums::Color::Black,
            font: enums::Font::Helvetica,
            size: DEFAULT_FONT_SIZE,
        },
        // STYLE_BOLD
        text::StyleTableEntry {
            color: enums::Color::Black,
            font: enums::Font::HelveticaBold,
            size: DEFAULT_FONT_SIZE,
        },
        // STYLE_ITALIC
        text::StyleTableEntry {
            color: enums::Color::Black,
            font: enums::Font::HelveticaItalic,
            size: DEFAULT_FONT_SIZE,
        },
        // STYLE_BOLD_ITALIC
        text::StyleTableEntry {
            color: enums::Color::Black,
            font: enums::Font::HelveticaBoldItalic,
            size: DEFAULT_FONT_SIZE,
        },
        // STYLE_CODE
        text::StyleTableEntry {
            color: enums::Color::from_rgb(0, 100, 200),
            font: enums::Font::Courier,
            size: DEFAULT_FONT_SIZE,
        },
        // STYLE_UNDERLINED (underline is not supported in the style table)
        text::StyleTableEntry {
            color: enums::Color::Blue,
            font: enums::Font::Helvetica,
            size: DEFAULT_FONT_SIZE,
        },
        // STYLE_HEADING1
        text::StyleTableEntry {
            color: enums::Color::Black,
            font: enums::Font::HelveticaBold,
            size: DEFAULT_FONT_SIZE + 6,
        },
        // STYLE_HEADING2
        text::StyleTableEntry {
            color: enums::Color::Black,
            font: enums::Font::HelveticaBold,
            size: DEFAULT_FONT_SIZE + 3,
        },
        // STYLE_QUOTE
        text::StyleTableEntry {
            color: enums::Color::from_rgb(100, 0, 0),
            font: enums::Font::TimesItalic,
            size: DEFAULT_FONT_SIZE,
        },
        // STYLE_MARKER
        text::StyleTableEntry {
            color: enums::Color::Gray0,
            font: enums::Font::Helvetica,
            size: DEFAULT_FONT_SIZE,
        },
        // STYLE_IMAGE
        text::StyleTableEntry {
            color: enums::Color::from_rgb(120, 60, 160),
            font: enums::Font::HelveticaItalic,
            size: DEFAULT_FONT_SIZE,
        },
    ]
}

fn style_char(kind: BlockKind, marks: Marks) -> char {
    match kind {
        BlockKind::HeadingOne => STYLE_HEADING1,
        BlockKind::HeadingTwo => STYLE_HEADING2,
        BlockKind::Image => STYLE_IMAGE,
        _ => {
            if marks.code {
                STYLE_CODE
            } else if marks.bold && marks.italic {
                STYLE_BOLD_ITALIC
            } else if marks.bold {
                STYLE_BOLD
            } else if marks.italic {
                STYLE_ITALIC
            } else if marks.underlined {
                STYLE_UNDERLINED
            } else if kind == BlockKind::BlockQuote {
                STYLE_QUOTE
            } else {
                STYLE_PLAIN
            }
        }
    }
}

/// One display line: which leaf block it shows, where it starts in the
/// display text, how many bytes its marker prefix takes and how long the
/// editable content is.
#[derive(Debug, Clone)]
pub struct LineInfo {
    pub block: NodeId,
    pub start: usize,
    pub prefix: usize,
    pub len: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedDocument {
    pub text: String,
    pub style: String,
    pub lines: Vec<LineInfo>,
}

impl RenderedDocument {
    /// Map a byte position in the display text to a document position
    pub fn position_for(&self, byte: usize) -> Option<Position> {
        for line in &self.lines {
            let end = line.start + line.prefix + line.len;
            if byte <= end {
                let offset = byte
                    .saturating_sub(line.start + line.prefix)
                    .min(line.len);
                return Some(Position::new(line.block, offset));
            }
        }
        self.lines.last().map(|line| Position::new(line.block, line.len))
    }

    /// Map a document position to a byte position in the display text
    pub fn byte_for(&self, pos: Position) -> Option<usize> {
        self.lines
            .iter()
            .find(|line| line.block == pos.block)
            .map(|line| line.start + line.prefix + pos.offset.min(line.len))
    }
}

/// Render a document to display text plus a parallel style buffer
pub fn render(doc: &Document) -> RenderedDocument {
    let mut out = RenderedDocument::default();
    for block in doc.blocks() {
        render_block(block, 0, None, &mut out);
    }
    // Drop the trailing newline so the buffer ends at the last line
    if out.text.ends_with('\n') {
        out.text.pop();
        out.style.pop();
    }
    out
}

fn render_block(
    block: &Block,
    depth: usize,
    item_number: Option<usize>,
    out: &mut RenderedDocument,
) {
    if block.kind.is_list_container() {
        let numbered = block.kind == BlockKind::NumberedList;
        let mut number = 1;
        for child in &block.children {
            let n = if numbered && child.kind == BlockKind::ListItem {
                let current = number;
                number += 1;
                Some(current)
            } else {
                None
            };
            render_block(child, depth + 1, n, out);
        }
        return;
    }

    let start = out.text.len();
    let marker = match block.kind {
        BlockKind::BlockQuote => "> ".to_string(),
        BlockKind::ListItem => {
            let indent = "    ".repeat(depth.saturating_sub(1));
            match item_number {
                Some(n) => format!("{indent}{n}. "),
                None => format!("{indent}\u{2022} "),
            }
        }
        BlockKind::Image => {
            let src = block.src.as_deref().unwrap_or("");
            format!("[image: {src}]")
        }
        _ => String::new(),
    };
    let marker_style = if block.kind == BlockKind::Image {
        STYLE_IMAGE
    } else {
        STYLE_MARKER
    };
    out.text.push_str(&marker);
    push_style(&mut out.style, marker_style, marker.len());

    let mut content_len = 0;
    if !block.kind.is_void() {
        for run in &block.content {
            out.text.push_str(&run.text);
            push_style(&mut out.style, style_char(block.kind, run.marks), run.text.len());
            content_len += run.text.len();
        }
    }

    out.text.push('\n');
    out.style.push(STYLE_PLAIN);
    out.lines.push(LineInfo {
        block: block.id,
        start,
        prefix: marker.len(),
        len: content_len,
    });
}

fn push_style(style: &mut String, ch: char, bytes: usize) {
    for _ in 0..bytes {
        style.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Document, Marks};
    use crate::editor::{Editor, Position};

    #[test]
    fn style_buffer_length_matches_text() {
        let mut editor = Editor::with_document(Document::with_paragraph("hello"));
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_selection(Position::new(leaf, 0), Position::new(leaf, 3));
        editor
            .toggle_mark(crate::document::Mark::Bold)
            .unwrap();
        let rendered = render(editor.document());
        assert_eq!(rendered.text.len(), rendered.style.len());
        assert!(rendered.style.starts_with("BBBAA"));
    }

    #[test]
    fn style_count_matches_table() {
        let table = style_table();
        let last = STYLE_IMAGE as usize - STYLE_PLAIN as usize + 1;
        assert_eq!(table.len(), last);
    }

    #[test]
    fn list_items_get_markers_and_nesting_indent() {
        let mut editor = Editor::with_document(Document::with_paragraph("item"));
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));
        editor.toggle_block(BlockKind::NumberedList).unwrap();

        let rendered = render(editor.document());
        assert!(rendered.text.starts_with("1. item"));

        editor.indent(true).unwrap();
        let rendered = render(editor.document());
        assert!(rendered.text.starts_with("    1. item"));
    }

    #[test]
    fn numbered_items_count_up() {
        let mut doc = Document::new();
        doc.add_block(Block::container(
            0,
            BlockKind::NumberedList,
            vec![
                Block::list_item(0).with_plain_text("one"),
                Block::list_item(0).with_plain_text("two"),
            ],
        ));
        doc.normalize();
        let rendered = render(&doc);
        assert!(rendered.text.contains("1. one"));
        assert!(rendered.text.contains("2. two"));
    }

    #[test]
    fn image_renders_as_placeholder_line() {
        let mut doc = Document::new();
        doc.add_block(Block::paragraph(0).with_plain_text("before"));
        doc.add_block(Block::image(0, "cat.png"));
        doc.normalize();
        let rendered = render(&doc);
        assert!(rendered.text.contains("[image: cat.png]"));
        let image_line = &rendered.lines[1];
        assert_eq!(image_line.len, 0);
    }

    #[test]
    fn positions_round_trip_through_display_bytes() {
        let mut doc = Document::new();
        doc.add_block(Block::paragraph(0).with_text("bold", Marks::bold()));
        doc.add_block(Block::container(
            0,
            BlockKind::BulletedList,
            vec![Block::list_item(0).with_plain_text("item")],
        ));
        doc.normalize();
        let rendered = render(&doc);

        for line in &rendered.lines {
            for offset in [0, line.len / 2, line.len] {
                let pos = Position::new(line.block, offset);
                let byte = rendered.byte_for(pos).unwrap();
                assert_eq!(rendered.position_for(byte), Some(pos));
            }
        }
    }
}
