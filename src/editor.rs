// Editing operations over a Document: cursor and selection state, mark
// toggling, block toggling (including list wrap/unwrap rules), indent,
// image insertion and plain text editing.

use crate::document::{Block, BlockKind, Document, Mark, Marks, NodeId, TextRun};
use unicode_segmentation::UnicodeSegmentation;

/// Result of an editing operation
pub type EditResult = Result<(), EditError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditError {
    UnknownBlock,
    InvalidPosition,
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::UnknownBlock => write!(f, "no block with that id"),
            EditError::InvalidPosition => write!(f, "position outside the document"),
        }
    }
}

/// A logical position: a leaf block and a byte offset into its text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub block: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(block: NodeId, offset: usize) -> Self {
        Position { block, offset }
    }
}

/// The editor: a document plus cursor/selection state
pub struct Editor {
    document: Document,
    cursor: Position,
    selection: Option<(Position, Position)>,
    // Mark set for the next insertion after a caret-only mark toggle
    pending_marks: Option<Marks>,
}

impl Editor {
    pub fn new() -> Self {
        Self::with_document(Document::empty())
    }

    pub fn with_document(mut document: Document) -> Self {
        document.normalize();
        let first = document.first_leaf().expect("normalized document has a leaf");
        Editor {
            document,
            cursor: Position::new(first, 0),
            selection: None,
            pending_marks: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Replace the document wholesale (restore), resetting all edit state
    pub fn set_document(&mut self, mut document: Document) {
        document.normalize();
        let first = document.first_leaf().expect("normalized document has a leaf");
        self.document = document;
        self.cursor = Position::new(first, 0);
        self.selection = None;
        self.pending_marks = None;
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn selection(&self) -> Option<(Position, Position)> {
        self.selection
    }

    /// Set the cursor (clamped to a valid leaf position), clearing selection
    pub fn set_cursor(&mut self, pos: Position) {
        self.cursor = self.clamp(pos);
        self.selection = None;
        self.pending_marks = None;
    }

    pub fn set_selection(&mut self, anchor: Position, focus: Position) {
        let anchor = self.clamp(anchor);
        let focus = self.clamp(focus);
        self.selection = Some((anchor, focus));
        self.cursor = focus;
        self.pending_marks = None;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn clamp(&self, pos: Position) -> Position {
        match self.document.find(pos.block) {
            Some(block) if block.kind.is_leaf() => {
                Position::new(pos.block, pos.offset.min(block.text_len()))
            }
            _ => {
                let first = self.document.first_leaf().expect("document has a leaf");
                Position::new(first, 0)
            }
        }
    }

    fn leaf_index(&self, id: NodeId) -> Option<usize> {
        self.document.leaves().iter().position(|&l| l == id)
    }

    /// Selection in document order; collapsed selections yield (cursor, cursor)
    pub fn selection_range(&self) -> (Position, Position) {
        let Some((a, b)) = self.selection else {
            return (self.cursor, self.cursor);
        };
        let ia = self.leaf_index(a.block).unwrap_or(0);
        let ib = self.leaf_index(b.block).unwrap_or(0);
        if ia < ib || (ia == ib && a.offset <= b.offset) {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn is_collapsed(&self) -> bool {
        match self.selection {
            None => true,
            Some((a, b)) => a == b,
        }
    }

    /// Leaf blocks intersecting the selection, in document order
    pub fn selected_leaves(&self) -> Vec<NodeId> {
        let (start, end) = self.selection_range();
        let leaves = self.document.leaves();
        let ia = leaves.iter().position(|&l| l == start.block).unwrap_or(0);
        let ib = leaves.iter().position(|&l| l == end.block).unwrap_or(ia);
        leaves[ia..=ib].to_vec()
    }

    fn first_selected(&self) -> NodeId {
        self.selection_range().0.block
    }

    /// The byte span of the selection within one selected leaf
    fn leaf_span(&self, id: NodeId) -> (usize, usize) {
        let (start, end) = self.selection_range();
        let len = self.document.find(id).map(|b| b.text_len()).unwrap_or(0);
        let from = if id == start.block { start.offset } else { 0 };
        let to = if id == end.block { end.offset } else { len };
        (from.min(len), to.min(len))
    }

    // --- mark state ---------------------------------------------------

    /// Marks active at the selection: the intersection over all selected
    /// runs, or the marks at the caret (pending toggles included)
    pub fn active_marks(&self) -> Marks {
        if self.is_collapsed() {
            if let Some(pending) = self.pending_marks {
                return pending;
            }
            return self
                .document
                .find(self.cursor.block)
                .map(|b| marks_at(b, self.cursor.offset))
                .unwrap_or_default();
        }
        let mut acc: Option<Marks> = None;
        for id in self.selected_leaves() {
            let Some(block) = self.document.find(id) else {
                continue;
            };
            let (from, to) = self.leaf_span(id);
            let (_, selected, _) = split_runs(&block.content, from, to);
            for run in selected {
                acc = Some(match acc {
                    Some(a) => a.intersect(run.marks),
                    None => run.marks,
                });
            }
        }
        acc.unwrap_or_default()
    }

    /// Toggle a mark on the selection: remove when active, add otherwise.
    /// At a caret this buffers into the pending marks for the next insertion.
    pub fn toggle_mark(&mut self, mark: Mark) -> EditResult {
        if self.is_collapsed() {
            let mut marks = self.active_marks();
            marks.set(mark, !marks.contains(mark));
            self.pending_marks = Some(marks);
            return Ok(());
        }
        let on = !self.active_marks().contains(mark);
        self.apply_to_selected_runs(|marks| marks.set(mark, on))
    }

    fn apply_to_selected_runs(&mut self, apply: impl Fn(&mut Marks)) -> EditResult {
        let spans: Vec<(NodeId, usize, usize)> = self
            .selected_leaves()
            .into_iter()
            .map(|id| {
                let (from, to) = self.leaf_span(id);
                (id, from, to)
            })
            .collect();
        for (id, from, to) in spans {
            let block = self.document.find_mut(id).ok_or(EditError::UnknownBlock)?;
            if block.kind.is_void() {
                continue;
            }
            let (before, mut selected, after) = split_runs(&block.content, from, to);
            for run in &mut selected {
                apply(&mut run.marks);
            }
            block.content = before
                .into_iter()
                .chain(selected)
                .chain(after)
                .collect();
            block.coalesce_runs();
        }
        Ok(())
    }

    // --- block state ---------------------------------------------------

    /// True when any selected leaf block has this kind
    pub fn is_block_active(&self, kind: BlockKind) -> bool {
        self.selected_leaves()
            .iter()
            .filter_map(|&id| self.document.find(id))
            .any(|b| b.kind == kind)
    }

    pub fn in_list_item(&self) -> bool {
        self.is_block_active(BlockKind::ListItem)
    }

    /// Kind of the nearest list container enclosing the selection start
    pub fn nearest_list_kind(&self) -> Option<BlockKind> {
        self.document
            .nearest_ancestor(self.first_selected(), |b| b.kind.is_list_container())
            .map(|b| b.kind)
    }

    /// Toggle the block type of the selection.
    ///
    /// Non-list kinds: set the selected blocks to the kind (or back to
    /// paragraph when already active); a selection inside a list also
    /// detaches from its list containers.
    ///
    /// List kinds: toggling the enclosing list's own kind peels one list
    /// level off (falling back to paragraph outside any list); toggling the
    /// other kind switches the nearest container's type in place; outside a
    /// list it starts a new one.
    pub fn toggle_block(&mut self, kind: BlockKind) -> EditResult {
        if !kind.is_list_container() {
            let is_active = self.is_block_active(kind);
            let is_list = self.in_list_item();
            let target = if is_active { BlockKind::Paragraph } else { kind };
            let selected = self.selected_leaves();
            for &id in &selected {
                self.document.set_kind(id, target);
            }
            if is_list {
                for &id in &selected {
                    self.document.unwrap_block(id, BlockKind::BulletedList);
                    self.document.unwrap_block(id, BlockKind::NumberedList);
                }
            }
        } else if self.in_list_item() {
            let first = self.first_selected();
            if self.nearest_list_kind() == Some(kind) {
                let selected = self.selected_leaves();
                for &id in &selected {
                    self.document.unwrap_block(id, kind);
                }
                for &id in &selected {
                    self.repair_unlisted_item(id);
                }
            } else {
                let other = match kind {
                    BlockKind::BulletedList => BlockKind::NumberedList,
                    _ => BlockKind::BulletedList,
                };
                self.document.unwrap_block(first, other);
                self.document.wrap_blocks(&[first], kind);
            }
        } else {
            let selected = self.selected_leaves();
            for &id in &selected {
                self.document.set_kind(id, BlockKind::ListItem);
            }
            self.wrap_selected(kind);
        }
        self.document.normalize();
        Ok(())
    }

    /// Wrap the selected leaves in containers, one per parent group
    fn wrap_selected(&mut self, kind: BlockKind) {
        let selected = self.selected_leaves();
        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        let mut last_parent: Option<Option<NodeId>> = None;
        for id in selected {
            let parent = self.document.parent_of(id).map(|b| b.id);
            if last_parent == Some(parent) {
                groups.last_mut().expect("group exists").push(id);
            } else {
                groups.push(vec![id]);
                last_parent = Some(parent);
            }
        }
        for group in groups {
            self.document.wrap_blocks(&group, kind);
        }
    }

    /// Indent one list level in (`inward`) or out.
    ///
    /// Outside a list, only an inward indent of a paragraph does anything:
    /// it becomes a single-item bulleted list. Inside a list, inward wraps
    /// one level deeper but refuses at nesting depth 3; outward unwraps one
    /// level and falls back to paragraph when no list ancestor remains.
    pub fn indent(&mut self, inward: bool) -> EditResult {
        if !self.in_list_item() {
            if !inward || !self.is_block_active(BlockKind::Paragraph) {
                return Ok(());
            }
            let selected = self.selected_leaves();
            for &id in &selected {
                self.document.set_kind(id, BlockKind::ListItem);
            }
            self.wrap_selected(BlockKind::BulletedList);
            self.document.normalize();
            return Ok(());
        }

        let first = self.first_selected();
        let Some(parent_kind) = self.nearest_list_kind() else {
            return Ok(());
        };
        if inward {
            if self.document.list_depth(first) >= 3 {
                return Ok(());
            }
            self.document.wrap_blocks(&[first], parent_kind);
        } else {
            let selected = self.selected_leaves();
            for &id in &selected {
                self.document.unwrap_block(id, parent_kind);
            }
            for &id in &selected {
                self.repair_unlisted_item(id);
            }
        }
        self.document.normalize();
        Ok(())
    }

    /// A list item lifted out of its last list container becomes a paragraph
    fn repair_unlisted_item(&mut self, id: NodeId) {
        let is_item = self.document.find(id).map(|b| b.kind) == Some(BlockKind::ListItem);
        let listed = self
            .document
            .nearest_ancestor(id, |b| b.kind.is_list_container())
            .is_some();
        if is_item && !listed {
            self.document.set_kind(id, BlockKind::Paragraph);
        }
    }

    /// Insert a void image block after the cursor's block. The target is
    /// re-resolved from the cursor at call time.
    pub fn insert_image(&mut self, src: &str) -> EditResult {
        let at = self.cursor.block;
        self.document
            .insert_after(at, Block::image(0, src))
            .ok_or(EditError::UnknownBlock)?;
        self.document.normalize();
        Ok(())
    }

    // --- text editing --------------------------------------------------

    /// Insert text at the cursor, using pending marks when set
    pub fn insert_text(&mut self, text: &str) -> EditResult {
        if text.is_empty() {
            return Ok(());
        }
        if !self.is_collapsed() {
            self.delete_selection()?;
        }
        let id = self.cursor.block;
        let offset = self.cursor.offset;
        let marks = match self.pending_marks.take() {
            Some(marks) => marks,
            None => self
                .document
                .find(id)
                .map(|b| marks_at(b, offset))
                .unwrap_or_default(),
        };
        let block = self.document.find_mut(id).ok_or(EditError::UnknownBlock)?;
        if block.kind.is_void() {
            return Ok(());
        }
        let (before, _, after) = split_runs(&block.content, offset, offset);
        block.content = before
            .into_iter()
            .chain(std::iter::once(TextRun::new(text, marks)))
            .chain(after)
            .collect();
        block.coalesce_runs();
        self.cursor.offset = offset + text.len();
        Ok(())
    }

    /// Split the current block at the cursor. A list item continues the
    /// list; pressing enter in an empty list item exits the list instead.
    pub fn insert_newline(&mut self) -> EditResult {
        if !self.is_collapsed() {
            self.delete_selection()?;
        }
        let id = self.cursor.block;
        let offset = self.cursor.offset;
        let (kind, empty) = {
            let block = self.document.find(id).ok_or(EditError::UnknownBlock)?;
            (block.kind, block.is_empty())
        };

        if kind == BlockKind::ListItem && (empty || offset == 0) {
            self.document.set_kind(id, BlockKind::Paragraph);
            self.document.unwrap_block(id, BlockKind::BulletedList);
            self.document.unwrap_block(id, BlockKind::NumberedList);
            self.document.normalize();
            self.cursor = Position::new(id, 0);
            return Ok(());
        }

        let new_kind = if kind == BlockKind::ListItem {
            BlockKind::ListItem
        } else {
            BlockKind::Paragraph
        };
        let right = {
            let block = self.document.find_mut(id).ok_or(EditError::UnknownBlock)?;
            let (before, _, after) = split_runs(&block.content, offset, offset);
            block.content = before;
            after
        };
        let mut new_block = Block::new(0, new_kind);
        new_block.content = right;
        let new_id = self
            .document
            .insert_after(id, new_block)
            .ok_or(EditError::UnknownBlock)?;
        self.document.normalize();
        self.cursor = Position::new(new_id, 0);
        Ok(())
    }

    /// Delete the grapheme before the cursor, merging blocks at a boundary
    pub fn delete_backward(&mut self) -> EditResult {
        if !self.is_collapsed() {
            return self.delete_selection();
        }
        let id = self.cursor.block;
        let offset = self.cursor.offset;

        if offset > 0 {
            let prev = {
                let block = self.document.find(id).ok_or(EditError::UnknownBlock)?;
                let text = block.to_plain_text();
                text[..offset]
                    .grapheme_indices(true)
                    .last()
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            };
            let block = self.document.find_mut(id).ok_or(EditError::UnknownBlock)?;
            let (before, _, after) = split_runs(&block.content, prev, offset);
            block.content = before.into_iter().chain(after).collect();
            block.coalesce_runs();
            self.cursor.offset = prev;
            return Ok(());
        }

        let leaves = self.document.leaves();
        let Some(idx) = leaves.iter().position(|&l| l == id) else {
            return Err(EditError::UnknownBlock);
        };
        if idx == 0 {
            return Ok(());
        }
        let prev_id = leaves[idx - 1];
        let prev_is_void = self
            .document
            .find(prev_id)
            .map(|b| b.kind.is_void())
            .unwrap_or(false);
        if prev_is_void {
            // Backspace at a block start right after an image removes the image
            self.document.remove(prev_id);
            self.document.normalize();
            return Ok(());
        }
        let runs = self
            .document
            .find(id)
            .map(|b| b.content.clone())
            .ok_or(EditError::UnknownBlock)?;
        self.document.remove(id);
        let prev = self
            .document
            .find_mut(prev_id)
            .ok_or(EditError::UnknownBlock)?;
        let prev_len = prev.text_len();
        prev.content.extend(runs);
        prev.coalesce_runs();
        self.document.normalize();
        self.cursor = Position::new(prev_id, prev_len);
        Ok(())
    }

    /// Delete the selected range
    pub fn delete_selection(&mut self) -> EditResult {
        if self.selection.is_none() {
            return Ok(());
        }
        let (start, end) = self.selection_range();
        self.selection = None;

        if start.block == end.block {
            let block = self
                .document
                .find_mut(start.block)
                .ok_or(EditError::UnknownBlock)?;
            let (before, _, after) = split_runs(&block.content, start.offset, end.offset);
            block.content = before.into_iter().chain(after).collect();
            block.coalesce_runs();
            self.cursor = start;
            return Ok(());
        }

        let covered = self.selected_leaves_between(start.block, end.block);
        let tail_rest = {
            let tail = self
                .document
                .find_mut(end.block)
                .ok_or(EditError::UnknownBlock)?;
            let (_, _, after) = split_runs(&tail.content, 0, end.offset);
            after
        };
        {
            let head = self
                .document
                .find_mut(start.block)
                .ok_or(EditError::UnknownBlock)?;
            let len = head.text_len();
            let (before, _, _) = split_runs(&head.content, start.offset, len);
            head.content = before;
        }
        for id in covered {
            self.document.remove(id);
        }
        self.document.remove(end.block);
        let head = self
            .document
            .find_mut(start.block)
            .ok_or(EditError::UnknownBlock)?;
        head.content.extend(tail_rest);
        head.coalesce_runs();
        self.document.normalize();
        self.cursor = start;
        Ok(())
    }

    fn selected_leaves_between(&self, start: NodeId, end: NodeId) -> Vec<NodeId> {
        let leaves = self.document.leaves();
        let ia = leaves.iter().position(|&l| l == start).unwrap_or(0);
        let ib = leaves.iter().position(|&l| l == end).unwrap_or(ia);
        if ib > ia + 1 {
            leaves[ia + 1..ib].to_vec()
        } else {
            Vec::new()
        }
    }

    // --- cursor movement -----------------------------------------------

    pub fn move_left(&mut self) {
        self.selection = None;
        self.pending_marks = None;
        let id = self.cursor.block;
        if self.cursor.offset > 0 {
            if let Some(block) = self.document.find(id) {
                let text = block.to_plain_text();
                self.cursor.offset = text[..self.cursor.offset]
                    .grapheme_indices(true)
                    .last()
                    .map(|(i, _)| i)
                    .unwrap_or(0);
            }
            return;
        }
        let leaves = self.document.leaves();
        if let Some(idx) = leaves.iter().position(|&l| l == id) {
            if idx > 0 {
                let prev = leaves[idx - 1];
                let len = self.document.find(prev).map(|b| b.text_len()).unwrap_or(0);
                self.cursor = Position::new(prev, len);
            }
        }
    }

    pub fn move_right(&mut self) {
        self.selection = None;
        self.pending_marks = None;
        let id = self.cursor.block;
        if let Some(block) = self.document.find(id) {
            let text = block.to_plain_text();
            if self.cursor.offset < text.len() {
                let step = text[self.cursor.offset..]
                    .graphemes(true)
                    .next()
                    .map(|g| g.len())
                    .unwrap_or(0);
                self.cursor.offset += step;
                return;
            }
        }
        let leaves = self.document.leaves();
        if let Some(idx) = leaves.iter().position(|&l| l == id) {
            if idx + 1 < leaves.len() {
                self.cursor = Position::new(leaves[idx + 1], 0);
            }
        }
    }

    pub fn move_up(&mut self) {
        self.move_by_leaf(-1);
    }

    pub fn move_down(&mut self) {
        self.move_by_leaf(1);
    }

    fn move_by_leaf(&mut self, delta: isize) {
        self.selection = None;
        self.pending_marks = None;
        let leaves = self.document.leaves();
        let Some(idx) = leaves.iter().position(|&l| l == self.cursor.block) else {
            return;
        };
        let target = idx as isize + delta;
        if target < 0 || target as usize >= leaves.len() {
            return;
        }
        let id = leaves[target as usize];
        let len = self.document.find(id).map(|b| b.text_len()).unwrap_or(0);
        self.cursor = Position::new(id, self.cursor.offset.min(len));
    }

    pub fn move_line_start(&mut self) {
        self.selection = None;
        self.cursor.offset = 0;
    }

    pub fn move_line_end(&mut self) {
        self.selection = None;
        if let Some(block) = self.document.find(self.cursor.block) {
            self.cursor.offset = block.text_len();
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks at a caret offset: the marks of the run the preceding character
/// belongs to, or of the first run at the block start
fn marks_at(block: &Block, offset: usize) -> Marks {
    if offset == 0 {
        return block.content.first().map(|r| r.marks).unwrap_or_default();
    }
    let mut pos = 0;
    for run in &block.content {
        let end = pos + run.len();
        if offset <= end {
            return run.marks;
        }
        pos = end;
    }
    block.content.last().map(|r| r.marks).unwrap_or_default()
}

/// Split runs into (before, within, after) around a byte range
fn split_runs(
    runs: &[TextRun],
    start: usize,
    end: usize,
) -> (Vec<TextRun>, Vec<TextRun>, Vec<TextRun>) {
    let mut before = Vec::new();
    let mut within = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0;
    for run in runs {
        let len = run.len();
        let run_start = pos;
        let run_end = pos + len;
        if run_end <= start {
            before.push(run.clone());
        } else if run_start >= end {
            after.push(run.clone());
        } else {
            let s = start.saturating_sub(run_start);
            let e = end.saturating_sub(run_start).min(len);
            if s > 0 {
                before.push(TextRun::new(&run.text[..s], run.marks));
            }
            if e > s {
                within.push(TextRun::new(&run.text[s..e], run.marks));
            }
            if e < len {
                after.push(TextRun::new(&run.text[e..], run.marks));
            }
        }
        pos = run_end;
    }
    (before, within, after)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with_text(text: &str) -> Editor {
        Editor::with_document(Document::with_paragraph(text))
    }

    fn select_all_of_block(editor: &mut Editor, id: NodeId) {
        let len = editor.document().find(id).unwrap().text_len();
        editor.set_selection(Position::new(id, 0), Position::new(id, len));
    }

    fn top_kinds(editor: &Editor) -> Vec<BlockKind> {
        editor.document().blocks().iter().map(|b| b.kind).collect()
    }

    #[test]
    fn toggle_mark_twice_restores_marks() {
        let mut editor = editor_with_text("hello world");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_selection(Position::new(leaf, 0), Position::new(leaf, 5));

        let original = editor.active_marks();
        editor.toggle_mark(Mark::Bold).unwrap();
        assert!(editor.active_marks().bold);
        editor.toggle_mark(Mark::Bold).unwrap();
        assert_eq!(editor.active_marks(), original);
    }

    #[test]
    fn toggle_mark_at_caret_buffers_for_next_insert() {
        let mut editor = editor_with_text("ab");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 2));
        editor.toggle_mark(Mark::Italic).unwrap();
        assert!(editor.active_marks().italic);
        editor.insert_text("c").unwrap();

        let block = editor.document().find(leaf).unwrap();
        assert_eq!(block.content.len(), 2);
        assert!(block.content[1].marks.italic);
        assert_eq!(block.content[1].text, "c");
    }

    #[test]
    fn toggle_mark_over_mixed_runs_adds_then_removes() {
        let mut editor = editor_with_text("plain");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_selection(Position::new(leaf, 1), Position::new(leaf, 4));
        editor.toggle_mark(Mark::Bold).unwrap();

        // Selection now covers bold and plain text together: not active
        editor.set_selection(Position::new(leaf, 0), Position::new(leaf, 5));
        assert!(!editor.active_marks().bold);
        // Toggling adds bold everywhere, collapsing back to one run
        editor.toggle_mark(Mark::Bold).unwrap();
        assert!(editor.active_marks().bold);
        assert_eq!(editor.document().find(leaf).unwrap().content.len(), 1);
    }

    #[test]
    fn toggle_heading_and_back_restores_paragraph() {
        let mut editor = editor_with_text("title");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));

        editor.toggle_block(BlockKind::HeadingOne).unwrap();
        assert_eq!(
            editor.document().find(leaf).unwrap().kind,
            BlockKind::HeadingOne
        );
        editor.toggle_block(BlockKind::HeadingOne).unwrap();
        assert_eq!(
            editor.document().find(leaf).unwrap().kind,
            BlockKind::Paragraph
        );
    }

    #[test]
    fn bulleted_list_toggle_wraps_and_unwraps() {
        let mut editor = editor_with_text("item");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));

        editor.toggle_block(BlockKind::BulletedList).unwrap();
        let block = editor.document().find(leaf).unwrap();
        assert_eq!(block.kind, BlockKind::ListItem);
        let parent = editor.document().parent_of(leaf).unwrap();
        assert_eq!(parent.kind, BlockKind::BulletedList);

        editor.toggle_block(BlockKind::BulletedList).unwrap();
        assert_eq!(
            editor.document().find(leaf).unwrap().kind,
            BlockKind::Paragraph
        );
        assert!(editor.document().parent_of(leaf).is_none());
    }

    #[test]
    fn heading_on_list_item_detaches_from_list() {
        let mut editor = editor_with_text("item");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));
        editor.toggle_block(BlockKind::BulletedList).unwrap();

        editor.toggle_block(BlockKind::HeadingTwo).unwrap();
        assert_eq!(
            editor.document().find(leaf).unwrap().kind,
            BlockKind::HeadingTwo
        );
        assert!(editor.document().parent_of(leaf).is_none());
    }

    #[test]
    fn switch_list_type_preserves_depth() {
        let mut editor = editor_with_text("item");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));
        editor.toggle_block(BlockKind::BulletedList).unwrap();

        editor.toggle_block(BlockKind::NumberedList).unwrap();
        let block = editor.document().find(leaf).unwrap();
        assert_eq!(block.kind, BlockKind::ListItem);
        let parent = editor.document().parent_of(leaf).unwrap();
        assert_eq!(parent.kind, BlockKind::NumberedList);
        assert_eq!(editor.document().list_depth(leaf), 1);
    }

    #[test]
    fn switch_list_type_nested_two_levels() {
        let mut editor = editor_with_text("deep");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));
        editor.toggle_block(BlockKind::BulletedList).unwrap();
        editor.indent(true).unwrap();
        assert_eq!(editor.document().list_depth(leaf), 2);

        // Only the nearest container changes type; the outer one stays
        editor.toggle_block(BlockKind::NumberedList).unwrap();
        assert_eq!(editor.document().list_depth(leaf), 2);
        let parent = editor.document().parent_of(leaf).unwrap();
        assert_eq!(parent.kind, BlockKind::NumberedList);
        assert_eq!(
            editor.document().blocks()[0].kind,
            BlockKind::BulletedList
        );
    }

    #[test]
    fn toggle_same_list_type_nested_peels_one_level() {
        let mut editor = editor_with_text("deep");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));
        editor.toggle_block(BlockKind::BulletedList).unwrap();
        editor.indent(true).unwrap();

        editor.toggle_block(BlockKind::BulletedList).unwrap();
        // Still a list item, one level up in the outer list
        assert_eq!(editor.document().find(leaf).unwrap().kind, BlockKind::ListItem);
        assert_eq!(editor.document().list_depth(leaf), 1);

        editor.toggle_block(BlockKind::BulletedList).unwrap();
        assert_eq!(
            editor.document().find(leaf).unwrap().kind,
            BlockKind::Paragraph
        );
        assert_eq!(editor.document().list_depth(leaf), 0);
    }

    #[test]
    fn indent_refused_at_depth_three() {
        let mut editor = editor_with_text("deep");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));
        editor.toggle_block(BlockKind::BulletedList).unwrap();
        editor.indent(true).unwrap();
        editor.indent(true).unwrap();
        assert_eq!(editor.document().list_depth(leaf), 3);

        let before = editor.document().clone();
        editor.indent(true).unwrap();
        assert_eq!(*editor.document(), before);
    }

    #[test]
    fn indent_inward_only_applies_to_paragraphs() {
        let mut editor = editor_with_text("title");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));
        editor.toggle_block(BlockKind::HeadingOne).unwrap();

        let before = editor.document().clone();
        editor.indent(true).unwrap();
        assert_eq!(*editor.document(), before);
    }

    #[test]
    fn outdent_past_last_level_restores_paragraph() {
        let mut editor = editor_with_text("item");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 0));
        editor.indent(true).unwrap();
        assert_eq!(editor.document().find(leaf).unwrap().kind, BlockKind::ListItem);

        editor.indent(false).unwrap();
        assert_eq!(
            editor.document().find(leaf).unwrap().kind,
            BlockKind::Paragraph
        );
        assert_eq!(editor.document().list_depth(leaf), 0);

        // Outdenting a non-list block is a no-op
        let before = editor.document().clone();
        editor.indent(false).unwrap();
        assert_eq!(*editor.document(), before);
    }

    #[test]
    fn insert_image_adds_void_block_with_trailing_paragraph() {
        let mut editor = editor_with_text("text");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 4));
        editor.insert_image("shot.png").unwrap();

        let kinds = top_kinds(&editor);
        assert_eq!(
            kinds,
            vec![BlockKind::Paragraph, BlockKind::Image, BlockKind::Paragraph]
        );
        assert_eq!(
            editor.document().blocks()[1].src.as_deref(),
            Some("shot.png")
        );
    }

    #[test]
    fn newline_continues_list_item() {
        let mut editor = editor_with_text("first");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 5));
        editor.toggle_block(BlockKind::BulletedList).unwrap();
        editor.set_cursor(Position::new(leaf, 5));

        editor.insert_newline().unwrap();
        editor.insert_text("second").unwrap();

        let parent = editor.document().blocks()[0].clone();
        assert_eq!(parent.kind, BlockKind::BulletedList);
        assert_eq!(parent.children.len(), 2);
        assert_eq!(parent.children[1].kind, BlockKind::ListItem);
        assert_eq!(parent.children[1].to_plain_text(), "second");
    }

    #[test]
    fn newline_in_empty_list_item_exits_list() {
        let mut editor = editor_with_text("first");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 5));
        editor.toggle_block(BlockKind::BulletedList).unwrap();
        editor.set_cursor(Position::new(leaf, 5));
        editor.insert_newline().unwrap();

        // The fresh item is empty; enter again leaves the list
        editor.insert_newline().unwrap();
        let cursor = editor.cursor();
        assert_eq!(
            editor.document().find(cursor.block).unwrap().kind,
            BlockKind::Paragraph
        );
        assert_eq!(editor.document().list_depth(cursor.block), 0);
    }

    #[test]
    fn backspace_at_block_start_merges() {
        let mut editor = editor_with_text("ab");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 1));
        editor.insert_newline().unwrap();
        assert_eq!(editor.document().block_count(), 2);

        editor.delete_backward().unwrap();
        assert_eq!(editor.document().block_count(), 1);
        assert_eq!(editor.document().blocks()[0].to_plain_text(), "ab");
        assert_eq!(editor.cursor(), Position::new(leaf, 1));
    }

    #[test]
    fn delete_selection_across_blocks() {
        let mut editor = editor_with_text("first");
        let leaf = editor.document().first_leaf().unwrap();
        editor.set_cursor(Position::new(leaf, 5));
        editor.insert_newline().unwrap();
        editor.insert_text("second").unwrap();
        let second = editor.cursor().block;

        editor.set_selection(Position::new(leaf, 3), Position::new(second, 3));
        editor.delete_selection().unwrap();
        assert_eq!(editor.document().blocks()[0].to_plain_text(), "firond");
        assert_eq!(editor.cursor(), Position::new(leaf, 3));
    }

    fn editor_with_bulleted_pair() -> (Editor, NodeId, NodeId) {
        let mut doc = Document::new();
        doc.add_block(Block::container(
            0,
            BlockKind::BulletedList,
            vec![
                Block::list_item(0).with_plain_text("one"),
                Block::list_item(0).with_plain_text("two"),
            ],
        ));
        let mut editor = Editor::with_document(doc);
        let leaves = editor.document().leaves();
        let (a, b) = (leaves[0], leaves[1]);
        editor.set_selection(Position::new(a, 0), Position::new(b, 3));
        (editor, a, b)
    }

    #[test]
    fn heading_toggle_detaches_every_selected_item() {
        let (mut editor, a, b) = editor_with_bulleted_pair();
        editor.toggle_block(BlockKind::HeadingOne).unwrap();

        for id in [a, b] {
            assert_eq!(
                editor.document().find(id).unwrap().kind,
                BlockKind::HeadingOne
            );
            assert!(editor.document().parent_of(id).is_none());
            assert_eq!(editor.document().list_depth(id), 0);
        }
        assert!(editor
            .document()
            .blocks()
            .iter()
            .all(|blk| !blk.kind.is_list_container()));
    }

    #[test]
    fn list_off_converts_every_selected_item() {
        let (mut editor, a, b) = editor_with_bulleted_pair();
        editor.toggle_block(BlockKind::BulletedList).unwrap();

        for id in [a, b] {
            assert_eq!(
                editor.document().find(id).unwrap().kind,
                BlockKind::Paragraph
            );
            assert!(editor.document().parent_of(id).is_none());
        }
    }

    #[test]
    fn outdent_lifts_every_selected_item() {
        let (mut editor, a, b) = editor_with_bulleted_pair();
        editor.indent(false).unwrap();

        for id in [a, b] {
            assert_eq!(
                editor.document().find(id).unwrap().kind,
                BlockKind::Paragraph
            );
            assert_eq!(editor.document().list_depth(id), 0);
        }
    }

    #[test]
    fn marks_survive_block_toggles() {
        let mut editor = editor_with_text("styled");
        let leaf = editor.document().first_leaf().unwrap();
        select_all_of_block(&mut editor, leaf);
        editor.toggle_mark(Mark::Bold).unwrap();
        editor.toggle_block(BlockKind::BulletedList).unwrap();

        let block = editor.document().find(leaf).unwrap();
        assert_eq!(block.kind, BlockKind::ListItem);
        assert!(block.content[0].marks.bold);
    }
}
