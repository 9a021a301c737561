// Block-tree document model
// A typed tree of blocks: leaf blocks carry styled text runs, list
// containers carry child blocks. JSON (via serde) is the storage format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for document blocks
pub type NodeId = usize;

/// Inline mark kinds that can be toggled on a text range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Bold,
    Italic,
    Underlined,
    Code,
}

/// The set of marks applied to a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underlined: bool,
    #[serde(default)]
    pub code: bool,
}

impl Marks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        Marks {
            bold: true,
            ..Default::default()
        }
    }

    pub fn contains(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underlined => self.underlined,
            Mark::Code => self.code,
        }
    }

    pub fn set(&mut self, mark: Mark, on: bool) {
        match mark {
            Mark::Bold => self.bold = on,
            Mark::Italic => self.italic = on,
            Mark::Underlined => self.underlined = on,
            Mark::Code => self.code = on,
        }
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Marks::none()
    }

    /// Marks present in both sets
    pub fn intersect(self, other: Marks) -> Marks {
        Marks {
            bold: self.bold && other.bold,
            italic: self.italic && other.italic,
            underlined: self.underlined && other.underlined,
            code: self.code && other.code,
        }
    }
}

/// A run of text with uniform marks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: Marks) -> Self {
        TextRun {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Marks::none())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split this run at the given byte offset, returning (left, right)
    pub fn split_at(&self, offset: usize) -> (TextRun, TextRun) {
        let (left, right) = self.text.split_at(offset);
        (
            TextRun::new(left, self.marks),
            TextRun::new(right, self.marks),
        )
    }
}

/// Block kinds. Leaf kinds carry text runs; list kinds carry child blocks;
/// `Image` is a void block carrying a source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    BlockQuote,
    BulletedList,
    NumberedList,
    ListItem,
    Image,
}

impl BlockKind {
    pub fn is_list_container(self) -> bool {
        matches!(self, BlockKind::BulletedList | BlockKind::NumberedList)
    }

    pub fn is_leaf(self) -> bool {
        !self.is_list_container()
    }

    /// Void blocks have no editable text content
    pub fn is_void(self) -> bool {
        matches!(self, BlockKind::Image)
    }
}

/// A block in the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    pub kind: BlockKind,
    #[serde(default)]
    pub content: Vec<TextRun>,
    #[serde(default)]
    pub children: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl Block {
    pub fn new(id: NodeId, kind: BlockKind) -> Self {
        Block {
            id,
            kind,
            content: Vec::new(),
            children: Vec::new(),
            src: None,
        }
    }

    pub fn paragraph(id: NodeId) -> Self {
        Self::new(id, BlockKind::Paragraph)
    }

    pub fn list_item(id: NodeId) -> Self {
        Self::new(id, BlockKind::ListItem)
    }

    pub fn image(id: NodeId, src: impl Into<String>) -> Self {
        let mut block = Self::new(id, BlockKind::Image);
        block.src = Some(src.into());
        block
    }

    pub fn container(id: NodeId, kind: BlockKind, children: Vec<Block>) -> Self {
        let mut block = Self::new(id, kind);
        block.children = children;
        block
    }

    pub fn with_text(mut self, text: impl Into<String>, marks: Marks) -> Self {
        self.content.push(TextRun::new(text, marks));
        self
    }

    pub fn with_plain_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(TextRun::plain(text));
        self
    }

    /// Total text length in bytes
    pub fn text_len(&self) -> usize {
        self.content.iter().map(|r| r.len()).sum()
    }

    pub fn to_plain_text(&self) -> String {
        self.content.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|r| r.text.is_empty())
    }

    /// Drop empty runs and merge adjacent runs with identical marks
    pub fn coalesce_runs(&mut self) {
        let runs = std::mem::take(&mut self.content);
        for run in runs {
            if run.is_empty() {
                continue;
            }
            match self.content.last_mut() {
                Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
                _ => self.content.push(run),
            }
        }
    }
}

/// The document: an ordered tree of blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    blocks: Vec<Block>,
    #[serde(default = "default_next_id")]
    next_id: NodeId,
}

fn default_next_id() -> NodeId {
    1
}

impl Document {
    pub fn new() -> Self {
        Document {
            blocks: Vec::new(),
            next_id: 1,
        }
    }

    /// The built-in empty document: a single empty paragraph
    pub fn empty() -> Self {
        let mut doc = Self::new();
        let id = doc.fresh_id();
        doc.blocks.push(Block::paragraph(id));
        doc
    }

    /// A document with one paragraph of plain text
    pub fn with_paragraph(text: impl Into<String>) -> Self {
        let mut doc = Self::new();
        let id = doc.fresh_id();
        doc.blocks.push(Block::paragraph(id).with_plain_text(text));
        doc
    }

    pub fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of top-level blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Append a top-level block, assigning ids where missing
    pub fn add_block(&mut self, mut block: Block) {
        self.assign_ids(&mut block);
        self.blocks.push(block);
    }

    fn assign_ids(&mut self, block: &mut Block) {
        if block.id == 0 {
            block.id = self.fresh_id();
        }
        let mut children = std::mem::take(&mut block.children);
        for child in &mut children {
            self.assign_ids(child);
        }
        block.children = children;
    }

    /// Index path from the root to the block with this id
    fn path_to(&self, id: NodeId) -> Option<Vec<usize>> {
        fn walk(blocks: &[Block], id: NodeId, path: &mut Vec<usize>) -> bool {
            for (i, block) in blocks.iter().enumerate() {
                path.push(i);
                if block.id == id {
                    return true;
                }
                if walk(&block.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.blocks, id, &mut path).then_some(path)
    }

    fn block_at(&self, path: &[usize]) -> &Block {
        let mut block = &self.blocks[path[0]];
        for &i in &path[1..] {
            block = &block.children[i];
        }
        block
    }

    /// The sibling list addressed by a parent path (root list for an empty path)
    fn siblings_mut(&mut self, parent_path: &[usize]) -> &mut Vec<Block> {
        let mut blocks = &mut self.blocks;
        for &i in parent_path {
            blocks = &mut blocks[i].children;
        }
        blocks
    }

    pub fn find(&self, id: NodeId) -> Option<&Block> {
        let path = self.path_to(id)?;
        Some(self.block_at(&path))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Block> {
        fn walk<'a>(blocks: &'a mut [Block], id: NodeId) -> Option<&'a mut Block> {
            for block in blocks {
                if block.id == id {
                    return Some(block);
                }
                if let Some(found) = walk(&mut block.children, id) {
                    return Some(found);
                }
            }
            None
        }
        walk(&mut self.blocks, id)
    }

    /// Parent block, or None for a top-level block
    pub fn parent_of(&self, id: NodeId) -> Option<&Block> {
        let path = self.path_to(id)?;
        if path.len() < 2 {
            return None;
        }
        Some(self.block_at(&path[..path.len() - 1]))
    }

    /// Nearest ancestor (closest first) matching the predicate
    pub fn nearest_ancestor(&self, id: NodeId, pred: impl Fn(&Block) -> bool) -> Option<&Block> {
        let path = self.path_to(id)?;
        for k in (1..path.len()).rev() {
            let ancestor = self.block_at(&path[..k]);
            if pred(ancestor) {
                return Some(ancestor);
            }
        }
        None
    }

    /// Number of list containers on the ancestor chain, the block itself
    /// included when it is a container
    pub fn list_depth(&self, id: NodeId) -> usize {
        let Some(path) = self.path_to(id) else {
            return 0;
        };
        (1..=path.len())
            .filter(|&k| self.block_at(&path[..k]).kind.is_list_container())
            .count()
    }

    /// Leaf block ids in document order
    pub fn leaves(&self) -> Vec<NodeId> {
        fn walk(blocks: &[Block], out: &mut Vec<NodeId>) {
            for block in blocks {
                if block.kind.is_leaf() {
                    out.push(block.id);
                } else {
                    walk(&block.children, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }

    pub fn first_leaf(&self) -> Option<NodeId> {
        self.leaves().first().copied()
    }

    /// Set the kind of a leaf block. Unknown ids are ignored.
    pub fn set_kind(&mut self, id: NodeId, kind: BlockKind) -> bool {
        match self.find_mut(id) {
            Some(block) => {
                block.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Wrap a contiguous run of sibling blocks in a new container.
    /// All ids must share a parent and be adjacent; otherwise a no-op.
    pub fn wrap_blocks(&mut self, ids: &[NodeId], kind: BlockKind) -> bool {
        let Some(&first) = ids.first() else {
            return false;
        };
        let Some(path) = self.path_to(first) else {
            return false;
        };
        let container_id = self.fresh_id();
        let parent_path = path[..path.len() - 1].to_vec();
        let start = path[path.len() - 1];
        let siblings = self.siblings_mut(&parent_path);
        if start + ids.len() > siblings.len() {
            return false;
        }
        for (offset, &id) in ids.iter().enumerate() {
            if siblings[start + offset].id != id {
                return false;
            }
        }
        let wrapped: Vec<Block> = siblings.drain(start..start + ids.len()).collect();
        siblings.insert(start, Block::container(container_id, kind, wrapped));
        true
    }

    /// Remove the nearest enclosing container of the given kind around `id`,
    /// lifting the branch holding `id` one level up. Siblings before and
    /// after the branch stay wrapped in clones of the container. No-op when
    /// no such ancestor exists.
    pub fn unwrap_block(&mut self, id: NodeId, kind: BlockKind) -> bool {
        let Some(path) = self.path_to(id) else {
            return false;
        };
        let Some(anc_k) = (1..path.len())
            .rev()
            .find(|&k| self.block_at(&path[..k]).kind == kind)
        else {
            return false;
        };
        let before_id = self.fresh_id();
        let after_id = self.fresh_id();
        let child_idx = path[anc_k];
        let anc_idx = path[anc_k - 1];
        let parent_path = path[..anc_k - 1].to_vec();
        let siblings = self.siblings_mut(&parent_path);

        let mut ancestor = siblings.remove(anc_idx);
        let after = ancestor.children.split_off(child_idx + 1);
        let lifted = ancestor.children.pop().expect("path child exists");
        let before = std::mem::take(&mut ancestor.children);

        let mut at = anc_idx;
        if !before.is_empty() {
            siblings.insert(at, Block::container(before_id, kind, before));
            at += 1;
        }
        siblings.insert(at, lifted);
        at += 1;
        if !after.is_empty() {
            siblings.insert(at, Block::container(after_id, kind, after));
        }
        true
    }

    /// Insert a block as the next sibling of `id`, returning the new id
    pub fn insert_after(&mut self, id: NodeId, mut block: Block) -> Option<NodeId> {
        self.assign_ids(&mut block);
        let new_id = block.id;
        let path = self.path_to(id)?;
        let idx = path[path.len() - 1];
        let parent_path = path[..path.len() - 1].to_vec();
        let siblings = self.siblings_mut(&parent_path);
        siblings.insert(idx + 1, block);
        Some(new_id)
    }

    /// Remove a block, pruning any list containers left empty by the removal
    pub fn remove(&mut self, id: NodeId) -> Option<Block> {
        fn remove_in(blocks: &mut Vec<Block>, id: NodeId) -> Option<Block> {
            if let Some(i) = blocks.iter().position(|b| b.id == id) {
                return Some(blocks.remove(i));
            }
            let mut removed = None;
            let mut prune = None;
            for (i, block) in blocks.iter_mut().enumerate() {
                if let Some(r) = remove_in(&mut block.children, id) {
                    if block.kind.is_list_container() && block.children.is_empty() {
                        prune = Some(i);
                    }
                    removed = Some(r);
                    break;
                }
            }
            if let Some(i) = prune {
                blocks.remove(i);
            }
            removed
        }
        remove_in(&mut self.blocks, id)
    }

    /// Structural repairs:
    /// - an empty document becomes a single empty paragraph
    /// - list items outside a list container become paragraphs
    /// - list containers left without children are dropped
    /// - the last top-level block must be a paragraph
    pub fn normalize(&mut self) {
        fn repair(blocks: &mut Vec<Block>, parent_is_list: bool) {
            for block in blocks.iter_mut() {
                if block.kind == BlockKind::ListItem && !parent_is_list {
                    block.kind = BlockKind::Paragraph;
                }
                let is_list = block.kind.is_list_container();
                repair(&mut block.children, is_list);
            }
            blocks.retain(|b| !(b.kind.is_list_container() && b.children.is_empty()));
        }
        repair(&mut self.blocks, false);

        // Snapshots written by other tools may omit next_id
        fn max_id(blocks: &[Block]) -> NodeId {
            blocks
                .iter()
                .map(|b| b.id.max(max_id(&b.children)))
                .max()
                .unwrap_or(0)
        }
        let highest = max_id(&self.blocks);
        if self.next_id <= highest {
            self.next_id = highest + 1;
        }

        if self.blocks.is_empty() {
            let id = self.fresh_id();
            self.blocks.push(Block::paragraph(id));
        }
        if self.blocks.last().map(|b| b.kind) != Some(BlockKind::Paragraph) {
            let id = self.fresh_id();
            self.blocks.push(Block::paragraph(id));
        }
    }

    pub fn to_plain_text(&self) -> String {
        let leaves = self.leaves();
        leaves
            .iter()
            .filter_map(|&id| self.find(id))
            .map(|b| b.to_plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_blocks(f: &mut fmt::Formatter<'_>, blocks: &[Block], depth: usize) -> fmt::Result {
            for block in blocks {
                let pad = "  ".repeat(depth + 1);
                match block.kind {
                    BlockKind::BulletedList => {
                        writeln!(f, "{pad}BulletedList:")?;
                        write_blocks(f, &block.children, depth + 1)?;
                    }
                    BlockKind::NumberedList => {
                        writeln!(f, "{pad}NumberedList:")?;
                        write_blocks(f, &block.children, depth + 1)?;
                    }
                    BlockKind::Image => {
                        writeln!(f, "{pad}Image({:?})", block.src.as_deref().unwrap_or(""))?;
                    }
                    kind => {
                        let name = match kind {
                            BlockKind::Paragraph => "Paragraph",
                            BlockKind::HeadingOne => "HeadingOne",
                            BlockKind::HeadingTwo => "HeadingTwo",
                            BlockKind::BlockQuote => "BlockQuote",
                            BlockKind::ListItem => "ListItem",
                            _ => unreachable!(),
                        };
                        writeln!(f, "{pad}{}: {:?}", name, block.to_plain_text())?;
                    }
                }
            }
            Ok(())
        }
        writeln!(f, "Document ({} blocks):", self.blocks.len())?;
        write_blocks(f, &self.blocks, 0)
    }
}
