//! The document tree and its structural edit operations

use thiserror::Error;

use crate::block::{Block, BlockFormat, BlockKind, Inline, TextBlock};
use crate::object::{EmbeddedObject, ObjectContent, ObjectId, TableCell};
use crate::position::{Position, TextRange};
use crate::style::InlineStyle;
use crate::OBJECT_REPLACEMENT;

/// Document model error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid position: block {block}, offset {offset}")]
    InvalidPosition { block: usize, offset: usize },

    #[error("Block {0} is not a text block")]
    NotTextBlock(usize),

    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Where an object sits in the top-level block sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectLocation {
    /// The object is the block at this index
    Block(usize),
    /// The object is an inline unit inside a text block
    Inline(Position),
}

/// An ordered, never-empty sequence of blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            blocks: vec![Block::Text(TextBlock::default())],
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut document = Self { blocks };
        document.ensure_invariants();
        document
    }

    /// One paragraph per line
    pub fn from_plain_text(text: &str) -> Self {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let blocks = text
            .split('\n')
            .map(|line| Block::Text(TextBlock::from_text(BlockFormat::default(), line)))
            .collect();
        Self::from_blocks(blocks)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, ix: usize) -> Option<&Block> {
        self.blocks.get(ix)
    }

    pub fn text_block(&self, ix: usize) -> Option<&TextBlock> {
        self.blocks.get(ix).and_then(Block::as_text)
    }

    /// True for the default single empty paragraph
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Keeps at least one block and a text block at the end, so there is
    /// always somewhere to put the caret after the last object.
    fn ensure_invariants(&mut self) {
        if !matches!(self.blocks.last(), Some(Block::Text(_))) {
            self.blocks.push(Block::Text(TextBlock::default()));
        }
    }

    fn text_block_mut(&mut self, ix: usize) -> ModelResult<&mut TextBlock> {
        match self.blocks.get_mut(ix) {
            Some(Block::Text(text)) => Ok(text),
            Some(Block::Object(_)) => Err(ModelError::NotTextBlock(ix)),
            None => Err(ModelError::InvalidPosition {
                block: ix,
                offset: 0,
            }),
        }
    }

    /// Checks that `pos` addresses a caret slot inside a text block.
    pub fn validate_position(&self, pos: Position) -> ModelResult<Position> {
        match self.blocks.get(pos.block) {
            Some(Block::Text(text)) if pos.offset <= text.len() => Ok(pos),
            Some(Block::Object(_)) => Err(ModelError::NotTextBlock(pos.block)),
            _ => Err(ModelError::InvalidPosition {
                block: pos.block,
                offset: pos.offset,
            }),
        }
    }

    pub fn validate_range(&self, range: TextRange) -> ModelResult<TextRange> {
        self.validate_position(range.start())?;
        self.validate_position(range.end())?;
        Ok(range)
    }

    /// Pulls an out-of-range offset back to the end of its block. Returns
    /// `None` when the block does not exist or holds an object.
    pub fn clamp_position(&self, pos: Position) -> Option<Position> {
        let text = self.text_block(pos.block)?;
        Some(Position::new(pos.block, pos.offset.min(text.len())))
    }

    /// Caret slot at the very end of the document
    pub fn end_position(&self) -> Position {
        let block = self.blocks.len().saturating_sub(1);
        let offset = self.text_block(block).map(TextBlock::len).unwrap_or(0);
        Position::new(block, offset)
    }

    /// Per-block `(block, start, end)` spans of the text blocks a range touches
    fn text_spans(&self, range: TextRange) -> Vec<(usize, usize, usize)> {
        let (start, end) = (range.start(), range.end());
        range
            .blocks()
            .filter_map(|ix| {
                let text = self.text_block(ix)?;
                let from = if ix == start.block { start.offset } else { 0 };
                let to = if ix == end.block { end.offset } else { text.len() };
                Some((ix, from, to))
            })
            .collect()
    }

    /// Inserts text at `pos`; newlines split blocks. Returns the caret after
    /// the inserted text.
    pub fn insert_text(
        &mut self,
        pos: Position,
        text: &str,
        style: InlineStyle,
    ) -> ModelResult<Position> {
        self.validate_position(pos)?;
        let mut caret = pos;
        for (ix, line) in text.split('\n').enumerate() {
            if ix > 0 {
                caret = self.split_block_raw(caret)?;
            }
            if !line.is_empty() {
                self.text_block_mut(caret.block)?
                    .insert_text(caret.offset, line, style.clone());
                caret.offset += line.chars().count();
            }
        }
        Ok(caret)
    }

    fn split_block_raw(&mut self, pos: Position) -> ModelResult<Position> {
        let block = self.text_block_mut(pos.block)?;
        let format = block.format.split_successor();
        let tail = block.split_off(pos.offset);
        self.blocks.insert(
            pos.block + 1,
            Block::Text(TextBlock::with_inlines(format, tail)),
        );
        Ok(Position::new(pos.block + 1, 0))
    }

    /// Enter-key split. An empty list item leaves the list instead of
    /// producing another empty item.
    pub fn split_block(&mut self, pos: Position) -> ModelResult<Position> {
        self.validate_position(pos)?;
        let block = self.text_block_mut(pos.block)?;
        if block.is_empty() && matches!(block.format.kind, BlockKind::ListItem { .. }) {
            block.format.kind = BlockKind::Paragraph;
            return Ok(pos);
        }
        self.split_block_raw(pos)
    }

    /// Removes the content of `range` and returns every object it dropped.
    pub fn delete_range(&mut self, range: TextRange) -> ModelResult<Vec<EmbeddedObject>> {
        self.validate_range(range)?;
        let (start, end) = (range.start(), range.end());
        let mut removed = Vec::new();

        if start.block == end.block {
            let dropped = self
                .text_block_mut(start.block)?
                .delete(start.offset, end.offset);
            collect_objects(dropped, &mut removed);
            return Ok(removed);
        }

        let tail = self.text_block_mut(end.block)?.split_off(end.offset);
        let first = self.text_block_mut(start.block)?;
        let first_len = first.len();
        collect_objects(first.delete(start.offset, first_len), &mut removed);
        first.append(tail);

        for block in self.blocks.drain(start.block + 1..=end.block) {
            match block {
                Block::Text(text) => collect_objects(text.inlines, &mut removed),
                Block::Object(object) => removed.push(object),
            }
        }
        self.ensure_invariants();
        Ok(removed)
    }

    /// Inserts an inline object and returns the caret right after it.
    pub fn insert_inline_object(
        &mut self,
        pos: Position,
        object: EmbeddedObject,
    ) -> ModelResult<Position> {
        self.validate_position(pos)?;
        self.text_block_mut(pos.block)?
            .insert_inline(pos.offset, Inline::Object(object));
        Ok(Position::new(pos.block, pos.offset + 1))
    }

    /// Inserts a block-level object at `pos`, splitting the text block, and
    /// returns the caret at the start of the block that follows it.
    pub fn insert_block_object(
        &mut self,
        pos: Position,
        object: EmbeddedObject,
    ) -> ModelResult<Position> {
        self.validate_position(pos)?;
        if pos.offset == 0 {
            self.blocks.insert(pos.block, Block::Object(object));
            return Ok(Position::new(pos.block + 1, 0));
        }

        let block = self.text_block_mut(pos.block)?;
        let format = block.format;
        let tail = block.split_off(pos.offset);
        self.blocks.insert(pos.block + 1, Block::Object(object));
        self.blocks.insert(
            pos.block + 2,
            Block::Text(TextBlock::with_inlines(format, tail)),
        );
        Ok(Position::new(pos.block + 2, 0))
    }

    pub fn locate_object(&self, id: ObjectId) -> Option<ObjectLocation> {
        self.blocks
            .iter()
            .enumerate()
            .find_map(|(ix, block)| match block {
                Block::Object(object) if object.id == id => Some(ObjectLocation::Block(ix)),
                Block::Object(_) => None,
                Block::Text(text) => text
                    .object_offset(id)
                    .map(|offset| ObjectLocation::Inline(Position::new(ix, offset))),
            })
    }

    /// Caret slot immediately after an object
    pub fn position_after(&self, id: ObjectId) -> Option<Position> {
        match self.locate_object(id)? {
            ObjectLocation::Inline(pos) => Some(Position::new(pos.block, pos.offset + 1)),
            ObjectLocation::Block(ix) => {
                let next = (ix + 1..self.blocks.len())
                    .find(|&candidate| matches!(self.blocks[candidate], Block::Text(_)))?;
                Some(Position::new(next, 0))
            }
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<&EmbeddedObject> {
        self.objects().into_iter().find(|object| object.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut EmbeddedObject> {
        match self.locate_object(id)? {
            ObjectLocation::Block(ix) => match &mut self.blocks[ix] {
                Block::Object(object) => Some(object),
                Block::Text(_) => None,
            },
            ObjectLocation::Inline(pos) => {
                let block = self.blocks[pos.block].as_text_mut()?;
                block.inlines.iter_mut().find_map(|inline| match inline {
                    Inline::Object(object) if object.id == id => Some(object),
                    _ => None,
                })
            }
        }
    }

    /// Every top-level object, in document order
    pub fn objects(&self) -> Vec<&EmbeddedObject> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Object(object) => out.push(object),
                Block::Text(text) => out.extend(text.objects()),
            }
        }
        out
    }

    /// Removes an object and returns it with the caret slot it leaves behind.
    pub fn remove_object(&mut self, id: ObjectId) -> ModelResult<(EmbeddedObject, Position)> {
        let location = self
            .locate_object(id)
            .ok_or(ModelError::ObjectNotFound(id))?;
        match location {
            ObjectLocation::Inline(pos) => {
                let mut removed = self
                    .text_block_mut(pos.block)?
                    .delete(pos.offset, pos.offset + 1);
                match removed.pop() {
                    Some(Inline::Object(object)) => Ok((object, pos)),
                    _ => Err(ModelError::ObjectNotFound(id)),
                }
            }
            ObjectLocation::Block(ix) => {
                let object = match self.blocks.remove(ix) {
                    Block::Object(object) => object,
                    Block::Text(_) => return Err(ModelError::ObjectNotFound(id)),
                };
                self.ensure_invariants();
                let caret = (ix..self.blocks.len())
                    .find(|&candidate| matches!(self.blocks[candidate], Block::Text(_)))
                    .map(|candidate| Position::new(candidate, 0))
                    .unwrap_or_else(|| self.end_position());
                Ok((object, caret))
            }
        }
    }

    /// Applies `f` to the style of every run inside `range`.
    pub fn update_style(
        &mut self,
        range: TextRange,
        mut f: impl FnMut(&mut InlineStyle),
    ) -> ModelResult<()> {
        self.validate_range(range)?;
        for (ix, from, to) in self.text_spans(range) {
            self.text_block_mut(ix)?.update_style(from, to, &mut f);
        }
        Ok(())
    }

    /// True when `range` covers at least one character and every run in it
    /// satisfies `pred`.
    pub fn range_all(&self, range: TextRange, pred: impl Fn(&InlineStyle) -> bool) -> bool {
        let mut seen = false;
        for (ix, from, to) in self.text_spans(range) {
            let Some(text) = self.text_block(ix) else {
                continue;
            };
            for style in text.styles_in(from, to) {
                if !pred(style) {
                    return false;
                }
                seen = true;
            }
        }
        seen
    }

    /// Text blocks touched by `range`, collapsed ranges included
    pub fn text_blocks_in(&self, range: TextRange) -> Vec<&TextBlock> {
        range
            .blocks()
            .filter_map(|ix| self.text_block(ix))
            .collect()
    }

    /// Applies `f` to the format of every text block touched by `range`.
    pub fn update_format(
        &mut self,
        range: TextRange,
        mut f: impl FnMut(&mut BlockFormat),
    ) -> ModelResult<()> {
        self.validate_range(range)?;
        for ix in range.blocks() {
            if let Some(Block::Text(text)) = self.blocks.get_mut(ix) {
                f(&mut text.format);
            }
        }
        Ok(())
    }

    /// Extent of the link under a caret, if any
    pub fn link_range_at(&self, pos: Position) -> Option<TextRange> {
        let (start, end) = self.text_block(pos.block)?.link_span_at(pos.offset)?;
        Some(TextRange::new(
            Position::new(pos.block, start),
            Position::new(pos.block, end),
        ))
    }

    /// Style of a character typed at `pos`
    pub fn style_at(&self, pos: Position) -> InlineStyle {
        self.text_block(pos.block)
            .map(|text| text.style_at(pos.offset))
            .unwrap_or_default()
    }

    /// Next occurrence of `query` starting at `from`, wrapping to the top.
    pub fn find_from(&self, query: &str, from: Position) -> Option<TextRange> {
        if query.is_empty() {
            return None;
        }
        let len = query.chars().count();
        let count = self.blocks.len();
        let start_block = from.block.min(count.saturating_sub(1));

        for step in 0..=count {
            let ix = (start_block + step) % count;
            let Some(text) = self.text_block(ix) else {
                continue;
            };
            let haystack = text.unit_text();
            let from_offset = if step == 0 { from.offset } else { 0 };
            let found = char_find(&haystack, query, from_offset);
            let found = match found {
                // On the wrap-around pass only matches before the start count
                Some(offset) if step == count && offset >= from.offset => None,
                other => other,
            };
            if let Some(offset) = found {
                return Some(TextRange::new(
                    Position::new(ix, offset),
                    Position::new(ix, offset + len),
                ));
            }
            if step == count {
                break;
            }
        }
        None
    }

    /// Replaces every occurrence of `query`; replacement text takes the
    /// style of the first replaced character. A `\n` in the replacement
    /// splits the block the same way typed text does. Queries or
    /// replacements carrying the object placeholder match nothing, so
    /// inline objects are never removed here. Returns the count.
    pub fn replace_all(&mut self, query: &str, replacement: &str) -> usize {
        if query.is_empty()
            || query.contains(OBJECT_REPLACEMENT)
            || replacement.contains(OBJECT_REPLACEMENT)
        {
            return 0;
        }
        let len = query.chars().count();
        let mut total = 0;
        // Back to front so splits never move a pending match
        for index in (0..self.blocks.len()).rev() {
            let Block::Text(text) = &self.blocks[index] else {
                continue;
            };
            let haystack = text.unit_text();
            let mut matches = Vec::new();
            let mut from = 0;
            while let Some(offset) = char_find(&haystack, query, from) {
                matches.push(offset);
                from = offset + len;
            }
            for &offset in matches.iter().rev() {
                let Block::Text(text) = &mut self.blocks[index] else {
                    break;
                };
                let style = text.style_at(offset + 1);
                text.delete(offset, offset + len);
                if !replacement.is_empty()
                    && self
                        .insert_text(Position::new(index, offset), replacement, style)
                        .is_err()
                {
                    break;
                }
            }
            total += matches.len();
        }
        total
    }

    pub fn plain_text(&self) -> String {
        let lines: Vec<String> = self.blocks.iter().map(Block::plain_text).collect();
        lines.join("\n")
    }

    pub fn word_count(&self) -> usize {
        self.plain_text().split_whitespace().count()
    }

    /// Replaces the contents of a table cell.
    pub fn set_cell_text(
        &mut self,
        table: ObjectId,
        row: usize,
        col: usize,
        text: &str,
    ) -> ModelResult<()> {
        let cell = self
            .object_mut(table)
            .and_then(|object| match &mut object.content {
                ObjectContent::Table(table) => table.cell_mut(row, col),
                ObjectContent::Image(_) => None,
            })
            .ok_or(ModelError::ObjectNotFound(table))?;
        *cell = TableCell::from_text(text);
        Ok(())
    }
}

fn collect_objects(inlines: Vec<Inline>, out: &mut Vec<EmbeddedObject>) {
    for inline in inlines {
        if let Inline::Object(object) = inline {
            out.push(object);
        }
    }
}

/// Char offset of `needle` in `haystack` at or after char offset `from`
fn char_find(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let start = haystack
        .char_indices()
        .nth(from)
        .map(|(ix, _)| ix)
        .unwrap_or(haystack.len());
    let found = haystack[start..].find(needle)?;
    Some(from + haystack[start..start + found].chars().count())
}
