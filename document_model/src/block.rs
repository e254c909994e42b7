//! Blocks, inline content and run-level editing

use serde::{Deserialize, Serialize};

use crate::object::{EmbeddedObject, ObjectId};
use crate::style::InlineStyle;
use crate::OBJECT_REPLACEMENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Paragraph,
    Heading {
        level: u8,
    },
    ListItem {
        ordered: bool,
    },
}

/// Maximum indent level a block can reach
pub const MAX_INDENT: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockFormat {
    pub kind: BlockKind,
    #[serde(default)]
    pub align: Alignment,
    #[serde(default)]
    pub indent: u8,
}

impl BlockFormat {
    /// Format of the block created when this one is split by Enter
    pub fn split_successor(self) -> Self {
        match self.kind {
            BlockKind::Heading { .. } => BlockFormat {
                kind: BlockKind::Paragraph,
                ..self
            },
            BlockKind::Paragraph | BlockKind::ListItem { .. } => self,
        }
    }
}

/// A run of uniformly styled text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "InlineStyle::is_default")]
    pub style: InlineStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: InlineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, InlineStyle::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text(TextRun),
    Object(EmbeddedObject),
}

impl Inline {
    /// Length in units
    pub fn len(&self) -> usize {
        match self {
            Inline::Text(run) => run.text.chars().count(),
            Inline::Object(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Text(TextBlock),
    Object(EmbeddedObject),
}

impl Block {
    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            Block::Text(text) => Some(text),
            Block::Object(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Block::Text(text) => Some(text),
            Block::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&EmbeddedObject> {
        match self {
            Block::Object(object) => Some(object),
            Block::Text(_) => None,
        }
    }

    pub fn plain_text(&self) -> String {
        match self {
            Block::Text(text) => text.plain_text(),
            Block::Object(object) => object
                .as_table()
                .map(|table| table.plain_text())
                .unwrap_or_default(),
        }
    }
}

/// Paragraph, heading or list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub format: BlockFormat,
    pub inlines: Vec<Inline>,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self::from_text(BlockFormat::default(), "")
    }
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(ix, _)| ix)
        .unwrap_or(text.len())
}

impl TextBlock {
    pub fn from_text(format: BlockFormat, text: &str) -> Self {
        Self {
            format,
            inlines: vec![Inline::Text(TextRun::plain(text))],
        }
    }

    pub fn with_inlines(format: BlockFormat, inlines: Vec<Inline>) -> Self {
        let mut block = Self { format, inlines };
        block.normalize();
        block
    }

    /// Length in units
    pub fn len(&self) -> usize {
        self.inlines.iter().map(Inline::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text with objects left out
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for inline in &self.inlines {
            if let Inline::Text(run) = inline {
                out.push_str(&run.text);
            }
        }
        out
    }

    /// Text where each inline object is one replacement character, so char
    /// offsets line up with unit offsets.
    pub fn unit_text(&self) -> String {
        let mut out = String::new();
        for inline in &self.inlines {
            match inline {
                Inline::Text(run) => out.push_str(&run.text),
                Inline::Object(_) => out.push(OBJECT_REPLACEMENT),
            }
        }
        out
    }

    pub fn objects(&self) -> impl Iterator<Item = &EmbeddedObject> {
        self.inlines.iter().filter_map(|inline| match inline {
            Inline::Object(object) => Some(object),
            Inline::Text(_) => None,
        })
    }

    /// Unit offset of an inline object
    pub fn object_offset(&self, id: ObjectId) -> Option<usize> {
        let mut pos = 0;
        for inline in &self.inlines {
            if let Inline::Object(object) = inline {
                if object.id == id {
                    return Some(pos);
                }
            }
            pos += inline.len();
        }
        None
    }

    /// Merges equal-style neighbours and drops empty runs, keeping one empty
    /// run when nothing else is left.
    pub fn normalize(&mut self) {
        let mut normalized: Vec<Inline> = Vec::with_capacity(self.inlines.len());

        for inline in self.inlines.drain(..) {
            match inline {
                Inline::Text(run) => {
                    if run.text.is_empty() {
                        continue;
                    }
                    if let Some(Inline::Text(prev)) = normalized.last_mut() {
                        if prev.style == run.style {
                            prev.text.push_str(&run.text);
                            continue;
                        }
                    }
                    normalized.push(Inline::Text(run));
                }
                object => normalized.push(object),
            }
        }

        if normalized.is_empty() {
            normalized.push(Inline::Text(TextRun::plain("")));
        }

        self.inlines = normalized;
    }

    /// Splits the run straddling `offset` and returns the index of the first
    /// inline starting at or after it.
    fn boundary_at(&mut self, offset: usize) -> usize {
        let mut pos = 0;
        for ix in 0..self.inlines.len() {
            if pos == offset {
                return ix;
            }
            let len = self.inlines[ix].len();
            if offset < pos + len {
                if let Inline::Text(run) = &mut self.inlines[ix] {
                    let split = byte_index(&run.text, offset - pos);
                    let tail = run.text.split_off(split);
                    let style = run.style.clone();
                    self.inlines
                        .insert(ix + 1, Inline::Text(TextRun::new(tail, style)));
                }
                return ix + 1;
            }
            pos += len;
        }
        self.inlines.len()
    }

    /// Style a character typed at `offset` would take.
    pub fn style_at(&self, offset: usize) -> InlineStyle {
        let mut pos = 0;
        let mut following: Option<&InlineStyle> = None;
        for inline in &self.inlines {
            let len = inline.len();
            if let Inline::Text(run) = inline {
                if len > 0 {
                    if offset > pos && offset <= pos + len {
                        return run.style.clone();
                    }
                    if pos >= offset && following.is_none() {
                        following = Some(&run.style);
                    }
                }
            }
            pos += len;
        }
        if offset == 0 {
            following.cloned().unwrap_or_default()
        } else {
            InlineStyle::default()
        }
    }

    pub fn insert_text(&mut self, offset: usize, text: &str, style: InlineStyle) {
        let ix = self.boundary_at(offset);
        self.inlines
            .insert(ix, Inline::Text(TextRun::new(text, style)));
        self.normalize();
    }

    pub fn insert_inline(&mut self, offset: usize, inline: Inline) {
        let ix = self.boundary_at(offset);
        self.inlines.insert(ix, inline);
        self.normalize();
    }

    /// Removes `[start, end)` and returns what was removed.
    pub fn delete(&mut self, start: usize, end: usize) -> Vec<Inline> {
        if start >= end {
            return Vec::new();
        }
        let a = self.boundary_at(start);
        let b = self.boundary_at(end);
        let removed: Vec<Inline> = self.inlines.drain(a..b).collect();
        self.normalize();
        removed
    }

    /// Detaches everything after `offset`.
    pub fn split_off(&mut self, offset: usize) -> Vec<Inline> {
        let ix = self.boundary_at(offset);
        let tail = self.inlines.split_off(ix);
        self.normalize();
        tail
    }

    /// Appends inlines at the end, merging styles where possible.
    pub fn append(&mut self, inlines: Vec<Inline>) {
        self.inlines.extend(inlines);
        self.normalize();
    }

    /// Applies `f` to every run style in `[start, end)`.
    pub fn update_style(&mut self, start: usize, end: usize, mut f: impl FnMut(&mut InlineStyle)) {
        if start >= end {
            return;
        }
        let a = self.boundary_at(start);
        let b = self.boundary_at(end);
        for inline in &mut self.inlines[a..b] {
            if let Inline::Text(run) = inline {
                f(&mut run.style);
            }
        }
        self.normalize();
    }

    /// Styles of the non-empty runs overlapping `[start, end)`.
    pub fn styles_in(&self, start: usize, end: usize) -> Vec<&InlineStyle> {
        let mut out = Vec::new();
        let mut pos = 0;
        for inline in &self.inlines {
            let len = inline.len();
            if let Inline::Text(run) = inline {
                if len > 0 && pos < end && pos + len > start {
                    out.push(&run.style);
                }
            }
            pos += len;
        }
        out
    }

    /// Extent of the contiguous link covering the character at `offset`
    /// (or the one just before it).
    pub fn link_span_at(&self, offset: usize) -> Option<(usize, usize)> {
        let mut spans: Vec<(usize, usize, Option<&str>)> = Vec::new();
        let mut pos = 0;
        for inline in &self.inlines {
            let len = inline.len();
            let link = match inline {
                Inline::Text(run) => run.style.link.as_deref(),
                Inline::Object(_) => None,
            };
            spans.push((pos, pos + len, link));
            pos += len;
        }

        let hit = spans.iter().position(|&(start, end, link)| {
            link.is_some() && ((start <= offset && offset < end) || (offset > start && offset == end))
        })?;
        let target = spans[hit].2;

        let mut first = hit;
        while first > 0 && spans[first - 1].2 == target {
            first -= 1;
        }
        let mut last = hit;
        while last + 1 < spans.len() && spans[last + 1].2 == target {
            last += 1;
        }
        Some((spans[first].0, spans[last].1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Image, ObjectKind};

    fn bold() -> InlineStyle {
        InlineStyle {
            bold: true,
            ..Default::default()
        }
    }

    fn image() -> EmbeddedObject {
        EmbeddedObject::image(Image {
            source: "data:image/png;base64,AA==".into(),
            mime: "image/png".into(),
            display_width: 10,
            display_height: 10,
        })
    }

    #[test]
    fn test_default_block_is_single_empty_run() {
        let block = TextBlock::default();
        assert_eq!(block.inlines.len(), 1);
        assert!(block.is_empty());
    }

    #[test]
    fn test_insert_text_merges_equal_styles() {
        let mut block = TextBlock::from_text(BlockFormat::default(), "held");
        block.insert_text(3, "lo wor", InlineStyle::default());
        assert_eq!(block.plain_text(), "hello world");
        assert_eq!(block.inlines.len(), 1);
    }

    #[test]
    fn test_update_style_splits_runs() {
        let mut block = TextBlock::from_text(BlockFormat::default(), "hello world");
        block.update_style(0, 5, |style| style.bold = true);
        assert_eq!(block.inlines.len(), 2);
        assert_eq!(block.styles_in(0, 5), vec![&bold()]);
        assert_eq!(block.styles_in(5, 11), vec![&InlineStyle::default()]);
    }

    #[test]
    fn test_delete_multibyte() {
        let mut block = TextBlock::from_text(BlockFormat::default(), "héllo wörld");
        block.delete(1, 7);
        assert_eq!(block.plain_text(), "hörld");
    }

    #[test]
    fn test_delete_everything_leaves_empty_run() {
        let mut block = TextBlock::from_text(BlockFormat::default(), "abc");
        block.delete(0, 3);
        assert!(block.is_empty());
        assert_eq!(block.inlines.len(), 1);
    }

    #[test]
    fn test_inline_object_counts_as_one_unit() {
        let mut block = TextBlock::from_text(BlockFormat::default(), "ab");
        let object = image();
        let id = object.id;
        block.insert_inline(1, Inline::Object(object));
        assert_eq!(block.len(), 3);
        assert_eq!(block.plain_text(), "ab");
        assert_eq!(block.unit_text(), "a\u{FFFC}b");
        assert_eq!(block.object_offset(id), Some(1));
        assert_eq!(block.objects().next().map(|o| o.kind()), Some(ObjectKind::Image));

        let removed = block.delete(1, 2);
        assert_eq!(removed.len(), 1);
        assert_eq!(block.plain_text(), "ab");
        assert_eq!(block.inlines.len(), 1);
    }

    #[test]
    fn test_split_off() {
        let mut block = TextBlock::from_text(BlockFormat::default(), "hello");
        let tail = block.split_off(2);
        assert_eq!(block.plain_text(), "he");
        let tail = TextBlock::with_inlines(BlockFormat::default(), tail);
        assert_eq!(tail.plain_text(), "llo");
    }

    #[test]
    fn test_style_at_follows_preceding_character() {
        let mut block = TextBlock::from_text(BlockFormat::default(), "abcd");
        block.update_style(0, 2, |style| style.bold = true);
        assert_eq!(block.style_at(2), bold());
        assert_eq!(block.style_at(3), InlineStyle::default());
        assert_eq!(block.style_at(0), bold());
    }

    #[test]
    fn test_split_successor() {
        let heading = BlockFormat {
            kind: BlockKind::Heading { level: 2 },
            align: Alignment::Center,
            indent: 1,
        };
        let next = heading.split_successor();
        assert_eq!(next.kind, BlockKind::Paragraph);
        assert_eq!(next.align, Alignment::Center);

        let item = BlockFormat {
            kind: BlockKind::ListItem { ordered: true },
            ..Default::default()
        };
        assert_eq!(item.split_successor(), item);
    }

    #[test]
    fn test_link_span_at() {
        let mut block = TextBlock::from_text(BlockFormat::default(), "go here now");
        block.update_style(3, 7, |style| style.link = Some("https://x.test".into()));
        block.update_style(3, 5, |style| style.bold = true);
        assert_eq!(block.link_span_at(4), Some((3, 7)));
        assert_eq!(block.link_span_at(7), Some((3, 7)));
        assert_eq!(block.link_span_at(1), None);
    }
}
