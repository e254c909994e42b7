//! Embedded objects: images and tables

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::block::{Block, TextBlock};

/// Unique identifier for an embedded object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Creates a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an object ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

/// Kind of embedded object, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Placed inline, occupies one unit of its text block
    Image,
    /// Placed as its own block
    Table,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Image => write!(f, "Image"),
            ObjectKind::Table => write!(f, "Table"),
        }
    }
}

/// An atomic, selectable unit of non-text content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedObject {
    pub id: ObjectId,
    pub content: ObjectContent,
}

impl EmbeddedObject {
    pub fn image(image: Image) -> Self {
        Self {
            id: ObjectId::new(),
            content: ObjectContent::Image(image),
        }
    }

    pub fn table(table: Table) -> Self {
        Self {
            id: ObjectId::new(),
            content: ObjectContent::Table(table),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self.content {
            ObjectContent::Image(_) => ObjectKind::Image,
            ObjectContent::Table(_) => ObjectKind::Table,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match &self.content {
            ObjectContent::Image(image) => Some(image),
            ObjectContent::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match &self.content {
            ObjectContent::Table(table) => Some(table),
            ObjectContent::Image(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectContent {
    Image(Image),
    Table(Table),
}

/// A decoded image ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// `data:` URL holding the encoded bytes
    pub source: String,
    pub mime: String,
    pub display_width: u32,
    pub display_height: u32,
}

/// One table cell; always holds at least one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

impl TableCell {
    pub fn empty() -> Self {
        Self {
            blocks: vec![Block::Text(TextBlock::default())],
        }
    }

    pub fn from_text(text: &str) -> Self {
        let blocks: Vec<Block> = text
            .split('\n')
            .map(|line| Block::Text(TextBlock::from_text(Default::default(), line)))
            .collect();
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| match block {
            Block::Text(text) => text.is_empty(),
            Block::Object(_) => false,
        })
    }

    pub fn plain_text(&self) -> String {
        let lines: Vec<String> = self.blocks.iter().map(Block::plain_text).collect();
        lines.join(" ")
    }
}

impl Default for TableCell {
    fn default() -> Self {
        Self::empty()
    }
}

/// A rectangular grid of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<Vec<TableCell>>,
}

impl Table {
    /// Creates a `rows` x `cols` grid of empty cells
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: (0..rows)
                .map(|_| (0..cols).map(|_| TableCell::empty()).collect())
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<TableCell>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row).and_then(|cells| cells.get_mut(col))
    }

    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.rows.iter().flatten()
    }

    pub fn plain_text(&self) -> String {
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|cells| {
                let cells: Vec<String> = cells.iter().map(TableCell::plain_text).collect();
                cells.join("\t")
            })
            .collect();
        rows.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_unique() {
        assert_ne!(ObjectId::new(), ObjectId::new());
    }

    #[test]
    fn test_table_grid() {
        let table = Table::new(2, 3);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.col_count(), 3);
        assert_eq!(table.cells().count(), 6);
        assert!(table.cells().all(TableCell::is_empty));
        assert!(table.cell(1, 2).is_some());
        assert!(table.cell(2, 0).is_none());
    }

    #[test]
    fn test_table_plain_text() {
        let mut table = Table::new(2, 2);
        *table.cell_mut(0, 0).unwrap() = TableCell::from_text("a");
        *table.cell_mut(1, 1).unwrap() = TableCell::from_text("d");
        assert_eq!(table.plain_text(), "a\t\n\td");
    }

    #[test]
    fn test_object_kind() {
        let table = EmbeddedObject::table(Table::new(1, 1));
        assert_eq!(table.kind(), ObjectKind::Table);
        assert!(table.as_table().is_some());
        assert!(table.as_image().is_none());
    }
}
