//! Embedded object management
//!
//! Images and tables are atomic units: inserted whole, selected whole and
//! deleted whole. The manager holds the one selected object, so selecting
//! a second object necessarily deselects the first.

use document_model::{
    Document, EmbeddedObject, Image, ObjectContent, ObjectId, ObjectKind, Position, Table,
    TextRange,
};

use crate::error::{EditorError, EditorResult};

/// Validates requested table dimensions against `max`
pub fn table_dimensions(rows: i64, cols: i64, max: u32) -> EditorResult<(usize, usize)> {
    let in_range = |n: i64| n > 0 && n <= i64::from(max);
    if !in_range(rows) || !in_range(cols) {
        return Err(EditorError::InvalidDimension { rows, cols });
    }
    Ok((rows as usize, cols as usize))
}

/// Result of a selection change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub selected: ObjectId,
    /// Object that lost the selection, if any
    pub deselected: Option<ObjectId>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ObjectManager {
    selected: Option<ObjectId>,
}

impl ObjectManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selected == Some(id)
    }

    /// The delete affordance is shown exactly when an object is selected
    pub fn delete_affordance(&self) -> Option<ObjectId> {
        self.selected
    }

    /// Replaces `at` with an inline image and returns its id with the caret
    /// slot right after it.
    pub fn insert_image(
        &mut self,
        document: &mut Document,
        at: TextRange,
        image: Image,
    ) -> EditorResult<(ObjectId, Position)> {
        let mut working = document.clone();
        let removed = working.delete_range(at)?;
        let object = EmbeddedObject::image(image);
        let id = object.id;
        let caret = working.insert_inline_object(at.start(), object)?;
        *document = working;
        self.forget_removed(&removed);
        Ok((id, caret))
    }

    /// Replaces `at` with a block-level table and returns its id with the
    /// caret slot at the start of the following block.
    pub fn insert_table(
        &mut self,
        document: &mut Document,
        at: TextRange,
        rows: usize,
        cols: usize,
    ) -> EditorResult<(ObjectId, Position)> {
        let mut working = document.clone();
        let removed = working.delete_range(at)?;
        let object = EmbeddedObject::table(Table::new(rows, cols));
        let id = object.id;
        let caret = working.insert_block_object(at.start(), object)?;
        *document = working;
        self.forget_removed(&removed);
        Ok((id, caret))
    }

    /// Selects `id`, deselecting whatever was selected before.
    pub fn select(&mut self, document: &Document, id: ObjectId) -> EditorResult<SelectionChange> {
        if document.locate_object(id).is_none() {
            return Err(EditorError::ObjectNotFound(id));
        }
        let previous = self.selected.replace(id);
        Ok(SelectionChange {
            selected: id,
            deselected: previous.filter(|prev| *prev != id),
        })
    }

    /// Clears the selection if `id` is the selected object.
    pub fn deselect(&mut self, id: ObjectId) -> bool {
        if self.selected == Some(id) {
            self.selected = None;
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) -> Option<ObjectId> {
        self.selected.take()
    }

    /// Removes an object, clearing the selection first when it is the
    /// selected one. Returns the object and the caret slot it leaves.
    pub fn delete(
        &mut self,
        document: &mut Document,
        id: ObjectId,
    ) -> EditorResult<(EmbeddedObject, Position)> {
        if document.locate_object(id).is_none() {
            return Err(EditorError::ObjectNotFound(id));
        }
        self.deselect(id);
        Ok(document.remove_object(id)?)
    }

    /// Changes an image's display size
    pub fn resize_image(
        &self,
        document: &mut Document,
        id: ObjectId,
        width: u32,
        height: u32,
    ) -> EditorResult<()> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidValue(format!(
                "image size {}x{}",
                width, height
            )));
        }
        let object = document
            .object_mut(id)
            .ok_or(EditorError::ObjectNotFound(id))?;
        match &mut object.content {
            ObjectContent::Image(image) => {
                image.display_width = width;
                image.display_height = height;
                Ok(())
            }
            ObjectContent::Table(_) => Err(EditorError::InvalidValue(format!(
                "{} is a {}, not an image",
                id,
                ObjectKind::Table
            ))),
        }
    }

    /// Drops the selection if the selected object is among `removed`
    pub fn forget_removed(&mut self, removed: &[EmbeddedObject]) {
        if let Some(selected) = self.selected {
            if removed.iter().any(|object| object.id == selected) {
                self.selected = None;
            }
        }
    }

    /// Drops the selection if the selected object left the document
    pub fn reconcile(&mut self, document: &Document) {
        if let Some(selected) = self.selected {
            if document.locate_object(selected).is_none() {
                self.selected = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Image {
        Image {
            source: "data:image/png;base64,AA==".into(),
            mime: "image/png".into(),
            display_width: 300,
            display_height: 200,
        }
    }

    #[test]
    fn test_table_dimensions() {
        assert_eq!(table_dimensions(2, 3, 50).unwrap(), (2, 3));
        for (rows, cols) in [(0, 3), (3, 0), (-1, 2), (51, 1)] {
            assert!(matches!(
                table_dimensions(rows, cols, 50),
                Err(EditorError::InvalidDimension { .. })
            ));
        }
    }

    #[test]
    fn test_insert_table_grid() {
        let mut doc = Document::new();
        let mut manager = ObjectManager::new();
        let (id, caret) = manager
            .insert_table(&mut doc, TextRange::collapsed(Position::zero()), 2, 2)
            .unwrap();

        let table = doc.object(id).and_then(EmbeddedObject::as_table).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.col_count(), 2);
        assert_eq!(table.cells().count(), 4);
        assert!(table.cells().all(|cell| cell.is_empty()));
        assert_eq!(caret, Position::new(1, 0));
    }

    #[test]
    fn test_insert_image_replaces_selection() {
        let mut doc = Document::from_plain_text("hello world");
        let mut manager = ObjectManager::new();
        let range = TextRange::new(Position::new(0, 5), Position::new(0, 11));
        let (id, caret) = manager.insert_image(&mut doc, range, image()).unwrap();

        assert_eq!(doc.plain_text(), "hello");
        assert_eq!(caret, Position::new(0, 6));
        assert_eq!(doc.position_after(id), Some(caret));
    }

    #[test]
    fn test_failed_insert_leaves_document() {
        let mut doc = Document::from_plain_text("abc");
        let before = doc.clone();
        let mut manager = ObjectManager::new();
        let bad = TextRange::collapsed(Position::new(4, 0));
        assert!(manager.insert_image(&mut doc, bad, image()).is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_selection_exclusive() {
        let mut doc = Document::from_plain_text("ab");
        let mut manager = ObjectManager::new();
        let (a, _) = manager
            .insert_image(&mut doc, TextRange::collapsed(Position::zero()), image())
            .unwrap();
        let (b, _) = manager
            .insert_image(&mut doc, TextRange::collapsed(Position::new(0, 2)), image())
            .unwrap();

        let first = manager.select(&doc, a).unwrap();
        assert_eq!(first.deselected, None);
        let second = manager.select(&doc, b).unwrap();
        assert_eq!(second.deselected, Some(a));
        assert!(manager.is_selected(b));
        assert!(!manager.is_selected(a));

        // Reselecting the same object deselects nothing
        assert_eq!(manager.select(&doc, b).unwrap().deselected, None);
    }

    #[test]
    fn test_deselect_only_selected() {
        let mut doc = Document::new();
        let mut manager = ObjectManager::new();
        let (id, _) = manager
            .insert_table(&mut doc, TextRange::collapsed(Position::zero()), 1, 1)
            .unwrap();
        manager.select(&doc, id).unwrap();
        assert!(!manager.deselect(ObjectId::new()));
        assert_eq!(manager.delete_affordance(), Some(id));
        assert!(manager.deselect(id));
        assert_eq!(manager.delete_affordance(), None);
    }

    #[test]
    fn test_delete_selected() {
        let mut doc = Document::from_plain_text("x");
        let mut manager = ObjectManager::new();
        let (id, _) = manager
            .insert_image(&mut doc, TextRange::collapsed(Position::new(0, 1)), image())
            .unwrap();
        manager.select(&doc, id).unwrap();

        let (removed, caret) = manager.delete(&mut doc, id).unwrap();
        assert_eq!(removed.id, id);
        assert_eq!(caret, Position::new(0, 1));
        assert_eq!(manager.selected(), None);
        assert!(doc.objects().is_empty());
        assert!(matches!(
            manager.delete(&mut doc, id),
            Err(EditorError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_text_deletion_forgets_selection() {
        let mut doc = Document::from_plain_text("ab");
        let mut manager = ObjectManager::new();
        let (id, _) = manager
            .insert_image(&mut doc, TextRange::collapsed(Position::new(0, 1)), image())
            .unwrap();
        manager.select(&doc, id).unwrap();

        let removed = doc
            .delete_range(TextRange::new(Position::zero(), Position::new(0, 3)))
            .unwrap();
        manager.forget_removed(&removed);
        assert_eq!(manager.selected(), None);
    }

    #[test]
    fn test_resize_image() {
        let mut doc = Document::new();
        let mut manager = ObjectManager::new();
        let (img, _) = manager
            .insert_image(&mut doc, TextRange::collapsed(Position::zero()), image())
            .unwrap();
        manager.resize_image(&mut doc, img, 120, 80).unwrap();
        let resized = doc.object(img).and_then(EmbeddedObject::as_image).unwrap();
        assert_eq!((resized.display_width, resized.display_height), (120, 80));

        assert!(manager.resize_image(&mut doc, img, 0, 80).is_err());
        let (table, _) = manager
            .insert_table(&mut doc, TextRange::collapsed(Position::zero()), 1, 1)
            .unwrap();
        assert!(matches!(
            manager.resize_image(&mut doc, table, 10, 10),
            Err(EditorError::InvalidValue(_))
        ));
    }
}
