//! Undo/redo history of document states

use document_model::{Document, Position};

/// Snapshot for undo/redo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub document: Document,
    pub caret: Option<Position>,
}

/// Bounded undo and redo stacks
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Records the state before an edit
    pub fn record(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        // New edits invalidate the redo branch
        self.redo_stack.clear();

        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Swaps `current` for the previous state
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
