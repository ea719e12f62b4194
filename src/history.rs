//! Undo/redo for the editor.
//!
//! Conversation documents are small, so each history entry is a full
//! snapshot of the document taken before an edit.

use crate::model::Document;

/// Undo/redo history.
///
/// # Example
///
/// ```rust
/// use convedit::history::EditorHistory;
/// use convedit::model::{Document, Node};
///
/// let mut doc = Document::new();
/// let mut history = EditorHistory::new(100);
/// history.push(doc.clone());
/// doc.insert("a", Node::new("hello"));
///
/// let previous = history.undo(doc.clone()).unwrap();
/// assert!(previous.is_empty());
/// assert!(history.redo(previous).unwrap().contains("a"));
/// ```
#[derive(Debug, Clone)]
pub struct EditorHistory {
    undo_stack: Vec<Document>,
    redo_stack: Vec<Document>,
    max_size: usize,
}

impl EditorHistory {
    /// Create a new history with the given maximum undo depth.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Record the state before an edit and clear the redo stack.
    pub fn push(&mut self, before: Document) {
        self.undo_stack.push(before);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
    }

    /// Step back. `current` goes onto the redo stack; the returned document
    /// replaces it. `None` when there is nothing to undo.
    pub fn undo(&mut self, current: Document) -> Option<Document> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: Document) -> Option<Document> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for EditorHistory {
    fn default() -> Self {
        Self::new(200)
    }
}
