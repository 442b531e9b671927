//! Undo/redo history for batch edits.
//!
//! One entry per committed transaction, holding whole-list snapshots of every
//! source the transaction touched.

use multiedit_core::SourceId;

use crate::scene::Snapshot;

#[derive(Clone, Debug, PartialEq)]
pub struct SourceChange {
    pub source: SourceId,
    pub before: Snapshot,
    pub after: Snapshot,
}

#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub label: String,
    pub changes: Vec<SourceChange>,
}

#[derive(Clone, Debug)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: 100,
        }
    }

    /// Record the changes of one transaction as a single undoable operation
    pub fn record_batch(&mut self, label: impl Into<String>, changes: Vec<SourceChange>) {
        if changes.is_empty() {
            return;
        }

        self.undo_stack.push(HistoryEntry {
            label: label.into(),
            changes,
        });
        self.redo_stack.clear();

        if self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the last entry for undo, returns the changes to revert
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(entry.clone());
        Some(entry)
    }

    /// Pop from redo stack, returns the changes to reapply
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(entry.clone());
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Label of the entry `undo` would revert.
    pub fn peek_undo(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.label.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
