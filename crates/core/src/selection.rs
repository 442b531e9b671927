use serde::{Deserialize, Serialize};

use crate::source::SourceId;

/// Ordered set of selected objects.
///
/// Order is click order: the first selected object is the one whose record
/// order drives consolidation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: Vec<SourceId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, dropping repeats (first occurrence wins).
    pub fn from_ids(ids: impl IntoIterator<Item = SourceId>) -> Self {
        let mut selection = Self::new();
        for id in ids {
            selection.add(id);
        }
        selection
    }

    /// Append to the selection. Returns false if already selected.
    pub fn add(&mut self, id: SourceId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: SourceId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|s| *s != id);
        self.ids.len() != before
    }

    /// Ctrl-click semantics: add if absent, remove if present.
    pub fn toggle(&mut self, id: SourceId) {
        if !self.remove(id) {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[SourceId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
