use multiedit_core::SourceId;
use serde::Serialize;

use crate::record::Record;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Read-only view of one source's record list for a consolidation pass.
#[derive(Debug)]
pub struct SourceView<'a, T> {
    pub id: SourceId,
    /// Host revision of the list at the time the view was taken.
    pub revision: u64,
    pub items: &'a [T],
}

impl<'a, T> SourceView<'a, T> {
    pub fn new(id: SourceId, revision: u64, items: &'a [T]) -> Self {
        Self { id, revision, items }
    }
}

impl<T> Clone for SourceView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SourceView<'_, T> {}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Where a consolidated record lives: source, ordinal position, and the
/// source revision it was observed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BackRef {
    pub source: SourceId,
    pub index: usize,
    pub revision: u64,
}

/// Unified view of records judged equivalent across every source.
///
/// Ephemeral: only valid until the next mutation of any referenced source.
/// Never persist one or use it as an identifier across passes.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "")]
pub struct ConsolidatedEntry<T: Record> {
    pub canonical: T::View,
    /// Name of the tier that produced this entry.
    pub tier: &'static str,
    /// One reference per participating source, in source order.
    pub references: Vec<BackRef>,
}

impl<T: Record> ConsolidatedEntry<T> {
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn reference_for(&self, source: SourceId) -> Option<&BackRef> {
        self.references.iter().find(|r| r.source == source)
    }
}

/// Full result of one consolidation pass.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "")]
pub struct ConsolidationReport<T: Record> {
    pub source_count: usize,
    pub entries: Vec<ConsolidatedEntry<T>>,
    /// Records not matched across all sources by any tier. Read-only: they
    /// are reported so a presenter can say the selection differs, but they
    /// are never editable through the unified view.
    pub unmatched: Vec<BackRef>,
}

impl<T: Record> ConsolidationReport<T> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry counts per tier name, in pipeline discovery order.
    pub fn tier_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for entry in &self.entries {
            match counts.iter_mut().find(|(name, _)| *name == entry.tier) {
                Some((_, n)) => *n += 1,
                None => counts.push((entry.tier, 1)),
            }
        }
        counts
    }
}
