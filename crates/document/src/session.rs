//! Editor session state that outlives one consolidation pass: the
//! copy/paste clipboard.

use multiedit_core::SourceId;
use multiedit_engine::{
    BatchMutator, Condition, ConsolidatedEntry, EditHost, EngineError, MutationReport,
    ParameterAction, Record, SourceStore,
};

/// Record types the clipboard can hold.
pub trait Clipboard: Record {
    fn slot(session: &EditSession) -> &Vec<Self>;
    fn slot_mut(session: &mut EditSession) -> &mut Vec<Self>;
}

impl Clipboard for Condition {
    fn slot(session: &EditSession) -> &Vec<Self> {
        &session.conditions
    }

    fn slot_mut(session: &mut EditSession) -> &mut Vec<Self> {
        &mut session.conditions
    }
}

impl Clipboard for ParameterAction {
    fn slot(session: &EditSession) -> &Vec<Self> {
        &session.actions
    }

    fn slot_mut(session: &mut EditSession) -> &mut Vec<Self> {
        &mut session.actions
    }
}

/// Holds one clipboard per record schema.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    conditions: Vec<Condition>,
    actions: Vec<ParameterAction>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the records behind `entries` into the clipboard, replacing what
    /// it held. Each entry contributes the full record behind its first
    /// reference, so fields the canonical view leaves open are copied too.
    pub fn copy<T, H>(&mut self, host: &H, entries: &[ConsolidatedEntry<T>]) -> Result<usize, EngineError>
    where
        T: Clipboard,
        H: SourceStore<T>,
    {
        let mut copied = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(r) = entry.references.first() else {
                continue;
            };
            let stale = |found_revision| EngineError::StaleReference {
                source: r.source,
                index: r.index,
                expected_revision: r.revision,
                found_revision,
            };
            let view = host.source(r.source).ok_or_else(|| stale(None))?;
            if view.revision != r.revision {
                return Err(stale(Some(view.revision)));
            }
            let item = view
                .items
                .get(r.index)
                .ok_or_else(|| stale(Some(view.revision)))?;
            copied.push(item.clone());
        }

        let count = copied.len();
        *T::slot_mut(self) = copied;
        log::debug!("copied {count} {} record(s)", T::SCHEMA);
        Ok(count)
    }

    pub fn clipboard<T: Clipboard>(&self) -> &[T] {
        T::slot(self)
    }

    /// Append the clipboard, in copy order, to every target source.
    pub fn paste<T, H>(
        &self,
        mutator: &mut BatchMutator<'_, H>,
        targets: &[SourceId],
    ) -> Result<MutationReport, EngineError>
    where
        T: Clipboard,
        H: EditHost<T>,
    {
        mutator.append(targets, self.clipboard::<T>())
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
        self.actions.clear();
    }
}
