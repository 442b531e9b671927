//! Collaborators the engine is given by the host document model.
//!
//! The engine never owns sources. It reads them through [`SourceStore`],
//! asks the store to apply item writes, wraps every write in a host
//! transaction, and asks for a redraw afterwards.

use multiedit_core::{ObjectKind, SourceId};

use crate::error::EngineError;
use crate::model::SourceView;
use crate::record::Record;

/// Owner of record lists of schema `T`.
///
/// Every successful write must bump the source's revision so back-references
/// taken before the write are detected as stale.
pub trait SourceStore<T> {
    fn source(&self, id: SourceId) -> Option<SourceView<'_, T>>;

    fn replace_item(&mut self, id: SourceId, index: usize, item: T) -> Result<(), EngineError>;

    fn insert_item(&mut self, id: SourceId, index: usize, item: T) -> Result<(), EngineError>;

    fn remove_item(&mut self, id: SourceId, index: usize) -> Result<T, EngineError>;

    /// Append and return the new item's index.
    fn push_item(&mut self, id: SourceId, item: T) -> Result<usize, EngineError> {
        let len = self
            .source(id)
            .map(|s| s.items.len())
            .ok_or(EngineError::UnknownSource(id))?;
        self.insert_item(id, len, item)?;
        Ok(len)
    }
}

/// Current selection of document objects.
pub trait SelectionProvider {
    /// Selected objects of `kind`, in selection order.
    fn selected(&self, kind: ObjectKind) -> Vec<SourceId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionToken(pub u64);

/// Dirty-marking and undo grouping.
///
/// One user action opens one transaction; every source is recorded before
/// it is first written so the host can snapshot it for undo.
pub trait TransactionSink {
    fn begin_transaction(&mut self, label: &str) -> TransactionToken;

    /// Called before `source` is written inside the open transaction.
    fn record_mutation(&mut self, source: SourceId);

    fn commit(&mut self, token: TransactionToken);

    /// Drop the open transaction. The engine has already restored every
    /// record it wrote, so nothing needs to be undone.
    fn abandon(&mut self, token: TransactionToken);
}

/// Tells the presentation layer to re-read consolidation output.
pub trait RedrawTrigger {
    fn request_redraw(&mut self);
}

/// Everything the batch mutator needs from the host.
pub trait EditHost<T>: SourceStore<T> + TransactionSink + RedrawTrigger {}

impl<T, H> EditHost<T> for H where H: SourceStore<T> + TransactionSink + RedrawTrigger {}

/// Views of the currently selected sources for schema `T`, in selection
/// order. Selected ids the store doesn't know are skipped.
pub fn selected_sources<T, H>(host: &H) -> Vec<SourceView<'_, T>>
where
    T: Record,
    H: SourceStore<T> + SelectionProvider,
{
    host.selected(T::OBJECT_KIND)
        .into_iter()
        .filter_map(|id| {
            let view = host.source(id);
            if view.is_none() {
                log::warn!("selected {} {id} has no {} list", T::OBJECT_KIND, T::SCHEMA);
            }
            view
        })
        .collect()
}
