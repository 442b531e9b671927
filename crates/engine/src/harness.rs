//! In-memory host for engine tests.
//!
//! `TestHost` owns numbered record lists (ids 1..=N), bumps a revision on
//! every write, and records what the mutator asked of the transaction and
//! redraw collaborators so tests can assert on it.

use multiedit_core::{ObjectKind, SourceId};

use crate::error::EngineError;
use crate::host::{RedrawTrigger, SelectionProvider, SourceStore, TransactionSink, TransactionToken};
use crate::model::SourceView;

pub struct TestHost<T> {
    sources: Vec<(SourceId, u64, Vec<T>)>,
    open: Option<TransactionToken>,
    next_token: u64,
    pending_label: String,
    /// Sources passed to `record_mutation`, in call order.
    pub recorded: Vec<SourceId>,
    /// Labels of committed transactions.
    pub committed: Vec<String>,
    pub abandoned: usize,
    pub redraws: usize,
    /// Writes to this source fail with `UnknownSource`.
    pub fail_writes_to: Option<SourceId>,
}

impl<T: Clone> TestHost<T> {
    pub fn new(lists: Vec<Vec<T>>) -> Self {
        Self {
            sources: lists
                .into_iter()
                .enumerate()
                .map(|(i, items)| (SourceId(i as u64 + 1), 0, items))
                .collect(),
            open: None,
            next_token: 1,
            pending_label: String::new(),
            recorded: Vec::new(),
            committed: Vec::new(),
            abandoned: 0,
            redraws: 0,
            fail_writes_to: None,
        }
    }

    pub fn views(&self) -> Vec<SourceView<'_, T>> {
        self.sources
            .iter()
            .map(|(id, rev, items)| SourceView::new(*id, *rev, items))
            .collect()
    }

    pub fn lists(&self) -> Vec<Vec<T>> {
        self.sources.iter().map(|(_, _, items)| items.clone()).collect()
    }

    fn writable(&mut self, id: SourceId) -> Result<&mut (SourceId, u64, Vec<T>), EngineError> {
        if self.fail_writes_to == Some(id) {
            return Err(EngineError::UnknownSource(id));
        }
        self.sources
            .iter_mut()
            .find(|(sid, _, _)| *sid == id)
            .ok_or(EngineError::UnknownSource(id))
    }
}

impl<T: Clone> SourceStore<T> for TestHost<T> {
    fn source(&self, id: SourceId) -> Option<SourceView<'_, T>> {
        self.sources
            .iter()
            .find(|(sid, _, _)| *sid == id)
            .map(|(sid, rev, items)| SourceView::new(*sid, *rev, items))
    }

    fn replace_item(&mut self, id: SourceId, index: usize, item: T) -> Result<(), EngineError> {
        let (_, rev, items) = self.writable(id)?;
        let slot = items.get_mut(index).ok_or(EngineError::UnknownSource(id))?;
        *slot = item;
        *rev += 1;
        Ok(())
    }

    fn insert_item(&mut self, id: SourceId, index: usize, item: T) -> Result<(), EngineError> {
        let (_, rev, items) = self.writable(id)?;
        if index > items.len() {
            return Err(EngineError::UnknownSource(id));
        }
        items.insert(index, item);
        *rev += 1;
        Ok(())
    }

    fn remove_item(&mut self, id: SourceId, index: usize) -> Result<T, EngineError> {
        let (_, rev, items) = self.writable(id)?;
        if index >= items.len() {
            return Err(EngineError::UnknownSource(id));
        }
        *rev += 1;
        Ok(items.remove(index))
    }
}

impl<T> SelectionProvider for TestHost<T> {
    fn selected(&self, _kind: ObjectKind) -> Vec<SourceId> {
        self.sources.iter().map(|(id, _, _)| *id).collect()
    }
}

impl<T> TransactionSink for TestHost<T> {
    fn begin_transaction(&mut self, label: &str) -> TransactionToken {
        let token = TransactionToken(self.next_token);
        self.next_token += 1;
        self.open = Some(token);
        self.pending_label = label.to_string();
        token
    }

    fn record_mutation(&mut self, source: SourceId) {
        assert!(self.open.is_some(), "mutation recorded outside a transaction");
        self.recorded.push(source);
    }

    fn commit(&mut self, token: TransactionToken) {
        assert_eq!(self.open.take(), Some(token));
        self.committed.push(std::mem::take(&mut self.pending_label));
    }

    fn abandon(&mut self, token: TransactionToken) {
        assert_eq!(self.open.take(), Some(token));
        self.abandoned += 1;
    }
}

impl<T> RedrawTrigger for TestHost<T> {
    fn request_redraw(&mut self) {
        self.redraws += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionMode};
    use crate::host::selected_sources;

    #[test]
    fn writes_bump_revision() {
        let mut host = TestHost::new(vec![vec![Condition::new("A", ConditionMode::If, 0.0)]]);
        assert_eq!(host.views()[0].revision, 0);
        host.push_item(SourceId(1), Condition::new("B", ConditionMode::If, 0.0)).unwrap();
        assert_eq!(host.views()[0].revision, 1);
        assert_eq!(host.views()[0].items.len(), 2);
    }

    #[test]
    fn selected_sources_in_order() {
        let host: TestHost<Condition> = TestHost::new(vec![vec![], vec![]]);
        let views = selected_sources::<Condition, _>(&host);
        assert_eq!(views.iter().map(|v| v.id).collect::<Vec<_>>(), vec![SourceId(1), SourceId(2)]);
    }
}
