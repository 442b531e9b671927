//! Host scene: transitions owning condition lists, behaviours owning
//! parameter-action lists, the current selection, and the transaction /
//! undo machinery the engine writes through.

use multiedit_core::{ObjectKind, Selection, SourceId};
use multiedit_engine::{
    Condition, EngineError, ParameterAction, RedrawTrigger, SelectionProvider, SourceStore,
    SourceView, TransactionSink, TransactionToken,
};
use serde::{Deserialize, Serialize};

use crate::events::{EventCollector, SceneEvent, TransactionCommittedEvent};
use crate::history::{History, SourceChange};

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// A scene object owning an ordered record list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct SceneObject<T> {
    pub id: SourceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub records: Vec<T>,
    /// Bumped on every write. Not persisted.
    #[serde(skip)]
    pub revision: u64,
}

impl<T> SceneObject<T> {
    pub fn new(id: SourceId, name: impl Into<String>, records: Vec<T>) -> Self {
        Self {
            id,
            name: name.into(),
            records,
            revision: 0,
        }
    }
}

/// Animator-style state transition; owns conditions.
pub type Transition = SceneObject<Condition>;

/// State behaviour; owns parameter actions.
pub type Behaviour = SceneObject<ParameterAction>;

/// Whole-list copy of one object's records, taken before and after a
/// transaction for undo.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Conditions(Vec<Condition>),
    Actions(Vec<ParameterAction>),
}

/// Access to the scene's object list for record type `T`.
pub trait ObjectList<T> {
    fn objects(&self) -> &[SceneObject<T>];
    fn objects_mut(&mut self) -> &mut Vec<SceneObject<T>>;
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct PendingTransaction {
    token: TransactionToken,
    label: String,
    /// Nested `begin_transaction` calls still open inside the outermost one.
    depth: usize,
    /// First-touch snapshots, in touch order.
    before: Vec<(SourceId, Snapshot)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    transitions: Vec<Transition>,
    #[serde(default)]
    behaviours: Vec<Behaviour>,
    #[serde(default)]
    pub selection: Selection,
    #[serde(skip)]
    history: History,
    #[serde(skip)]
    events: EventCollector,
    #[serde(skip)]
    pending: Option<PendingTransaction>,
    #[serde(skip)]
    next_token: u64,
    #[serde(skip)]
    redraw_requested: bool,
    #[serde(skip)]
    dirty: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transition(&mut self, name: impl Into<String>, conditions: Vec<Condition>) -> SourceId {
        let id = self.next_id();
        self.transitions.push(SceneObject::new(id, name, conditions));
        self.dirty = true;
        id
    }

    pub fn add_behaviour(&mut self, name: impl Into<String>, actions: Vec<ParameterAction>) -> SourceId {
        let id = self.next_id();
        self.behaviours.push(SceneObject::new(id, name, actions));
        self.dirty = true;
        id
    }

    // Ids are shared between both object kinds.
    fn next_id(&self) -> SourceId {
        let max = self
            .transitions
            .iter()
            .map(|t| t.id.0)
            .chain(self.behaviours.iter().map(|b| b.id.0))
            .max()
            .unwrap_or(0);
        SourceId(max + 1)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn behaviours(&self) -> &[Behaviour] {
        &self.behaviours
    }

    pub fn transition(&self, id: SourceId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    pub fn behaviour(&self, id: SourceId) -> Option<&Behaviour> {
        self.behaviours.iter().find(|b| b.id == id)
    }

    pub fn kind_of(&self, id: SourceId) -> Option<ObjectKind> {
        if self.transition(id).is_some() {
            Some(ObjectKind::Transition)
        } else if self.behaviour(id).is_some() {
            Some(ObjectKind::Behaviour)
        } else {
            None
        }
    }

    /// Replace the selection. Order is kept; duplicates are dropped.
    pub fn select(&mut self, ids: impl IntoIterator<Item = SourceId>) {
        self.selection = Selection::from_ids(ids);
    }

    /// First id used by more than one object, if any.
    pub fn duplicate_id(&self) -> Option<SourceId> {
        let mut seen = std::collections::HashSet::new();
        self.transitions
            .iter()
            .map(|t| t.id)
            .chain(self.behaviours.iter().map(|b| b.id))
            .find(|id| !seen.insert(*id))
    }

    pub fn snapshot(&self, id: SourceId) -> Option<Snapshot> {
        if let Some(t) = self.transition(id) {
            return Some(Snapshot::Conditions(t.records.clone()));
        }
        self.behaviour(id).map(|b| Snapshot::Actions(b.records.clone()))
    }

    /// Overwrite an object's records from a snapshot. Returns false if no
    /// object of the snapshot's kind has this id.
    pub fn restore(&mut self, id: SourceId, snapshot: &Snapshot) -> bool {
        match snapshot {
            Snapshot::Conditions(records) => restore_into(&mut self.transitions, id, records),
            Snapshot::Actions(records) => restore_into(&mut self.behaviours, id, records),
        }
    }

    // -- History ------------------------------------------------------------

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.pending.is_none() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.pending.is_none() && self.history.can_redo()
    }

    /// Revert the last committed transaction. Returns its label.
    pub fn undo(&mut self) -> Option<String> {
        if self.pending.is_some() {
            log::warn!("undo requested while a transaction is open");
            return None;
        }
        let entry = self.history.undo()?;
        for change in entry.changes.iter().rev() {
            self.restore_change(change.source, &change.before);
        }
        self.events.push(SceneEvent::Undone {
            label: entry.label.clone(),
        });
        self.request_redraw();
        self.dirty = true;
        log::info!("undo: {}", entry.label);
        Some(entry.label)
    }

    /// Reapply the last undone transaction. Returns its label.
    pub fn redo(&mut self) -> Option<String> {
        if self.pending.is_some() {
            log::warn!("redo requested while a transaction is open");
            return None;
        }
        let entry = self.history.redo()?;
        for change in &entry.changes {
            self.restore_change(change.source, &change.after);
        }
        self.events.push(SceneEvent::Redone {
            label: entry.label.clone(),
        });
        self.request_redraw();
        self.dirty = true;
        log::info!("redo: {}", entry.label);
        Some(entry.label)
    }

    fn restore_change(&mut self, source: SourceId, snapshot: &Snapshot) {
        if !self.restore(source, snapshot) {
            log::warn!("history refers to missing object {source}");
        }
    }

    // -- Host state ---------------------------------------------------------

    pub fn events(&self) -> &EventCollector {
        &self.events
    }

    /// Take every event collected since the last drain.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.events.drain()
    }

    pub fn in_transaction(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a redraw was requested since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn object_mut<T>(&mut self, id: SourceId) -> Result<&mut SceneObject<T>, EngineError>
    where
        Self: ObjectList<T>,
    {
        <Self as ObjectList<T>>::objects_mut(self)
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(EngineError::UnknownSource(id))
    }
}

fn restore_into<T: Clone>(objects: &mut [SceneObject<T>], id: SourceId, records: &[T]) -> bool {
    match objects.iter_mut().find(|o| o.id == id) {
        Some(object) => {
            object.records = records.to_vec();
            object.revision += 1;
            true
        }
        None => false,
    }
}

fn out_of_range(source: SourceId, index: usize, revision: u64) -> EngineError {
    EngineError::StaleReference {
        source,
        index,
        expected_revision: revision,
        found_revision: Some(revision),
    }
}

impl ObjectList<Condition> for Scene {
    fn objects(&self) -> &[Transition] {
        &self.transitions
    }

    fn objects_mut(&mut self) -> &mut Vec<Transition> {
        &mut self.transitions
    }
}

impl ObjectList<ParameterAction> for Scene {
    fn objects(&self) -> &[Behaviour] {
        &self.behaviours
    }

    fn objects_mut(&mut self) -> &mut Vec<Behaviour> {
        &mut self.behaviours
    }
}

// ---------------------------------------------------------------------------
// Engine collaborators
// ---------------------------------------------------------------------------

impl<T> SourceStore<T> for Scene
where
    Scene: ObjectList<T>,
{
    fn source(&self, id: SourceId) -> Option<SourceView<'_, T>> {
        <Self as ObjectList<T>>::objects(self)
            .iter()
            .find(|o| o.id == id)
            .map(|o| SourceView::new(o.id, o.revision, &o.records))
    }

    fn replace_item(&mut self, id: SourceId, index: usize, item: T) -> Result<(), EngineError> {
        let object = self.object_mut::<T>(id)?;
        let revision = object.revision;
        let slot = object
            .records
            .get_mut(index)
            .ok_or_else(|| out_of_range(id, index, revision))?;
        *slot = item;
        object.revision += 1;
        Ok(())
    }

    fn insert_item(&mut self, id: SourceId, index: usize, item: T) -> Result<(), EngineError> {
        let object = self.object_mut::<T>(id)?;
        if index > object.records.len() {
            return Err(out_of_range(id, index, object.revision));
        }
        object.records.insert(index, item);
        object.revision += 1;
        Ok(())
    }

    fn remove_item(&mut self, id: SourceId, index: usize) -> Result<T, EngineError> {
        let object = self.object_mut::<T>(id)?;
        if index >= object.records.len() {
            return Err(out_of_range(id, index, object.revision));
        }
        object.revision += 1;
        Ok(object.records.remove(index))
    }
}

impl SelectionProvider for Scene {
    fn selected(&self, kind: ObjectKind) -> Vec<SourceId> {
        self.selection
            .ids()
            .iter()
            .copied()
            .filter(|id| self.kind_of(*id) == Some(kind))
            .collect()
    }
}

impl TransactionSink for Scene {
    /// Nested calls join the open transaction and return its token.
    fn begin_transaction(&mut self, label: &str) -> TransactionToken {
        if let Some(pending) = self.pending.as_mut() {
            pending.depth += 1;
            return pending.token;
        }
        self.next_token += 1;
        let token = TransactionToken(self.next_token);
        self.pending = Some(PendingTransaction {
            token,
            label: label.to_string(),
            depth: 0,
            before: Vec::new(),
        });
        token
    }

    fn record_mutation(&mut self, source: SourceId) {
        let already = match &self.pending {
            Some(p) => p.before.iter().any(|(id, _)| *id == source),
            None => {
                log::warn!("{source} mutated outside a transaction; change is not undoable");
                self.dirty = true;
                return;
            }
        };
        if already {
            return;
        }
        let Some(snapshot) = self.snapshot(source) else {
            log::warn!("mutation recorded for unknown object {source}");
            return;
        };
        if let Some(pending) = self.pending.as_mut() {
            pending.before.push((source, snapshot));
        }
    }

    fn commit(&mut self, token: TransactionToken) {
        match self.pending.as_mut() {
            Some(p) if p.token == token => {
                if p.depth > 0 {
                    p.depth -= 1;
                    return;
                }
            }
            Some(p) => {
                log::warn!("commit of {token:?} while {:?} is open", p.token);
                return;
            }
            None => {
                log::warn!("commit of {token:?} with no open transaction");
                return;
            }
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        let changes: Vec<SourceChange> = pending
            .before
            .into_iter()
            .filter_map(|(source, before)| {
                let after = self.snapshot(source)?;
                (after != before).then_some(SourceChange { source, before, after })
            })
            .collect();
        if changes.is_empty() {
            log::debug!("transaction '{}' committed with no changes", pending.label);
            return;
        }

        let sources = changes.iter().map(|c| c.source).collect();
        self.history.record_batch(pending.label.clone(), changes);
        self.events
            .push(SceneEvent::TransactionCommitted(TransactionCommittedEvent {
                label: pending.label,
                sources,
            }));
        self.dirty = true;
    }

    /// Abandoning a nested transaction only closes that level; the outer
    /// group stays open. The caller has already restored its own writes.
    fn abandon(&mut self, token: TransactionToken) {
        match self.pending.as_mut() {
            Some(p) if p.token == token => {
                if p.depth > 0 {
                    p.depth -= 1;
                    return;
                }
            }
            _ => {
                log::warn!("abandon of {token:?} which is not open");
                return;
            }
        }
        if let Some(pending) = self.pending.take() {
            log::debug!("transaction '{}' abandoned", pending.label);
            self.events.push(SceneEvent::TransactionAbandoned {
                label: pending.label,
            });
        }
    }
}

impl RedrawTrigger for Scene {
    fn request_redraw(&mut self) {
        self.redraw_requested = true;
        self.events.push(SceneEvent::RedrawRequested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiedit_core::{ParameterRegistry, ParameterType};
    use multiedit_engine::{
        condition, consolidate, selected_sources, BatchMutator, ConditionEdit, ConditionMode,
    };

    fn cond(p: &str, mode: ConditionMode, t: f32) -> Condition {
        Condition::new(p, mode, t)
    }

    fn registry() -> ParameterRegistry {
        ParameterRegistry::new()
            .with("Speed", ParameterType::Float)
            .with("Grounded", ParameterType::Bool)
    }

    fn two_transitions() -> (Scene, SourceId, SourceId) {
        let mut scene = Scene::new();
        let a = scene.add_transition(
            "Idle->Run",
            vec![cond("Speed", ConditionMode::Greater, 0.5), cond("Grounded", ConditionMode::If, 0.0)],
        );
        let b = scene.add_transition("Walk->Run", vec![cond("Speed", ConditionMode::Greater, 0.5)]);
        scene.select([a, b]);
        (scene, a, b)
    }

    #[test]
    fn ids_are_shared_across_kinds() {
        let mut scene = Scene::new();
        let t = scene.add_transition("t", vec![]);
        let b = scene.add_behaviour("b", vec![]);
        assert_eq!(t, SourceId(1));
        assert_eq!(b, SourceId(2));
        assert_eq!(scene.kind_of(b), Some(ObjectKind::Behaviour));
        assert_eq!(scene.kind_of(SourceId(9)), None);
    }

    #[test]
    fn selection_filters_by_kind() {
        let mut scene = Scene::new();
        let t = scene.add_transition("t", vec![]);
        let b = scene.add_behaviour("b", vec![]);
        scene.select([b, t, SourceId(42)]);
        assert_eq!(scene.selected(ObjectKind::Transition), vec![t]);
        assert_eq!(scene.selected(ObjectKind::Behaviour), vec![b]);
    }

    #[test]
    fn writes_bump_revision_and_reject_bad_index() {
        let (mut scene, a, _) = two_transitions();
        let view = SourceStore::<Condition>::source(&scene, a).unwrap();
        assert_eq!(view.revision, 0);

        scene
            .replace_item(a, 0, cond("Speed", ConditionMode::Less, 1.0))
            .unwrap();
        assert_eq!(scene.transition(a).unwrap().revision, 1);

        let err = SourceStore::<Condition>::remove_item(&mut scene, a, 7).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        // Transition ids are not behaviour sources.
        assert!(SourceStore::<ParameterAction>::source(&scene, a).is_none());
    }

    #[test]
    fn batch_edit_is_one_undo_step() {
        let (mut scene, a, b) = two_transitions();
        let registry = registry();

        let entries = consolidate(
            &selected_sources::<Condition, _>(&scene),
            &condition::default_pipeline(),
        );
        assert_eq!(entries.len(), 1);

        let mut mutator = BatchMutator::new(&mut scene, &registry);
        let report = mutator
            .set_field(&entries[0], &ConditionEdit::Threshold(0.8))
            .unwrap();
        assert_eq!(report.touched.len(), 2);

        assert_eq!(scene.history().undo_len(), 1);
        assert_eq!(scene.events().committed().len(), 1);
        assert_eq!(scene.events().committed()[0].sources, vec![a, b]);
        assert!(scene.take_redraw());
        assert!(!scene.take_redraw());

        let label = scene.undo().unwrap();
        assert_eq!(label, "Batch edit: set condition threshold");
        assert_eq!(scene.transition(a).unwrap().records[0].threshold, 0.5);
        assert_eq!(scene.transition(b).unwrap().records[0].threshold, 0.5);

        scene.redo().unwrap();
        assert_eq!(scene.transition(b).unwrap().records[0].threshold, 0.8);

        let drained = scene.drain_events();
        assert!(matches!(drained.last(), Some(SceneEvent::RedrawRequested)));
        assert!(drained.iter().any(|e| matches!(e, SceneEvent::Redone { .. })));
        assert!(scene.events().is_empty());
    }

    #[test]
    fn nested_transactions_group() {
        let (mut scene, a, b) = two_transitions();
        let outer = scene.begin_transaction("outer");
        let inner = scene.begin_transaction("inner");
        assert_eq!(outer, inner);

        scene.record_mutation(a);
        scene.push_item(a, cond("Speed", ConditionMode::Less, 2.0)).unwrap();
        scene.commit(inner);
        assert!(scene.in_transaction());

        scene.record_mutation(b);
        scene.push_item(b, cond("Speed", ConditionMode::Less, 2.0)).unwrap();
        scene.commit(outer);

        assert!(!scene.in_transaction());
        assert_eq!(scene.history().undo_len(), 1);
        assert_eq!(scene.history().peek_undo(), Some("outer"));

        scene.undo();
        assert_eq!(scene.transition(a).unwrap().records.len(), 2);
        assert_eq!(scene.transition(b).unwrap().records.len(), 1);
    }

    #[test]
    fn unchanged_commit_records_nothing() {
        let (mut scene, a, _) = two_transitions();
        let token = scene.begin_transaction("noop");
        scene.record_mutation(a);
        scene.commit(token);
        assert!(!scene.can_undo());
        assert!(scene.events().committed().is_empty());
    }

    #[test]
    fn abandon_discards_group() {
        let (mut scene, a, _) = two_transitions();
        let token = scene.begin_transaction("dropped");
        scene.record_mutation(a);
        scene.abandon(token);
        assert!(!scene.in_transaction());
        assert!(!scene.can_undo());
        assert!(matches!(
            scene.events().events().last(),
            Some(SceneEvent::TransactionAbandoned { .. })
        ));
    }

    #[test]
    fn undo_refused_inside_transaction() {
        let (mut scene, a, _) = two_transitions();
        let token = scene.begin_transaction("first");
        scene.record_mutation(a);
        scene.push_item(a, cond("Speed", ConditionMode::Less, 1.0)).unwrap();
        scene.commit(token);

        let _open = scene.begin_transaction("second");
        assert!(!scene.can_undo());
        assert!(scene.undo().is_none());
    }

    #[test]
    fn duplicate_ids_detected() {
        let mut scene = Scene::new();
        scene.transitions.push(SceneObject::new(SourceId(3), "a", vec![]));
        scene.behaviours.push(SceneObject::new(SourceId(3), "b", vec![]));
        assert_eq!(scene.duplicate_id(), Some(SourceId(3)));
    }
}
