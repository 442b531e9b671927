//! Batch mutator: fans one edit on a consolidated entry out to every record
//! the entry references.
//!
//! Each operation is all-or-nothing. Every reference is validated (source
//! still present, revision unchanged, index in range, edit acceptable for the
//! record) before the first write. If the host still rejects a write midway,
//! the records already written are restored in reverse order and the
//! transaction is abandoned.

use multiedit_core::{ParameterRegistry, SourceId};
use serde::Serialize;

use crate::error::EngineError;
use crate::host::{EditHost, RedrawTrigger, SourceStore, TransactionSink, TransactionToken};
use crate::model::{BackRef, ConsolidatedEntry};
use crate::record::Record;

pub const DEFAULT_LABEL_PREFIX: &str = "Batch edit";

/// Outcome of a committed batch operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationReport {
    /// Transaction label the host recorded.
    pub label: String,
    /// (source, index) of every record written, removed or appended.
    pub touched: Vec<(SourceId, usize)>,
}

impl MutationReport {
    fn empty(label: String) -> Self {
        Self {
            label,
            touched: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }
}

/// Inverse of one applied write, for rollback.
enum Undo<T> {
    Replace(SourceId, usize, T),
    Remove(SourceId, usize),
    Insert(SourceId, usize, T),
}

pub struct BatchMutator<'a, H> {
    host: &'a mut H,
    registry: &'a ParameterRegistry,
    label_prefix: String,
}

impl<'a, H> BatchMutator<'a, H> {
    pub fn new(host: &'a mut H, registry: &'a ParameterRegistry) -> Self {
        Self {
            host,
            registry,
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
        }
    }

    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// Set one field on every record behind `entry`.
    pub fn set_field<T: Record>(
        &mut self,
        entry: &ConsolidatedEntry<T>,
        edit: &T::Edit,
    ) -> Result<MutationReport, EngineError>
    where
        H: EditHost<T>,
    {
        let label = format!(
            "{}: set {} {}",
            self.label_prefix,
            T::SCHEMA,
            T::edit_field(edit)
        );

        let mut planned = Vec::with_capacity(entry.references.len());
        for r in &entry.references {
            let original = self.load::<T>(r)?;
            original.check_edit(edit, self.registry)?;
            let mut updated = original.clone();
            updated.apply_edit(edit, self.registry);
            planned.push((*r, original, updated));
        }
        if planned.is_empty() {
            return Ok(MutationReport::empty(label));
        }

        let token = self.host.begin_transaction(&label);
        let mut undo = Vec::with_capacity(planned.len());
        let mut touched = Vec::with_capacity(planned.len());
        for (r, original, updated) in planned {
            self.host.record_mutation(r.source);
            if let Err(e) = self.host.replace_item(r.source, r.index, updated) {
                self.rollback(token, undo);
                return Err(e);
            }
            undo.push(Undo::Replace(r.source, r.index, original));
            touched.push((r.source, r.index));
        }
        Ok(self.finish(token, label, touched))
    }

    /// Parse `field` / `raw` with the schema and set it.
    pub fn set_field_str<T: Record>(
        &mut self,
        entry: &ConsolidatedEntry<T>,
        field: &str,
        raw: &str,
    ) -> Result<MutationReport, EngineError>
    where
        H: EditHost<T>,
    {
        let field = T::parse_field(field)?;
        let edit = T::parse_edit(field, raw)?;
        self.set_field(entry, &edit)
    }

    /// Append one default record to each of `sources`. Does not create an
    /// entry; the next consolidation pass decides whether the new records
    /// merge.
    pub fn add_default<T: Record>(&mut self, sources: &[SourceId]) -> Result<MutationReport, EngineError>
    where
        H: EditHost<T>,
    {
        let item = T::new_default(self.registry)?;
        let label = format!("{}: add {}", self.label_prefix, T::SCHEMA);
        self.append_with_label(sources, std::slice::from_ref(&item), label)
    }

    /// Append copies of `items` (in order) to each of `sources`.
    pub fn append<T: Record>(&mut self, sources: &[SourceId], items: &[T]) -> Result<MutationReport, EngineError>
    where
        H: EditHost<T>,
    {
        let label = format!("{}: paste {} x{}", self.label_prefix, T::SCHEMA, items.len());
        self.append_with_label(sources, items, label)
    }

    fn append_with_label<T: Record>(
        &mut self,
        sources: &[SourceId],
        items: &[T],
        label: String,
    ) -> Result<MutationReport, EngineError>
    where
        H: EditHost<T>,
    {
        for &id in sources {
            if self.host.source(id).is_none() {
                return Err(EngineError::UnknownSource(id));
            }
        }
        if sources.is_empty() || items.is_empty() {
            return Ok(MutationReport::empty(label));
        }

        let token = self.host.begin_transaction(&label);
        let mut undo = Vec::new();
        let mut touched = Vec::with_capacity(sources.len() * items.len());
        for &id in sources {
            self.host.record_mutation(id);
            for item in items {
                match self.host.push_item(id, item.clone()) {
                    Ok(index) => {
                        undo.push(Undo::Remove(id, index));
                        touched.push((id, index));
                    }
                    Err(e) => {
                        self.rollback(token, undo);
                        return Err(e);
                    }
                }
            }
        }
        Ok(self.finish(token, label, touched))
    }

    /// Delete every record behind `entry`.
    pub fn remove<T: Record>(&mut self, entry: &ConsolidatedEntry<T>) -> Result<MutationReport, EngineError>
    where
        H: EditHost<T>,
    {
        let label = format!("{}: remove {}", self.label_prefix, T::SCHEMA);
        for r in &entry.references {
            self.load::<T>(r)?;
        }
        if entry.references.is_empty() {
            return Ok(MutationReport::empty(label));
        }

        // Highest index first within a source so earlier removals don't
        // shift later ones.
        let mut order: Vec<BackRef> = entry.references.clone();
        order.sort_by(|a, b| a.source.cmp(&b.source).then(b.index.cmp(&a.index)));
        order.dedup_by(|a, b| a.source == b.source && a.index == b.index);

        let token = self.host.begin_transaction(&label);
        let mut undo = Vec::with_capacity(order.len());
        let mut touched = Vec::with_capacity(order.len());
        for r in order {
            self.host.record_mutation(r.source);
            match self.host.remove_item(r.source, r.index) {
                Ok(removed) => {
                    undo.push(Undo::Insert(r.source, r.index, removed));
                    touched.push((r.source, r.index));
                }
                Err(e) => {
                    self.rollback(token, undo);
                    return Err(e);
                }
            }
        }
        Ok(self.finish(token, label, touched))
    }

    /// Fetch the record behind `r`, failing if the source moved on.
    fn load<T: Record>(&self, r: &BackRef) -> Result<T, EngineError>
    where
        H: SourceStore<T>,
    {
        let stale = |found_revision| EngineError::StaleReference {
            source: r.source,
            index: r.index,
            expected_revision: r.revision,
            found_revision,
        };
        let Some(view) = self.host.source(r.source) else {
            log::warn!("{} source {} vanished since consolidation", T::SCHEMA, r.source);
            return Err(stale(None));
        };
        if view.revision != r.revision || r.index >= view.items.len() {
            log::warn!(
                "{} source {} item {}: stale (revision {} -> {}, {} items)",
                T::SCHEMA,
                r.source,
                r.index,
                r.revision,
                view.revision,
                view.items.len()
            );
            return Err(stale(Some(view.revision)));
        }
        Ok(view.items[r.index].clone())
    }

    fn finish(&mut self, token: TransactionToken, label: String, touched: Vec<(SourceId, usize)>) -> MutationReport
    where
        H: TransactionSink + RedrawTrigger,
    {
        self.host.commit(token);
        self.host.request_redraw();
        log::info!("{label}: {} records written", touched.len());
        MutationReport { label, touched }
    }

    fn rollback<T>(&mut self, token: TransactionToken, undo: Vec<Undo<T>>)
    where
        H: SourceStore<T> + TransactionSink,
    {
        for step in undo.into_iter().rev() {
            let restored = match step {
                Undo::Replace(id, index, item) => self.host.replace_item(id, index, item),
                Undo::Remove(id, index) => self.host.remove_item(id, index).map(|_| ()),
                Undo::Insert(id, index, item) => self.host.insert_item(id, index, item),
            };
            if let Err(e) = restored {
                log::error!("rollback failed: {e}");
            }
        }
        self.host.abandon(token);
    }
}
