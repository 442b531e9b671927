//! `multiedit-engine` - multi-object record consolidation and fan-out editing.
//!
//! Pure engine crate: reads record lists through host traits, returns unified
//! entries, and propagates edits on an entry to every record behind it. No
//! UI or IO dependencies.

pub mod action;
pub mod condition;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod host;
pub mod model;
pub mod mutator;
pub mod pipeline;
pub mod record;

#[cfg(test)]
pub mod harness;

pub use action::{ActionEdit, ActionField, ActionKind, ActionLayout, ActionTier, ActionView, ParameterAction};
pub use condition::{Condition, ConditionEdit, ConditionField, ConditionLayout, ConditionMode, ConditionTier, ConditionView};
pub use config::EngineConfig;
pub use consolidate::{consolidate, consolidate_report};
pub use error::EngineError;
pub use host::{
    selected_sources, EditHost, RedrawTrigger, SelectionProvider, SourceStore, TransactionSink,
    TransactionToken,
};
pub use model::{BackRef, ConsolidatedEntry, ConsolidationReport, SourceView};
pub use mutator::{BatchMutator, MutationReport};
pub use pipeline::{Pipeline, Tier};
pub use record::Record;
