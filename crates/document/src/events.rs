//! Scene change notifications.
//!
//! Hosts embedding the scene drain these to refresh views; tests use them to
//! check that one user action produced exactly one commit. A host that never
//! drains only keeps the most recent `MAX_EVENTS`.

use multiedit_core::SourceId;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A transaction committed with at least one changed source.
    TransactionCommitted(TransactionCommittedEvent),
    /// A transaction was dropped after its writes were rolled back.
    TransactionAbandoned { label: String },
    Undone { label: String },
    Redone { label: String },
    /// The presentation layer should re-read consolidation output.
    RedrawRequested,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionCommittedEvent {
    pub label: String,
    /// Sources whose record lists changed, in first-touched order.
    pub sources: Vec<SourceId>,
}

pub const MAX_EVENTS: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct EventCollector {
    events: Vec<SceneEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append, dropping the oldest event once `MAX_EVENTS` are held.
    pub fn push(&mut self, event: SceneEvent) {
        if self.events.len() >= MAX_EVENTS {
            let excess = self.events.len() + 1 - MAX_EVENTS;
            self.events.drain(..excess);
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Remove and return everything collected so far.
    pub fn drain(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only TransactionCommitted events.
    pub fn committed(&self) -> Vec<&TransactionCommittedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SceneEvent::TransactionCommitted(c) => Some(c),
                _ => None,
            })
            .collect()
    }
}
