//! `multiedit-document` - in-memory host for the multi-edit engine.
//!
//! Owns the parameter registry and the scene (transitions with conditions,
//! behaviours with parameter actions), implements the engine's host traits,
//! and keeps an undo history of committed batch edits.

pub mod document;
pub mod error;
pub mod events;
pub mod history;
pub mod scene;
pub mod session;

pub use document::Document;
pub use error::DocumentError;
pub use events::{EventCollector, SceneEvent, TransactionCommittedEvent};
pub use history::{History, HistoryEntry, SourceChange};
pub use scene::{Behaviour, ObjectList, Scene, SceneObject, Snapshot, Transition};
pub use session::{Clipboard, EditSession};
