//! `multiedit-core` - shared leaf types.
//!
//! Source identity, the ordered selection, and the typed parameter registry
//! that drives field visibility and defaults in the engine.

pub mod parameter;
pub mod selection;
pub mod source;

pub use parameter::{Parameter, ParameterRegistry, ParameterType};
pub use selection::Selection;
pub use source::{ObjectKind, SourceId};
