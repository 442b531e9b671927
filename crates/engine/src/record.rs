//! The contract a record schema implements so the engine can consolidate and
//! edit it without knowing its fields.

use std::fmt;

use multiedit_core::{ObjectKind, ParameterRegistry};
use serde::Serialize;

use crate::error::EngineError;

pub trait Record: Clone + PartialEq + fmt::Debug {
    /// Field names of the schema.
    type Field: Copy + Eq + fmt::Debug + fmt::Display;
    /// One field assignment (field + new value).
    type Edit: Clone + fmt::Debug;
    /// Sparse canonical projection produced by a tier. Fields the tier does
    /// not guarantee equal are absent.
    type View: Clone + PartialEq + fmt::Debug + Serialize;

    /// Schema name for messages and transaction labels.
    const SCHEMA: &'static str;
    /// Object kind whose record list holds this schema.
    const OBJECT_KIND: ObjectKind;

    fn parse_field(name: &str) -> Result<Self::Field, EngineError>;

    /// Parse a raw string into an edit of `field`.
    fn parse_edit(field: Self::Field, raw: &str) -> Result<Self::Edit, EngineError>;

    /// The field an edit writes.
    fn edit_field(edit: &Self::Edit) -> Self::Field;

    /// Reject edits that would write an unresolvable name or an invalid value
    /// into this record. Called for every reference before anything is written.
    fn check_edit(&self, edit: &Self::Edit, registry: &ParameterRegistry) -> Result<(), EngineError>;

    /// Write the edit, including any derived-field reset the schema defines.
    /// Only called after `check_edit` passed.
    fn apply_edit(&mut self, edit: &Self::Edit, registry: &ParameterRegistry);

    /// New record populated from registry defaults.
    fn new_default(registry: &ParameterRegistry) -> Result<Self, EngineError>;

    /// Fields of a canonical view that are both present and visible under the
    /// view's layout.
    fn editable_fields(view: &Self::View, registry: &ParameterRegistry) -> Vec<Self::Field>;
}

/// Parse a finite float for a numeric field.
pub(crate) fn parse_number(field: &str, raw: &str) -> Result<f32, EngineError> {
    let value: f32 = raw.trim().parse().map_err(|_| EngineError::InvalidValue {
        field: field.into(),
        value: raw.into(),
        reason: "not a number".into(),
    })?;
    check_finite(field, value)?;
    Ok(value)
}

pub(crate) fn check_finite(field: &str, value: f32) -> Result<(), EngineError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: "must be finite".into(),
        })
    }
}

/// Name-valued fields must resolve in the registry.
pub(crate) fn check_known(
    field: &str,
    name: &str,
    registry: &ParameterRegistry,
) -> Result<(), EngineError> {
    if registry.get(name).is_some() {
        Ok(())
    } else {
        Err(EngineError::InvalidReference {
            field: field.into(),
            name: name.into(),
        })
    }
}
