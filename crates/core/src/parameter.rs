//! Global typed parameters.
//!
//! The registry is ordered: the first parameter is the default target for
//! newly added records, and listing order is the order offered to the user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    Float,
    Int,
    Bool,
    Trigger,
}

impl ParameterType {
    /// Bool and Trigger parameters hold on/off state rather than a number.
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Bool | Self::Trigger)
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => write!(f, "float"),
            Self::Int => write!(f, "int"),
            Self::Bool => write!(f, "bool"),
            Self::Trigger => write!(f, "trigger"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterType,
    #[serde(default)]
    pub default_value: f32,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterType) -> Self {
        Self {
            name: name.into(),
            kind,
            default_value: 0.0,
        }
    }
}

/// Ordered list of named, typed parameters. Names are unique and
/// case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterRegistry {
    params: Vec<Parameter>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. Returns false (and changes nothing) if the name is taken.
    pub fn insert(&mut self, param: Parameter) -> bool {
        if self.get(&param.name).is_some() {
            return false;
        }
        self.params.push(param);
        true
    }

    /// Builder form of `insert`, for fixtures.
    pub fn with(mut self, name: &str, kind: ParameterType) -> Self {
        self.insert(Parameter::new(name, kind));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Declared type of `name`, if registered.
    pub fn type_of(&self, name: &str) -> Option<ParameterType> {
        self.get(name).map(|p| p.kind)
    }

    pub fn first(&self) -> Option<&Parameter> {
        self.params.first()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
