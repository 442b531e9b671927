//! Behaviour parameter-action schema.
//!
//! `kind` is the discriminator. The visible fields of a `Random` action also
//! depend on the declared type of the target parameter, resolved through the
//! registry: boolean targets roll a chance, numeric targets pick from a range.

use std::fmt;
use std::str::FromStr;

use multiedit_core::{ObjectKind, ParameterRegistry};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::pipeline::{Pipeline, Tier};
use crate::record::{check_finite, check_known, parse_number, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Set,
    Add,
    Copy,
    Random,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => write!(f, "set"),
            Self::Add => write!(f, "add"),
            Self::Copy => write!(f, "copy"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl FromStr for ActionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "set" => Ok(Self::Set),
            "add" => Ok(Self::Add),
            "copy" => Ok(Self::Copy),
            "random" => Ok(Self::Random),
            _ => Err(EngineError::InvalidValue {
                field: "kind".into(),
                value: s.into(),
                reason: "expected set, add, copy or random".into(),
            }),
        }
    }
}

/// Fields outside the action's current layout are kept, so switching `kind`
/// back restores them. Missing fields load with the same values the
/// constructors use; the `exact` tier compares every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterAction {
    pub kind: ActionKind,
    pub name: String,
    pub source: String,
    pub value: f32,
    pub chance: f32,
    pub value_min: f32,
    pub value_max: f32,
}

impl Default for ParameterAction {
    fn default() -> Self {
        Self {
            kind: ActionKind::Set,
            name: String::new(),
            source: String::new(),
            value: 0.0,
            chance: 0.5,
            value_min: 0.0,
            value_max: 1.0,
        }
    }
}

impl ParameterAction {
    pub fn set(name: impl Into<String>, value: f32) -> Self {
        Self {
            name: name.into(),
            value,
            ..Self::default()
        }
    }

    pub fn add(name: impl Into<String>, value: f32) -> Self {
        Self {
            kind: ActionKind::Add,
            ..Self::set(name, value)
        }
    }

    pub fn copy(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Copy,
            source: source.into(),
            ..Self::set(name, 0.0)
        }
    }

    pub fn random_chance(name: impl Into<String>, chance: f32) -> Self {
        Self {
            kind: ActionKind::Random,
            chance,
            ..Self::set(name, 0.0)
        }
    }

    pub fn random_range(name: impl Into<String>, value_min: f32, value_max: f32) -> Self {
        Self {
            kind: ActionKind::Random,
            value_min,
            value_max,
            ..Self::set(name, 0.0)
        }
    }

    pub fn layout(&self, registry: &ParameterRegistry) -> ActionLayout {
        ActionLayout::resolve(self.kind, Some(&self.name), registry)
    }
}

// ---------------------------------------------------------------------------
// Fields + layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionField {
    Kind,
    Name,
    Source,
    Value,
    Chance,
    ValueMin,
    ValueMax,
}

impl fmt::Display for ActionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Kind => "kind",
            Self::Name => "name",
            Self::Source => "source",
            Self::Value => "value",
            Self::Chance => "chance",
            Self::ValueMin => "value_min",
            Self::ValueMax => "value_max",
        };
        f.write_str(s)
    }
}

/// Visible field set of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionLayout {
    Set,
    Add,
    Copy,
    /// Random on a bool/trigger target.
    RandomChance,
    /// Random on a numeric target, or a target the registry doesn't know.
    RandomRange,
}

impl ActionLayout {
    pub fn resolve(kind: ActionKind, name: Option<&str>, registry: &ParameterRegistry) -> Self {
        match kind {
            ActionKind::Set => Self::Set,
            ActionKind::Add => Self::Add,
            ActionKind::Copy => Self::Copy,
            ActionKind::Random => match name.and_then(|n| registry.type_of(n)) {
                Some(t) if t.is_boolean() => Self::RandomChance,
                _ => Self::RandomRange,
            },
        }
    }

    pub fn fields(&self) -> &'static [ActionField] {
        use ActionField as F;
        match self {
            Self::Set | Self::Add => &[F::Kind, F::Name, F::Value],
            Self::Copy => &[F::Kind, F::Source, F::Name],
            Self::RandomChance => &[F::Kind, F::Name, F::Chance],
            Self::RandomRange => &[F::Kind, F::Name, F::ValueMin, F::ValueMax],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionEdit {
    Kind(ActionKind),
    Name(String),
    Source(String),
    Value(f32),
    Chance(f32),
    ValueMin(f32),
    ValueMax(f32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_min: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_max: Option<f32>,
}

impl ActionView {
    pub fn has(&self, field: ActionField) -> bool {
        match field {
            ActionField::Kind => self.kind.is_some(),
            ActionField::Name => self.name.is_some(),
            ActionField::Source => self.source.is_some(),
            ActionField::Value => self.value.is_some(),
            ActionField::Chance => self.chance.is_some(),
            ActionField::ValueMin => self.value_min.is_some(),
            ActionField::ValueMax => self.value_max.is_some(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTier {
    Exact,
    Target,
    Kind,
}

impl ActionTier {
    pub const ALL: [ActionTier; 3] = [Self::Exact, Self::Target, Self::Kind];

    pub fn rank(&self) -> usize {
        match self {
            Self::Exact => 0,
            Self::Target => 1,
            Self::Kind => 2,
        }
    }

    pub fn tier(&self) -> Tier<ParameterAction> {
        match self {
            Self::Exact => Tier::new("exact", |a, b| a == b, |a| ActionView {
                kind: Some(a.kind),
                name: Some(a.name.clone()),
                source: Some(a.source.clone()),
                value: Some(a.value),
                chance: Some(a.chance),
                value_min: Some(a.value_min),
                value_max: Some(a.value_max),
            }),
            Self::Target => Tier::new("target", same_target, |a| ActionView {
                kind: Some(a.kind),
                name: Some(a.name.clone()),
                source: (a.kind == ActionKind::Copy).then(|| a.source.clone()),
                ..ActionView::default()
            }),
            Self::Kind => Tier::new("kind", |a, b| a.kind == b.kind, |a| ActionView {
                kind: Some(a.kind),
                ..ActionView::default()
            }),
        }
    }
}

/// Same kind and target parameter; the copy source only counts for `Copy`.
fn same_target(a: &ParameterAction, b: &ParameterAction) -> bool {
    a.kind == b.kind && a.name == b.name && (a.kind != ActionKind::Copy || a.source == b.source)
}

pub fn pipeline(tiers: &[ActionTier]) -> Pipeline<ParameterAction> {
    Pipeline::new(tiers.iter().map(|t| t.tier()).collect())
}

pub fn default_pipeline() -> Pipeline<ParameterAction> {
    pipeline(&ActionTier::ALL)
}

// ---------------------------------------------------------------------------
// Record impl
// ---------------------------------------------------------------------------

impl Record for ParameterAction {
    type Field = ActionField;
    type Edit = ActionEdit;
    type View = ActionView;

    const SCHEMA: &'static str = "parameter_action";
    const OBJECT_KIND: ObjectKind = ObjectKind::Behaviour;

    fn parse_field(name: &str) -> Result<ActionField, EngineError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "kind" | "type" => Ok(ActionField::Kind),
            "name" => Ok(ActionField::Name),
            "source" => Ok(ActionField::Source),
            "value" => Ok(ActionField::Value),
            "chance" => Ok(ActionField::Chance),
            "value_min" | "min" => Ok(ActionField::ValueMin),
            "value_max" | "max" => Ok(ActionField::ValueMax),
            _ => Err(EngineError::UnknownField {
                schema: Self::SCHEMA,
                field: name.into(),
            }),
        }
    }

    fn parse_edit(field: ActionField, raw: &str) -> Result<ActionEdit, EngineError> {
        Ok(match field {
            ActionField::Kind => ActionEdit::Kind(raw.parse()?),
            ActionField::Name => ActionEdit::Name(raw.trim().to_string()),
            ActionField::Source => ActionEdit::Source(raw.trim().to_string()),
            ActionField::Value => ActionEdit::Value(parse_number("value", raw)?),
            ActionField::Chance => ActionEdit::Chance(parse_number("chance", raw)?),
            ActionField::ValueMin => ActionEdit::ValueMin(parse_number("value_min", raw)?),
            ActionField::ValueMax => ActionEdit::ValueMax(parse_number("value_max", raw)?),
        })
    }

    fn edit_field(edit: &ActionEdit) -> ActionField {
        match edit {
            ActionEdit::Kind(_) => ActionField::Kind,
            ActionEdit::Name(_) => ActionField::Name,
            ActionEdit::Source(_) => ActionField::Source,
            ActionEdit::Value(_) => ActionField::Value,
            ActionEdit::Chance(_) => ActionField::Chance,
            ActionEdit::ValueMin(_) => ActionField::ValueMin,
            ActionEdit::ValueMax(_) => ActionField::ValueMax,
        }
    }

    fn check_edit(&self, edit: &ActionEdit, registry: &ParameterRegistry) -> Result<(), EngineError> {
        match edit {
            ActionEdit::Kind(_) => Ok(()),
            ActionEdit::Name(name) => check_known("name", name, registry),
            ActionEdit::Source(name) => check_known("source", name, registry),
            ActionEdit::Value(v) => check_finite("value", *v),
            ActionEdit::ValueMin(v) => check_finite("value_min", *v),
            ActionEdit::ValueMax(v) => check_finite("value_max", *v),
            ActionEdit::Chance(c) => {
                if (0.0..=1.0).contains(c) {
                    Ok(())
                } else {
                    Err(EngineError::InvalidValue {
                        field: "chance".into(),
                        value: c.to_string(),
                        reason: "must be between 0 and 1".into(),
                    })
                }
            }
        }
    }

    fn apply_edit(&mut self, edit: &ActionEdit, _registry: &ParameterRegistry) {
        match edit {
            ActionEdit::Kind(kind) => self.kind = *kind,
            ActionEdit::Name(name) => self.name = name.clone(),
            ActionEdit::Source(name) => self.source = name.clone(),
            ActionEdit::Value(v) => self.value = *v,
            ActionEdit::Chance(c) => self.chance = *c,
            ActionEdit::ValueMin(v) => self.value_min = *v,
            ActionEdit::ValueMax(v) => self.value_max = *v,
        }
    }

    fn new_default(registry: &ParameterRegistry) -> Result<Self, EngineError> {
        let first = registry.first().ok_or(EngineError::EmptyRegistry {
            schema: Self::SCHEMA,
        })?;
        Ok(ParameterAction::set(first.name.clone(), 0.0))
    }

    fn editable_fields(view: &ActionView, registry: &ParameterRegistry) -> Vec<ActionField> {
        let Some(kind) = view.kind else {
            return [ActionField::Name]
                .into_iter()
                .filter(|f| view.has(*f))
                .collect();
        };
        ActionLayout::resolve(kind, view.name.as_deref(), registry)
            .fields()
            .iter()
            .copied()
            .filter(|f| view.has(*f))
            .collect()
    }
}
