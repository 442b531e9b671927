//! Transition condition schema.
//!
//! A condition tests one parameter. Its `mode` is the discriminator: flag
//! modes (`If`/`IfNot`) ignore the threshold, comparison modes use it. Which
//! modes are selectable depends on the parameter's declared type.

use std::fmt;
use std::str::FromStr;

use multiedit_core::{ObjectKind, ParameterRegistry, ParameterType};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::pipeline::{Pipeline, Tier};
use crate::record::{check_finite, check_known, parse_number, Record};

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionMode {
    If,
    IfNot,
    Greater,
    Less,
    Equals,
    NotEqual,
}

impl ConditionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::IfNot => "if_not",
            Self::Greater => "greater",
            Self::Less => "less",
            Self::Equals => "equals",
            Self::NotEqual => "not_equal",
        }
    }
}

impl fmt::Display for ConditionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "if" | "true" => Ok(Self::If),
            "if_not" | "ifnot" | "false" => Ok(Self::IfNot),
            "greater" | ">" => Ok(Self::Greater),
            "less" | "<" => Ok(Self::Less),
            "equals" | "==" => Ok(Self::Equals),
            "not_equal" | "notequal" | "!=" => Ok(Self::NotEqual),
            _ => Err(EngineError::InvalidValue {
                field: "mode".into(),
                value: s.into(),
                reason: "unknown condition mode".into(),
            }),
        }
    }
}

/// Modes offered for a parameter of the given type.
pub fn modes_for(kind: ParameterType) -> &'static [ConditionMode] {
    use ConditionMode::*;
    match kind {
        ParameterType::Bool => &[If, IfNot],
        ParameterType::Trigger => &[If],
        ParameterType::Float => &[Greater, Less],
        ParameterType::Int => &[Greater, Less, Equals, NotEqual],
    }
}

/// Mode a condition falls back to when its parameter changes.
pub fn default_mode(kind: ParameterType) -> ConditionMode {
    if kind.is_boolean() {
        ConditionMode::If
    } else {
        ConditionMode::Greater
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub parameter: String,
    pub mode: ConditionMode,
    #[serde(default)]
    pub threshold: f32,
}

impl Condition {
    pub fn new(parameter: impl Into<String>, mode: ConditionMode, threshold: f32) -> Self {
        Self {
            parameter: parameter.into(),
            mode,
            threshold,
        }
    }

    pub fn layout(&self) -> ConditionLayout {
        ConditionLayout::for_mode(self.mode)
    }
}

// ---------------------------------------------------------------------------
// Fields + layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    Parameter,
    Mode,
    Threshold,
}

impl fmt::Display for ConditionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter => write!(f, "parameter"),
            Self::Mode => write!(f, "mode"),
            Self::Threshold => write!(f, "threshold"),
        }
    }
}

/// Visible field set, selected by the mode discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionLayout {
    /// `If` / `IfNot`: parameter + mode.
    Flag,
    /// Comparisons: parameter + mode + threshold.
    Compare,
}

impl ConditionLayout {
    pub fn for_mode(mode: ConditionMode) -> Self {
        match mode {
            ConditionMode::If | ConditionMode::IfNot => Self::Flag,
            ConditionMode::Greater
            | ConditionMode::Less
            | ConditionMode::Equals
            | ConditionMode::NotEqual => Self::Compare,
        }
    }

    pub fn fields(&self) -> &'static [ConditionField] {
        use ConditionField::*;
        match self {
            Self::Flag => &[Parameter, Mode],
            Self::Compare => &[Parameter, Mode, Threshold],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionEdit {
    Parameter(String),
    Mode(ConditionMode),
    Threshold(f32),
}

/// Canonical projection of a consolidated condition. The parameter is shared
/// by every tier; mode and threshold only when the tier guarantees them equal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionView {
    pub parameter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ConditionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Named condition tiers, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTier {
    Exact,
    ParameterMode,
    Parameter,
}

impl ConditionTier {
    pub const ALL: [ConditionTier; 3] = [Self::Exact, Self::ParameterMode, Self::Parameter];

    /// Position in specificity order (0 = most specific).
    pub fn rank(&self) -> usize {
        match self {
            Self::Exact => 0,
            Self::ParameterMode => 1,
            Self::Parameter => 2,
        }
    }

    pub fn tier(&self) -> Tier<Condition> {
        match self {
            Self::Exact => Tier::new("exact", |a, b| a == b, |c| ConditionView {
                parameter: c.parameter.clone(),
                mode: Some(c.mode),
                threshold: Some(c.threshold),
            }),
            Self::ParameterMode => Tier::new(
                "parameter_mode",
                |a, b| a.parameter == b.parameter && a.mode == b.mode,
                |c| ConditionView {
                    parameter: c.parameter.clone(),
                    mode: Some(c.mode),
                    threshold: None,
                },
            ),
            Self::Parameter => Tier::new(
                "parameter",
                |a, b| a.parameter == b.parameter,
                |c| ConditionView {
                    parameter: c.parameter.clone(),
                    mode: None,
                    threshold: None,
                },
            ),
        }
    }
}

pub fn pipeline(tiers: &[ConditionTier]) -> Pipeline<Condition> {
    Pipeline::new(tiers.iter().map(|t| t.tier()).collect())
}

pub fn default_pipeline() -> Pipeline<Condition> {
    pipeline(&ConditionTier::ALL)
}

// ---------------------------------------------------------------------------
// Record impl
// ---------------------------------------------------------------------------

impl Record for Condition {
    type Field = ConditionField;
    type Edit = ConditionEdit;
    type View = ConditionView;

    const SCHEMA: &'static str = "condition";
    const OBJECT_KIND: ObjectKind = ObjectKind::Transition;

    fn parse_field(name: &str) -> Result<ConditionField, EngineError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "parameter" => Ok(ConditionField::Parameter),
            "mode" => Ok(ConditionField::Mode),
            "threshold" => Ok(ConditionField::Threshold),
            _ => Err(EngineError::UnknownField {
                schema: Self::SCHEMA,
                field: name.into(),
            }),
        }
    }

    fn parse_edit(field: ConditionField, raw: &str) -> Result<ConditionEdit, EngineError> {
        Ok(match field {
            ConditionField::Parameter => ConditionEdit::Parameter(raw.trim().to_string()),
            ConditionField::Mode => ConditionEdit::Mode(raw.parse()?),
            ConditionField::Threshold => ConditionEdit::Threshold(parse_number("threshold", raw)?),
        })
    }

    fn edit_field(edit: &ConditionEdit) -> ConditionField {
        match edit {
            ConditionEdit::Parameter(_) => ConditionField::Parameter,
            ConditionEdit::Mode(_) => ConditionField::Mode,
            ConditionEdit::Threshold(_) => ConditionField::Threshold,
        }
    }

    fn check_edit(&self, edit: &ConditionEdit, registry: &ParameterRegistry) -> Result<(), EngineError> {
        match edit {
            ConditionEdit::Parameter(name) => check_known("parameter", name, registry),
            ConditionEdit::Mode(mode) => match registry.type_of(&self.parameter) {
                // Dangling parameter: nothing to check the mode against.
                None => Ok(()),
                Some(kind) if modes_for(kind).contains(mode) => Ok(()),
                Some(kind) => Err(EngineError::InvalidValue {
                    field: "mode".into(),
                    value: mode.to_string(),
                    reason: format!("not available for {kind} parameter '{}'", self.parameter),
                }),
            },
            ConditionEdit::Threshold(value) => check_finite("threshold", *value),
        }
    }

    fn apply_edit(&mut self, edit: &ConditionEdit, registry: &ParameterRegistry) {
        match edit {
            ConditionEdit::Parameter(name) => {
                if *name != self.parameter {
                    self.parameter = name.clone();
                    if let Some(kind) = registry.type_of(name) {
                        self.mode = default_mode(kind);
                    }
                }
            }
            ConditionEdit::Mode(mode) => self.mode = *mode,
            ConditionEdit::Threshold(value) => self.threshold = *value,
        }
    }

    fn new_default(registry: &ParameterRegistry) -> Result<Self, EngineError> {
        let first = registry.first().ok_or(EngineError::EmptyRegistry {
            schema: Self::SCHEMA,
        })?;
        Ok(Condition::new(first.name.clone(), default_mode(first.kind), 0.0))
    }

    fn editable_fields(view: &ConditionView, _registry: &ParameterRegistry) -> Vec<ConditionField> {
        match view.mode {
            None => vec![ConditionField::Parameter],
            Some(mode) => ConditionLayout::for_mode(mode)
                .fields()
                .iter()
                .copied()
                .filter(|f| match f {
                    ConditionField::Threshold => view.threshold.is_some(),
                    _ => true,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ParameterRegistry {
        ParameterRegistry::new()
            .with("Speed", ParameterType::Float)
            .with("Grounded", ParameterType::Bool)
            .with("Jump", ParameterType::Trigger)
            .with("Weapon", ParameterType::Int)
    }

    #[test]
    fn layout_follows_mode() {
        assert_eq!(Condition::new("Grounded", ConditionMode::IfNot, 0.0).layout(), ConditionLayout::Flag);
        assert_eq!(Condition::new("Speed", ConditionMode::Less, 0.2).layout(), ConditionLayout::Compare);
        assert_eq!(ConditionLayout::Flag.fields(), &[ConditionField::Parameter, ConditionField::Mode]);
    }

    #[test]
    fn mode_options_by_type() {
        assert_eq!(modes_for(ParameterType::Trigger), &[ConditionMode::If]);
        assert!(modes_for(ParameterType::Int).contains(&ConditionMode::NotEqual));
        assert!(!modes_for(ParameterType::Float).contains(&ConditionMode::Equals));
    }

    #[test]
    fn parameter_change_resets_mode() {
        let reg = registry();
        let mut c = Condition::new("Speed", ConditionMode::Less, 0.5);
        c.apply_edit(&ConditionEdit::Parameter("Grounded".into()), &reg);
        assert_eq!(c.parameter, "Grounded");
        assert_eq!(c.mode, ConditionMode::If);

        c.apply_edit(&ConditionEdit::Parameter("Weapon".into()), &reg);
        assert_eq!(c.mode, ConditionMode::Greater);
        // threshold untouched by a parameter change
        assert_eq!(c.threshold, 0.5);
    }

    #[test]
    fn same_parameter_keeps_mode() {
        let reg = registry();
        let mut c = Condition::new("Speed", ConditionMode::Less, 0.5);
        c.apply_edit(&ConditionEdit::Parameter("Speed".into()), &reg);
        assert_eq!(c.mode, ConditionMode::Less);
    }

    #[test]
    fn unknown_parameter_rejected() {
        let reg = registry();
        let c = Condition::new("Speed", ConditionMode::Greater, 0.5);
        let err = c.check_edit(&ConditionEdit::Parameter("Missing".into()), &reg).unwrap_err();
        assert!(matches!(err, EngineError::InvalidReference { .. }));
    }

    #[test]
    fn mode_must_fit_parameter_type() {
        let reg = registry();
        let c = Condition::new("Speed", ConditionMode::Greater, 0.5);
        assert!(c.check_edit(&ConditionEdit::Mode(ConditionMode::Less), &reg).is_ok());
        assert!(c.check_edit(&ConditionEdit::Mode(ConditionMode::If), &reg).is_err());

        let dangling = Condition::new("Gone", ConditionMode::Greater, 0.5);
        assert!(dangling.check_edit(&ConditionEdit::Mode(ConditionMode::If), &reg).is_ok());
    }

    #[test]
    fn threshold_must_be_finite() {
        let reg = registry();
        let c = Condition::new("Speed", ConditionMode::Greater, 0.5);
        assert!(c.check_edit(&ConditionEdit::Threshold(f32::NAN), &reg).is_err());
        assert!(Condition::parse_edit(ConditionField::Threshold, "abc").is_err());
        assert_eq!(
            Condition::parse_edit(ConditionField::Threshold, " 0.8 ").unwrap(),
            ConditionEdit::Threshold(0.8)
        );
    }

    #[test]
    fn default_uses_first_parameter() {
        let reg = ParameterRegistry::new().with("Grounded", ParameterType::Bool);
        let c = Condition::new_default(&reg).unwrap();
        assert_eq!(c, Condition::new("Grounded", ConditionMode::If, 0.0));

        let err = Condition::new_default(&ParameterRegistry::new()).unwrap_err();
        assert_eq!(err, EngineError::EmptyRegistry { schema: "condition" });
    }

    #[test]
    fn editable_fields_of_views() {
        let reg = registry();
        let exact = (ConditionTier::Exact.tier().project)(&Condition::new("Speed", ConditionMode::Greater, 0.5));
        assert_eq!(
            Condition::editable_fields(&exact, &reg),
            vec![ConditionField::Parameter, ConditionField::Mode, ConditionField::Threshold]
        );

        let pm = (ConditionTier::ParameterMode.tier().project)(&Condition::new("Speed", ConditionMode::Greater, 0.5));
        assert_eq!(pm.threshold, None);
        assert_eq!(
            Condition::editable_fields(&pm, &reg),
            vec![ConditionField::Parameter, ConditionField::Mode]
        );

        let p = (ConditionTier::Parameter.tier().project)(&Condition::new("Speed", ConditionMode::Greater, 0.5));
        assert_eq!(Condition::editable_fields(&p, &reg), vec![ConditionField::Parameter]);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("If_Not".parse::<ConditionMode>().unwrap(), ConditionMode::IfNot);
        assert_eq!(">".parse::<ConditionMode>().unwrap(), ConditionMode::Greater);
        assert!("sometimes".parse::<ConditionMode>().is_err());
        assert!(Condition::parse_field("speed").is_err());
    }
}
