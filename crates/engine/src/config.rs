use std::collections::HashSet;

use serde::Deserialize;

use crate::action::{self, ActionTier, ParameterAction};
use crate::condition::{self, Condition, ConditionTier};
use crate::error::EngineError;
use crate::mutator::DEFAULT_LABEL_PREFIX;
use crate::pipeline::Pipeline;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub conditions: ConditionConfig,
    #[serde(default)]
    pub actions: ActionConfig,
    #[serde(default)]
    pub edit: EditConfig,
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionConfig {
    #[serde(default = "default_condition_tiers")]
    pub tiers: Vec<ConditionTier>,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            tiers: default_condition_tiers(),
        }
    }
}

fn default_condition_tiers() -> Vec<ConditionTier> {
    ConditionTier::ALL.to_vec()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    #[serde(default = "default_action_tiers")]
    pub tiers: Vec<ActionTier>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            tiers: default_action_tiers(),
        }
    }
}

fn default_action_tiers() -> Vec<ActionTier> {
    ActionTier::ALL.to_vec()
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EditConfig {
    /// Prefix of every transaction label ("Batch edit: set condition mode").
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            label_prefix: default_label_prefix(),
        }
    }
}

fn default_label_prefix() -> String {
    DEFAULT_LABEL_PREFIX.to_string()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        check_tiers(
            "conditions",
            &self.conditions.tiers,
            |t| t.rank(),
        )?;
        check_tiers("actions", &self.actions.tiers, |t| t.rank())?;

        if self.edit.label_prefix.trim().is_empty() {
            return Err(EngineError::ConfigValidation(
                "edit.label_prefix must not be empty".into(),
            ));
        }

        Ok(())
    }

    pub fn condition_pipeline(&self) -> Pipeline<Condition> {
        condition::pipeline(&self.conditions.tiers)
    }

    pub fn action_pipeline(&self) -> Pipeline<ParameterAction> {
        action::pipeline(&self.actions.tiers)
    }
}

/// Tier lists must be non-empty, duplicate-free, and most specific first.
fn check_tiers<T>(section: &str, tiers: &[T], rank: impl Fn(&T) -> usize) -> Result<(), EngineError>
where
    T: std::fmt::Debug + Eq + std::hash::Hash,
{
    if tiers.is_empty() {
        return Err(EngineError::ConfigValidation(format!(
            "{section}.tiers must list at least one tier"
        )));
    }

    let mut seen = HashSet::new();
    for tier in tiers {
        if !seen.insert(tier) {
            return Err(EngineError::ConfigValidation(format!(
                "{section}.tiers: duplicate tier {tier:?}"
            )));
        }
    }

    for pair in tiers.windows(2) {
        if rank(&pair[0]) > rank(&pair[1]) {
            return Err(EngineError::ConfigValidation(format!(
                "{section}.tiers: {:?} listed before more specific {:?}",
                pair[0], pair[1]
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[conditions]
tiers = ["exact", "parameter_mode"]

[actions]
tiers = ["exact", "target", "kind"]

[edit]
label_prefix = "Multi-edit"
"#;

    #[test]
    fn parse_full() {
        let config = EngineConfig::from_toml(FULL).unwrap();
        assert_eq!(
            config.conditions.tiers,
            vec![ConditionTier::Exact, ConditionTier::ParameterMode]
        );
        assert_eq!(config.actions.tiers.len(), 3);
        assert_eq!(config.edit.label_prefix, "Multi-edit");
        assert_eq!(config.condition_pipeline().tier_names(), vec!["exact", "parameter_mode"]);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config.conditions.tiers, ConditionTier::ALL.to_vec());
        assert_eq!(config.action_pipeline().tier_names(), vec!["exact", "target", "kind"]);
        assert_eq!(config.edit.label_prefix, "Batch edit");
    }

    #[test]
    fn out_of_order_rejected() {
        let input = r#"
[conditions]
tiers = ["parameter", "exact"]
"#;
        let err = EngineConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, EngineError::ConfigValidation(_)));
        assert!(err.to_string().contains("more specific"));
    }

    #[test]
    fn duplicates_rejected() {
        let input = r#"
[actions]
tiers = ["exact", "exact"]
"#;
        let err = EngineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn empty_tier_list_rejected() {
        let input = r#"
[conditions]
tiers = []
"#;
        assert!(matches!(
            EngineConfig::from_toml(input),
            Err(EngineError::ConfigValidation(_))
        ));
    }

    #[test]
    fn unknown_tier_is_parse_error() {
        let input = r#"
[conditions]
tiers = ["fuzzy"]
"#;
        assert!(matches!(
            EngineConfig::from_toml(input),
            Err(EngineError::ConfigParse(_))
        ));
    }
}
