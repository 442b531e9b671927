//! Per-schema hooks for the generic commands: which pipeline to run and how
//! to print a canonical view.

use multiedit_core::ParameterRegistry;
use multiedit_document::Clipboard;
use multiedit_engine::{
    ActionKind, ActionLayout, ActionView, Condition, ConditionLayout, ConditionView, EngineConfig,
    ParameterAction, Pipeline,
};

pub trait Schema: Clipboard {
    /// Plural noun used in output.
    const LABEL: &'static str;

    fn pipeline(config: &EngineConfig) -> Pipeline<Self>;

    /// One-line rendering of the fields an entry shares.
    fn describe(view: &Self::View, registry: &ParameterRegistry) -> String;
}

impl Schema for Condition {
    const LABEL: &'static str = "conditions";

    fn pipeline(config: &EngineConfig) -> Pipeline<Self> {
        config.condition_pipeline()
    }

    fn describe(view: &ConditionView, _registry: &ParameterRegistry) -> String {
        let mut out = view.parameter.clone();
        if let Some(mode) = view.mode {
            out.push(' ');
            out.push_str(mode.as_str());
            // If/IfNot have no threshold to show
            if ConditionLayout::for_mode(mode) == ConditionLayout::Compare {
                if let Some(t) = view.threshold {
                    out.push_str(&format!(" {t}"));
                }
            }
        }
        out
    }
}

impl Schema for ParameterAction {
    const LABEL: &'static str = "actions";

    fn pipeline(config: &EngineConfig) -> Pipeline<Self> {
        config.action_pipeline()
    }

    fn describe(view: &ActionView, registry: &ParameterRegistry) -> String {
        let Some(kind) = view.kind else {
            return "(mixed)".to_string();
        };
        let name = view.name.as_deref().unwrap_or("*");
        let mut out = match kind {
            ActionKind::Copy => {
                let source = view.source.as_deref().unwrap_or("*");
                format!("copy {source} -> {name}")
            }
            _ => format!("{kind} {name}"),
        };
        if view.name.is_none() {
            return out;
        }

        let value = |v: Option<f32>| v.map(|v| v.to_string()).unwrap_or_else(|| "*".into());
        match ActionLayout::resolve(kind, view.name.as_deref(), registry) {
            ActionLayout::Set | ActionLayout::Add => {
                out.push_str(&format!(" value={}", value(view.value)));
            }
            ActionLayout::RandomChance => {
                out.push_str(&format!(" chance={}", value(view.chance)));
            }
            ActionLayout::RandomRange => {
                out.push_str(&format!(
                    " range={}..{}",
                    value(view.value_min),
                    value(view.value_max)
                ));
            }
            ActionLayout::Copy => {}
        }
        out
    }
}
