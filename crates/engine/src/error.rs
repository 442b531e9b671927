use std::fmt;

use multiedit_core::SourceId;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A name-valued field points at a parameter the registry doesn't know.
    InvalidReference { field: String, name: String },
    /// The source changed since the entry was consolidated, or the
    /// referenced index no longer exists.
    StaleReference {
        source: SourceId,
        index: usize,
        expected_revision: u64,
        found_revision: Option<u64>,
    },
    /// The host has no source with this id.
    UnknownSource(SourceId),
    /// Value is out of range or not allowed for the record.
    InvalidValue { field: String, value: String, reason: String },
    /// Field name not part of the schema.
    UnknownField { schema: &'static str, field: String },
    /// A default record was requested but the registry has no parameters.
    EmptyRegistry { schema: &'static str },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty tier list, bad ordering, etc.).
    ConfigValidation(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidReference { field, name } => {
                write!(f, "field '{field}': no parameter named '{name}'")
            }
            Self::StaleReference {
                source,
                index,
                expected_revision,
                found_revision,
            } => match found_revision {
                Some(found) if found != expected_revision => write!(
                    f,
                    "source {source} item {index}: stale reference (revision {expected_revision}, now {found})"
                ),
                Some(_) => write!(f, "source {source} item {index}: index out of range"),
                None => write!(f, "source {source} item {index}: source no longer exists"),
            },
            Self::UnknownSource(id) => write!(f, "unknown source {id}"),
            Self::InvalidValue { field, value, reason } => {
                write!(f, "field '{field}': invalid value '{value}' ({reason})")
            }
            Self::UnknownField { schema, field } => {
                write!(f, "{schema}: unknown field '{field}'")
            }
            Self::EmptyRegistry { schema } => {
                write!(f, "cannot create default {schema}: no parameters defined")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
