use std::fmt;
use std::path::PathBuf;

use multiedit_core::SourceId;
use multiedit_engine::EngineError;

#[derive(Debug)]
pub enum DocumentError {
    /// Reading or writing the document file failed.
    Io { path: PathBuf, message: String },
    /// The document is not valid JSON for the scene schema.
    Json(String),
    /// Two objects share an id.
    DuplicateId(SourceId),
    /// Two parameters share a name.
    DuplicateParameter(String),
    Engine(EngineError),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Json(msg) => write!(f, "invalid document: {msg}"),
            Self::DuplicateId(id) => write!(f, "invalid document: object id {id} used twice"),
            Self::DuplicateParameter(name) => {
                write!(f, "invalid document: parameter '{name}' defined twice")
            }
            Self::Engine(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DocumentError {}

impl From<EngineError> for DocumentError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}
