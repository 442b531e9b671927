//! CLI Exit Code Registry
//!
//! Single source of truth for `medit` exit codes. Scripts rely on them.
//!
//! | Range | Domain    | Description                                  |
//! |-------|-----------|----------------------------------------------|
//! | 0     | Universal | Success                                      |
//! | 1     | Universal | General error (unspecified)                  |
//! | 2     | Universal | Usage error (bad args, unknown entry number) |
//! | 3-9   | document  | File, document and config problems           |
//! | 10-19 | edit      | Rejected batch edits                         |
//! | 20-29 | history   | Undo                                         |

use multiedit_document::DocumentError;
use multiedit_engine::EngineError;

// =============================================================================
// Universal (0-2)
// =============================================================================

pub const EXIT_SUCCESS: u8 = 0;

/// Avoid; prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Document (3-9)
// =============================================================================

/// Document or config file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Document JSON is malformed or inconsistent (duplicate ids or parameters).
pub const EXIT_DOCUMENT: u8 = 4;

/// Engine config failed to parse or validate.
pub const EXIT_CONFIG: u8 = 5;

// =============================================================================
// Edit (10-19)
// =============================================================================

/// A name-valued field names a parameter the registry doesn't have.
pub const EXIT_INVALID_REFERENCE: u8 = 10;

/// A source changed between consolidation and the write.
pub const EXIT_STALE: u8 = 11;

/// Value out of range, unparseable, or not allowed for the record.
pub const EXIT_INVALID_VALUE: u8 = 12;

/// Field name unknown or not editable on the entry.
pub const EXIT_FIELD: u8 = 13;

/// Default record requested with no parameters defined.
pub const EXIT_EMPTY_REGISTRY: u8 = 14;

/// A selected or target id is not an object of the requested kind.
pub const EXIT_UNKNOWN_SOURCE: u8 = 15;

// =============================================================================
// History (20-29)
// =============================================================================

/// `undo` with no recorded edit.
pub const EXIT_NOTHING_TO_UNDO: u8 = 20;

pub fn engine_exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::InvalidReference { .. } => EXIT_INVALID_REFERENCE,
        EngineError::StaleReference { .. } => EXIT_STALE,
        EngineError::UnknownSource(_) => EXIT_UNKNOWN_SOURCE,
        EngineError::InvalidValue { .. } => EXIT_INVALID_VALUE,
        EngineError::UnknownField { .. } => EXIT_FIELD,
        EngineError::EmptyRegistry { .. } => EXIT_EMPTY_REGISTRY,
        EngineError::ConfigParse(_) | EngineError::ConfigValidation(_) => EXIT_CONFIG,
    }
}

pub fn document_exit_code(err: &DocumentError) -> u8 {
    match err {
        DocumentError::Io { .. } => EXIT_IO,
        DocumentError::Json(_)
        | DocumentError::DuplicateId(_)
        | DocumentError::DuplicateParameter(_) => EXIT_DOCUMENT,
        DocumentError::Engine(e) => engine_exit_code(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiedit_core::SourceId;

    #[test]
    fn ranges_do_not_overlap() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_IO,
            EXIT_DOCUMENT,
            EXIT_CONFIG,
            EXIT_INVALID_REFERENCE,
            EXIT_STALE,
            EXIT_INVALID_VALUE,
            EXIT_FIELD,
            EXIT_EMPTY_REGISTRY,
            EXIT_UNKNOWN_SOURCE,
            EXIT_NOTHING_TO_UNDO,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn document_errors_pass_engine_codes_through() {
        let err = DocumentError::Engine(EngineError::UnknownSource(SourceId(4)));
        assert_eq!(document_exit_code(&err), EXIT_UNKNOWN_SOURCE);
        assert_eq!(document_exit_code(&DocumentError::Json("x".into())), EXIT_DOCUMENT);
    }
}
