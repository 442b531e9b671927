//! Command implementations. Each edit command loads the document, runs one
//! consolidation pass, applies one batch edit, and saves in place with a
//! single-level undo record next to the document.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use multiedit_core::{Selection, SourceId};
use multiedit_document::{Document, EditSession, Scene, SceneEvent};
use multiedit_engine::{
    BackRef, ConsolidatedEntry, ConsolidationReport, EditHost, EngineConfig, MutationReport,
    Record, SelectionProvider,
};
use serde::{Deserialize, Serialize};

use crate::exit_codes::{EXIT_FIELD, EXIT_NOTHING_TO_UNDO, EXIT_UNKNOWN_SOURCE, EXIT_USAGE};
use crate::schema::Schema;
use crate::CliError;

// ============================================================================
// Loading and saving
// ============================================================================

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("{}: {e}", path.display())))?;
    EngineConfig::from_toml(&content).map_err(|e| {
        CliError::from(e).with_hint(format!("check {}", path.display()))
    })
}

/// Load the document, keeping the original text for the undo record.
fn load_document(path: &Path) -> Result<(Document, String), CliError> {
    let original = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("{}: {e}", path.display())))?;
    let doc = Document::from_json(&original)?;
    Ok((doc, original))
}

#[derive(Debug, Serialize, Deserialize)]
struct UndoRecord {
    label: String,
    /// Full document text before the edit.
    document: String,
}

fn undo_path(doc: &Path) -> PathBuf {
    let mut path = doc.as_os_str().to_owned();
    path.push(".undo");
    PathBuf::from(path)
}

/// Save the edited document, recording the previous text for `undo`.
/// The stored selection is written back unchanged, whatever `--select` chose.
/// An empty report leaves both files untouched.
fn save_edit(
    path: &Path,
    original: String,
    stored_selection: Selection,
    doc: &mut Document,
    report: &MutationReport,
) -> Result<(), CliError> {
    for event in doc.scene.drain_events() {
        if let SceneEvent::TransactionCommitted(commit) = event {
            log::debug!("committed '{}' on {} object(s)", commit.label, commit.sources.len());
        }
    }
    if report.is_empty() {
        println!("nothing to do");
        return Ok(());
    }

    let record = UndoRecord {
        label: report.label.clone(),
        document: original,
    };
    let json = serde_json::to_string(&record).map_err(|e| CliError::io(e.to_string()))?;
    let backup = undo_path(path);
    std::fs::write(&backup, json)
        .map_err(|e| CliError::io(format!("{}: {e}", backup.display())))?;
    doc.scene.selection = stored_selection;
    doc.save(path)?;

    println!("{} ({} records)", report.label, report.touched.len());
    Ok(())
}

// ============================================================================
// Selection
// ============================================================================

/// Replace the document selection with `ids` when given. Every id must be an
/// object owning `T` records. Returns the selection stored in the document.
fn apply_selection<T: Schema>(doc: &mut Document, ids: &[SourceId]) -> Result<Selection, CliError> {
    let stored = doc.scene.selection.clone();
    if ids.is_empty() {
        return Ok(stored);
    }
    check_kind::<T>(doc, ids)?;
    doc.scene.select(ids.iter().copied());
    Ok(stored)
}

fn check_kind<T: Schema>(doc: &Document, ids: &[SourceId]) -> Result<(), CliError> {
    for &id in ids {
        if doc.scene.kind_of(id) != Some(T::OBJECT_KIND) {
            return Err(CliError {
                code: EXIT_UNKNOWN_SOURCE,
                message: format!("{id} is not a {}", T::OBJECT_KIND),
                hint: Some(format!("{} live on {} objects", T::LABEL, T::OBJECT_KIND)),
            });
        }
    }
    Ok(())
}

fn selected_ids<T: Schema>(doc: &Document) -> Result<Vec<SourceId>, CliError> {
    let ids = doc.scene.selected(T::OBJECT_KIND);
    if ids.is_empty() {
        return Err(CliError::args(format!("no {} objects selected", T::OBJECT_KIND))
            .with_hint("pass --select with comma separated ids"));
    }
    Ok(ids)
}

/// Entries are numbered from 1 in discovery order.
fn pick_entry<T: Record>(
    report: &ConsolidationReport<T>,
    number: usize,
) -> Result<&ConsolidatedEntry<T>, CliError> {
    number
        .checked_sub(1)
        .and_then(|i| report.entries.get(i))
        .ok_or_else(|| {
            CliError::args(format!(
                "entry {number} out of range ({} entries)",
                report.entries.len()
            ))
            .with_hint("run `medit show` to list entries; numbers change after every edit")
        })
}

fn field_list<T: Record>(fields: &[T::Field]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// show
// ============================================================================

#[derive(Serialize)]
struct ShowOutput<'a, V> {
    kind: &'static str,
    sources: Vec<SourceId>,
    entries: Vec<ShowEntry<'a, V>>,
    unmatched: &'a [BackRef],
}

#[derive(Serialize)]
struct ShowEntry<'a, V> {
    entry: usize,
    tier: &'static str,
    canonical: &'a V,
    editable: Vec<String>,
    references: &'a [BackRef],
}

pub fn cmd_show<T: Schema>(
    doc_path: &Path,
    config: &EngineConfig,
    select: &[SourceId],
    json: bool,
) -> Result<(), CliError>
where
    Scene: EditHost<T>,
{
    let (mut doc, _) = load_document(doc_path)?;
    apply_selection::<T>(&mut doc, select)?;
    let report = doc.consolidate::<T>(&T::pipeline(config));
    let sources = doc.scene.selected(T::OBJECT_KIND);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let output = ShowOutput {
            kind: T::LABEL,
            sources,
            entries: report
                .entries
                .iter()
                .enumerate()
                .map(|(i, e)| ShowEntry {
                    entry: i + 1,
                    tier: e.tier,
                    canonical: &e.canonical,
                    editable: T::editable_fields(&e.canonical, &doc.parameters)
                        .iter()
                        .map(|f| f.to_string())
                        .collect(),
                    references: &e.references,
                })
                .collect(),
            unmatched: &report.unmatched,
        };
        let text = serde_json::to_string_pretty(&output).map_err(|e| CliError::io(e.to_string()))?;
        writeln!(out, "{text}").map_err(|e| CliError::io(e.to_string()))?;
        return Ok(());
    }

    writeln!(
        out,
        "{} {} objects selected, {} shared {}, {} unmatched",
        report.source_count,
        T::OBJECT_KIND,
        report.entries.len(),
        T::LABEL,
        report.unmatched.len()
    )
    .map_err(|e| CliError::io(e.to_string()))?;

    for (i, entry) in report.entries.iter().enumerate() {
        let editable = T::editable_fields(&entry.canonical, &doc.parameters);
        writeln!(
            out,
            "[{}] {:<15} {}  (editable: {})",
            i + 1,
            entry.tier,
            T::describe(&entry.canonical, &doc.parameters),
            field_list::<T>(&editable)
        )
        .map_err(|e| CliError::io(e.to_string()))?;
    }

    if !report.unmatched.is_empty() {
        let refs: Vec<String> = report
            .unmatched
            .iter()
            .map(|r| format!("{}[{}]", r.source, r.index))
            .collect();
        writeln!(out, "unmatched: {}", refs.join(" ")).map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// set / add / remove
// ============================================================================

pub fn cmd_set<T: Schema>(
    doc_path: &Path,
    config: &EngineConfig,
    select: &[SourceId],
    entry: usize,
    field: &str,
    value: &str,
) -> Result<(), CliError>
where
    Scene: EditHost<T>,
{
    let (mut doc, original) = load_document(doc_path)?;
    let stored = apply_selection::<T>(&mut doc, select)?;
    let report = doc.consolidate::<T>(&T::pipeline(config));
    let target = pick_entry(&report, entry)?;

    let field = T::parse_field(field)?;
    let editable = T::editable_fields(&target.canonical, &doc.parameters);
    if !editable.contains(&field) {
        return Err(CliError {
            code: EXIT_FIELD,
            message: format!("'{field}' is not shared by every record in entry {entry}"),
            hint: Some(format!("editable: {}", field_list::<T>(&editable))),
        });
    }
    let edit = T::parse_edit(field, value)?;

    let written = doc.mutator_with(config).set_field(target, &edit)?;
    save_edit(doc_path, original, stored, &mut doc, &written)
}

pub fn cmd_add<T: Schema>(doc_path: &Path, config: &EngineConfig, select: &[SourceId]) -> Result<(), CliError>
where
    Scene: EditHost<T>,
{
    let (mut doc, original) = load_document(doc_path)?;
    let stored = apply_selection::<T>(&mut doc, select)?;
    let targets = selected_ids::<T>(&doc)?;

    let written = doc.mutator_with(config).add_default::<T>(&targets)?;
    save_edit(doc_path, original, stored, &mut doc, &written)
}

pub fn cmd_remove<T: Schema>(
    doc_path: &Path,
    config: &EngineConfig,
    select: &[SourceId],
    entry: usize,
) -> Result<(), CliError>
where
    Scene: EditHost<T>,
{
    let (mut doc, original) = load_document(doc_path)?;
    let stored = apply_selection::<T>(&mut doc, select)?;
    let report = doc.consolidate::<T>(&T::pipeline(config));
    let target = pick_entry(&report, entry)?;

    let written = doc.mutator_with(config).remove(target)?;
    save_edit(doc_path, original, stored, &mut doc, &written)
}

// ============================================================================
// copy
// ============================================================================

/// Copy the shared records of `from` (all entries, or just `entry`) and
/// append them to every object in `to`.
pub fn cmd_copy<T: Schema>(
    doc_path: &Path,
    config: &EngineConfig,
    from: &[SourceId],
    to: &[SourceId],
    entry: Option<usize>,
) -> Result<(), CliError>
where
    Scene: EditHost<T>,
{
    let (mut doc, original) = load_document(doc_path)?;
    let stored = apply_selection::<T>(&mut doc, from)?;
    check_kind::<T>(&doc, to)?;

    let report = doc.consolidate::<T>(&T::pipeline(config));
    let entries = match entry {
        Some(n) => vec![pick_entry(&report, n)?.clone()],
        None => report.entries.clone(),
    };

    let mut session = EditSession::new();
    let copied = session.copy(&doc.scene, &entries)?;
    if copied == 0 {
        return Err(CliError::args(format!("no shared {} to copy", T::LABEL))
            .with_hint("the source objects have no records in common"));
    }

    let mut mutator = doc.mutator_with(config);
    let written = session.paste::<T, _>(&mut mutator, to)?;
    save_edit(doc_path, original, stored, &mut doc, &written)
}

// ============================================================================
// undo
// ============================================================================

pub fn cmd_undo(doc_path: &Path) -> Result<(), CliError> {
    let backup = undo_path(doc_path);
    let content = match std::fs::read_to_string(&backup) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CliError {
                code: EXIT_NOTHING_TO_UNDO,
                message: format!("nothing to undo for {}", doc_path.display()),
                hint: None,
            });
        }
        Err(e) => return Err(CliError::io(format!("{}: {e}", backup.display()))),
    };
    let record: UndoRecord = serde_json::from_str(&content).map_err(|e| CliError {
        code: EXIT_USAGE,
        message: format!("{}: corrupt undo record ({e})", backup.display()),
        hint: Some("delete the file to discard it".into()),
    })?;

    // Refuse to restore something that wouldn't load.
    Document::from_json(&record.document)?;

    std::fs::write(doc_path, &record.document)
        .map_err(|e| CliError::io(format!("{}: {e}", doc_path.display())))?;
    std::fs::remove_file(&backup)
        .map_err(|e| CliError::io(format!("{}: {e}", backup.display())))?;

    log::info!("restored {} from {}", doc_path.display(), backup.display());
    println!("undone: {}", record.label);
    Ok(())
}
