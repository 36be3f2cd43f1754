//! Note export and import for Graphite
//!
//! Exports serialize the full collection or a single note as pretty-printed
//! JSON files. Imports accept a JSON array of note-like objects: the payload
//! is rejected wholesale only when the top-level value is not an array, and
//! individual malformed entries are repaired with the same rules as a store
//! load.

use crate::error::{Error, Result};
use crate::note::Note;
use crate::store::repair_note;
use log::info;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Default file name for a full-collection export.
pub const COLLECTION_EXPORT_NAME: &str = "notes-export.json";

// ─────────────────────────────────────────────────────────────────────────────
// Export
// ─────────────────────────────────────────────────────────────────────────────

/// Write the full note collection as pretty-printed JSON.
pub fn export_collection(notes: &[Note], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(notes)?;
    fs::write(path, json).map_err(|e| Error::StoreSave {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    info!("Exported {} note(s) to {}", notes.len(), path.display());
    Ok(())
}

/// Write a single note as pretty-printed JSON.
pub fn export_note(note: &Note, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(note)?;
    fs::write(path, json).map_err(|e| Error::StoreSave {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    info!("Exported note {} to {}", note.id, path.display());
    Ok(())
}

/// Derive a filesystem-safe file name (without extension) from a note title:
/// strip everything outside word characters, dashes, and spaces, then
/// collapse whitespace runs into dashes. Falls back to `note` when nothing
/// survives.
pub fn safe_filename(title: &str) -> String {
    fn strip_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"[^\w\- ]+").expect("valid pattern"))
    }
    fn whitespace_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\s+").expect("valid pattern"))
    }

    let stripped = strip_re().replace_all(title, "");
    let name = whitespace_re()
        .replace_all(stripped.trim(), "-")
        .into_owned();
    if name.is_empty() {
        "note".to_string()
    } else {
        name
    }
}

/// Default export file name for a single note, derived from its title.
pub fn note_export_name(note: &Note) -> String {
    format!("{}.json", safe_filename(&note.title))
}

// ─────────────────────────────────────────────────────────────────────────────
// Import
// ─────────────────────────────────────────────────────────────────────────────

/// Parse an import payload.
///
/// # Errors
///
/// `Error::ImportRejected` when the text is not valid JSON or its top-level
/// value is not an array; the caller keeps its current state in that case.
/// Malformed entries inside the array never fail the import; they are
/// repaired (objects) or dropped (non-objects).
pub fn import_notes(text: &str) -> Result<Vec<Note>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::ImportRejected(format!("invalid JSON: {}", e)))?;

    let entries = value
        .as_array()
        .ok_or_else(|| Error::ImportRejected("top-level value is not an array".to_string()))?;

    let notes: Vec<Note> = entries.iter().filter_map(repair_note).collect();
    info!(
        "Imported {} note(s) from a payload of {} entries",
        notes.len(),
        entries.len()
    );
    Ok(notes)
}

/// Read and parse an import file.
pub fn import_notes_from_file(path: &Path) -> Result<Vec<Note>> {
    let text = fs::read_to_string(path).map_err(|e| Error::StoreLoad {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    import_notes(&text)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
