//! Note store file persistence
//!
//! This module handles loading and saving the note collection to a
//! platform-specific data directory with robust error handling and
//! graceful fallback to an empty collection.

use crate::error::{Error, Result, ResultExt};
use crate::note::Note;
use crate::store::repair_note;
use log::{debug, info, warn};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used for the data directory
const APP_NAME: &str = "graphite";

/// Store file name; the `.v3` component is the store schema version
/// (v3: theme + markdown + undo/redo + export-one).
const STORE_FILE_NAME: &str = "notes.v3.json";

/// Backup store file name (used during atomic writes)
const STORE_BACKUP_NAME: &str = "notes.v3.json.bak";

/// Environment variable overriding the data directory (used by tests and
/// scripted setups).
const DATA_DIR_ENV: &str = "GRAPHITE_DATA_DIR";

// ─────────────────────────────────────────────────────────────────────────────
// Platform-Specific Directory Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Get the data directory holding the note store.
///
/// `GRAPHITE_DATA_DIR` wins when set; otherwise the platform data directory
/// (e.g. `~/.local/share/graphite/` on Linux) is used.
///
/// # Errors
///
/// Returns `Error::DataDirNotFound` if no directory can be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(Error::DataDirNotFound)
}

/// Get the full path to the note store file.
pub fn get_store_file_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(STORE_FILE_NAME))
}

/// Ensure the data directory exists, creating it if necessary.
fn ensure_data_dir() -> Result<PathBuf> {
    let data_dir = get_data_dir()?;

    if !data_dir.exists() {
        debug!("Creating data directory: {}", data_dir.display());
        fs::create_dir_all(&data_dir).map_err(|e| Error::StoreSave {
            path: data_dir.clone(),
            source: Box::new(e),
        })?;
    }

    Ok(data_dir)
}

// ─────────────────────────────────────────────────────────────────────────────
// Load
// ─────────────────────────────────────────────────────────────────────────────

/// Load the note collection from the default store location.
///
/// Falls back to an empty collection on any failure: a missing file is a
/// first run, and a corrupt file must not brick the application.
pub fn load_notes() -> Vec<Note> {
    let path = match get_store_file_path() {
        Ok(path) => path,
        Err(e) => {
            warn!("Cannot resolve store path: {}. Starting empty.", e);
            return Vec::new();
        }
    };
    load_notes_from(&path).unwrap_or_warn_default(Vec::new(), "Failed to load note store")
}

/// Load and repair the note collection from a specific file.
///
/// Entries are repaired individually; only a missing file, unreadable file,
/// invalid JSON, or a non-array top level produce an empty/erroneous result.
pub fn load_notes_from(path: &Path) -> Result<Vec<Note>> {
    if !path.exists() {
        debug!("Store file not found at {}, starting empty", path.display());
        return Ok(Vec::new());
    }

    debug!("Loading notes from: {}", path.display());

    let contents = fs::read_to_string(path).map_err(|e| Error::StoreLoad {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    if contents.trim().is_empty() {
        debug!("Store file is empty, starting empty");
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(&contents)?;
    let entries = value.as_array().ok_or_else(|| Error::StoreParse {
        message: "top-level value is not an array".to_string(),
        source: None,
    })?;

    let notes: Vec<Note> = entries.iter().filter_map(repair_note).collect();
    if notes.len() < entries.len() {
        warn!(
            "Dropped {} malformed entries while loading the store",
            entries.len() - notes.len()
        );
    }

    info!("Loaded {} note(s) from {}", notes.len(), path.display());
    Ok(notes)
}

// ─────────────────────────────────────────────────────────────────────────────
// Save
// ─────────────────────────────────────────────────────────────────────────────

/// Save the note collection to the default store location.
///
/// Performs an atomic write: serialize to a backup file first, then rename
/// over the store file.
pub fn save_notes(notes: &[Note]) -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let store_path = data_dir.join(STORE_FILE_NAME);
    let backup_path = data_dir.join(STORE_BACKUP_NAME);

    save_notes_to(notes, &store_path, &backup_path)
}

/// Save the note collection to a specific file via a backup path.
pub fn save_notes_to(notes: &[Note], store_path: &Path, backup_path: &Path) -> Result<()> {
    debug!("Saving {} note(s) to: {}", notes.len(), store_path.display());

    let json = serde_json::to_string_pretty(notes).map_err(|e| Error::StoreSave {
        path: store_path.to_path_buf(),
        source: Box::new(e),
    })?;

    // Write to backup file first (atomic write pattern)
    fs::write(backup_path, &json).map_err(|e| Error::StoreSave {
        path: backup_path.to_path_buf(),
        source: Box::new(e),
    })?;

    // Replace original with backup
    fs::rename(backup_path, store_path).map_err(|e| Error::StoreSave {
        path: store_path.to_path_buf(),
        source: Box::new(e),
    })?;

    Ok(())
}

/// Save the note collection, ignoring errors.
///
/// Persistence is fire-and-forget: a failed write must not interrupt the
/// current operation. The failure is still visible in the log.
///
/// # Returns
///
/// Returns `true` if the save was successful, `false` otherwise.
pub fn save_notes_silent(notes: &[Note]) -> bool {
    match save_notes(notes) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to save note store: {}", e);
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Color;
    use tempfile::TempDir;

    /// Helper holding a temporary store location.
    struct TestEnv {
        _temp_dir: TempDir,
        store_file: PathBuf,
        backup_file: PathBuf,
    }

    impl TestEnv {
        fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let store_file = temp_dir.path().join(STORE_FILE_NAME);
            let backup_file = temp_dir.path().join(STORE_BACKUP_NAME);
            Self {
                _temp_dir: temp_dir,
                store_file,
                backup_file,
            }
        }

        fn write_store(&self, content: &str) {
            fs::write(&self.store_file, content).expect("Failed to write store");
        }
    }

    fn sample_note(title: &str) -> Note {
        let mut note = Note::new();
        note.title = title.to_string();
        note.body = format!("body of {}", title);
        note
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let env = TestEnv::new();
        let notes = load_notes_from(&env.store_file).unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn test_load_empty_file_is_empty() {
        let env = TestEnv::new();
        env.write_store("   \n");
        let notes = load_notes_from(&env.store_file).unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn test_load_invalid_json_errors() {
        let env = TestEnv::new();
        env.write_store("{ not json");
        assert!(load_notes_from(&env.store_file).is_err());
    }

    #[test]
    fn test_load_non_array_top_level_errors() {
        let env = TestEnv::new();
        env.write_store(r#"{"id": "not-an-array"}"#);
        let err = load_notes_from(&env.store_file).unwrap_err();
        assert!(matches!(err, Error::StoreParse { .. }));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let env = TestEnv::new();
        let mut first = sample_note("First");
        first.color = Color::Blue;
        first.record_edit("earlier");
        let notes = vec![first, sample_note("Second")];

        save_notes_to(&notes, &env.store_file, &env.backup_file).unwrap();
        let loaded = load_notes_from(&env.store_file).unwrap();

        assert_eq!(loaded, notes);
    }

    #[test]
    fn test_save_leaves_no_backup_file() {
        let env = TestEnv::new();
        save_notes_to(&[sample_note("x")], &env.store_file, &env.backup_file).unwrap();
        assert!(env.store_file.exists());
        assert!(!env.backup_file.exists());
    }

    #[test]
    fn test_load_repairs_damaged_entries() {
        let env = TestEnv::new();
        env.write_store(
            r#"[
                {"id": "keep", "title": "Fine", "color": "red"},
                {"color": "neon", "tags": 17},
                "not an object",
                null
            ]"#,
        );
        let notes = load_notes_from(&env.store_file).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, "keep");
        assert_eq!(notes[0].color, Color::Red);
        assert_eq!(notes[1].color, Color::Slate);
        assert!(notes[1].tags.is_empty());
    }
}
