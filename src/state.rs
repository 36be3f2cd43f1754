//! Application state management for Graphite
//!
//! This module defines the central `AppState` struct that owns the in-memory
//! note collection together with the session view selections (search query,
//! sort key, tag filter) and the loaded user settings. Every mutation goes
//! through a method here; persistence is an explicit boundary call made by
//! the front end, never an ambient side effect.

use crate::config::{Settings, Theme};
use crate::note::{parse_tags, sanitize, Color, Mode, Note};
use log::debug;
use std::cmp::Ordering;

// ─────────────────────────────────────────────────────────────────────────────
// Sort Key
// ─────────────────────────────────────────────────────────────────────────────

/// Sort key for the visible note list. Pinned notes always sort first,
/// whatever the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Most recently updated first
    #[default]
    Updated,
    /// Title, ascending, case-insensitive
    Title,
}

impl SortKey {
    /// Parse a sort key name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<SortKey> {
        match name {
            "updated" => Some(SortKey::Updated),
            "title" => Some(SortKey::Title),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application State
// ─────────────────────────────────────────────────────────────────────────────

/// Central application state.
///
/// Holds the note collection, the current view selections, and the user
/// settings. The collection is private: callers mutate through operations so
/// the `updated` timestamp and history invariants cannot be bypassed.
#[derive(Debug)]
pub struct AppState {
    /// All notes, newest first (new notes are inserted at the head)
    notes: Vec<Note>,
    /// Current search query, lowercased at assignment
    pub query: String,
    /// Current sort key
    pub sort_by: SortKey,
    /// Optional single-tag filter; `None` shows all notes
    pub tag_filter: Option<String>,
    /// User settings (loaded from config)
    pub settings: Settings,
}

impl AppState {
    /// Create state from a loaded collection and settings.
    pub fn new(notes: Vec<Note>, settings: Settings) -> Self {
        debug!("AppState initialized with {} note(s)", notes.len());
        Self {
            notes,
            query: String::new(),
            sort_by: SortKey::default(),
            tag_filter: None,
            settings,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Collection Access
    // ─────────────────────────────────────────────────────────────────────────

    /// All notes in insertion order (read-only).
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Number of notes in the collection.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Look up a note by id.
    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    fn note_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Note Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a fresh note at the head of the collection and return its id.
    pub fn add_note(&mut self) -> String {
        let note = Note::new();
        let id = note.id.clone();
        self.notes.insert(0, note);
        debug!("Created note {}", id);
        id
    }

    /// Remove a note by id. Returns `true` if it existed.
    pub fn delete_note(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        before != self.notes.len()
    }

    /// Replace the whole collection (successful import).
    pub fn replace_notes(&mut self, notes: Vec<Note>) {
        debug!("Replacing collection: {} note(s)", notes.len());
        self.notes = notes;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Note Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Set a note's title (sanitized). Returns `false` for an unknown id.
    pub fn set_title(&mut self, id: &str, title: &str) -> bool {
        let title = sanitize(title);
        match self.note_mut(id) {
            Some(note) => {
                note.title = title;
                note.touch();
                true
            }
            None => false,
        }
    }

    /// Apply an edit to a note's body, recording the pre-edit state as an
    /// undo snapshot. A no-change edit records nothing but is not an error.
    pub fn edit_body(&mut self, id: &str, text: &str) -> bool {
        let text = sanitize(text);
        match self.note_mut(id) {
            Some(note) => {
                if note.body != text {
                    let previous = note.body.clone();
                    note.record_edit(&previous);
                    note.body = text;
                    note.touch();
                }
                true
            }
            None => false,
        }
    }

    /// Replace a note's tags from a comma-separated line.
    pub fn set_tags(&mut self, id: &str, line: &str) -> bool {
        match self.note_mut(id) {
            Some(note) => {
                note.tags = parse_tags(line);
                note.touch();
                true
            }
            None => false,
        }
    }

    /// Set a note's card color.
    pub fn set_color(&mut self, id: &str, color: Color) -> bool {
        match self.note_mut(id) {
            Some(note) => {
                note.color = color;
                note.touch();
                true
            }
            None => false,
        }
    }

    /// Flip a note's pinned flag. Returns the new state.
    pub fn toggle_pin(&mut self, id: &str) -> Option<bool> {
        let note = self.note_mut(id)?;
        note.pinned = !note.pinned;
        note.touch();
        Some(note.pinned)
    }

    /// Flip a note between edit and preview mode. Returns the new mode.
    pub fn toggle_mode(&mut self, id: &str) -> Option<Mode> {
        let note = self.note_mut(id)?;
        note.mode = note.mode.toggle();
        note.touch();
        Some(note.mode)
    }

    /// Step a note's body backward through its history. Returns the restored
    /// body, or `None` when there is nothing to undo (silent no-op).
    pub fn undo(&mut self, id: &str) -> Option<String> {
        let note = self.note_mut(id)?;
        let current = note.body.clone();
        let previous = note.undo(&current)?;
        note.body = sanitize(&previous);
        note.touch();
        Some(note.body.clone())
    }

    /// Step a note's body forward through undone states. Returns the restored
    /// body, or `None` when there is nothing to redo.
    pub fn redo(&mut self, id: &str) -> Option<String> {
        let note = self.note_mut(id)?;
        let current = note.body.clone();
        let next = note.redo(&current)?;
        note.body = sanitize(&next);
        note.touch();
        Some(note.body.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // View Selections
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the search query (stored lowercased; empty clears the filter).
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_lowercase();
    }

    /// Toggle the single-tag filter: selecting the active tag clears it.
    pub fn toggle_tag_filter(&mut self, tag: &str) {
        if self.tag_filter.as_deref() == Some(tag) {
            self.tag_filter = None;
        } else {
            self.tag_filter = Some(tag.to_string());
        }
    }

    /// Flip the theme. Returns the new value; the caller persists settings.
    pub fn toggle_theme(&mut self) -> Theme {
        self.settings.theme = self.settings.theme.toggle();
        self.settings.theme
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derived Views
    // ─────────────────────────────────────────────────────────────────────────

    /// The filtered, sorted note list: search query and tag filter applied,
    /// pinned notes first, then the active sort key.
    pub fn visible_notes(&self) -> Vec<&Note> {
        let mut visible: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| self.query.is_empty() || n.matches_query(&self.query))
            .filter(|n| match &self.tag_filter {
                Some(tag) => n.tags.iter().any(|t| t == tag),
                None => true,
            })
            .collect();

        visible.sort_by(|a, b| match (a.pinned, b.pinned) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => match self.sort_by {
                SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                SortKey::Updated => b.updated.cmp(&a.updated),
            },
        });

        visible
    }

    /// Sorted, de-duplicated set of all tags in use.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .notes
            .iter()
            .flat_map(|n| n.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
