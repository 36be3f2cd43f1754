//! The note record and its edit history
//!
//! This module defines the `Note` struct that holds all persisted data for a
//! single note, including the bounded undo/redo snapshot stacks, plus the
//! text-hygiene helpers applied to user input (control-character stripping,
//! tag-line parsing).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Maximum number of snapshots kept on each of the undo and redo stacks.
pub const HISTORY_LIMIT: usize = 50;

/// Maximum number of tags accepted from a single tag-line parse.
pub const MAX_TAGS: usize = 10;

/// Title given to freshly created notes.
pub const DEFAULT_TITLE: &str = "Untitled";

// ─────────────────────────────────────────────────────────────────────────────
// Note Color
// ─────────────────────────────────────────────────────────────────────────────

/// The fixed palette of note card colors.
///
/// Unknown or missing values normalize to `Slate` when repairing persisted
/// or imported data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Yellow,
    Red,
    Green,
    Blue,
    Purple,
    #[default]
    Slate,
}

impl Color {
    /// All palette entries, in display order.
    pub fn all() -> &'static [Color] {
        &[
            Color::Yellow,
            Color::Red,
            Color::Green,
            Color::Blue,
            Color::Purple,
            Color::Slate,
        ]
    }

    /// The lowercase name used in serialized payloads and on the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Color::Yellow => "yellow",
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Slate => "slate",
        }
    }

    /// Parse a color name. Returns `None` for anything outside the palette.
    pub fn from_name(name: &str) -> Option<Color> {
        match name {
            "yellow" => Some(Color::Yellow),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "blue" => Some(Color::Blue),
            "purple" => Some(Color::Purple),
            "slate" => Some(Color::Slate),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// View Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Per-note view mode: raw text editing or rendered Markdown preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Edit,
    Preview,
}

impl Mode {
    /// Toggle between Edit and Preview.
    pub fn toggle(&self) -> Self {
        match self {
            Mode::Edit => Mode::Preview,
            Mode::Preview => Mode::Edit,
        }
    }

    /// Display label for the mode badge.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Edit => "Edit",
            Mode::Preview => "Preview",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Note
// ─────────────────────────────────────────────────────────────────────────────

/// A single note: the atomic unit of persisted content.
///
/// The undo/redo stacks travel with the note through the store, so history
/// survives application restarts. The legacy serialized field names (`hist`,
/// `fut`) are kept for compatibility with existing store files and exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    /// Opaque unique identifier (UUID v4 when generated fresh)
    pub id: String,
    /// Display title
    pub title: String,
    /// Plain-text body, interpreted as Markdown in preview mode
    pub body: String,
    /// Pinned notes sort ahead of all others regardless of sort key
    pub pinned: bool,
    /// Card color from the fixed palette
    pub color: Color,
    /// Ordered tag list; duplicates allowed, capped at parse time
    pub tags: Vec<String>,
    /// Last-modified timestamp, epoch milliseconds
    pub updated: i64,
    /// Current view mode
    pub mode: Mode,
    /// Undo stack: prior body snapshots, most recent last
    #[serde(rename = "hist")]
    pub history: Vec<String>,
    /// Redo stack: undone body snapshots, most recent last
    #[serde(rename = "fut")]
    pub future: Vec<String>,
}

impl Default for Note {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: DEFAULT_TITLE.to_string(),
            body: String::new(),
            pinned: false,
            color: Color::Slate,
            tags: Vec::new(),
            updated: 0,
            mode: Mode::Edit,
            history: Vec::new(),
            future: Vec::new(),
        }
    }
}

impl Note {
    /// Create a fresh note with a generated id and the current timestamp.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            updated: now_millis(),
            ..Self::default()
        }
    }

    /// Refresh the last-modified timestamp. Called by every mutating
    /// operation (title, body, tags, color, pin, mode, undo, redo).
    pub fn touch(&mut self) {
        self.updated = now_millis();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Undo/Redo History
    // ─────────────────────────────────────────────────────────────────────────

    /// Record a body snapshot for undo.
    ///
    /// Suppresses duplicates: if `text` equals the most recent snapshot the
    /// call is a no-op, so repeated identical input events do not grow the
    /// stack. Any recorded edit invalidates the redo branch.
    pub fn record_edit(&mut self, text: &str) {
        if self.history.last().map(String::as_str) == Some(text) {
            return;
        }
        push_snapshot(&mut self.history, text.to_string());
        self.future.clear();
    }

    /// Step backward: pop the most recent snapshot, parking `current` on the
    /// redo stack. Returns `None` (a silent no-op) when history is empty.
    pub fn undo(&mut self, current: &str) -> Option<String> {
        let previous = self.history.pop()?;
        push_snapshot(&mut self.future, current.to_string());
        Some(previous)
    }

    /// Step forward: pop the most recent undone snapshot, parking `current`
    /// back on the undo stack. Returns `None` when there is nothing to redo.
    pub fn redo(&mut self, current: &str) -> Option<String> {
        let next = self.future.pop()?;
        push_snapshot(&mut self.history, current.to_string());
        Some(next)
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Case-insensitive match against title, body, and tags. A tag matches
    /// with or without its `#` prefix, mirroring how tags are displayed.
    pub fn matches_query(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(query)
            || self.body.to_lowercase().contains(query)
            || self
                .tags
                .iter()
                .any(|t| format!("#{}", t).contains(query) || t.contains(query))
    }
}

/// Push onto a bounded stack, evicting the oldest entry past the limit.
fn push_snapshot(stack: &mut Vec<String>, text: String) {
    stack.push(text);
    if stack.len() > HISTORY_LIMIT {
        stack.remove(0);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Hygiene
// ─────────────────────────────────────────────────────────────────────────────

/// Strip ASCII control characters from user text and trim surrounding
/// whitespace. Newline and tab survive so multi-line Markdown bodies remain
/// expressible; everything else in U+0000–U+001F plus U+007F is removed.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\n' || c == '\t' || (c >= '\u{20}' && c != '\u{7f}'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse a comma-separated tag line: trim each entry, strip one leading `#`,
/// drop empties, cap at [`MAX_TAGS`]. Duplicates are not removed.
pub fn parse_tags(line: &str) -> Vec<String> {
    line.split(',')
        .map(|t| t.trim().trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Time
// ─────────────────────────────────────────────────────────────────────────────

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Relative "time ago" label for an epoch-millisecond timestamp.
pub fn time_ago(updated: i64) -> String {
    let s = (((now_millis() - updated) as f64) / 1000.0).round().max(0.0) as i64;
    if s < 60 {
        return format!("{}s ago", s);
    }
    let m = ((s as f64) / 60.0).round() as i64;
    if m < 60 {
        return format!("{}m ago", m);
    }
    let h = ((m as f64) / 60.0).round() as i64;
    if h < 24 {
        return format!("{}h ago", h);
    }
    let d = ((h as f64) / 24.0).round() as i64;
    format!("{}d ago", d)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
