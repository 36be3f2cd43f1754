//! Per-entry repair of persisted and imported note data
//!
//! Malformed fields never fail a load: each is coerced to a safe default
//! (fresh id, "Untitled" title, slate color, empty stacks) so one damaged
//! entry cannot take the rest of the collection down with it. Only values
//! that are not JSON objects at all are dropped.

use crate::note::{now_millis, Color, Mode, Note, DEFAULT_TITLE, HISTORY_LIMIT};
use serde_json::Value;
use uuid::Uuid;

/// Build a well-formed [`Note`] from an arbitrary JSON value.
///
/// Returns `None` only when the value is not an object; every field of an
/// object entry is individually repaired:
/// - missing/invalid `id` → fresh UUID
/// - missing/invalid `title` → "Untitled", `body` → empty
/// - `color` outside the palette → slate
/// - non-array `tags`/`hist`/`fut` → empty; stacks truncated to the last 50
/// - missing/non-numeric `updated` → now
/// - `mode` anything but "preview" → edit
pub fn repair_note(value: &Value) -> Option<Note> {
    let obj = value.as_object()?;

    Some(Note {
        id: coerce_string(obj.get("id")).unwrap_or_else(|| Uuid::new_v4().to_string()),
        title: coerce_string(obj.get("title")).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        body: coerce_string(obj.get("body")).unwrap_or_default(),
        pinned: obj
            .get("pinned")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        color: obj
            .get("color")
            .and_then(Value::as_str)
            .and_then(Color::from_name)
            .unwrap_or_default(),
        tags: obj
            .get("tags")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| coerce_string(Some(v)))
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        updated: obj
            .get("updated")
            .and_then(coerce_millis)
            .unwrap_or_else(now_millis),
        mode: match obj.get("mode").and_then(Value::as_str) {
            Some("preview") => Mode::Preview,
            _ => Mode::Edit,
        },
        history: snapshot_stack(obj.get("hist")),
        future: snapshot_stack(obj.get("fut")),
    })
}

/// Coerce a scalar JSON value to a string; `None` for null, missing, or
/// compound values.
fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accept integer or float epoch milliseconds.
fn coerce_millis(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}

/// Coerce a snapshot stack: non-arrays become empty, entries become strings,
/// and only the most recent [`HISTORY_LIMIT`] survive.
fn snapshot_stack(value: Option<&Value>) -> Vec<String> {
    let mut stack: Vec<String> = value
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| coerce_string(Some(v))).collect())
        .unwrap_or_default();
    if stack.len() > HISTORY_LIMIT {
        stack.drain(..stack.len() - HISTORY_LIMIT);
    }
    stack
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_entries_are_dropped() {
        assert!(repair_note(&json!(null)).is_none());
        assert!(repair_note(&json!("just a string")).is_none());
        assert!(repair_note(&json!(42)).is_none());
        assert!(repair_note(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_empty_object_gets_full_defaults() {
        let note = repair_note(&json!({})).unwrap();
        assert!(!note.id.is_empty());
        assert_eq!(note.title, "Untitled");
        assert!(note.body.is_empty());
        assert!(!note.pinned);
        assert_eq!(note.color, Color::Slate);
        assert!(note.tags.is_empty());
        assert!(note.updated > 0);
        assert_eq!(note.mode, Mode::Edit);
        assert!(note.history.is_empty());
        assert!(note.future.is_empty());
    }

    #[test]
    fn test_well_formed_entry_survives_intact() {
        let note = repair_note(&json!({
            "id": "abc-123",
            "title": "Groceries",
            "body": "- milk",
            "pinned": true,
            "color": "green",
            "tags": ["errands", "home"],
            "updated": 1700000000000i64,
            "mode": "preview",
            "hist": ["", "- m"],
            "fut": ["- milk and eggs"]
        }))
        .unwrap();

        assert_eq!(note.id, "abc-123");
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.body, "- milk");
        assert!(note.pinned);
        assert_eq!(note.color, Color::Green);
        assert_eq!(note.tags, vec!["errands", "home"]);
        assert_eq!(note.updated, 1700000000000);
        assert_eq!(note.mode, Mode::Preview);
        assert_eq!(note.history, vec!["", "- m"]);
        assert_eq!(note.future, vec!["- milk and eggs"]);
    }

    #[test]
    fn test_unknown_color_normalizes_to_slate() {
        let note = repair_note(&json!({"color": "neon"})).unwrap();
        assert_eq!(note.color, Color::Slate);
    }

    #[test]
    fn test_missing_id_generates_fresh_uuid() {
        let a = repair_note(&json!({"title": "x"})).unwrap();
        let b = repair_note(&json!({"title": "x"})).unwrap();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let note = repair_note(&json!({"id": 7})).unwrap();
        assert_eq!(note.id, "7");
    }

    #[test]
    fn test_non_array_tags_coerced_to_empty() {
        let note = repair_note(&json!({"tags": "not, an, array"})).unwrap();
        assert!(note.tags.is_empty());
    }

    #[test]
    fn test_tags_entries_trimmed_and_filtered() {
        let note = repair_note(&json!({"tags": [" a ", "", 3, null]})).unwrap();
        assert_eq!(note.tags, vec!["a", "3"]);
    }

    #[test]
    fn test_stacks_truncated_to_last_fifty() {
        let hist: Vec<String> = (0..70).map(|i| format!("s{}", i)).collect();
        let note = repair_note(&json!({"hist": hist, "fut": ["a"]})).unwrap();
        assert_eq!(note.history.len(), HISTORY_LIMIT);
        assert_eq!(note.history.first().unwrap(), "s20");
        assert_eq!(note.history.last().unwrap(), "s69");
        assert_eq!(note.future, vec!["a"]);
    }

    #[test]
    fn test_non_array_stacks_coerced_to_empty() {
        let note = repair_note(&json!({"hist": {"bad": true}, "fut": 9})).unwrap();
        assert!(note.history.is_empty());
        assert!(note.future.is_empty());
    }

    #[test]
    fn test_invalid_mode_falls_back_to_edit() {
        let note = repair_note(&json!({"mode": "split"})).unwrap();
        assert_eq!(note.mode, Mode::Edit);
    }

    #[test]
    fn test_non_numeric_updated_coerces_to_now() {
        let before = now_millis();
        let note = repair_note(&json!({"updated": "yesterday"})).unwrap();
        assert!(note.updated >= before);
    }

    #[test]
    fn test_float_updated_accepted() {
        let note = repair_note(&json!({"updated": 1700000000000.0})).unwrap();
        assert_eq!(note.updated, 1700000000000);
    }
}
