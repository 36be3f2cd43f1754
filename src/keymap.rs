//! Single-key shortcut policy
//!
//! Two global shortcuts mirror the quick actions: `n` creates a note and `/`
//! jumps to search. Both fire only on an unmodified key press: holding a
//! command modifier suppresses them so application chords and OS shortcuts
//! are never shadowed.

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Actions reachable through a single unmodified key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Create a new note and focus its title
    NewNote,
    /// Focus the search field
    FocusSearch,
}

/// Command-modifier state at the time of a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
    };

    fn any(&self) -> bool {
        self.ctrl || self.meta
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Map a key press to its shortcut, if any.
///
/// Letter keys match case-insensitively (a shifted `N` still creates a
/// note); any command modifier suppresses the binding entirely.
pub fn shortcut_for(key: char, modifiers: Modifiers) -> Option<Shortcut> {
    if modifiers.any() {
        return None;
    }
    match key.to_ascii_lowercase() {
        'n' => Some(Shortcut::NewNote),
        '/' => Some(Shortcut::FocusSearch),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_keys_map_to_shortcuts() {
        assert_eq!(shortcut_for('n', Modifiers::NONE), Some(Shortcut::NewNote));
        assert_eq!(
            shortcut_for('/', Modifiers::NONE),
            Some(Shortcut::FocusSearch)
        );
    }

    #[test]
    fn test_uppercase_letter_still_matches() {
        assert_eq!(shortcut_for('N', Modifiers::NONE), Some(Shortcut::NewNote));
    }

    #[test]
    fn test_modifiers_suppress_bindings() {
        let ctrl = Modifiers {
            ctrl: true,
            meta: false,
        };
        let meta = Modifiers {
            ctrl: false,
            meta: true,
        };
        assert_eq!(shortcut_for('n', ctrl), None);
        assert_eq!(shortcut_for('n', meta), None);
        assert_eq!(shortcut_for('/', ctrl), None);
    }

    #[test]
    fn test_unbound_keys_do_nothing() {
        assert_eq!(shortcut_for('x', Modifiers::NONE), None);
        assert_eq!(shortcut_for(' ', Modifiers::NONE), None);
    }
}
