//! Application driver for Graphite
//!
//! Command dispatch for the one-shot CLI surface plus the interactive shell.
//! Every mutating command goes through [`AppState`] and is followed by an
//! explicit persistence call; nothing writes the store as a side effect.

use crate::config::{load_config, save_config_silent, Theme};
use crate::error::{Error, Result};
use crate::export;
use crate::keymap::{shortcut_for, Modifiers, Shortcut};
use crate::markdown;
use crate::note::{time_ago, Color, Note};
use crate::state::{AppState, SortKey};
use crate::store::{get_store_file_path, load_notes, save_notes_silent};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Entry point: load settings and the note store, then dispatch one command.
pub fn run(mut args: Vec<String>) -> Result<()> {
    let settings = load_config();
    let notes = load_notes();
    let mut app = App::new(AppState::new(notes, settings));

    if args.is_empty() {
        print_help();
        return Ok(());
    }

    let cmd = args.remove(0);
    app.dispatch(&cmd, args)
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Driver
// ─────────────────────────────────────────────────────────────────────────────

struct App {
    state: AppState,
}

impl App {
    fn new(state: AppState) -> Self {
        Self { state }
    }

    fn dispatch(&mut self, cmd: &str, args: Vec<String>) -> Result<()> {
        match cmd {
            "new" => self.cmd_new(args),
            "list" => self.cmd_list(args),
            "show" => self.cmd_show(args),
            "preview" => self.cmd_preview(args),
            "edit" => self.cmd_edit(args),
            "title" => self.cmd_title(args),
            "tag" => self.cmd_tag(args),
            "tags" => self.cmd_tags(),
            "color" => self.cmd_color(args),
            "pin" => self.cmd_pin(args),
            "mode" => self.cmd_mode(args),
            "undo" => self.cmd_undo(args),
            "redo" => self.cmd_redo(args),
            "delete" => self.cmd_delete(args),
            "export" => self.cmd_export(args),
            "import" => self.cmd_import(args),
            "theme" => self.cmd_theme(args),
            "path" => self.cmd_path(),
            "shell" => self.cmd_shell(),
            "help" => {
                print_help();
                Ok(())
            }
            other => {
                eprintln!("Unknown command: {other}");
                print_help();
                Ok(())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence Boundary
    // ─────────────────────────────────────────────────────────────────────────

    /// Fire-and-forget store write; failures surface only in the log.
    fn persist_notes(&self) {
        save_notes_silent(self.state.notes());
    }

    fn persist_settings(&self) {
        save_config_silent(&self.state.settings);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Id Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve a full id or unique id prefix to a note id.
    fn resolve_id(&self, prefix: &str) -> Result<String> {
        let matches: Vec<&Note> = self
            .state
            .notes()
            .iter()
            .filter(|n| n.id.starts_with(prefix))
            .collect();
        match matches.len() {
            1 => Ok(matches[0].id.clone()),
            0 => Err(Error::Application(format!("Note {prefix} not found"))),
            _ => Err(Error::Application(format!(
                "Id prefix {prefix} is ambiguous ({} matches)",
                matches.len()
            ))),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    fn cmd_new(&mut self, args: Vec<String>) -> Result<()> {
        let id = self.state.add_note();
        if !args.is_empty() {
            self.state.set_title(&id, &args.join(" "));
        }
        self.persist_notes();
        let note = self.state.note(&id).ok_or_else(note_vanished)?;
        println!("Created note {} ({})", short_id(&id), note.title);
        Ok(())
    }

    fn cmd_list(&mut self, args: Vec<String>) -> Result<()> {
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--sort" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| Error::Application("Provide a sort field: updated|title".to_string()))?;
                    self.state.sort_by = SortKey::from_name(&value).ok_or_else(|| {
                        Error::Application(format!("Unknown sort field: {value}"))
                    })?;
                }
                "-s" | "--search" => {
                    let value = iter.next().ok_or_else(|| {
                        Error::Application("Provide a search string after -s/--search".to_string())
                    })?;
                    self.state.set_query(&value);
                }
                "-t" | "--tag" => {
                    let value = iter.next().ok_or_else(|| {
                        Error::Application("Provide a tag after -t/--tag".to_string())
                    })?;
                    self.state.tag_filter = Some(value.trim_start_matches('#').to_string());
                }
                other => {
                    return Err(Error::Application(format!("Unknown flag for list: {other}")));
                }
            }
        }

        let visible = self.state.visible_notes();
        if visible.is_empty() {
            if self.state.is_empty() {
                println!("No notes yet. Try `graphite new` (or press n in the shell).");
            } else {
                println!("No notes match the current filters.");
            }
            return Ok(());
        }

        for note in visible {
            let pin = if note.pinned { "*" } else { " " };
            let tags = if note.tags.is_empty() {
                String::new()
            } else {
                format!("  #{}", note.tags.join(" #"))
            };
            println!(
                "{} {} [{}] {} ({}){}",
                short_id(&note.id),
                pin,
                note.color.name(),
                note.title,
                time_ago(note.updated),
                tags
            );
        }
        Ok(())
    }

    fn cmd_show(&mut self, args: Vec<String>) -> Result<()> {
        let id = self.resolve_id(first_arg(&args, "Usage: graphite show <id>")?)?;
        let note = self.state.note(&id).ok_or_else(note_vanished)?;

        println!("{} ({})", note.title, note.id);
        println!("Updated: {}", time_ago(note.updated));
        println!("Mode: {}  Color: {}", note.mode.label(), note.color.name());
        if !note.tags.is_empty() {
            println!("Tags: {}", note.tags.join(", "));
        }
        if note.can_undo() || note.can_redo() {
            println!(
                "History: {} back / {} forward",
                note.history.len(),
                note.future.len()
            );
        }
        println!();
        println!("{}", note.body);
        println!();
        println!("{} chars", note.body.chars().count());
        Ok(())
    }

    fn cmd_preview(&mut self, args: Vec<String>) -> Result<()> {
        let id = self.resolve_id(first_arg(&args, "Usage: graphite preview <id>")?)?;
        let note = self.state.note(&id).ok_or_else(note_vanished)?;
        println!("{}", markdown::render(&note.body));
        Ok(())
    }

    fn cmd_edit(&mut self, mut args: Vec<String>) -> Result<()> {
        if args.is_empty() {
            return Err(Error::Application("Usage: graphite edit <id> <text>".to_string()));
        }
        let id = self.resolve_id(&args.remove(0))?;
        self.state.edit_body(&id, &args.join(" "));
        self.persist_notes();
        println!("Updated {}", short_id(&id));
        Ok(())
    }

    fn cmd_title(&mut self, mut args: Vec<String>) -> Result<()> {
        if args.len() < 2 {
            return Err(Error::Application("Usage: graphite title <id> <text>".to_string()));
        }
        let id = self.resolve_id(&args.remove(0))?;
        self.state.set_title(&id, &args.join(" "));
        self.persist_notes();
        println!("Retitled {}", short_id(&id));
        Ok(())
    }

    fn cmd_tag(&mut self, mut args: Vec<String>) -> Result<()> {
        if args.is_empty() {
            return Err(Error::Application("Usage: graphite tag <id> [tags, ...]".to_string()));
        }
        let id = self.resolve_id(&args.remove(0))?;
        self.state.set_tags(&id, &args.join(" "));
        self.persist_notes();
        let note = self.state.note(&id).ok_or_else(note_vanished)?;
        if note.tags.is_empty() {
            println!("Cleared tags on {}", short_id(&id));
        } else {
            println!("Tagged {}: {}", short_id(&id), note.tags.join(", "));
        }
        Ok(())
    }

    fn cmd_tags(&self) -> Result<()> {
        let tags = self.state.all_tags();
        if tags.is_empty() {
            println!("No tags found.");
            return Ok(());
        }
        for tag in tags {
            println!("#{tag}");
        }
        Ok(())
    }

    fn cmd_color(&mut self, args: Vec<String>) -> Result<()> {
        if args.len() != 2 {
            return Err(Error::Application("Usage: graphite color <id> <color>".to_string()));
        }
        let id = self.resolve_id(&args[0])?;
        let color = Color::from_name(&args[1]).ok_or_else(|| {
            let palette: Vec<&str> = Color::all().iter().map(|c| c.name()).collect();
            Error::Application(format!(
                "Unknown color: {} (choose one of {})",
                args[1],
                palette.join(", ")
            ))
        })?;
        self.state.set_color(&id, color);
        self.persist_notes();
        println!("Colored {} {}", short_id(&id), color.name());
        Ok(())
    }

    fn cmd_pin(&mut self, args: Vec<String>) -> Result<()> {
        let id = self.resolve_id(first_arg(&args, "Usage: graphite pin <id>")?)?;
        let pinned = self.state.toggle_pin(&id).ok_or_else(note_vanished)?;
        self.persist_notes();
        println!(
            "{} {}",
            if pinned { "Pinned" } else { "Unpinned" },
            short_id(&id)
        );
        Ok(())
    }

    fn cmd_mode(&mut self, args: Vec<String>) -> Result<()> {
        let id = self.resolve_id(first_arg(&args, "Usage: graphite mode <id>")?)?;
        let mode = self.state.toggle_mode(&id).ok_or_else(note_vanished)?;
        self.persist_notes();
        println!("{} is now in {} mode", short_id(&id), mode.label());
        Ok(())
    }

    fn cmd_undo(&mut self, args: Vec<String>) -> Result<()> {
        let id = self.resolve_id(first_arg(&args, "Usage: graphite undo <id>")?)?;
        match self.state.undo(&id) {
            Some(body) => {
                self.persist_notes();
                println!("Reverted {}:", short_id(&id));
                println!("{}", body);
            }
            // An exhausted history is a quiet no-op, not an error.
            None => println!("Nothing to undo."),
        }
        Ok(())
    }

    fn cmd_redo(&mut self, args: Vec<String>) -> Result<()> {
        let id = self.resolve_id(first_arg(&args, "Usage: graphite redo <id>")?)?;
        match self.state.redo(&id) {
            Some(body) => {
                self.persist_notes();
                println!("Restored {}:", short_id(&id));
                println!("{}", body);
            }
            None => println!("Nothing to redo."),
        }
        Ok(())
    }

    fn cmd_delete(&mut self, args: Vec<String>) -> Result<()> {
        let id = self.resolve_id(first_arg(&args, "Usage: graphite delete <id>")?)?;
        self.state.delete_note(&id);
        self.persist_notes();
        println!("Deleted {}", short_id(&id));
        Ok(())
    }

    fn cmd_export(&mut self, args: Vec<String>) -> Result<()> {
        let mut note_id: Option<String> = None;
        let mut path: Option<String> = None;
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-n" | "--note" => {
                    let value = iter.next().ok_or_else(|| {
                        Error::Application("Provide a note id after -n/--note".to_string())
                    })?;
                    note_id = Some(value);
                }
                other => path = Some(other.to_string()),
            }
        }

        match note_id {
            Some(prefix) => {
                let id = self.resolve_id(&prefix)?;
                let note = self.state.note(&id).ok_or_else(note_vanished)?;
                let file = path.unwrap_or_else(|| export::note_export_name(note));
                export::export_note(note, Path::new(&file))?;
                println!("Exported note {} to {}", short_id(&id), file);
            }
            None => {
                let file = path.unwrap_or_else(|| export::COLLECTION_EXPORT_NAME.to_string());
                export::export_collection(self.state.notes(), Path::new(&file))?;
                println!(
                    "Exported {} note(s) to {}",
                    self.state.len(),
                    file
                );
            }
        }
        Ok(())
    }

    fn cmd_import(&mut self, args: Vec<String>) -> Result<()> {
        let path = first_arg(&args, "Usage: graphite import <file.json>")?;
        // A rejected payload propagates before any state is touched, so the
        // current collection survives a bad file untouched.
        let notes = export::import_notes_from_file(Path::new(path))?;
        let count = notes.len();
        self.state.replace_notes(notes);
        self.persist_notes();
        println!("Imported {count} note(s)");
        Ok(())
    }

    fn cmd_theme(&mut self, args: Vec<String>) -> Result<()> {
        let theme = match args.first() {
            Some(name) => {
                let theme = Theme::from_name(name).ok_or_else(|| {
                    Error::Application(format!("Unknown theme: {name} (dark|light)"))
                })?;
                self.state.settings.theme = theme;
                theme
            }
            None => self.state.toggle_theme(),
        };
        self.persist_settings();
        println!("Theme: {}", theme.label());
        Ok(())
    }

    fn cmd_path(&self) -> Result<()> {
        println!("{}", get_store_file_path()?.display());
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Interactive Shell
    // ─────────────────────────────────────────────────────────────────────────

    /// Line-oriented event loop. A line holding a single key routes through
    /// the keymap (line input carries no modifiers); anything else is parsed
    /// as a regular command.
    fn cmd_shell(&mut self) -> Result<()> {
        println!("Graphite shell (n: new note, /: search, q: quit, help: commands)");
        let stdin = io::stdin();
        let mut out = io::stdout();

        loop {
            print!("> ");
            out.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break; // EOF
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if matches!(line, "q" | "quit" | "exit") {
                break;
            }

            let mut chars = line.chars();
            if let (Some(key), None) = (chars.next(), chars.next()) {
                match shortcut_for(key, Modifiers::NONE) {
                    Some(Shortcut::NewNote) => {
                        let id = self.state.add_note();
                        self.persist_notes();
                        println!("Created note {}", short_id(&id));
                        continue;
                    }
                    Some(Shortcut::FocusSearch) => {
                        print!("search: ");
                        out.flush()?;
                        let mut query = String::new();
                        if stdin.lock().read_line(&mut query)? == 0 {
                            break;
                        }
                        self.state.set_query(query.trim());
                        self.cmd_list(Vec::new())?;
                        continue;
                    }
                    None => {}
                }
            }

            let mut parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            let cmd = parts.remove(0);
            if cmd == "shell" {
                continue;
            }
            if let Err(e) = self.dispatch(&cmd, parts) {
                eprintln!("{e}");
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Display form of a note id: the first eight characters.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn first_arg<'a>(args: &'a [String], usage: &str) -> Result<&'a str> {
    args.first()
        .map(String::as_str)
        .ok_or_else(|| Error::Application(usage.to_string()))
}

fn note_vanished() -> Error {
    Error::Application("Note disappeared mid-operation".to_string())
}

fn print_help() {
    println!(
        "\
Graphite: notes with tags, pinning, and Markdown preview
Usage:
  graphite new [title]            Create a note (inserted at the top)
  graphite list [--sort updated|title] [-s|--search <text>] [-t|--tag <tag>]
                                  List notes, pinned first
  graphite show <id>              Show a note's raw body and metadata
  graphite preview <id>           Render a note's body as HTML
  graphite edit <id> <text>       Replace the body (records an undo snapshot)
  graphite title <id> <text>      Retitle a note
  graphite tag <id> [tags, ...]   Replace tags (comma-separated, max 10)
  graphite tags                   List every tag in use
  graphite color <id> <color>     yellow|red|green|blue|purple|slate
  graphite pin <id>               Toggle pinned
  graphite mode <id>              Toggle edit/preview mode
  graphite undo <id>              Step the body backward
  graphite redo <id>              Step the body forward
  graphite delete <id>            Delete a note
  graphite export [-n <id>] [file]
                                  Export everything (or one note) as JSON
  graphite import <file>          Replace the collection from a JSON export
  graphite theme [dark|light]     Toggle or set the theme
  graphite path                   Show the store file path
  graphite shell                  Interactive shell (n = new note, / = search)
  graphite help                   Show this message

Ids may be abbreviated to any unique prefix.

Environment:
  GRAPHITE_DATA_DIR               Override the note store directory
  GRAPHITE_CONFIG_DIR             Override the settings directory
"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn app_with_notes(titles: &[&str]) -> App {
        let mut app = App::new(AppState::new(Vec::new(), Settings::default()));
        for title in titles {
            let id = app.state.add_note();
            app.state.set_title(&id, title);
        }
        app
    }

    #[test]
    fn test_resolve_id_by_unique_prefix() {
        let app = app_with_notes(&["a"]);
        let id = app.state.notes()[0].id.clone();
        let prefix = &id[..8];
        assert_eq!(app.resolve_id(prefix).unwrap(), id);
    }

    #[test]
    fn test_resolve_id_unknown() {
        let app = app_with_notes(&["a"]);
        assert!(app.resolve_id("zzzzzzzz").is_err());
    }

    #[test]
    fn test_resolve_id_ambiguous() {
        let mut app = app_with_notes(&[]);
        app.state.add_note();
        app.state.add_note();
        // The empty prefix matches every note.
        assert!(app.resolve_id("").is_err());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
