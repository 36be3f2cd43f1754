//! Graphite - Main Entry Point
//!
//! A fast, lightweight note-taking app with tags, pinning, search, bounded
//! undo/redo, and Markdown preview. Notes persist to a JSON store in the
//! platform data directory.

mod app;
mod config;
mod error;
mod export;
mod keymap;
mod markdown;
mod note;
mod state;
mod store;

use log::debug;

/// Application name constant.
const APP_NAME: &str = "Graphite";

fn main() {
    // Initialize logging; diagnostics go to stderr so command output stays clean.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    debug!("Starting {}", APP_NAME);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = app::run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
