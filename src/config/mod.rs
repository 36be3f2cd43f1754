//! Configuration module for Graphite
//!
//! This module handles user preferences (the color theme), including
//! serialization to/from JSON and persistent storage to a platform-specific
//! directory. Preferences live apart from the note store so wiping one
//! never touches the other.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
