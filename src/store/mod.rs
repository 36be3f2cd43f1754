//! Note store persistence for Graphite
//!
//! This module owns the persisted note collection: a versioned JSON file in
//! the platform data directory. Loading is deliberately forgiving (each
//! entry is repaired field-by-field rather than rejecting the whole file)
//! while saving uses an atomic write-then-rename.

mod persistence;
mod repair;

pub use persistence::*;
pub use repair::*;
