//! Markdown rendering module
//!
//! Converts plain-text note bodies into the restricted HTML subset used by
//! preview mode. The renderer is a deliberately simple sequential
//! regex-substitution pipeline, not a CommonMark parser: nested or
//! overlapping markers are unsupported, and the supported syntax is headers
//! (`#`–`###`), bold/italic, inline and fenced code, http(s) links, and
//! contiguous `-`/`*` lists.

mod renderer;

pub use renderer::render;
