//! The regex-substitution rendering pipeline
//!
//! Stage order matters: HTML-significant characters are escaped before any
//! markup is introduced, code spans are lifted out before emphasis so their
//! contents are never interpreted, and the bold pass runs before italic so
//! the single-asterisk pattern cannot eat half of a double-asterisk span.

use regex::{Captures, Regex};
use std::sync::OnceLock;

// ─────────────────────────────────────────────────────────────────────────────
// Compiled Patterns
// ─────────────────────────────────────────────────────────────────────────────

fn fenced_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(.*?)```").expect("valid pattern"))
}

fn inline_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("valid pattern"))
}

fn h3_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^### (.*)$").expect("valid pattern"))
}

fn h2_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^## (.*)$").expect("valid pattern"))
}

fn h1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^# (.*)$").expect("valid pattern"))
}

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid pattern"))
}

fn italic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+)\*").expect("valid pattern"))
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Only absolute http/https URLs; anything else stays literal text.
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\((https?://[^\s)]+)\)").expect("valid pattern"))
}

fn list_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A contiguous run of `- ` / `* ` lines with no blank separator.
    RE.get_or_init(|| {
        Regex::new(r"(?m)^(?:-|\*) (?:.*(?:\n(?:-|\*) .*)*)").expect("valid pattern")
    })
}

fn paragraph_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").expect("valid pattern"))
}

fn block_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^</?(h\d|ul|pre)").expect("valid pattern"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Code Span Protection
// ─────────────────────────────────────────────────────────────────────────────

// Rendered code is parked behind a token while the remaining stages run, so
// markers inside code are never interpreted as markup. U+FFFC (the object
// replacement character) does not occur in ordinary note text.
const TOKEN_MARK: char = '\u{FFFC}';

fn block_token(index: usize) -> String {
    format!("{}B{}{}", TOKEN_MARK, index, TOKEN_MARK)
}

fn span_token(index: usize) -> String {
    format!("{}I{}{}", TOKEN_MARK, index, TOKEN_MARK)
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Escape the HTML-significant characters. Runs over the whole source before
/// any markup is introduced, so user text can never smuggle in a tag.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render note-body Markdown to the restricted HTML subset.
///
/// Pure and deterministic. Accepts source Markdown only; feeding it its own
/// output re-escapes the generated tags.
pub fn render(text: &str) -> String {
    let src = escape_html(text);

    // Fenced code blocks, then inline code. Contents were escaped above and
    // are lifted out so no later stage reinterprets them.
    let mut blocks: Vec<String> = Vec::new();
    let src = fenced_code_re()
        .replace_all(&src, |caps: &Captures| {
            blocks.push(format!("<pre><code>{}</code></pre>", &caps[1]));
            block_token(blocks.len() - 1)
        })
        .into_owned();

    let mut spans: Vec<String> = Vec::new();
    let src = inline_code_re()
        .replace_all(&src, |caps: &Captures| {
            spans.push(format!("<code>{}</code>", &caps[1]));
            span_token(spans.len() - 1)
        })
        .into_owned();

    // Headers, deepest marker first.
    let src = h3_re().replace_all(&src, "<h3>${1}</h3>").into_owned();
    let src = h2_re().replace_all(&src, "<h2>${1}</h2>").into_owned();
    let src = h1_re().replace_all(&src, "<h1>${1}</h1>").into_owned();

    // Emphasis: bold before italic.
    let src = bold_re()
        .replace_all(&src, "<strong>${1}</strong>")
        .into_owned();
    let src = italic_re().replace_all(&src, "<em>${1}</em>").into_owned();

    // Links open in a new browsing context without opener leakage.
    let src = link_re()
        .replace_all(
            &src,
            r#"<a href="${2}" target="_blank" rel="noopener">${1}</a>"#,
        )
        .into_owned();

    // Contiguous list-item lines collapse into a single <ul>.
    let src = list_run_re()
        .replace_all(&src, |caps: &Captures| {
            let items: String = caps[0]
                .split('\n')
                .map(|line| {
                    let item = line
                        .strip_prefix("- ")
                        .or_else(|| line.strip_prefix("* "))
                        .unwrap_or(line)
                        .trim();
                    format!("<li>{}</li>", item)
                })
                .collect();
            format!("<ul>{}</ul>", items)
        })
        .into_owned();

    // Inline code rejoins the text before paragraph wrapping; fenced blocks
    // stay tokenized so blank lines inside them cannot split a paragraph.
    let mut src = src;
    for (index, html) in spans.iter().enumerate() {
        src = src.replace(&span_token(index), html);
    }

    // Blank-line runs delimit paragraphs; block-level output passes through.
    let mut out = paragraph_split_re()
        .split(&src)
        .map(|p| {
            if block_start_re().is_match(p) || p.starts_with(TOKEN_MARK) {
                p.to_string()
            } else {
                format!("<p>{}</p>", p.replace('\n', "<br/>"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    for (index, html) in blocks.iter().enumerate() {
        out = out.replace(&block_token(index), html);
    }

    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────────────────
    // Escaping
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_escapes_html_in_plain_text() {
        assert_eq!(render("a < b & c > d"), "<p>a &lt; b &amp; c &gt; d</p>");
    }

    #[test]
    fn test_script_in_fenced_block_is_escaped() {
        let html = render("```\n<script>alert(1)</script>\n```");
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Code
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_fenced_code_block() {
        let html = render("```\nlet x = 1;\n```");
        assert_eq!(html, "<pre><code>\nlet x = 1;\n</code></pre>");
    }

    #[test]
    fn test_fenced_block_with_blank_lines_stays_whole() {
        let html = render("```\none\n\ntwo\n```");
        assert_eq!(html, "<pre><code>\none\n\ntwo\n</code></pre>");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            render("use `foo()` here"),
            "<p>use <code>foo()</code> here</p>"
        );
    }

    #[test]
    fn test_code_content_not_interpreted() {
        let html = render("`**not bold**`");
        assert!(html.contains("<code>**not bold**</code>"));
        assert!(!html.contains("<strong>"));
    }

    #[test]
    fn test_header_marker_inside_fence_not_interpreted() {
        let html = render("```\n# not a heading\n```");
        assert!(html.contains("# not a heading"));
        assert!(!html.contains("<h1>"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Headers
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_header_levels() {
        assert_eq!(render("# H"), "<h1>H</h1>");
        assert_eq!(render("## H"), "<h2>H</h2>");
        assert_eq!(render("### H"), "<h3>H</h3>");
    }

    #[test]
    fn test_header_requires_space() {
        assert_eq!(render("#nospace"), "<p>#nospace</p>");
    }

    #[test]
    fn test_header_matched_per_line() {
        let html = render("# One\ntext\n## Two");
        assert!(html.contains("<h1>One</h1>"));
        assert!(html.contains("<h2>Two</h2>"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Emphasis
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_bold() {
        assert_eq!(render("**x**"), "<p><strong>x</strong></p>");
    }

    #[test]
    fn test_italic() {
        assert_eq!(render("*x*"), "<p><em>x</em></p>");
    }

    #[test]
    fn test_bold_runs_before_italic() {
        assert_eq!(
            render("**bold** and *ital*"),
            "<p><strong>bold</strong> and <em>ital</em></p>"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Links
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_http_link() {
        let html = render("[site](https://example.com)");
        assert_eq!(
            html,
            "<p><a href=\"https://example.com\" target=\"_blank\" rel=\"noopener\">site</a></p>"
        );
    }

    #[test]
    fn test_non_http_scheme_left_literal() {
        let html = render("[x](javascript:alert(1))");
        assert!(!html.contains("<a "));
        assert!(html.contains("[x](javascript:alert(1))"));
    }

    #[test]
    fn test_relative_link_left_literal() {
        let html = render("[x](/relative/path)");
        assert!(!html.contains("<a "));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lists
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_contiguous_list_lines_form_one_list() {
        assert_eq!(
            render("- one\n- two\n* three"),
            "<ul><li>one</li><li>two</li><li>three</li></ul>"
        );
    }

    #[test]
    fn test_blank_line_splits_lists() {
        let html = render("- one\n\n- two");
        assert_eq!(html, "<ul><li>one</li></ul>\n<ul><li>two</li></ul>");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Paragraphs
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_paragraph_split_on_blank_lines() {
        assert_eq!(render("one\n\ntwo"), "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn test_single_newline_becomes_break() {
        assert_eq!(render("one\ntwo"), "<p>one<br/>two</p>");
    }

    #[test]
    fn test_block_output_not_rewrapped() {
        let html = render("# Title\n\nbody");
        assert_eq!(html, "<h1>Title</h1>\n<p>body</p>");
    }

    #[test]
    fn test_empty_input_yields_empty_paragraph() {
        assert_eq!(render(""), "<p></p>");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Determinism
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_is_deterministic() {
        let src = "# H\n\n**b** *i* `c`\n\n- l1\n- l2\n\n[x](https://e.com)";
        assert_eq!(render(src), render(src));
    }
}
