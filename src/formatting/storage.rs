// src/formatting/storage.rs
//! Pre-processing of Confluence storage format before HTML parsing.
//!
//! Storage format is XHTML with `ac:`/`ri:` namespaced elements and CDATA
//! sections. An HTML5 parser mishandles both: CDATA becomes a bogus comment
//! and a self-closing unknown element swallows its following siblings. Both
//! are rewritten here into plain HTML the parser reads as intended.

use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Node;
use scraper::Html;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

static SELF_CLOSING_NAMESPACED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<((?:ac|ri):[A-Za-z0-9_.-]+)((?:\s+[^<>]*?)?)\s*/>"#)
        .expect("self-closing tag pattern is valid")
});

/// Rewrites storage markup so an HTML5 parser builds the intended tree.
pub fn prepare(markup: &str) -> Result<String, AppError> {
    let without_cdata = expand_cdata(markup)?;
    Ok(SELF_CLOSING_NAMESPACED
        .replace_all(&without_cdata, "<$1$2></$1>")
        .into_owned())
}

/// Replaces every CDATA section with its HTML-escaped contents.
fn expand_cdata(markup: &str) -> Result<String, AppError> {
    if !markup.contains(CDATA_OPEN) {
        return Ok(markup.to_string());
    }

    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(open) = rest.find(CDATA_OPEN) {
        out.push_str(&rest[..open]);
        let body_start = open + CDATA_OPEN.len();
        let close = rest[body_start..].find(CDATA_CLOSE).ok_or_else(|| {
            AppError::Conversion(format!(
                "unterminated CDATA section at byte {}",
                markup.len() - rest.len() + open
            ))
        })?;
        push_escaped(&mut out, &rest[body_start..body_start + close]);
        rest = &rest[body_start + close + CDATA_CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Whether `input` carries markup outside of Markdown code.
///
/// Fenced code blocks and code spans are ignored, so text already
/// converted to Markdown reads as plain text even when its code samples
/// contain tags.
pub fn looks_like_markup(input: &str) -> bool {
    let prose = strip_markdown_code(input);
    if !prose.contains('<') {
        return false;
    }
    let fragment = Html::parse_fragment(&prose);
    fragment
        .root_element()
        .descendants()
        .skip(1)
        .any(|node| matches!(node.value(), Node::Element(_) | Node::Comment(_)))
}

/// Returns plain text unchanged apart from surrounding blank space.
pub fn passthrough(input: &str) -> String {
    let trimmed = input.trim_start_matches(['\n', '\r']).trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

/// Drops fenced code blocks and code spans, keeping everything else.
fn strip_markdown_code(input: &str) -> String {
    let mut prose = String::with_capacity(input.len());
    let mut open_fence: Option<usize> = None;

    for line in input.lines() {
        let content = block_content(line);
        let ticks = content.chars().take_while(|&c| c == '`').count();
        match open_fence {
            Some(width) => {
                if ticks >= width && content.trim_end().chars().all(|c| c == '`') {
                    open_fence = None;
                }
            }
            None if ticks >= 3 => open_fence = Some(ticks),
            None => {
                prose.push_str(&strip_code_spans(line));
                prose.push('\n');
            }
        }
    }
    prose
}

/// A line with its quote markers, list markers and indentation removed.
///
/// Fences nested in block quotes or list items open after those prefixes.
fn block_content(line: &str) -> &str {
    let mut rest = line.trim_start();
    loop {
        if let Some(inner) = rest.strip_prefix('>') {
            rest = inner.trim_start();
            continue;
        }
        if let Some(inner) = strip_list_marker(rest) {
            rest = inner.trim_start();
            continue;
        }
        return rest;
    }
}

fn strip_list_marker(line: &str) -> Option<&str> {
    for bullet in ["- ", "* ", "+ "] {
        if let Some(inner) = line.strip_prefix(bullet) {
            return Some(inner);
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}

fn strip_code_spans(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            out.push(chars[i]);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if chars[i] != '`' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let run = backtick_run(&chars, i);
        match find_closing_run(&chars, i + run, run) {
            Some(close) => i = close + run,
            None => {
                out.extend(std::iter::repeat('`').take(run));
                i += run;
            }
        }
    }
    out
}

fn backtick_run(chars: &[char], start: usize) -> usize {
    chars[start..].iter().take_while(|&&c| c == '`').count()
}

fn find_closing_run(chars: &[char], from: usize, width: usize) -> Option<usize> {
    let mut i = from;
    while i < chars.len() {
        if chars[i] == '`' {
            let run = backtick_run(chars, i);
            if run == width {
                return Some(i);
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdata_becomes_escaped_text() {
        let prepared = prepare("<ac:plain-text-body><![CDATA[if a < b && c]]></ac:plain-text-body>")
            .unwrap();
        assert_eq!(
            prepared,
            "<ac:plain-text-body>if a &lt; b &amp;&amp; c</ac:plain-text-body>"
        );
    }

    #[test]
    fn unterminated_cdata_is_an_error() {
        let err = prepare("<p><![CDATA[never closed</p>").unwrap_err();
        assert!(err.to_string().contains("CDATA"));
    }

    #[test]
    fn self_closing_namespaced_tags_are_expanded() {
        let prepared = prepare(r#"<ac:image><ri:attachment ri:filename="a.png" /></ac:image><br/>"#)
            .unwrap();
        assert_eq!(
            prepared,
            r#"<ac:image><ri:attachment ri:filename="a.png"></ri:attachment></ac:image><br/>"#
        );
    }

    #[test]
    fn markdown_with_code_samples_is_not_markup() {
        let markdown = "Use `<div>` here.\n\n```html\n<p>sample</p>\n```\n";
        assert!(!looks_like_markup(markdown));
        assert!(looks_like_markup("<p>Hello</p>"));
        assert!(looks_like_markup("text <!-- note -->"));
        assert!(!looks_like_markup("a &lt;b&gt; c"));
    }

    #[test]
    fn fences_inside_quotes_and_lists_are_code() {
        let quoted = "> **Info**\n>\n> ```\n> <b>x</b>\n> ```\n";
        assert!(!looks_like_markup(quoted));
        let nested = "> > ```html\n> > <div></div>\n> > ```\n";
        assert!(!looks_like_markup(nested));
        let listed = "- ```\n  <p>in a list</p>\n  ```\n";
        assert!(!looks_like_markup(listed));
        assert!(looks_like_markup("> quoted <b>tag</b>"));
    }

    #[test]
    fn passthrough_normalizes_edges_only() {
        assert_eq!(passthrough("\n\nHello *world*  \n\n"), "Hello *world*\n");
        assert_eq!(passthrough("   "), "");
    }
}
