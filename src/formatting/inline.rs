// src/formatting/inline.rs
//! Inline Markdown accumulation with HTML whitespace collapsing and escaping.
//!
//! Text pushed through [`InlineBuffer::push_text`] is escaped so that it
//! renders literally: Markdown punctuation gets a backslash, and anything a
//! Markdown renderer or HTML parser would read as a tag or entity is
//! spelled with `&lt;`/`&amp;`. Converted output therefore never contains
//! raw markup outside of code.

/// Accumulates one paragraph, heading or cell worth of inline Markdown.
#[derive(Debug, Default)]
pub struct InlineBuffer {
    out: String,
    pending_space: bool,
    leading_space: bool,
    single_line: bool,
}

impl InlineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer for headings and table cells, where line breaks become spaces.
    pub fn single_line() -> Self {
        Self {
            single_line: true,
            ..Self::default()
        }
    }

    /// An empty buffer with the same line mode, for wrapped content.
    pub fn child(&self) -> Self {
        Self {
            single_line: self.single_line,
            ..Self::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.out.trim().is_empty()
    }

    /// Appends text, collapsing whitespace runs and escaping Markdown syntax.
    pub fn push_text(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            if is_collapsible(ch) {
                self.push_space();
                i += 1;
                continue;
            }
            self.flush_space();
            i = self.push_escaped(&chars, i);
        }
    }

    /// Appends already-formatted Markdown verbatim.
    pub fn push_raw(&mut self, markdown: &str) {
        if markdown.is_empty() {
            return;
        }
        self.flush_space();
        self.out.push_str(markdown);
    }

    pub fn push_space(&mut self) {
        if self.out.is_empty() {
            self.leading_space = true;
        }
        self.pending_space = true;
    }

    /// A hard line break, or a space in single-line mode.
    pub fn hard_break(&mut self) {
        if self.single_line {
            self.push_space();
            return;
        }
        if self.out.is_empty() || self.out.ends_with('\n') {
            return;
        }
        self.pending_space = false;
        self.out.push_str("\\\n");
    }

    /// Wraps `inner` in an emphasis marker such as `**` or `~~`.
    ///
    /// Surrounding whitespace moves outside the markers, and empty content
    /// emits nothing.
    pub fn push_wrapped(&mut self, marker: &str, inner: InlineBuffer) {
        let (leading, body, trailing) = inner.into_parts();
        if leading {
            self.push_space();
        }
        if !body.is_empty() {
            self.flush_space();
            self.out.push_str(marker);
            self.out.push_str(&body);
            self.out.push_str(marker);
        }
        if trailing {
            self.push_space();
        }
    }

    /// Appends `[text](destination)`; falls back to the destination as text.
    pub fn push_link(&mut self, text: InlineBuffer, destination: &str) {
        let (leading, body, trailing) = text.into_parts();
        if leading {
            self.push_space();
        }
        let label = if body.is_empty() {
            escape_inline(destination)
        } else {
            body
        };
        self.flush_space();
        self.out.push('[');
        self.out.push_str(&label);
        self.out.push_str("](");
        self.out.push_str(&encode_destination(destination));
        self.out.push(')');
        if trailing {
            self.push_space();
        }
    }

    /// Appends everything `inner` collected, without decoration.
    pub fn push_buffer(&mut self, inner: InlineBuffer) {
        let (leading, body, trailing) = inner.into_parts();
        if leading {
            self.push_space();
        }
        self.push_raw(&body);
        if trailing {
            self.push_space();
        }
    }

    pub fn push_image(&mut self, alt: &str, destination: &str) {
        if destination.is_empty() {
            return;
        }
        let alt = escape_inline(alt);
        self.push_raw(&format!("![{}]({})", alt, encode_destination(destination)));
    }

    /// Appends a code span sized to hold any backticks in `code`.
    pub fn push_code(&mut self, code: &str) {
        let code: String = code
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        if code.trim().is_empty() {
            return;
        }
        let fence = "`".repeat(longest_backtick_run(&code) + 1);
        let pad = code.starts_with('`') || code.ends_with('`');
        let space = if pad { " " } else { "" };
        self.push_raw(&format!("{fence}{space}{code}{space}{fence}"));
    }

    /// The collected Markdown with surrounding whitespace and trailing
    /// hard breaks removed.
    pub fn finish(self) -> String {
        self.into_parts().1
    }

    fn into_parts(self) -> (bool, String, bool) {
        let trailing = self.pending_space;
        let mut body = self.out;
        loop {
            let kept = body.trim_end_matches([' ', '\t']).len();
            body.truncate(kept);
            if body.ends_with("\\\n") {
                body.truncate(body.len() - 2);
            } else if body.ends_with('\n') {
                body.pop();
            } else {
                break;
            }
        }
        let body = body.trim_start().to_string();
        (self.leading_space, body, trailing)
    }

    fn flush_space(&mut self) {
        if self.pending_space {
            if !self.out.is_empty() && !self.out.ends_with('\n') {
                self.out.push(' ');
            }
            self.pending_space = false;
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    /// Escapes `chars[i]` onto the buffer and returns the next index.
    fn push_escaped(&mut self, chars: &[char], i: usize) -> usize {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();

        if self.at_line_start() {
            if let Some(end) = ordered_marker_end(chars, i) {
                self.out.extend(&chars[i..end]);
                self.out.push('\\');
                self.out.push(chars[end]);
                return end + 1;
            }
            let ends_token = next.map_or(true, is_collapsible);
            let block_marker = match ch {
                '#' | '>' | '=' => true,
                '-' => ends_token || next == Some('-'),
                '+' => ends_token,
                _ => false,
            };
            if block_marker {
                self.out.push('\\');
                self.out.push(ch);
                return i + 1;
            }
        }

        match ch {
            '\\' | '`' | '*' | '[' | ']' | '~' => {
                self.out.push('\\');
                self.out.push(ch);
            }
            '_' => {
                let prev = self.out.chars().last();
                let intraword = prev.is_some_and(char::is_alphanumeric)
                    && next.is_some_and(char::is_alphanumeric);
                if !intraword {
                    self.out.push('\\');
                }
                self.out.push('_');
            }
            '<' if next.is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?')) => {
                self.out.push_str("&lt;");
            }
            '&' if looks_like_entity(&chars[i + 1..]) => self.out.push_str("&amp;"),
            c => self.out.push(c),
        }
        i + 1
    }
}

/// HTML collapses ASCII whitespace only; a no-break space is content.
fn is_collapsible(ch: char) -> bool {
    ch.is_ascii_whitespace()
}

/// `12.` or `3)` followed by whitespace or the end: returns the index of
/// the delimiter.
fn ordered_marker_end(chars: &[char], start: usize) -> Option<usize> {
    let digits = chars[start..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let delimiter = start + digits;
    match chars.get(delimiter) {
        Some('.') | Some(')') => {
            let after = chars.get(delimiter + 1).copied();
            after.map_or(true, is_collapsible).then_some(delimiter)
        }
        _ => None,
    }
}

/// `name;`, `#123;` or `#x1F;` right after an ampersand.
fn looks_like_entity(rest: &[char]) -> bool {
    let Some(end) = rest.iter().take(32).position(|&c| c == ';') else {
        return false;
    };
    let body = &rest[..end];
    match body.split_first() {
        Some((&'#', numeric)) => match numeric.split_first() {
            Some((&('x' | 'X'), hex)) => !hex.is_empty() && hex.iter().all(char::is_ascii_hexdigit),
            _ => !numeric.is_empty() && numeric.iter().all(char::is_ascii_digit),
        },
        Some(_) => body.iter().all(char::is_ascii_alphanumeric),
        None => false,
    }
}

pub(crate) fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Escapes text for use inside a single line of inline Markdown.
pub fn escape_inline(text: &str) -> String {
    let mut buffer = InlineBuffer::single_line();
    buffer.push_text(text);
    buffer.finish()
}

/// Makes a link destination safe to write between parentheses.
pub fn encode_destination(destination: &str) -> String {
    let mut encoded = String::with_capacity(destination.len());
    for ch in destination.trim().chars() {
        match ch {
            ' ' => encoded.push_str("%20"),
            '(' => encoded.push_str("%28"),
            ')' => encoded.push_str("%29"),
            '<' => encoded.push_str("%3C"),
            '>' => encoded.push_str("%3E"),
            '\n' | '\r' | '\t' => {}
            c => encoded.push(c),
        }
    }
    encoded
}
