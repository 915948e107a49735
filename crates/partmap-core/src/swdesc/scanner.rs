//! Explicit-state scanner for the update-descriptor grammar
//!
//! The descriptor is a libconfig-style document: `identifier = value;`
//! assignments inside arbitrarily nested `{ }` blocks, where a value is a
//! quoted string (with `\"` and `\\` escapes), an integer, a boolean, or a
//! bare token. The scanner walks the text once, tracking brace depth and
//! string-literal context together, so a literal brace inside a quoted value
//! can never desynchronize block boundaries.

use std::collections::{HashMap, HashSet};

/// One `key = value;` assignment found in the text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Assignment<'a> {
    pub key: &'a str,
    pub value: RawValue<'a>,
}

/// The value side of an assignment, before typing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawValue<'a> {
    /// Quoted string with escapes resolved
    Str(String),
    /// Unquoted token, trimmed (integers, booleans, device paths)
    Bare(&'a str),
}

impl RawValue<'_> {
    /// The textual content, whichever form the value took.
    pub(crate) fn text(&self) -> &str {
        match self {
            RawValue::Str(s) => s,
            RawValue::Bare(t) => t,
        }
    }
}

/// Byte span of every block that directly contains a `device =` assignment.
///
/// For each occurrence the enclosing block is the innermost brace pair still
/// open at that point. Spans are returned in occurrence order and
/// deduplicated by exact text, so a block with several `device` lines is
/// reported once.
pub(crate) fn device_blocks(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut open_stack: Vec<usize> = Vec::new();
    let mut close_of: HashMap<usize, usize> = HashMap::new();
    let mut hits: Vec<usize> = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => i = skip_string(bytes, i),
            b'{' => {
                open_stack.push(i);
                i += 1;
            }
            b'}' => {
                if let Some(open) = open_stack.pop() {
                    close_of.insert(open, i);
                }
                i += 1;
            }
            b if is_ident_start(b) && !continues_ident(bytes, i) => {
                let end = ident_end(bytes, i);
                if &text[i..end] == "device" {
                    let after = skip_ws(bytes, end);
                    if bytes.get(after) == Some(&b'=') {
                        if let Some(&open) = open_stack.last() {
                            hits.push(open);
                        }
                    }
                }
                i = end;
            }
            _ => i += 1,
        }
    }

    let mut seen = HashSet::new();
    let mut blocks = Vec::new();
    for open in hits {
        if let Some(&close) = close_of.get(&open) {
            let span = &text[open..close + 1];
            if seen.insert(span) {
                blocks.push(span);
            }
        }
    }
    blocks
}

/// Every well-terminated `key = value;` assignment in `text`, in document
/// order. Assignments missing their semicolon are dropped, not guessed at.
pub(crate) fn assignments(text: &str) -> Vec<Assignment<'_>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' {
            i = skip_string(bytes, i);
            continue;
        }
        if is_ident_start(b) && !continues_ident(bytes, i) {
            let end = ident_end(bytes, i);
            let after = skip_ws(bytes, end);
            if bytes.get(after) == Some(&b'=') {
                let value_start = skip_ws(bytes, after + 1);
                if let Some((value, next)) = read_value(text, value_start) {
                    out.push(Assignment { key: &text[i..end], value });
                    i = next;
                    continue;
                }
            }
            i = end;
            continue;
        }
        i += 1;
    }
    out
}

/// Read one value starting at `start` and the terminating semicolon.
/// Returns the value and the index just past the semicolon, or `None` when
/// the value is not properly terminated.
fn read_value(text: &str, start: usize) -> Option<(RawValue<'_>, usize)> {
    let bytes = text.as_bytes();
    match bytes.get(start).copied()? {
        b'"' => {
            let (content, end) = read_string(text, start);
            let after = skip_ws(bytes, end);
            if bytes.get(after) == Some(&b';') {
                Some((RawValue::Str(content), after + 1))
            } else {
                None
            }
        }
        _ => {
            // A bare token runs to its semicolon on the same line and never
            // crosses a brace or a quote.
            let mut end = start;
            while end < bytes.len() && !matches!(bytes[end], b';' | b'\n' | b'{' | b'}' | b'"') {
                end += 1;
            }
            if bytes.get(end) != Some(&b';') {
                return None;
            }
            Some((RawValue::Bare(text[start..end].trim()), end + 1))
        }
    }
}

/// Consume a quoted string, resolving escapes. Returns the content and the
/// index just past the closing quote. An unterminated string swallows the
/// rest of the text, which keeps the scanner from misreading its tail as
/// structure.
fn read_string(text: &str, open: usize) -> (String, usize) {
    let mut content = String::new();
    let mut chars = text[open + 1..].char_indices();
    while let Some((off, ch)) = chars.next() {
        match ch {
            '"' => return (content, open + 1 + off + 1),
            '\\' => match chars.next() {
                Some((_, '"')) => content.push('"'),
                Some((_, '\\')) => content.push('\\'),
                Some((_, 'n')) => content.push('\n'),
                Some((_, 't')) => content.push('\t'),
                Some((_, 'r')) => content.push('\r'),
                Some((_, other)) => {
                    content.push('\\');
                    content.push(other);
                }
                None => break,
            },
            _ => content.push(ch),
        }
    }
    (content, text.len())
}

/// Byte-level twin of [`read_string`] used where only the end position
/// matters. Both functions must agree on where a string ends.
fn skip_string(bytes: &[u8], open: usize) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// True when position `i` sits inside an identifier that began earlier, e.g.
/// the `d` of `0device`. Such positions must not start a new identifier.
fn continues_ident(bytes: &[u8], i: usize) -> bool {
    i > 0 && is_ident_byte(bytes[i - 1])
}

fn ident_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    i
}

fn skip_ws(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}
