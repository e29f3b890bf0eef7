//! Quotes node labels that contain characters Mermaid reads as structure.
//!
//! `A[User (View/Controller)]` is a syntax error in a flowchart because `(` opens a shape and `/`
//! a parallelogram; `A["User (View/Controller)"]` renders as intended.

use crate::NormalizeConfig;
use regex::Regex;
use std::borrow::Cow;

pub const PASS_ID: &str = "labelQuoting";

const STRUCTURAL_CHARS: [char; 4] = ['(', ')', '/', ':'];

fn node_label_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    // `<identifier>[<label>]`, the label running to the first unescaped `]` on the same line.
    RE.get_or_init(|| Regex::new(r"(\w+)\[((?:\\.|[^\]\\\n])*)\]").expect("valid regex"))
}

/// Wraps unquoted node labels containing `(`, `)`, `/` or `:` in double quotes.
///
/// Runs on every diagram kind. A label whose first non-blank character is `"` or `'` is left
/// as-is, which also makes the pass idempotent. `id[...]` text inside a `"..."` string (edge text,
/// ER attribute comments) is not a node label and is never touched. A label that gets wrapped
/// does not count toward the open/closed state of strings, so a second run sees the same strings.
pub fn quote_node_labels<'a>(text: &'a str, _config: &NormalizeConfig) -> Cow<'a, str> {
    let re = node_label_regex();
    if !re.is_match(text) {
        return Cow::Borrowed(text);
    }

    let mut out = String::new();
    let mut copied = 0;
    let mut strings = StringState::default();
    let mut pos = 0;
    while let Some(caps) = re.captures_at(text, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        strings.advance(&text[pos..whole.start()]);
        if strings.open {
            pos = strings.close(text, whole.start());
            continue;
        }
        match quote_label(&caps[2]) {
            Some(quoted) => {
                out.push_str(&text[copied..whole.start()]);
                out.push_str(&caps[1]);
                out.push('[');
                out.push_str(&quoted);
                out.push(']');
                copied = whole.end();
            }
            None => strings.advance(whole.as_str()),
        }
        pos = whole.end();
    }

    if copied == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}

/// Whether the scan is inside a `"..."` string. Strings never span lines.
#[derive(Debug, Default)]
struct StringState {
    open: bool,
}

impl StringState {
    fn advance(&mut self, scanned: &str) {
        for ch in scanned.chars() {
            match ch {
                '"' => self.open = !self.open,
                '\n' => self.open = false,
                _ => {}
            }
        }
    }

    /// Offset just past the end of the open string that contains `from`.
    fn close(&mut self, text: &str, from: usize) -> usize {
        self.open = false;
        match text[from..].find(['"', '\n']) {
            Some(rel) => from + rel + 1,
            None => text.len(),
        }
    }
}

fn quote_label(label: &str) -> Option<String> {
    let head = label.trim_start();
    if head.starts_with('"') || head.starts_with('\'') {
        return None;
    }
    if !label.contains(STRUCTURAL_CHARS) {
        return None;
    }
    if is_shape_syntax(label) {
        return None;
    }
    Some(format!("\"{}\"", label.replace('"', "#quot;")))
}

/// Bracket contents that are themselves Mermaid node-shape syntax: `[(db)]`, `[[sub]]`,
/// `[/in/]`, `[\out\]`, `[/trap\]`, `[\trap/]`.
fn is_shape_syntax(label: &str) -> bool {
    let t = label.trim();
    if t.starts_with('[') {
        return true;
    }
    if t.len() < 2 {
        return false;
    }
    let first = t.as_bytes()[0];
    let last = t.as_bytes()[t.len() - 1];
    match first {
        b'(' => last == b')',
        b'/' | b'\\' => matches!(last, b'/' | b'\\'),
        _ => false,
    }
}
