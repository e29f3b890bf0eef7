//! Mermaid fences inside Markdown documents (e.g. a chat assistant's reply).
//!
//! A block qualifies when it is a fenced code block whose info string starts with the word
//! `mermaid`. Its code is the block content with one trailing newline removed.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MermaidBlock {
    /// Position of the block among the document's mermaid blocks.
    pub index: usize,
    pub code: String,
    /// Byte range of the block content in the document, when the content is one contiguous
    /// slice. Blocks nested in list items or block quotes carry per-line container prefixes and
    /// have no span; they can be read but not rewritten in place.
    pub span: Option<Range<usize>>,
}

pub fn extract_mermaid_blocks(markdown: &str) -> Vec<MermaidBlock> {
    let mut out = Vec::new();
    let mut current: Option<(String, Vec<Range<usize>>)> = None;

    for (event, range) in Parser::new(markdown).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                if is_mermaid_info(&info) {
                    current = Some((String::new(), Vec::new()));
                }
            }
            Event::Text(text) => {
                if let Some((code, ranges)) = current.as_mut() {
                    code.push_str(&text);
                    ranges.push(range);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((code, ranges)) = current.take() {
                    out.push(MermaidBlock {
                        index: out.len(),
                        code: strip_trailing_newline(&code).to_string(),
                        span: contiguous_span(&ranges),
                    });
                }
            }
            _ => {}
        }
    }

    out
}

/// Rewrites every mermaid block of `markdown` through `repair`, leaving all other bytes as-is.
///
/// `repair` receives the block code as written in the document (without its trailing newline) and
/// returns the replacement.
pub fn rewrite_mermaid_blocks<F>(markdown: &str, mut repair: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(markdown.len());
    let mut pos = 0;

    for block in extract_mermaid_blocks(markdown) {
        let Some(span) = block.span else {
            tracing::debug!(
                block = block.index,
                "mermaid block has no contiguous source span; left unchanged"
            );
            continue;
        };
        let original = &markdown[span.clone()];
        let code = strip_trailing_newline(original);

        out.push_str(&markdown[pos..span.start]);
        out.push_str(&repair(code));
        out.push_str(&original[code.len()..]);
        pos = span.end;
    }

    out.push_str(&markdown[pos..]);
    out
}

fn strip_trailing_newline(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .unwrap_or(s)
}

fn is_mermaid_info(info: &str) -> bool {
    info.split_whitespace().next() == Some("mermaid")
}

fn contiguous_span(ranges: &[Range<usize>]) -> Option<Range<usize>> {
    let first = ranges.first()?;
    let mut end = first.end;
    for r in &ranges[1..] {
        if r.start != end {
            return None;
        }
        end = r.end;
    }
    Some(first.start..end)
}
