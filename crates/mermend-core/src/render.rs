//! Handing normalized source to an external renderer.
//!
//! The renderer is opaque: it turns diagram source into markup or rejects it with a syntax error.
//! The normalizer makes exactly one attempt; a rejection is reported back with both the original
//! and the normalized source so the caller can show them to the user.

use crate::{Normalizer, Result};

/// Syntax error reported by a renderer, carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait DiagramRenderer {
    /// Renders `source` under the caller-chosen unique `id`.
    fn render(&self, id: &str, source: &str) -> std::result::Result<String, SyntaxError>;
}

impl<F> DiagramRenderer for F
where
    F: Fn(&str, &str) -> std::result::Result<String, SyntaxError>,
{
    fn render(&self, id: &str, source: &str) -> std::result::Result<String, SyntaxError> {
        self(id, source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    pub id: String,
    pub markup: String,
    /// The source the renderer accepted.
    pub normalized: String,
}

/// A renderer rejection, with everything needed to diagnose it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("diagram `{id}` failed to render: {message}")]
pub struct RenderFailure {
    pub id: String,
    /// The renderer's message, unmodified.
    pub message: String,
    /// Source before normalization.
    pub original: String,
    /// Source the renderer rejected.
    pub normalized: String,
}

/// Normalizes `source` once and renders it once.
///
/// Blank input skips rendering and returns `Ok(None)`.
pub fn render_diagram<R>(
    normalizer: &Normalizer,
    renderer: &R,
    id: &str,
    source: &str,
) -> Result<Option<RenderedDiagram>>
where
    R: DiagramRenderer + ?Sized,
{
    if source.trim().is_empty() {
        return Ok(None);
    }

    let normalized = normalizer.normalize(source);
    match renderer.render(id, &normalized) {
        Ok(markup) => Ok(Some(RenderedDiagram {
            id: id.to_string(),
            markup,
            normalized,
        })),
        Err(err) => {
            tracing::warn!(id, error = %err, "renderer rejected normalized diagram source");
            Err(RenderFailure {
                id: id.to_string(),
                message: err.message,
                original: source.to_string(),
                normalized,
            }
            .into())
        }
    }
}

const UNTITLED_ID: &str = "m-untitled";

/// Renderer id derived from `raw`.
///
/// The id starts with an ASCII letter (`m-` is prepended otherwise) and holds only ASCII
/// alphanumerics, `_`, `:`, `.` and single `-` separators. Every other character becomes a
/// separator. Blank input, or input with nothing usable, yields `m-untitled`.
pub fn diagram_id(raw: &str) -> String {
    let mut id = String::with_capacity(raw.len() + 2);
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | ':' | '.') {
            id.push(ch);
        } else if !id.is_empty() && !id.ends_with('-') {
            id.push('-');
        }
    }
    if id.ends_with('-') {
        id.pop();
    }
    if id.is_empty() {
        return UNTITLED_ID.to_string();
    }
    if !id.starts_with(|c: char| c.is_ascii_alphabetic()) {
        id.insert_str(0, "m-");
    }
    id
}

/// Renderer id for the `block`-th diagram of the `message`-th chat message.
pub fn block_diagram_id(message: usize, block: usize) -> String {
    diagram_id(&format!("mermaid-{message}-{block}"))
}
