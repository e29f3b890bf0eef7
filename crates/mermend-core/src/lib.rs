#![forbid(unsafe_code)]

//! Best-effort repair of Mermaid diagram source written by a language model.
//!
//! Design goals:
//! - text in, text out: a pass that has nothing to fix returns its input untouched
//! - never fail and never panic on arbitrary input
//! - every pass is idempotent, so normalizing twice equals normalizing once
//!
//! The normalizer runs an ordered list of repair passes. Label quoting runs on every source; the
//! other passes only run when the diagram header declares their kind.

pub mod config;
pub mod detect;
pub mod error;
pub mod markdown;
pub mod render;
pub mod repair;

pub use config::NormalizeConfig;
pub use detect::{DiagramKind, declares_kind, detect_kind};
pub use error::{Error, Result};
pub use markdown::{MermaidBlock, extract_mermaid_blocks, rewrite_mermaid_blocks};
pub use render::{
    DiagramRenderer, RenderFailure, RenderedDiagram, SyntaxError, block_diagram_id, diagram_id,
    render_diagram,
};
pub use repair::{RepairFn, RepairPass, RepairRegistry};

use std::borrow::Cow;
use std::sync::OnceLock;

/// Result of a normalization that also reports which passes changed the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOutcome {
    pub code: String,
    /// Ids of the passes that changed the text, in the order they ran.
    pub applied: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    registry: RepairRegistry,
    config: NormalizeConfig,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            registry: RepairRegistry::default_passes(),
            config: NormalizeConfig::default(),
        }
    }

    pub fn with_registry(registry: RepairRegistry) -> Self {
        Self {
            registry,
            config: NormalizeConfig::default(),
        }
    }

    /// Overlays `config` on the current configuration.
    pub fn with_config(mut self, config: &NormalizeConfig) -> Self {
        self.config.deep_merge(config.as_value());
        self
    }

    pub fn registry(&self) -> &RepairRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RepairRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut NormalizeConfig {
        &mut self.config
    }

    pub fn normalize(&self, source: &str) -> String {
        self.normalize_with_report(source).code
    }

    pub fn normalize_with_report(&self, source: &str) -> NormalizeOutcome {
        let mut applied = Vec::new();
        if source.is_empty() {
            return NormalizeOutcome {
                code: String::new(),
                applied,
            };
        }

        // Label quoting never touches the header line, so the kind is stable across passes.
        let kind = detect_kind(source);
        let mut text = Cow::Borrowed(source);

        for pass in self.registry.passes() {
            if !self.config.is_enabled(&format!("passes.{}", pass.id)) {
                tracing::trace!(pass = pass.id, "repair pass disabled by config");
                continue;
            }
            if let Some(required) = pass.kind {
                if kind != Some(required) {
                    tracing::trace!(
                        pass = pass.id,
                        required = %required,
                        "diagram does not declare the pass kind; skipped"
                    );
                    continue;
                }
            }

            if let Cow::Owned(repaired) = (pass.repair)(&text, &self.config) {
                if repaired != *text {
                    tracing::debug!(
                        pass = pass.id,
                        kind = kind.map(DiagramKind::as_str),
                        before = text.len(),
                        after = repaired.len(),
                        "repair pass changed diagram source"
                    );
                    applied.push(pass.id);
                    text = Cow::Owned(repaired);
                }
            }
        }

        NormalizeOutcome {
            code: text.into_owned(),
            applied,
        }
    }

    /// Normalizes every mermaid fence of a Markdown document, leaving everything else as-is.
    pub fn normalize_markdown(&self, markdown: &str) -> String {
        rewrite_mermaid_blocks(markdown, |code| self.normalize(code))
    }
}

fn default_normalizer() -> &'static Normalizer {
    static NORMALIZER: OnceLock<Normalizer> = OnceLock::new();
    NORMALIZER.get_or_init(Normalizer::new)
}

/// Repairs `source` with the default passes and configuration.
pub fn normalize(source: &str) -> String {
    default_normalizer().normalize(source)
}

/// Repairs every mermaid fence of `markdown` with the default passes and configuration.
pub fn normalize_markdown(markdown: &str) -> String {
    default_normalizer().normalize_markdown(markdown)
}

#[cfg(test)]
mod tests;
