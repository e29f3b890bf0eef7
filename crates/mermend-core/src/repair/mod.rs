//! Repair passes and the registry that orders them.
//!
//! Every pass is a total function `&str -> Cow<str>`: a source it has nothing to say about comes
//! back borrowed and unchanged, and running a pass on its own output is a no-op.

use crate::{DiagramKind, NormalizeConfig};
use std::borrow::Cow;

pub mod er;
pub mod gantt;
pub mod label;

pub type RepairFn = for<'a> fn(text: &'a str, config: &NormalizeConfig) -> Cow<'a, str>;

#[derive(Debug, Clone)]
pub struct RepairPass {
    /// Stable id, also the key under `passes.` in [`NormalizeConfig`].
    pub id: &'static str,
    /// Diagram kind the source must declare for the pass to run. `None` runs on every source.
    pub kind: Option<DiagramKind>,
    pub repair: RepairFn,
}

#[derive(Debug, Clone)]
pub struct RepairRegistry {
    passes: Vec<RepairPass>,
}

impl RepairRegistry {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn add(&mut self, pass: RepairPass) {
        self.passes.push(pass);
    }

    pub fn add_fn(&mut self, id: &'static str, kind: Option<DiagramKind>, repair: RepairFn) {
        self.add(RepairPass { id, kind, repair });
    }

    pub fn passes(&self) -> &[RepairPass] {
        &self.passes
    }

    pub fn get(&self, id: &str) -> Option<&RepairPass> {
        self.passes.iter().find(|p| p.id == id)
    }

    pub fn default_passes() -> Self {
        let mut reg = Self::new();

        // The pass order is significant: label quoting is kind-agnostic and must see the raw
        // source before any kind-specific rewrite.
        reg.add_fn(label::PASS_ID, None, label::quote_node_labels);
        reg.add_fn(er::PASS_ID, Some(DiagramKind::Er), er::repair_er);
        reg.add_fn(gantt::PASS_ID, Some(DiagramKind::Gantt), gantt::repair_gantt);

        reg
    }
}

impl Default for RepairRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a line produced by `split_inclusive('\n')` into its content and line terminator.
pub(crate) fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}
