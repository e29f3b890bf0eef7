use regex::Regex;
use std::fmt;

/// Diagram kinds recognised from a Mermaid header keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    State,
    Er,
    Gantt,
    Pie,
    Journey,
    GitGraph,
    Mindmap,
    Timeline,
    Quadrant,
    Requirement,
    C4,
    Sankey,
    XyChart,
    Block,
    Packet,
    Kanban,
    Architecture,
    Radar,
    Treemap,
}

impl DiagramKind {
    /// Stable id, matching the keyword an author would write in the header.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Sequence => "sequenceDiagram",
            DiagramKind::Class => "classDiagram",
            DiagramKind::State => "stateDiagram",
            DiagramKind::Er => "erDiagram",
            DiagramKind::Gantt => "gantt",
            DiagramKind::Pie => "pie",
            DiagramKind::Journey => "journey",
            DiagramKind::GitGraph => "gitGraph",
            DiagramKind::Mindmap => "mindmap",
            DiagramKind::Timeline => "timeline",
            DiagramKind::Quadrant => "quadrantChart",
            DiagramKind::Requirement => "requirementDiagram",
            DiagramKind::C4 => "c4",
            DiagramKind::Sankey => "sankey",
            DiagramKind::XyChart => "xychart",
            DiagramKind::Block => "block",
            DiagramKind::Packet => "packet",
            DiagramKind::Kanban => "kanban",
            DiagramKind::Architecture => "architecture",
            DiagramKind::Radar => "radar",
            DiagramKind::Treemap => "treemap",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Order is significant: longer keywords that share a prefix with a shorter one come first.
const HEADER_KEYWORDS: &[(&str, DiagramKind)] = &[
    ("C4Context", DiagramKind::C4),
    ("C4Container", DiagramKind::C4),
    ("C4Component", DiagramKind::C4),
    ("C4Dynamic", DiagramKind::C4),
    ("C4Deployment", DiagramKind::C4),
    ("kanban", DiagramKind::Kanban),
    ("classDiagram", DiagramKind::Class),
    ("erDiagram", DiagramKind::Er),
    ("gantt", DiagramKind::Gantt),
    ("pie", DiagramKind::Pie),
    ("requirementDiagram", DiagramKind::Requirement),
    ("requirement", DiagramKind::Requirement),
    ("sequenceDiagram", DiagramKind::Sequence),
    ("flowchart", DiagramKind::Flowchart),
    ("graph", DiagramKind::Flowchart),
    ("timeline", DiagramKind::Timeline),
    ("gitGraph", DiagramKind::GitGraph),
    ("stateDiagram", DiagramKind::State),
    ("journey", DiagramKind::Journey),
    ("quadrantChart", DiagramKind::Quadrant),
    ("sankey", DiagramKind::Sankey),
    ("packet", DiagramKind::Packet),
    ("xychart", DiagramKind::XyChart),
    ("block", DiagramKind::Block),
    ("radar", DiagramKind::Radar),
    ("treemap", DiagramKind::Treemap),
    ("mindmap", DiagramKind::Mindmap),
    ("architecture", DiagramKind::Architecture),
];

fn frontmatter_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^\s*-{3}\s*[\n\r](.*?)[\n\r]-{3}\s*[\n\r]+").expect("valid regex")
    })
}

/// Infers the diagram kind from the header keyword.
///
/// The header is the first non-blank line after YAML front-matter, `%%{...}%%` directives and
/// `%%` comment lines. Variant suffixes (`stateDiagram-v2`, `xychart-beta`, `flowchart-elk`) are
/// accepted; a keyword must not be followed by another identifier character, so `graphics` is not
/// a flowchart.
pub fn detect_kind(text: &str) -> Option<DiagramKind> {
    let without_frontmatter = match frontmatter_regex().find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    };
    let without_directives = strip_directives(without_frontmatter);

    let header = without_directives
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("%%"))?;

    HEADER_KEYWORDS
        .iter()
        .find(|(keyword, _)| starts_with_keyword(header, keyword))
        .map(|(_, kind)| *kind)
}

/// Returns `true` if `text` declares `kind` in its header.
pub fn declares_kind(text: &str, kind: DiagramKind) -> bool {
    detect_kind(text) == Some(kind)
}

fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    let Some(rest) = line.strip_prefix(keyword) else {
        return false;
    };
    !rest
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Drops every `%%{ ... }%%` directive. An unterminated directive runs to the end of the text.
fn strip_directives(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((before, directive)) = rest.split_once("%%{") {
        out.push_str(before);
        let Some((_, tail)) = directive.split_once("}%%") else {
            return out;
        };
        rest = tail;
    }
    out.push_str(rest);
    out
}
