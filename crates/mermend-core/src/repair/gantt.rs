//! Gantt task-line repairs.
//!
//! Precondition: the source declares `gantt`. Only task lines are touched: a line containing `:`
//! whose first word is not a gantt statement keyword and which is not a `%%` comment. The task
//! body is everything after the first `:`; three rewrites run on it in order:
//!
//! 1. stray `:` separators become `, ` (`des:2024-01-01, 3d` -> `des, 2024-01-01, 3d`), clock
//!    times such as `10:30` excepted;
//! 2. only the first `after ...` field survives (`after a, after b` -> `after a`);
//! 3. tags written after the duration move to the front of the body
//!    (`des, 3d, crit` -> `crit, des, 3d`), which is where Mermaid reads them.

use crate::NormalizeConfig;
use regex::{Captures, Regex};
use std::borrow::Cow;

pub const PASS_ID: &str = "gantt";

/// Task tags Mermaid accepts at the front of a task body.
pub const TASK_TAGS: &[&str] = &["crit", "milestone", "done", "active"];

const STATEMENT_KEYWORDS: &[&str] = &[
    "gantt",
    "title",
    "dateFormat",
    "axisFormat",
    "tickInterval",
    "section",
    "excludes",
    "includes",
    "todayMarker",
    "weekday",
    "weekend",
    "inclusiveEndDates",
    "topAxis",
    "displayMode",
    "click",
    "accTitle",
    "accDescr",
];

// `critical` is not a Mermaid tag, but models write it for `crit`.
const TAG_PATTERN: &str = "critical|crit|milestone|done|active";

fn stray_colon_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]*:[ \t]*").expect("valid regex"))
}

fn after_field_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*after[ \t]+\S").expect("valid regex"))
}

fn trailing_tags_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        let tag = format!("(?:{TAG_PATTERN})");
        // Tags already in front, then the task fields (id included when present), then the
        // misplaced tags. `fields` is lazy so `tail` takes the whole trailing run of tags. Tags may
        // follow the last field after a comma, or a bare duration after whitespace only.
        Regex::new(&format!(
            r"^(?P<lead>[ \t]*)(?P<head>(?:{tag}[ \t]*,[ \t]*)*)(?P<fields>.*?)(?:[ \t]*,[ \t]*|(?P<dur>\b\d+(?:\.\d+)?(?:ms|[smhdwMy]))[ \t]+)(?P<tail>{tag}(?:(?:[ \t]*,[ \t]*|[ \t]+){tag})*)[ \t]*$"
        ))
        .expect("valid regex")
    })
}

/// Applies the enabled gantt rewrites (`gantt.fixDelimiters`, `gantt.collapseDependencies`,
/// `gantt.repositionTags`) to every task line.
pub fn repair_gantt<'a>(text: &'a str, config: &NormalizeConfig) -> Cow<'a, str> {
    let fix_delimiters = config.is_enabled("gantt.fixDelimiters");
    let collapse = config.is_enabled("gantt.collapseDependencies");
    let reposition = config.is_enabled("gantt.repositionTags");

    let mut out = String::with_capacity(text.len());
    let mut changed = false;

    for line in text.split_inclusive('\n') {
        let (content, eol) = super::split_line_ending(line);
        let Some(colon) = task_body_start(content) else {
            out.push_str(line);
            continue;
        };

        let (head, original) = content.split_at(colon + 1);
        let mut body = original.to_string();
        if fix_delimiters {
            body = fix_stray_colons(&body).into_owned();
        }
        if collapse {
            body = collapse_dependencies(&body).into_owned();
        }
        if reposition {
            body = reposition_tags(&body).into_owned();
        }

        if body != original {
            changed = true;
        }
        out.push_str(head);
        out.push_str(&body);
        out.push_str(eol);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// Byte offset of the `:` that opens the task body, or `None` for non-task lines.
fn task_body_start(line: &str) -> Option<usize> {
    let t = line.trim_start();
    if t.is_empty() || t.starts_with("%%") {
        return None;
    }
    if STATEMENT_KEYWORDS.iter().any(|k| starts_with_keyword_ci(t, k)) {
        return None;
    }
    line.find(':')
}

fn starts_with_keyword_ci(s: &str, keyword: &str) -> bool {
    // Avoid slicing by raw bytes: task names may start with multi-byte characters.
    let Some(head) = s.get(..keyword.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(keyword) {
        return false;
    }
    match s[keyword.len()..].chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || c == ':',
    }
}

/// Rewrites every further `:` in a task body to `, `.
///
/// A tight colon between a standalone one- or two-digit field and a two-digit field is a clock
/// time and is kept: `10:30`, `2024-01-01T10:30`, `10:30:15`. A colon after an id ending in a
/// digit (`a1:2024-01-01`) is still a stray separator. A colon with nothing before it is dropped,
/// and so is one followed by a `,` or by nothing, so no empty field is created.
pub fn fix_stray_colons(body: &str) -> Cow<'_, str> {
    stray_colon_regex().replace_all(body, |caps: &Captures| {
        let m = caps.get(0).map(|m| (m.start(), m.end(), m.as_str()));
        let Some((start, end, matched)) = m else {
            return String::new();
        };
        let before = &body[..start];
        let after = &body[end..];

        let tight = matched == ":";
        if tight && starts_with_minutes(after) && ends_with_clock_field(before) {
            return matched.to_string();
        }
        if before.trim().is_empty() {
            return before_padding(matched);
        }
        if after.trim().is_empty() || after.starts_with(',') {
            return String::new();
        }
        ", ".to_string()
    })
}

/// `true` when `after` opens with a two-digit minute (or second) field: `30`, `30:15`, `00Z`.
fn starts_with_minutes(after: &str) -> bool {
    let bytes = after.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes
            .get(2)
            .is_none_or(|&b| b == b'Z' || !b.is_ascii_alphanumeric())
}

/// `true` when `before` ends in a standalone one- or two-digit clock field: preceded by the start
/// of the body, whitespace, `,`, `:` or the `T` of an ISO timestamp.
fn ends_with_clock_field(before: &str) -> bool {
    let digits = before
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    if !(1..=2).contains(&digits) {
        return false;
    }
    before[..before.len() - digits]
        .chars()
        .next_back()
        .is_none_or(|c| c.is_whitespace() || matches!(c, ',' | ':' | 'T'))
}

fn before_padding(matched: &str) -> String {
    if matched.starts_with([' ', '\t']) || matched.ends_with([' ', '\t']) {
        " ".to_string()
    } else {
        String::new()
    }
}

/// Keeps the first `after ...` field of a task body and drops every later one.
pub fn collapse_dependencies(body: &str) -> Cow<'_, str> {
    let re = after_field_regex();
    let mut seen_after = false;
    let mut dropped = false;
    let mut kept: Vec<&str> = Vec::new();

    for field in body.split(',') {
        if re.is_match(field) {
            if seen_after {
                dropped = true;
                continue;
            }
            seen_after = true;
        }
        kept.push(field);
    }

    if dropped {
        Cow::Owned(kept.join(","))
    } else {
        Cow::Borrowed(body)
    }
}

/// Moves tags that follow the task's other fields to the front of the body.
///
/// One pattern covers bodies with and without an explicit task id. Tags already at the front stay
/// first; duplicates are dropped and `critical` is written as `crit`.
pub fn reposition_tags(body: &str) -> Cow<'_, str> {
    let Some(caps) = trailing_tags_regex().captures(body) else {
        return canonicalize_leading_tags(body);
    };

    let lead = caps.name("lead").map_or("", |m| m.as_str());
    let head = caps.name("head").map_or("", |m| m.as_str());
    let fields = caps.name("fields").map_or("", |m| m.as_str());
    let dur = caps.name("dur").map_or("", |m| m.as_str());
    let tail = caps.name("tail").map_or("", |m| m.as_str());

    // The task must keep at least one non-tag field.
    let has_other_field =
        !dur.is_empty() || split_tags(fields).any(|f| canonical_tag(f).is_none());
    if !has_other_field {
        return canonicalize_leading_tags(body);
    }

    let mut tags: Vec<&'static str> = Vec::new();
    for tag in split_tags(head)
        .chain(split_tags(tail))
        .filter_map(canonical_tag)
    {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let mut out = String::with_capacity(body.len());
    out.push_str(lead);
    out.push_str(&tags.join(", "));
    out.push_str(", ");
    out.push_str(fields);
    out.push_str(dur);
    Cow::Owned(out)
}

fn split_tags(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

fn canonical_tag(tag: &str) -> Option<&'static str> {
    match tag {
        "critical" | "crit" => Some("crit"),
        "milestone" => Some("milestone"),
        "done" => Some("done"),
        "active" => Some("active"),
        _ => None,
    }
}

fn canonicalize_leading_tags(body: &str) -> Cow<'_, str> {
    let mut fields: Vec<&str> = body.split(',').collect();
    let mut changed = false;
    for field in fields.iter_mut() {
        let trimmed = field.trim();
        if trimmed == "critical" {
            *field = if field.starts_with([' ', '\t']) {
                " crit"
            } else {
                "crit"
            };
            changed = true;
            continue;
        }
        if !TASK_TAGS.contains(&trimmed) {
            break;
        }
    }
    if changed {
        Cow::Owned(fields.join(","))
    } else {
        Cow::Borrowed(body)
    }
}
