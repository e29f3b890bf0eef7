//! Entity-relationship repairs.
//!
//! Precondition: the source declares `erDiagram`. Two independent rewrites:
//!
//! 1. attribute lines lose a trailing quoted comment (`string email UK "login"` -> `string email UK`);
//! 2. `UPPER_SNAKE` entity names become `UpperCamel`, both where the entity is declared and where a
//!    relationship references it. Both sites go through [`canonical_entity_name`], so a name always
//!    maps to the same identifier.

use crate::NormalizeConfig;
use regex::{Captures, Regex};
use std::borrow::Cow;

pub const PASS_ID: &str = "er";

/// Key markers accepted between an attribute name and its comment.
pub const KEY_MARKERS: &[&str] = &["PK", "FK", "UK", "UNIQUE"];

fn attribute_comment_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        // <indent><type> <name>[ <key>[, <key>]...] "<comment>"
        // The key group is optional, so the keyed and un-keyed shapes share one match and a line
        // can only ever be stripped once.
        let token = r"[A-Za-z_*][\w\-\[\]()*]*";
        let key = format!("(?:{})", KEY_MARKERS.join("|"));
        Regex::new(&format!(
            r#"(?mR)^([ \t]*{token}[ \t]+{token}(?:[ \t]+{key}(?:[ \t]*,[ \t]*{key})*)?)[ \t]+"[^"\n]*"[ \t]*$"#
        ))
        .expect("valid regex")
    })
}

fn entity_header_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        // `NAME`, `NAME {`, `NAME["alias"] {`
        Regex::new(r"(?mR)^([ \t]*)([A-Z][A-Z0-9_]*)([ \t]*(?:\[[^\]\n]*\])?[ \t]*(?:\{.*)?)$")
            .expect("valid regex")
    })
}

const CARDINALITY_WORDS: &str = r"only one|zero or one|one or zero|one or more|one or many|zero or more|zero or many|many\(1\)|many\(0\)|1\+|0\+|many|one|1";

fn relationship_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        let symbolic = r"[|}o]{2}(?:--|\.\.|\.-|-\.)[|o{]{2}";
        // Symbolic cardinalities may touch both entity names (`A||--o{B`); word forms need spaces.
        let words = format!(
            r"(?:{CARDINALITY_WORDS})[ \t]+(?:optionally to|to)[ \t]+(?:{CARDINALITY_WORDS})"
        );
        Regex::new(&format!(
            r"(?mR)^([ \t]*)([\w-]+)([ \t]*{symbolic}[ \t]*|[ \t]+{words}[ \t]+)([\w-]+)(.*)$"
        ))
        .expect("valid regex")
    })
}

/// Applies the enabled ER rewrites (`er.stripComments`, `er.canonicalizeEntities`).
pub fn repair_er<'a>(text: &'a str, config: &NormalizeConfig) -> Cow<'a, str> {
    let mut out = Cow::Borrowed(text);
    if config.is_enabled("er.stripComments") {
        if let Cow::Owned(s) = strip_attribute_comments(&out) {
            out = Cow::Owned(s);
        }
    }
    if config.is_enabled("er.canonicalizeEntities") {
        if let Cow::Owned(s) = canonicalize_entities(&out) {
            out = Cow::Owned(s);
        }
    }
    out
}

/// Drops the trailing `"comment"` of attribute lines, keeping any key markers.
pub fn strip_attribute_comments(text: &str) -> Cow<'_, str> {
    attribute_comment_regex().replace_all(text, "${1}")
}

/// Rewrites `UPPER_SNAKE` entity names at declaration and relationship sites.
pub fn canonicalize_entities(text: &str) -> Cow<'_, str> {
    let mut changed = false;

    let headers = entity_header_regex().replace_all(text, |caps: &Captures| {
        let name = canonical_entity_name(&caps[2]);
        if matches!(name, Cow::Owned(_)) {
            changed = true;
        }
        format!("{}{}{}", &caps[1], name, &caps[3])
    });

    let relationships = relationship_regex().replace_all(&headers, |caps: &Captures| {
        let left = canonical_entity_name(&caps[2]);
        let right = canonical_entity_name(&caps[4]);
        if matches!(left, Cow::Owned(_)) || matches!(right, Cow::Owned(_)) {
            changed = true;
        }
        format!("{}{}{}{}{}", &caps[1], left, &caps[3], right, &caps[5])
    });

    if !changed {
        return Cow::Borrowed(text);
    }
    Cow::Owned(relationships.into_owned())
}

/// Canonical identifier for an `UPPER_SNAKE` entity name.
///
/// Only tokens of the form `[A-Z][A-Z0-9]*(_[A-Z0-9]+)+` qualify; anything else is returned
/// borrowed and unchanged. Each `_`-separated segment keeps its first character and lowercases the
/// rest, digits included as-is: `VOICE_MODEL` -> `VoiceModel`, `ORDER_V2_ITEM` -> `OrderV2Item`,
/// `AUTH_2FA_CODE` -> `Auth2faCode`.
pub fn canonical_entity_name(token: &str) -> Cow<'_, str> {
    if !is_upper_snake(token) {
        return Cow::Borrowed(token);
    }
    let mut out = String::with_capacity(token.len());
    for segment in token.split('_') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first);
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }
    Cow::Owned(out)
}

fn is_upper_snake(token: &str) -> bool {
    token.contains('_')
        && token.starts_with(|c: char| c.is_ascii_uppercase())
        && token.split('_').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        })
}
