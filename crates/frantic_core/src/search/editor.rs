//! Query-editing operations.
//!
//! Every operation is a splice against the source string, driven by the
//! spans on the parsed AST: find the node a histogram chip or pin refers
//! to, then rewrite the smallest possible substring so user-typed aliases
//! and spacing survive. When no node exists to modify, terms are appended
//! to the end of the query, wrapping the existing source in parentheses
//! when the root is an OR so the new term conjoins with the whole query.

use crate::cards::colors::ColorSet;

use super::ast::{CompareOp, FieldTerm, Query};
use super::lexer::{lex, Span, TokenKind};
use super::parser::parse;

/// Aliases of the color-identity field, the one the histogram color chips
/// edit.
pub const IDENTITY_ALIASES: &[&str] = &["ci", "id", "identity", "commander", "cmd"];

/// A field term found in the AST, together with its enclosing negation.
pub struct FieldMatch<'a> {
    /// The matched node: the `FIELD` itself, or the `NOT` wrapping it.
    pub node: &'a Query,
    pub term: &'a FieldTerm,
    pub negated: bool,
}

/// Left-to-right depth-first search for a field term. A `NOT` directly
/// wrapping a `FIELD` is treated as one negated unit.
pub fn find_field_node<'a>(
    root: &'a Query,
    aliases: &[&str],
    op: CompareOp,
    negated: bool,
    value_predicate: Option<&dyn Fn(&str) -> bool>,
) -> Option<FieldMatch<'a>> {
    find_node_where(root, &|term, is_negated| {
        is_negated == negated
            && aliases.iter().any(|a| a.eq_ignore_ascii_case(&term.field))
            && term.op == op
            && value_predicate.map_or(true, |p| p(&term.value))
    })
}

/// Generalized finder; the predicate sees each field term and whether it
/// sits under a direct negation.
pub fn find_node_where<'a>(
    root: &'a Query,
    predicate: &dyn Fn(&FieldTerm, bool) -> bool,
) -> Option<FieldMatch<'a>> {
    match root {
        Query::Field(term) => predicate(term, false).then_some(FieldMatch {
            node: root,
            term,
            negated: false,
        }),
        Query::Not { child, .. } => {
            if let Query::Field(term) = child.as_ref() {
                return predicate(term, true).then_some(FieldMatch {
                    node: root,
                    term,
                    negated: true,
                });
            }
            find_node_where(child, predicate)
        }
        _ => root
            .children()
            .iter()
            .find_map(|child| find_node_where(child, predicate)),
    }
}

/// Close any dangling quote or regex, then balance parentheses. Idempotent.
pub fn seal(source: &str) -> String {
    let tokens = lex(source);
    let mut sealed = source.to_string();

    if let Some(last) = tokens.iter().rev().find(|t| t.kind != TokenKind::Eof) {
        if matches!(last.kind, TokenKind::Quoted | TokenKind::Regex) {
            if let Some(delimiter) = unclosed_delimiter(last.span.slice(source)) {
                sealed.push(delimiter);
            }
        }
    }

    let mut depth = 0u32;
    for token in &tokens {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    for _ in 0..depth {
        sealed.push(')');
    }
    sealed
}

/// The delimiter a quoted/regex token still needs, if any.
fn unclosed_delimiter(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let delimiter = chars.next()?;
    let mut escaped = false;
    for c in chars {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delimiter {
            return None;
        }
    }
    Some(delimiter)
}

/// Remove the subexpression covering `target`; removing the root empties
/// the query. Whitespace left behind by the deletion is collapsed.
pub fn remove_node(source: &str, root: &Query, target: Span) -> String {
    if target == root.span() {
        return String::new();
    }
    tidy(&splice(source, target, ""))
}

fn splice(source: &str, span: Span, replacement: &str) -> String {
    let mut out = String::with_capacity(source.len() + replacement.len());
    out.push_str(&source[..span.start]);
    out.push_str(replacement);
    out.push_str(&source[span.end..]);
    out
}

fn tidy(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut previous_space = false;
    for c in source.chars() {
        if c == ' ' {
            if !previous_space {
                out.push(c);
            }
            previous_space = true;
        } else {
            out.push(c);
            previous_space = false;
        }
    }
    out.trim().to_string()
}

/// Append a term, wrapping the existing source in parentheses iff the root
/// is an `OR`, so the appended term conjoins with the whole query.
fn append_term(source: &str, root: &Query, term: &str) -> String {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return term.to_string();
    }
    if matches!(root, Query::Or { .. }) {
        format!("({trimmed}) {term}")
    } else {
        format!("{trimmed} {term}")
    }
}

/// Replace a field term's operator in place, between the field word and the
/// value.
fn splice_op(source: &str, term: &FieldTerm, op: CompareOp) -> String {
    splice(
        source,
        Span::new(term.field_span.end, term.value_span.start),
        op.as_str(),
    )
}

/// Toggle a single field/value pair. An existing matching node is removed
/// whatever its polarity, so a chip can cancel the term it contradicts;
/// otherwise `append` is added at the end of the query.
pub fn toggle_simple(
    source: &str,
    aliases: &[&str],
    op: CompareOp,
    negated: bool,
    value: &str,
    append: &str,
) -> String {
    let root = parse(source);
    let matches_value: &dyn Fn(&str) -> bool = &|v: &str| v.eq_ignore_ascii_case(value);

    if let Some(found) = find_field_node(&root, aliases, op, negated, Some(matches_value))
        .or_else(|| find_field_node(&root, aliases, op, !negated, Some(matches_value)))
    {
        return remove_node(source, &root, found.node.span());
    }
    append_term(source, &root, append)
}

/// Tri-state chip: neutral → positive → negative → neutral.
pub fn cycle_chip(source: &str, aliases: &[&str], value: &str) -> String {
    let root = parse(source);
    let matches_value: &dyn Fn(&str) -> bool = &|v: &str| v.eq_ignore_ascii_case(value);

    if let Some(found) =
        find_field_node(&root, aliases, CompareOp::Colon, false, Some(matches_value))
    {
        // Positive becomes negative, preserving the typed term.
        let span = found.node.span();
        let negated = format!("-{}", span.slice(source));
        return splice(source, span, &negated);
    }
    if let Some(found) =
        find_field_node(&root, aliases, CompareOp::Colon, true, Some(matches_value))
    {
        return remove_node(source, &root, found.node.span());
    }
    let term = format!("{}:{}", aliases[0], value);
    append_term(source, &root, &term)
}

fn parse_mask(value: &str) -> Option<ColorSet> {
    match crate::cards::parse_color_value(value)? {
        crate::cards::ColorValue::Mask(mask) => Some(mask),
        crate::cards::ColorValue::Multicolor => None,
    }
}

fn find_identity_node<'a>(
    root: &'a Query,
    ops: &[CompareOp],
    predicate: impl Fn(ColorSet) -> bool,
) -> Option<(FieldMatch<'a>, ColorSet)> {
    let found = find_node_where(root, &|term, negated| {
        !negated
            && IDENTITY_ALIASES
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&term.field))
            && ops.contains(&term.op)
            && parse_mask(&term.value).is_some_and(&predicate)
    })?;
    let mask = parse_mask(&found.term.value).expect("matched node has a mask value");
    Some((found, mask))
}

/// Drill into a color: toggle `letter` inside the `ci>=` node, creating it
/// when absent and deleting it when its last letter goes away.
pub fn toggle_color_drill(source: &str, letter: char) -> String {
    let Some(color) = ColorSet::from_letter(letter) else {
        return source.to_string();
    };
    let root = parse(source);

    if let Some((found, mask)) = find_identity_node(&root, &[CompareOp::Gte], |_| true) {
        let toggled = mask.toggled(color);
        if toggled.is_empty() {
            return remove_node(source, &root, found.node.span());
        }
        return splice(source, found.term.value_span, &toggled.letters());
    }
    append_term(source, &root, &format!("ci>={}", color.letters()))
}

/// Exclude a color: toggle `letter` inside a `ci:` node holding a strict
/// subset of WUBRG, deleting the node once every color is back in.
pub fn toggle_color_exclude(source: &str, letter: char) -> String {
    let Some(color) = ColorSet::from_letter(letter) else {
        return source.to_string();
    };
    let root = parse(source);

    if let Some((found, mask)) =
        find_identity_node(&root, &[CompareOp::Colon], |mask| mask != ColorSet::ALL)
    {
        let toggled = mask.toggled(color);
        if toggled == ColorSet::ALL {
            return remove_node(source, &root, found.node.span());
        }
        return splice(source, found.term.value_span, &toggled.letters());
    }
    let mut excluded = ColorSet::ALL;
    excluded.remove(color);
    append_term(source, &root, &format!("ci:{}", excluded.letters()))
}

/// Strengthen the identity constraint one step: `ci>=X` → `ci:X` → `ci=X`,
/// stopping at `=`. Adds the color first when it is missing from the node.
/// Strengthening a full-WUBRG node removes it instead.
pub fn graduated_color_bar(source: &str, letter: char) -> String {
    let Some(color) = ColorSet::from_letter(letter) else {
        return source.to_string();
    };
    let root = parse(source);
    let ladder = [CompareOp::Gte, CompareOp::Colon, CompareOp::Eq];

    let Some((found, mask)) = find_identity_node(&root, &ladder, |_| true) else {
        return append_term(source, &root, &format!("ci>={}", color.letters()));
    };

    if !mask.contains(color) {
        let mut widened = mask;
        widened.insert(color);
        return splice(source, found.term.value_span, &widened.letters());
    }

    let next = match found.term.op {
        CompareOp::Gte => CompareOp::Colon,
        CompareOp::Colon => CompareOp::Eq,
        // Already at full strength.
        _ => return source.to_string(),
    };
    if mask == ColorSet::ALL {
        return remove_node(source, &root, found.node.span());
    }
    splice_op(source, found.term, next)
}

/// Weaken the identity constraint one step: `ci=X` → `ci:X` → `ci>=X` →
/// drop the color (removing the node with its last letter). When the color
/// is absent entirely, append the subset that excludes it.
pub fn graduated_color_x(source: &str, letter: char) -> String {
    let Some(color) = ColorSet::from_letter(letter) else {
        return source.to_string();
    };
    let root = parse(source);
    let ladder = [CompareOp::Eq, CompareOp::Colon, CompareOp::Gte];

    if let Some((found, mask)) = find_identity_node(&root, &ladder, |mask| mask.contains(color)) {
        return match found.term.op {
            CompareOp::Eq => splice_op(source, found.term, CompareOp::Colon),
            CompareOp::Colon => splice_op(source, found.term, CompareOp::Gte),
            _ => {
                let mut narrowed = mask;
                narrowed.remove(color);
                if narrowed.is_empty() {
                    remove_node(source, &root, found.node.span())
                } else {
                    splice(source, found.term.value_span, &narrowed.letters())
                }
            }
        };
    }
    let mut excluded = ColorSet::ALL;
    excluded.remove(color);
    append_term(source, &root, &format!("ci:{}", excluded.letters()))
}

/// Strengthen the colorless bucket: none → `ci:c` → `ci=c`.
pub fn colorless_bar(source: &str) -> String {
    let root = parse(source);

    if let Some((found, _)) =
        find_identity_node(&root, &[CompareOp::Colon], |mask| mask.is_empty())
    {
        return splice_op(source, found.term, CompareOp::Eq);
    }
    if find_identity_node(&root, &[CompareOp::Eq], |mask| mask.is_empty()).is_some() {
        return source.to_string();
    }
    append_term(source, &root, "ci:c")
}

/// Weaken the colorless bucket: `ci=c` → `ci:c` → removed. With no
/// colorless node present, append the exclusion instead.
pub fn colorless_x(source: &str) -> String {
    let root = parse(source);

    if let Some((found, _)) = find_identity_node(&root, &[CompareOp::Eq], |mask| mask.is_empty()) {
        return splice_op(source, found.term, CompareOp::Colon);
    }
    if let Some((found, _)) =
        find_identity_node(&root, &[CompareOp::Colon], |mask| mask.is_empty())
    {
        return remove_node(source, &root, found.node.span());
    }
    append_term(source, &root, "-ci=c")
}
