//! Typed query AST.
//!
//! Every node carries the span of the source substring that produced it, so
//! the query editor can splice rewrites back into the original text. Field
//! nodes additionally carry the spans of the field word and of the value,
//! for in-place operator and value replacement.

use std::fmt;

use super::lexer::Span;

/// Comparison operator of a field term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Colon,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Colon => ":",
            CompareOp::Eq => "=",
            CompareOp::Neq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `field op value` term. `field` is normalized to lowercase; `value` is
/// the literal text with quote delimiters stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTerm {
    pub field: String,
    pub op: CompareOp,
    pub value: String,
    pub span: Span,
    pub field_span: Span,
    pub value_span: Span,
}

/// A `field op /pattern/` term. An empty `field` is the bare-regex form,
/// which searches name, oracle text and type line together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexTerm {
    pub field: String,
    pub op: CompareOp,
    pub pattern: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    And { children: Vec<Query>, span: Span },
    Or { children: Vec<Query>, span: Span },
    Not { child: Box<Query>, span: Span },
    Field(FieldTerm),
    RegexField(RegexTerm),
    Bare { value: String, quoted: bool, span: Span },
    Exact { value: String, span: Span },
    Nop { span: Span },
}

impl Query {
    pub fn span(&self) -> Span {
        match self {
            Query::And { span, .. }
            | Query::Or { span, .. }
            | Query::Not { span, .. }
            | Query::Bare { span, .. }
            | Query::Exact { span, .. }
            | Query::Nop { span } => *span,
            Query::Field(term) => term.span,
            Query::RegexField(term) => term.span,
        }
    }

    pub(crate) fn set_span(&mut self, new: Span) {
        match self {
            Query::And { span, .. }
            | Query::Or { span, .. }
            | Query::Not { span, .. }
            | Query::Bare { span, .. }
            | Query::Exact { span, .. }
            | Query::Nop { span } => *span = new,
            Query::Field(term) => term.span = new,
            Query::RegexField(term) => term.span = new,
        }
    }

    /// Shallow display label, stable enough for the editor and the UI
    /// breakdown to recognize: `field op value` for terms, `-label` for
    /// negations, `AND`/`OR` for internal nodes.
    pub fn label(&self) -> String {
        match self {
            Query::And { .. } => "AND".to_string(),
            Query::Or { .. } => "OR".to_string(),
            Query::Not { child, .. } => format!("-{}", child.label()),
            Query::Field(term) => format!("{}{}{}", term.field, term.op, term.value),
            Query::RegexField(term) => format!("{}{}/{}/", term.field, term.op, term.pattern),
            Query::Bare { value, .. } => value.clone(),
            Query::Exact { value, .. } => format!("!\"{value}\""),
            Query::Nop { .. } => "?".to_string(),
        }
    }

    /// Canonical stringification used as the node-cache key. Whitespace and
    /// grouping that do not change meaning produce identical keys; values
    /// are case-folded because every field matches case-insensitively.
    pub fn cache_key(&self) -> String {
        match self {
            Query::And { children, .. } => {
                let keys: Vec<String> = children.iter().map(Query::cache_key).collect();
                format!("AND({})", keys.join(","))
            }
            Query::Or { children, .. } => {
                let keys: Vec<String> = children.iter().map(Query::cache_key).collect();
                format!("OR({})", keys.join(","))
            }
            Query::Not { child, .. } => format!("NOT({})", child.cache_key()),
            Query::Field(term) => {
                format!("{}{}{}", term.field, term.op, term.value.to_lowercase())
            }
            Query::RegexField(term) => format!("{}{}/{}/", term.field, term.op, term.pattern),
            Query::Bare { value, .. } => format!("bare({})", value.to_lowercase()),
            Query::Exact { value, .. } => format!("exact({})", value.to_lowercase()),
            Query::Nop { .. } => "nop".to_string(),
        }
    }

    pub fn children(&self) -> &[Query] {
        match self {
            Query::And { children, .. } | Query::Or { children, .. } => children,
            Query::Not { child, .. } => std::slice::from_ref(child),
            _ => &[],
        }
    }

    /// Left-to-right depth-first traversal, visiting this node first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Query)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Values of every `Bare` node, used for ordering's prefix tier.
    pub fn bare_values(&self) -> Vec<&str> {
        let mut values = Vec::new();
        self.walk(&mut |node| {
            if let Query::Bare { value, .. } = node {
                values.push(value.as_str());
            }
        });
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(field: &str, op: CompareOp, value: &str) -> Query {
        Query::Field(FieldTerm {
            field: field.to_string(),
            op,
            value: value.to_string(),
            span: Span::new(0, 0),
            field_span: Span::new(0, 0),
            value_span: Span::new(0, 0),
        })
    }

    #[test]
    fn test_labels() {
        assert_eq!(field("t", CompareOp::Colon, "creature").label(), "t:creature");
        assert_eq!(field("pow", CompareOp::Gte, "4").label(), "pow>=4");
        let not = Query::Not {
            child: Box::new(field("o", CompareOp::Colon, "flying")),
            span: Span::new(0, 0),
        };
        assert_eq!(not.label(), "-o:flying");
    }

    #[test]
    fn test_cache_key_is_case_folded() {
        assert_eq!(
            field("t", CompareOp::Colon, "Creature").cache_key(),
            field("t", CompareOp::Colon, "creature").cache_key()
        );
    }

    #[test]
    fn test_cache_key_structure() {
        let and = Query::And {
            children: vec![
                field("t", CompareOp::Colon, "creature"),
                field("c", CompareOp::Colon, "g"),
            ],
            span: Span::new(0, 0),
        };
        assert_eq!(and.cache_key(), "AND(t:creature,c:g)");
    }

    #[test]
    fn test_bare_values() {
        let and = Query::And {
            children: vec![
                Query::Bare {
                    value: "goblin".to_string(),
                    quoted: false,
                    span: Span::new(0, 6),
                },
                field("t", CompareOp::Colon, "creature"),
            ],
            span: Span::new(0, 0),
        };
        assert_eq!(and.bare_values(), vec!["goblin"]);
    }
}
