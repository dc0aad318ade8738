//! Recursive-descent query parser.
//!
//! Precedence, lowest binding first: `OR`, implicit conjunction, prefix
//! negation (`-term` / `!term`); parentheses group. The parser is total:
//! malformed fragments become `Nop` nodes covering the offending span, so
//! they still show up in the per-subexpression breakdown.

use super::ast::{CompareOp, FieldTerm, Query, RegexTerm};
use super::lexer::{lex, quoted_value, regex_pattern, Span, Token, TokenKind};

pub fn parse(source: &str) -> Query {
    let mut parser = Parser {
        source,
        tokens: lex(source),
        pos: 0,
    };

    // An empty query is the empty conjunction: it matches everything.
    if parser.current().kind == TokenKind::Eof {
        return Query::And {
            children: Vec::new(),
            span: Span::new(0, 0),
        };
    }

    let mut parts = Vec::new();
    loop {
        parts.push(parser.parse_or());
        // A stray close paren is a malformed fragment; note it and move on.
        // An empty segment already produced a Nop covering this same span.
        if parser.current().kind == TokenKind::RParen {
            let span = parser.current().span;
            if parts.last().map(Query::span) != Some(span) {
                parts.push(Query::Nop { span });
            }
            parser.bump();
            if parser.current().kind != TokenKind::Eof {
                continue;
            }
        }
        break;
    }

    conjoin(parts)
}

fn conjoin(mut parts: Vec<Query>) -> Query {
    if parts.len() == 1 {
        return parts.pop().expect("non-empty");
    }
    let span = parts
        .iter()
        .map(Query::span)
        .reduce(|a, b| a.cover(b))
        .expect("non-empty");
    Query::And {
        children: parts,
        span,
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Token {
        self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn text(&self, token: Token) -> &'a str {
        token.span.slice(self.source)
    }

    fn parse_or(&mut self) -> Query {
        let mut children = Vec::new();
        loop {
            match self.parse_and() {
                Some(term) => children.push(term),
                // An OR with a missing operand leaves a hole; keep it
                // visible in the breakdown.
                None => children.push(Query::Nop {
                    span: self.current().span,
                }),
            }
            if self.current().kind == TokenKind::Or {
                self.bump();
            } else {
                break;
            }
        }
        if children.len() == 1 {
            return children.pop().expect("non-empty");
        }
        let span = children
            .iter()
            .map(Query::span)
            .reduce(|a, b| a.cover(b))
            .expect("non-empty");
        Query::Or { children, span }
    }

    fn parse_and(&mut self) -> Option<Query> {
        let mut terms = Vec::new();
        while !matches!(
            self.current().kind,
            TokenKind::Or | TokenKind::RParen | TokenKind::Eof
        ) {
            terms.push(self.parse_unary());
        }
        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => {
                let span = terms
                    .iter()
                    .map(Query::span)
                    .reduce(|a, b| a.cover(b))
                    .expect("non-empty");
                Some(Query::And {
                    children: terms,
                    span,
                })
            }
        }
    }

    fn parse_unary(&mut self) -> Query {
        let token = self.current();
        match token.kind {
            TokenKind::Dash | TokenKind::Bang => {
                self.bump();

                // `!"…"` is the exact-name form, not a negation.
                if token.kind == TokenKind::Bang
                    && self.current().kind == TokenKind::Quoted
                    && self.current().span.start == token.span.end
                {
                    let quoted = self.bump();
                    return Query::Exact {
                        value: quoted_value(self.text(quoted)),
                        span: token.span.cover(quoted.span),
                    };
                }

                if matches!(
                    self.current().kind,
                    TokenKind::Or | TokenKind::RParen | TokenKind::Eof
                ) {
                    // Dangling negation.
                    return Query::Nop { span: token.span };
                }
                let child = self.parse_unary();
                let span = token.span.cover(child.span());
                Query::Not {
                    child: Box::new(child),
                    span,
                }
            }
            TokenKind::LParen => {
                self.bump();
                let mut inner = match self.parse_and_or_group() {
                    Some(inner) => inner,
                    None => Query::Nop { span: token.span },
                };
                let end = if self.current().kind == TokenKind::RParen {
                    self.bump().span
                } else {
                    // Unbalanced open paren; seal() can repair the source.
                    inner.span()
                };
                inner.set_span(token.span.cover(end));
                inner
            }
            TokenKind::Word => self.parse_word(),
            TokenKind::Quoted => {
                self.bump();
                Query::Bare {
                    value: quoted_value(self.text(token)),
                    quoted: true,
                    span: token.span,
                }
            }
            TokenKind::Regex => {
                self.bump();
                Query::RegexField(RegexTerm {
                    field: String::new(),
                    op: CompareOp::Colon,
                    pattern: regex_pattern(self.text(token)).to_string(),
                    span: token.span,
                })
            }
            // An operator with nothing to apply to.
            _ => {
                self.bump();
                Query::Nop { span: token.span }
            }
        }
    }

    /// Group body: like the top level but stopping at the close paren.
    fn parse_and_or_group(&mut self) -> Option<Query> {
        if matches!(self.current().kind, TokenKind::RParen | TokenKind::Eof) {
            return None;
        }
        Some(self.parse_or())
    }

    fn parse_word(&mut self) -> Query {
        let word = self.bump();

        let op = match self.current().kind {
            TokenKind::Colon => Some(CompareOp::Colon),
            TokenKind::Eq => Some(CompareOp::Eq),
            TokenKind::Neq => Some(CompareOp::Neq),
            TokenKind::Lt => Some(CompareOp::Lt),
            TokenKind::Lte => Some(CompareOp::Lte),
            TokenKind::Gt => Some(CompareOp::Gt),
            TokenKind::Gte => Some(CompareOp::Gte),
            _ => None,
        };

        // A field term needs its operator glued to the field word.
        let Some(op) = op.filter(|_| self.current().span.start == word.span.end) else {
            return Query::Bare {
                value: self.text(word).to_string(),
                quoted: false,
                span: word.span,
            };
        };
        let op_token = self.bump();

        let value = self.current();
        match value.kind {
            TokenKind::Regex => {
                self.bump();
                Query::RegexField(RegexTerm {
                    field: self.text(word).to_lowercase(),
                    op,
                    pattern: regex_pattern(self.text(value)).to_string(),
                    span: word.span.cover(value.span),
                })
            }
            TokenKind::Word | TokenKind::Or => {
                self.bump();
                Query::Field(FieldTerm {
                    field: self.text(word).to_lowercase(),
                    op,
                    value: self.text(value).to_string(),
                    span: word.span.cover(value.span),
                    field_span: word.span,
                    value_span: value.span,
                })
            }
            TokenKind::Quoted => {
                self.bump();
                Query::Field(FieldTerm {
                    field: self.text(word).to_lowercase(),
                    op,
                    value: quoted_value(self.text(value)),
                    span: word.span.cover(value.span),
                    field_span: word.span,
                    value_span: value.span,
                })
            }
            // `field:` with no value is malformed.
            _ => Query::Nop {
                span: word.span.cover(op_token.span),
            },
        }
    }
}
