//! Query tokenizer.
//!
//! The lexer is total: malformed input degrades into `Word` tokens or
//! unclosed `Quoted`/`Regex` tokens, never an error. Every token carries a
//! half-open byte span into the source string; `Quoted` and `Regex` spans
//! include their delimiters so the editor can splice them back verbatim.

/// Half-open byte range on the source query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Smallest span covering both inputs.
    pub fn cover(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Quoted,
    Regex,
    Colon,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    LParen,
    RParen,
    Dash,
    Bang,
    Or,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    fn new(kind: TokenKind, start: usize, end: usize) -> Token {
        Token {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Characters that end a `Word` run. Slashes deliberately do not: a slash
/// only opens a regex at a fresh token position, so `foo/bar` stays one word.
fn terminates_word(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')' | ':' | '=' | '!' | '<' | '>' | '-')
}

pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        let token = match c {
            '(' => Token::new(TokenKind::LParen, start, start + 1),
            ')' => Token::new(TokenKind::RParen, start, start + 1),
            ':' => Token::new(TokenKind::Colon, start, start + 1),
            '-' => Token::new(TokenKind::Dash, start, start + 1),
            '=' => Token::new(TokenKind::Eq, start, start + 1),
            '<' | '>' | '!' => {
                // Greedy: two-character operators win over their prefixes.
                if chars.peek().map(|(_, next)| *next) == Some('=') {
                    chars.next();
                    let kind = match c {
                        '<' => TokenKind::Lte,
                        '>' => TokenKind::Gte,
                        _ => TokenKind::Neq,
                    };
                    Token::new(kind, start, start + 2)
                } else {
                    let kind = match c {
                        '<' => TokenKind::Lt,
                        '>' => TokenKind::Gt,
                        _ => TokenKind::Bang,
                    };
                    Token::new(kind, start, start + 1)
                }
            }
            '"' | '\'' => {
                let end = scan_delimited(source, start, c);
                Token::new(TokenKind::Quoted, start, end)
            }
            '/' => {
                let end = scan_delimited(source, start, '/');
                Token::new(TokenKind::Regex, start, end)
            }
            _ => {
                let mut end = start + c.len_utf8();
                while let Some((i, next)) = chars.peek().copied() {
                    if terminates_word(next) {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let kind = if source[start..end].eq_ignore_ascii_case("or") {
                    TokenKind::Or
                } else {
                    TokenKind::Word
                };
                Token::new(kind, start, end)
            }
        };
        tokens.push(token);

        // Advance past anything the delimited scans consumed.
        while chars.peek().is_some_and(|(i, _)| *i < token.span.end) {
            chars.next();
        }
    }

    tokens.push(Token::new(TokenKind::Eof, source.len(), source.len()));
    tokens
}

/// Scan from the opening delimiter at `start` to just past the closing one.
/// A backslash escapes only the delimiter itself. The closing delimiter is
/// optional at end of input; the span then runs to the end of the source.
fn scan_delimited(source: &str, start: usize, delimiter: char) -> usize {
    let mut escaped = false;
    for (i, c) in source[start..].char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == delimiter {
            return start + i + c.len_utf8();
        }
    }
    source.len()
}

/// Literal value of a `Quoted` token: delimiters stripped, escaped closing
/// delimiters unescaped. Tolerates the missing delimiter of unclosed quotes.
pub fn quoted_value(text: &str) -> String {
    let Some(delimiter) = text.chars().next() else {
        return String::new();
    };
    let inner = &text[delimiter.len_utf8()..];
    let inner = inner.strip_suffix(delimiter).unwrap_or(inner);
    inner.replace(&format!("\\{delimiter}"), &delimiter.to_string())
}

/// Pattern of a `Regex` token, delimiters stripped.
pub fn regex_pattern(text: &str) -> &str {
    let inner = text.strip_prefix('/').unwrap_or(text);
    inner.strip_suffix('/').unwrap_or(inner)
}
