use std::collections::HashMap;

/// Split a mana cost into its symbol sequence.
///
/// Card costs arrive brace-tagged (`{2}{W}{W}` → `["2", "W", "W"]`). Query
/// values are usually written without braces (`2ww`, `3r`); there a digit run
/// forms one symbol and every other character stands alone, so `m=3R` and
/// `m={3}{R}` tokenize identically. Hybrid and Phyrexian symbols keep their
/// inner punctuation (`{W/U}` → `W/U`).
pub fn symbols(cost: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = cost.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                let mut symbol = String::new();
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                    symbol.push(inner.to_ascii_uppercase());
                }
                if !symbol.is_empty() {
                    out.push(symbol);
                }
            }
            '0'..='9' => {
                let mut digits = String::from(ch);
                while let Some(d) = chars.peek().filter(|c| c.is_ascii_digit()) {
                    digits.push(*d);
                    chars.next();
                }
                out.push(digits);
            }
            ch if ch.is_whitespace() => {}
            _ => out.push(ch.to_ascii_uppercase().to_string()),
        }
    }

    out
}

/// Multiset view of a symbol sequence: symbol → multiplicity.
pub fn multiset(symbols: &[String]) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    for symbol in symbols {
        *counts.entry(symbol.as_str()).or_insert(0) += 1;
    }
    counts
}

/// True when `haystack` contains every symbol of `needle`, counted with
/// multiplicity.
pub fn contains_all(haystack: &[String], needle: &[String]) -> bool {
    let have = multiset(haystack);
    multiset(needle)
        .iter()
        .all(|(symbol, count)| have.get(symbol).copied().unwrap_or(0) >= *count)
}

/// Exact multiset equality, ignoring symbol order.
pub fn same_multiset(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && multiset(a) == multiset(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syms(cost: &str) -> Vec<String> {
        symbols(cost)
    }

    #[test]
    fn test_braced_tokenization() {
        assert_eq!(syms("{2}{W}{W}"), vec!["2", "W", "W"]);
        assert_eq!(syms("{10}{G}"), vec!["10", "G"]);
        assert_eq!(syms("{W/U}{W/U}"), vec!["W/U", "W/U"]);
        assert_eq!(syms(""), Vec::<String>::new());
    }

    #[test]
    fn test_bare_tokenization() {
        assert_eq!(syms("3r"), vec!["3", "R"]);
        assert_eq!(syms("2ww"), vec!["2", "W", "W"]);
        assert_eq!(syms("12x"), vec!["12", "X"]);
    }

    #[test]
    fn test_multiset_equality() {
        assert!(same_multiset(&syms("{3}{R}"), &syms("3r")));
        assert!(same_multiset(&syms("{R}{3}"), &syms("3r")));
        assert!(!same_multiset(&syms("{R}{R}{R}"), &syms("3r")));
        assert!(!same_multiset(&syms("{3}{R}{R}"), &syms("3r")));
    }

    #[test]
    fn test_containment() {
        assert!(contains_all(&syms("{2}{W}{W}"), &syms("ww")));
        assert!(!contains_all(&syms("{2}{W}"), &syms("ww")));
        assert!(contains_all(&syms("{W/U}{G}"), &syms("{W/U}")));
    }
}
