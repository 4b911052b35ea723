//! Lexical phase: string-literal protection and tokenization.
//!
//! Grounded on `data/utils.py`'s `encode_strings`/`decode_placeholders`:
//! before any structural parsing, quoted string literals are replaced by
//! unique placeholders so bracket/paren characters inside them never affect
//! grouping; placeholders are decoded late, when an operand's literal value
//! is finally parsed.

use std::collections::HashMap;
use std::fmt::Write as _;

const PLACEHOLDER_PREFIX: &str = "|&PLACE_HOLDER_";
const PLACEHOLDER_SUFFIX: &str = "&|";

/// Replaces every quoted string literal (single or double, non-greedy) in
/// `expr` with a unique placeholder, returning the rewritten expression and
/// a map from placeholder id to the original literal text (including quotes).
pub fn encode_strings(expr: &str) -> (String, HashMap<String, String>) {
    let mut out = String::with_capacity(expr.len());
    let mut placeholders = HashMap::new();
    let mut chars = expr.char_indices().peekable();
    let mut counter: u64 = 0;

    while let Some((_, c)) = chars.next() {
        if c == '\'' || c == '"' {
            let quote = c;
            let mut literal = String::new();
            literal.push(quote);
            let mut closed = false;
            for (_, c2) in chars.by_ref() {
                literal.push(c2);
                if c2 == quote {
                    closed = true;
                    break;
                }
            }
            if !closed {
                // Unterminated literal: emit verbatim, let the parser flag it.
                out.push_str(&literal);
                continue;
            }
            let id = format!("{counter:x}");
            counter += 1;
            placeholders.insert(id.clone(), literal);
            let _ = write!(out, "{PLACEHOLDER_PREFIX}{id}{PLACEHOLDER_SUFFIX}");
        } else {
            out.push(c);
        }
    }

    (out, placeholders)
}

/// Parses a `|&PLACE_HOLDER_<id>&|` token, returning its id.
pub fn placeholder_id(token: &str) -> Option<&str> {
    token
        .strip_prefix(PLACEHOLDER_PREFIX)
        .and_then(|rest| rest.strip_suffix(PLACEHOLDER_SUFFIX))
}

/// Replaces every placeholder occurrence in `expr` with its original text.
pub fn decode_placeholders(expr: &str, placeholders: &HashMap<String, String>) -> String {
    let mut out = expr.to_string();
    for (id, literal) in placeholders {
        let token = format!("{PLACEHOLDER_PREFIX}{id}{PLACEHOLDER_SUFFIX}");
        out = out.replace(&token, literal);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    And,
    Or,
    Not,
    Word(String),
    /// A placeholder id (string literal, decoded lazily by the parser).
    StringPlaceholder(String),
}

/// Splits placeholder-substituted text into tokens on whitespace and
/// structural characters. Operator/keyword tokens are matched
/// case-insensitively.
pub fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '[' => {
                tokens.push(Token::LBracket);
                chars.next();
            }
            ']' => {
                tokens.push(Token::RBracket);
                chars.next();
            }
            _ => {
                let end = loop {
                    match chars.peek() {
                        Some(&(i, c))
                            if !c.is_whitespace() && !"()[]".contains(c) =>
                        {
                            chars.next();
                            let _ = i;
                        }
                        Some(&(i, _)) => break i,
                        None => break expr.len(),
                    }
                };
                let word = &expr[start..end];
                tokens.push(classify_word(word));
            }
        }
    }
    tokens
}

fn classify_word(word: &str) -> Token {
    if let Some(id) = placeholder_id(word) {
        return Token::StringPlaceholder(id.to_string());
    }
    // A dotted attr-rep like `name.givenName` stays one token; bare "."
    // between filter terms does not occur in this grammar, so we don't
    // split on it here.
    match word.to_ascii_lowercase().as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        _ => Token::Word(word.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_strings_protects_brackets_inside_quotes() {
        let (encoded, placeholders) =
            encode_strings(r#"userName eq "use(r123" and display co "us)er""#);
        assert!(!encoded.contains('('));
        assert!(!encoded.contains(')'));
        assert_eq!(placeholders.len(), 2);
    }

    #[test]
    fn decode_placeholders_restores_original_text() {
        let original = r#"emails[type eq "work"]"#;
        let (encoded, placeholders) = encode_strings(original);
        let decoded = decode_placeholders(&encoded, &placeholders);
        assert_eq!(decoded, original);
    }

    #[test]
    fn tokenize_splits_structural_characters() {
        let tokens = tokenize("emails[type eq \"work\"]");
        assert!(tokens.contains(&Token::LBracket));
        assert!(tokens.contains(&Token::RBracket));
    }
}
