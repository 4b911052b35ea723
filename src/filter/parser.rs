//! Recursive-descent parser implementing the grammar in spec.md §4.E:
//!
//! ```text
//! filter      = or_term
//! or_term     = and_term ("or" and_term)*
//! and_term    = not_term ("and" not_term)*
//! not_term    = "not" primary | primary
//! primary     = "(" filter ")" | attr_op | complex_grp
//! complex_grp = attr_rep "[" filter "]"
//! attr_op     = attr_rep unary_op | attr_rep binary_op literal
//! literal     = string | integer | decimal | "true" | "false" | "null"
//! ```

use crate::attr_rep::AttrRepFactory;
use crate::error::ValidationError;
use crate::filter::ast::{BinaryOp, Filter, Literal};
use crate::filter::lexer::{self, Token};
use std::collections::HashMap;

pub struct ParseError {
    pub error: ValidationError,
}

impl ParseError {
    fn new(error: ValidationError) -> Self {
        Self { error }
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    placeholders: &'a HashMap<String, String>,
    source: &'a str,
}

/// Parse a complete filter expression.
pub fn parse(expr: &str) -> Result<Filter, ParseError> {
    validate_brackets(expr)?;
    let (encoded, placeholders) = lexer::encode_strings(expr);
    let tokens = lexer::tokenize(&encoded);
    let mut parser = Parser { tokens, pos: 0, placeholders: &placeholders, source: expr };
    let filter = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::new(ValidationError::UnknownExpression { expr: expr.to_string() }));
    }
    Ok(filter)
}

fn validate_brackets(expr: &str) -> Result<(), ParseError> {
    let (encoded, _) = lexer::encode_strings(expr);
    let parens = encoded.chars().filter(|&c| c == '(').count() as i64
        - encoded.chars().filter(|&c| c == ')').count() as i64;
    if parens != 0 {
        return Err(ParseError::new(ValidationError::BracketMismatch));
    }
    let open_brackets = encoded.chars().filter(|&c| c == '[').count();
    let close_brackets = encoded.chars().filter(|&c| c == ']').count();
    if open_brackets != close_brackets {
        return Err(ParseError::new(ValidationError::ComplexAttributeBracketMismatch));
    }
    Ok(())
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_or(&mut self) -> Result<Filter, ParseError> {
        let mut terms = vec![self.parse_and()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.next();
            terms.push(self.parse_and()?);
        }
        Ok(if terms.len() == 1 { terms.remove(0) } else { Filter::Or(terms) })
    }

    fn parse_and(&mut self) -> Result<Filter, ParseError> {
        let mut terms = vec![self.parse_not()?];
        while matches!(self.peek(), Some(Token::And)) {
            self.next();
            terms.push(self.parse_not()?);
        }
        Ok(if terms.len() == 1 { terms.remove(0) } else { Filter::And(terms) })
    }

    fn parse_not(&mut self) -> Result<Filter, ParseError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.next();
            return Ok(Filter::Not(Box::new(self.parse_primary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Filter, ParseError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.next();
                if matches!(self.peek(), Some(Token::RParen)) {
                    return Err(ParseError::new(ValidationError::EmptyFilter));
                }
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ParseError::new(ValidationError::BracketMismatch)),
                }
            }
            Some(Token::Word(_)) => self.parse_attr_op_or_group(),
            None => Err(ParseError::new(ValidationError::EmptyFilter)),
            _ => Err(ParseError::new(ValidationError::UnknownExpression {
                expr: self.source.to_string(),
            })),
        }
    }

    fn parse_attr_op_or_group(&mut self) -> Result<Filter, ParseError> {
        let Some(Token::Word(word)) = self.next() else { unreachable!() };
        let attr_rep = AttrRepFactory::parse(&word)
            .ok_or_else(|| ParseError::new(ValidationError::BadAttributeName { name: word.clone() }))?;

        if matches!(self.peek(), Some(Token::LBracket)) {
            if attr_rep.sub_attr().is_some() {
                return Err(ParseError::new(ValidationError::ComplexSubAttribute {
                    attr: attr_rep.attr().to_string(),
                    sub: attr_rep.sub_attr().unwrap_or_default().to_string(),
                }));
            }
            self.next();
            if matches!(self.peek(), Some(Token::RBracket)) {
                return Err(ParseError::new(ValidationError::EmptyComplexGroup {
                    attr: attr_rep.attr().to_string(),
                }));
            }
            let inner = self.parse_or()?;
            if !matches!(self.next(), Some(Token::RBracket)) {
                return Err(ParseError::new(ValidationError::ComplexAttributeBracketMismatch));
            }
            if contains_complex_group(&inner) {
                return Err(ParseError::new(ValidationError::NestedComplexAttribute));
            }
            return Ok(Filter::Complex(attr_rep, Box::new(inner)));
        }

        let Some(Token::Word(op_word)) = self.next() else {
            return Err(ParseError::new(ValidationError::MissingOperand {
                op: String::new(),
                expr: self.source.to_string(),
            }));
        };

        if op_word.eq_ignore_ascii_case("pr") {
            return Ok(Filter::Present(attr_rep));
        }

        let Some(op) = BinaryOp::from_keyword(&op_word) else {
            return Err(ParseError::new(ValidationError::UnknownOperator {
                op: op_word,
                expr: self.source.to_string(),
            }));
        };

        let literal_token = self.next().ok_or_else(|| {
            ParseError::new(ValidationError::MissingOperand {
                op: op_word.clone(),
                expr: self.source.to_string(),
            })
        })?;
        let literal = self.parse_literal(literal_token, &op_word)?;
        Ok(Filter::Binary(op, attr_rep, literal))
    }

    fn parse_literal(&self, token: Token, op: &str) -> Result<Literal, ParseError> {
        match token {
            Token::StringPlaceholder(id) => {
                let raw = self
                    .placeholders
                    .get(&id)
                    .ok_or_else(|| ParseError::new(ValidationError::BadOperand { value: id.clone() }))?;
                let inner = &raw[1..raw.len() - 1];
                Ok(Literal::Str(inner.to_string()))
            }
            Token::Word(w) => match w.as_str() {
                "true" => Ok(Literal::Bool(true)),
                "false" => Ok(Literal::Bool(false)),
                "null" => Ok(Literal::Null),
                _ => {
                    if let Ok(i) = w.parse::<i64>() {
                        Ok(Literal::Int(i))
                    } else if let Ok(f) = w.parse::<f64>() {
                        Ok(Literal::Float(f))
                    } else {
                        Err(ParseError::new(ValidationError::BadOperand { value: w }))
                    }
                }
            },
            _ => Err(ParseError::new(ValidationError::NonCompatibleOperand {
                value: format!("{token:?}"),
                op: op.to_string(),
            })),
        }
    }
}

fn contains_complex_group(filter: &Filter) -> bool {
    matches!(filter, Filter::Complex(_, _))
        || match filter {
            Filter::And(sub) | Filter::Or(sub) => sub.iter().any(contains_complex_group),
            Filter::Not(sub) => contains_complex_group(sub),
            _ => false,
        }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenization_across_quotes_does_not_trip_bracket_balance() {
        let filter = parse(r#"userName eq "use(r123" and display co "us)er""#).unwrap();
        match filter {
            Filter::And(terms) => {
                assert_eq!(terms.len(), 2);
                assert!(matches!(&terms[0], Filter::Binary(BinaryOp::Equal, _, Literal::Str(s)) if s == "use(r123"));
                assert!(matches!(&terms[1], Filter::Binary(BinaryOp::Contains, _, Literal::Str(s)) if s == "us)er"));
            }
            _ => panic!("expected And"),
        }
    }

    #[test]
    fn complex_group_parses_filter_on_attribute() {
        let filter = parse(r#"emails[type eq "work" and value co "@example.com"]"#).unwrap();
        assert!(matches!(filter, Filter::Complex(_, _)));
    }

    #[test]
    fn unbalanced_parens_rejected() {
        assert!(parse("userName eq \"x\"(").is_err());
    }

    #[test]
    fn nested_complex_group_rejected() {
        assert!(parse(r#"emails[addresses[type eq "work"]]"#).is_err());
    }

    #[test]
    fn present_operator_parses() {
        let filter = parse("userName pr").unwrap();
        assert!(matches!(filter, Filter::Present(_)));
    }
}
