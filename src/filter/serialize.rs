//! Each AST node produces a canonical string form: scalar literals are
//! requoted with single quotes, logical nodes parenthesize their children
//! as needed, complex groups render as `attr[inner]`.

use crate::filter::ast::{BinaryOp, Filter, Literal};

pub fn serialize(filter: &Filter) -> String {
    render(filter, false)
}

fn render(filter: &Filter, parenthesize_logical: bool) -> String {
    match filter {
        Filter::And(terms) => {
            let inner = terms.iter().map(|t| render(t, true)).collect::<Vec<_>>().join(" and ");
            wrap(inner, parenthesize_logical)
        }
        Filter::Or(terms) => {
            let inner = terms.iter().map(|t| render(t, true)).collect::<Vec<_>>().join(" or ");
            wrap(inner, parenthesize_logical)
        }
        Filter::Not(inner) => format!("not ({})", render(inner, false)),
        Filter::Present(attr) => format!("{attr} pr"),
        Filter::Binary(op, attr, literal) => {
            format!("{attr} {} {}", op.keyword(), render_literal(literal))
        }
        Filter::Complex(attr, inner) => format!("{attr}[{}]", render(inner, false)),
    }
}

fn wrap(inner: String, parenthesize: bool) -> String {
    if parenthesize {
        format!("({inner})")
    } else {
        inner
    }
}

fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::Str(s) => format!("'{}'", s.replace('\'', "\\'")),
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Null => "null".to_string(),
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parser::parse;

    #[test]
    fn filter_idempotence_round_trip() {
        let original = parse(r#"userName eq "bjensen" and active eq true"#).unwrap();
        let rendered = serialize(&original);
        let reparsed = parse(&rendered).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn complex_group_renders_as_attr_bracket() {
        let filter = parse(r#"emails[type eq "work"]"#).unwrap();
        let rendered = serialize(&filter);
        assert!(rendered.starts_with("emails["));
        assert!(rendered.ends_with(']'));
    }
}
