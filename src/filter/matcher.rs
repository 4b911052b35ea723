//! Matching semantics: evaluate a `Filter` against a data container.
//!
//! Grounded on `data/operator.py`: `And`/`Or`/`Not` short-circuit;
//! `Present` treats `Missing`/`Null`/empty-string as absent; binary
//! operators compare case-exact (PRECIS, if configured) or lowercase for
//! case-insensitive strings; a binary operator on missing data is `false`
//! (spec.md §9's Open Question, fixed here).

use crate::container::{Container, Value};
use crate::filter::ast::{BinaryOp, Filter, Literal};
use crate::schema::attr::Attribute;
use crate::schema::schema::Schema;

/// Either a whole resource schema or a single `Complex` attribute — the two
/// things a filter (or a `ComplexAttributeOperator` sub-filter) can be
/// evaluated against.
pub enum MatchTarget<'a> {
    Schema(&'a Schema),
    Complex(&'a Attribute),
}

impl<'a> MatchTarget<'a> {
    fn lookup(&self, name: &str) -> Option<&Attribute> {
        match self {
            MatchTarget::Schema(schema) => schema.attrs().get_top_level(name),
            MatchTarget::Complex(attr) => attr.sub_attribute(name),
        }
    }
}

/// Evaluate `filter` against `container` in the context of `target`.
pub fn matches(filter: &Filter, container: &Container, target: &MatchTarget) -> bool {
    match filter {
        Filter::And(terms) => terms.iter().all(|t| matches(t, container, target)),
        Filter::Or(terms) => terms.iter().any(|t| matches(t, container, target)),
        Filter::Not(inner) => !matches(inner, container, target),
        Filter::Present(attr_rep) => match_present(container, target, attr_rep.attr()),
        Filter::Binary(op, attr_rep, literal) => {
            match_binary(*op, container, target, attr_rep.attr(), literal)
        }
        Filter::Complex(attr_rep, sub_filter) => {
            match_complex(container, target, attr_rep.attr(), sub_filter)
        }
    }
}

fn match_present(container: &Container, target: &MatchTarget, attr: &str) -> bool {
    let value = container.get(attr);
    let Some(definition) = target.lookup(attr) else {
        return false;
    };
    if definition.header().multi_valued {
        match &value {
            Value::List(items) => items.iter().any(Value::is_present),
            _ => false,
        }
    } else {
        match &value {
            Value::Obj(_) => true,
            other => other.is_present(),
        }
    }
}

fn match_binary(
    op: BinaryOp,
    container: &Container,
    target: &MatchTarget,
    attr: &str,
    literal: &Literal,
) -> bool {
    let Some(definition) = target.lookup(attr) else {
        return false;
    };
    let value = container.get(attr);

    if definition.header().multi_valued {
        let Value::List(items) = &value else {
            return false;
        };
        return items.iter().any(|item| match_scalar_or_complex(op, item, definition, literal));
    }

    match_scalar_or_complex(op, &value, definition, literal)
}

fn match_scalar_or_complex(
    op: BinaryOp,
    value: &Value,
    definition: &Attribute,
    literal: &Literal,
) -> bool {
    if let Attribute::Complex(_, _) = definition {
        // Multi-valued complex without an explicit sub-attr projects onto `value`.
        if let Value::Obj(c) = value {
            let inner = c.get("value");
            return compare(op, &inner, literal, false);
        }
        return false;
    }
    let case_exact = matches!(definition, Attribute::String(_, f) | Attribute::Binary(_, f) if f.case_exact)
        || matches!(definition, Attribute::ExternalReference(_, f) | Attribute::URIReference(_, f) | Attribute::SCIMReference(_, f) if f.case_exact);
    compare(op, value, literal, case_exact)
}

fn compare(op: BinaryOp, value: &Value, literal: &Literal, case_exact: bool) -> bool {
    if matches!(value, Value::Missing) {
        return false;
    }

    match op {
        BinaryOp::Equal => values_equal(value, literal, case_exact),
        BinaryOp::NotEqual => !values_equal(value, literal, case_exact),
        BinaryOp::Contains | BinaryOp::StartsWith | BinaryOp::EndsWith => {
            let (Some(haystack), Some(needle)) = (string_of(value), literal.as_str()) else {
                return false;
            };
            let (haystack, needle) = normalize_pair(haystack, needle, case_exact);
            match op {
                BinaryOp::Contains => haystack.contains(&needle),
                BinaryOp::StartsWith => haystack.starts_with(&needle),
                BinaryOp::EndsWith => haystack.ends_with(&needle),
                _ => unreachable!(),
            }
        }
        BinaryOp::GreaterThan
        | BinaryOp::GreaterThanOrEqual
        | BinaryOp::LesserThan
        | BinaryOp::LesserThanOrEqual => match ordering_of(value, literal, case_exact) {
            Some(ord) => match op {
                BinaryOp::GreaterThan => ord == std::cmp::Ordering::Greater,
                BinaryOp::GreaterThanOrEqual => ord != std::cmp::Ordering::Less,
                BinaryOp::LesserThan => ord == std::cmp::Ordering::Less,
                BinaryOp::LesserThanOrEqual => ord != std::cmp::Ordering::Greater,
                _ => unreachable!(),
            },
            None => false,
        },
    }
}

fn string_of(value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.clone()),
        _ => None,
    }
}

fn normalize_pair(a: String, b: &str, case_exact: bool) -> (String, String) {
    if case_exact {
        (a, b.to_string())
    } else {
        (a.to_ascii_lowercase(), b.to_ascii_lowercase())
    }
}

fn values_equal(value: &Value, literal: &Literal, case_exact: bool) -> bool {
    match (value, literal) {
        (Value::Str(s), Literal::Str(l)) => {
            let (a, b) = normalize_pair(s.clone(), l, case_exact);
            a == b
        }
        (Value::Int(i), Literal::Int(l)) => i == l,
        (Value::Int(i), Literal::Float(l)) => (*i as f64) == *l,
        (Value::Float(f), Literal::Float(l)) => f == l,
        (Value::Float(f), Literal::Int(l)) => *f == (*l as f64),
        (Value::Bool(b), Literal::Bool(l)) => b == l,
        (Value::Null, Literal::Null) => true,
        _ => false,
    }
}

fn ordering_of(value: &Value, literal: &Literal, case_exact: bool) -> Option<std::cmp::Ordering> {
    match (value, literal) {
        (Value::Str(s), Literal::Str(l)) => {
            let (a, b) = normalize_pair(s.clone(), l, case_exact);
            Some(a.cmp(&b))
        }
        (Value::Int(i), Literal::Int(l)) => Some(i.cmp(l)),
        (Value::Int(i), Literal::Float(l)) => (*i as f64).partial_cmp(l),
        (Value::Float(f), Literal::Float(l)) => f.partial_cmp(l),
        (Value::Float(f), Literal::Int(l)) => f.partial_cmp(&(*l as f64)),
        _ => None,
    }
}

fn match_complex(
    container: &Container,
    target: &MatchTarget,
    attr: &str,
    sub_filter: &Filter,
) -> bool {
    let Some(definition) = target.lookup(attr) else {
        return false;
    };
    if !matches!(definition, Attribute::Complex(_, _)) {
        return false;
    }
    let value = container.get(attr);
    let sub_target = MatchTarget::Complex(definition);

    if definition.header().multi_valued {
        let Value::List(items) = &value else {
            return false;
        };
        items.iter().any(|item| {
            let Value::Obj(c) = item else { return false };
            matches(sub_filter, c, &sub_target)
        })
    } else if let Value::Obj(c) = &value {
        matches(sub_filter, c, &sub_target)
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parser::parse;
    use crate::schema::attr::{AttrHeader, ComplexFacets, StringFacets};

    fn emails_attr() -> Attribute {
        Attribute::Complex(
            AttrHeader::new("emails").multi_valued(true),
            ComplexFacets {
                sub_attributes: vec![
                    Attribute::String(AttrHeader::new("type"), StringFacets::default()),
                    Attribute::String(AttrHeader::new("value"), StringFacets::default()),
                ],
            },
        )
    }

    fn schema_with_emails() -> Schema {
        Schema::new("urn:x:Test", "Test").with_attribute(emails_attr())
    }

    #[test]
    fn complex_multivalued_filter_matches_any_element() {
        let schema = schema_with_emails();
        let container = Container::from_json(serde_json::json!({
            "emails": [
                {"type": "work", "value": "a@example.com"},
                {"type": "home", "value": "b@example.com"}
            ]
        }));
        let filter = parse(r#"emails[type eq "work" and value co "@example.com"]"#).unwrap();
        assert!(matches(&filter, &container, &MatchTarget::Schema(&schema)));
    }

    #[test]
    fn complex_multivalued_filter_fails_when_no_element_matches_both() {
        let schema = schema_with_emails();
        let container = Container::from_json(serde_json::json!({
            "emails": [
                {"type": "home", "value": "a@example.com"},
                {"type": "work", "value": "nope"}
            ]
        }));
        let filter = parse(r#"emails[type eq "work" and value co "@example.com"]"#).unwrap();
        assert!(!matches(&filter, &container, &MatchTarget::Schema(&schema)));
    }

    #[test]
    fn binary_operator_on_missing_data_is_false() {
        let schema = Schema::new("urn:x:Test", "Test")
            .with_attribute(Attribute::String(AttrHeader::new("userName"), StringFacets::default()));
        let container = Container::new();
        let filter = parse(r#"userName eq "bjensen""#).unwrap();
        assert!(!matches(&filter, &container, &MatchTarget::Schema(&schema)));
    }
}
