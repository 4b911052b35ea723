//! End-to-end filter tokenization, matching, and serialization round-trips
//! (RFC 7644 §3.4.2.2, spec.md §8 scenarios 1, 2, 4).

use scim_engine::container::Container;
use scim_engine::filter::matcher::{matches, MatchTarget};
use scim_engine::filter::parser::parse;
use scim_engine::schema::attr::{ComplexFacets, StringFacets};
use scim_engine::schema::{AttrHeader, Attribute, Mutability, Schema};
use serde_json::json;

// Scenario 1: quoted literals containing unbalanced parens/brackets don't
// confuse the tokenizer.
#[test]
fn filter_tokenization_ignores_brackets_inside_quoted_literals() {
    let filter = parse(r#"userName eq "use(r123" and display co "us)er""#).unwrap();
    match filter {
        scim_engine::filter::Filter::And(terms) => assert_eq!(terms.len(), 2),
        other => panic!("expected And, got {other:?}"),
    }
}

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

// Scenario 2: a complex-grouped filter on a multi-valued attribute matches
// iff some single element satisfies the whole inner expression.
#[test]
fn complex_filter_requires_a_single_element_to_satisfy_both_conditions() {
    let schema = Schema::new("urn:x:Test", "Test").with_attribute(emails_attr());
    let filter = parse(r#"emails[type eq "work" and value co "@example.com"]"#).unwrap();

    let matching = Container::from_json(json!({
        "emails": [
            {"type": "work", "value": "a@example.com"},
            {"type": "home", "value": "b@example.com"}
        ]
    }));
    assert!(matches(&filter, &matching, &MatchTarget::Schema(&schema)));

    let non_matching = Container::from_json(json!({
        "emails": [
            {"type": "home", "value": "a@example.com"},
            {"type": "work", "value": "nope"}
        ]
    }));
    assert!(!matches(&filter, &non_matching, &MatchTarget::Schema(&schema)));
}

// Scenario 4: case-exact vs case-insensitive string comparison changes
// ordering outcomes for `gt`/`lt`.
#[test]
fn case_exact_attribute_orders_uppercase_before_lowercase() {
    let schema = Schema::new("urn:x:Test", "Test").with_attribute(Attribute::String(
        AttrHeader::new("id"),
        StringFacets { case_exact: true, ..Default::default() },
    ));

    let a = Container::from_json(json!({"id": "A"}));
    let lower_a = Container::from_json(json!({"id": "a"}));

    // ASCII 'A' (0x41) sorts before 'a' (0x61) under case-exact comparison.
    let a_lt_lower_a = parse(r#"id lt "a""#).unwrap();
    assert!(matches(&a_lt_lower_a, &a, &MatchTarget::Schema(&schema)));
    assert!(!matches(&a_lt_lower_a, &lower_a, &MatchTarget::Schema(&schema)));
}

#[test]
fn case_insensitive_attribute_treats_case_as_equal() {
    let schema = Schema::new("urn:x:Test", "Test").with_attribute(Attribute::String(
        AttrHeader::new("userName"),
        StringFacets::default(),
    ));
    let data = Container::from_json(json!({"userName": "BJensen"}));
    let filter = parse(r#"userName eq "bjensen""#).unwrap();
    assert!(matches(&filter, &data, &MatchTarget::Schema(&schema)));
}

#[test]
fn filter_serialize_then_reparse_is_idempotent() {
    let original = parse(r#"emails[type eq "work"] and active eq true"#).unwrap();
    let rendered = scim_engine::filter::serialize::serialize(&original);
    let reparsed = parse(&rendered).unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn readonly_attribute_mutability_is_recorded_on_the_header() {
    let attr = Attribute::String(
        AttrHeader::new("id").mutability(Mutability::ReadOnly),
        StringFacets::default(),
    );
    assert_eq!(attr.header().mutability, Mutability::ReadOnly);
}
