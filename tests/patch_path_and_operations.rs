//! End-to-end patch path resolution and `PatchOp` operation validation
//! (RFC 7644 §3.5.2, spec.md §8 scenario 3).

use scim_engine::container::{Container, Value};
use scim_engine::patch::op::{
    parse_operation, serialize_operation, validate_operation, validate_operations_shape, Op,
    PatchOperation,
};
use scim_engine::schema::attr::{ComplexFacets, StringFacets};
use scim_engine::schema::{AttrHeader, Attribute, Mutability, ResourceSchema};
use scim_engine::PatchPath;
use serde_json::json;

const GROUP_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";

fn group_schema() -> ResourceSchema {
    ResourceSchema::new(GROUP_URI, "Group", "Groups", "/Groups").with_attribute(
        Attribute::Complex(
            AttrHeader::new("members").multi_valued(true),
            ComplexFacets {
                sub_attributes: vec![
                    Attribute::String(AttrHeader::new("value"), StringFacets::default()),
                    Attribute::String(AttrHeader::new("displayName"), StringFacets::default()),
                    Attribute::String(AttrHeader::new("type"), StringFacets::default()),
                ],
            },
        ),
    )
}

// Scenario 3: `members[value eq "id-1"].displayName` resolves to the
// `displayName` sub-attribute of `members`, never a different attribute.
#[test]
fn filtered_patch_path_resolves_to_the_named_sub_attribute() {
    let schema = group_schema();
    let path = PatchPath::parse(r#"members[value eq "id-1"].displayName"#).unwrap();

    let resolved = schema.schema.attrs().get_by_path(&path).unwrap();
    assert_eq!(resolved.name(), "displayName");
}

#[test]
fn patch_path_matches_only_the_targeted_member() {
    let schema = group_schema();
    let path = PatchPath::parse(r#"members[value eq "id-1"]"#).unwrap();

    let resource = Container::from_json(json!({
        "members": [
            {"value": "id-1", "displayName": "Alice"},
            {"value": "id-2", "displayName": "Bob"}
        ]
    }));
    assert!(path.path_matches(&resource, &schema.schema));

    let other = Container::from_json(json!({
        "members": [{"value": "id-9", "displayName": "Carol"}]
    }));
    assert!(!other.is_empty());
    assert!(!path.path_matches(&other, &schema.schema));
}

#[test]
fn remove_without_path_is_rejected_at_the_shape_level() {
    let ops = vec![PatchOperation { op: Op::Remove, path: None, value: Value::Missing }];
    let issues = validate_operations_shape(&ops);
    assert!(issues.has_errors(&[]));
}

#[test]
fn remove_of_a_required_attribute_is_rejected() {
    let schema = ResourceSchema::new(GROUP_URI, "Group", "Groups", "/Groups").with_attribute(
        Attribute::String(AttrHeader::new("displayName").required(true), StringFacets::default()),
    );
    let path = PatchPath::parse("displayName").unwrap();
    let issues = validate_operation(&schema, &PatchOperation { op: Op::Remove, path: Some(path), value: Value::Missing });
    assert!(issues.has_errors(&[]));
}

#[test]
fn remove_of_a_readonly_attribute_is_rejected() {
    let schema = ResourceSchema::new(GROUP_URI, "Group", "Groups", "/Groups").with_attribute(
        Attribute::String(
            AttrHeader::new("id").mutability(Mutability::ReadOnly),
            StringFacets::default(),
        ),
    );
    let path = PatchPath::parse("id").unwrap();
    let issues = validate_operation(&schema, &PatchOperation { op: Op::Remove, path: Some(path), value: Value::Missing });
    assert!(issues.has_errors(&[]));
}

#[test]
fn replace_of_a_writable_attribute_with_matching_value_passes() {
    let schema = group_schema();
    let path = PatchPath::parse("members[value eq \"id-1\"].displayName").unwrap();
    let operation = PatchOperation { op: Op::Replace, path: Some(path), value: Value::from("Alicia") };
    let issues = validate_operation(&schema, &operation);
    assert!(!issues.has_errors(&[]));
}

#[test]
fn parse_then_serialize_operation_round_trips() {
    let mut raw = Container::new();
    raw.set("op", Value::from("replace"), false);
    raw.set("path", Value::from("displayName"), false);
    raw.set("value", Value::from("Engineering"), false);

    let operation = parse_operation(&raw).unwrap();
    assert_eq!(operation.op, Op::Replace);
    assert_eq!(operation.path.unwrap().attr_rep().attr(), "displayName");

    let operation = parse_operation(&raw).unwrap();
    let serialized = serialize_operation(&operation);
    assert_eq!(serialized.get("op"), Value::from("replace"));
    assert_eq!(serialized.get("value"), Value::from("Engineering"));
}

#[test]
fn remove_operation_omits_value_on_serialize() {
    let operation = PatchOperation {
        op: Op::Remove,
        path: Some(PatchPath::parse("displayName").unwrap()),
        value: Value::Missing,
    };
    let serialized = serialize_operation(&operation);
    assert!(serialized.get("value").is_missing());
}
