//! End-to-end schema validation: presence policy, extension routing, and
//! round-trip (de)serialization over a `Catalog`-registered resource schema.

use scim_engine::container::{Container, Value};
use scim_engine::schema::attr::ComplexFacets;
use scim_engine::schema::{
    AttrHeader, AttrPresenceConfig, Attribute, Catalog, DataDirection, Extension, Mutability,
    Returned, ResourceSchema,
};
use serde_json::json;

const USER_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
const ENTERPRISE_URI: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

fn user_resource_schema() -> ResourceSchema {
    ResourceSchema::new(USER_URI, "User", "Users", "/Users")
        .with_attribute(Attribute::String(
            AttrHeader::new("userName").required(true),
            Default::default(),
        ))
        .with_attribute(Attribute::Complex(
            AttrHeader::new("name"),
            ComplexFacets {
                sub_attributes: vec![
                    Attribute::String(AttrHeader::new("givenName"), Default::default()),
                    Attribute::String(AttrHeader::new("familyName"), Default::default()),
                ],
            },
        ))
        .with_attribute(Attribute::String(
            AttrHeader::new("password").mutability(Mutability::WriteOnly).returned(Returned::Never),
            Default::default(),
        ))
}

#[test]
fn catalog_registers_resource_and_extension_schema() {
    let mut catalog = Catalog::default();
    let mut schema = user_resource_schema();
    let enterprise = Extension::new(ENTERPRISE_URI, "EnterpriseUser")
        .with_attribute(Attribute::String(AttrHeader::new("employeeNumber"), Default::default()));
    schema.extend(&enterprise, false);
    catalog.register_resource_schema(schema).unwrap();
    catalog.register_extension(enterprise).unwrap();

    assert!(catalog.get_resource_schema(USER_URI).is_some());
    assert!(catalog.get_extension(ENTERPRISE_URI).is_some());
}

// Scenario 5 (spec.md §8): excluding `name` from a RESPONSE yields exactly
// one `MustNotBeReturned` error, scoped to the `name` location.
#[test]
fn presence_exclusion_flags_only_the_excluded_attribute() {
    let schema = user_resource_schema();
    let data = Container::from_json(json!({
        "schemas": [USER_URI],
        "id": "1",
        "userName": "u",
        "name": {"givenName": "Babs", "familyName": "Jensen"},
    }));

    let config = AttrPresenceConfig::new(DataDirection::Response)
        .with_attr_reps(vec![scim_engine::AttrRep::new("name")], false);
    let issues = schema.schema.validate(&data, Some(&config));

    let name_loc = [scim_engine::LocationSegment::Attr("name".to_string())];
    assert!(issues.has_errors(&[&name_loc]));
    assert!(!issues.has_errors(&[&[scim_engine::LocationSegment::Attr("userName".to_string())]]));
}

// Boundary behavior (spec.md §8): a `returned=never` attribute is absent
// from a response-shaped view produced via `Schema::filter`.
#[test]
fn returned_never_attribute_is_excluded_from_response_view() {
    let schema = user_resource_schema();
    let data = Container::from_json(json!({
        "schemas": [USER_URI],
        "userName": "bjensen",
        "password": "t1meMach1ne",
    }));

    let response_view = schema
        .schema
        .filter(&data, &|attr| attr.header().returned != Returned::Never);

    assert_eq!(response_view.get("userName"), Value::Str("bjensen".into()));
    assert!(response_view.get("password").is_missing());
}

#[test]
fn extension_bucket_round_trips_through_container() {
    let mut schema = user_resource_schema();
    let enterprise = Extension::new(ENTERPRISE_URI, "EnterpriseUser")
        .with_attribute(Attribute::String(AttrHeader::new("employeeNumber"), Default::default()));
    schema.extend(&enterprise, false);

    let mut data = Container::new();
    data.register_extension_schema(&scim_engine::SchemaUri::new(ENTERPRISE_URI));
    data.set("schemas", Value::List(vec![Value::from(USER_URI)]), false);
    data.set("userName", Value::from("bjensen"), false);
    data.set(
        &scim_engine::BoundedAttrRep::builder(scim_engine::AttrRep::new("employeeNumber"))
            .schema(ENTERPRISE_URI)
            .extension(true),
        Value::from("701984"),
        false,
    );

    let issues = schema.schema.validate(&data, None);
    assert!(!issues.has_errors(&[]));

    let json = data.to_json();
    assert_eq!(json[ENTERPRISE_URI]["employeeNumber"], json!("701984"));
}
