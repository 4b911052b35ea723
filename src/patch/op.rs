//! The `PatchOp` schema's `Operations` attribute and the validation rules
//! for `add`/`remove`/`replace` (RFC 7644 §3.5.2).
//!
//! Grounded on `assets/schemas/patch_op.py`'s `PatchOp` class and
//! `resource/attributes/patch_op.py`'s structural validator.

use crate::container::{Container, Value};
use crate::error::{IssueLog, LocationSegment, ValidationError};
use crate::patch::path::PatchPath;
use crate::schema::attr::{AttrHeader, Attribute, ComplexFacets, Mutability, StringFacets};
use crate::schema::presence::{validate_presence, AttrPresenceConfig, DataDirection};
use crate::schema::schema::{ResourceSchema, Schema};

pub const SCHEMA_URI: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Remove,
    Replace,
}

impl Op {
    fn parse(s: &str) -> Option<Op> {
        match s {
            "add" => Some(Op::Add),
            "remove" => Some(Op::Remove),
            "replace" => Some(Op::Replace),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Remove => "remove",
            Op::Replace => "replace",
        }
    }
}

/// A single entry of a PatchOp request's `Operations` array.
#[derive(Debug, Clone)]
pub struct PatchOperation {
    pub op: Op,
    pub path: Option<PatchPath>,
    pub value: Value,
}

/// Builds the `Attribute::Complex` describing `Operations`: `{op, path, value}`.
pub fn operations_attribute() -> Attribute {
    Attribute::Complex(
        AttrHeader::new("Operations").required(true).multi_valued(true),
        ComplexFacets {
            sub_attributes: vec![
                Attribute::String(
                    AttrHeader::new("op").required(true).canonical_values(
                        vec![Value::from("add"), Value::from("remove"), Value::from("replace")],
                        true,
                    ),
                    StringFacets { case_exact: true, ..Default::default() },
                ),
                Attribute::String(
                    AttrHeader::new("path"),
                    StringFacets { case_exact: true, ..Default::default() },
                ),
                Attribute::Unknown(AttrHeader::new("value")),
            ],
        },
    )
}

/// Builds the `PatchOp` message schema (RFC 7644 §3.5.2): not a bundled
/// static, constructed fresh so it can be registered on the caller's
/// `Catalog` like any other schema.
pub fn patch_op_schema() -> Schema {
    Schema::new(SCHEMA_URI, "PatchOp").with_attribute(operations_attribute())
}

fn loc(parts: Vec<LocationSegment>) -> Vec<LocationSegment> {
    parts
}

/// Structural check: `remove` must carry a path, `add` must carry a value,
/// and an `add` path with a complex filter must also name a sub-attribute.
pub fn validate_operations_shape(operations: &[PatchOperation]) -> IssueLog {
    let mut issues = IssueLog::new();
    for (i, operation) in operations.iter().enumerate() {
        match operation.op {
            Op::Remove if operation.path.is_none() => {
                issues.add_error(ValidationError::Missing, false, loc(vec![i.into(), "path".into()]));
            }
            Op::Add => {
                if operation.value.is_missing() {
                    issues.add_error(
                        ValidationError::Missing,
                        false,
                        loc(vec![i.into(), "value".into()]),
                    );
                }
                if let Some(path) = &operation.path {
                    if path.filter().is_some() && path.sub_attr_rep().is_none() {
                        issues.add_error(
                            ValidationError::ComplexSubAttribute {
                                attr: path.attr_rep().attr().to_string(),
                                sub: String::new(),
                            },
                            false,
                            loc(vec![i.into(), "path".into()]),
                        );
                    }
                }
            }
            _ => {}
        }
    }
    issues
}

/// Validates a single `remove` operation against the target resource schema.
pub fn validate_remove(schema: &ResourceSchema, path: &PatchPath) -> IssueLog {
    let mut issues = IssueLog::new();
    let Some(attr) = schema.schema.attrs().get_by_path(path) else {
        issues.add_error(ValidationError::UnknownModificationTarget, false, loc(vec!["path".into()]));
        return issues;
    };

    if path.sub_attr_rep().is_none() {
        if attr.header().mutability == Mutability::ReadOnly {
            issues.add_error(ValidationError::AttributeCannotBeModified, true, loc(vec!["path".into()]));
        }
        if attr.header().required {
            issues.add_error(ValidationError::AttributeCannotBeDeleted, true, loc(vec!["path".into()]));
        }
    } else {
        let parent = schema.schema.attrs().get(path.attr_rep());
        if attr.header().required && !attr.header().multi_valued {
            issues.add_error(ValidationError::AttributeCannotBeDeleted, true, loc(vec!["path".into()]));
        }
        let parent_readonly =
            parent.map(|p| p.header().mutability == Mutability::ReadOnly).unwrap_or(false);
        if parent_readonly || attr.header().mutability == Mutability::ReadOnly {
            issues.add_error(ValidationError::AttributeCannotBeModified, true, loc(vec!["path".into()]));
        }
    }

    issues
}

/// Validates an `add`/`replace` operation against the target resource schema.
pub fn validate_add_or_replace(
    schema: &ResourceSchema,
    path: Option<&PatchPath>,
    value: &Value,
) -> IssueLog {
    match path {
        None => validate_value_as_partial_resource(schema, value),
        Some(path) => {
            let Some(attr) = schema.schema.attrs().get_by_path(path) else {
                let mut issues = IssueLog::new();
                issues.add_error(
                    ValidationError::UnknownModificationTarget,
                    false,
                    loc(vec!["path".into()]),
                );
                return issues;
            };
            validate_update_attr_value(attr, value, path)
        }
    }
}

fn validate_value_as_partial_resource(schema: &ResourceSchema, value: &Value) -> IssueLog {
    let Value::Obj(container) = value else {
        let mut issues = IssueLog::new();
        issues.add_error(
            ValidationError::BadType { expected: "complex".to_string() },
            false,
            loc(vec![]),
        );
        return issues;
    };

    let mut issues = schema.schema.validate(container, None);
    issues.pop_errors(&[12, 13, 14], &[LocationSegment::Attr("schemas".to_string())]);

    for (schema_uri, is_extension, attr) in schema.schema.attrs().iter() {
        let attr_value = if is_extension {
            container
                .get(&crate::attr_rep::SchemaUri::new(schema_uri))
                .as_obj()
                .map(|c| c.get(attr.name()))
                .unwrap_or(Value::Missing)
        } else {
            container.get(attr.name())
        };
        if attr_value.is_missing() {
            continue;
        }
        if attr.header().mutability == Mutability::ReadOnly {
            issues.add_error(
                ValidationError::AttributeCannotBeModified,
                false,
                loc(vec![attr.name().to_string().into()]),
            );
            continue;
        }

        if let Attribute::Complex(_, facets) = attr {
            let mut sub_err = false;
            for sub_attr in &facets.sub_attributes {
                let sub_present = match &attr_value {
                    Value::Obj(c) => !c.get(sub_attr.name()).is_missing(),
                    _ => false,
                };
                if sub_attr.header().mutability == Mutability::ReadOnly
                    && !attr_value.is_invalid()
                    && sub_present
                {
                    issues.add_error(
                        ValidationError::AttributeCannotBeModified,
                        false,
                        loc(vec![attr.name().to_string().into(), sub_attr.name().to_string().into()]),
                    );
                    sub_err = true;
                }
            }
            if !sub_err {
                issues.merge(
                    validate_complex_sub_attrs_presence(attr, &attr_value),
                    loc(vec![attr.name().to_string().into()]),
                );
            }
        }
    }

    issues
}

fn validate_update_attr_value(attr: &Attribute, value: &Value, path: &PatchPath) -> IssueLog {
    let mut issues = IssueLog::new();
    if attr.header().mutability == Mutability::ReadOnly {
        issues.add_error(ValidationError::AttributeCannotBeModified, false, loc(vec![]));
        return issues;
    }

    let updating_multivalued_items =
        path.filter().is_some() && path.sub_attr_rep().is_none() && !matches!(value, Value::List(_));

    let mut validated_issues = IssueLog::new();
    if updating_multivalued_items {
        attr.validate(&Value::List(vec![value.clone()]), &mut validated_issues, None, None);
    } else {
        attr.validate(value, &mut validated_issues, None, None);
    }
    let proceeds = validated_issues.can_proceed(&[]);
    issues.merge(validated_issues, loc(vec![]));

    let Attribute::Complex(_, facets) = attr else {
        return issues;
    };
    if !proceeds {
        return issues;
    }

    let mut can_validate_presence = true;
    if updating_multivalued_items || !attr.header().multi_valued {
        for sub_attr in &facets.sub_attributes {
            if sub_attr.header().mutability != Mutability::ReadOnly {
                continue;
            }
            let sub_present = match value {
                Value::Obj(c) => !c.get(sub_attr.name()).is_missing(),
                _ => false,
            };
            if sub_present {
                issues.add_error(
                    ValidationError::AttributeCannotBeModified,
                    false,
                    loc(vec![sub_attr.name().to_string().into()]),
                );
                can_validate_presence = false;
            }
        }
    }

    if !updating_multivalued_items && can_validate_presence {
        issues.merge(validate_complex_sub_attrs_presence(attr, value), loc(vec![]));
    }
    issues
}

fn validate_complex_sub_attrs_presence(attr: &Attribute, value: &Value) -> IssueLog {
    let mut issues = IssueLog::new();
    let Attribute::Complex(_, facets) = attr else {
        return issues;
    };
    let config = AttrPresenceConfig::new(DataDirection::Request);

    if attr.header().multi_valued {
        let Value::List(items) = value else { return issues };
        for (i, item) in items.iter().enumerate() {
            for sub_attr in &facets.sub_attributes {
                let sub_value = match item {
                    Value::Obj(c) => c.get(sub_attr.name()),
                    _ => Value::Missing,
                };
                let rep = crate::attr_rep::AttrRep::new(sub_attr.name());
                issues.merge(
                    validate_presence(sub_attr, &rep, &sub_value, Some(&config), true),
                    loc(vec![i.into(), sub_attr.name().to_string().into()]),
                );
            }
        }
    } else {
        for sub_attr in &facets.sub_attributes {
            let sub_value = match value {
                Value::Obj(c) => c.get(sub_attr.name()),
                _ => Value::Missing,
            };
            let rep = crate::attr_rep::AttrRep::new(sub_attr.name());
            issues.merge(
                validate_presence(sub_attr, &rep, &sub_value, Some(&config), true),
                loc(vec![sub_attr.name().to_string().into()]),
            );
        }
    }
    issues
}

/// Validates one parsed `PatchOperation` in full (shape + target semantics).
pub fn validate_operation(schema: &ResourceSchema, operation: &PatchOperation) -> IssueLog {
    match operation.op {
        Op::Remove => match &operation.path {
            Some(path) => validate_remove(schema, path),
            None => {
                let mut issues = IssueLog::new();
                issues.add_error(ValidationError::Missing, false, loc(vec!["path".into()]));
                issues
            }
        },
        Op::Add | Op::Replace => {
            validate_add_or_replace(schema, operation.path.as_ref(), &operation.value)
        }
    }
}

/// Parses a raw `{op, path, value}` container into a `PatchOperation`.
pub fn parse_operation(container: &Container) -> Result<PatchOperation, ValidationError> {
    let op_str = container.get("op");
    let op = match op_str.as_str().and_then(Op::parse) {
        Some(op) => op,
        None => {
            return Err(ValidationError::MustBeOneOf {
                expected: vec![
                    serde_json::json!("add"),
                    serde_json::json!("remove"),
                    serde_json::json!("replace"),
                ],
            })
        }
    };

    let path = match container.get("path") {
        Value::Str(s) => Some(PatchPath::parse(&s).map_err(|e| e.error)?),
        _ => None,
    };

    let value = container.get("value");
    Ok(PatchOperation { op, path, value })
}

pub fn serialize_operation(operation: &PatchOperation) -> Container {
    let mut out = Container::new();
    out.set("op", Value::Str(operation.op.as_str().to_string()), false);
    if let Some(path) = &operation.path {
        out.set("path", Value::Str(path.serialize()), false);
    }
    if matches!(operation.op, Op::Add | Op::Replace) {
        out.set("value", operation.value.clone(), false);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_without_path_is_rejected() {
        let ops = vec![PatchOperation { op: Op::Remove, path: None, value: Value::Missing }];
        let issues = validate_operations_shape(&ops);
        assert!(issues.has_errors(&[]));
    }

    #[test]
    fn add_without_value_is_rejected() {
        let ops = vec![PatchOperation { op: Op::Add, path: None, value: Value::Missing }];
        let issues = validate_operations_shape(&ops);
        assert!(issues.has_errors(&[]));
    }

    #[test]
    fn add_with_complex_filter_and_no_sub_attr_is_rejected() {
        let path = PatchPath::parse(r#"emails[type eq "work"]"#).unwrap();
        let ops = vec![PatchOperation { op: Op::Add, path: Some(path), value: Value::from("x") }];
        let issues = validate_operations_shape(&ops);
        assert!(issues.has_errors(&[]));
    }

    #[test]
    fn well_formed_replace_passes_shape_check() {
        let path = PatchPath::parse("displayName").unwrap();
        let ops =
            vec![PatchOperation { op: Op::Replace, path: Some(path), value: Value::from("Babs") }];
        let issues = validate_operations_shape(&ops);
        assert!(!issues.has_errors(&[]));
    }
}
