//! `Schema` / `ResourceSchema` / `Extension`: the named collection of
//! attribute definitions under a URI, per spec.md §3/§4.D.
//!
//! Grounded on the teacher's `schema/types.rs` (`Schema` struct shape,
//! serde camelCase conventions) and `data/schemas.py` for the
//! `BaseSchema -> BaseResourceSchema -> ResourceSchema` layering.

use crate::attr_rep::AttrRep;
use crate::container::{Container, Value};
use crate::error::{IssueLog, LocationSegment, ValidationError};
use crate::schema::attr::{Attribute, AttrHeader, ComplexFacets, Mutability, Returned};
use crate::schema::bounded_attrs::BoundedAttrs;
use crate::schema::catalog::Catalog;
use crate::schema::presence::{validate_presence, AttrPresenceConfig};

/// A named collection of attribute definitions under a URI. Every schema
/// implicitly prepends a required multi-valued read-only `schemas`
/// attribute.
#[derive(Clone)]
pub struct Schema {
    uri: String,
    name: String,
    attrs: BoundedAttrs,
}

impl Schema {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        let mut attrs = BoundedAttrs::new();
        let uri = uri.into();
        attrs.insert(
            &uri,
            Attribute::String(
                AttrHeader::new("schemas")
                    .required(true)
                    .multi_valued(true)
                    .mutability(Mutability::ReadOnly),
                Default::default(),
            ),
        );
        Self { uri, name: name.into(), attrs }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> &BoundedAttrs {
        &self.attrs
    }

    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attrs.insert(&self.uri, attr);
        self
    }

    /// Attach `extension`'s attributes under its own URI, within this
    /// schema's index. Returns a warning (not a hard error) when an
    /// extension attribute shadows a core attribute by name.
    pub fn extend(&mut self, extension: &Extension, required: bool) -> IssueLog {
        let mut issues = IssueLog::new();
        for attr in &extension.attrs {
            if self.attrs.get_top_level(attr.name()).is_some() {
                issues.add_warning(
                    crate::error::ValidationWarning::UnexpectedContent {
                        reason: format!(
                            "extension attribute '{}' shadows a core attribute",
                            attr.name()
                        ),
                    },
                    [LocationSegment::Attr(attr.name().to_string())],
                );
            }
            self.attrs.insert_extension(&extension.uri, attr.clone(), required);
        }
        issues
    }

    /// Walks the schema's attributes, validating each against the container.
    pub fn validate(&self, data: &Container, presence: Option<&AttrPresenceConfig>) -> IssueLog {
        self.validate_resource(data, presence, None, None)
    }

    /// As [`Schema::validate`], but also resolves `SCIMReference` attributes
    /// against `catalog`'s registered resource endpoints.
    pub fn validate_with_catalog(
        &self,
        data: &Container,
        presence: Option<&AttrPresenceConfig>,
        catalog: &Catalog,
    ) -> IssueLog {
        self.validate_resource(data, presence, None, Some(catalog))
    }

    fn validate_resource(
        &self,
        data: &Container,
        presence: Option<&AttrPresenceConfig>,
        resource_type_override: Option<&str>,
        catalog: Option<&Catalog>,
    ) -> IssueLog {
        let mut issues = IssueLog::new();

        for (schema_uri, is_extension, attr) in self.attrs.iter() {
            let rep = AttrRep::new(attr.name());
            let value = if is_extension {
                data.get(&crate::attr_rep::SchemaUri::new(schema_uri))
                    .as_obj()
                    .map(|c| c.get(attr.name()))
                    .unwrap_or(Value::Missing)
            } else {
                data.get(attr.name())
            };

            let mut attr_issues = IssueLog::new();
            let typed = attr.validate(&value, &mut attr_issues, None, catalog);
            issues.merge(attr_issues, [LocationSegment::Attr(attr.name().to_string())]);
            let _ = typed;

            if let Some(cfg) = presence {
                let extension_declared_or_required = !is_extension
                    || self.attrs.is_extension(attr.name()).map(|(_, req)| req).unwrap_or(false);
                let presence_issues = validate_presence(
                    attr,
                    &rep,
                    &value,
                    Some(cfg),
                    extension_declared_or_required,
                );
                issues.merge(presence_issues, [LocationSegment::Attr(attr.name().to_string())]);
            }
        }

        self.validate_schemas_field(data, &mut issues);

        if let Some(meta) = data.get("meta").as_obj() {
            let resource_type = meta.get("resourceType");
            if let Value::Str(rt) = &resource_type {
                let expected = resource_type_override.unwrap_or(&self.name);
                if !rt.eq_ignore_ascii_case(expected) {
                    issues.add_error(
                        ValidationError::BadValueContent,
                        true,
                        [LocationSegment::Attr("meta".into()), LocationSegment::Attr("resourceType".into())],
                    );
                }
            }
        }

        issues
    }

    fn validate_schemas_field(&self, data: &Container, issues: &mut IssueLog) {
        let listed = match data.get("schemas") {
            Value::List(listed) => listed,
            Value::Missing => {
                issues.add_error(
                    ValidationError::MissingMainSchema,
                    true,
                    [LocationSegment::Attr("schemas".into())],
                );
                return;
            }
            _ => {
                issues.add_error(
                    ValidationError::BadType { expected: "array".to_string() },
                    true,
                    [LocationSegment::Attr("schemas".into())],
                );
                return;
            }
        };
        let listed: Vec<String> =
            listed.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();

        let mut seen = std::collections::HashSet::new();
        for uri in &listed {
            if !seen.insert(uri.to_ascii_lowercase()) {
                issues.add_error(
                    ValidationError::DuplicatedValues,
                    true,
                    [LocationSegment::Attr("schemas".into())],
                );
            }
        }

        let known_extensions: std::collections::HashSet<String> = self
            .attrs
            .iter()
            .filter(|(_, ext, _)| *ext)
            .map(|(uri, _, _)| uri.to_ascii_lowercase())
            .collect();

        for uri in &listed {
            let lower = uri.to_ascii_lowercase();
            if !lower.eq_ignore_ascii_case(&self.uri) && !known_extensions.contains(&lower) {
                issues.add_error(
                    ValidationError::UnknownSchema,
                    true,
                    [LocationSegment::Attr("schemas".into())],
                );
            }
        }

        if !listed.iter().any(|u| u.eq_ignore_ascii_case(&self.uri)) {
            issues.add_error(
                ValidationError::MissingMainSchema,
                true,
                [LocationSegment::Attr("schemas".into())],
            );
        }

        for ext_uri in &known_extensions {
            let present_at_top_level = data
                .get(&crate::attr_rep::SchemaUri::new(ext_uri.clone()))
                .as_obj()
                .is_some();
            if present_at_top_level && !listed.iter().any(|u| u.to_ascii_lowercase() == *ext_uri) {
                issues.add_error(
                    ValidationError::MissingSchemaExtension { extension: ext_uri.clone() },
                    true,
                    [LocationSegment::Attr("schemas".into())],
                );
            }
        }
    }

    pub fn deserialize(&self, data: &Container) -> Container {
        self.walk(data, |attr, v| attr.deserialize(v, None))
    }

    pub fn serialize(&self, data: &Container) -> Container {
        self.walk(data, |attr, v| attr.serialize(v, None))
    }

    fn walk(&self, data: &Container, apply: impl Fn(&Attribute, &Value) -> Value) -> Container {
        let mut out = Container::new();
        for (_, _, attr) in self.attrs.iter() {
            let value = data.get(attr.name());
            let transformed = apply(attr, &value);
            if !transformed.is_missing() {
                out.set(attr.name(), transformed, false);
            }
        }
        out
    }

    /// Returns a new tree containing only attributes for which `attr_filter`
    /// is true (Complex recurses with the same filter).
    pub fn filter(&self, data: &Container, attr_filter: &impl Fn(&Attribute) -> bool) -> Container {
        let mut out = Container::new();
        for (_, _, attr) in self.attrs.iter() {
            if !attr_filter(attr) {
                continue;
            }
            let value = data.get(attr.name());
            if !value.is_missing() {
                out.set(attr.name(), value, false);
            }
        }
        out
    }

    /// Produces a reduced schema for request/response surface selection.
    pub fn clone_filtered(&self, attr_filter: &impl Fn(&Attribute) -> bool) -> Schema {
        let mut attrs = BoundedAttrs::new();
        for (schema_uri, is_extension, attr) in self.attrs.iter() {
            if !attr_filter(attr) {
                continue;
            }
            let filtered = attr.clone_filtered(attr_filter);
            if is_extension {
                attrs.insert_extension(schema_uri, filtered, true);
            } else {
                attrs.insert(schema_uri, filtered);
            }
        }
        Schema { uri: self.uri.clone(), name: self.name.clone(), attrs }
    }
}

/// A resource schema additionally carries a plural name, endpoint,
/// description, and a registry of extensions.
#[derive(Clone)]
pub struct ResourceSchema {
    pub schema: Schema,
    pub plural_name: String,
    pub endpoint: String,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(uri: impl Into<String>, name: impl Into<String>, plural_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let name = name.into();
        let mut schema = Schema::new(uri, name.clone());
        schema = schema
            .with_attribute(Attribute::String(
                AttrHeader::new("id").mutability(Mutability::ReadOnly).returned(Returned::Always),
                Default::default(),
            ))
            .with_attribute(Attribute::String(AttrHeader::new("externalId"), Default::default()))
            .with_attribute(Attribute::Complex(
                AttrHeader::new("meta").mutability(Mutability::ReadOnly),
                ComplexFacets {
                    sub_attributes: vec![
                        Attribute::String(AttrHeader::new("resourceType").mutability(Mutability::ReadOnly), Default::default()),
                        Attribute::DateTime(AttrHeader::new("created").mutability(Mutability::ReadOnly)),
                        Attribute::DateTime(AttrHeader::new("lastModified").mutability(Mutability::ReadOnly)),
                        Attribute::String(AttrHeader::new("location").mutability(Mutability::ReadOnly), Default::default()),
                        Attribute::String(AttrHeader::new("version").mutability(Mutability::ReadOnly), Default::default()),
                    ],
                },
            ));
        Self { schema, plural_name: plural_name.into(), endpoint: endpoint.into(), description: None }
    }

    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.schema = self.schema.with_attribute(attr);
        self
    }

    pub fn extend(&mut self, extension: &Extension, required: bool) -> IssueLog {
        self.schema.extend(extension, required)
    }
}

/// A named collection of attributes bound to a distinct schema URI,
/// attachable to at most one resource schema.
#[derive(Clone)]
pub struct Extension {
    uri: String,
    name: String,
    attrs: Vec<Attribute>,
}

impl Extension {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self { uri: uri.into(), name: name.into(), attrs: Vec::new() }
    }

    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> ResourceSchema {
        ResourceSchema::new(
            "urn:ietf:params:scim:schemas:core:2.0:User",
            "User",
            "Users",
            "/Users",
        )
        .with_attribute(Attribute::String(
            AttrHeader::new("userName").required(true),
            Default::default(),
        ))
    }

    #[test]
    fn missing_main_schema_detected() {
        let schema = user_schema();
        let data = Container::from_json(json!({"userName": "bjensen"}));
        let issues = schema.schema.validate(&data, None);
        assert!(issues.has_errors(&[]));
    }

    #[test]
    fn extension_routing_with_schema_extension_attached() {
        let mut schema = user_schema();
        let extension = Extension::new(
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User",
            "EnterpriseUser",
        )
        .with_attribute(Attribute::String(AttrHeader::new("employeeNumber"), Default::default()));
        schema.extend(&extension, false);

        let data = Container::from_json(json!({
            "schemas": [
                "urn:ietf:params:scim:schemas:core:2.0:User",
                "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User"
            ],
            "userName": "bjensen",
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {
                "employeeNumber": "701984"
            }
        }));
        let issues = schema.schema.validate(&data, None);
        assert!(!issues.has_errors(&[]));
    }
}
