//! The attribute model: a single tagged union collapsing the original's
//! `Attribute -> AttributeWithUniqueness -> AttributeWithCaseExact -> ...`
//! inheritance hierarchy, per the design note in SPEC_FULL.md §9.
//!
//! Grounded on `data/attrs.py`'s `Attribute` base class and
//! `attributes/type.py`'s per-SCIM-type parse/dump rules.

use crate::container::Value;
use crate::error::{IssueLog, ValidationError, ValidationWarning};
use crate::schema::catalog::Catalog;
use base64::Engine;
use chrono::{DateTime, FixedOffset};

/// `mutability` facet, RFC 7643 §2.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    ReadWrite,
    ReadOnly,
    WriteOnly,
    Immutable,
}

/// `returned` facet, RFC 7643 §2.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returned {
    Default,
    Always,
    Never,
    Request,
}

/// `uniqueness` facet, RFC 7643 §2.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uniqueness {
    None,
    Server,
    Global,
}

/// Who is expected to supply this attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Issuer {
    Server,
    Client,
    NotSpecified,
}

pub type ValidatorFn = fn(&Value) -> IssueLog;
pub type ConverterFn = fn(&Value) -> Value;

/// Fields shared by every attribute variant.
#[derive(Clone)]
pub struct AttrHeader {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    pub multi_valued: bool,
    pub mutability: Mutability,
    pub returned: Returned,
    pub canonical_values: Option<Vec<Value>>,
    pub restrict_canonical_values: bool,
    pub issuer: Issuer,
    pub validators: Vec<ValidatorFn>,
    pub deserializer: Option<ConverterFn>,
    pub serializer: Option<ConverterFn>,
}

impl AttrHeader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: false,
            multi_valued: false,
            mutability: Mutability::ReadWrite,
            returned: Returned::Default,
            canonical_values: None,
            restrict_canonical_values: false,
            issuer: Issuer::NotSpecified,
            validators: Vec::new(),
            deserializer: None,
            serializer: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn multi_valued(mut self, multi_valued: bool) -> Self {
        self.multi_valued = multi_valued;
        self
    }

    pub fn mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self
    }

    pub fn returned(mut self, returned: Returned) -> Self {
        self.returned = returned;
        self
    }

    pub fn issuer(mut self, issuer: Issuer) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn canonical_values(mut self, values: Vec<Value>, restrict: bool) -> Self {
        self.canonical_values = Some(values);
        self.restrict_canonical_values = restrict;
        self
    }
}

#[derive(Clone, Default)]
pub struct StringFacets {
    pub uniqueness: Uniqueness,
    pub case_exact: bool,
    pub precis: Option<fn(&str) -> String>,
}

impl Default for Uniqueness {
    fn default() -> Self {
        Uniqueness::None
    }
}

#[derive(Clone, Default)]
pub struct NumericFacets {
    pub uniqueness: Uniqueness,
}

#[derive(Clone, Default)]
pub struct ReferenceFacets {
    pub case_exact: bool,
    pub reference_types: Vec<String>,
}

#[derive(Clone, Default)]
pub struct ComplexFacets {
    pub sub_attributes: Vec<Attribute>,
}

/// A single attribute definition. Capability checks read as
/// `matches!(attr, Attribute::String{..} | Attribute::Binary{..})`.
#[derive(Clone)]
pub enum Attribute {
    Unknown(AttrHeader),
    Boolean(AttrHeader),
    Integer(AttrHeader, NumericFacets),
    Decimal(AttrHeader, NumericFacets),
    String(AttrHeader, StringFacets),
    Binary(AttrHeader, StringFacets),
    DateTime(AttrHeader),
    ExternalReference(AttrHeader, ReferenceFacets),
    URIReference(AttrHeader, ReferenceFacets),
    SCIMReference(AttrHeader, ReferenceFacets),
    Complex(AttrHeader, ComplexFacets),
}

impl Attribute {
    pub fn header(&self) -> &AttrHeader {
        match self {
            Attribute::Unknown(h)
            | Attribute::Boolean(h)
            | Attribute::Integer(h, _)
            | Attribute::Decimal(h, _)
            | Attribute::String(h, _)
            | Attribute::Binary(h, _)
            | Attribute::DateTime(h)
            | Attribute::ExternalReference(h, _)
            | Attribute::URIReference(h, _)
            | Attribute::SCIMReference(h, _)
            | Attribute::Complex(h, _) => h,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn scim_type(&self) -> &'static str {
        match self {
            Attribute::Unknown(_) => "unknown",
            Attribute::Boolean(_) => "boolean",
            Attribute::Integer(_) => "integer",
            Attribute::Decimal(_) => "decimal",
            Attribute::String(_, _) => "string",
            Attribute::Binary(_, _) => "binary",
            Attribute::DateTime(_) => "dateTime",
            Attribute::ExternalReference(_, _)
            | Attribute::URIReference(_, _)
            | Attribute::SCIMReference(_, _) => "reference",
            Attribute::Complex(_, _) => "complex",
        }
    }

    pub fn sub_attributes(&self) -> &[Attribute] {
        match self {
            Attribute::Complex(_, facets) => &facets.sub_attributes,
            _ => &[],
        }
    }

    pub fn sub_attribute(&self, name: &str) -> Option<&Attribute> {
        self.sub_attributes().iter().find(|a| a.name().eq_ignore_ascii_case(name))
    }

    /// Validate one already-deserialized `value` against this attribute,
    /// accumulating issues under the given base location. Returns the value
    /// with failing slots overwritten by `Value::Invalid`. `catalog`, when
    /// supplied, resolves a `SCIMReference` attribute's allowed resource
    /// types to their registered endpoints; absent, the endpoint check is
    /// skipped rather than rejected.
    pub fn validate(
        &self,
        value: &Value,
        issues: &mut IssueLog,
        deser: Option<ConverterFn>,
        catalog: Option<&Catalog>,
    ) -> Value {
        let header = self.header();
        if header.multi_valued {
            let Value::List(items) = value else {
                if matches!(value, Value::Missing) {
                    return Value::Missing;
                }
                issues.add_error_at_root(
                    ValidationError::BadType { expected: "array".into() },
                    false,
                );
                return Value::Invalid;
            };
            let mut out = Vec::with_capacity(items.len());
            let mut primary_count = 0usize;
            let mut type_value_pairs: Vec<(Option<String>, Option<String>)> = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let mut sub_issues = IssueLog::new();
                let validated = self.validate_one(item, &mut sub_issues, deser, catalog);
                issues.merge(sub_issues, [crate::error::LocationSegment::Index(i)]);
                if let Value::Obj(c) = &validated {
                    if matches!(c.get("primary"), Value::Bool(true)) {
                        primary_count += 1;
                    }
                    if self.sub_attribute("type").is_some() && self.sub_attribute("value").is_some()
                    {
                        let t = c.get("type").as_str().map(str::to_string);
                        let v = c.get("value").as_str().map(str::to_string);
                        type_value_pairs.push((t, v));
                    }
                }
                out.push(validated);
            }
            if primary_count > 1 {
                issues.add_error_at_root(ValidationError::MultiplePrimaryValues, true);
            }
            let mut seen = std::collections::HashSet::new();
            if type_value_pairs.iter().any(|pair| !seen.insert(pair.clone())) {
                issues.add_warning_at_root(ValidationWarning::MultipleTypeValuePairs);
            }
            Value::List(out)
        } else {
            self.validate_one(value, issues, deser, catalog)
        }
    }

    fn validate_one(
        &self,
        value: &Value,
        issues: &mut IssueLog,
        deser: Option<ConverterFn>,
        catalog: Option<&Catalog>,
    ) -> Value {
        if matches!(value, Value::Missing) {
            return Value::Missing;
        }
        let header = self.header();

        let valid = match self {
            Attribute::Boolean(_) => matches!(value, Value::Bool(_)),
            Attribute::Integer(_, _) => matches!(value, Value::Int(_)),
            Attribute::Decimal(_, _) => matches!(value, Value::Int(_) | Value::Float(_)),
            Attribute::String(_, _) | Attribute::DateTime(_) => matches!(value, Value::Str(_)),
            Attribute::Binary(_, _) => matches!(value, Value::Str(_)),
            Attribute::ExternalReference(_, _)
            | Attribute::URIReference(_, _)
            | Attribute::SCIMReference(_, _) => matches!(value, Value::Str(_)),
            Attribute::Complex(_, _) => matches!(value, Value::Obj(_)),
            Attribute::Unknown(_) => true,
        };
        if !valid {
            issues.add_error_at_root(
                ValidationError::BadType { expected: self.scim_type().to_string() },
                false,
            );
            return Value::Invalid;
        }

        match self {
            Attribute::Binary(_, _) => {
                if let Value::Str(s) = value {
                    if !is_valid_base64(s) {
                        issues.add_error_at_root(
                            ValidationError::BadEncoding { expected: "base64".into() },
                            false,
                        );
                        return Value::Invalid;
                    }
                }
            }
            Attribute::DateTime(_) => {
                if let Value::Str(s) = value {
                    let parsed = deser
                        .map(|f| f(value))
                        .filter(|v| !matches!(v, Value::Invalid))
                        .unwrap_or_else(|| {
                            if DateTime::<FixedOffset>::parse_from_rfc3339(s).is_ok() {
                                value.clone()
                            } else {
                                Value::Invalid
                            }
                        });
                    if matches!(parsed, Value::Invalid) {
                        issues.add_error_at_root(ValidationError::BadValueSyntax, false);
                        return Value::Invalid;
                    }
                }
            }
            Attribute::ExternalReference(_, _) => {
                if let Value::Str(s) = value {
                    if !(s.contains("://")) {
                        issues.add_error_at_root(ValidationError::BadValueSyntax, false);
                        return Value::Invalid;
                    }
                }
            }
            // `URIReference` carries no extra syntax check beyond being a
            // string, matching the original's plain `_Reference` subclass.
            Attribute::SCIMReference(_, facets) => {
                if let (Value::Str(s), Some(cat)) = (value, catalog) {
                    let matches_endpoint = cat.resource_schemas().any(|rs| {
                        facets
                            .reference_types
                            .iter()
                            .any(|t| t.eq_ignore_ascii_case(rs.schema.name()))
                            && s.contains(rs.endpoint.as_str())
                    });
                    if !matches_endpoint {
                        issues.add_error_at_root(
                            ValidationError::BadScimReference {
                                resources: facets.reference_types.clone(),
                            },
                            false,
                        );
                        return Value::Invalid;
                    }
                }
            }
            Attribute::Complex(_, facets) => {
                if let Value::Obj(c) = value {
                    for sub in &facets.sub_attributes {
                        let sub_value = c.get(sub.name());
                        let mut sub_issues = IssueLog::new();
                        sub.validate(&sub_value, &mut sub_issues, None, catalog);
                        issues.merge(sub_issues, [crate::error::LocationSegment::Attr(sub.name().to_string())]);
                    }
                }
            }
            _ => {}
        }

        if let Some(canon) = &header.canonical_values {
            let matches_canon = canon.iter().any(|c| c == value);
            if !matches_canon {
                if header.restrict_canonical_values {
                    issues.add_error_at_root(
                        ValidationError::MustBeOneOf {
                            expected: canon.iter().map(Value::to_json).collect(),
                        },
                        true,
                    );
                } else {
                    issues.add_warning_at_root(ValidationWarning::ShouldBeOneOf {
                        expected: canon.iter().map(Value::to_json).collect(),
                    });
                }
            }
        }

        for validator in &header.validators {
            if issues.can_proceed(&[]) {
                issues.merge_at_root(validator(value));
            }
        }

        value.clone()
    }

    /// Apply this attribute's own deserializer (or `global_deser` as a
    /// fallback) to `value`.
    pub fn deserialize(&self, value: &Value, global_deser: Option<ConverterFn>) -> Value {
        if matches!(value, Value::Missing) {
            return Value::Missing;
        }
        let f = self.header().deserializer.or(global_deser);
        if let Some(f) = f {
            return self.map_maybe_multi(value, f);
        }
        if matches!(self, Attribute::Complex(_, _)) {
            return self.map_complex(value, |c, sub| {
                let v = c.get(sub.name());
                sub.deserialize(&v, None)
            });
        }
        value.clone()
    }

    /// Symmetric to `deserialize`.
    pub fn serialize(&self, value: &Value, global_ser: Option<ConverterFn>) -> Value {
        if matches!(value, Value::Missing) {
            return Value::Missing;
        }
        let f = self.header().serializer.or(global_ser);
        if let Some(f) = f {
            return self.map_maybe_multi(value, f);
        }
        if let Attribute::Complex(_, _) = self {
            return self.map_complex(value, |c, sub| {
                let v = c.get(sub.name());
                sub.serialize(&v, None)
            });
        }
        value.clone()
    }

    fn map_maybe_multi(&self, value: &Value, f: ConverterFn) -> Value {
        if self.header().multi_valued {
            match value {
                Value::List(items) => Value::List(items.iter().map(f).collect()),
                other => other.clone(),
            }
        } else {
            f(value)
        }
    }

    fn map_complex(&self, value: &Value, per_sub: impl Fn(&crate::container::Container, &Attribute) -> Value) -> Value {
        let facets = match self {
            Attribute::Complex(_, f) => f,
            _ => return value.clone(),
        };
        let apply_one = |v: &Value| -> Value {
            let Value::Obj(c) = v else { return v.clone() };
            let mut out = crate::container::Container::new();
            for sub in &facets.sub_attributes {
                let sv = per_sub(c, sub);
                if !sv.is_missing() {
                    out.set(sub.name(), sv, false);
                }
            }
            Value::Obj(out)
        };
        if self.header().multi_valued {
            match value {
                Value::List(items) => Value::List(items.iter().map(apply_one).collect()),
                other => other.clone(),
            }
        } else {
            apply_one(value)
        }
    }

    /// For `Complex`, produce a copy restricted to sub-attributes matching `filter`.
    pub fn clone_filtered(&self, filter: &impl Fn(&Attribute) -> bool) -> Attribute {
        match self {
            Attribute::Complex(header, facets) => Attribute::Complex(
                header.clone(),
                ComplexFacets {
                    sub_attributes: facets
                        .sub_attributes
                        .iter()
                        .filter(|a| filter(a))
                        .map(|a| a.clone_filtered(filter))
                        .collect(),
                },
            ),
            other => other.clone(),
        }
    }

    /// Default sub-attributes for a multi-valued complex created without
    /// explicit sub-attributes: `{value, display(readOnly), type, primary, $ref}`.
    pub fn default_multivalued_complex_sub_attributes() -> Vec<Attribute> {
        vec![
            Attribute::String(AttrHeader::new("value"), StringFacets::default()),
            Attribute::String(
                AttrHeader::new("display").mutability(Mutability::ReadOnly),
                StringFacets::default(),
            ),
            Attribute::String(AttrHeader::new("type"), StringFacets::default()),
            Attribute::Boolean(AttrHeader::new("primary")),
            Attribute::SCIMReference(AttrHeader::new("$ref"), ReferenceFacets::default()),
        ]
    }
}

fn is_valid_base64(s: &str) -> bool {
    base64::engine::general_purpose::STANDARD.decode(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_validate_rejects_wrong_type() {
        let attr = Attribute::Boolean(AttrHeader::new("active"));
        let mut issues = IssueLog::new();
        let result = attr.validate(&Value::Str("true".into()), &mut issues, None, None);
        assert!(result.is_invalid());
        assert!(issues.has_errors(&[]));
    }

    #[test]
    fn multi_valued_primary_violation_detected_once() {
        let attr = Attribute::Complex(
            AttrHeader::new("emails").multi_valued(true),
            ComplexFacets { sub_attributes: Attribute::default_multivalued_complex_sub_attributes() },
        );
        let mut e1 = crate::container::Container::new();
        e1.set("primary", Value::Bool(true), false);
        let mut e2 = crate::container::Container::new();
        e2.set("primary", Value::Bool(true), false);
        let mut e3 = crate::container::Container::new();
        e3.set("primary", Value::Bool(true), false);

        let value = Value::List(vec![Value::Obj(e1), Value::Obj(e2), Value::Obj(e3)]);
        let mut issues = IssueLog::new();
        attr.validate(&value, &mut issues, None, None);

        let rendered = issues.flatten(false);
        let errors = rendered["errors"][""].as_array().unwrap();
        assert_eq!(errors.iter().filter(|e| e["code"] == 15).count(), 1);
    }

    #[test]
    fn binary_rejects_non_base64() {
        let attr = Attribute::Binary(AttrHeader::new("photo"), StringFacets::default());
        let mut issues = IssueLog::new();
        let result = attr.validate(&Value::Str("not base64!!".into()), &mut issues, None, None);
        assert!(result.is_invalid());
    }

    #[test]
    fn scim_reference_without_catalog_is_not_checked() {
        let attr = Attribute::SCIMReference(
            AttrHeader::new("members"),
            ReferenceFacets { reference_types: vec!["User".to_string()], ..Default::default() },
        );
        let mut issues = IssueLog::new();
        let result = attr.validate(&Value::Str("anything".into()), &mut issues, None, None);
        assert!(!result.is_invalid());
    }

    #[test]
    fn scim_reference_rejects_value_missing_a_matching_endpoint() {
        use crate::schema::catalog::Catalog;
        use crate::schema::schema::ResourceSchema;

        let mut catalog = Catalog::default();
        catalog
            .register_resource_schema(ResourceSchema::new("urn:x:User", "User", "Users", "/Users"))
            .unwrap();

        let attr = Attribute::SCIMReference(
            AttrHeader::new("members"),
            ReferenceFacets { reference_types: vec!["User".to_string()], ..Default::default() },
        );

        let mut issues = IssueLog::new();
        let good = attr.validate(
            &Value::Str("https://example.com/v2/Users/2819c223".into()),
            &mut issues,
            None,
            Some(&catalog),
        );
        assert!(!good.is_invalid());

        let mut issues = IssueLog::new();
        let bad = attr.validate(
            &Value::Str("https://example.com/v2/Groups/e9e30dba".into()),
            &mut issues,
            None,
            Some(&catalog),
        );
        assert!(bad.is_invalid());
        assert!(issues.has_errors(&[]));
    }
}
