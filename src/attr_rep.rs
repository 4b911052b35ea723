//! Attribute references: `AttrRep`, `BoundedAttrRep`, and `SchemaURI`.
//!
//! Grounded on `container.py`'s `AttrRep`/`BoundedAttrRep`/`SchemaURI` classes
//! in the original implementation: a pair of identifiers with
//! case-insensitive equality and hashing, optionally carrying a schema URI.

use std::fmt;
use std::hash::{Hash, Hasher};

fn is_attrname_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '$'
}

fn is_attrname_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '$'
}

/// True iff `s` matches the `attrname` grammar: `(ALPHA / "$") *(ALPHA / DIGIT / "_" / "-" / "$")`.
pub fn is_valid_attrname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_attrname_start(c) => {}
        _ => return false,
    }
    chars.all(is_attrname_char)
}

/// A case-insensitive tagged string matching the URI-prefix grammar `(segment ':')*`.
#[derive(Debug, Clone)]
pub struct SchemaUri(String);

impl SchemaUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for SchemaUri {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for SchemaUri {}

impl Hash for SchemaUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            b.to_ascii_lowercase().hash(state);
        }
    }
}

/// A pair `(attr, sub_attr?)` of identifiers conforming to SCIM naming.
/// Equality and hashing are case-insensitive on both components.
#[derive(Debug, Clone)]
pub struct AttrRep {
    attr: String,
    sub_attr: Option<String>,
}

impl AttrRep {
    pub fn new(attr: impl Into<String>) -> Self {
        Self { attr: attr.into(), sub_attr: None }
    }

    pub fn with_sub_attr(attr: impl Into<String>, sub_attr: impl Into<String>) -> Self {
        Self { attr: attr.into(), sub_attr: Some(sub_attr.into()) }
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    pub fn sub_attr(&self) -> Option<&str> {
        self.sub_attr.as_deref()
    }

    /// Parse `"attr"` or `"attr.sub"` (no schema prefix). `None` on malformed input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.split_once('.') {
            Some((attr, sub)) if is_valid_attrname(attr) && is_valid_attrname(sub) => {
                Some(Self::with_sub_attr(attr, sub))
            }
            None if is_valid_attrname(s) => Some(Self::new(s)),
            _ => None,
        }
    }

    /// Equality ignoring any sub-attribute.
    pub fn top_level_equals(&self, other: &Self) -> bool {
        self.attr.eq_ignore_ascii_case(&other.attr)
    }
}

impl fmt::Display for AttrRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_attr {
            Some(sub) => write!(f, "{}.{}", self.attr, sub),
            None => write!(f, "{}", self.attr),
        }
    }
}

impl PartialEq for AttrRep {
    fn eq(&self, other: &Self) -> bool {
        self.attr.eq_ignore_ascii_case(&other.attr)
            && match (&self.sub_attr, &other.sub_attr) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl Eq for AttrRep {}

impl Hash for AttrRep {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.attr.bytes() {
            b.to_ascii_lowercase().hash(state);
        }
        if let Some(sub) = &self.sub_attr {
            1u8.hash(state);
            for b in sub.bytes() {
                b.to_ascii_lowercase().hash(state);
            }
        } else {
            0u8.hash(state);
        }
    }
}

/// An `AttrRep` carrying an optional schema URI plus extension flags.
#[derive(Debug, Clone)]
pub struct BoundedAttrRep {
    schema: Option<SchemaUri>,
    attr_rep: AttrRep,
    extension: bool,
    extension_required: bool,
}

impl BoundedAttrRep {
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            schema: None,
            attr_rep: AttrRep::new(attr),
            extension: false,
            extension_required: false,
        }
    }

    pub fn with_schema(schema: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            schema: Some(SchemaUri::new(schema)),
            attr_rep: AttrRep::new(attr),
            extension: false,
            extension_required: false,
        }
    }

    pub fn builder(attr_rep: AttrRep) -> Self {
        Self { schema: None, attr_rep, extension: false, extension_required: false }
    }

    pub fn schema(&self, schema: impl Into<String>) -> Self {
        Self { schema: Some(SchemaUri::new(schema)), ..self.clone() }
    }

    pub fn extension(mut self, extension: bool) -> Self {
        self.extension = extension;
        self
    }

    pub fn extension_required(mut self, required: bool) -> Self {
        self.extension_required = required;
        self
    }

    pub fn schema_uri(&self) -> Option<&SchemaUri> {
        self.schema.as_ref()
    }

    pub fn attr(&self) -> &str {
        self.attr_rep.attr()
    }

    pub fn sub_attr(&self) -> Option<&str> {
        self.attr_rep.sub_attr()
    }

    pub fn attr_rep(&self) -> &AttrRep {
        &self.attr_rep
    }

    pub fn is_extension(&self) -> bool {
        self.extension
    }

    pub fn is_extension_required(&self) -> bool {
        self.extension_required
    }

    /// Equality ignoring any sub-attribute (and the extension flags).
    pub fn parent_equals(&self, other: &Self) -> bool {
        self.schemas_compatible(other) && self.attr_rep.top_level_equals(&other.attr_rep)
    }

    pub fn top_level_equals(&self, other: &AttrRep) -> bool {
        self.attr_rep.top_level_equals(other)
    }

    fn schemas_compatible(&self, other: &Self) -> bool {
        match (&self.schema, &other.schema) {
            (None, _) | (_, None) => true,
            (Some(a), Some(b)) => a == b,
        }
    }
}

impl fmt::Display for BoundedAttrRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}:{}", self.attr_rep),
            None => write!(f, "{}", self.attr_rep),
        }
    }
}

impl PartialEq for BoundedAttrRep {
    fn eq(&self, other: &Self) -> bool {
        self.attr_rep == other.attr_rep && self.schemas_compatible(other)
    }
}

impl Eq for BoundedAttrRep {}

impl Hash for BoundedAttrRep {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attr_rep.hash(state);
    }
}

/// Parses a bare `&str` into either an `AttrRep` or a `BoundedAttrRep`,
/// depending on whether a `uri-prefix` is present.
pub struct AttrRepFactory;

impl AttrRepFactory {
    /// Parse `[uri-prefix] attrname ["." attrname]`. `None` on malformed input.
    pub fn parse(s: &str) -> Option<BoundedAttrRep> {
        match s.rfind(':') {
            Some(idx) => {
                let (schema, rest) = (&s[..idx], &s[idx + 1..]);
                if schema.is_empty() {
                    return None;
                }
                let attr_rep = AttrRep::parse(rest)?;
                Some(BoundedAttrRep::builder(attr_rep).schema(schema))
            }
            None => {
                let attr_rep = AttrRep::parse(s)?;
                Some(BoundedAttrRep::builder(attr_rep))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_rep_equality_is_case_insensitive() {
        assert_eq!(AttrRep::new("userName"), AttrRep::new("USERNAME"));
        assert_eq!(
            AttrRep::with_sub_attr("name", "givenName"),
            AttrRep::with_sub_attr("Name", "GIVENNAME")
        );
    }

    #[test]
    fn attr_rep_parse_rejects_bad_attrname() {
        assert!(AttrRep::parse("1bad").is_none());
        assert!(AttrRep::parse("good.1bad").is_none());
        assert!(AttrRep::parse("$ref").is_some());
    }

    #[test]
    fn bounded_attr_rep_schema_is_case_insensitive() {
        let a = BoundedAttrRep::with_schema("urn:ietf:params:scim:schemas:core:2.0:User", "userName");
        let b = BoundedAttrRep::with_schema("URN:IETF:PARAMS:SCIM:SCHEMAS:CORE:2.0:USER", "USERNAME");
        assert_eq!(a, b);
    }

    #[test]
    fn bounded_attr_rep_empty_schema_matches_any_schema() {
        let unscoped = BoundedAttrRep::new("userName");
        let scoped =
            BoundedAttrRep::with_schema("urn:ietf:params:scim:schemas:core:2.0:User", "userName");
        assert_eq!(unscoped, scoped);
    }

    #[test]
    fn attr_rep_factory_splits_schema_prefix() {
        let parsed =
            AttrRepFactory::parse("urn:ietf:params:scim:schemas:core:2.0:User:userName").unwrap();
        assert_eq!(parsed.attr(), "userName");
        assert_eq!(
            parsed.schema_uri().unwrap().as_str(),
            "urn:ietf:params:scim:schemas:core:2.0:User"
        );
    }
}
