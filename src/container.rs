//! The case-insensitive, schema-URI-aware nested data container.
//!
//! Grounded on `container.py`'s `SCIMDataContainer`: a map whose keys compare
//! case-insensitively but whose first-seen casing is preserved for output,
//! with routing rules for extension buckets and sub-attribute parents.

use crate::attr_rep::{AttrRep, AttrRepFactory, BoundedAttrRep, SchemaUri};
use serde_json::{Map as JsonMap, Value as Json};
use std::collections::HashMap;

/// The container's element type. `Missing` and `Invalid` are sentinels with
/// no JSON counterpart: `Missing` means "attribute absent", `Invalid` means
/// "present but failed typing" and suppresses downstream checks at that
/// location.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Obj(Container),
    /// The attribute is absent.
    Missing,
    /// The attribute is present but failed typing; suppresses downstream checks.
    Invalid,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Invalid)
    }

    /// Falsy in boolean/"present" contexts: `Missing`, `Null`, and the empty string.
    pub fn is_present(&self) -> bool {
        match self {
            Value::Missing | Value::Null => false,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<&Container> {
        match self {
            Value::Obj(c) => Some(c),
            _ => None,
        }
    }

    /// Converts a parsed JSON tree into `Value`, deeply.
    pub fn from_json(json: Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::Obj(Container::from_json_map(map)),
        }
    }

    /// Converts back to a wire JSON value. `Missing`/`Invalid` reaching this
    /// point is a caller error; it serializes as `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Obj(c) => c.to_json(),
            Value::Missing | Value::Invalid => {
                debug_assert!(
                    !cfg!(debug_assertions),
                    "Missing/Invalid sentinel reached serialization"
                );
                Json::Null
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

/// A key a container operation can be addressed by.
pub enum Key<'a> {
    Schema(&'a SchemaUri),
    Attr(&'a AttrRep),
    Bounded(&'a BoundedAttrRep),
    /// A dotted string, parsed via the `AttrRep` grammar.
    Path(&'a str),
}

impl<'a> From<&'a SchemaUri> for Key<'a> {
    fn from(s: &'a SchemaUri) -> Self {
        Key::Schema(s)
    }
}

impl<'a> From<&'a AttrRep> for Key<'a> {
    fn from(a: &'a AttrRep) -> Self {
        Key::Attr(a)
    }
}

impl<'a> From<&'a BoundedAttrRep> for Key<'a> {
    fn from(b: &'a BoundedAttrRep) -> Self {
        Key::Bounded(b)
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(s: &'a str) -> Self {
        Key::Path(s)
    }
}

/// A nested, ordered, case-insensitive map. Preserves first-seen key casing;
/// routes writes/reads into extension buckets when the key carries a
/// registered extension schema URI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    /// lower-cased key -> original-case key, insertion order preserved via `entries`.
    lower_to_original: HashMap<String, String>,
    entries: Vec<(String, Value)>,
    /// Schema URIs this container treats as extension buckets (lower-cased).
    extension_schemas: HashMap<String, String>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` as a namespace this container routes into.
    pub fn register_extension_schema(&mut self, schema: &SchemaUri) {
        self.extension_schemas
            .insert(schema.as_str().to_ascii_lowercase(), schema.as_str().to_string());
    }

    fn index_of(&self, lower_key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.eq_ignore_ascii_case(lower_key))
    }

    fn raw_set(&mut self, key: &str, value: Value) {
        let lower = key.to_ascii_lowercase();
        if let Some(idx) = self.index_of(&lower) {
            self.entries[idx] = (key.to_string(), value);
        } else {
            self.entries.push((key.to_string(), value));
        }
        self.lower_to_original.insert(lower, key.to_string());
    }

    fn raw_get(&self, key: &str) -> Option<&Value> {
        self.index_of(&key.to_ascii_lowercase())
            .map(|idx| &self.entries[idx].1)
    }

    fn raw_pop(&mut self, key: &str) -> Option<Value> {
        let lower = key.to_ascii_lowercase();
        self.lower_to_original.remove(&lower);
        self.index_of(&lower).map(|idx| self.entries.remove(idx).1)
    }

    fn extension_bucket(&self, schema: &str) -> Option<String> {
        self.extension_schemas.get(&schema.to_ascii_lowercase()).cloned()
    }

    /// Resolve a `Key` into (extension routing, attr, sub_attr).
    fn resolve<'a>(&self, key: Key<'a>) -> Resolved {
        match key {
            Key::Schema(s) => Resolved::SchemaBucket(s.as_str().to_string()),
            Key::Path(s) => {
                if let Some(bounded) = AttrRepFactory::parse(s) {
                    self.resolve_bounded(&bounded)
                } else {
                    Resolved::Attr { attr: s.to_string(), sub_attr: None }
                }
            }
            Key::Attr(a) => Resolved::Attr {
                attr: a.attr().to_string(),
                sub_attr: a.sub_attr().map(str::to_string),
            },
            Key::Bounded(b) => self.resolve_bounded(b),
        }
    }

    fn resolve_bounded(&self, b: &BoundedAttrRep) -> Resolved {
        if let Some(schema) = b.schema_uri() {
            if let Some(bucket) = self.extension_bucket(schema.as_str()) {
                return Resolved::Extension {
                    bucket,
                    attr: b.attr().to_string(),
                    sub_attr: b.sub_attr().map(str::to_string),
                };
            }
        }
        Resolved::Attr { attr: b.attr().to_string(), sub_attr: b.sub_attr().map(str::to_string) }
    }

    /// Set `value` at `key`. `expand` governs how a list sub-value is routed
    /// into a multi-valued complex parent (see spec routing rule 4).
    pub fn set<'a>(&mut self, key: impl Into<Key<'a>>, value: Value, expand: bool) {
        match self.resolve(key.into()) {
            Resolved::SchemaBucket(uri) => {
                self.raw_set(&uri, value);
            }
            Resolved::Extension { bucket, attr, sub_attr } => {
                let mut sub = match self.raw_pop(&bucket) {
                    Some(Value::Obj(c)) => c,
                    _ => Container::new(),
                };
                sub.set_top_or_sub(&attr, sub_attr.as_deref(), value, expand);
                self.raw_set(&bucket, Value::Obj(sub));
            }
            Resolved::Attr { attr, sub_attr } => {
                self.set_top_or_sub(&attr, sub_attr.as_deref(), value, expand);
            }
        }
    }

    fn set_top_or_sub(&mut self, attr: &str, sub_attr: Option<&str>, value: Value, expand: bool) {
        let Some(sub) = sub_attr else {
            self.raw_set(attr, value);
            return;
        };

        match value {
            Value::List(items) if expand => {
                let mut list = match self.raw_pop(attr) {
                    Some(Value::List(l)) => l,
                    _ => Vec::new(),
                };
                while list.len() < items.len() {
                    list.push(Value::Obj(Container::new()));
                }
                for (i, item) in items.into_iter().enumerate() {
                    if item.is_missing() {
                        continue;
                    }
                    if let Value::Obj(c) = &mut list[i] {
                        c.raw_set(sub, item);
                    }
                }
                self.raw_set(attr, Value::List(list));
            }
            other => {
                let mut parent = match self.raw_pop(attr) {
                    Some(Value::Obj(c)) => c,
                    _ => Container::new(),
                };
                parent.raw_set(sub, other);
                self.raw_set(attr, Value::Obj(parent));
            }
        }
    }

    /// Get the value at `key`. Returns `Value::Missing` if absent.
    /// Retrieving `attr.sub` on a multi-valued (list) parent returns a list
    /// whose i-th item is the sub-attr of the i-th element.
    pub fn get<'a>(&self, key: impl Into<Key<'a>>) -> Value {
        match self.resolve(key.into()) {
            Resolved::SchemaBucket(uri) => self.raw_get(&uri).cloned().unwrap_or(Value::Missing),
            Resolved::Extension { bucket, attr, sub_attr } => match self.raw_get(&bucket) {
                Some(Value::Obj(c)) => c.get_top_or_sub(&attr, sub_attr.as_deref()),
                _ => Value::Missing,
            },
            Resolved::Attr { attr, sub_attr } => self.get_top_or_sub(&attr, sub_attr.as_deref()),
        }
    }

    fn get_top_or_sub(&self, attr: &str, sub_attr: Option<&str>) -> Value {
        let top = self.raw_get(attr).cloned().unwrap_or(Value::Missing);
        let Some(sub) = sub_attr else {
            return top;
        };
        match top {
            Value::Obj(c) => c.raw_get(sub).cloned().unwrap_or(Value::Missing),
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Obj(c) => c.raw_get(sub).cloned().unwrap_or(Value::Missing),
                        _ => Value::Missing,
                    })
                    .collect(),
            ),
            _ => Value::Missing,
        }
    }

    /// Remove and return the value at `key`.
    pub fn pop<'a>(&mut self, key: impl Into<Key<'a>>) -> Value {
        match self.resolve(key.into()) {
            Resolved::SchemaBucket(uri) => self.raw_pop(&uri).unwrap_or(Value::Missing),
            Resolved::Extension { bucket, attr, sub_attr } => {
                let Some(Value::Obj(mut c)) = self.raw_pop(&bucket) else {
                    return Value::Missing;
                };
                let popped = c.pop_top_or_sub(&attr, sub_attr.as_deref());
                self.raw_set(&bucket, Value::Obj(c));
                popped
            }
            Resolved::Attr { attr, sub_attr } => self.pop_top_or_sub(&attr, sub_attr.as_deref()),
        }
    }

    fn pop_top_or_sub(&mut self, attr: &str, sub_attr: Option<&str>) -> Value {
        let Some(sub) = sub_attr else {
            return self.raw_pop(attr).unwrap_or(Value::Missing);
        };
        match self.raw_pop(attr) {
            Some(Value::Obj(mut c)) => {
                let v = c.raw_pop(sub).unwrap_or(Value::Missing);
                self.raw_set(attr, Value::Obj(c));
                v
            }
            Some(other) => {
                self.raw_set(attr, other);
                Value::Missing
            }
            None => Value::Missing,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index_of(&key.to_ascii_lowercase()).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_json_map(map: JsonMap<String, Json>) -> Self {
        let mut container = Container::new();
        for (k, v) in map {
            container.raw_set(&k, Value::from_json(v));
        }
        container
    }

    /// Construct a container from a raw parsed-JSON tree.
    pub fn from_json(json: Json) -> Self {
        match json {
            Json::Object(map) => Self::from_json_map(map),
            _ => Container::new(),
        }
    }

    /// Convert back to a plain JSON tree for output.
    pub fn to_json(&self) -> Json {
        let mut map = JsonMap::new();
        for (k, v) in &self.entries {
            map.insert(k.clone(), v.to_json());
        }
        Json::Object(map)
    }

    /// SCIM equality: every key in `self` finds an equal value in `other`,
    /// matched either by its raw key or, for keys containing a schema-URI
    /// prefix, by the corresponding namespaced bucket — so
    /// `{a:1, "ext:attr":2}` equals `{a:1, ext:{attr:2}}`. Symmetric, so both
    /// directions are checked.
    pub fn scim_eq(&self, other: &Container) -> bool {
        self.scim_subset_of(other) && other.scim_subset_of(self)
    }

    fn scim_subset_of(&self, other: &Container) -> bool {
        self.entries.iter().all(|(key, value)| {
            if let Some(other_value) = other.raw_get(key) {
                if value == other_value {
                    return true;
                }
            }
            if let Some((schema, attr)) = key.split_once(':') {
                if let Value::Obj(bucket) = other.get(&SchemaUri::new(schema)) {
                    if let Some(bucket_value) = bucket.raw_get(attr) {
                        return value == bucket_value;
                    }
                }
            }
            if self.extension_schemas.contains_key(&key.to_ascii_lowercase()) {
                if let Value::Obj(bucket) = value {
                    return bucket.entries.iter().all(|(attr, attr_value)| {
                        let flattened = format!("{key}:{attr}");
                        if let Some(other_value) = other.raw_get(&flattened) {
                            return attr_value == other_value;
                        }
                        if let Value::Obj(other_bucket) = other.get(&SchemaUri::new(key)) {
                            if let Some(other_value) = other_bucket.raw_get(attr) {
                                return attr_value == other_value;
                            }
                        }
                        false
                    });
                }
            }
            false
        })
    }
}

enum Resolved {
    SchemaBucket(String),
    Extension { bucket: String, attr: String, sub_attr: Option<String> },
    Attr { attr: String, sub_attr: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_get_preserves_original_casing() {
        let mut c = Container::new();
        c.set("userName", Value::from("bjensen"), false);
        assert_eq!(c.get("USERNAME"), Value::Str("bjensen".into()));
        assert_eq!(c.keys().collect::<Vec<_>>(), vec!["userName"]);
    }

    #[test]
    fn missing_key_returns_missing_sentinel() {
        let c = Container::new();
        assert_eq!(c.get("nope"), Value::Missing);
    }

    #[test]
    fn sub_attr_write_creates_parent_container() {
        let mut c = Container::new();
        c.set("name.givenName", Value::from("Babs"), false);
        let name = c.get("name");
        assert_eq!(name.as_obj().unwrap().get("givenName"), Value::Str("Babs".into()));
    }

    #[test]
    fn sub_attr_get_over_list_projects_element_wise() {
        let mut c = Container::new();
        let mut e1 = Container::new();
        e1.set("type", Value::from("work"), false);
        let mut e2 = Container::new();
        e2.set("type", Value::from("home"), false);
        c.set("emails", Value::List(vec![Value::Obj(e1), Value::Obj(e2)]), false);

        let types = c.get("emails.type");
        assert_eq!(
            types,
            Value::List(vec![Value::Str("work".into()), Value::Str("home".into())])
        );
    }

    #[test]
    fn extension_bucket_routes_through_schema_uri() {
        let mut c = Container::new();
        let schema = SchemaUri::new("urn:ietf:params:scim:schemas:extension:enterprise:2.0:User");
        c.register_extension_schema(&schema);

        let attr_rep = BoundedAttrRep::with_schema(
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User",
            "employeeNumber",
        )
        .extension(true);
        c.set(&attr_rep, Value::from("701984"), false);

        let json = c.to_json();
        assert_eq!(
            json,
            serde_json::json!({
                "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {
                    "employeeNumber": "701984"
                }
            })
        );
    }

    #[test]
    fn schemas_extension_equivalence() {
        let a = Container::from_json(serde_json::json!({"a": 1, "ext:attr": 2}));
        let mut b = Container::new();
        b.register_extension_schema(&SchemaUri::new("ext"));
        b.set("a", Value::Int(1), false);
        b.set(
            &BoundedAttrRep::with_schema("ext", "attr").extension(true),
            Value::Int(2),
            false,
        );

        assert!(a.scim_eq(&b));
    }
}
