//! `BoundedAttrs`: the two-level attribute index a `Schema` indexes its
//! attributes through.
//!
//! Grounded on spec.md §4.D's `BoundedAttrs` contract: `(schema_uri,
//! attr_name) -> Attribute` plus a lazily consulted `(attr, sub_attr) ->
//! Attribute` index for `Complex` attributes.

use crate::attr_rep::{AttrRep, BoundedAttrRep};
use crate::patch::path::PatchPath;
use crate::schema::attr::Attribute;

#[derive(Clone)]
struct Entry {
    schema: String,
    extension: bool,
    extension_required: bool,
    attr: Attribute,
}

/// Indexes a schema's attributes (including extension-contributed ones) for
/// lookup by `BoundedAttrRep` or by `PatchPath`.
#[derive(Clone, Default)]
pub struct BoundedAttrs {
    entries: Vec<Entry>,
}

impl BoundedAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema: impl Into<String>, attr: Attribute) {
        self.entries.push(Entry { schema: schema.into(), extension: false, extension_required: false, attr });
    }

    pub fn insert_extension(
        &mut self,
        schema: impl Into<String>,
        attr: Attribute,
        required: bool,
    ) {
        self.entries.push(Entry {
            schema: schema.into(),
            extension: true,
            extension_required: required,
            attr,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool, &Attribute)> {
        self.entries.iter().map(|e| (e.schema.as_str(), e.extension, &e.attr))
    }

    /// Returns the `BoundedAttrRep` for `attr.sub` suitable for container I/O.
    pub fn rep_for(&self, name: &str, sub: Option<&str>) -> Option<BoundedAttrRep> {
        let entry = self.entries.iter().find(|e| e.attr.name().eq_ignore_ascii_case(name))?;
        let attr_rep = match sub {
            Some(sub) => AttrRep::with_sub_attr(name, sub),
            None => AttrRep::new(name),
        };
        Some(
            BoundedAttrRep::builder(attr_rep)
                .schema(&entry.schema)
                .extension(entry.extension)
                .extension_required(entry.extension_required),
        )
    }

    /// Look up the attribute (top-level or sub-attribute) named by `rep`.
    pub fn get(&self, rep: &BoundedAttrRep) -> Option<&Attribute> {
        let entry = self.entries.iter().find(|e| {
            e.attr.name().eq_ignore_ascii_case(rep.attr())
                && (rep.schema_uri().is_none()
                    || rep.schema_uri().map(|s| s.as_str()).unwrap_or_default().eq_ignore_ascii_case(&e.schema))
        })?;
        match rep.sub_attr() {
            Some(sub) => entry.attr.sub_attribute(sub),
            None => Some(&entry.attr),
        }
    }

    pub fn get_top_level(&self, name: &str) -> Option<&Attribute> {
        self.entries
            .iter()
            .find(|e| e.attr.name().eq_ignore_ascii_case(name))
            .map(|e| &e.attr)
    }

    pub fn is_extension(&self, name: &str) -> Option<(bool, bool)> {
        self.entries
            .iter()
            .find(|e| e.attr.name().eq_ignore_ascii_case(name))
            .map(|e| (e.extension, e.extension_required))
    }

    /// Returns the attribute a `PatchPath` ultimately designates, or `None`
    /// when a filter is used on a non-multi-valued attribute.
    pub fn get_by_path(&self, path: &PatchPath) -> Option<&Attribute> {
        let top = self.get_top_level(path.attr_rep().attr())?;

        if path.filter().is_some() && !top.header().multi_valued {
            return None;
        }

        match path.sub_attr_rep() {
            Some(sub) => top.sub_attribute(sub.attr()),
            None => Some(top),
        }
    }
}
