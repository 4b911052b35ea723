//! `PatchPath`: `attr-rep ("[" filter "]")? ("." sub-attr)?`.
//!
//! Grounded on `patch.py`'s `PatchPath` class.

use crate::attr_rep::{AttrRep, AttrRepFactory, BoundedAttrRep};
use crate::container::Container;
use crate::error::ValidationError;
use crate::filter::ast::Filter;
use crate::filter::matcher::{self, MatchTarget};
use crate::filter::parser;
use crate::schema::schema::Schema;

/// `(attr_rep, sub_attr_rep?, filter?)` designating a mutation target inside
/// a resource, with the invariant that `attr_rep` never carries a sub-attr
/// and, when present, the filter's root targets `attr_rep`.
#[derive(Debug, Clone)]
pub struct PatchPath {
    attr_rep: BoundedAttrRep,
    sub_attr_rep: Option<AttrRep>,
    filter: Option<Filter>,
}

pub struct PatchPathError {
    pub error: ValidationError,
}

impl PatchPath {
    pub fn attr_rep(&self) -> &BoundedAttrRep {
        &self.attr_rep
    }

    pub fn sub_attr_rep(&self) -> Option<&AttrRep> {
        self.sub_attr_rep.as_ref()
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Parse `path` per `patch-path = attr-rep ("[" filter "]")? ("." sub-attr)?`.
    pub fn parse(path: &str) -> Result<PatchPath, PatchPathError> {
        let open = path.find('[');
        let close = path.find(']');

        match (open, close) {
            (None, None) => {
                let attr_rep = AttrRepFactory::parse(path)
                    .ok_or_else(|| err(ValidationError::BadAttributeName { name: path.to_string() }))?;
                if attr_rep.sub_attr().is_some() {
                    // `a.b` with no filter: treat `b` as the sub-attr role.
                    let sub = AttrRep::new(attr_rep.sub_attr().unwrap());
                    let mut base = BoundedAttrRep::builder(AttrRep::new(attr_rep.attr()));
                    if let Some(schema) = attr_rep.schema_uri() {
                        base = base.schema(schema.as_str());
                    }
                    return Ok(PatchPath { attr_rep: base, sub_attr_rep: Some(sub), filter: None });
                }
                Ok(PatchPath { attr_rep, sub_attr_rep: None, filter: None })
            }
            (Some(o), Some(c)) if o < c => Self::parse_filtered(path, o, c),
            _ => Err(err(ValidationError::ComplexAttributeBracketMismatch)),
        }
    }

    fn parse_filtered(path: &str, open: usize, close: usize) -> Result<PatchPath, PatchPathError> {
        let attr_part = &path[..open];
        let attr_rep = AttrRepFactory::parse(attr_part)
            .ok_or_else(|| err(ValidationError::BadAttributeName { name: attr_part.to_string() }))?;
        if attr_rep.sub_attr().is_some() {
            return Err(err(ValidationError::ComplexSubAttribute {
                attr: attr_rep.attr().to_string(),
                sub: attr_rep.sub_attr().unwrap_or_default().to_string(),
            }));
        }

        let filter_expr = &path[open + 1..close];
        let filter = parser::parse(filter_expr).map_err(|e| err(e.error))?;
        if !filter_targets(&filter, attr_rep.attr()) {
            return Err(err(ValidationError::ComplexSubAttribute {
                attr: attr_rep.attr().to_string(),
                sub: String::new(),
            }));
        }

        let rest = &path[close + 1..];
        let sub_attr_rep = if rest.is_empty() {
            None
        } else {
            let rest = rest.strip_prefix('.').unwrap_or(rest);
            Some(
                AttrRep::parse(rest)
                    .ok_or_else(|| err(ValidationError::BadAttributeName { name: rest.to_string() }))?,
            )
        };

        Ok(PatchPath { attr_rep, sub_attr_rep, filter: Some(filter) })
    }

    /// Resolve this path's target attribute against `resource` and, if a
    /// filter is present, evaluate it. Without a filter, the path trivially
    /// matches once the attribute resolves against `schema`.
    pub fn path_matches(&self, resource: &Container, schema: &Schema) -> bool {
        if schema.attrs().get_by_path(self).is_none() {
            return false;
        }
        let Some(filter) = &self.filter else {
            return true;
        };
        matcher::matches(filter, resource, &MatchTarget::Schema(schema))
    }

    pub fn serialize(&self) -> String {
        let mut out = self.attr_rep.to_string();
        if let Some(filter) = &self.filter {
            out.push('[');
            out.push_str(&crate::filter::serialize::serialize(filter));
            out.push(']');
        }
        if let Some(sub) = &self.sub_attr_rep {
            out.push('.');
            out.push_str(sub.attr());
        }
        out
    }
}

fn filter_targets(filter: &Filter, attr: &str) -> bool {
    matches!(filter, Filter::Complex(rep, _) if rep.attr().eq_ignore_ascii_case(attr))
}

fn err(error: ValidationError) -> PatchPathError {
    PatchPathError { error }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_path_parses_to_bare_attr_rep() {
        let path = PatchPath::parse("userName").unwrap();
        assert_eq!(path.attr_rep().attr(), "userName");
        assert!(path.filter().is_none());
    }

    #[test]
    fn filtered_path_with_trailing_sub_attr() {
        let path = PatchPath::parse(r#"members[value eq "id-1"].displayName"#).unwrap();
        assert_eq!(path.attr_rep().attr(), "members");
        assert_eq!(path.sub_attr_rep().unwrap().attr(), "displayName");
        assert!(path.filter().is_some());
    }

    #[test]
    fn mismatched_brackets_rejected() {
        assert!(PatchPath::parse("members[value eq \"id-1\"").is_err());
    }
}
