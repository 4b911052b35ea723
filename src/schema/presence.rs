//! Presence semantics: whether an attribute's (non-)appearance is a
//! validation error given data-flow direction and inclusion policy.
//!
//! Grounded on `data/attr_presence.py`'s `AttrPresenceConfig`/`validate_presence`.

use crate::attr_rep::AttrRep;
use crate::container::Value;
use crate::error::{IssueLog, ValidationError};
use crate::schema::attr::{Attribute, Issuer, Returned};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirection {
    Request,
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataInclusivity {
    Include,
    Exclude,
}

/// Caller-supplied policy steering which attributes must, may, or must not
/// be returned or supplied.
#[derive(Debug, Clone)]
pub struct AttrPresenceConfig {
    direction: DataDirection,
    attr_reps: Vec<AttrRep>,
    include: Option<bool>,
    ignore_issuer: Vec<AttrRep>,
}

impl AttrPresenceConfig {
    pub fn new(direction: DataDirection) -> Self {
        Self { direction, attr_reps: Vec::new(), include: None, ignore_issuer: Vec::new() }
    }

    /// `include = true` means the listed attributes should be included;
    /// excluded otherwise.
    pub fn with_attr_reps(mut self, attr_reps: Vec<AttrRep>, include: bool) -> Self {
        self.attr_reps = attr_reps;
        self.include = Some(include);
        self
    }

    pub fn with_ignore_issuer(mut self, attr_reps: Vec<AttrRep>) -> Self {
        self.ignore_issuer = attr_reps;
        self
    }

    pub fn direction(&self) -> DataDirection {
        self.direction
    }

    pub fn attr_reps_is_empty(&self) -> bool {
        self.attr_reps.is_empty()
    }

    /// Built from a request body's `attributes`/`excludeAttributes` fields,
    /// if either is present; `None` otherwise.
    pub fn from_data(include: Option<Vec<AttrRep>>, exclude: Option<Vec<AttrRep>>) -> Option<Self> {
        match (include, exclude) {
            (Some(attrs), _) if !attrs.is_empty() => {
                Some(Self::new(DataDirection::Response).with_attr_reps(attrs, true))
            }
            (_, Some(attrs)) if !attrs.is_empty() => {
                Some(Self::new(DataDirection::Response).with_attr_reps(attrs, false))
            }
            _ => None,
        }
    }

    fn ignores_issuer(&self, rep: &AttrRep) -> bool {
        self.ignore_issuer.iter().any(|r| r == rep)
    }

    /// The "desired" test over include/exclude: the attribute listed
    /// directly; a parent listed (child of a listed parent is delegated); a
    /// sibling listed under the same complex (inverts for other siblings).
    fn inclusivity_for(&self, rep: &AttrRep) -> Option<DataInclusivity> {
        let include = self.include?;
        if self.attr_reps.is_empty() {
            return None;
        }
        let directly_listed = self.attr_reps.iter().any(|r| r == rep);
        let parent_listed = rep.sub_attr().is_some()
            && self.attr_reps.iter().any(|r| r.sub_attr().is_none() && r.top_level_equals(rep));
        let sibling_listed = rep.sub_attr().is_some()
            && self.attr_reps.iter().any(|r| r.top_level_equals(rep) && r.sub_attr().is_some());

        if directly_listed || parent_listed {
            Some(if include { DataInclusivity::Include } else { DataInclusivity::Exclude })
        } else if sibling_listed {
            Some(if include { DataInclusivity::Exclude } else { DataInclusivity::Include })
        } else {
            None
        }
    }
}

/// Validate presence of `value` for `attr` at `rep`, under `config` (absent
/// = no restriction beyond the schema's own `required`/`returned` facets).
pub fn validate_presence(
    attr: &Attribute,
    rep: &AttrRep,
    value: &Value,
    config: Option<&AttrPresenceConfig>,
    required_by_schema: bool,
) -> IssueLog {
    let mut issues = IssueLog::new();
    let header = attr.header();

    let direction = config.map(|c| c.direction()).unwrap_or(DataDirection::Request);
    let ignore_issuer = config.is_some_and(|c| c.ignores_issuer(rep));
    let inclusivity = config.and_then(|c| c.inclusivity_for(rep));

    let is_present = !matches!(value, Value::Missing | Value::Null)
        && !matches!(value, Value::Str(s) if s.is_empty())
        && !matches!(value, Value::List(items) if items.is_empty());

    if is_present {
        if direction == DataDirection::Request {
            if header.issuer == Issuer::Server && !ignore_issuer {
                issues.add_error_at_root(ValidationError::MustNotBeProvided, true);
            }
            return issues;
        }

        if header.returned == Returned::Never {
            issues.add_error_at_root(ValidationError::MustNotBeReturned, true);
        } else if header.returned != Returned::Always && inclusivity == Some(DataInclusivity::Exclude)
        {
            issues.add_error_at_root(ValidationError::MustNotBeReturned, true);
        }
        return issues;
    }

    let server_issued_request = direction == DataDirection::Request
        && header.issuer == Issuer::Server
        && !ignore_issuer;
    let wanted = config.map_or(true, |c| c.attr_reps_is_empty())
        || inclusivity == Some(DataInclusivity::Include)
        || (direction == DataDirection::Response && header.returned == Returned::Always);

    if header.required && !server_issued_request && wanted && required_by_schema {
        issues.add_error_at_root(ValidationError::Missing, false);
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::attr::AttrHeader;

    #[test]
    fn server_issued_attribute_present_in_request_is_rejected() {
        let attr = Attribute::String(
            AttrHeader::new("id").issuer(Issuer::Server),
            Default::default(),
        );
        let issues =
            validate_presence(&attr, &AttrRep::new("id"), &Value::from("x"), None, true);
        assert!(issues.has_errors(&[]));
    }

    #[test]
    fn returned_never_attribute_present_in_response_is_rejected() {
        let attr = Attribute::String(
            AttrHeader::new("password").returned(Returned::Never),
            Default::default(),
        );
        let config = AttrPresenceConfig::new(DataDirection::Response);
        let issues = validate_presence(
            &attr,
            &AttrRep::new("password"),
            &Value::from("secret"),
            Some(&config),
            true,
        );
        assert!(issues.has_errors(&[]));
    }

    #[test]
    fn required_missing_attribute_in_response_always_returned_is_rejected() {
        let attr = Attribute::String(
            AttrHeader::new("userName").required(true).returned(Returned::Always),
            Default::default(),
        );
        let config = AttrPresenceConfig::new(DataDirection::Response);
        let issues =
            validate_presence(&attr, &AttrRep::new("userName"), &Value::Missing, Some(&config), true);
        assert!(issues.has_errors(&[]));
    }

    #[test]
    fn extension_attribute_not_required_when_schema_not_declared() {
        let attr = Attribute::String(AttrHeader::new("employeeNumber").required(true), Default::default());
        let issues = validate_presence(
            &attr,
            &AttrRep::new("employeeNumber"),
            &Value::Missing,
            None,
            false,
        );
        assert!(!issues.has_errors(&[]));
    }
}
