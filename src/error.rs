//! The issue log: structured, location-tagged validation findings.
//!
//! Unlike most of this crate's surface, the issue log is not a Rust `Result`
//! type. Validation never aborts on bad *data* — it accumulates errors and
//! warnings at hierarchical locations (an attribute path, optionally with
//! list indices) and lets the caller decide how to react. `ScimError` below
//! is reserved for programmer misuse of the API (a malformed filter handed
//! to an infallible accessor, a duplicate schema registration) — the kind of
//! thing a `?` operator should actually stop on.

use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;

/// One segment of a location path: either an attribute name or a list index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocationSegment {
    /// An attribute or sub-attribute name.
    Attr(String),
    /// An index into a multi-valued attribute.
    Index(usize),
}

impl fmt::Display for LocationSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSegment::Attr(a) => write!(f, "{a}"),
            LocationSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for LocationSegment {
    fn from(s: &str) -> Self {
        LocationSegment::Attr(s.to_string())
    }
}

impl From<String> for LocationSegment {
    fn from(s: String) -> Self {
        LocationSegment::Attr(s)
    }
}

impl From<usize> for LocationSegment {
    fn from(i: usize) -> Self {
        LocationSegment::Index(i)
    }
}

/// A path into the data tree that an issue is attached to.
pub type Location = Vec<LocationSegment>;

fn loc<I, S>(parts: I) -> Location
where
    I: IntoIterator<Item = S>,
    S: Into<LocationSegment>,
{
    parts.into_iter().map(Into::into).collect()
}

/// Errors drawn from the fixed enumeration in the SCIM validation contract.
///
/// Each variant corresponds to exactly one numbered code from the
/// specification's error taxonomy; the numbers are preserved in the doc
/// comments so they can be cross-referenced against the wire `code` field.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // --- type and syntax (1-4) ---
    /// (1) bad value syntax
    BadValueSyntax,
    /// (2) bad type, expecting `expected`
    BadType { expected: String },
    /// (3) bad encoding, expecting `expected`
    BadEncoding { expected: String },
    /// (4) bad value content
    BadValueContent,

    // --- presence (5-7) ---
    /// (5) missing
    Missing,
    /// (6) must not be provided
    MustNotBeProvided,
    /// (7) must not be returned
    MustNotBeReturned,

    // --- equality / membership (8-11) ---
    /// (8) must be equal to `value`
    MustBeEqualTo { value: Json },
    /// (9) must be one of `expected`
    MustBeOneOf { expected: Vec<Json> },
    /// (10) contains duplicates, which are not allowed
    DuplicatedValues,
    /// (11) can not be used together with `other`
    CannotBeUsedTogether { other: String },

    // --- schema (12-17) ---
    /// (12) missing main schema
    MissingMainSchema,
    /// (13) missing schema extension `extension`
    MissingSchemaExtension { extension: String },
    /// (14) unknown schema
    UnknownSchema,
    /// (15) 'primary' attribute set to true MUST appear no more than once
    MultiplePrimaryValues,
    /// (16) bad SCIM reference, allowed resources: `resources`
    BadScimReference { resources: Vec<String> },
    /// (17) bad attribute name `name`
    BadAttributeName { name: String },

    // --- status / HTTP adjacency (18-27) ---
    /// (18) error status must be >= 400 and < 600
    BadErrorStatus,
    /// (19) bad status code, expecting `expected`
    BadStatusCode { expected: u16 },
    /// (20) bad number of resources, `reason`
    BadNumberOfResources { reason: String },
    /// (21) resources are not filtered
    ResourcesNotFiltered,
    /// (22) resources are not sorted
    ResourcesNotSorted,
    /// (23) value must be a resource type endpoint
    ResourceTypeEndpointRequired,
    /// (24) value must be a resource object endpoint
    ResourceObjectEndpointRequired,
    /// (25) unknown bulk operation resource
    UnknownOperationResource,
    /// (26) too many operations in bulk, max `max`
    TooManyBulkOperations { max: usize },
    /// (27) too many errors in bulk, max `max`
    TooManyErrorsInBulk { max: usize },

    // --- patch target (28-31) ---
    /// (28) unknown modification target
    UnknownModificationTarget,
    /// (29) attribute can not be modified
    AttributeCannotBeModified,
    /// (30) attribute can not be deleted
    AttributeCannotBeDeleted,
    /// (31) value or operation not supported
    NotSupported,

    // --- filter syntax (100-110) ---
    /// (100) one of the brackets is not opened / closed
    BracketMismatch,
    /// (101) one of the complex attribute brackets is not opened / closed
    ComplexAttributeBracketMismatch,
    /// (102) sub-attribute `sub` of `attr` can not be complex
    ComplexSubAttribute { attr: String, sub: String },
    /// (103) missing operand for operator `op` in expression `expr`
    MissingOperand { op: String, expr: String },
    /// (104) unknown operator `op` in expression `expr`
    UnknownOperator { op: String, expr: String },
    /// (105) no expression or empty expression inside a grouping operator
    EmptyFilter,
    /// (106) unknown expression `expr`
    UnknownExpression { expr: String },
    /// (107) complex attribute group can not contain inner complex attributes or brackets
    NestedComplexAttribute,
    /// (108) complex attribute group `attr` has no expression
    EmptyComplexGroup { attr: String },
    /// (109) bad operand `value`
    BadOperand { value: String },
    /// (110) operand `value` is not compatible with `op` operator
    NonCompatibleOperand { value: String, op: String },
}

impl ValidationError {
    /// The numeric code this variant renders as on the wire.
    pub fn code(&self) -> u32 {
        use ValidationError::*;
        match self {
            BadValueSyntax => 1,
            BadType { .. } => 2,
            BadEncoding { .. } => 3,
            BadValueContent => 4,
            Missing => 5,
            MustNotBeProvided => 6,
            MustNotBeReturned => 7,
            MustBeEqualTo { .. } => 8,
            MustBeOneOf { .. } => 9,
            DuplicatedValues => 10,
            CannotBeUsedTogether { .. } => 11,
            MissingMainSchema => 12,
            MissingSchemaExtension { .. } => 13,
            UnknownSchema => 14,
            MultiplePrimaryValues => 15,
            BadScimReference { .. } => 16,
            BadAttributeName { .. } => 17,
            BadErrorStatus => 18,
            BadStatusCode { .. } => 19,
            BadNumberOfResources { .. } => 20,
            ResourcesNotFiltered => 21,
            ResourcesNotSorted => 22,
            ResourceTypeEndpointRequired => 23,
            ResourceObjectEndpointRequired => 24,
            UnknownOperationResource => 25,
            TooManyBulkOperations { .. } => 26,
            TooManyErrorsInBulk { .. } => 27,
            UnknownModificationTarget => 28,
            AttributeCannotBeModified => 29,
            AttributeCannotBeDeleted => 30,
            NotSupported => 31,
            BracketMismatch => 100,
            ComplexAttributeBracketMismatch => 101,
            ComplexSubAttribute { .. } => 102,
            MissingOperand { .. } => 103,
            UnknownOperator { .. } => 104,
            EmptyFilter => 105,
            UnknownExpression { .. } => 106,
            NestedComplexAttribute => 107,
            EmptyComplexGroup { .. } => 108,
            BadOperand { .. } => 109,
            NonCompatibleOperand { .. } => 110,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ValidationError::*;
        match self {
            BadValueSyntax => write!(f, "bad value syntax"),
            BadType { expected } => write!(f, "bad type, expecting '{expected}'"),
            BadEncoding { expected } => write!(f, "bad encoding, expecting '{expected}'"),
            BadValueContent => write!(f, "bad value content"),
            Missing => write!(f, "missing"),
            MustNotBeProvided => write!(f, "must not be provided"),
            MustNotBeReturned => write!(f, "must not be returned"),
            MustBeEqualTo { value } => write!(f, "must be equal to {value}"),
            MustBeOneOf { expected } => write!(f, "must be one of: {expected:?}"),
            DuplicatedValues => write!(f, "contains duplicates, which are not allowed"),
            CannotBeUsedTogether { other } => write!(f, "can not be used together with '{other}'"),
            MissingMainSchema => write!(f, "missing main schema"),
            MissingSchemaExtension { extension } => {
                write!(f, "missing schema extension '{extension}'")
            }
            UnknownSchema => write!(f, "unknown schema"),
            MultiplePrimaryValues => {
                write!(f, "'primary' attribute set to 'true' MUST appear no more than once")
            }
            BadScimReference { resources } => {
                write!(f, "bad SCIM reference, allowed resources: {resources:?}")
            }
            BadAttributeName { name } => write!(f, "bad attribute name '{name}'"),
            BadErrorStatus => write!(f, "error status must be >= 400 and < 600"),
            BadStatusCode { expected } => write!(f, "bad status code, expecting '{expected}'"),
            BadNumberOfResources { reason } => write!(f, "bad number of resources, {reason}"),
            ResourcesNotFiltered => write!(f, "does not match the filter"),
            ResourcesNotSorted => write!(f, "resources are not sorted"),
            ResourceTypeEndpointRequired => write!(f, "value must be resource type endpoint"),
            ResourceObjectEndpointRequired => write!(f, "value must be resource object endpoint"),
            UnknownOperationResource => write!(f, "unknown bulk operation resource"),
            TooManyBulkOperations { max } => write!(f, "too many operations in bulk (max {max})"),
            TooManyErrorsInBulk { max } => write!(f, "too many errors in bulk (max {max})"),
            UnknownModificationTarget => write!(f, "unknown modification target"),
            AttributeCannotBeModified => write!(f, "attribute can not be modified"),
            AttributeCannotBeDeleted => write!(f, "attribute can not be deleted"),
            NotSupported => write!(f, "value or operation not supported"),
            BracketMismatch => write!(f, "one of brackets is not opened / closed"),
            ComplexAttributeBracketMismatch => {
                write!(f, "one of complex attribute brackets is not opened / closed")
            }
            ComplexSubAttribute { attr, sub } => {
                write!(f, "sub-attribute '{sub}' of '{attr}' can not be complex")
            }
            MissingOperand { op, expr } => {
                write!(f, "missing operand for operator '{op}' in expression '{expr}'")
            }
            UnknownOperator { op, expr } => {
                write!(f, "unknown operator '{op}' in expression '{expr}'")
            }
            EmptyFilter => write!(f, "no expression or empty expression inside grouping operator"),
            UnknownExpression { expr } => write!(f, "unknown expression '{expr}'"),
            NestedComplexAttribute => write!(
                f,
                "complex attribute group can not contain inner complex attributes or square brackets"
            ),
            EmptyComplexGroup { attr } => {
                write!(f, "complex attribute group '{attr}' has no expression")
            }
            BadOperand { value } => write!(f, "bad operand '{value}'"),
            NonCompatibleOperand { value, op } => {
                write!(f, "operand '{value}' is not compatible with '{op}' operator")
            }
        }
    }
}

/// Warnings: never block `can_proceed`, but are worth surfacing.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    /// (1) value should be one of `expected`
    ShouldBeOneOf { expected: Vec<Json> },
    /// (2) multi-valued complex attribute should contain a given (type, value) pair at most once
    MultipleTypeValuePairs,
    /// (3) unexpected content: `reason`
    UnexpectedContent { reason: String },
    /// (4) missing
    Missing,
    /// (5) should not equal to `value`
    ShouldNotEqualTo { value: Json },
}

impl ValidationWarning {
    pub fn code(&self) -> u32 {
        use ValidationWarning::*;
        match self {
            ShouldBeOneOf { .. } => 1,
            MultipleTypeValuePairs => 2,
            UnexpectedContent { .. } => 3,
            Missing => 4,
            ShouldNotEqualTo { .. } => 5,
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ValidationWarning::*;
        match self {
            ShouldBeOneOf { expected } => write!(f, "value should be one of: {expected:?}"),
            MultipleTypeValuePairs => write!(
                f,
                "multi-valued complex attribute should contain a given type-value pair no more than once"
            ),
            UnexpectedContent { reason } => write!(f, "unexpected content, {reason}"),
            Missing => write!(f, "missing"),
            ShouldNotEqualTo { value } => write!(f, "should not equal to {value}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

/// Accumulates errors and warnings at hierarchical locations.
///
/// This is the core's sole vehicle for reporting problems with *data*: a
/// malformed resource never panics or returns early, it gets its findings
/// recorded here so validation can keep walking sibling attributes. Callers
/// gate further work on [`IssueLog::can_proceed`].
#[derive(Debug, Clone, Default)]
pub struct IssueLog {
    entries: BTreeMap<Location, Entry>,
    stop_proceeding: BTreeMap<Location, Vec<u32>>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error at `location` (empty for the root). `proceed = false`
    /// marks every location `location` is a prefix of as unable to proceed.
    pub fn add_error<L>(&mut self, error: ValidationError, proceed: bool, location: L)
    where
        L: IntoIterator<Item = LocationSegment>,
    {
        let location: Location = location.into_iter().collect();
        if !proceed {
            self.stop_proceeding
                .entry(location.clone())
                .or_default()
                .push(error.code());
        }
        self.entries.entry(location).or_default().errors.push(error);
    }

    /// Convenience for `add_error` with no location (root).
    pub fn add_error_at_root(&mut self, error: ValidationError, proceed: bool) {
        self.add_error(error, proceed, Vec::new());
    }

    pub fn add_warning<L>(&mut self, warning: ValidationWarning, location: L)
    where
        L: IntoIterator<Item = LocationSegment>,
    {
        let location: Location = location.into_iter().collect();
        self.entries.entry(location).or_default().warnings.push(warning);
    }

    pub fn add_warning_at_root(&mut self, warning: ValidationWarning) {
        self.add_warning(warning, Vec::new());
    }

    /// Merge `other` into `self`, re-basing every one of its locations under
    /// `prefix`.
    pub fn merge<L>(&mut self, other: IssueLog, prefix: L)
    where
        L: IntoIterator<Item = LocationSegment>,
    {
        let prefix: Location = prefix.into_iter().collect();
        for (other_loc, entry) in other.entries {
            let mut new_loc = prefix.clone();
            new_loc.extend(other_loc.clone());
            let target = self.entries.entry(new_loc.clone()).or_default();
            target.errors.extend(entry.errors);
            target.warnings.extend(entry.warnings);
            if let Some(codes) = other.stop_proceeding.get(&other_loc) {
                self.stop_proceeding
                    .entry(new_loc)
                    .or_default()
                    .extend(codes.iter().copied());
            }
        }
    }

    pub fn merge_at_root(&mut self, other: IssueLog) {
        self.merge(other, Vec::new());
    }

    /// Return a sub-log scoped under `location`, with the common prefix
    /// stripped, optionally filtered to the given error/warning codes.
    pub fn get(
        &self,
        error_codes: Option<&[u32]>,
        warning_codes: Option<&[u32]>,
        location: &[LocationSegment],
    ) -> IssueLog {
        let mut out = IssueLog::new();
        for (loc, entry) in &self.entries {
            if !loc.starts_with(location) {
                continue;
            }
            let stripped = loc[location.len()..].to_vec();
            let errors: Vec<_> = entry
                .errors
                .iter()
                .filter(|e| error_codes.is_none_or(|codes| codes.contains(&e.code())))
                .cloned()
                .collect();
            let warnings: Vec<_> = entry
                .warnings
                .iter()
                .filter(|w| warning_codes.is_none_or(|codes| codes.contains(&w.code())))
                .cloned()
                .collect();
            if !errors.is_empty() || !warnings.is_empty() {
                let e = out.entries.entry(stripped).or_default();
                e.errors.extend(errors);
                e.warnings.extend(warnings);
            }
        }
        for (loc, codes) in &self.stop_proceeding {
            if !loc.starts_with(location) {
                continue;
            }
            let stripped = loc[location.len()..].to_vec();
            let codes: Vec<_> = codes
                .iter()
                .copied()
                .filter(|c| error_codes.is_none_or(|ec| ec.contains(c)))
                .collect();
            if !codes.is_empty() {
                out.stop_proceeding.entry(stripped).or_default().extend(codes);
            }
        }
        out
    }

    /// Remove and return errors matching `codes` at exactly `location`,
    /// pruning any now-empty `stop_proceeding` entries.
    pub fn pop_errors(&mut self, codes: &[u32], location: &[LocationSegment]) -> IssueLog {
        let location = location.to_vec();
        let Some(entry) = self.entries.get_mut(&location) else {
            return IssueLog::new();
        };

        let (popped, kept): (Vec<_>, Vec<_>) =
            entry.errors.drain(..).partition(|e| codes.contains(&e.code()));
        entry.errors = kept;

        let mut out = IssueLog::new();
        if !popped.is_empty() {
            out.entries.entry(location.clone()).or_default().errors = popped;
        }

        if let Some(stop_codes) = self.stop_proceeding.get_mut(&location) {
            stop_codes.retain(|c| !codes.contains(c));
            if stop_codes.is_empty() {
                self.stop_proceeding.remove(&location);
            }
        }

        if self.entries.get(&location).is_some_and(|e| e.errors.is_empty() && e.warnings.is_empty())
        {
            self.entries.remove(&location);
        }

        out
    }

    /// True iff no `stop_proceeding` entry lies on any prefix of any given
    /// location. With no arguments, checks the root.
    pub fn can_proceed(&self, locations: &[&[LocationSegment]]) -> bool {
        let locations: Vec<&[LocationSegment]> = if locations.is_empty() {
            vec![&[]]
        } else {
            locations.to_vec()
        };
        for location in locations {
            for i in 0..=location.len() {
                if self.stop_proceeding.contains_key(&location[..i].to_vec()) {
                    return false;
                }
            }
        }
        true
    }

    pub fn has_errors(&self, locations: &[&[LocationSegment]]) -> bool {
        let locations: Vec<&[LocationSegment]> = if locations.is_empty() {
            vec![&[]]
        } else {
            locations.to_vec()
        };
        for location in locations {
            for issue_loc in self.entries.keys() {
                if issue_loc.starts_with(location) && !self.entries[issue_loc].errors.is_empty() {
                    return true;
                }
            }
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|e| e.errors.is_empty() && e.warnings.is_empty())
    }

    /// Nested rendering mirroring the data tree:
    /// `{attr: {sub: {_errors: [{code, error?}]}}}`.
    pub fn to_dict(&self, with_message: bool) -> Json {
        let mut output = serde_json::Map::new();
        for (location, entry) in &self.entries {
            insert_nested(&mut output, location, &entry.errors, &entry.warnings, with_message);
        }
        Json::Object(output)
    }

    /// Flat rendering keyed by dotted paths (`""` for the root).
    pub fn flatten(&self, with_message: bool) -> Json {
        let mut errors = serde_json::Map::new();
        let mut warnings = serde_json::Map::new();
        for (location, entry) in &self.entries {
            let key = location
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(".");
            if !entry.errors.is_empty() {
                errors.insert(
                    key.clone(),
                    Json::Array(entry.errors.iter().map(|e| issue_json(e, with_message)).collect()),
                );
            }
            if !entry.warnings.is_empty() {
                warnings.insert(
                    key,
                    Json::Array(entry.warnings.iter().map(|w| issue_json(w, with_message)).collect()),
                );
            }
        }
        serde_json::json!({ "errors": errors, "warnings": warnings })
    }
}

trait ScimIssue: fmt::Display {
    fn code(&self) -> u32;
}

impl ScimIssue for ValidationError {
    fn code(&self) -> u32 {
        ValidationError::code(self)
    }
}

impl ScimIssue for ValidationWarning {
    fn code(&self) -> u32 {
        ValidationWarning::code(self)
    }
}

fn issue_json(issue: &dyn ScimIssue, with_message: bool) -> Json {
    let mut m = serde_json::Map::new();
    m.insert("code".to_string(), Json::from(issue.code()));
    if with_message {
        m.insert("error".to_string(), Json::String(issue.to_string()));
    }
    Json::Object(m)
}

fn insert_nested(
    output: &mut serde_json::Map<String, Json>,
    location: &[LocationSegment],
    errors: &[ValidationError],
    warnings: &[ValidationWarning],
    with_message: bool,
) {
    if location.is_empty() {
        if !errors.is_empty() {
            output.insert(
                "_errors".to_string(),
                Json::Array(errors.iter().map(|e| issue_json(e, with_message)).collect()),
            );
        }
        if !warnings.is_empty() {
            output.insert(
                "_warnings".to_string(),
                Json::Array(warnings.iter().map(|w| issue_json(w, with_message)).collect()),
            );
        }
        return;
    }

    let mut current = output;
    for (i, part) in location.iter().enumerate() {
        let key = part.to_string();
        let entry = current
            .entry(key)
            .or_insert_with(|| Json::Object(serde_json::Map::new()));
        let Json::Object(map) = entry else {
            unreachable!("issue log location collided with a non-object slot");
        };
        if i == location.len() - 1 {
            if !errors.is_empty() {
                map.insert(
                    "_errors".to_string(),
                    Json::Array(errors.iter().map(|e| issue_json(e, with_message)).collect()),
                );
            }
            if !warnings.is_empty() {
                map.insert(
                    "_warnings".to_string(),
                    Json::Array(warnings.iter().map(|w| issue_json(w, with_message)).collect()),
                );
            }
        }
        current = map;
    }
}

/// Errors surfaced by API misuse rather than by bad input data: deserializing
/// a filter/patch-path string that failed its own `validate`, or registering
/// a duplicate schema/operator/URI.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// A filter expression failed structural validation.
    #[error("invalid filter expression: {0}")]
    InvalidFilter(String),

    /// A patch path expression failed structural validation.
    #[error("invalid patch path expression: {0}")]
    InvalidPatchPath(String),

    /// An attribute reference string is not a legal `AttrRep`/`BoundedAttrRep`.
    #[error("invalid attribute reference: {0}")]
    InvalidAttrRep(String),

    /// A schema with this URI is already registered.
    #[error("schema already registered: {0}")]
    DuplicateSchema(String),

    /// An operator keyword is already registered.
    #[error("operator already registered: {0}")]
    DuplicateOperator(String),

    /// An extension schema was attached to more than one resource schema.
    #[error("extension '{0}' is already attached to a resource schema")]
    ExtensionAlreadyAttached(String),
}

pub type ScimResult<T> = Result<T, ScimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_error_sets_stop_proceeding_only_when_not_proceeding() {
        let mut log = IssueLog::new();
        log.add_error(ValidationError::Missing, false, loc(["userName"]));
        log.add_error(ValidationError::BadValueContent, true, loc(["active"]));

        assert!(!log.can_proceed(&[&loc(["userName"])]));
        assert!(log.can_proceed(&[&loc(["active"])]));
    }

    #[test]
    fn can_proceed_checks_all_prefixes() {
        let mut log = IssueLog::new();
        log.add_error(ValidationError::BadType { expected: "complex".into() }, false, loc(["name"]));

        assert!(!log.can_proceed(&[&loc(["name", "givenName"])]));
        assert!(log.can_proceed(&[&loc(["emails"])]));
    }

    #[test]
    fn merge_rebase_locations_under_prefix() {
        let mut inner = IssueLog::new();
        inner.add_error(ValidationError::Missing, false, loc(["value"]));

        let mut outer = IssueLog::new();
        outer.merge(inner, loc(["emails", 0usize]));

        assert!(!outer.can_proceed(&[&loc(["emails", 0usize, "value"])]));
    }

    #[test]
    fn get_scopes_and_strips_prefix() {
        let mut log = IssueLog::new();
        log.add_error(ValidationError::Missing, false, loc(["name", "givenName"]));
        log.add_error(ValidationError::BadValueContent, true, loc(["userName"]));

        let scoped = log.get(None, None, &loc(["name"]));
        assert!(scoped.has_errors(&[&loc(["givenName"])]));
        assert!(!scoped.has_errors(&[&loc(["userName"])]));
    }

    #[test]
    fn pop_errors_removes_matching_and_prunes_stop_proceeding() {
        let mut log = IssueLog::new();
        log.add_error(ValidationError::MissingMainSchema, true, Vec::new());

        let popped = log.pop_errors(&[12], &[]);
        assert!(popped.has_errors(&[]));
        assert!(!log.has_errors(&[]));
    }

    #[test]
    fn flatten_uses_dotted_paths() {
        let mut log = IssueLog::new();
        log.add_error(ValidationError::Missing, false, loc(["name", "givenName"]));
        let flat = log.flatten(false);
        assert!(flat["errors"].get("name.givenName").is_some());
    }
}
