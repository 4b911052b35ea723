//! # scim-engine
//!
//! A SCIM 2.0 (RFC 7643/7644) protocol engine: the attribute model, schema
//! catalog, filter expression language, and patch path/operation semantics
//! that a SCIM service provider is built on top of. This crate is
//! deliberately transport- and storage-agnostic — no HTTP server, no
//! resource provider trait, no persistence layer. It answers "is this JSON
//! a valid SCIM resource under this schema", "does this resource match this
//! filter", and "what does this PATCH operation do to this resource",
//! nothing more.
//!
//! ## Modules
//!
//! - [`error`] — the accumulate-don't-abort [`error::IssueLog`] and the
//!   `thiserror`-derived [`error::ScimError`] for programmer misuse.
//! - [`attr_rep`] — `AttrRep`/`BoundedAttrRep`: parsed attribute references,
//!   with or without a schema URI prefix.
//! - [`container`] — [`container::Container`]/[`container::Value`]: the
//!   schema-agnostic JSON-like data model, with SCIM's cross-representation
//!   equality rules (`scim_eq`/`scim_subset_of`).
//! - [`schema`] — the [`schema::Attribute`] tagged union, presence rules,
//!   [`schema::Schema`]/[`schema::ResourceSchema`]/[`schema::Extension`],
//!   and the caller-owned [`schema::Catalog`].
//! - [`filter`] — the SCIM filter grammar (§3.4.2.2): lexer, parser,
//!   operator registry, and the matcher that evaluates a parsed filter
//!   against a [`container::Container`].
//! - [`patch`] — the patch path grammar (§3.5.2) and the `PatchOp`
//!   `add`/`remove`/`replace` validation rules.
//!
//! ## Quick start
//!
//! ```rust
//! use scim_engine::container::Container;
//! use scim_engine::schema::{Attribute, AttrHeader, ResourceSchema};
//! use serde_json::json;
//!
//! let schema = ResourceSchema::new(
//!     "urn:ietf:params:scim:schemas:core:2.0:User",
//!     "User",
//!     "Users",
//!     "/Users",
//! )
//! .with_attribute(Attribute::String(AttrHeader::new("userName").required(true), Default::default()));
//!
//! let data = Container::from_json(json!({
//!     "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!     "userName": "bjensen",
//! }));
//!
//! let issues = schema.schema.validate(&data, None);
//! assert!(!issues.has_errors(&[]));
//! ```

pub mod attr_rep;
pub mod container;
pub mod error;
pub mod filter;
pub mod patch;
pub mod schema;

pub use attr_rep::{AttrRep, AttrRepFactory, BoundedAttrRep, SchemaUri};
pub use container::{Container, Value};
pub use error::{IssueLog, LocationSegment, ScimError, ScimResult, ValidationError, ValidationWarning};
pub use patch::{patch_op_schema, validate_operation, Op, PatchOperation, PatchPath};
pub use schema::{AttrHeader, Attribute, Catalog, Extension, Mutability, ResourceSchema, Returned, Schema, Uniqueness};
