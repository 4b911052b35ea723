//! The attribute model and schema catalog (spec.md §4.D).
//!
//! - [`attr`] — the `Attribute` tagged union and its per-type validation.
//! - [`presence`] — request/response presence semantics (`validate_presence`).
//! - [`bounded_attrs`] — the two-level attribute index a `Schema` is built on.
//! - [`schema`] — `Schema`, `ResourceSchema`, `Extension`.
//! - [`catalog`] — the caller-owned registry of schemas, extensions, and
//!   filter operators.

pub mod attr;
pub mod bounded_attrs;
pub mod catalog;
pub mod presence;
pub mod schema;

pub use attr::{AttrHeader, Attribute, Mutability, Returned, Uniqueness};
pub use bounded_attrs::BoundedAttrs;
pub use catalog::Catalog;
pub use presence::{validate_presence, AttrPresenceConfig, DataDirection, DataInclusivity};
pub use schema::{Extension, ResourceSchema, Schema};
