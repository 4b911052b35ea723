//! The patch path language and patch operation engine (RFC 7644 §3.5.2).

pub mod op;
pub mod path;

pub use op::{patch_op_schema, validate_operation, Op, PatchOperation};
pub use path::PatchPath;
