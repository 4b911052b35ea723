//! The filter language: tokenize/parse SCIM filter expressions, build an
//! operator AST, and match it against a data container.
//!
//! Grounded on `data/operator.py` (matching semantics), `filter/filter.py`
//! and `data/utils.py` (lexical string-literal protection), following
//! RFC 7644 §3.4.2.2.

pub mod ast;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod registry;
pub mod serialize;

pub use ast::{BinaryOp, Filter, Literal};
pub use matcher::MatchTarget;
