//! A small, CQL-flavoured expression language for feature templates.
//!
//! This crate is the expression delegate of the template compiler: it turns
//! the text found in template fields (`$source` values, `$filter` predicates,
//! attribute content with embedded `${...}` markers) into structured,
//! evaluable expressions. Plain text with no expression syntax compiles to a
//! literal-valued expression, so callers never need to special-case it.

pub mod ast;
pub mod content;
pub mod error;
mod parser;

pub use ast::{ComparisonOp, Expression, PathSegment};
pub use content::{CompiledContent, ContentPart, parse_content, parse_content_and_filter};
pub use error::CqlError;
pub use parser::{parse_cql, parse_expression, parse_filter};
