use geotempl_cql::CqlError;
use thiserror::Error;

/// Errors raised while compiling a template into a builder tree.
///
/// All variants abort the whole compilation; a half-built tree has no
/// rendering semantics, so there is no partial recovery.
#[derive(Error, Debug)]
pub enum TemplateCompileError {
    #[error("malformed directive: {0}")]
    MalformedDirective(String),

    #[error("malformed expression: {0}")]
    MalformedExpression(#[from] CqlError),

    #[error("invalid node configuration: {0}")]
    InvalidNodeConfiguration(String),

    #[error("template nesting exceeds {0} levels")]
    ExcessiveNesting(usize),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}
