use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CqlError {
    #[error("expression parse error in '{input}': {message}")]
    Parse { input: String, message: String },

    #[error("unclosed ${{ expression in '{0}'")]
    UnclosedExpression(String),

    #[error("unclosed $filter{{ block in '{0}'")]
    UnclosedFilter(String),
}
