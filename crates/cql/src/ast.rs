//! Abstract syntax tree for compiled template expressions.
use serde_json::Value;

/// A compiled expression, ready for per-record evaluation by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value: plain template text, or a quoted/numeric literal.
    Literal(Value),
    /// A property lookup against the current record. An empty path selects
    /// the record itself.
    Property(Vec<PathSegment>),
    /// A call to a named function.
    Function { name: String, args: Vec<Expression> },
    /// A binary comparison, as used by `$filter` predicates.
    Comparison {
        left: Box<Expression>,
        op: ComparisonOp,
        right: Box<Expression>,
    },
}

impl Expression {
    /// Returns the value this expression resolves to without any record
    /// context, or `None` if it needs one. Vendor options are resolved
    /// through this at compile time.
    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            Expression::Literal(value) => Some(value),
            _ => None,
        }
    }
}

/// One step in a property path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// An object key, optionally namespace-qualified (e.g. `gml:name`).
    Key(String),
    /// An array index (e.g. `[0]`).
    Index(usize),
}

/// Comparison operators accepted in filter predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}
