//! Root-level settings carried in the compiled tree for the renderer.
use geotempl_cql::Expression;
use serde_json::Value;

/// Vendor option controlling whether nested composite output is flattened
/// into dotted/joined property names.
pub const FLAT_OUTPUT: &str = "flatOutput";
/// Vendor option setting the property-name separator used when flattening.
pub const SEPARATOR: &str = "separator";
/// A `@context` document embedded in the option block, consulted by the
/// renderer as a fallback to the top-level encoding hint.
pub const CONTEXT: &str = "@context";

pub const DEFAULT_SEPARATOR: &str = "_";

/// A resolved vendor option value.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorOption {
    /// A value compiled through the expression delegate.
    Expression(Expression),
    /// A raw JSON document stored verbatim (e.g. an embedded `@context`).
    Json(Value),
}

/// Ordered name to resolved-value mapping, filled exactly once while the
/// root object's `$options` block is compiled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorOptions {
    options: Vec<(String, VendorOption)>,
}

impl VendorOptions {
    pub fn insert(&mut self, name: impl Into<String>, option: VendorOption) {
        let name = name.into();
        if let Some(slot) = self.options.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = option;
        } else {
            self.options.push((name, option));
        }
    }

    pub fn get(&self, name: &str) -> Option<&VendorOption> {
        self.options
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, option)| option)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VendorOption)> {
        self.options
            .iter()
            .map(|(name, option)| (name.as_str(), option))
    }

    /// The resolved `flatOutput` value; absent or non-constant resolves to
    /// `false`. String constants are coerced the way loosely-typed option
    /// blocks write them (`"true"`).
    pub fn flat_output(&self) -> bool {
        match self.get(FLAT_OUTPUT) {
            Some(VendorOption::Expression(expr)) => {
                expr.as_constant().is_some_and(constant_truthy)
            }
            _ => false,
        }
    }

    /// The resolved `separator` value, defaulting to `"_"`.
    pub fn separator(&self) -> String {
        match self.get(SEPARATOR) {
            Some(VendorOption::Expression(expr)) => expr
                .as_constant()
                .and_then(|value| value.as_str())
                .unwrap_or(DEFAULT_SEPARATOR)
                .to_string(),
            _ => DEFAULT_SEPARATOR.to_string(),
        }
    }
}

fn constant_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Ordered encoding hints on the root node (e.g. the `@context` document).
/// First occurrence of a hint wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodingHints {
    hints: Vec<(String, Value)>,
}

impl EncodingHints {
    /// Stores the hint unless one with the same name already exists.
    /// Returns whether the hint was stored.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        if self.hints.iter().any(|(n, _)| *n == name) {
            return false;
        }
        self.hints.push((name, value));
        true
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.hints
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.hints.iter().map(|(name, value)| (name.as_str(), value))
    }
}
