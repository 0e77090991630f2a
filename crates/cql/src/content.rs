//! Compilation of attribute content strings.
//!
//! Content text mixes static fragments with `${...}` expression markers, and
//! may carry a leading `$filter{...}` block that guards the attribute's
//! presence per record.
use crate::ast::Expression;
use crate::error::CqlError;
use crate::parser::parse_cql;

const EXPR_START: &str = "${";
const FILTER_START: &str = "$filter{";

/// One piece of interpolated content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Static(String),
    Expression(Expression),
}

/// Compiled attribute content.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledContent {
    /// Plain text, rendered unchanged for every record.
    Literal(String),
    /// A single `${...}` expression spanning the whole value.
    Expression(Expression),
    /// Static fragments interleaved with expressions.
    Interpolated(Vec<ContentPart>),
}

/// Compiles a content string. Text without any `${` marker stays literal.
pub fn parse_content(text: &str) -> Result<CompiledContent, CqlError> {
    if !text.contains(EXPR_START) {
        return Ok(CompiledContent::Literal(text.to_string()));
    }
    if let Some(inner) = text
        .strip_prefix(EXPR_START)
        .and_then(|rest| rest.strip_suffix('}'))
        && !inner.contains(EXPR_START)
        && !inner.contains('}')
    {
        return Ok(CompiledContent::Expression(parse_cql(inner)?));
    }

    let mut parts = Vec::new();
    let mut last_end = 0;
    for (start, _) in text.match_indices(EXPR_START) {
        if start < last_end {
            continue;
        }
        if start > last_end {
            parts.push(ContentPart::Static(text[last_end..start].to_string()));
        }
        let end = text[start..]
            .find('}')
            .ok_or_else(|| CqlError::UnclosedExpression(text.to_string()))?;
        let inner = text[start + EXPR_START.len()..start + end].trim();
        parts.push(ContentPart::Expression(parse_cql(inner)?));
        last_end = start + end + 1;
    }
    if last_end < text.len() {
        parts.push(ContentPart::Static(text[last_end..].to_string()));
    }
    Ok(CompiledContent::Interpolated(parts))
}

/// Splits an optional `$filter{...}` block off a content string and compiles
/// both halves. The filter may be followed by a comma before the content,
/// e.g. `"$filter{kind = 'road'}, ${name}"`.
pub fn parse_content_and_filter(
    text: &str,
) -> Result<(CompiledContent, Option<Expression>), CqlError> {
    let Some(start) = text.find(FILTER_START) else {
        return Ok((parse_content(text)?, None));
    };
    let after = &text[start + FILTER_START.len()..];
    let end = after
        .find('}')
        .ok_or_else(|| CqlError::UnclosedFilter(text.to_string()))?;
    let filter = parse_cql(after[..end].trim())?;

    let before = &text[..start];
    let mut rest = after[end + 1..].trim_start();
    if let Some(stripped) = rest.strip_prefix(',') {
        rest = stripped.trim_start();
    }
    let content = format!("{before}{rest}");
    Ok((parse_content(content.trim())?, Some(filter)))
}
