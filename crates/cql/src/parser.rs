//! A `nom`-based parser for the CQL-flavoured expression grammar.
use crate::ast::{ComparisonOp, Expression, PathSegment};
use crate::error::CqlError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{alpha1, char, multispace0, u64 as nom_u64},
    combinator::{map, opt, recognize},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
};
use serde_json::{Value, json};

// --- Public entry points ---

/// Parses raw expression text, consuming all input.
pub fn parse_cql(input: &str) -> Result<Expression, CqlError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(CqlError::Parse {
            input: input.to_string(),
            message: format!("parser did not consume all input, remainder: '{rem}'"),
        }),
        Err(e) => Err(CqlError::Parse {
            input: input.to_string(),
            message: e.to_string(),
        }),
    }
}

/// The expression-delegate contract: `${...}` compiles the wrapped text as an
/// expression; anything else is a string literal.
pub fn parse_expression(text: &str) -> Result<Expression, CqlError> {
    let trimmed = text.trim();
    match trimmed
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(inner) => parse_cql(inner),
        None => Ok(Expression::Literal(Value::String(trimmed.to_string()))),
    }
}

/// Parses a filter predicate. Filters are written as bare expression text,
/// with an optional `${...}` wrapper tolerated for symmetry with content.
pub fn parse_filter(text: &str) -> Result<Expression, CqlError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed);
    parse_cql(inner)
}

// --- Combinators ---

fn expression(input: &str) -> IResult<&str, Expression> {
    let (input, left) = operand(input)?;
    let (input, tail) = opt(pair(ws(comparison_op), operand)).parse(input)?;
    let expr = match tail {
        Some((op, right)) => Expression::Comparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        None => left,
    };
    Ok((input, expr))
}

fn operand(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(literal, Expression::Literal),
        function_call, // must come before property to parse `func()` not `func`
        property,
    )))
    .parse(input)
}

fn comparison_op(input: &str) -> IResult<&str, ComparisonOp> {
    alt((
        map(tag("<>"), |_| ComparisonOp::Ne),
        map(tag("<="), |_| ComparisonOp::Le),
        map(tag(">="), |_| ComparisonOp::Ge),
        map(tag("="), |_| ComparisonOp::Eq),
        map(tag("<"), |_| ComparisonOp::Lt),
        map(tag(">"), |_| ComparisonOp::Gt),
    ))
    .parse(input)
}

// --- Literals ---

fn boolean(input: &str) -> IResult<&str, Value> {
    alt((
        map(tag("true"), |_| json!(true)),
        map(tag("false"), |_| json!(false)),
    ))
    .parse(input)
}

fn null(input: &str) -> IResult<&str, Value> {
    map(tag("null"), |_| json!(null)).parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Value> {
    map(delimited(char('\''), is_not("'"), char('\'')), |s: &str| {
        json!(s)
    })
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    map(double, Value::from).parse(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((null, boolean, number, string_literal)).parse(input)
}

// --- Property paths ---

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Property keys may carry a namespace prefix, e.g. `gml:name`.
fn property_key(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == ':'),
    ))
    .parse(input)
}

fn key_segment(input: &str) -> IResult<&str, PathSegment> {
    map(preceded(char('.'), property_key), |s| {
        PathSegment::Key(s.to_string())
    })
    .parse(input)
}

fn index_segment(input: &str) -> IResult<&str, PathSegment> {
    map(delimited(char('['), nom_u64, char(']')), |i| {
        PathSegment::Index(i as usize)
    })
    .parse(input)
}

fn path_segment(input: &str) -> IResult<&str, PathSegment> {
    alt((key_segment, index_segment)).parse(input)
}

fn property(input: &str) -> IResult<&str, Expression> {
    alt((
        map(tag("."), |_| Expression::Property(Vec::new())),
        map(
            pair(property_key, many0(path_segment)),
            |(first, mut rest)| {
                let mut segments = vec![PathSegment::Key(first.to_string())];
                segments.append(&mut rest);
                Expression::Property(segments)
            },
        ),
    ))
    .parse(input)
}

// --- Function calls ---

fn function_call(input: &str) -> IResult<&str, Expression> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        char(')'),
    )
    .parse(input)?;

    Ok((
        input,
        Expression::Function {
            name: name.to_string(),
            args,
        },
    ))
}

/// Wraps a parser so it consumes surrounding whitespace.
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_path() {
        let expr = parse_cql("street.name").unwrap();
        assert_eq!(
            expr,
            Expression::Property(vec![
                PathSegment::Key("street".to_string()),
                PathSegment::Key("name".to_string()),
            ])
        );
    }

    #[test]
    fn parses_a_prefixed_path_with_index() {
        let expr = parse_cql("gml:members[2].id").unwrap();
        assert_eq!(
            expr,
            Expression::Property(vec![
                PathSegment::Key("gml:members".to_string()),
                PathSegment::Index(2),
                PathSegment::Key("id".to_string()),
            ])
        );
    }

    #[test]
    fn parses_the_current_record_selector() {
        assert_eq!(parse_cql(".").unwrap(), Expression::Property(Vec::new()));
    }

    #[test]
    fn parses_a_function_call_with_mixed_args() {
        let expr = parse_cql("strConcat('id-', code)").unwrap();
        match expr {
            Expression::Function { name, args } => {
                assert_eq!(name, "strConcat");
                assert_eq!(args.len(), 2);
                assert_eq!(args[0], Expression::Literal(json!("id-")));
            }
            other => panic!("expected a function call, got {other:?}"),
        }
    }

    #[test]
    fn parses_every_comparison_operator() {
        for (text, op) in [
            ("a = 1", ComparisonOp::Eq),
            ("a <> 1", ComparisonOp::Ne),
            ("a < 1", ComparisonOp::Lt),
            ("a <= 1", ComparisonOp::Le),
            ("a > 1", ComparisonOp::Gt),
            ("a >= 1", ComparisonOp::Ge),
        ] {
            match parse_cql(text).unwrap() {
                Expression::Comparison { op: parsed, .. } => assert_eq!(parsed, op),
                other => panic!("expected a comparison for '{text}', got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse_cql("name ???").unwrap_err();
        assert!(matches!(err, CqlError::Parse { .. }));
    }

    #[test]
    fn boolean_and_number_literals() {
        assert_eq!(parse_cql("true").unwrap(), Expression::Literal(json!(true)));
        assert_eq!(parse_cql("42").unwrap(), Expression::Literal(json!(42.0)));
    }
}
