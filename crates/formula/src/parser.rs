//! Parser for runtime formulas.
//!
//! This parser implements a recursive descent parser for the formula language used by the
//! editor: literals, function calls, binary operators and bracketed groups.
//!
//! # Grammar
//!
//! The parser implements the following grammar with operator precedence from lowest to highest:
//!
//! ```text
//! expression     → logical_or
//! logical_or     → logical_and ( "||" logical_and )*
//! logical_and    → equality ( "&&" equality )*
//! equality       → comparison ( ("=" | "!=") comparison )*
//! comparison     → additive ( (">=" | "<=" | ">" | "<") additive )*
//! additive       → multiplicative ( ("+" | "-") multiplicative )*
//! multiplicative → atom ( ("*" | "/") atom )*
//! atom           → literal | function_call | "(" expression ")"
//! function_call  → identifier "(" ( expression ( "," expression )* )? ")"
//! literal        → string | number | boolean
//! number         → "-"? digits ( "." digits )?
//! ```
//!
//! Strings may use single or double quotes. Inside a string the quote character and the
//! backslash are escaped with a backslash; `\n`, `\r` and `\t` are also recognised.
//!
//! # Examples
//!
//! ```rust
//! use runtime_formula::parser::parse_formula;
//! use runtime_formula::ast::{Expr, BinaryOperator};
//!
//! let expr = parse_formula("2 + 3").unwrap();
//! assert!(matches!(expr, Expr::BinaryOp { op: BinaryOperator::Add, .. }));
//!
//! let expr = parse_formula("concat('Hello,', \" World!\")").unwrap();
//! assert!(matches!(expr, Expr::FunctionCall { .. }));
//! ```

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, multispace0};
use nom::combinator::{cut, value};
use nom::error::{ErrorKind, make_error};
use nom::multi::separated_list0;
use nom::{Finish, IResult, Parser};

use crate::ast::{BinaryOperator, Expr};
use crate::error::{ParseErrorInfo, parse_error};

/// Parse a full expression from the provided input string.
///
/// This is the main entry point for parsing formulas. It ensures that the entire input is
/// consumed (modulo trailing whitespace) and returns an error if there is unparsed content
/// remaining.
///
/// # Examples
///
/// ```
/// use runtime_formula::parser::parse_expression;
/// use runtime_formula::ast::Expr;
///
/// let (rest, expr) = parse_expression("42").unwrap();
/// assert!(rest.trim().is_empty());
/// assert_eq!(expr, Expr::Integer(42));
/// ```
///
/// # Errors
///
/// Returns a [`ParseErrorInfo`] with a user-friendly error message if:
/// - The input contains invalid syntax
/// - There is unexpected content after the expression
/// - The expression is incomplete, e.g. an unbalanced bracket
pub fn parse_expression(input: &str) -> IResult<&str, Expr, ParseErrorInfo<&str>> {
    match expression(input).finish() {
        Ok((remaining, expr)) => {
            if remaining.trim_start().is_empty() {
                Ok((remaining, expr))
            } else {
                Err(nom::Err::Error(parse_error(
                    remaining,
                    "unexpected content after expression",
                )))
            }
        }
        Err(nom_err) => Err(nom::Err::Error(convert_nom_error(input, nom_err))),
    }
}

/// Parse a formula into an owned tree, detaching the error from the input.
pub fn parse_formula(input: &str) -> Result<Expr, ParseErrorInfo<String>> {
    parse_expression(input)
        .finish()
        .map(|(_, expr)| expr)
        .map_err(ParseErrorInfo::into_owned)
}

/// Convert a nom error to our custom ParseErrorInfo with better messages.
fn convert_nom_error<'a>(
    original_input: &'a str,
    err: nom::error::Error<&'a str>,
) -> ParseErrorInfo<&'a str> {
    let position = original_input.len() - err.input.len();
    let context = if position > 0 {
        let start = floor_char_boundary(original_input, position.saturating_sub(10));
        let end = floor_char_boundary(original_input, (position + 10).min(original_input.len()));
        format!(
            "near position {}: '...{}...'",
            position,
            &original_input[start..end]
        )
    } else {
        "at start of input".to_string()
    };

    let message = match err.code {
        ErrorKind::Digit => format!("expected a number {}", context),
        ErrorKind::Alpha => format!("expected a function name {}", context),
        ErrorKind::Tag => format!("unexpected token {}", context),
        ErrorKind::Char => {
            let found = match err.input.chars().next() {
                Some(c) => format!("found '{}' ", c),
                None => String::from("found end of input "),
            };
            format!("unexpected character {}{}", found, context)
        }
        ErrorKind::Eof => format!("unexpected end of input {}", context),
        ErrorKind::EscapedTransform => format!("unterminated string literal {}", context),
        _ => format!("parse error {:?} {}", err.code, context),
    };

    ParseErrorInfo::new(err.input, message, err.code)
}

fn floor_char_boundary(input: &str, mut index: usize) -> usize {
    while index > 0 && !input.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn expression(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    logical_or(input)
}

/// Parse one left-associative precedence level.
///
/// `operators` are tried in order, so longer symbols sharing a prefix with shorter ones
/// (`>=` and `>`) must come first.
fn binary_level<'a>(
    input: &'a str,
    operators: &[BinaryOperator],
    operand: fn(&str) -> IResult<&str, Expr>,
) -> IResult<&'a str, Expr> {
    let (mut input, mut expr) = operand(input)?;

    'next: loop {
        let (after_ws, _) = multispace0(input)?;
        for op in operators {
            let Ok((after_op, _)) =
                tag::<_, _, nom::error::Error<&str>>(op.symbol()).parse(after_ws)
            else {
                continue;
            };

            let (after_rhs, rhs) = operand(after_op)?;
            expr = Expr::BinaryOp {
                op: *op,
                left: Box::new(expr),
                right: Box::new(rhs),
            };
            input = after_rhs;
            continue 'next;
        }

        return Ok((input, expr));
    }
}

fn logical_or(input: &str) -> IResult<&str, Expr> {
    binary_level(input, &[BinaryOperator::Or], logical_and)
}

fn logical_and(input: &str) -> IResult<&str, Expr> {
    binary_level(input, &[BinaryOperator::And], equality)
}

fn equality(input: &str) -> IResult<&str, Expr> {
    binary_level(
        input,
        &[BinaryOperator::NotEqual, BinaryOperator::Equal],
        comparison,
    )
}

fn comparison(input: &str) -> IResult<&str, Expr> {
    binary_level(
        input,
        &[
            BinaryOperator::GreaterThanOrEqual,
            BinaryOperator::LessThanOrEqual,
            BinaryOperator::GreaterThan,
            BinaryOperator::LessThan,
        ],
        additive,
    )
}

fn additive(input: &str) -> IResult<&str, Expr> {
    binary_level(
        input,
        &[BinaryOperator::Add, BinaryOperator::Minus],
        multiplicative,
    )
}

fn multiplicative(input: &str) -> IResult<&str, Expr> {
    binary_level(
        input,
        &[BinaryOperator::Multiply, BinaryOperator::Divide],
        atom,
    )
}

fn atom(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    alt((
        string_literal,
        number_literal,
        boolean_literal,
        group,
        function_call,
    ))
    .parse(input)
}

fn group(input: &str) -> IResult<&str, Expr> {
    let (input, _) = char('(')(input)?;
    let (input, expr) = cut(expression).parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = cut(char(')')).parse(input)?;
    Ok((input, Expr::Group(Box::new(expr))))
}

fn function_call(input: &str) -> IResult<&str, Expr> {
    let (rest, name) = identifier(input)?;
    let (rest, _) = multispace0(rest)?;
    if !rest.starts_with('(') {
        return Err(nom::Err::Error(make_error(rest, ErrorKind::Char)));
    }
    let (rest, args) = argument_list(rest)?;
    Ok((rest, Expr::FunctionCall { name, args }))
}

fn argument_list(input: &str) -> IResult<&str, Vec<Expr>> {
    let (input, _) = char('(')(input)?;
    let (input, _) = multispace0(input)?;

    if input.starts_with(')') {
        let (input, _) = char(')')(input)?;
        return Ok((input, Vec::new()));
    }

    let (input, args) = separated_list0(comma_separator, expression).parse(input)?;

    let (input, _) = multispace0(input)?;
    let (input, _) = cut(char(')')).parse(input)?;
    Ok((input, args))
}

fn comma_separator(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    let (input, _) = char(',')(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

/// Parse a single or double quoted string literal.
///
/// Once the opening quote is seen the literal is committed: a missing closing quote is a
/// failure rather than a backtrackable error.
fn string_literal(input: &str) -> IResult<&str, Expr> {
    let Some(quote) = input.chars().next().filter(|c| *c == '\'' || *c == '"') else {
        return Err(nom::Err::Error(make_error(input, ErrorKind::Char)));
    };

    let body = &input[1..];
    let mut out = String::new();
    let mut chars = body.char_indices();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((&body[idx + 1..], Expr::String(out))),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, 't')) => out.push('\t'),
                Some((_, escaped @ ('\\' | '\'' | '"'))) => out.push(escaped),
                // Unknown escapes are kept verbatim
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            },
            c => out.push(c),
        }
    }

    Err(nom::Err::Failure(make_error(
        input,
        ErrorKind::EscapedTransform,
    )))
}

/// Parse a sequence of ASCII digits and return the byte position after the last digit.
///
/// Returns `None` if no digits are found.
fn parse_digit_sequence(input: &str) -> Option<usize> {
    let end = input
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(input.len(), |(idx, _)| idx);

    (end > 0).then_some(end)
}

/// Parse a number literal (integer or decimal), with an optional leading minus sign.
///
/// The sign is only part of the literal where an operand is expected, so `5-2` still parses
/// as a subtraction.
fn number_literal(input: &str) -> IResult<&str, Expr> {
    let sign_len = usize::from(input.starts_with('-'));

    let int_len = parse_digit_sequence(&input[sign_len..])
        .ok_or_else(|| nom::Err::Error(make_error(input, ErrorKind::Digit)))?;

    let mut end = sign_len + int_len;
    let mut has_fraction = false;
    if let Some(frac) = input[end..].strip_prefix('.') {
        if let Some(frac_len) = parse_digit_sequence(frac) {
            end += 1 + frac_len;
            has_fraction = true;
        }
    }

    let rest = &input[end..];
    if rest.chars().next().is_some_and(is_ident_continue) {
        return Err(nom::Err::Error(make_error(rest, ErrorKind::Alpha)));
    }

    let literal = &input[..end];
    let number_error = |_: std::num::ParseFloatError| {
        nom::Err::Failure(nom::error::Error::new(input, ErrorKind::Digit))
    };
    if has_fraction {
        let value: f64 = literal.parse().map_err(number_error)?;
        return Ok((rest, Expr::Decimal(value)));
    }

    // Integers that overflow i64 fall back to a decimal
    match literal.parse::<i64>() {
        Ok(value) => Ok((rest, Expr::Integer(value))),
        Err(_) => {
            let value: f64 = literal.parse().map_err(number_error)?;
            Ok((rest, Expr::Decimal(value)))
        }
    }
}

fn boolean_literal(input: &str) -> IResult<&str, Expr> {
    alt((
        value(Expr::Boolean(true), keyword("true")),
        value(Expr::Boolean(false), keyword("false")),
    ))
    .parse(input)
}

fn keyword<'a>(keyword: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, ()> {
    move |input: &'a str| {
        let (rest, _) = tag(keyword).parse(input)?;
        let (after_ws, _) = multispace0(rest)?;
        // `true(` is a function call, not a literal
        if rest.chars().next().is_some_and(is_ident_continue) || after_ws.starts_with('(') {
            Err(nom::Err::Error(make_error(rest, ErrorKind::Alpha)))
        } else {
            Ok((rest, ()))
        }
    }
}

fn identifier(input: &str) -> IResult<&str, String> {
    let mut chars = input.char_indices();
    let Some((_, first)) = chars.next() else {
        return Err(nom::Err::Error(make_error(input, ErrorKind::Alpha)));
    };

    if !is_ident_start(first) {
        return Err(nom::Err::Error(make_error(input, ErrorKind::Alpha)));
    }

    let end = chars
        .find(|(_, ch)| !is_ident_continue(*ch))
        .map_or(input.len(), |(idx, _)| idx);

    Ok((&input[end..], input[..end].to_string()))
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_handles_empty_and_escapes() {
        assert_eq!(
            string_literal("''").unwrap(),
            ("", Expr::String(String::new()))
        );
        assert_eq!(
            string_literal(r#""a\"b" rest"#).unwrap(),
            (" rest", Expr::String("a\"b".into()))
        );
        assert!(matches!(
            string_literal("'open"),
            Err(nom::Err::Failure(_))
        ));
    }

    #[test]
    fn number_literal_accepts_signs_and_fractions() {
        assert_eq!(number_literal("-12").unwrap(), ("", Expr::Integer(-12)));
        assert_eq!(number_literal("3.25)").unwrap(), (")", Expr::Decimal(3.25)));
        assert!(number_literal("12abc").is_err());
    }

    #[test]
    fn identifier_stops_at_non_word_characters() {
        assert_eq!(
            identifier("is_even(2)").unwrap(),
            ("(2)", "is_even".to_string())
        );
        assert!(identifier("1abc").is_err());
    }
}
