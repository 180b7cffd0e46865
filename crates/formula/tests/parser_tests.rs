//! Tests for parsing formulas and serialising trees back to text.

use runtime_formula::{BinaryOperator, Expr, parse_formula};

fn parse(formula: &str) -> Expr {
    parse_formula(formula).expect("formula should parse")
}

fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::FunctionCall {
        name: name.to_string(),
        args,
    }
}

fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn parses_numbers() {
    assert_eq!(parse("42"), Expr::Integer(42));
    assert_eq!(parse("-7"), Expr::Integer(-7));
    assert_eq!(parse("33.4567"), Expr::Decimal(33.4567));
    assert_eq!(parse("  12  "), Expr::Integer(12));
}

#[test]
fn parses_strings_with_either_quote() {
    assert_eq!(parse("'hello'"), Expr::String("hello".into()));
    assert_eq!(parse(r#""hello""#), Expr::String("hello".into()));
    assert_eq!(parse("''"), Expr::String(String::new()));
}

#[test]
fn parses_string_escapes() {
    assert_eq!(parse(r"'it\'s'"), Expr::String("it's".into()));
    assert_eq!(parse(r#""say \"hi\"""#), Expr::String("say \"hi\"".into()));
    assert_eq!(parse(r"'a\nb'"), Expr::String("a\nb".into()));
    assert_eq!(parse(r"'back\\slash'"), Expr::String(r"back\slash".into()));
}

#[test]
fn parses_booleans() {
    assert_eq!(parse("true"), Expr::Boolean(true));
    assert_eq!(parse("false"), Expr::Boolean(false));
}

// =============================================================================
// Calls and operators
// =============================================================================

#[test]
fn parses_function_calls() {
    assert_eq!(
        parse("concat('Hello,', ' World!')"),
        call(
            "concat",
            vec![
                Expr::String("Hello,".into()),
                Expr::String(" World!".into())
            ]
        )
    );
    assert_eq!(parse("now()"), call("now", vec![]));
    assert_eq!(
        parse("upper( get('a.b') )"),
        call("upper", vec![call("get", vec![Expr::String("a.b".into())])])
    );
}

#[test]
fn function_names_keep_their_case() {
    assert_eq!(
        parse("UPPER('a')"),
        call("UPPER", vec![Expr::String("a".into())])
    );
}

#[test]
fn addition_is_left_associative() {
    assert_eq!(
        parse("1 + 2 + 3"),
        binary(
            BinaryOperator::Add,
            binary(BinaryOperator::Add, Expr::Integer(1), Expr::Integer(2)),
            Expr::Integer(3)
        )
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
        parse("1 + 2 * 3"),
        binary(
            BinaryOperator::Add,
            Expr::Integer(1),
            binary(BinaryOperator::Multiply, Expr::Integer(2), Expr::Integer(3))
        )
    );
}

#[test]
fn logical_operators_have_lowest_precedence() {
    assert_eq!(
        parse("1 < 2 && 3 >= 3 || false"),
        binary(
            BinaryOperator::Or,
            binary(
                BinaryOperator::And,
                binary(BinaryOperator::LessThan, Expr::Integer(1), Expr::Integer(2)),
                binary(
                    BinaryOperator::GreaterThanOrEqual,
                    Expr::Integer(3),
                    Expr::Integer(3)
                )
            ),
            Expr::Boolean(false)
        )
    );
}

#[test]
fn groups_are_kept_in_the_tree() {
    assert_eq!(
        parse("(1 + 2) * 3"),
        binary(
            BinaryOperator::Multiply,
            Expr::Group(Box::new(binary(
                BinaryOperator::Add,
                Expr::Integer(1),
                Expr::Integer(2)
            ))),
            Expr::Integer(3)
        )
    );
}

#[test]
fn minus_without_space_is_subtraction() {
    assert_eq!(
        parse("5-2"),
        binary(BinaryOperator::Minus, Expr::Integer(5), Expr::Integer(2))
    );
    assert_eq!(
        parse("5 - -2"),
        binary(BinaryOperator::Minus, Expr::Integer(5), Expr::Integer(-2))
    );
}

#[test]
fn not_equal_is_not_read_as_equal() {
    assert_eq!(
        parse("1 != 2"),
        binary(BinaryOperator::NotEqual, Expr::Integer(1), Expr::Integer(2))
    );
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn rejects_malformed_formulas() {
    for formula in [
        "",
        "concat('a'",
        "(1 + 2",
        "1 +",
        "'unterminated",
        "2 3",
        "bare_identifier",
        "upper('a'))",
    ] {
        assert!(
            parse_formula(formula).is_err(),
            "expected `{formula}` to be rejected"
        );
    }
}

#[test]
fn error_mentions_position() {
    let err = parse_formula("concat('a', )").expect_err("should fail");
    assert!(!err.to_string().is_empty());
}

// =============================================================================
// Serialisation
// =============================================================================

#[test]
fn display_round_trips_to_the_same_tree() {
    for formula in [
        "concat('Hello,', ' World!')",
        "1 + 2 * 3",
        "(1 + 2) * 3",
        "10 - (4 - 3)",
        "5 - -2",
        "if(is_even(12), 'even', \"odd\")",
        "round(33.4567, 3)",
        r"concat('it\'s', '\n', 'done')",
        "true && (false || 1 != 2)",
        "get('previous_node.1.body') = 'x'",
        "round(123456789012345678901234, 0)",
        "0.0000001 + 2.5",
    ] {
        let expr = parse(formula);
        let text = expr.to_string();
        let reparsed = parse_formula(&text)
            .unwrap_or_else(|err| panic!("`{text}` (from `{formula}`) should parse: {err}"));
        assert_eq!(reparsed, expr, "round trip changed `{formula}` into `{text}`");
    }
}

#[test]
fn display_uses_single_quotes() {
    assert_eq!(parse(r#""a'b""#).to_string(), r"'a\'b'");
    assert_eq!(parse("upper(  'x' )").to_string(), "upper('x')");
}
