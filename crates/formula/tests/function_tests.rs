//! Tests for the built-in function catalog.

use chrono_tz::Tz;
use runtime_formula::{
    Category, FormulaError, FormulaKind, FunctionRegistry, JsonDataProvider,
    RuntimeFormulaContext, Value, evaluate_formula,
};

/// Functions whose result changes between calls.
const NONDETERMINISTIC: &[&str] = &[
    "now",
    "today",
    "random_int",
    "random_float",
    "random_bool",
    "generate_uuid",
];

fn context() -> RuntimeFormulaContext {
    let previous_node = serde_json::json!({
        "1": { "body": "Hello world" },
    });
    RuntimeFormulaContext::default()
        .with_timezone(Tz::UTC)
        .with_provider(JsonDataProvider::new("previous_node", previous_node))
}

fn eval(formula: &str) -> Value {
    let registry = FunctionRegistry::with_builtins();
    evaluate_formula(formula, &registry, &context())
        .unwrap_or_else(|err| panic!("`{formula}` should evaluate: {err}"))
}

// =============================================================================
// Catalog
// =============================================================================

#[test]
fn every_example_evaluates_to_its_documented_result() {
    let registry = FunctionRegistry::with_builtins();
    let context = context();

    for function in registry.get_all() {
        if NONDETERMINISTIC.contains(&function.name()) {
            continue;
        }
        for example in function.examples() {
            let value = evaluate_formula(example.formula, &registry, &context).unwrap_or_else(
                |err| panic!("example `{}` of `{}` failed: {err}", example.formula, function.name()),
            );
            let expected: serde_json::Value = serde_json::from_str(example.result)
                .expect("example results should be JSON");
            let actual = serde_json::to_value(&value).expect("values should serialise");
            assert_eq!(
                actual,
                expected,
                "example `{}` of `{}`",
                example.formula,
                function.name()
            );
        }
    }
}

#[test]
fn every_function_is_documented() {
    let registry = FunctionRegistry::with_builtins();
    for function in registry.get_all() {
        assert!(!function.description().is_empty(), "{}", function.name());
        assert!(!function.examples().is_empty(), "{}", function.name());
        assert_eq!(function.name(), function.name().to_lowercase());
    }
}

#[test]
fn operators_carry_symbols() {
    let registry = FunctionRegistry::with_builtins();
    let operators: Vec<_> = registry
        .get_all()
        .filter(|function| function.kind() == FormulaKind::Operator)
        .filter_map(|function| function.operator_symbol())
        .collect();

    for symbol in ["+", "-", "*", "/", "=", "!=", ">", "<", ">=", "<=", "&&", "||"] {
        assert!(operators.contains(&symbol), "missing operator {symbol}");
    }
}

#[test]
fn lookup_is_case_insensitive() {
    let registry = FunctionRegistry::with_builtins();
    assert!(registry.get("UPPER").is_some());
    assert!(registry.get("Datetime_Format").is_some());
    assert!(registry.get("nope").is_none());
    assert_eq!(
        registry.get("day").map(|function| function.category()),
        Some(Category::Date)
    );
}

// =============================================================================
// Argument validation
// =============================================================================

#[test]
fn declared_arity_bounds_hold_for_every_function() {
    let registry = FunctionRegistry::with_builtins();
    for function in registry.get_all() {
        let Some(declared) = function.args() else {
            continue;
        };
        let required = declared.iter().filter(|arg| !arg.optional).count();

        for count in required..=declared.len() {
            assert!(
                function.validate_number_of_args(&vec![Value::Null; count]),
                "`{}` should accept {count} arguments",
                function.name()
            );
        }
        assert!(
            !function.validate_number_of_args(&vec![Value::Null; declared.len() + 1]),
            "`{}` should reject extra arguments",
            function.name()
        );
        if required > 0 {
            assert!(
                !function.validate_number_of_args(&vec![Value::Null; required - 1]),
                "`{}` should reject missing arguments",
                function.name()
            );
        }
    }
}

#[test]
fn type_validation_reports_the_first_bad_argument() {
    let registry = FunctionRegistry::with_builtins();
    let add = registry.get("add").expect("add is built in");

    let args = vec![Value::from(1.0), Value::from("foo")];
    let bad = add.validate_type_of_args(&args).expect("foo is not a number");
    assert!(std::ptr::eq(bad, &args[1]));

    let args = vec![Value::from("2"), Value::from(3.0)];
    assert!(add.validate_type_of_args(&args).is_none());
}

#[test]
fn concat_needs_at_least_two_arguments() {
    let registry = FunctionRegistry::with_builtins();
    let concat = registry.get("concat").expect("concat is built in");
    assert!(!concat.validate_number_of_args(&[Value::from("a")]));
    assert!(concat.validate_number_of_args(&[Value::from("a"), Value::from("b")]));
    assert!(concat.validate_number_of_args(&vec![Value::from("a"); 5]));
}

#[test]
fn call_rejects_bad_arguments() {
    let registry = FunctionRegistry::with_builtins();
    let context = context();

    let err = registry
        .call("add", &context, vec![Value::from(1.0)])
        .expect_err("add takes two arguments");
    assert!(matches!(err, FormulaError::InvalidNumberOfArguments { .. }));

    let err = registry
        .call("add", &context, vec![Value::from("foo"), Value::from(1.0)])
        .expect_err("foo is not a number");
    assert!(matches!(
        err,
        FormulaError::InvalidFormulaArgumentType { ref argument, .. } if *argument == Value::from("foo")
    ));

    let err = registry
        .call("frobnicate", &context, vec![])
        .expect_err("unknown function");
    assert!(matches!(err, FormulaError::UnknownFunction(ref name) if name == "frobnicate"));
}

// =============================================================================
// Text
// =============================================================================

#[test]
fn concat_renders_every_value() {
    assert_eq!(
        eval("concat('Hello, ', 'World', '!')"),
        Value::from("Hello, World!")
    );
    assert_eq!(eval("concat('n = ', 2 + 3)"), Value::from("n = 5"));
    assert_eq!(eval("concat(true, '-', 2.5)"), Value::from("true-2.5"));
}

#[test]
fn get_resolves_provider_data() {
    assert_eq!(
        eval("concat('Hello ', get('previous_node.1.body'))"),
        Value::from("Hello Hello world")
    );
}

#[test]
fn text_helpers() {
    assert_eq!(eval("length(to_array('a, b'))"), Value::from(2.0));
    assert_eq!(eval("contains(to_array('a, b'), 'b')"), Value::from(true));
    assert_eq!(eval("reverse(to_array('a, b'))"), eval("to_array('b, a')"));
    assert_eq!(eval("split('abc', '')"), eval("to_array('a,b,c')"));
    assert_eq!(eval("join(to_array('x,y'))"), Value::from("x,y"));
    assert_eq!(eval("at('Hello', 10)"), Value::Null);
    assert_eq!(eval("at('Hello', -1)"), Value::Null);
    assert_eq!(eval("get_property('{\"a\": 1}', 'b')"), Value::Null);
}

#[test]
fn strip_execute_table() {
    for (formula, expected) in [
        ("strip('')", Value::Null),
        ("strip(' ')", Value::Null),
        ("strip(' foo ')", Value::from("foo")),
        ("strip('foo')", Value::from("foo")),
    ] {
        assert_eq!(eval(formula), expected, "{formula}");
    }
}

#[test]
fn strip_of_numeric_text_is_null() {
    assert_eq!(eval("strip(' 12 ')"), Value::Null);
    assert_eq!(eval("strip('3.5')"), Value::Null);
    assert_eq!(eval("strip(' 12 apples ')"), Value::from("12 apples"));
}

#[test]
fn generate_uuid_is_a_v4_uuid() {
    let value = eval("generate_uuid()");
    let text = value.as_str().expect("uuid should be text");
    assert_eq!(text.len(), 36);
    assert_eq!(text.chars().nth(14), Some('4'));
    assert_ne!(value, eval("generate_uuid()"));
}

// =============================================================================
// Numbers
// =============================================================================

#[test]
fn arithmetic_accepts_numeric_text() {
    assert_eq!(eval("'2' + 3"), Value::from(5.0));
    assert_eq!(eval("'1.5' * 2"), Value::from(3.0));
    assert_eq!(eval("7 / 2"), Value::from(3.5));
}

#[test]
fn division_by_zero_fails() {
    let registry = FunctionRegistry::with_builtins();
    let err = evaluate_formula("1 / 0", &registry, &context()).expect_err("division by zero");
    assert!(matches!(err, FormulaError::Execution { .. }));

    let divide = registry.get("divide").expect("divide is registered");
    assert!(divide.description().contains("zero"));
}

#[test]
fn round_defaults_to_two_places() {
    assert_eq!(eval("round(2.5)"), Value::from(2.5));
    assert_eq!(eval("round(1.005, 0)"), Value::from(1.0));
    assert_eq!(eval("round(-3.14159, 3)"), Value::from(-3.142));
}

#[test]
fn round_execute_table() {
    for (formula, expected) in [
        ("round('23.45', 2)", 23.45),
        ("round(33.4567)", 33.46),
        ("round(33, 0)", 33.0),
        ("round(49.4587, 3)", 49.459),
    ] {
        assert_eq!(eval(formula), Value::from(expected), "{formula}");
    }
}

#[test]
fn round_uses_the_stored_binary_value() {
    // 1.45 is stored just below 1.45 and 8.345 just above 8.345
    assert_eq!(eval("round(1.45, 1)"), Value::from(1.4));
    assert_eq!(eval("round(1.115, 2)"), Value::from(1.11));
    assert_eq!(eval("round(8.345, 2)"), Value::from(8.35));
}

#[test]
fn round_breaks_exact_ties_away_from_zero() {
    assert_eq!(eval("round(0.125, 2)"), Value::from(0.13));
    assert_eq!(eval("round(2.5, 0)"), Value::from(3.0));
    assert_eq!(eval("round(-2.5, 0)"), Value::from(-3.0));
    assert_eq!(eval("round(0.5, 0)"), Value::from(1.0));
}

#[test]
fn round_keeps_large_numbers() {
    assert_eq!(
        eval("round(123456789012345678901234, 0)"),
        Value::from(123456789012345678901234.0)
    );
}

fn numbers(items: &[Value]) -> Value {
    Value::Array(items.to_vec())
}

#[test]
fn sum_execute_table() {
    let registry = FunctionRegistry::with_builtins();
    for (items, expected) in [
        (
            numbers(&[
                Value::from(2.5),
                Value::from(3.0),
                Value::from("foo"),
                Value::from(4.0),
            ]),
            Value::Null,
        ),
        (
            numbers(&[Value::from("2"), Value::from("3"), Value::from("4")]),
            Value::from(9.0),
        ),
        (
            numbers(&[Value::from(2.5), Value::from(3.0), Value::from(4.0)]),
            Value::from(9.5),
        ),
    ] {
        let value = registry
            .call("sum", &context(), vec![items.clone()])
            .expect("sum should run");
        assert_eq!(value, expected, "sum of {items:?}");
    }
}

#[test]
fn sum_reads_blank_and_boolean_items_as_numbers() {
    assert_eq!(eval("sum(to_array('1, 2, '))"), Value::from(3.0));

    let registry = FunctionRegistry::with_builtins();
    let items = numbers(&[
        Value::from(""),
        Value::Boolean(true),
        Value::Null,
        Value::from(" 4 "),
    ]);
    let value = registry
        .call("sum", &context(), vec![items])
        .expect("sum should run");
    assert_eq!(value, Value::from(5.0));
}

#[test]
fn avg_execute_table() {
    let registry = FunctionRegistry::with_builtins();
    for (items, expected) in [
        (
            numbers(&[
                Value::from(1.0),
                Value::from(2.0),
                Value::from("foo"),
                Value::from(3.0),
                Value::from(4.0),
            ]),
            Value::Null,
        ),
        (
            numbers(&[
                Value::from(1.0),
                Value::from(2.0),
                Value::from(3.0),
                Value::from(4.0),
            ]),
            Value::from(2.5),
        ),
        (numbers(&[]), Value::from(0.0)),
    ] {
        let value = registry
            .call("avg", &context(), vec![items.clone()])
            .expect("avg should run");
        assert_eq!(value, expected, "avg of {items:?}");
    }
}

#[test]
fn avg_of_an_empty_list_is_zero() {
    assert_eq!(eval("avg(to_array(''))"), Value::from(0.0));

    let registry = FunctionRegistry::with_builtins();
    let array = numbers(&[Value::from(2.5), Value::from(3.0), Value::from(4.5)]);
    let avg = registry
        .call("avg", &context(), vec![array])
        .expect("avg should run");
    assert_eq!(avg.as_f64().map(|avg| (avg * 1000.0).round()), Some(3333.0));
}

#[test]
fn random_numbers_stay_in_range() {
    for _ in 0..50 {
        let int = eval("random_int(1, 3)").as_f64().expect("a number");
        assert!((1.0..=3.0).contains(&int));
        assert_eq!(int.fract(), 0.0);

        let float = eval("random_float(1, 2)").as_f64().expect("a number");
        assert!((1.0..2.0).contains(&float));
    }
    assert_eq!(eval("random_float(4, 4)"), Value::from(4.0));
}

#[test]
fn random_bounds_must_be_ordered() {
    let registry = FunctionRegistry::with_builtins();
    assert!(evaluate_formula("random_int(5, 1)", &registry, &context()).is_err());
    assert!(evaluate_formula("random_float(5, 1)", &registry, &context()).is_err());
}

// =============================================================================
// Booleans and conditions
// =============================================================================

#[test]
fn equality_is_strict() {
    assert_eq!(eval("'2' = 2"), Value::from(false));
    assert_eq!(eval("2 = 2.0"), Value::from(true));
    assert_eq!(eval("to_array('a,b') = to_array('a, b')"), Value::from(true));
    assert_eq!(eval("'a' != 'b'"), Value::from(true));
}

#[test]
fn comparing_mismatched_types_is_null() {
    assert_eq!(eval("2 > 'a'"), Value::Null);
    assert_eq!(eval("'b' > 'a'"), Value::from(true));
}

#[test]
fn parity_and_emptiness() {
    assert_eq!(eval("is_odd(7)"), Value::from(true));
    assert_eq!(eval("is_even(-4)"), Value::from(true));
    assert_eq!(eval("is_empty(to_array('a'))"), Value::from(false));
    assert_eq!(eval("is_empty(' ')"), Value::from(true));
}

#[test]
fn if_picks_a_branch() {
    assert_eq!(eval("if(false, 'foo', 'bar')"), Value::from("bar"));
    assert_eq!(eval("if(1 < 2, 10, 20)"), Value::from(10.0));
    assert_eq!(eval("if('true', 'yes', 'no')"), Value::from("yes"));
}

#[test]
fn logical_operators_coerce_text() {
    assert_eq!(eval("'true' && true"), Value::from(true));
    assert_eq!(eval("false || 1 = 1"), Value::from(true));
}

// =============================================================================
// Dates
// =============================================================================

#[test]
fn datetime_format_uses_moment_tokens() {
    assert_eq!(
        eval("datetime_format('2025-11-03 09:07:05', 'YYYY-MM-DD HH:mm:ss', 'UTC')"),
        Value::from("2025-11-03 09:07:05")
    );
}

#[test]
fn calendar_fields_follow_the_context_timezone() {
    let registry = FunctionRegistry::with_builtins();
    let tokyo = RuntimeFormulaContext::default().with_timezone(Tz::Asia__Tokyo);
    let value = evaluate_formula("hour('2025-11-03 20:00')", &registry, &tokyo)
        .expect("hour should evaluate");
    assert_eq!(value, Value::from(5.0));
}

#[test]
fn invalid_dates_are_rejected() {
    let registry = FunctionRegistry::with_builtins();
    let err = evaluate_formula("day('not a date')", &registry, &context())
        .expect_err("not a date");
    assert!(matches!(err, FormulaError::InvalidFormulaArgumentType { .. }));
}

#[test]
fn now_is_a_datetime() {
    assert!(matches!(eval("now()"), Value::DateTime(_)));
}
