//! Arithmetic operators and numeric functions.

use rand::Rng;

use crate::argument::ArgumentType;
use crate::context::RuntimeFormulaContext;
use crate::error::{FormulaError, FormulaResult};
use crate::value::{Value, loose_number};

use super::{Category, Example, FormulaFunction, FormulaKind, FunctionRegistry, any_arg, number_arg};

const NUMBER_PAIR: &[ArgumentType] = &[ArgumentType::number(), ArgumentType::number()];
const ARRAY: &[ArgumentType] = &[ArgumentType::array()];

/// Rounding precision is capped where `10^places` still fits an f64.
const MAX_DECIMAL_PLACES: f64 = 100.0;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(Add);
    registry.register(Minus);
    registry.register(Multiply);
    registry.register(Divide);
    registry.register(Round);
    registry.register(RandomInt);
    registry.register(RandomFloat);
    registry.register(Sum);
    registry.register(Avg);
}

pub struct Add;

impl FormulaFunction for Add {
    fn name(&self) -> &'static str {
        "add"
    }

    fn category(&self) -> Category {
        Category::Number
    }

    fn kind(&self) -> FormulaKind {
        FormulaKind::Operator
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        Some("+")
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(NUMBER_PAIR)
    }

    fn description(&self) -> &'static str {
        "Adds two numbers."
    }

    fn examples(&self) -> &'static [Example] {
        &[
            Example {
                formula: "2 + 3",
                result: "5",
            },
            Example {
                formula: "1 + 2 + 3",
                result: "6",
            },
        ]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let left = number_arg(self.name(), &args, 0)?;
        let right = number_arg(self.name(), &args, 1)?;
        Ok(Value::Number(left + right))
    }
}

pub struct Minus;

impl FormulaFunction for Minus {
    fn name(&self) -> &'static str {
        "minus"
    }

    fn category(&self) -> Category {
        Category::Number
    }

    fn kind(&self) -> FormulaKind {
        FormulaKind::Operator
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        Some("-")
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(NUMBER_PAIR)
    }

    fn description(&self) -> &'static str {
        "Subtracts the second number from the first."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "3 - 2",
            result: "1",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let left = number_arg(self.name(), &args, 0)?;
        let right = number_arg(self.name(), &args, 1)?;
        Ok(Value::Number(left - right))
    }
}

pub struct Multiply;

impl FormulaFunction for Multiply {
    fn name(&self) -> &'static str {
        "multiply"
    }

    fn category(&self) -> Category {
        Category::Number
    }

    fn kind(&self) -> FormulaKind {
        FormulaKind::Operator
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        Some("*")
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(NUMBER_PAIR)
    }

    fn description(&self) -> &'static str {
        "Multiplies two numbers."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "2 * 3",
            result: "6",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let left = number_arg(self.name(), &args, 0)?;
        let right = number_arg(self.name(), &args, 1)?;
        Ok(Value::Number(left * right))
    }
}

/// Division; a zero divisor is an error rather than an infinity.
pub struct Divide;

impl FormulaFunction for Divide {
    fn name(&self) -> &'static str {
        "divide"
    }

    fn category(&self) -> Category {
        Category::Number
    }

    fn kind(&self) -> FormulaKind {
        FormulaKind::Operator
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        Some("/")
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(NUMBER_PAIR)
    }

    fn description(&self) -> &'static str {
        "Divides the first number by the second. Dividing by zero is an error."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "6 / 2",
            result: "3",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let left = number_arg(self.name(), &args, 0)?;
        let right = number_arg(self.name(), &args, 1)?;
        if right == 0.0 {
            return Err(FormulaError::execution(self.name(), "division by zero"));
        }
        Ok(Value::Number(left / right))
    }
}

/// `round(number, places = 2)`: fixed-decimal rounding, half away from zero.
pub struct Round;

impl FormulaFunction for Round {
    fn name(&self) -> &'static str {
        "round"
    }

    fn category(&self) -> Category {
        Category::Number
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[ArgumentType::number(), ArgumentType::int().optional()];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Rounds a number to the given number of decimal places (2 by default)."
    }

    fn examples(&self) -> &'static [Example] {
        &[
            Example {
                formula: "round(33.4567)",
                result: "33.46",
            },
            Example {
                formula: "round(33.4567, 3)",
                result: "33.457",
            },
        ]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let number = number_arg(self.name(), &args, 0)?;
        let places = args
            .get(1)
            .and_then(Value::as_f64)
            .unwrap_or(2.0)
            .clamp(0.0, MAX_DECIMAL_PLACES) as usize;

        Ok(Value::Number(round_to_places(number, places)))
    }
}

/// Rounds the exact binary value of `number` to `places` decimals, ties away from zero.
///
/// `1.45` is stored as `1.4499999...` and therefore rounds to `1.4` at one place.
fn round_to_places(number: f64, places: usize) -> f64 {
    if !number.is_finite() {
        return number;
    }

    let magnitude = number.abs();
    let rounded = if is_exact_tie(magnitude, places) {
        // Float formatting breaks exact ties towards even, so step up from the truncated digits
        let digits = format!("{magnitude:.precision$}", precision = places + 1);
        let truncated: f64 = digits[..digits.len() - 1].parse().unwrap_or(magnitude);
        let stepped = truncated + 10f64.powi(-(places as i32));
        format!("{stepped:.places$}").parse().unwrap_or(magnitude)
    } else {
        format!("{magnitude:.places$}").parse().unwrap_or(magnitude)
    };
    rounded.copysign(number)
}

/// Whether `magnitude` lies exactly halfway between two values with `places` decimals.
fn is_exact_tie(magnitude: f64, places: usize) -> bool {
    // A tie needs a decimal expansion ending at `places + 1`, which in turn needs the
    // value to be a multiple of 2^-(places + 1)
    let scaled = magnitude * 2f64.powi(places as i32 + 1);
    if !scaled.is_finite() || scaled.fract() != 0.0 {
        return false;
    }
    format!("{magnitude:.precision$}", precision = places + 1).ends_with('5')
}

/// Random integer in `ceil(min)..=floor(max)`.
pub struct RandomInt;

impl FormulaFunction for RandomInt {
    fn name(&self) -> &'static str {
        "random_int"
    }

    fn category(&self) -> Category {
        Category::Number
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[ArgumentType::int(), ArgumentType::int()];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Returns a random whole number between the minimum and maximum, both included."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "random_int(1, 10)",
            result: "7",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let min = number_arg(self.name(), &args, 0)?.ceil() as i64;
        let max = number_arg(self.name(), &args, 1)?.floor() as i64;
        if min > max {
            return Err(FormulaError::execution(
                self.name(),
                format!("minimum {min} is greater than maximum {max}"),
            ));
        }

        let mut rng = rand::thread_rng();
        Ok(Value::Number(rng.gen_range(min..=max) as f64))
    }
}

/// Random number in `[min, max)`.
pub struct RandomFloat;

impl FormulaFunction for RandomFloat {
    fn name(&self) -> &'static str {
        "random_float"
    }

    fn category(&self) -> Category {
        Category::Number
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[ArgumentType::float(), ArgumentType::float()];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Returns a random decimal number between the minimum and maximum."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "random_float(1, 2)",
            result: "1.4213",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let min = number_arg(self.name(), &args, 0)?;
        let max = number_arg(self.name(), &args, 1)?;
        if min > max {
            return Err(FormulaError::execution(
                self.name(),
                format!("minimum {min} is greater than maximum {max}"),
            ));
        }
        if min == max {
            return Ok(Value::Number(min));
        }

        let mut rng = rand::thread_rng();
        Ok(Value::Number(rng.gen_range(min..max)))
    }
}

/// Numbers of an array, or `None` as soon as one item does not read as a finite number.
///
/// Items convert loosely, so blank text and `Null` count as `0` and booleans as `0`/`1`.
fn finite_numbers(items: &Value) -> Option<Vec<f64>> {
    match items {
        Value::Array(items) => items
            .iter()
            .map(|item| Some(loose_number(item)).filter(|number| number.is_finite()))
            .collect(),
        _ => None,
    }
}

pub struct Sum;

impl FormulaFunction for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn category(&self) -> Category {
        Category::Number
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(ARRAY)
    }

    fn description(&self) -> &'static str {
        "Adds up the numbers in an array. Returns null if an item is not a number."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "sum(to_array('1, 2, 3'))",
            result: "6",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        Ok(finite_numbers(any_arg(&args, 0))
            .map(|numbers| Value::Number(numbers.iter().sum()))
            .unwrap_or(Value::Null))
    }
}

pub struct Avg;

impl FormulaFunction for Avg {
    fn name(&self) -> &'static str {
        "avg"
    }

    fn category(&self) -> Category {
        Category::Number
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(ARRAY)
    }

    fn description(&self) -> &'static str {
        "Averages the numbers in an array, 0 when it is empty. Returns null if an item is not a number."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "avg(to_array('1, 2, 3'))",
            result: "2",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let average = finite_numbers(any_arg(&args, 0)).map(|numbers| {
            if numbers.is_empty() {
                0.0
            } else {
                numbers.iter().sum::<f64>() / numbers.len() as f64
            }
        });
        Ok(average.map(Value::Number).unwrap_or(Value::Null))
    }
}
