//! Equality and comparison operators plus boolean tests.

use std::cmp::Ordering;

use crate::argument::ArgumentType;
use crate::context::RuntimeFormulaContext;
use crate::error::FormulaResult;
use crate::value::Value;

use super::{Category, Example, FormulaFunction, FormulaKind, FunctionRegistry, any_arg, number_arg};

const ANY_PAIR: &[ArgumentType] = &[ArgumentType::any(), ArgumentType::any()];
const NUMBER: &[ArgumentType] = &[ArgumentType::number()];

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(Equal);
    registry.register(NotEqual);
    registry.register(Comparison::GREATER_THAN);
    registry.register(Comparison::LESS_THAN);
    registry.register(Comparison::GREATER_THAN_OR_EQUAL);
    registry.register(Comparison::LESS_THAN_OR_EQUAL);
    registry.register(IsEven);
    registry.register(IsOdd);
    registry.register(RandomBool);
    registry.register(IsEmpty);
}

pub struct Equal;

impl FormulaFunction for Equal {
    fn name(&self) -> &'static str {
        "equal"
    }

    fn category(&self) -> Category {
        Category::Boolean
    }

    fn kind(&self) -> FormulaKind {
        FormulaKind::Operator
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        Some("=")
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(ANY_PAIR)
    }

    fn description(&self) -> &'static str {
        "Checks whether two values are equal. Values of different types are never equal."
    }

    fn examples(&self) -> &'static [Example] {
        &[
            Example {
                formula: "2 = 2",
                result: "true",
            },
            Example {
                formula: "'2' = 2",
                result: "false",
            },
        ]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let equal = any_arg(&args, 0).strict_equals(any_arg(&args, 1));
        Ok(Value::Boolean(equal))
    }
}

pub struct NotEqual;

impl FormulaFunction for NotEqual {
    fn name(&self) -> &'static str {
        "not_equal"
    }

    fn category(&self) -> Category {
        Category::Boolean
    }

    fn kind(&self) -> FormulaKind {
        FormulaKind::Operator
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        Some("!=")
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(ANY_PAIR)
    }

    fn description(&self) -> &'static str {
        "Checks whether two values are different."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "2 != 3",
            result: "true",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let equal = any_arg(&args, 0).strict_equals(any_arg(&args, 1));
        Ok(Value::Boolean(!equal))
    }
}

/// The four ordering operators share one implementation.
///
/// Only number/number and text/text pairs are ordered; any other pairing yields `null`.
pub struct Comparison {
    name: &'static str,
    symbol: &'static str,
    description: &'static str,
    examples: &'static [Example],
    accepts: fn(Ordering) -> bool,
}

impl Comparison {
    const GREATER_THAN: Comparison = Comparison {
        name: "greater_than",
        symbol: ">",
        description: "Checks whether the first value is greater than the second.",
        examples: &[Example {
            formula: "3 > 2",
            result: "true",
        }],
        accepts: Ordering::is_gt,
    };

    const LESS_THAN: Comparison = Comparison {
        name: "less_than",
        symbol: "<",
        description: "Checks whether the first value is less than the second.",
        examples: &[Example {
            formula: "2 < 3",
            result: "true",
        }],
        accepts: Ordering::is_lt,
    };

    const GREATER_THAN_OR_EQUAL: Comparison = Comparison {
        name: "greater_than_or_equal",
        symbol: ">=",
        description: "Checks whether the first value is greater than or equal to the second.",
        examples: &[Example {
            formula: "3 >= 3",
            result: "true",
        }],
        accepts: Ordering::is_ge,
    };

    const LESS_THAN_OR_EQUAL: Comparison = Comparison {
        name: "less_than_or_equal",
        symbol: "<=",
        description: "Checks whether the first value is less than or equal to the second.",
        examples: &[Example {
            formula: "3 <= 2",
            result: "false",
        }],
        accepts: Ordering::is_le,
    };
}

impl FormulaFunction for Comparison {
    fn name(&self) -> &'static str {
        self.name
    }

    fn category(&self) -> Category {
        Category::Boolean
    }

    fn kind(&self) -> FormulaKind {
        FormulaKind::Operator
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        Some(self.symbol)
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(ANY_PAIR)
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn examples(&self) -> &'static [Example] {
        self.examples
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let ordering = any_arg(&args, 0).compare(any_arg(&args, 1));
        Ok(ordering
            .map(|ordering| Value::Boolean((self.accepts)(ordering)))
            .unwrap_or(Value::Null))
    }
}

pub struct IsEven;

impl FormulaFunction for IsEven {
    fn name(&self) -> &'static str {
        "is_even"
    }

    fn category(&self) -> Category {
        Category::Boolean
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(NUMBER)
    }

    fn description(&self) -> &'static str {
        "Checks whether a number is even."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "is_even(12)",
            result: "true",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let number = number_arg(self.name(), &args, 0)?;
        Ok(Value::Boolean(number % 2.0 == 0.0))
    }
}

pub struct IsOdd;

impl FormulaFunction for IsOdd {
    fn name(&self) -> &'static str {
        "is_odd"
    }

    fn category(&self) -> Category {
        Category::Boolean
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(NUMBER)
    }

    fn description(&self) -> &'static str {
        "Checks whether a number is odd."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "is_odd(12)",
            result: "false",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let number = number_arg(self.name(), &args, 0)?;
        Ok(Value::Boolean(number % 2.0 != 0.0))
    }
}

pub struct RandomBool;

impl FormulaFunction for RandomBool {
    fn name(&self) -> &'static str {
        "random_bool"
    }

    fn category(&self) -> Category {
        Category::Boolean
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(&[])
    }

    fn description(&self) -> &'static str {
        "Returns true or false at random."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "random_bool()",
            result: "true",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, _args: Vec<Value>) -> FormulaResult<Value> {
        Ok(Value::Boolean(rand::random()))
    }
}

/// True for null, blank text, an empty array and an empty object.
pub struct IsEmpty;

impl FormulaFunction for IsEmpty {
    fn name(&self) -> &'static str {
        "is_empty"
    }

    fn category(&self) -> Category {
        Category::Boolean
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[ArgumentType::any()];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Checks whether a value is empty."
    }

    fn examples(&self) -> &'static [Example] {
        &[
            Example {
                formula: "is_empty('')",
                result: "true",
            },
            Example {
                formula: "is_empty('hello')",
                result: "false",
            },
        ]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let empty = match any_arg(&args, 0) {
            Value::Null => true,
            Value::String(text) => text.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(entries) => entries.is_empty(),
            Value::Number(_) | Value::Boolean(_) | Value::DateTime(_) => false,
        };
        Ok(Value::Boolean(empty))
    }
}
