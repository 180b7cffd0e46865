//! Branching and logical connectives.

use crate::argument::ArgumentType;
use crate::context::RuntimeFormulaContext;
use crate::error::FormulaResult;
use crate::value::Value;

use super::{Category, Example, FormulaFunction, FormulaKind, FunctionRegistry, bool_arg};

const BOOLEAN_PAIR: &[ArgumentType] = &[ArgumentType::boolean(), ArgumentType::boolean()];

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(If);
    registry.register(And);
    registry.register(Or);
}

/// `if(condition, then, else)`. Both branches are evaluated before the call.
pub struct If;

impl FormulaFunction for If {
    fn name(&self) -> &'static str {
        "if"
    }

    fn category(&self) -> Category {
        Category::Condition
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[
            ArgumentType::boolean(),
            ArgumentType::any(),
            ArgumentType::any(),
        ];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Returns the second argument when the condition is true, otherwise the third."
    }

    fn examples(&self) -> &'static [Example] {
        &[
            Example {
                formula: "if(true, 'foo', 'bar')",
                result: r#""foo""#,
            },
            Example {
                formula: "if(2 > 3, 'foo', 'bar')",
                result: r#""bar""#,
            },
        ]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, mut args: Vec<Value>) -> FormulaResult<Value> {
        let condition = bool_arg(&args, 0);
        let index = if condition { 1 } else { 2 };
        if index < args.len() {
            Ok(args.swap_remove(index))
        } else {
            Ok(Value::Null)
        }
    }
}

pub struct And;

impl FormulaFunction for And {
    fn name(&self) -> &'static str {
        "and"
    }

    fn category(&self) -> Category {
        Category::Condition
    }

    fn kind(&self) -> FormulaKind {
        FormulaKind::Operator
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        Some("&&")
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(BOOLEAN_PAIR)
    }

    fn description(&self) -> &'static str {
        "True when both values are true."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "true && false",
            result: "false",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        Ok(Value::Boolean(bool_arg(&args, 0) && bool_arg(&args, 1)))
    }
}

pub struct Or;

impl FormulaFunction for Or {
    fn name(&self) -> &'static str {
        "or"
    }

    fn category(&self) -> Category {
        Category::Condition
    }

    fn kind(&self) -> FormulaKind {
        FormulaKind::Operator
    }

    fn operator_symbol(&self) -> Option<&'static str> {
        Some("||")
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(BOOLEAN_PAIR)
    }

    fn description(&self) -> &'static str {
        "True when at least one of the values is true."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "true || false",
            result: "true",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        Ok(Value::Boolean(bool_arg(&args, 0) || bool_arg(&args, 1)))
    }
}
