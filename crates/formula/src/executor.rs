//! Tree-walking evaluation of parsed formulas.

use crate::ast::Expr;
use crate::context::RuntimeFormulaContext;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{FormulaFunction, FunctionRegistry};
use crate::value::Value;

/// Evaluates expressions against a registry and a runtime context.
///
/// The first failing node aborts the whole evaluation.
pub struct Executor<'a> {
    registry: &'a FunctionRegistry,
    context: &'a RuntimeFormulaContext,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a FunctionRegistry, context: &'a RuntimeFormulaContext) -> Self {
        Self { registry, context }
    }

    pub fn evaluate(&self, expr: &Expr) -> FormulaResult<Value> {
        match expr {
            Expr::String(value) => Ok(Value::String(value.clone())),
            Expr::Decimal(value) => Ok(Value::Number(*value)),
            Expr::Integer(value) => Ok(Value::Number(*value as f64)),
            Expr::Boolean(value) => Ok(Value::Boolean(*value)),
            Expr::Group(inner) => self.evaluate(inner),
            Expr::FunctionCall { name, args } => {
                let args: Vec<&Expr> = args.iter().collect();
                self.call(name, &args)
            }
            Expr::BinaryOp { op, left, right } => {
                self.call(op.function_name(), &[left.as_ref(), right.as_ref()])
            }
        }
    }

    fn call(&self, name: &str, args: &[&Expr]) -> FormulaResult<Value> {
        // Resolve the function before evaluating arguments
        let function = lookup(self.registry, name)?;

        // Left to right, one after the other
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg)?);
        }

        log::debug!("calling `{}` with {} argument(s)", function.name(), values.len());
        function.validate_args(&values, true)?;
        let parsed = function.parse_args(values)?;
        function.execute(self.context, parsed)
    }
}

fn lookup<'r>(registry: &'r FunctionRegistry, name: &str) -> FormulaResult<&'r dyn FormulaFunction> {
    registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))
}

/// Checks that every function exists and is called with an acceptable number of arguments.
///
/// Nothing is executed and argument types are not checked, since `get()` references cannot be
/// resolved without a live context.
pub fn validate(expr: &Expr, registry: &FunctionRegistry) -> FormulaResult<()> {
    match expr {
        Expr::String(_) | Expr::Decimal(_) | Expr::Integer(_) | Expr::Boolean(_) => Ok(()),
        Expr::Group(inner) => validate(inner, registry),
        Expr::FunctionCall { name, args } => {
            let args: Vec<&Expr> = args.iter().collect();
            validate_call(registry, name, &args)
        }
        Expr::BinaryOp { op, left, right } => {
            validate_call(registry, op.function_name(), &[left.as_ref(), right.as_ref()])
        }
    }
}

fn validate_call(registry: &FunctionRegistry, name: &str, args: &[&Expr]) -> FormulaResult<()> {
    let function = lookup(registry, name)?;
    for arg in args {
        validate(arg, registry)?;
    }
    let placeholders = vec![Value::Null; args.len()];
    function.validate_args(&placeholders, false)
}
