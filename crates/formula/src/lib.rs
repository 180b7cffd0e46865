//! Runtime formula engine: parsing, evaluation and rich-text conversion of formulas such as
//! `concat('Hello ', get('previous_node.1.name'))`.

pub mod argument;
pub mod ast;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod functions;
pub mod parser;
pub mod rich_text;
pub mod value;

pub use crate::argument::{ArgumentKind, ArgumentType, NumberCast};
pub use crate::ast::{BinaryOperator, Expr};
pub use crate::config::{EngineConfig, Fallback, FormulaMode, load_config};
pub use crate::context::{
    ContextError, DataProvider, DataProviderError, JsonDataProvider, RuntimeFormulaContext,
};
pub use crate::error::{FormulaError, FormulaResult, ParseErrorInfo, TypeCoercionError};
pub use crate::executor::Executor;
pub use crate::functions::{Category, Example, FormulaFunction, FormulaKind, FunctionRegistry};
pub use crate::parser::parse_formula;
pub use crate::rich_text::{EditorMode, Node, NodeType};
pub use crate::value::Value;

/// Parses and evaluates `formula`, propagating any failure.
pub fn evaluate_formula(
    formula: &str,
    registry: &FunctionRegistry,
    context: &RuntimeFormulaContext,
) -> FormulaResult<Value> {
    let expr = parse_formula(formula)?;
    Executor::new(registry, context).evaluate(&expr)
}

/// Best-effort evaluation for live previews.
///
/// An empty formula yields an empty string and raw mode returns the text untouched. Any
/// parse or evaluation failure is logged and replaced by the configured fallback.
pub fn resolve_formula(
    formula: &str,
    registry: &FunctionRegistry,
    context: &RuntimeFormulaContext,
    config: &EngineConfig,
) -> Value {
    if formula.is_empty() {
        return Value::String(String::new());
    }
    if config.mode == FormulaMode::Raw {
        return Value::String(formula.to_string());
    }

    match evaluate_formula(formula, registry, context) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Error while resolving formula `{formula}`: {err}");
            config.fallback.value()
        }
    }
}

/// Whether `formula` parses and only calls known functions with acceptable argument counts.
pub fn is_formula_valid(formula: &str, registry: &FunctionRegistry) -> bool {
    parse_formula(formula)
        .map_err(FormulaError::from)
        .and_then(|expr| executor::validate(&expr, registry))
        .is_ok()
}

/// Parses `formula` and renders it as a rich-text document.
///
/// The empty formula renders as an empty paragraph.
pub fn to_rich_text(
    formula: &str,
    registry: &FunctionRegistry,
    mode: EditorMode,
) -> FormulaResult<Node> {
    if formula.trim().is_empty() {
        return Ok(Node::doc(vec![Node::wrapper(Vec::new())]));
    }
    let expr = parse_formula(formula)?;
    rich_text::to_rich_text(&expr, registry, mode)
}

/// Reads a rich-text document back into formula text.
pub fn from_rich_text(
    node: &Node,
    registry: &FunctionRegistry,
    mode: EditorMode,
) -> FormulaResult<String> {
    rich_text::from_rich_text(node, registry, mode)
}
