//! Formula functions and the registry that owns them.
//!
//! Every function and operator implements [`FormulaFunction`]. The trait carries the
//! declared signature, the evaluation behaviour, descriptive metadata for the editor and the
//! hooks used by the rich-text converters. A [`FunctionRegistry`] is built once, then shared
//! read-only by every evaluation.

use std::collections::BTreeMap;
use std::fmt;

use crate::argument::ArgumentType;
use crate::context::RuntimeFormulaContext;
use crate::error::{FormulaError, FormulaResult};
use crate::rich_text::{EditorMode, Fragment, Node};
use crate::value::Value;

mod boolean;
mod condition;
mod date;
mod number;
mod text;

/// Editor grouping for a function. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Text,
    Number,
    Boolean,
    Date,
    Condition,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Text,
        Category::Number,
        Category::Boolean,
        Category::Date,
        Category::Condition,
    ];

    pub fn icon_class(&self) -> &'static str {
        match self {
            Category::Text => "iconoir-text",
            Category::Number => "baserow-icon-hashtag",
            Category::Boolean => "baserow-icon-circle-checked",
            Category::Date => "iconoir-calendar",
            Category::Condition => "iconoir-git-fork",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Text => "text",
            Category::Number => "number",
            Category::Boolean => "boolean",
            Category::Date => "date",
            Category::Condition => "condition",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.to_string() == lowered)
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", s))
    }
}

/// Whether a function is called by name or written as an infix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaKind {
    Function,
    Operator,
}

impl fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaKind::Function => f.write_str("function"),
            FormulaKind::Operator => f.write_str("operator"),
        }
    }
}

/// A documented call and the JSON rendering of its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
    pub formula: &'static str,
    pub result: &'static str,
}

impl Example {
    pub const fn new(formula: &'static str, result: &'static str) -> Self {
        Self { formula, result }
    }
}

/// A function or operator callable from a formula.
pub trait FormulaFunction: Send + Sync {
    /// Unique lowercase name.
    fn name(&self) -> &'static str;

    fn category(&self) -> Category;

    fn kind(&self) -> FormulaKind {
        FormulaKind::Function
    }

    /// Infix symbol, for operators only.
    fn operator_symbol(&self) -> Option<&'static str> {
        None
    }

    /// Declared arguments. `None` accepts any number of arguments of any type.
    fn args(&self) -> Option<&'static [ArgumentType]>;

    fn description(&self) -> &'static str;

    fn examples(&self) -> &'static [Example];

    fn icon_class(&self) -> &'static str {
        self.category().icon_class()
    }

    /// Evaluate the function with arguments already validated and parsed.
    fn execute(&self, context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value>;

    fn validate_number_of_args(&self, args: &[Value]) -> bool {
        let Some(declared) = self.args() else {
            return true;
        };
        let required = declared.iter().filter(|arg| !arg.optional).count();
        (required..=declared.len()).contains(&args.len())
    }

    /// Returns the first argument failing its declared type, or `None` when all pass.
    fn validate_type_of_args<'a>(&self, args: &'a [Value]) -> Option<&'a Value> {
        let declared = self.args()?;
        args.iter()
            .zip(declared)
            .find(|(value, arg_type)| !arg_type.test(value))
            .map(|(value, _)| value)
    }

    fn validate_args(&self, args: &[Value], check_types: bool) -> FormulaResult<()> {
        if !self.validate_number_of_args(args) {
            return Err(FormulaError::InvalidNumberOfArguments {
                function: self.name().to_string(),
                args: args.to_vec(),
            });
        }
        if check_types {
            if let Some(argument) = self.validate_type_of_args(args) {
                return Err(FormulaError::InvalidFormulaArgumentType {
                    function: self.name().to_string(),
                    argument: argument.clone(),
                });
            }
        }
        Ok(())
    }

    fn parse_args(&self, args: Vec<Value>) -> FormulaResult<Vec<Value>> {
        let Some(declared) = self.args() else {
            return Ok(args);
        };
        args.into_iter()
            .zip(declared)
            .map(|(value, arg_type)| arg_type.parse(value).map_err(FormulaError::from))
            .collect()
    }

    /// Node type this function renders as, when it has its own editor component.
    fn component_type(&self) -> Option<&'static str> {
        None
    }

    /// Custom rich-text rendering. `None` uses the generic function or operator layout.
    fn to_rich_text(&self, _args: &[Fragment], _mode: EditorMode) -> Option<Fragment> {
        None
    }

    /// Formula text for this function's own component node.
    fn from_rich_text(&self, _node: &Node) -> Option<String> {
        None
    }
}

/// Registry of every callable function, keyed by lowercase name.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Box<dyn FormulaFunction>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the full built-in catalog.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        text::register(&mut registry);
        number::register(&mut registry);
        boolean::register(&mut registry);
        date::register(&mut registry);
        condition::register(&mut registry);
        registry
    }

    /// Adds a function, returning the one it replaced.
    pub fn register(
        &mut self,
        function: impl FormulaFunction + 'static,
    ) -> Option<Box<dyn FormulaFunction>> {
        let name = function.name().to_lowercase();
        let previous = self.functions.insert(name, Box::new(function));
        if let Some(previous) = &previous {
            log::warn!("replacing registered formula function `{}`", previous.name());
        }
        previous
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&dyn FormulaFunction> {
        self.functions
            .get(&name.to_lowercase())
            .map(|function| function.as_ref())
    }

    /// All functions, ordered by name.
    pub fn get_all(&self) -> impl Iterator<Item = &dyn FormulaFunction> {
        self.functions.values().map(|function| function.as_ref())
    }

    /// The function owning rich-text nodes of `node_type`.
    pub fn by_component_type(&self, node_type: &str) -> Option<&dyn FormulaFunction> {
        self.get_all()
            .find(|function| function.component_type() == Some(node_type))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Validate, parse and execute `name` against already evaluated arguments.
    pub fn call(
        &self,
        name: &str,
        context: &RuntimeFormulaContext,
        args: Vec<Value>,
    ) -> FormulaResult<Value> {
        let function = self
            .get(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;
        function.validate_args(&args, true)?;
        let parsed = function.parse_args(args)?;
        function.execute(context, parsed)
    }
}

/// Numeric argument at `index`; parsed number arguments are numbers or `Null`.
fn number_arg(function: &str, args: &[Value], index: usize) -> FormulaResult<f64> {
    args.get(index)
        .and_then(Value::as_f64)
        .ok_or_else(|| FormulaError::execution(function, format!("argument {index} is not a number")))
}

/// Text argument at `index`, `None` when an optional argument was left off.
fn text_arg(args: &[Value], index: usize) -> Option<&str> {
    args.get(index).and_then(Value::as_str)
}

fn bool_arg(args: &[Value], index: usize) -> bool {
    args.get(index).and_then(Value::as_bool).unwrap_or(false)
}

/// Argument at `index`, `Null` when absent.
fn any_arg(args: &[Value], index: usize) -> &Value {
    const NULL: &Value = &Value::Null;
    args.get(index).unwrap_or(NULL)
}
