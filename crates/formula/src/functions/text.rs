//! Text functions, including the `get` data reference and the array/string helpers.

use crate::argument::ArgumentType;
use crate::ast::{Expr, quote_string};
use crate::context::RuntimeFormulaContext;
use crate::error::FormulaResult;
use crate::parser::parse_formula;
use crate::rich_text::{Attrs, EditorMode, Fragment, Node, NodeType, ZWS};
use crate::value::{Value, ensure_array, ensure_string, text_to_number};

use super::{
    Category, Example, FormulaFunction, FunctionRegistry, any_arg, number_arg, text_arg,
};

const TEXT: &[ArgumentType] = &[ArgumentType::text()];
const ANY: &[ArgumentType] = &[ArgumentType::any()];

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(Concat);
    registry.register(Get);
    registry.register(Upper);
    registry.register(Lower);
    registry.register(Capitalize);
    registry.register(GetProperty);
    registry.register(GenerateUuid);
    registry.register(Replace);
    registry.register(Length);
    registry.register(Contains);
    registry.register(Reverse);
    registry.register(Join);
    registry.register(Split);
    registry.register(Strip);
    registry.register(At);
    registry.register(ToArray);
}

/// `concat(a, b, ...)`: joins the text form of every argument.
pub struct Concat;

impl FormulaFunction for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        None
    }

    fn description(&self) -> &'static str {
        "Joins two or more values into a single piece of text."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "concat('Hello,', ' World!')",
            result: r#""Hello, World!""#,
        }]
    }

    fn validate_number_of_args(&self, args: &[Value]) -> bool {
        args.len() > 1
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        Ok(Value::String(args.iter().map(ensure_string).collect()))
    }

    /// In the simple editor `concat` is the text itself: parts separated by newline
    /// literals become one paragraph each, anything else one paragraph of runs.
    fn to_rich_text(&self, args: &[Fragment], mode: EditorMode) -> Option<Fragment> {
        if mode != EditorMode::Simple {
            return None;
        }

        let is_new_line = |fragment: &Fragment| {
            fragment
                .as_node()
                .is_some_and(|node| node.kind == NodeType::NewLine)
        };
        let is_paragraph_list = args.len() % 2 == 1
            && args
                .iter()
                .enumerate()
                .all(|(idx, arg)| idx % 2 == 0 || is_new_line(arg));

        if is_paragraph_list {
            let paragraphs = args
                .iter()
                .step_by(2)
                .map(|arg| Node::wrapper(inline_content(arg.clone())))
                .collect();
            return Some(Fragment::Nodes(paragraphs));
        }

        let content = args.iter().cloned().flat_map(inline_content).collect();
        Some(Fragment::Node(Node::wrapper(content)))
    }
}

/// Flattens a fragment into inline nodes, unwrapping paragraph wrappers.
fn inline_content(fragment: Fragment) -> Vec<Node> {
    fragment
        .into_nodes()
        .into_iter()
        .flat_map(|node| match node.kind {
            NodeType::Wrapper => node.content.unwrap_or_default(),
            _ => vec![node],
        })
        .collect()
}

/// `get('provider.path')`: reads data from the runtime context.
pub struct Get;

impl FormulaFunction for Get {
    fn name(&self) -> &'static str {
        "get"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(TEXT)
    }

    fn description(&self) -> &'static str {
        "Returns the data found at the given path."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "get('previous_node.1.body')",
            result: r#""Hello world""#,
        }]
    }

    fn execute(&self, context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let path = text_arg(&args, 0).unwrap_or_default();
        Ok(context.get(path)?)
    }

    fn component_type(&self) -> Option<&'static str> {
        Some("get-formula-component")
    }

    fn to_rich_text(&self, args: &[Fragment], mode: EditorMode) -> Option<Fragment> {
        let [arg] = args else {
            return None;
        };
        let text = arg.as_node()?.text_content()?;
        let path = match mode {
            EditorMode::Simple if text == ZWS => String::new(),
            EditorMode::Simple => text.to_string(),
            // Advanced mode keeps literals quoted; only a plain string can become a chip
            EditorMode::Advanced => match parse_formula(text).ok()? {
                Expr::String(path) => path,
                _ => return None,
            },
        };

        Some(Fragment::Node(Node::new(NodeType::GetComponent).with_attrs(
            Attrs {
                path: Some(path),
                is_selected: Some(false),
                ..Default::default()
            },
        )))
    }

    fn from_rich_text(&self, node: &Node) -> Option<String> {
        let path = node.attrs.as_ref()?.path.as_deref()?;
        Some(format!("get({})", quote_string(path)))
    }
}

pub struct Upper;

impl FormulaFunction for Upper {
    fn name(&self) -> &'static str {
        "upper"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(TEXT)
    }

    fn description(&self) -> &'static str {
        "Converts text to upper case."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "upper('Hello, World!')",
            result: r#""HELLO, WORLD!""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let text = text_arg(&args, 0).unwrap_or_default();
        Ok(Value::String(text.to_uppercase()))
    }
}

pub struct Lower;

impl FormulaFunction for Lower {
    fn name(&self) -> &'static str {
        "lower"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(TEXT)
    }

    fn description(&self) -> &'static str {
        "Converts text to lower case."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "lower('Hello, World!')",
            result: r#""hello, world!""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let text = text_arg(&args, 0).unwrap_or_default();
        Ok(Value::String(text.to_lowercase()))
    }
}

/// Upper-cases the first character and lower-cases the rest.
pub struct Capitalize;

impl FormulaFunction for Capitalize {
    fn name(&self) -> &'static str {
        "capitalize"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(TEXT)
    }

    fn description(&self) -> &'static str {
        "Capitalizes the first letter of the text and lower-cases the rest."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "capitalize('hello, WORLD!')",
            result: r#""Hello, world!""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let text = text_arg(&args, 0).unwrap_or_default();
        let mut chars = text.chars();
        let capitalized = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.as_str().to_lowercase().chars())
                .collect(),
            None => String::new(),
        };
        Ok(Value::String(capitalized))
    }
}

pub struct GetProperty;

impl FormulaFunction for GetProperty {
    fn name(&self) -> &'static str {
        "get_property"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[ArgumentType::object(), ArgumentType::text()];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Returns the value of a property of an object."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: r#"get_property('{"cars": "Toyota"}', 'cars')"#,
            result: r#""Toyota""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let key = text_arg(&args, 1).unwrap_or_default();
        match any_arg(&args, 0) {
            Value::Object(entries) => Ok(entries.get(key).cloned().unwrap_or(Value::Null)),
            _ => Ok(Value::Null),
        }
    }
}

/// Random RFC 4122 version 4 identifier.
pub struct GenerateUuid;

impl FormulaFunction for GenerateUuid {
    fn name(&self) -> &'static str {
        "generate_uuid"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(&[])
    }

    fn description(&self) -> &'static str {
        "Generates a random UUID (version 4)."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "generate_uuid()",
            result: r#""9b5b6a4e-3f0c-4f6e-8a8d-2f1b3c4d5e6f""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, _args: Vec<Value>) -> FormulaResult<Value> {
        Ok(Value::String(uuid_v4()))
    }
}

fn uuid_v4() -> String {
    let mut bytes: [u8; 16] = rand::random();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

pub struct Replace;

impl FormulaFunction for Replace {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[
            ArgumentType::text(),
            ArgumentType::text(),
            ArgumentType::text(),
        ];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Replaces every occurrence of the search text with the replacement."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "replace('Hello, World!', 'World', 'Universe')",
            result: r#""Hello, Universe!""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let text = text_arg(&args, 0).unwrap_or_default();
        let search = text_arg(&args, 1).unwrap_or_default();
        let replacement = text_arg(&args, 2).unwrap_or_default();
        Ok(Value::String(text.replace(search, replacement)))
    }
}

/// Number of items in an array, keys in an object or characters in text.
pub struct Length;

impl FormulaFunction for Length {
    fn name(&self) -> &'static str {
        "length"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(ANY)
    }

    fn description(&self) -> &'static str {
        "Returns the length of a text, array or object."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "length('Hello, World!')",
            result: "13",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let length = match any_arg(&args, 0) {
            Value::Array(items) => items.len(),
            Value::Object(entries) => entries.len(),
            Value::String(text) => text.chars().count(),
            _ => return Ok(Value::Null),
        };
        Ok(Value::Number(length as f64))
    }
}

pub struct Contains;

impl FormulaFunction for Contains {
    fn name(&self) -> &'static str {
        "contains"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[ArgumentType::any(), ArgumentType::any()];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Checks whether a text contains a value, an array contains an item or an object has a key."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "contains('Hello, World!', 'World')",
            result: "true",
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let needle = any_arg(&args, 1);
        let found = match any_arg(&args, 0) {
            Value::Array(items) => items.iter().any(|item| item.strict_equals(needle)),
            Value::Object(entries) => needle.as_str().is_some_and(|key| entries.contains_key(key)),
            Value::String(text) => text.contains(&ensure_string(needle)),
            _ => return Ok(Value::Null),
        };
        Ok(Value::Boolean(found))
    }
}

pub struct Reverse;

impl FormulaFunction for Reverse {
    fn name(&self) -> &'static str {
        "reverse"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(ANY)
    }

    fn description(&self) -> &'static str {
        "Reverses the characters of a text or the items of an array."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "reverse('Hello, World!')",
            result: r#""!dlroW ,olleH""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        match any_arg(&args, 0) {
            Value::Array(items) => Ok(Value::Array(items.iter().rev().cloned().collect())),
            Value::String(text) => Ok(Value::String(text.chars().rev().collect())),
            _ => Ok(Value::Null),
        }
    }
}

pub struct Join;

impl FormulaFunction for Join {
    fn name(&self) -> &'static str {
        "join"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[ArgumentType::any(), ArgumentType::text().optional()];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Joins the items of an array, or the characters of a text, with a separator (default `,`)."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "join(to_array('a,b,c'), ' - ')",
            result: r#""a - b - c""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let separator = text_arg(&args, 1).unwrap_or(",");
        let parts: Vec<String> = match any_arg(&args, 0) {
            Value::Array(items) => items.iter().map(ensure_string).collect(),
            Value::String(text) => text.chars().map(String::from).collect(),
            _ => return Ok(Value::Null),
        };
        Ok(Value::String(parts.join(separator)))
    }
}

pub struct Split;

impl FormulaFunction for Split {
    fn name(&self) -> &'static str {
        "split"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[ArgumentType::text(), ArgumentType::text().optional()];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Splits text on a separator. Without a separator the text is split into characters."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "split('a,b,c', ',')",
            result: r#"["a", "b", "c"]"#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let text = text_arg(&args, 0).unwrap_or_default();
        let separator = text_arg(&args, 1).unwrap_or_default();
        let parts: Vec<Value> = if separator.is_empty() {
            text.chars().map(|c| Value::String(c.to_string())).collect()
        } else {
            text.split(separator).map(Value::from).collect()
        };
        Ok(Value::Array(parts))
    }
}

/// Trims surrounding whitespace; blank text has nothing left and yields `null`.
pub struct Strip;

impl FormulaFunction for Strip {
    fn name(&self) -> &'static str {
        "strip"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(TEXT)
    }

    fn description(&self) -> &'static str {
        "Removes whitespace from the start and end of the text. Returns null for blank or numeric text."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "strip('  Hello, World!  ')",
            result: r#""Hello, World!""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let text = text_arg(&args, 0).unwrap_or_default();
        // Blank and numeric text have nothing to strip
        if !text_to_number(text).is_nan() {
            return Ok(Value::Null);
        }
        Ok(Value::String(text.trim().to_string()))
    }
}

pub struct At;

impl FormulaFunction for At {
    fn name(&self) -> &'static str {
        "at"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[ArgumentType::any(), ArgumentType::int()];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Returns the item of an array, or the character of a text, at the given index."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "at('Hello', 1)",
            result: r#""e""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let index = number_arg(self.name(), &args, 1)?;
        if index < 0.0 {
            return Ok(Value::Null);
        }
        let index = index as usize;

        let found = match any_arg(&args, 0) {
            Value::Array(items) => items.get(index).cloned(),
            Value::String(text) => text.chars().nth(index).map(|c| Value::String(c.to_string())),
            _ => None,
        };
        Ok(found.unwrap_or(Value::Null))
    }
}

pub struct ToArray;

impl FormulaFunction for ToArray {
    fn name(&self) -> &'static str {
        "to_array"
    }

    fn category(&self) -> Category {
        Category::Text
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(TEXT)
    }

    fn description(&self) -> &'static str {
        "Converts comma separated text into an array."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "to_array('a, b, c')",
            result: r#"["a", "b", "c"]"#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        Ok(ensure_array(any_arg(&args, 0))
            .map(Value::Array)
            .unwrap_or(Value::Null))
    }
}
