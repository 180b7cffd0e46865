use crate::ast::BinaryOperator;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::{is_ident_continue, is_ident_start, parse_formula};

use super::{EditorMode, Node, NodeType, ZWS};

/// The formula text of an empty string literal.
const EMPTY_LITERAL: &str = "''";
/// A newline string literal.
const NEW_LINE_LITERAL: &str = r"'\n'";

/// Read a rich-text document back into formula text.
///
/// An empty document is the empty formula. Content that cannot be mapped to formula text,
/// such as a function component without a name, is an error rather than dropped.
pub fn from_rich_text(
    node: &Node,
    registry: &FunctionRegistry,
    mode: EditorMode,
) -> FormulaResult<String> {
    let reader = FormulaWriter { registry, mode };
    Ok(reader.visit(node)?.unwrap_or_default())
}

struct FormulaWriter<'a> {
    registry: &'a FunctionRegistry,
    mode: EditorMode,
}

impl FormulaWriter<'_> {
    /// Formula text for `node`; `None` for a caret-only text node.
    fn visit(&self, node: &Node) -> FormulaResult<Option<String>> {
        let text = match &node.kind {
            NodeType::Text => return Ok(self.visit_text(node)),
            NodeType::Doc => self.visit_doc(node)?,
            NodeType::Wrapper => self.visit_wrapper(node)?,
            NodeType::FunctionComponent => {
                let name = node
                    .attrs
                    .as_ref()
                    .and_then(|attrs| attrs.function_name.as_deref())
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        FormulaError::Conversion("function component without a name".into())
                    })?;
                format!("{name}(")
            }
            NodeType::ArgumentComma => ",".to_string(),
            NodeType::ClosingParen | NodeType::GroupClosingParen => ")".to_string(),
            NodeType::GroupOpeningParen => "(".to_string(),
            NodeType::OperatorComponent => {
                let symbol = node
                    .attrs
                    .as_ref()
                    .and_then(|attrs| attrs.operator_symbol.as_deref())
                    .unwrap_or_default();
                match BinaryOperator::from_symbol(symbol) {
                    Some(BinaryOperator::Minus) => "- ".to_string(),
                    Some(op) => op.symbol().to_string(),
                    None => return Err(FormulaError::UnknownOperator(symbol.to_string())),
                }
            }
            NodeType::HardBreak if self.mode == EditorMode::Advanced => "\n".to_string(),
            NodeType::HardBreak | NodeType::NewLine => NEW_LINE_LITERAL.to_string(),
            NodeType::GetComponent | NodeType::Custom(_) => self.visit_component(node)?,
        };
        Ok(Some(text))
    }

    fn visit_text(&self, node: &Node) -> Option<String> {
        let text = node.text.as_deref().unwrap_or_default();
        if text == ZWS {
            return None;
        }
        let clean = text.replace(ZWS, "");
        match self.mode {
            EditorMode::Simple => Some(format!(
                "'{}'",
                clean.replace('\\', r"\\").replace('\'', r"\'")
            )),
            EditorMode::Advanced => Some(clean),
        }
    }

    /// Nodes owned by a function component, such as the `get` chip.
    fn visit_component(&self, node: &Node) -> FormulaResult<String> {
        let node_type = node.kind.as_str();
        self.registry
            .by_component_type(node_type)
            .and_then(|function| function.from_rich_text(node))
            .ok_or_else(|| FormulaError::Conversion(format!("unsupported node `{node_type}`")))
    }

    fn visit_doc(&self, node: &Node) -> FormulaResult<String> {
        let parts = self.visit_all(node.children())?;
        match parts.as_slice() {
            [] => Ok(String::new()),
            [only] if only == EMPTY_LITERAL => Ok(String::new()),
            [only] => Ok(only.clone()),
            _ => {
                // One call may have been split over several paragraphs
                let flat: Vec<&Node> = node
                    .children()
                    .iter()
                    .flat_map(|wrapper| wrapper.children())
                    .collect();
                if let Some(call) = self.assemble_function_call(&flat)? {
                    return Ok(call);
                }
                Ok(format!(
                    "concat({})",
                    parts.join(&format!(", {NEW_LINE_LITERAL}, "))
                ))
            }
        }
    }

    fn visit_wrapper(&self, node: &Node) -> FormulaResult<String> {
        let children = node.children();
        match children {
            [] => return Ok(EMPTY_LITERAL.to_string()),
            [only] => {
                return Ok(self
                    .visit(only)?
                    .unwrap_or_else(|| EMPTY_LITERAL.to_string()));
            }
            _ => {}
        }

        let refs: Vec<&Node> = children.iter().collect();
        if let Some(call) = self.assemble_function_call(&refs)? {
            return Ok(call);
        }

        let parts = self.visit_all(children)?;
        Ok(match self.mode {
            EditorMode::Simple => match parts.as_slice() {
                [] => EMPTY_LITERAL.to_string(),
                [only] => only.clone(),
                _ => format!("concat({})", parts.join(", ")),
            },
            EditorMode::Advanced => parts.concat(),
        })
    }

    fn visit_all(&self, nodes: &[Node]) -> FormulaResult<Vec<String>> {
        let mut parts = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(part) = self.visit(node)? {
                parts.push(part);
            }
        }
        Ok(parts)
    }

    /// Rebuilds `name(...)` typed as free text around inline components.
    ///
    /// Text nodes contribute their raw text. The result is only used when it parses.
    fn assemble_function_call(&self, content: &[&Node]) -> FormulaResult<Option<String>> {
        let [first, .., last] = content else {
            return Ok(None);
        };
        let (Some(first), Some(last)) = (first.text_content(), last.text_content()) else {
            return Ok(None);
        };
        if !starts_with_call(first) || !last.contains(')') {
            return Ok(None);
        }

        let mut formula = String::new();
        for node in content {
            match node.text_content() {
                Some(text) => formula.push_str(&text.replace(ZWS, "")),
                None => formula.push_str(&self.visit(node)?.unwrap_or_default()),
            }
        }

        if parse_formula(&formula).is_err() {
            log::debug!("discarding unparsable function call text `{formula}`");
            return Ok(None);
        }
        Ok(Some(formula))
    }
}

/// Whether `text` opens with `identifier(`, allowing blanks before the bracket.
fn starts_with_call(text: &str) -> bool {
    let mut chars = text.chars();
    if !chars.next().is_some_and(is_ident_start) {
        return false;
    }
    let rest = chars.as_str().trim_start_matches(is_ident_continue);
    rest.trim_start().starts_with('(')
}
