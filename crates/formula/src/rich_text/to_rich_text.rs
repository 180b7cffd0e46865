use crate::ast::{Expr, escape_string_content, quote_string};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{FormulaFunction, FunctionRegistry};
use crate::value::{Value, ensure_numeric};

use super::{Attrs, EditorMode, Fragment, Node, NodeType, ZWS};

/// Render a parsed formula as a rich-text document for the given editor mode.
pub fn to_rich_text(
    expr: &Expr,
    registry: &FunctionRegistry,
    mode: EditorMode,
) -> FormulaResult<Node> {
    let builder = RichTextBuilder { registry, mode };
    let fragment = builder.visit(expr)?;
    Ok(match mode {
        EditorMode::Advanced => advanced_doc(fragment),
        EditorMode::Simple => simple_doc(fragment),
    })
}

/// Advanced documents are one paragraph, starting with a caret position.
fn advanced_doc(fragment: Fragment) -> Node {
    let mut content: Vec<Node> = fragment
        .into_nodes()
        .into_iter()
        .flat_map(|node| match node.kind {
            NodeType::Wrapper => node.content.unwrap_or_default(),
            _ => vec![node],
        })
        .collect();
    if !content.first().is_some_and(Node::is_zws) {
        content.insert(0, Node::zws());
    }
    Node::doc(vec![Node::wrapper(content)])
}

/// Simple documents keep the paragraphs produced by `concat`, if any.
fn simple_doc(fragment: Fragment) -> Node {
    match fragment {
        Fragment::Nodes(nodes) if nodes.iter().all(|node| node.kind == NodeType::Wrapper) => {
            Node::doc(nodes)
        }
        Fragment::Nodes(nodes) => Node::doc(vec![Node::wrapper(nodes)]),
        Fragment::Node(node) if node.kind == NodeType::Wrapper => Node::doc(vec![node]),
        Fragment::Node(node) => Node::doc(vec![Node::wrapper(vec![node])]),
    }
}

fn push_fragment(content: &mut Vec<Node>, fragment: Fragment) {
    match fragment {
        Fragment::Node(node) => content.push(node),
        Fragment::Nodes(nodes) => content.extend(nodes),
    }
}

struct RichTextBuilder<'a> {
    registry: &'a FunctionRegistry,
    mode: EditorMode,
}

impl RichTextBuilder<'_> {
    fn visit(&self, expr: &Expr) -> FormulaResult<Fragment> {
        match expr {
            Expr::String(value) => Ok(self.string_literal(value)),
            Expr::Decimal(_) | Expr::Integer(_) | Expr::Boolean(_) => {
                Ok(Node::text(expr.to_string()).into())
            }
            Expr::Group(inner) => self.group(inner),
            Expr::FunctionCall { name, args } => {
                let args: Vec<&Expr> = args.iter().collect();
                self.call(&name.to_lowercase(), &args)
            }
            Expr::BinaryOp { op, left, right } => {
                self.call(op.function_name(), &[left.as_ref(), right.as_ref()])
            }
        }
    }

    fn string_literal(&self, value: &str) -> Fragment {
        match self.mode {
            EditorMode::Simple if value == "\n" => Node::new(NodeType::NewLine).into(),
            EditorMode::Simple if value.is_empty() => Node::zws().into(),
            EditorMode::Simple => Node::text(value).into(),
            EditorMode::Advanced if value.contains('\n') && value != "\n" => {
                // Line breaks inside a literal are shown as hard breaks
                let parts: Vec<&str> = value.split('\n').collect();
                let last = parts.len() - 1;
                let mut nodes = Vec::with_capacity(parts.len() * 2);
                for (idx, part) in parts.iter().enumerate() {
                    let mut text = escape_string_content(part, '\'');
                    if idx == 0 {
                        text.insert(0, '\'');
                    }
                    if idx == last {
                        text.push('\'');
                    }
                    nodes.push(Node::text(text));
                    if idx < last {
                        nodes.push(Node::new(NodeType::HardBreak));
                    }
                }
                Fragment::Nodes(nodes)
            }
            EditorMode::Advanced => Node::text(quote_string(value)).into(),
        }
    }

    fn group(&self, inner: &Expr) -> FormulaResult<Fragment> {
        let inner = self.visit(inner)?;
        if self.mode == EditorMode::Simple {
            return Ok(inner);
        }

        let mut content = vec![
            Node::zws(),
            Node::new(NodeType::GroupOpeningParen),
            Node::zws(),
        ];
        push_fragment(&mut content, inner);
        content.extend([
            Node::zws(),
            Node::new(NodeType::GroupClosingParen),
            Node::zws(),
        ]);
        Ok(Fragment::Nodes(content))
    }

    fn call(&self, name: &str, args: &[&Expr]) -> FormulaResult<Fragment> {
        let function = self
            .registry
            .get(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;
        let args = args
            .iter()
            .map(|arg| self.visit(arg))
            .collect::<FormulaResult<Vec<_>>>()?;

        if let Some(fragment) = function.to_rich_text(&args, self.mode) {
            return Ok(match fragment {
                // Inline components need a caret position on both sides
                Fragment::Node(node) if is_component(&node) => {
                    Fragment::Nodes(vec![Node::zws(), node, Node::zws()])
                }
                other => other,
            });
        }

        match (function.operator_symbol(), <[Fragment; 2]>::try_from(args)) {
            (Some(symbol), Ok([left, right])) => Ok(self.operator(symbol, left, right)),
            (_, Ok(pair)) => Ok(self.function(function, pair.into())),
            (_, Err(args)) => Ok(self.function(function, args)),
        }
    }

    fn operator(&self, symbol: &str, left: Fragment, right: Fragment) -> Fragment {
        let mut content = Vec::new();
        push_fragment(&mut content, self.text_argument(left));
        match self.mode {
            EditorMode::Advanced => {
                content.push(Node::new(NodeType::OperatorComponent).with_attrs(Attrs {
                    operator_symbol: Some(symbol.to_string()),
                    ..Default::default()
                }));
                // Keeps `a - -1` apart from a negative literal
                if symbol == "-" {
                    content.push(Node::text(" "));
                }
            }
            EditorMode::Simple => content.push(Node::text(symbol)),
        }
        push_fragment(&mut content, self.text_argument(right));

        match self.mode {
            EditorMode::Advanced => Fragment::Nodes(content),
            EditorMode::Simple => Node::wrapper(content).into(),
        }
    }

    fn function(&self, function: &dyn FormulaFunction, args: Vec<Fragment>) -> Fragment {
        let has_no_args = args.is_empty();

        match self.mode {
            EditorMode::Advanced => {
                let mut content = vec![
                    Node::zws(),
                    Node::new(NodeType::FunctionComponent).with_attrs(Attrs {
                        function_name: Some(function.name().to_string()),
                        has_no_args: Some(has_no_args),
                        ..Default::default()
                    }),
                ];
                for (idx, arg) in args.into_iter().enumerate() {
                    if idx > 0 {
                        content.push(Node::new(NodeType::ArgumentComma));
                    }
                    push_fragment(&mut content, arg);
                }
                content.push(Node::new(NodeType::ClosingParen).with_attrs(Attrs {
                    no_args: Some(has_no_args),
                    ..Default::default()
                }));
                content.push(Node::zws());
                Fragment::Nodes(content)
            }
            EditorMode::Simple => {
                let mut content = vec![Node::text(format!("{}(", function.name()))];
                for (idx, arg) in args.into_iter().enumerate() {
                    if idx > 0 {
                        content.push(Node::text(", "));
                    }
                    push_fragment(&mut content, self.text_argument(arg));
                }
                content.push(Node::text(")"));
                Node::wrapper(content).into()
            }
        }
    }

    /// Simple-mode text is unquoted, so text arguments get quotes back unless they read as
    /// a number or a boolean.
    fn text_argument(&self, fragment: Fragment) -> Fragment {
        if self.mode != EditorMode::Simple {
            return fragment;
        }
        let Some(text) = fragment.as_node().and_then(Node::text_content) else {
            return fragment;
        };

        if text == ZWS || text.is_empty() {
            return Node::text("\"\"").into();
        }
        let is_literal = text == "true"
            || text == "false"
            || ensure_numeric(&Value::from(text)).is_some();
        if is_literal {
            return fragment;
        }
        Node::text(format!("\"{}\"", escape_string_content(text, '"'))).into()
    }
}

fn is_component(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeType::GetComponent | NodeType::FunctionComponent | NodeType::Custom(_)
    )
}
