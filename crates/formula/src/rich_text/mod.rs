//! Rich-text document model exchanged with the visual formula editor.
//!
//! A document is a tree of [`Node`]s serialised as JSON. [`to_rich_text`] renders a parsed
//! formula into a document and [`from_rich_text`] reads a document back into formula text.
//! Both directions come in a `simple` flavour (free text with data references) and an
//! `advanced` flavour (every call, comma and bracket is an atomic node).

use serde::{Deserialize, Serialize};

mod from_rich_text;
mod to_rich_text;

pub use from_rich_text::from_rich_text;
pub use to_rich_text::to_rich_text;

/// Zero-width space: an invisible caret position next to atomic nodes.
pub const ZWS: &str = "\u{200B}";

/// Which editor the document is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Simple,
    Advanced,
}

impl std::str::FromStr for EditorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(EditorMode::Simple),
            "advanced" => Ok(EditorMode::Advanced),
            _ => Err(anyhow::anyhow!("Unknown editor mode: {}", s)),
        }
    }
}

/// Node types understood by the editor.
///
/// Types contributed by individual functions deserialise into [`NodeType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "doc")]
    Doc,
    #[serde(rename = "wrapper")]
    Wrapper,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "newLine")]
    NewLine,
    #[serde(rename = "hardBreak")]
    HardBreak,
    #[serde(rename = "function-formula-component")]
    FunctionComponent,
    #[serde(rename = "function-argument-comma")]
    ArgumentComma,
    #[serde(rename = "function-closing-paren")]
    ClosingParen,
    #[serde(rename = "group-opening-paren")]
    GroupOpeningParen,
    #[serde(rename = "group-closing-paren")]
    GroupClosingParen,
    #[serde(rename = "operator-formula-component")]
    OperatorComponent,
    #[serde(rename = "get-formula-component")]
    GetComponent,
    #[serde(untagged)]
    Custom(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Doc => "doc",
            NodeType::Wrapper => "wrapper",
            NodeType::Text => "text",
            NodeType::NewLine => "newLine",
            NodeType::HardBreak => "hardBreak",
            NodeType::FunctionComponent => "function-formula-component",
            NodeType::ArgumentComma => "function-argument-comma",
            NodeType::ClosingParen => "function-closing-paren",
            NodeType::GroupOpeningParen => "group-opening-paren",
            NodeType::GroupClosingParen => "group-closing-paren",
            NodeType::OperatorComponent => "operator-formula-component",
            NodeType::GetComponent => "get-formula-component",
            NodeType::Custom(name) => name,
        }
    }
}

/// Node attributes. Only the ones relevant for a node type are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_no_args: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_args: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_selected: Option<bool>,
}

/// A node of the rich-text tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attrs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Node {
    pub fn new(kind: NodeType) -> Self {
        Self {
            kind,
            attrs: None,
            content: None,
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(NodeType::Text)
        }
    }

    /// A text node holding only the zero-width space.
    pub fn zws() -> Self {
        Self::text(ZWS)
    }

    pub fn doc(content: Vec<Node>) -> Self {
        Self {
            content: Some(content),
            ..Self::new(NodeType::Doc)
        }
    }

    pub fn wrapper(content: Vec<Node>) -> Self {
        Self {
            content: Some(content),
            ..Self::new(NodeType::Wrapper)
        }
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = Some(attrs);
        self
    }

    /// Children, empty when the node has no content.
    pub fn children(&self) -> &[Node] {
        self.content.as_deref().unwrap_or_default()
    }

    /// The text of a text node.
    pub fn text_content(&self) -> Option<&str> {
        match self.kind {
            NodeType::Text => self.text.as_deref(),
            _ => None,
        }
    }

    pub fn is_zws(&self) -> bool {
        self.text_content() == Some(ZWS)
    }

    pub fn attrs(&self) -> Attrs {
        self.attrs.clone().unwrap_or_default()
    }
}

/// Output of rendering one sub-expression: a single node or a run of sibling nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Node(Node),
    Nodes(Vec<Node>),
}

impl Fragment {
    /// The single node, if this fragment is one.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Fragment::Node(node) => Some(node),
            Fragment::Nodes(_) => None,
        }
    }

    pub fn into_nodes(self) -> Vec<Node> {
        match self {
            Fragment::Node(node) => vec![node],
            Fragment::Nodes(nodes) => nodes,
        }
    }
}

impl From<Node> for Fragment {
    fn from(node: Node) -> Self {
        Fragment::Node(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_json_uses_editor_names() {
        let node = Node::new(NodeType::FunctionComponent).with_attrs(Attrs {
            function_name: Some("upper".into()),
            has_no_args: Some(false),
            ..Default::default()
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "function-formula-component",
                "attrs": {"functionName": "upper", "hasNoArgs": false}
            })
        );
    }

    #[test]
    fn unknown_node_types_are_kept() {
        let node: Node = serde_json::from_str(r#"{"type": "my-component"}"#).unwrap();
        assert_eq!(node.kind, NodeType::Custom("my-component".into()));
        assert_eq!(node.kind.as_str(), "my-component");

        let known: Node = serde_json::from_str(r#"{"type": "hardBreak"}"#).unwrap();
        assert_eq!(known.kind, NodeType::HardBreak);
    }
}
