//! The owned syntax tree produced by the parser.

use crate::node_kind::NodeKind;
use as3ts_core::text::TextRange;
use serde::Serialize;

/// A uniform AST node: kind tag, source range, optional text and ordered children.
///
/// A node ends where its last child ends, or at its own closing delimiter
/// (`)`, `]`, `}`) when it has one; children occupy strictly increasing,
/// non-overlapping ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// A node without children covering `start..end`.
    pub fn leaf(kind: NodeKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            start,
            end,
            text: None,
            children: Vec::new(),
        }
    }

    /// A childless node carrying text, such as an identifier or literal.
    pub fn with_text(kind: NodeKind, start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            start,
            end,
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    /// A node spanning from `start` to the end of its last child.
    pub fn with_children(kind: NodeKind, start: usize, children: Vec<Node>) -> Self {
        let end = children.iter().map(|c| c.end).max().unwrap_or(start).max(start);
        Self {
            kind,
            start,
            end,
            text: None,
            children,
        }
    }

    /// Extend the node over a closing delimiter ending at `end`.
    pub fn closed_at(mut self, end: usize) -> Self {
        self.end = self.end.max(end);
        self
    }

    /// Set the text, returning the node.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child, growing the node's end to cover it.
    pub fn push(&mut self, child: Node) {
        debug_assert!(child.start >= self.start);
        if self.children.is_empty() {
            self.end = child.end.max(self.start);
        } else {
            self.end = self.end.max(child.end);
        }
        self.children.push(child);
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }

    /// The node's text, or the empty string.
    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn find_child(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn find_children(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last()
    }

    /// Visit this node and all descendants in source order.
    pub fn walk<'n>(&'n self, f: &mut impl FnMut(&'n Node)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Pretty-printed JSON dump of the tree, for golden-file tests.
    pub fn to_debug_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Return a copy of the tree without comment nodes.
///
/// Ranges are kept as parsed; a node whose only children were comments
/// keeps its original span.
pub fn filter_ast(node: &Node) -> Node {
    Node {
        kind: node.kind,
        start: node.start,
        end: node.end,
        text: node.text.clone(),
        children: node
            .children
            .iter()
            .filter(|c| !c.kind.is_comment())
            .map(filter_ast)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(start: usize, text: &str) -> Node {
        Node::with_text(NodeKind::Identifier, start, start + text.len(), text)
    }

    #[test]
    fn test_with_children_spans_last_child() {
        let node = Node::with_children(NodeKind::Add, 0, vec![ident(0, "a"), ident(4, "b")]);
        assert_eq!(node.range(), TextRange::new(0, 5));
    }

    #[test]
    fn test_push_grows_end() {
        let mut block = Node::leaf(NodeKind::Block, 10, 12);
        block.push(ident(12, "x"));
        assert_eq!(block.end, 13);
        block.push(ident(20, "yy"));
        assert_eq!(block.end, 22);
    }

    #[test]
    fn test_closed_at_covers_delimiter() {
        let group = Node::with_children(NodeKind::Encapsulated, 0, vec![ident(1, "a")]).closed_at(3);
        assert_eq!(group.range(), TextRange::new(0, 3));
        assert_eq!(group.children[0].end, 2);
    }

    #[test]
    fn test_filter_ast_drops_comments() {
        let unit = Node::with_children(
            NodeKind::CompilationUnit,
            0,
            vec![
                Node::leaf(NodeKind::DocComment, 0, 10),
                ident(11, "a"),
                Node::leaf(NodeKind::MultiLineComment, 13, 20),
            ],
        );
        let filtered = filter_ast(&unit);
        assert_eq!(filtered.children.len(), 1);
        assert_eq!(filtered.children[0].text_str(), "a");
        assert_eq!(filtered.end, 20);
    }

    #[test]
    fn test_debug_json_omits_empty_fields() {
        let json = ident(0, "x").to_debug_json().unwrap();
        assert!(json.contains("\"Identifier\""));
        assert!(!json.contains("children"));
    }
}
