//! Index-addressed arena of nodes with parent links, used during emission.

use crate::node::Node;
use crate::node_kind::NodeKind;

/// Index of a node inside an [`AstTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node stored in the arena.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
    pub text: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Position of this node in its parent's child list.
    pub index_in_parent: usize,
}

impl TreeNode {
    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// The arena. Node 0 is the root; parents are assigned while building.
#[derive(Debug, Clone)]
pub struct AstTree {
    nodes: Vec<TreeNode>,
}

impl AstTree {
    /// Move an owned tree into the arena, assigning parent links.
    pub fn build(root: Node) -> Self {
        let mut tree = AstTree { nodes: Vec::new() };
        tree.add(root, None, 0);
        tree
    }

    fn add(&mut self, node: Node, parent: Option<NodeId>, index_in_parent: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode {
            kind: node.kind,
            start: node.start,
            end: node.end,
            text: node.text,
            children: Vec::with_capacity(node.children.len()),
            parent,
            index_in_parent,
        });
        for (i, child) in node.children.into_iter().enumerate() {
            let child_id = self.add(child, Some(id), i);
            self.nodes[id.index()].children.push(child_id);
        }
        id
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.get(id).text_str()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id);
        let parent = node.parent?;
        if node.index_in_parent == 0 {
            return None;
        }
        self.child(parent, node.index_in_parent - 1)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id);
        let parent = node.parent?;
        self.child(parent, node.index_in_parent + 1)
    }

    pub fn find_child(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&c| self.kind(c) == kind)
    }

    pub fn find_children(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.kind(c) == kind)
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Nearest ancestor of the given kind.
    pub fn find_ancestor(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self.kind(a) == kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
