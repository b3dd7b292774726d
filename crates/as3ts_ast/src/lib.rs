//! as3ts_ast: Syntax tree for ActionScript 3 sources.
//!
//! The parser builds an owned [`Node`] tree whose nodes record the exact byte
//! range they were derived from. Before emission the tree is moved into an
//! [`AstTree`] arena, which adds parent links for sibling and ancestor queries.

pub mod keywords;
pub mod modifiers;
pub mod node;
pub mod node_kind;
pub mod tree;

pub use modifiers::ModifierFlags;
pub use node::{filter_ast, Node};
pub use node_kind::NodeKind;
pub use tree::{AstTree, NodeId, TreeNode};
