//! as3ts_parser: Recursive descent parser for ActionScript 3.
//!
//! Consumes tokens from the scanner and builds an owned, position-tagged
//! [`Node`](as3ts_ast::Node) tree for one compilation unit.

mod parser;
mod precedence;
mod utilities;

pub use parser::{parse, Parser};
pub use precedence::OperatorPrecedence;
