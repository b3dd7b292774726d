//! as3ts_scanner: Lexer for ActionScript 3 source code.
//!
//! Produces tokens lazily from source text with support for:
//! - newline tokens for statement-boundary heuristics
//! - comment tokens (filtered by the parser, not here)
//! - regular expression literals, rescanned on demand by the parser
//! - E4X XML literals
//! - `Vector.<T>` generic syntax via vector mode

mod char_codes;
mod scanner;
mod token;

pub use scanner::{Checkpoint, ScanError, Scanner};
pub use token::Token;
