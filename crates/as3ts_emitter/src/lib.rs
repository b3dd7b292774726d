//! as3ts_emitter: Rewrites a parsed ActionScript 3 file as TypeScript.
//!
//! The emitter copies the original text through a cursor and only rewrites
//! the constructs that differ between the two languages, so formatting and
//! comments survive conversion. Identifiers are resolved against a scope
//! arena to add `this.` and class qualifiers, and unresolved class names get
//! an import synthesized at the top of the file.

mod declarations;
pub mod emitter;
mod expressions;
pub mod extension;
pub mod options;
pub mod paths;
pub mod scope;
mod statements;
pub mod tables;

pub use emitter::{emit, emit_file, normalize_line_endings, EmitResult, Emitter};
pub use expressions::xml_template;
pub use extension::{Extension, TableExtension};
pub use options::EmitterOptions;
pub use tables::BuiltinTables;
