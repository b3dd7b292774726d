//! as3ts_core: Core utilities shared by every stage of the converter.
//!
//! Provides source positions, the line map used for error reporting and
//! the hash collections used throughout the pipeline.

pub mod collections;
pub mod text;

// Re-export commonly used types
pub use collections::{FxHashSet, FxMap, OrderedSet};
pub use text::{LineMap, TextRange};
