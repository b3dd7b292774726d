//! Text range and line map types for source location tracking.
//!
//! Every token and AST node records byte offsets into the original source;
//! these helpers turn those offsets back into slices and human readable
//! positions.

use std::fmt;
use std::ops::Range;

/// A position in source text, measured as a byte offset from the start.
pub type TextPos = usize;

/// A text range with start and end positions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextRange {
    /// The byte offset where this range starts (inclusive).
    pub pos: TextPos,
    /// The byte offset where this range ends (exclusive).
    pub end: TextPos,
}

impl TextRange {
    /// Create a new text range.
    #[inline]
    pub fn new(pos: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= pos);
        Self { pos, end }
    }

    /// Create an empty range at a position.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self { pos, end: pos }
    }

    /// The length of this range in bytes.
    #[inline]
    pub fn len(&self) -> TextPos {
        self.end - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.end
    }

    /// Whether this range contains a position.
    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        pos >= self.pos && pos < self.end
    }

    /// Whether `other` lies entirely within this range.
    #[inline]
    pub fn encloses(&self, other: &TextRange) -> bool {
        other.pos >= self.pos && other.end <= self.end
    }

    /// Convert to a byte range.
    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.pos..self.end
    }

    /// Return a new range covering both this range and the other.
    pub fn union(&self, other: &TextRange) -> TextRange {
        TextRange::new(self.pos.min(other.pos), self.end.max(other.end))
    }
}

impl fmt::Debug for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.pos, self.end)
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.pos, self.end)
    }
}

/// Line and column information derived from source text.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LineAndColumn {
    /// 0-based line number.
    pub line: usize,
    /// 0-based column, counted in characters.
    pub character: usize,
}

impl LineAndColumn {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// A map from byte offsets to line numbers, built from source text.
///
/// Line starts are precomputed once per file; lookups are a binary search.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offsets of the start of each line.
    line_starts: Vec<TextPos>,
    text: String,
}

impl LineMap {
    /// Build a line map from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            text: text.to_string(),
        }
    }

    /// Get the line number (0-based) for a byte offset.
    pub fn line_of(&self, pos: TextPos) -> usize {
        match self.line_starts.binary_search(&pos) {
            Ok(line) => line,
            Err(line) => line - 1,
        }
    }

    /// Get the 0-based line and column for a byte offset.
    pub fn line_and_column_of(&self, pos: TextPos) -> LineAndColumn {
        let pos = pos.min(self.text.len());
        let line = self.line_of(pos);
        let line_start = self.line_starts[line];
        let character = self
            .text
            .get(line_start..pos)
            .map_or(pos - line_start, |s| s.chars().count());
        LineAndColumn { line, character }
    }

    /// 1-based `(line, column)` for a byte offset, as shown in error messages.
    pub fn position_of(&self, pos: TextPos) -> (usize, usize) {
        let lc = self.line_and_column_of(pos);
        (lc.line + 1, lc.character + 1)
    }

    /// Get the byte offset of the start of a line.
    pub fn line_start(&self, line: usize) -> TextPos {
        self.line_starts[line]
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
