//! as3ts_diagnostics: Errors and warnings produced while converting a file.
//!
//! A conversion either fails with a [`ConvertError`] (fatal to that one file)
//! or succeeds with a list of warning [`Diagnostic`]s describing every place
//! where the output was degraded to passthrough or commented text.

use as3ts_core::text::TextRange;
use as3ts_core::LineMap;
use std::fmt;

/// A failure that aborts the conversion of a single file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    /// Unterminated string, regex, comment or XML literal, or an unexpected end of input.
    #[error("{file}({line},{column}): {message}")]
    Lexical {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },
    /// A token did not match what the grammar required.
    #[error("{file}({line},{column}): expected '{expected}' but found '{actual}'")]
    Syntax {
        file: String,
        line: usize,
        column: usize,
        expected: String,
        actual: String,
    },
    /// Broken internal invariant: scope mismatch or a missing structural child.
    #[error("{file}: internal error: {message}")]
    Internal { file: String, message: String },
}

impl ConvertError {
    /// Build a lexical error, resolving the 1-based position through the line map.
    pub fn lexical(file: &str, line_map: &LineMap, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_map.position_of(offset);
        ConvertError::Lexical {
            file: file.to_string(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Build a syntax error, resolving the 1-based position through the line map.
    pub fn syntax(
        file: &str,
        line_map: &LineMap,
        offset: usize,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let (line, column) = line_map.position_of(offset);
        ConvertError::Syntax {
            file: file.to_string(),
            line,
            column,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn internal(file: &str, message: impl Into<String>) -> Self {
        ConvertError::Internal {
            file: file.to_string(),
            message: message.into(),
        }
    }

    /// The file this error belongs to.
    pub fn file(&self) -> &str {
        match self {
            ConvertError::Lexical { file, .. }
            | ConvertError::Syntax { file, .. }
            | ConvertError::Internal { file, .. } => file,
        }
    }

    /// 1-based line and column, when the error points into the source.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ConvertError::Lexical { line, column, .. } | ConvertError::Syntax { line, column, .. } => {
                Some((*line, *column))
            }
            ConvertError::Internal { .. } => None,
        }
    }
}

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Message => write!(f, "message"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<String>,
    pub range: Option<TextRange>,
    /// 1-based line and column of `range.pos`.
    pub position: Option<(usize, usize)>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    /// Create a new diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            range: None,
            position: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    /// Create a new diagnostic pointing at a range of a file.
    pub fn with_location(
        file: &str,
        line_map: &LineMap,
        range: TextRange,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            file: Some(file.to_string()),
            range: Some(range),
            position: Some(line_map.position_of(range.pos)),
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}", file)?;
            if let Some((line, column)) = self.position {
                write!(f, "({},{})", line, column)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} AS{}: {}", self.category, self.code, self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// A collection of diagnostics accumulated while converting one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether any diagnostic carries the given code.
    pub fn contains_code(&self, code: u32) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Sort diagnostics by file and position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then_with(|| a.range.map(|r| r.pos).cmp(&b.range.map(|r| r.pos)))
        });
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
        ($code:expr, Message, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Message, message: $msg }
        };
    }

    // ========================================================================
    // Degraded output (5000-5099)
    // ========================================================================
    pub const IS_CHECK_ON_CUSTOM_TYPE: DiagnosticMessage = diag!(5001, Warning, "'is {0}' was converted to 'instanceof'; interfaces and primitives wrapped in '{0}' are not detected.");
    pub const UNRESOLVED_WILDCARD_IMPORT: DiagnosticMessage = diag!(5002, Warning, "Wildcard import '{0}' has no known definitions and was commented out.");
    pub const INCLUDE_NOT_SPLICED: DiagnosticMessage = diag!(5003, Warning, "Include of '{0}' was commented out; the included file must be converted separately.");
    pub const MODIFIER_COMMENTED_OUT: DiagnosticMessage = diag!(5004, Warning, "Modifier '{0}' has no equivalent and was commented out.");
    pub const METADATA_COMMENTED_OUT: DiagnosticMessage = diag!(5005, Warning, "Metadata '{0}' was commented out.");
    pub const E4X_COPIED_UNCHANGED: DiagnosticMessage = diag!(5006, Warning, "E4X expression '{0}' has no equivalent and was copied unchanged.");
    pub const USE_NAMESPACE_COMMENTED_OUT: DiagnosticMessage = diag!(5007, Warning, "'use namespace {0}' was commented out.");
    pub const REMAPPED_IMPORT_COMMENTED_OUT: DiagnosticMessage = diag!(5008, Warning, "Import of '{0}' is provided by the target as '{1}' and was commented out.");
    pub const CONDITIONAL_GUARD_DROPPED: DiagnosticMessage = diag!(5009, Warning, "Conditional compilation guard '{0}' around class members was commented out; the members are always emitted.");

    // ========================================================================
    // Informational (5100-5199)
    // ========================================================================
    pub const AUTO_IMPORT_ADDED: DiagnosticMessage = diag!(5101, Message, "Added import for '{0}'.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        assert_eq!(format_message("'{0}' then '{1}'", &["a", "b"]), "'a' then 'b'");
    }

    #[test]
    fn test_syntax_error_display() {
        let map = LineMap::new("class A {\n  var x\n");
        let err = ConvertError::syntax("A.as", &map, 12, "}", "EOF");
        assert_eq!(err.to_string(), "A.as(2,3): expected '}' but found 'EOF'");
        assert_eq!(err.position(), Some((2, 3)));
        assert_eq!(err.file(), "A.as");
    }

    #[test]
    fn test_diagnostic_display() {
        let map = LineMap::new("x is Foo");
        let diag = Diagnostic::with_location(
            "B.as",
            &map,
            TextRange::new(0, 8),
            &messages::IS_CHECK_ON_CUSTOM_TYPE,
            &["Foo"],
        );
        assert!(diag.to_string().starts_with("B.as(1,1): warning AS5001: 'is Foo'"));
        assert!(!diag.is_error());
    }
}
