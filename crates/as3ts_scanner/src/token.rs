//! Tokens produced by the scanner.

use crate::char_codes::{is_digit, is_identifier_start};

/// A scanned token. The text borrows the source; `end` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub is_numeric: bool,
    pub is_xml: bool,
}

impl<'a> Token<'a> {
    pub fn new(text: &'a str, start: usize) -> Self {
        Self {
            text,
            start,
            is_numeric: false,
            is_xml: false,
        }
    }

    pub fn numeric(text: &'a str, start: usize) -> Self {
        Self {
            is_numeric: true,
            ..Self::new(text, start)
        }
    }

    pub fn xml(text: &'a str, start: usize) -> Self {
        Self {
            is_xml: true,
            ..Self::new(text, start)
        }
    }

    /// End offset (exclusive).
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Whether the token text equals `text`.
    #[inline]
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    /// The end-of-file token has empty text.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_newline(&self) -> bool {
        self.text.starts_with('\n') || self.text.starts_with('\r')
    }

    pub fn is_comment(&self) -> bool {
        self.text.starts_with("//") || self.text.starts_with("/*")
    }

    /// A `/** ... */` documentation comment.
    pub fn is_doc_comment(&self) -> bool {
        self.text.starts_with("/**") && self.text != "/**/"
    }

    pub fn is_string(&self) -> bool {
        self.text.starts_with('"') || self.text.starts_with('\'')
    }

    /// Whether this token is shaped like an identifier (keywords included).
    pub fn is_identifier_like(&self) -> bool {
        !self.is_numeric
            && self
                .text
                .chars()
                .next()
                .map_or(false, |c| is_identifier_start(c) && !is_digit(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_classification() {
        let t = Token::new("foo", 3);
        assert_eq!(t.end(), 6);
        assert!(t.is_identifier_like());
        assert!(!Token::numeric("42", 0).is_identifier_like());
        assert!(Token::new("/** doc */", 0).is_doc_comment());
        assert!(!Token::new("/**/", 0).is_doc_comment());
        assert!(Token::new("\r\n", 0).is_newline());
        assert!(Token::new("", 10).is_eof());
    }
}
