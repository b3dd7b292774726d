//! The ActionScript 3 scanner.
//!
//! Converts source text into tokens on demand. The scanner is restartable:
//! the parser snapshots it with [`Scanner::checkpoint`] and rewinds with
//! [`Scanner::restore`] when a speculative parse fails.

use crate::char_codes::*;
use crate::token::Token;
use tracing::trace;

/// Operator and punctuation tokens, longest first so the first match wins.
const OPERATORS: &[&str] = &[
    ">>>=", "...", "!==", "===", "<<=", ">>=", ">>>", "&&=", "||=", "::", "!=", "%=", "&&",
    "&=", "*=", "++", "+=", "--", "-=", "<<", "<=", "==", ">=", ">>", "^=", "|=", "||", "..",
    "!", "%", "&", "(", ")", "*", "+", ",", "-", ".", ":", ";", "<", "=", ">", "?", "@", "[",
    "]", "^", "{", "|", "}", "~",
];

/// A lexical failure: the offset of the construct that could not be finished.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct ScanError {
    pub offset: usize,
    pub message: &'static str,
}

/// Saved scanner position for speculative scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub index: usize,
    pub vector_depth: u32,
}

/// The scanner converts source text into tokens.
pub struct Scanner<'a> {
    source: &'a str,
    /// Byte offset of the next character to scan.
    index: usize,
    /// Number of `.<` openers whose `>` has not been seen yet.
    vector_depth: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            index: 0,
            vector_depth: 0,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Current byte offset.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether a `Vector.<` type argument is open.
    #[inline]
    pub fn in_vector(&self) -> bool {
        self.vector_depth > 0
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            index: self.index,
            vector_depth: self.vector_depth,
        }
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.index = checkpoint.index;
        self.vector_depth = checkpoint.vector_depth;
    }

    /// Run `f` and rewind afterwards, whatever it returned.
    pub fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.checkpoint();
        let result = f(self);
        self.restore(saved);
        result
    }

    /// Run `f`; rewind only if it returned `None`.
    pub fn try_scan<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let saved = self.checkpoint();
        let result = f(self);
        if result.is_none() {
            self.restore(saved);
        }
        result
    }

    // ========================================================================
    // Character access
    // ========================================================================

    #[inline]
    fn rest(&self) -> &'a str {
        &self.source[self.index..]
    }

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The character `n` characters after the current one.
    #[inline]
    fn char_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    #[inline]
    fn current_byte(&self) -> Option<u8> {
        self.source.as_bytes().get(self.index).copied()
    }

    #[inline]
    fn advance_char(&mut self) {
        if let Some(ch) = self.current_char() {
            self.index += ch.len_utf8();
        }
    }

    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn token_from(&self, start: usize) -> Token<'a> {
        Token::new(&self.source[start..self.index], start)
    }

    // ========================================================================
    // Core scanning
    // ========================================================================

    /// Scan the next token. Returns the EOF token (empty text) at the end.
    pub fn next_token(&mut self) -> Result<Token<'a>, ScanError> {
        while let Some(ch) = self.current_char() {
            if is_white_space_single_line(ch) {
                self.index += ch.len_utf8();
            } else {
                break;
            }
        }

        let Some(ch) = self.current_char() else {
            return Ok(Token::new("", self.source.len()));
        };

        if is_line_break(ch) {
            return Ok(self.scan_newline());
        }

        let start = self.index;
        match ch {
            '"' | '\'' => self.scan_string(ch).ok_or(ScanError {
                offset: start,
                message: "unterminated string literal",
            }),
            '0'..='9' => Ok(self.scan_number()),
            '.' if self.char_at(1).map_or(false, is_digit) => Ok(self.scan_number()),
            '.' => Ok(self.scan_dot()),
            '/' => self.scan_slash(),
            '<' => {
                if let Some(xml) = self.try_scan(|s| s.scan_xml()) {
                    return Ok(xml);
                }
                Ok(self.scan_operator())
            }
            '>' if self.vector_depth > 0 => {
                self.index += 1;
                self.vector_depth -= 1;
                Ok(self.token_from(start))
            }
            _ if is_identifier_start(ch) => Ok(self.scan_identifier()),
            _ => Ok(self.scan_operator()),
        }
    }

    /// One token for a newline plus any whitespace and blank lines after it.
    fn scan_newline(&mut self) -> Token<'a> {
        let start = self.index;
        if self.starts_with("\r\n") {
            self.index += 2;
        } else {
            self.advance_char();
        }
        let token = self.token_from(start);
        while let Some(ch) = self.current_char() {
            if is_line_break(ch) || is_white_space_single_line(ch) {
                self.index += ch.len_utf8();
            } else {
                break;
            }
        }
        token
    }

    fn scan_operator(&mut self) -> Token<'a> {
        let start = self.index;
        match OPERATORS.iter().find(|op| self.starts_with(op)) {
            Some(op) => self.index += op.len(),
            None => self.advance_char(),
        }
        self.token_from(start)
    }

    fn scan_dot(&mut self) -> Token<'a> {
        let start = self.index;
        if self.starts_with(".<") {
            self.index += 2;
            self.vector_depth += 1;
            return self.token_from(start);
        }
        self.scan_operator()
    }

    fn scan_slash(&mut self) -> Result<Token<'a>, ScanError> {
        let start = self.index;
        if self.starts_with("//") {
            let rest = &self.source.as_bytes()[self.index..];
            let len = memchr::memchr2(b'\n', b'\r', rest).unwrap_or(rest.len());
            self.index += len;
            return Ok(self.token_from(start));
        }
        if self.starts_with("/*") {
            let body = &self.source.as_bytes()[self.index + 2..];
            return match memchr::memmem::find(body, b"*/") {
                Some(pos) => {
                    self.index += 2 + pos + 2;
                    Ok(self.token_from(start))
                }
                None => Err(ScanError {
                    offset: start,
                    message: "unterminated comment",
                }),
            };
        }
        if self.starts_with("/=") {
            self.index += 2;
        } else {
            self.index += 1;
        }
        Ok(self.token_from(start))
    }

    /// Scan a quoted string. An odd run of backslashes before a quote escapes it.
    fn scan_string(&mut self, quote: char) -> Option<Token<'a>> {
        let start = self.index;
        let bytes = self.source.as_bytes();
        let quote = quote as u8;
        let mut i = start + 1;
        let mut backslashes = 0usize;
        while i < bytes.len() {
            let b = bytes[i];
            if b == b'\n' || b == b'\r' {
                return None;
            }
            if b == quote && backslashes % 2 == 0 {
                self.index = i + 1;
                return Some(self.token_from(start));
            }
            backslashes = if b == b'\\' { backslashes + 1 } else { 0 };
            i += 1;
        }
        None
    }

    fn scan_number(&mut self) -> Token<'a> {
        let start = self.index;
        if self.starts_with("0x") || self.starts_with("0X") {
            self.index += 2;
            while self.current_char().map_or(false, is_hex_digit) {
                self.index += 1;
            }
            return Token::numeric(&self.source[start..self.index], start);
        }
        self.scan_digits();
        if self.current_char() == Some('.') && self.char_at(1).map_or(false, is_digit) {
            self.index += 1;
            self.scan_digits();
        }
        if matches!(self.current_char(), Some('e') | Some('E')) {
            let exponent_digit = match self.char_at(1) {
                Some('+') | Some('-') => self.char_at(2),
                other => other,
            };
            if exponent_digit.map_or(false, is_digit) {
                self.index += 1;
                if matches!(self.current_char(), Some('+') | Some('-')) {
                    self.index += 1;
                }
                self.scan_digits();
            }
        }
        Token::numeric(&self.source[start..self.index], start)
    }

    fn scan_digits(&mut self) {
        while self.current_char().map_or(false, is_digit) {
            self.index += 1;
        }
    }

    fn scan_identifier(&mut self) -> Token<'a> {
        let start = self.index;
        self.advance_char();
        while self.current_char().map_or(false, is_identifier_part) {
            self.advance_char();
        }
        self.token_from(start)
    }

    // ========================================================================
    // Regular expressions
    // ========================================================================

    /// Rescan from `start` (a `/` the parser expects to open a regex literal).
    ///
    /// On failure the scanner is left where it was and `None` is returned, so
    /// the caller keeps treating the slash as an operator.
    ///
    /// Acceptance is structural only and approximates compiling the pattern:
    /// the literal must close on its line with balanced groups and classes
    /// and use known flags. A pattern that passes but would not compile is
    /// still returned as a regex token.
    pub fn scan_regex(&mut self, start: usize) -> Option<Token<'a>> {
        let saved = self.checkpoint();
        self.index = start;
        let result = self.scan_regex_body();
        match result {
            Some(token) => Some(token),
            None => {
                trace!(offset = start, "slash is not a regular expression");
                self.restore(saved);
                None
            }
        }
    }

    fn scan_regex_body(&mut self) -> Option<Token<'a>> {
        let start = self.index;
        if self.current_char() != Some('/') {
            return None;
        }
        self.index += 1;
        if matches!(self.current_char(), Some('*') | Some('/')) {
            return None;
        }
        let mut in_class = false;
        let mut groups = 0i32;
        loop {
            let ch = self.current_char()?;
            if is_line_break(ch) {
                return None;
            }
            match ch {
                '\\' => {
                    self.index += 1;
                    match self.current_char() {
                        Some(c) if !is_line_break(c) => self.index += c.len_utf8(),
                        _ => return None,
                    }
                    continue;
                }
                '[' if !in_class => in_class = true,
                ']' if in_class => in_class = false,
                '(' if !in_class => groups += 1,
                ')' if !in_class => {
                    groups -= 1;
                    if groups < 0 {
                        return None;
                    }
                }
                '/' if !in_class => {
                    self.index += 1;
                    break;
                }
                _ => {}
            }
            self.index += ch.len_utf8();
        }
        if groups != 0 {
            return None;
        }
        let flags_start = self.index;
        while self.current_char().map_or(false, is_identifier_part) {
            self.advance_char();
        }
        let flags = &self.source[flags_start..self.index];
        let mut seen = String::new();
        for flag in flags.chars() {
            if !is_regex_flag(flag) || seen.contains(flag) {
                return None;
            }
            seen.push(flag);
        }
        Some(self.token_from(start))
    }

    // ========================================================================
    // XML literals
    // ========================================================================

    fn scan_xml(&mut self) -> Option<Token<'a>> {
        let start = self.index;
        self.xml_element()?;
        Some(Token::xml(&self.source[start..self.index], start))
    }

    /// Scan one element (or comment, CDATA, processing instruction) at `<`.
    fn xml_element(&mut self) -> Option<()> {
        if self.current_byte() != Some(b'<') {
            return None;
        }
        if self.xml_skip_special() {
            return Some(());
        }
        self.index += 1;
        let name = if self.current_byte() == Some(b'{') {
            self.skip_braces()?;
            None
        } else {
            Some(self.xml_name())
        };
        if name == Some("") && self.current_byte() != Some(b'>') {
            return None;
        }

        // Attributes
        loop {
            let had_space = self.skip_xml_space();
            if self.starts_with("/>") {
                self.index += 2;
                return Some(());
            }
            match self.current_byte()? {
                b'>' => {
                    self.index += 1;
                    break;
                }
                b'{' if had_space => self.skip_braces()?,
                _ if had_space => {
                    if self.xml_name().is_empty() {
                        return None;
                    }
                    self.skip_xml_space();
                    if self.current_byte() != Some(b'=') {
                        return None;
                    }
                    self.index += 1;
                    self.skip_xml_space();
                    self.xml_attribute_value()?;
                }
                _ => return None,
            }
        }

        // Content until the matching close tag
        loop {
            match self.current_byte()? {
                b'<' if self.starts_with("</") => {
                    self.index += 2;
                    let close = if self.current_byte() == Some(b'{') {
                        self.skip_braces()?;
                        None
                    } else {
                        Some(self.xml_name())
                    };
                    self.skip_xml_space();
                    if self.current_byte() != Some(b'>') {
                        return None;
                    }
                    self.index += 1;
                    if let (Some(open), Some(close)) = (name, close) {
                        if open != close {
                            return None;
                        }
                    }
                    return Some(());
                }
                b'<' => self.xml_element()?,
                b'{' => self.skip_braces()?,
                _ => self.advance_char(),
            }
        }
    }

    /// Skip `<!-- -->`, `<![CDATA[ ]]>` or `<? ?>` if one starts here.
    fn xml_skip_special(&mut self) -> bool {
        let terminator = if self.starts_with("<!--") {
            "-->"
        } else if self.starts_with("<![CDATA[") {
            "]]>"
        } else if self.starts_with("<?") {
            "?>"
        } else {
            return false;
        };
        let body = &self.source.as_bytes()[self.index..];
        match memchr::memmem::find(body, terminator.as_bytes()) {
            Some(pos) => {
                self.index += pos + terminator.len();
                true
            }
            None => false,
        }
    }

    fn xml_name(&mut self) -> &'a str {
        let start = self.index;
        if self.current_char().map_or(false, is_xml_name_start) {
            self.advance_char();
            while self.current_char().map_or(false, is_xml_name_part) {
                self.advance_char();
            }
        }
        &self.source[start..self.index]
    }

    fn xml_attribute_value(&mut self) -> Option<()> {
        match self.current_byte()? {
            quote @ (b'"' | b'\'') => {
                let body = &self.source.as_bytes()[self.index + 1..];
                let pos = memchr::memchr(quote, body)?;
                self.index += pos + 2;
                Some(())
            }
            b'{' => self.skip_braces(),
            _ => None,
        }
    }

    /// Returns whether any whitespace was skipped.
    fn skip_xml_space(&mut self) -> bool {
        let start = self.index;
        while self.current_char().map_or(false, char::is_whitespace) {
            self.advance_char();
        }
        self.index > start
    }

    /// Skip a balanced `{ ... }` embedded expression, honoring string literals.
    fn skip_braces(&mut self) -> Option<()> {
        let mut depth = 0u32;
        loop {
            let ch = self.current_char()?;
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.index += 1;
                        return Some(());
                    }
                }
                '"' | '\'' => {
                    self.scan_string(ch)?;
                    continue;
                }
                _ => {}
            }
            self.index += ch.len_utf8();
        }
    }
}
