//! The ActionScript 3 parser implementation.
//!
//! A recursive descent parser with one function per grammar production. It
//! pulls tokens from the scanner one at a time and builds an owned [`Node`]
//! tree. A node ends where its last child ends unless it owns a closing
//! delimiter, in which case it ends after that delimiter.

use as3ts_ast::keywords::is_reserved;
use as3ts_ast::{Node, NodeKind};
use as3ts_core::text::LineMap;
use as3ts_diagnostics::ConvertError;
use as3ts_scanner::{Checkpoint, Scanner, Token};
use tracing::{debug, trace};

use crate::precedence::{get_binary_operator_precedence, is_assignment_operator, OperatorPrecedence};
use crate::utilities::*;

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

type PResult<T> = Result<T, ConvertError>;

/// Parse one source file into its compilation unit.
pub fn parse(file_name: &str, content: &str) -> Result<Node, ConvertError> {
    debug!(file = file_name, bytes = content.len(), "parsing");
    Parser::new(file_name, content).parse_compilation_unit()
}

/// Where a directive appears; decides metadata and constructor handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Unit,
    Package,
    Class,
    Block,
}

/// Everything needed to rewind a speculative parse.
#[derive(Clone, Copy)]
struct ParserCheckpoint<'a> {
    scanner: Checkpoint,
    token: Token<'a>,
    newline_before: bool,
    pending_comments: usize,
}

/// The parser produces a compilation unit from ActionScript 3 source text.
pub struct Parser<'a> {
    file_name: String,
    source: &'a str,
    scanner: Scanner<'a>,
    line_map: LineMap,
    /// Current token; comments and newlines never appear here.
    token: Token<'a>,
    /// Whether a newline separated the current token from the previous one.
    newline_before: bool,
    /// Block comments scanned since the last list flush.
    pending_comments: Vec<Node>,
    /// Name of the class whose body is being parsed, for constructor detection.
    class_name: Option<String>,
    /// Cleared inside `for (...)` headers so `in` is not read as an operator.
    allow_in: bool,
    /// Tracks recursion depth to prevent stack overflow on deeply nested input.
    recursion_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(file_name: &str, source: &'a str) -> Self {
        Self {
            file_name: file_name.to_string(),
            source,
            scanner: Scanner::new(source),
            line_map: LineMap::new(source),
            token: Token::new("", 0),
            newline_before: false,
            pending_comments: Vec::new(),
            class_name: None,
            allow_in: true,
            recursion_depth: 0,
        }
    }

    pub fn parse_compilation_unit(mut self) -> PResult<Node> {
        self.next_token()?;
        let mut unit = Node::leaf(NodeKind::CompilationUnit, 0, 0);
        loop {
            self.flush_comments(&mut unit);
            if self.is_eof() {
                break;
            }
            let item = if self.is("package") {
                self.parse_package()?
            } else {
                self.parse_directive(Context::Unit)?
            };
            unit.push(item);
        }
        Ok(unit)
    }

    // ========================================================================
    // Token management
    // ========================================================================

    /// Advance to the next significant token, recording newlines and block comments.
    fn next_token(&mut self) -> PResult<()> {
        self.newline_before = false;
        loop {
            let token = self
                .scanner
                .next_token()
                .map_err(|e| self.lexical_error(e.offset, e.message))?;
            if token.is_newline() {
                self.newline_before = true;
                continue;
            }
            if token.is_comment() {
                if token.text.starts_with("/*") {
                    let kind = if token.is_doc_comment() {
                        NodeKind::DocComment
                    } else {
                        NodeKind::MultiLineComment
                    };
                    self.pending_comments
                        .push(Node::with_text(kind, token.start, token.end(), token.text));
                }
                continue;
            }
            self.token = token;
            return Ok(());
        }
    }

    #[inline]
    fn is(&self, text: &str) -> bool {
        self.token.is(text)
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.token.is_eof()
    }

    fn consume(&mut self, text: &str) -> PResult<Token<'a>> {
        if self.is(text) {
            let token = self.token;
            self.next_token()?;
            Ok(token)
        } else {
            Err(self.error_expected(text))
        }
    }

    fn skip_if(&mut self, text: &str) -> PResult<bool> {
        if self.is(text) {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume a name that is not a reserved word.
    fn consume_identifier(&mut self) -> PResult<Token<'a>> {
        if self.token.is_identifier_like() && !is_reserved(self.token.text) {
            let token = self.token;
            self.next_token()?;
            Ok(token)
        } else {
            Err(self.error_expected("identifier"))
        }
    }

    /// Consume any identifier-shaped token, reserved words included (member names).
    fn consume_name(&mut self) -> PResult<Token<'a>> {
        if self.token.is_identifier_like() {
            let token = self.token;
            self.next_token()?;
            Ok(token)
        } else {
            Err(self.error_expected("identifier"))
        }
    }

    /// Current token as an `Op` node, then advance.
    fn op_node(&mut self) -> PResult<Node> {
        let token = self.token;
        self.next_token()?;
        Ok(Node::with_text(NodeKind::Op, token.start, token.end(), token.text))
    }

    fn is_statement_end(&self) -> bool {
        self.newline_before || self.is(";") || self.is("}") || self.is_eof()
    }

    /// Semicolons are optional before a newline, a closing brace or EOF.
    fn parse_semicolon(&mut self) -> PResult<()> {
        if self.skip_if(";")? || self.is_statement_end() {
            Ok(())
        } else {
            Err(self.error_expected(";"))
        }
    }

    /// Consume a closing delimiter and extend the node over it.
    fn close(&mut self, node: &mut Node, text: &str) -> PResult<Token<'a>> {
        let token = self.consume(text)?;
        node.end = node.end.max(token.end());
        Ok(token)
    }

    /// Move pending comments that lie after the container's last child into it.
    fn flush_comments(&mut self, container: &mut Node) {
        let mut floor = container.last_child().map_or(container.start, |c| c.end);
        for comment in std::mem::take(&mut self.pending_comments) {
            if comment.start >= floor {
                floor = comment.end;
                container.push(comment);
            }
        }
    }

    fn error_expected(&self, expected: &str) -> ConvertError {
        ConvertError::syntax(
            &self.file_name,
            &self.line_map,
            self.token.start,
            expected,
            describe_token(self.token.text),
        )
    }

    fn lexical_error(&self, offset: usize, message: &str) -> ConvertError {
        ConvertError::lexical(&self.file_name, &self.line_map, offset, message)
    }

    // ========================================================================
    // Speculation
    // ========================================================================

    fn checkpoint(&self) -> ParserCheckpoint<'a> {
        ParserCheckpoint {
            scanner: self.scanner.checkpoint(),
            token: self.token,
            newline_before: self.newline_before,
            pending_comments: self.pending_comments.len(),
        }
    }

    fn restore(&mut self, checkpoint: ParserCheckpoint<'a>) {
        self.scanner.restore(checkpoint.scanner);
        self.token = checkpoint.token;
        self.newline_before = checkpoint.newline_before;
        self.pending_comments.truncate(checkpoint.pending_comments);
    }

    /// Run `f` and rewind afterwards.
    fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.checkpoint();
        let result = f(self);
        self.restore(saved);
        result
    }

    /// Attempt a production; on any error rewind and return `None`.
    fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> Option<T> {
        let saved = self.checkpoint();
        match f(self) {
            Ok(value) => Some(value),
            Err(err) => {
                trace!(%err, "speculative parse rewound");
                self.restore(saved);
                None
            }
        }
    }

    /// Text of the token `n` positions ahead, or "" when scanning fails.
    fn peek_nth(&mut self, n: usize) -> &'a str {
        self.look_ahead(|p| {
            for _ in 0..n {
                if p.next_token().is_err() {
                    return "";
                }
            }
            p.token.text
        })
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.recursion_depth >= MAX_RECURSION_DEPTH {
            return Err(self.error_expected("less deeply nested code"));
        }
        self.recursion_depth += 1;
        let result = f(self);
        self.recursion_depth -= 1;
        result
    }

    fn with_allow_in<T>(&mut self, allow: bool, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let saved = std::mem::replace(&mut self.allow_in, allow);
        let result = f(self);
        self.allow_in = saved;
        result
    }

    // ========================================================================
    // Directives and declarations
    // ========================================================================

    fn parse_package(&mut self) -> PResult<Node> {
        let keyword = self.consume("package")?;
        let mut package = Node::leaf(NodeKind::Package, keyword.start, keyword.end());
        if !self.is("{") {
            package.push(self.parse_dotted_name(NodeKind::Name, false)?);
        }
        package.push(self.parse_content(Context::Package)?);
        Ok(package)
    }

    /// `{ directives }` as a `Content` node.
    fn parse_content(&mut self, context: Context) -> PResult<Node> {
        let open = self.consume("{")?;
        let mut content = Node::leaf(NodeKind::Content, open.start, open.end());
        self.parse_directives(&mut content, context)?;
        self.close(&mut content, "}")?;
        Ok(content)
    }

    /// Parse directives into `container` until `}` or EOF.
    fn parse_directives(&mut self, container: &mut Node, context: Context) -> PResult<()> {
        loop {
            self.flush_comments(container);
            if self.is("}") || self.is_eof() {
                return Ok(());
            }
            let item = self.parse_directive(context)?;
            container.push(item);
        }
    }

    fn parse_directive(&mut self, context: Context) -> PResult<Node> {
        self.guarded(|p| p.parse_directive_worker(context))
    }

    fn parse_directive_worker(&mut self, context: Context) -> PResult<Node> {
        let text = self.token.text;
        match text {
            "import" => return self.parse_import(),
            "use" if self.peek_nth(1) == "namespace" => return self.parse_use(),
            "include" if self.look_ahead(|p| p.next_token().is_ok() && p.token.is_string()) => {
                return self.parse_include()
            }
            "[" if context != Context::Block => return self.parse_declaration(context),
            _ => {}
        }
        if self.is_start_of_declaration() {
            return self.parse_declaration(context);
        }
        self.parse_statement(context)
    }

    /// Whether the current token begins `modifiers* (class|interface|function|var|const)`.
    fn is_start_of_declaration(&mut self) -> bool {
        let first = self.token;
        if first.is("function") {
            return self.peek_nth(1) != "(";
        }
        if is_declaration_keyword(first.text) {
            return true;
        }
        let user_namespace = !is_modifier_keyword(first.text);
        if !first.is_identifier_like() || (user_namespace && is_reserved(first.text)) {
            return false;
        }
        self.look_ahead(|p| {
            let mut first_step = true;
            loop {
                if p.next_token().is_err() {
                    return false;
                }
                if first_step && user_namespace && p.newline_before {
                    return false;
                }
                first_step = false;
                let text = p.token.text;
                if is_declaration_keyword(text) {
                    return true;
                }
                if text == "::" {
                    if p.next_token().is_err() || !p.token.is_identifier_like() {
                        return false;
                    }
                    continue;
                }
                if is_modifier_keyword(text) || (p.token.is_identifier_like() && !is_reserved(text)) {
                    continue;
                }
                return false;
            }
        })
    }

    fn parse_declaration(&mut self, context: Context) -> PResult<Node> {
        let metadata = if self.is("[") {
            Some(self.parse_meta_list()?)
        } else {
            None
        };
        let modifiers = self.parse_modifiers()?;
        match self.token.text {
            "class" => self.parse_class(metadata, modifiers),
            "interface" => self.parse_interface(metadata, modifiers),
            "function" => self.parse_function(metadata, modifiers, context),
            "var" | "const" => {
                let list = self.parse_var_list(metadata, modifiers)?;
                self.parse_semicolon()?;
                Ok(list)
            }
            _ => Err(self.error_expected("declaration")),
        }
    }

    /// A declaration node starting at its metadata, modifiers or keyword.
    fn start_declaration(
        &self,
        kind: NodeKind,
        keyword_start: usize,
        metadata: Option<Node>,
        modifiers: Option<Node>,
    ) -> Node {
        let start = metadata
            .as_ref()
            .or(modifiers.as_ref())
            .map_or(keyword_start, |n| n.start);
        let mut node = Node::leaf(kind, start, keyword_start);
        if let Some(metadata) = metadata {
            node.push(metadata);
        }
        if let Some(modifiers) = modifiers {
            node.push(modifiers);
        }
        node
    }

    fn parse_meta_list(&mut self) -> PResult<Node> {
        let mut list = Node::leaf(NodeKind::MetaList, self.token.start, self.token.start);
        while self.is("[") {
            list.push(self.parse_meta()?);
        }
        Ok(list)
    }

    /// `[Name(args)]`; the node text is everything between the brackets.
    fn parse_meta(&mut self) -> PResult<Node> {
        let open = self.consume("[")?;
        let mut depth = 1u32;
        loop {
            if self.is_eof() {
                return Err(self.error_expected("]"));
            }
            if self.is("[") {
                depth += 1;
            } else if self.is("]") {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            self.next_token()?;
        }
        let close = self.token;
        self.next_token()?;
        let inner = self.source[open.end()..close.start].trim();
        Ok(Node::with_text(NodeKind::Meta, open.start, close.end(), inner))
    }

    /// Modifier keywords and user namespaces before a declaration keyword.
    fn parse_modifiers(&mut self) -> PResult<Option<Node>> {
        let mut list: Option<Node> = None;
        while self.token.is_identifier_like() && !is_declaration_keyword(self.token.text) {
            let first = self.token;
            self.next_token()?;
            let mut modifier = Node::with_text(NodeKind::Modifier, first.start, first.end(), first.text);
            if self.is("::") {
                self.next_token()?;
                let name = self.consume_name()?;
                modifier.end = name.end();
                modifier.text = Some(format!("{}::{}", first.text, name.text));
            }
            list.get_or_insert_with(|| Node::leaf(NodeKind::ModList, first.start, first.start))
                .push(modifier);
        }
        Ok(list)
    }

    fn parse_import(&mut self) -> PResult<Node> {
        let keyword = self.consume("import")?;
        let path = self.parse_dotted_name(NodeKind::Import, true)?;
        self.parse_semicolon()?;
        Ok(Node::with_text(NodeKind::Import, keyword.start, path.end, path.text_str()))
    }

    fn parse_use(&mut self) -> PResult<Node> {
        let keyword = self.consume("use")?;
        self.consume("namespace")?;
        let name = self.parse_dotted_name(NodeKind::Name, false)?;
        self.parse_semicolon()?;
        Ok(Node::with_text(NodeKind::Use, keyword.start, name.end, name.text_str()))
    }

    fn parse_include(&mut self) -> PResult<Node> {
        let keyword = self.consume("include")?;
        let file = self.token;
        if !file.is_string() {
            return Err(self.error_expected("string"));
        }
        self.next_token()?;
        self.parse_semicolon()?;
        let path = &file.text[1..file.text.len() - 1];
        Ok(Node::with_text(NodeKind::Include, keyword.start, file.end(), path))
    }

    /// `a.b.c` (or `a.b.*` when `allow_wildcard`) as a single leaf.
    fn parse_dotted_name(&mut self, kind: NodeKind, allow_wildcard: bool) -> PResult<Node> {
        let first = self.consume_name()?;
        let mut text = first.text.to_string();
        let mut end = first.end();
        while self.is(".") {
            self.next_token()?;
            if allow_wildcard && self.is("*") {
                text.push_str(".*");
                end = self.token.end();
                self.next_token()?;
                break;
            }
            let part = self.consume_name()?;
            text.push('.');
            text.push_str(part.text);
            end = part.end();
        }
        Ok(Node::with_text(kind, first.start, end, text))
    }

    fn parse_class(&mut self, metadata: Option<Node>, modifiers: Option<Node>) -> PResult<Node> {
        let keyword = self.consume("class")?;
        let mut class = self.start_declaration(NodeKind::Class, keyword.start, metadata, modifiers);
        let name = self.consume_identifier()?;
        class.push(Node::with_text(NodeKind::Name, name.start, name.end(), name.text));
        if self.is("extends") {
            let keyword = self.consume("extends")?;
            let mut extends = Node::leaf(NodeKind::Extends, keyword.start, keyword.end());
            extends.push(self.parse_type()?);
            class.push(extends);
        }
        if self.is("implements") {
            let keyword = self.consume("implements")?;
            let mut list = Node::leaf(NodeKind::ImplementsList, keyword.start, keyword.end());
            loop {
                list.push(self.parse_type()?);
                if !self.skip_if(",")? {
                    break;
                }
            }
            class.push(list);
        }
        let saved = self.class_name.replace(name.text.to_string());
        let content = self.parse_content(Context::Class);
        self.class_name = saved;
        class.push(content?);
        Ok(class)
    }

    fn parse_interface(&mut self, metadata: Option<Node>, modifiers: Option<Node>) -> PResult<Node> {
        let keyword = self.consume("interface")?;
        let mut interface =
            self.start_declaration(NodeKind::Interface, keyword.start, metadata, modifiers);
        let name = self.consume_identifier()?;
        interface.push(Node::with_text(NodeKind::Name, name.start, name.end(), name.text));
        if self.is("extends") {
            let keyword = self.consume("extends")?;
            let mut extends = Node::leaf(NodeKind::Extends, keyword.start, keyword.end());
            loop {
                extends.push(self.parse_type()?);
                if !self.skip_if(",")? {
                    break;
                }
            }
            interface.push(extends);
        }
        let saved = self.class_name.take();
        let content = self.parse_content(Context::Class);
        self.class_name = saved;
        interface.push(content?);
        Ok(interface)
    }

    fn parse_function(
        &mut self,
        metadata: Option<Node>,
        modifiers: Option<Node>,
        context: Context,
    ) -> PResult<Node> {
        let keyword = self.consume("function")?;
        let mut kind = NodeKind::Function;
        if is_accessor_keyword(self.token.text) && self.peek_nth(1) != "(" {
            kind = if self.is("get") { NodeKind::Get } else { NodeKind::Set };
            self.next_token()?;
        }
        let name = self.consume_identifier()?;

        let is_constructor = context == Context::Class
            && kind == NodeKind::Function
            && self.class_name.as_deref() == Some(name.text);
        let modifiers = match modifiers {
            None if is_constructor => {
                let mut list = Node::leaf(NodeKind::ModList, keyword.start, keyword.start);
                list.push(Node::with_text(NodeKind::Modifier, keyword.start, keyword.start, "public"));
                Some(list)
            }
            other => other,
        };

        let mut function = self.start_declaration(kind, keyword.start, metadata, modifiers);
        function.push(Node::with_text(NodeKind::Name, name.start, name.end(), name.text));
        function.push(self.parse_parameter_list()?);
        if self.skip_if(":")? {
            function.push(self.parse_type()?);
        }
        if self.is("{") {
            function.push(self.parse_block()?);
        } else {
            self.parse_semicolon()?;
        }
        Ok(function)
    }

    fn parse_parameter_list(&mut self) -> PResult<Node> {
        let open = self.consume("(")?;
        let mut list = Node::leaf(NodeKind::ParameterList, open.start, open.end());
        if !self.is(")") {
            loop {
                list.push(self.parse_parameter()?);
                if !self.skip_if(",")? {
                    break;
                }
            }
        }
        self.close(&mut list, ")")?;
        Ok(list)
    }

    fn parse_parameter(&mut self) -> PResult<Node> {
        let start = self.token.start;
        let mut parameter = Node::leaf(NodeKind::Parameter, start, start);
        if self.skip_if("...")? {
            let mut rest = Node::leaf(NodeKind::Rest, start, start);
            let name = self.consume_identifier()?;
            rest.push(Node::with_text(NodeKind::Name, name.start, name.end(), name.text));
            if self.skip_if(":")? {
                rest.push(self.parse_type()?);
            }
            parameter.push(rest);
        } else {
            parameter.push(self.parse_name_type_init()?);
        }
        Ok(parameter)
    }

    fn parse_var_list(&mut self, metadata: Option<Node>, modifiers: Option<Node>) -> PResult<Node> {
        let keyword = self.token;
        let kind = if keyword.is("const") {
            NodeKind::ConstList
        } else {
            NodeKind::VarList
        };
        self.next_token()?;
        let mut list = self.start_declaration(kind, keyword.start, metadata, modifiers);
        loop {
            list.push(self.parse_name_type_init()?);
            if !self.skip_if(",")? {
                break;
            }
        }
        Ok(list)
    }

    /// `name [: Type] [= init]`
    fn parse_name_type_init(&mut self) -> PResult<Node> {
        let name = self.consume_identifier()?;
        let mut node = Node::leaf(NodeKind::NameTypeInit, name.start, name.end());
        node.push(Node::with_text(NodeKind::Name, name.start, name.end(), name.text));
        if self.skip_if(":")? {
            node.push(self.parse_type()?);
        }
        if self.is("=") {
            let equals = self.consume("=")?;
            let mut init = Node::leaf(NodeKind::Init, equals.start, equals.end());
            init.push(self.parse_assignment_expression()?);
            node.push(init);
        }
        Ok(node)
    }

    /// A type annotation: `*`, a dotted name, or `Vector.<T>` (text = raw `T`).
    fn parse_type(&mut self) -> PResult<Node> {
        let start = self.token.start;
        if self.is("*") {
            let star = self.consume("*")?;
            return Ok(Node::with_text(NodeKind::Type, start, star.end(), "*"));
        }
        let name = self.parse_dotted_name(NodeKind::Type, false)?;
        if self.is(".<") {
            self.next_token()?;
            let element = self.parse_type()?;
            let close = self.consume(">")?;
            let element_text = &self.source[element.start..element.end];
            return Ok(Node::with_text(NodeKind::Vector, start, close.end(), element_text));
        }
        Ok(name)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_substatement(&mut self) -> PResult<Node> {
        self.parse_directive(Context::Block)
    }

    fn parse_statement(&mut self, context: Context) -> PResult<Node> {
        match self.token.text {
            "{" => return self.parse_block(),
            ";" => {
                let semicolon = self.consume(";")?;
                return Ok(Node::leaf(NodeKind::EmptyStatement, semicolon.start, semicolon.end()));
            }
            "if" => return self.parse_if_statement(),
            "for" => return self.parse_for_statement(),
            "while" => return self.parse_while_statement(),
            "do" => return self.parse_do_statement(),
            "switch" => return self.parse_switch_statement(),
            "try" => return self.parse_try_statement(),
            "return" => return self.parse_return_statement(),
            "throw" => return self.parse_throw_statement(),
            "break" | "continue" => return self.parse_break_or_continue(),
            _ => {}
        }
        if self.token.is_identifier_like() && !is_reserved(self.token.text) {
            match self.peek_nth(1) {
                ":" => return self.parse_labeled_statement(),
                "::" if self.peek_nth(3) == "{" => return self.parse_conditional_block(context),
                _ => {}
            }
        }
        let expression = self.parse_expression()?;
        self.parse_semicolon()?;
        Ok(expression)
    }

    fn parse_block(&mut self) -> PResult<Node> {
        self.parse_block_in(Context::Block)
    }

    fn parse_block_in(&mut self, context: Context) -> PResult<Node> {
        let open = self.consume("{")?;
        let mut block = Node::leaf(NodeKind::Block, open.start, open.end());
        self.with_allow_in(true, |p| p.parse_directives(&mut block, context))?;
        self.close(&mut block, "}")?;
        Ok(block)
    }

    /// `( expression )` as a `Condition` node starting at the parenthesis.
    fn parse_condition(&mut self) -> PResult<Node> {
        let open = self.consume("(")?;
        let expression = self.with_allow_in(true, |p| p.parse_expression())?;
        let close = self.consume(")")?;
        Ok(Node::with_children(NodeKind::Condition, open.start, vec![expression]).closed_at(close.end()))
    }

    fn parse_if_statement(&mut self) -> PResult<Node> {
        let keyword = self.consume("if")?;
        let mut node = Node::leaf(NodeKind::If, keyword.start, keyword.end());
        node.push(self.parse_condition()?);
        node.push(self.parse_substatement()?);
        if self.skip_if("else")? {
            node.push(self.parse_substatement()?);
        }
        Ok(node)
    }

    fn parse_for_statement(&mut self) -> PResult<Node> {
        let keyword = self.consume("for")?;
        let each = self.skip_if("each")?;
        self.consume("(")?;
        let init = if self.is(";") {
            None
        } else {
            Some(self.with_allow_in(false, |p| p.parse_for_init())?)
        };

        if each || (init.is_some() && self.is("in")) {
            let Some(init) = init else {
                return Err(self.error_expected("loop variable"));
            };
            let init = Node::with_children(NodeKind::Init, init.start, vec![init]);
            let in_keyword = self.consume("in")?;
            let container = self.with_allow_in(true, |p| p.parse_expression())?;
            let container = Node::with_children(NodeKind::In, in_keyword.start, vec![container]);
            self.consume(")")?;
            let body = self.parse_substatement()?;
            let kind = if each { NodeKind::ForEach } else { NodeKind::ForIn };
            return Ok(Node::with_children(kind, keyword.start, vec![init, container, body]));
        }

        let mut node = Node::leaf(NodeKind::For, keyword.start, keyword.end());
        if let Some(init) = init {
            node.push(Node::with_children(NodeKind::Init, init.start, vec![init]));
        }
        self.consume(";")?;
        if !self.is(";") {
            let condition = self.with_allow_in(true, |p| p.parse_expression())?;
            node.push(Node::with_children(NodeKind::Condition, condition.start, vec![condition]));
        }
        self.consume(";")?;
        if !self.is(")") {
            let iter = self.with_allow_in(true, |p| p.parse_expression())?;
            node.push(Node::with_children(NodeKind::Iter, iter.start, vec![iter]));
        }
        self.consume(")")?;
        node.push(self.parse_substatement()?);
        Ok(node)
    }

    fn parse_for_init(&mut self) -> PResult<Node> {
        if self.is("var") || self.is("const") {
            self.parse_var_list(None, None)
        } else {
            self.parse_expression()
        }
    }

    fn parse_while_statement(&mut self) -> PResult<Node> {
        let keyword = self.consume("while")?;
        let mut node = Node::leaf(NodeKind::While, keyword.start, keyword.end());
        node.push(self.parse_condition()?);
        node.push(self.parse_substatement()?);
        Ok(node)
    }

    fn parse_do_statement(&mut self) -> PResult<Node> {
        let keyword = self.consume("do")?;
        let mut node = Node::leaf(NodeKind::Do, keyword.start, keyword.end());
        node.push(self.parse_substatement()?);
        self.consume("while")?;
        node.push(self.parse_condition()?);
        self.skip_if(";")?;
        Ok(node)
    }

    fn parse_switch_statement(&mut self) -> PResult<Node> {
        let keyword = self.consume("switch")?;
        let mut node = Node::leaf(NodeKind::Switch, keyword.start, keyword.end());
        node.push(self.parse_condition()?);
        let open = self.consume("{")?;
        let mut block = Node::leaf(NodeKind::SwitchBlock, open.start, open.end());
        loop {
            self.flush_comments(&mut block);
            if self.is("}") || self.is_eof() {
                break;
            }
            let start = self.token.start;
            let mut case = Node::leaf(NodeKind::Case, start, self.token.end());
            if self.skip_if("case")? {
                case.push(self.with_allow_in(true, |p| p.parse_expression())?);
            } else if self.is("default") {
                let default = self.consume("default")?;
                case.push(Node::leaf(NodeKind::Default, default.start, default.end()));
            } else {
                return Err(self.error_expected("case"));
            }
            self.consume(":")?;
            loop {
                self.flush_comments(&mut case);
                if self.is("case") || self.is("default") || self.is("}") || self.is_eof() {
                    break;
                }
                case.push(self.parse_substatement()?);
            }
            block.push(case);
        }
        self.close(&mut block, "}")?;
        node.push(block);
        Ok(node)
    }

    fn parse_try_statement(&mut self) -> PResult<Node> {
        let keyword = self.consume("try")?;
        let mut node = Node::leaf(NodeKind::Try, keyword.start, keyword.end());
        node.push(self.parse_block()?);
        while self.is("catch") {
            let catch_keyword = self.consume("catch")?;
            let mut catch = Node::leaf(NodeKind::Catch, catch_keyword.start, catch_keyword.end());
            self.consume("(")?;
            catch.push(self.parse_name_type_init()?);
            self.consume(")")?;
            catch.push(self.parse_block()?);
            node.push(catch);
        }
        if self.is("finally") {
            let finally_keyword = self.consume("finally")?;
            let mut finally = Node::leaf(NodeKind::Finally, finally_keyword.start, finally_keyword.end());
            finally.push(self.parse_block()?);
            node.push(finally);
        }
        Ok(node)
    }

    fn parse_return_statement(&mut self) -> PResult<Node> {
        let keyword = self.consume("return")?;
        let mut node = Node::leaf(NodeKind::Return, keyword.start, keyword.end());
        if !self.is_statement_end() {
            node.push(self.with_allow_in(true, |p| p.parse_expression())?);
        }
        self.parse_semicolon()?;
        Ok(node)
    }

    fn parse_throw_statement(&mut self) -> PResult<Node> {
        let keyword = self.consume("throw")?;
        let expression = self.with_allow_in(true, |p| p.parse_expression())?;
        self.parse_semicolon()?;
        Ok(Node::with_children(NodeKind::Throw, keyword.start, vec![expression]))
    }

    /// `break`/`continue` with an optional label on the same line.
    fn parse_break_or_continue(&mut self) -> PResult<Node> {
        let keyword = self.token;
        let kind = if keyword.is("break") {
            NodeKind::Break
        } else {
            NodeKind::Continue
        };
        self.next_token()?;
        let label = self.try_parse(|p| {
            if p.newline_before {
                return Err(p.error_expected(";"));
            }
            let label = p.consume_identifier()?;
            if !p.is_statement_end() {
                return Err(p.error_expected(";"));
            }
            Ok(label)
        });
        let node = match label {
            Some(label) => Node::with_text(kind, keyword.start, label.end(), label.text),
            None => Node::leaf(kind, keyword.start, keyword.end()),
        };
        self.parse_semicolon()?;
        Ok(node)
    }

    fn parse_labeled_statement(&mut self) -> PResult<Node> {
        let name = self.consume_identifier()?;
        self.consume(":")?;
        let body = self.parse_substatement()?;
        Ok(Node::with_children(NodeKind::Label, name.start, vec![body]).text(name.text))
    }

    /// `CONFIG::debug { ... }`
    fn parse_conditional_block(&mut self, context: Context) -> PResult<Node> {
        let condition = self.parse_identifier_or_namespace_access()?;
        let block = self.parse_block_in(context)?;
        Ok(Node::with_children(
            NodeKind::ConditionalCompilation,
            condition.start,
            vec![condition, block],
        ))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) -> PResult<Node> {
        let first = self.parse_assignment_expression()?;
        if !self.is(",") {
            return Ok(first);
        }
        let mut list = Node::leaf(NodeKind::ExprList, first.start, first.start);
        list.push(first);
        while self.skip_if(",")? {
            list.push(self.parse_assignment_expression()?);
        }
        Ok(list)
    }

    fn parse_assignment_expression(&mut self) -> PResult<Node> {
        self.guarded(|p| p.parse_assignment_worker())
    }

    fn parse_assignment_worker(&mut self) -> PResult<Node> {
        let left = self.parse_conditional_expression()?;
        if !is_assignment_operator(self.token.text) {
            return Ok(left);
        }
        let op = self.op_node()?;
        let right = self.parse_assignment_expression()?;
        Ok(Node::with_children(NodeKind::Assign, left.start, vec![left, op, right]))
    }

    fn parse_conditional_expression(&mut self) -> PResult<Node> {
        let condition = self.parse_binary_expression(OperatorPrecedence::LOWEST)?;
        if !self.is("?") {
            return Ok(condition);
        }
        self.next_token()?;
        let when_true = self.with_allow_in(true, |p| p.parse_assignment_expression())?;
        self.consume(":")?;
        let when_false = self.parse_assignment_expression()?;
        Ok(Node::with_children(
            NodeKind::Conditional,
            condition.start,
            vec![condition, when_true, when_false],
        ))
    }

    /// One precedence level as a flat `[operand, Op, operand, ...]` node.
    fn parse_binary_expression(&mut self, level: OperatorPrecedence) -> PResult<Node> {
        let first = self.parse_binary_operand(level)?;
        if !self.at_binary_operator(level) {
            return Ok(first);
        }
        let mut node = Node::leaf(level.node_kind(), first.start, first.start);
        node.push(first);
        while self.at_binary_operator(level) {
            node.push(self.op_node()?);
            node.push(self.parse_binary_operand(level)?);
        }
        Ok(node)
    }

    fn parse_binary_operand(&mut self, level: OperatorPrecedence) -> PResult<Node> {
        match level.next() {
            Some(next) => self.parse_binary_expression(next),
            None => self.parse_unary_expression(),
        }
    }

    fn at_binary_operator(&self, level: OperatorPrecedence) -> bool {
        get_binary_operator_precedence(self.token.text, self.allow_in) == Some(level)
    }

    fn parse_unary_expression(&mut self) -> PResult<Node> {
        let kind = match self.token.text {
            "!" => NodeKind::Not,
            "~" => NodeKind::BNot,
            "-" => NodeKind::Minus,
            "+" => NodeKind::Plus,
            "++" => NodeKind::PreInc,
            "--" => NodeKind::PreDec,
            "delete" => NodeKind::Delete,
            "typeof" => NodeKind::TypeOf,
            "void" => NodeKind::Void,
            _ => return self.parse_postfix_expression(),
        };
        let start = self.token.start;
        self.next_token()?;
        let operand = self.guarded(|p| p.parse_unary_expression())?;
        Ok(Node::with_children(kind, start, vec![operand]))
    }

    fn parse_postfix_expression(&mut self) -> PResult<Node> {
        let expression = self.parse_left_hand_side_expression()?;
        if self.newline_before {
            return Ok(expression);
        }
        let kind = match self.token.text {
            "++" => NodeKind::PostInc,
            "--" => NodeKind::PostDec,
            _ => return Ok(expression),
        };
        self.next_token()?;
        Ok(Node::with_children(kind, expression.start, vec![expression]))
    }

    fn parse_left_hand_side_expression(&mut self) -> PResult<Node> {
        let primary = if self.is("new") {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        self.parse_member_chain(primary, true)
    }

    /// Member accesses, subscripts and (optionally) calls following `target`.
    fn parse_member_chain(&mut self, mut target: Node, allow_call: bool) -> PResult<Node> {
        loop {
            target = match self.token.text {
                "." => self.parse_dot(target)?,
                ".." => {
                    self.next_token()?;
                    let member = self.parse_e4x_member()?;
                    Node::with_children(NodeKind::E4xDescendant, target.start, vec![target, member])
                }
                "[" => {
                    self.next_token()?;
                    let index = self.with_allow_in(true, |p| p.parse_expression())?;
                    let close = self.consume("]")?;
                    Node::with_children(NodeKind::ArrayAccessor, target.start, vec![target, index])
                        .closed_at(close.end())
                }
                "(" if allow_call => {
                    let arguments = self.parse_arguments()?;
                    Node::with_children(NodeKind::Call, target.start, vec![target, arguments])
                }
                _ => return Ok(target),
            };
        }
    }

    fn parse_dot(&mut self, target: Node) -> PResult<Node> {
        self.consume(".")?;
        if self.is("(") {
            self.next_token()?;
            let predicate = self.with_allow_in(true, |p| p.parse_expression())?;
            let close = self.consume(")")?;
            return Ok(
                Node::with_children(NodeKind::E4xFilter, target.start, vec![target, predicate]).closed_at(close.end())
            );
        }
        let member = self.parse_e4x_member()?;
        Ok(Node::with_children(NodeKind::Dot, target.start, vec![target, member]))
    }

    /// Member after `.` or `..`: a name, `ns::name`, `@attr` or `*`.
    fn parse_e4x_member(&mut self) -> PResult<Node> {
        if self.is("@") {
            return self.parse_attribute();
        }
        if self.is("*") {
            let star = self.consume("*")?;
            return Ok(Node::with_text(NodeKind::E4xStar, star.start, star.end(), "*"));
        }
        let name = self.consume_name()?;
        let identifier = Node::with_text(NodeKind::Identifier, name.start, name.end(), name.text);
        if self.is("::") {
            self.next_token()?;
            let member = self.consume_name()?;
            let member = Node::with_text(NodeKind::Identifier, member.start, member.end(), member.text);
            return Ok(Node::with_children(
                NodeKind::NamespaceAccess,
                name.start,
                vec![identifier, member],
            ));
        }
        Ok(identifier)
    }

    /// `@name`, `@*` or `@[expression]`.
    fn parse_attribute(&mut self) -> PResult<Node> {
        let at = self.consume("@")?;
        if self.is("[") {
            self.next_token()?;
            let expression = self.with_allow_in(true, |p| p.parse_expression())?;
            let close = self.consume("]")?;
            return Ok(Node::with_children(NodeKind::E4xAttr, at.start, vec![expression]).closed_at(close.end()));
        }
        let name = if self.is("*") {
            self.consume("*")?
        } else {
            self.consume_name()?
        };
        Ok(Node::with_text(NodeKind::E4xAttr, at.start, name.end(), name.text))
    }

    fn parse_arguments(&mut self) -> PResult<Node> {
        let open = self.consume("(")?;
        let mut arguments = Node::leaf(NodeKind::Arguments, open.start, open.end());
        self.with_allow_in(true, |p| {
            if !p.is(")") {
                loop {
                    arguments.push(p.parse_assignment_expression()?);
                    if !p.skip_if(",")? {
                        break;
                    }
                }
            }
            Ok(())
        })?;
        self.close(&mut arguments, ")")?;
        Ok(arguments)
    }

    fn parse_new_expression(&mut self) -> PResult<Node> {
        let keyword = self.consume("new")?;
        if self.is("<") {
            if let Some(vector) = self.try_parse(|p| p.parse_short_vector()) {
                return Ok(Node::with_children(NodeKind::New, keyword.start, vec![vector]));
            }
        }
        let target = if self.is("new") {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        let target = self.parse_member_chain(target, false)?;
        let mut node = Node::with_children(NodeKind::New, keyword.start, vec![target]);
        if self.is("(") {
            node.push(self.parse_arguments()?);
        }
        Ok(node)
    }

    /// `<T>[a, b]`: a `Vector` leaf for `<T>` followed by the array literal.
    fn parse_short_vector(&mut self) -> PResult<Node> {
        let open = self.consume("<")?;
        let element = self.parse_type()?;
        let close = self.consume(">")?;
        let element_text = &self.source[element.start..element.end];
        let vector = Node::with_text(NodeKind::Vector, open.start, close.end(), element_text);
        if !self.is("[") {
            return Err(self.error_expected("["));
        }
        let array = self.parse_array_literal()?;
        Ok(Node::with_children(NodeKind::ShortVector, open.start, vec![vector, array]))
    }

    fn parse_primary_expression(&mut self) -> PResult<Node> {
        let token = self.token;
        if token.is_numeric || token.is_string() {
            self.next_token()?;
            return Ok(Node::with_text(NodeKind::Literal, token.start, token.end(), token.text));
        }
        if token.is_xml {
            self.next_token()?;
            return Ok(Node::with_text(NodeKind::XmlLiteral, token.start, token.end(), token.text));
        }
        match token.text {
            "(" => {
                self.next_token()?;
                let inner = self.with_allow_in(true, |p| p.parse_expression())?;
                let close = self.consume(")")?;
                Ok(Node::with_children(NodeKind::Encapsulated, token.start, vec![inner]).closed_at(close.end()))
            }
            "[" => self.parse_array_literal(),
            "{" => self.parse_object_literal(),
            "function" => self.parse_lambda(),
            "/" | "/=" => self.parse_regex(),
            "<" => self
                .try_parse(|p| p.parse_short_vector())
                .ok_or_else(|| self.error_expected("expression")),
            "@" => self.parse_attribute(),
            "true" | "false" | "null" => {
                self.next_token()?;
                Ok(Node::with_text(NodeKind::Literal, token.start, token.end(), token.text))
            }
            "this" | "super" => {
                self.next_token()?;
                Ok(Node::with_text(NodeKind::Identifier, token.start, token.end(), token.text))
            }
            "Vector" if self.peek_nth(1) == ".<" => self.parse_type(),
            _ if token.is_identifier_like() && !is_reserved(token.text) => {
                self.parse_identifier_or_namespace_access()
            }
            _ => Err(self.error_expected("expression")),
        }
    }

    /// `name` or `ns::name`.
    fn parse_identifier_or_namespace_access(&mut self) -> PResult<Node> {
        let name = self.consume_name()?;
        let identifier = Node::with_text(NodeKind::Identifier, name.start, name.end(), name.text);
        if !self.is("::") {
            return Ok(identifier);
        }
        self.next_token()?;
        let member = self.consume_name()?;
        let member = Node::with_text(NodeKind::Identifier, member.start, member.end(), member.text);
        Ok(Node::with_children(
            NodeKind::NamespaceAccess,
            name.start,
            vec![identifier, member],
        ))
    }

    /// Rescan the current `/` token as a regular expression literal.
    fn parse_regex(&mut self) -> PResult<Node> {
        match self.scanner.scan_regex(self.token.start) {
            Some(regex) => {
                self.next_token()?;
                Ok(Node::with_text(NodeKind::RegExp, regex.start, regex.end(), regex.text))
            }
            None => Err(self.error_expected("expression")),
        }
    }

    fn parse_array_literal(&mut self) -> PResult<Node> {
        let open = self.consume("[")?;
        let mut array = Node::leaf(NodeKind::Array, open.start, open.end());
        self.with_allow_in(true, |p| {
            loop {
                while p.skip_if(",")? {}
                if p.is("]") {
                    break;
                }
                array.push(p.parse_assignment_expression()?);
                if !p.is(",") {
                    break;
                }
            }
            Ok(())
        })?;
        self.close(&mut array, "]")?;
        Ok(array)
    }

    fn parse_object_literal(&mut self) -> PResult<Node> {
        let open = self.consume("{")?;
        let mut object = Node::leaf(NodeKind::Object, open.start, open.end());
        self.with_allow_in(true, |p| {
            while !p.is("}") {
                let key = p.token;
                if !(key.is_identifier_like() || key.is_string() || key.is_numeric) {
                    return Err(p.error_expected("property name"));
                }
                p.next_token()?;
                let name = Node::with_text(NodeKind::Name, key.start, key.end(), key.text);
                let colon = p.consume(":")?;
                let value = p.parse_assignment_expression()?;
                let value = Node::with_children(NodeKind::Value, colon.start, vec![value]);
                object.push(Node::with_children(NodeKind::Prop, key.start, vec![name, value]));
                if !p.skip_if(",")? {
                    break;
                }
            }
            Ok(())
        })?;
        self.close(&mut object, "}")?;
        Ok(object)
    }

    fn parse_lambda(&mut self) -> PResult<Node> {
        let keyword = self.consume("function")?;
        let mut lambda = Node::leaf(NodeKind::Lambda, keyword.start, keyword.end());
        if !self.is("(") {
            let name = self.consume_identifier()?;
            lambda.push(Node::with_text(NodeKind::Name, name.start, name.end(), name.text));
        }
        lambda.push(self.parse_parameter_list()?);
        if self.skip_if(":")? {
            lambda.push(self.parse_type()?);
        }
        lambda.push(self.with_allow_in(true, |p| p.parse_block())?);
        Ok(lambda)
    }
}
