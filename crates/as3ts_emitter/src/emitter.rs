//! The emitter walks the syntax tree alongside the original text.
//!
//! Output is produced by copying source text up to a node and then either
//! letting it through unchanged or replacing part of it. Nodes that need no
//! rewriting cost nothing: their text is copied by the next `catchup`.

use as3ts_ast::{filter_ast, keywords, AstTree, Node, NodeId, NodeKind};
use as3ts_core::{FxHashSet, LineMap, OrderedSet, TextRange};
use as3ts_diagnostics::{
    messages, ConvertError, Diagnostic, DiagnosticCategory, DiagnosticCollection,
    DiagnosticMessage,
};
use as3ts_scanner::{Checkpoint, Scanner};
use tracing::{debug, trace, warn};

use crate::options::EmitterOptions;
use crate::paths::relative_import_path;
use crate::scope::{Declaration, ScopeKind, ScopeStack};

pub type EmitResultOf<T> = Result<T, ConvertError>;

/// The converted text of one file and the warnings produced along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitResult {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Emit `ast`, parsed from `source`, as TypeScript.
pub fn emit(ast: &Node, source: &str, options: &EmitterOptions) -> EmitResultOf<EmitResult> {
    emit_file("<input>", ast, source, options)
}

/// Like [`emit`], naming the file in diagnostics and errors.
pub fn emit_file(
    file_name: &str,
    ast: &Node,
    source: &str,
    options: &EmitterOptions,
) -> EmitResultOf<EmitResult> {
    let tree = AstTree::build(filter_ast(ast));
    let mut emitter = Emitter::new(file_name, source, options, tree);
    emitter.emit_unit()?;
    Ok(emitter.finish())
}

/// Replace every `\r\n`, `\r` or `\n` with `separator`.
pub fn normalize_line_endings(text: &str, separator: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(separator);
            }
            '\n' => out.push_str(separator),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn simple_name(raw: &str) -> &str {
    raw.rsplit('.').next().unwrap_or(raw)
}

pub(crate) fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

pub struct Emitter<'e> {
    pub(crate) file_name: &'e str,
    pub(crate) source: &'e str,
    pub(crate) options: &'e EmitterOptions,
    pub(crate) tree: AstTree,
    line_map: LineMap,
    pub(crate) output: String,
    /// Offset in `source` up to which text has been consumed.
    index: usize,
    pub(crate) scopes: ScopeStack,
    /// Synthesized import lines placed at the top of the file.
    header: OrderedSet<String>,
    diagnostics: DiagnosticCollection,
    /// Segments of the current package name.
    pub(crate) package: Vec<String>,
    /// Lowercase first segments of package paths seen in this file.
    package_roots: FxHashSet<String>,
}

impl<'e> Emitter<'e> {
    fn new(file_name: &'e str, source: &'e str, options: &'e EmitterOptions, tree: AstTree) -> Self {
        Self {
            file_name,
            source,
            options,
            tree,
            line_map: LineMap::new(source),
            output: String::with_capacity(source.len() + source.len() / 8),
            index: 0,
            scopes: ScopeStack::new(),
            header: OrderedSet::new(),
            diagnostics: DiagnosticCollection::new(),
            package: Vec::new(),
            package_roots: FxHashSet::default(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn tree(&self) -> &AstTree {
        &self.tree
    }

    pub fn source(&self) -> &'e str {
        self.source
    }

    pub fn options(&self) -> &'e EmitterOptions {
        self.options
    }

    /// Offset of the next source byte to be copied.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    #[inline]
    pub fn range(&self, id: NodeId) -> (usize, usize) {
        let node = self.tree.get(id);
        (node.start, node.end)
    }

    /// The original text a node was parsed from.
    pub fn node_source(&self, id: NodeId) -> &'e str {
        let (start, end) = self.range(id);
        let source: &'e str = self.source;
        &source[start..end]
    }

    // ========================================================================
    // Cursor primitives
    // ========================================================================

    /// Copy source text up to `offset`.
    pub fn catchup(&mut self, offset: usize) {
        let offset = offset.min(self.source.len());
        if offset <= self.index {
            return;
        }
        self.output.push_str(&self.source[self.index..offset]);
        self.index = offset;
    }

    /// Move the cursor to `offset` without copying.
    pub fn skip_to(&mut self, offset: usize) {
        self.index = self.index.max(offset.min(self.source.len()));
    }

    pub fn skip(&mut self, count: usize) {
        self.skip_to(self.index + count);
    }

    pub fn insert(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Skip spaces and tabs at the cursor.
    pub(crate) fn skip_whitespace(&mut self) {
        let rest = &self.source[self.index..];
        let trimmed = rest.trim_start_matches(|c| c == ' ' || c == '\t');
        self.index += rest.len() - trimmed.len();
    }

    /// Wrap a node's text in a block comment.
    pub(crate) fn comment_out(&mut self, id: NodeId) {
        let (start, end) = self.range(id);
        self.catchup(start);
        self.insert("/*");
        self.catchup(end);
        self.insert("*/");
    }

    /// Emit a node and return the text it produced.
    pub(crate) fn capture(&mut self, id: NodeId) -> EmitResultOf<String> {
        let (start, end) = self.range(id);
        self.catchup(start);
        let mark = self.output.len();
        self.visit(id)?;
        self.catchup(end);
        Ok(self.output[mark..].to_string())
    }

    /// Emit a node into a string instead of the output.
    pub(crate) fn take(&mut self, id: NodeId) -> EmitResultOf<String> {
        let text = self.capture(id)?;
        self.output.truncate(self.output.len() - text.len());
        Ok(text)
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    fn emit_unit(&mut self) -> EmitResultOf<()> {
        let root = self.tree.root();
        self.declare_file_names(root);
        debug!(file = self.file_name, nodes = self.tree.len(), "emitting");
        self.visit(root)?;
        self.catchup(self.source.len());
        if !self.scopes.is_at_root() {
            return Err(self.internal("scope left open at end of file"));
        }
        Ok(())
    }

    fn finish(self) -> EmitResult {
        let mut text = String::with_capacity(self.output.len() + self.header.len() * 48);
        for line in self.header.iter() {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&self.output);
        EmitResult {
            text: normalize_line_endings(&text, &self.options.line_separator),
            diagnostics: self.diagnostics.into_diagnostics(),
        }
    }

    /// Emit one node. Extensions get the first chance to handle it.
    pub fn visit(&mut self, id: NodeId) -> EmitResultOf<()> {
        let options = self.options;
        for extension in &options.extensions {
            if extension.visit(self, id)? {
                trace!(extension = extension.name(), kind = %self.tree.kind(id), "handled by extension");
                return Ok(());
            }
        }
        match self.tree.kind(id) {
            NodeKind::Package => self.emit_package(id),
            NodeKind::Import => self.emit_import(id),
            NodeKind::Use => self.emit_use(id),
            NodeKind::Include => self.emit_include(id),
            NodeKind::MetaList => self.emit_metadata(id),
            NodeKind::Class => self.emit_class(id),
            NodeKind::Interface => self.emit_interface(id),
            NodeKind::Function | NodeKind::Get | NodeKind::Set => self.emit_function(id),
            NodeKind::Lambda => self.emit_lambda(id),
            NodeKind::VarList | NodeKind::ConstList => self.emit_var_list(id),
            NodeKind::Type | NodeKind::Vector => self.emit_type(id),
            NodeKind::Rest => self.emit_rest(id),
            NodeKind::Catch => self.emit_catch(id),
            NodeKind::ForIn => self.emit_for_in(id),
            NodeKind::ForEach => self.emit_for_each(id),
            NodeKind::ConditionalCompilation => self.emit_conditional_block(id),
            NodeKind::Identifier => self.emit_identifier(id),
            NodeKind::NamespaceAccess => self.emit_namespace_access(id),
            NodeKind::Dot => self.emit_dot(id),
            NodeKind::Call => self.emit_call(id),
            NodeKind::New => self.emit_new(id),
            NodeKind::Relation => self.emit_relation(id),
            NodeKind::ArrayAccessor => self.emit_array_accessor(id),
            NodeKind::Assign => self.emit_assign(id),
            NodeKind::Delete => self.emit_delete(id),
            NodeKind::XmlLiteral => self.emit_xml(id),
            NodeKind::E4xFilter | NodeKind::E4xDescendant | NodeKind::E4xAttr => {
                self.emit_e4x(id)
            }
            _ => self.visit_children(id),
        }
    }

    pub fn visit_children(&mut self, id: NodeId) -> EmitResultOf<()> {
        self.visit_children_except(id, &[])
    }

    /// Visit children in order, skipping those of the listed kinds.
    pub(crate) fn visit_children_except(&mut self, id: NodeId, skip: &[NodeKind]) -> EmitResultOf<()> {
        for i in 0..self.tree.children(id).len() {
            let child = self.tree.children(id)[i];
            if !skip.contains(&self.tree.kind(child)) {
                self.visit(child)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    /// Run `body` inside a new scope holding `declarations`.
    pub(crate) fn in_scope(
        &mut self,
        kind: ScopeKind,
        class_name: Option<String>,
        declarations: Vec<Declaration>,
        body: impl FnOnce(&mut Self) -> EmitResultOf<()>,
    ) -> EmitResultOf<()> {
        let scope = self.scopes.push(kind, class_name);
        trace!(?kind, declarations = declarations.len(), "enter scope");
        for declaration in declarations {
            self.scopes.declare(declaration);
        }
        let result = body(self);
        let popped = self.scopes.pop(scope);
        result?;
        popped.map_err(|message| self.internal(message))
    }

    /// Declare package-level names and imports before emission starts.
    fn declare_file_names(&mut self, root: NodeId) {
        let options = self.options;
        for key in options.namespace_definitions.keys() {
            self.add_package_root(key);
        }
        for i in 0..self.tree.children(root).len() {
            let item = self.tree.children(root)[i];
            if self.tree.kind(item) == NodeKind::Package {
                if let Some(name) = self.tree.find_child(item, NodeKind::Name) {
                    let name = self.tree.text(name).to_string();
                    self.add_package_root(&name);
                    self.package = name.split('.').map(str::to_string).collect();
                }
                if let Some(content) = self.tree.find_child(item, NodeKind::Content) {
                    for j in 0..self.tree.children(content).len() {
                        let member = self.tree.children(content)[j];
                        self.declare_file_name(member);
                    }
                }
            } else {
                self.declare_file_name(item);
            }
        }
    }

    fn declare_file_name(&mut self, id: NodeId) {
        let root = self.scopes.root();
        match self.tree.kind(id) {
            NodeKind::Import => {
                let path = self.rewrite_import(self.tree.text(id));
                self.add_package_root(&path);
                for name in self.imported_names(&path) {
                    self.scopes.declare_in(root, Declaration::new(name));
                }
            }
            NodeKind::Class | NodeKind::Interface | NodeKind::Function => {
                if let Some(name) = self.tree.find_child(id, NodeKind::Name) {
                    let name = self.tree.text(name).to_string();
                    self.scopes.declare_in(root, Declaration::new(name));
                }
            }
            NodeKind::VarList | NodeKind::ConstList => {
                for binding in self.tree.find_children(id, NodeKind::NameTypeInit).collect::<Vec<_>>() {
                    let declaration = self.binding_declaration(binding);
                    self.scopes.declare_in(root, declaration);
                }
            }
            _ => {}
        }
    }

    fn add_package_root(&mut self, path: &str) {
        if let Some(first) = path.split('.').next() {
            if !first.is_empty() && !starts_uppercase(first) {
                self.package_roots.insert(first.to_string());
            }
        }
    }

    fn is_package_root(&self, name: &str) -> bool {
        self.package_roots.contains(name) || self.options.tables.is_package_root(name)
    }

    /// A declaration for a `name[:Type]` binding.
    pub(crate) fn binding_declaration(&self, binding: NodeId) -> Declaration {
        let name = self
            .tree
            .find_child(binding, NodeKind::Name)
            .map(|n| self.tree.text(n).to_string())
            .unwrap_or_default();
        Declaration::typed(name, self.type_source(binding))
    }

    /// Source text of the type annotation among a node's children.
    pub(crate) fn type_source(&self, id: NodeId) -> Option<String> {
        self.type_child(id).map(|t| self.node_source(t).to_string())
    }

    pub(crate) fn type_child(&self, id: NodeId) -> Option<NodeId> {
        self.tree
            .children(id)
            .iter()
            .copied()
            .find(|&c| matches!(self.tree.kind(c), NodeKind::Type | NodeKind::Vector))
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    fn emit_identifier(&mut self, id: NodeId) -> EmitResultOf<()> {
        let (start, end) = self.range(id);
        let name = self.tree.text(id).to_string();
        if keywords::is_keyword(&name) {
            return Ok(());
        }
        self.catchup(start);
        let options = self.options;
        let resolved = self.scopes.resolve(&name).map(|d| d.bound.clone());
        match resolved {
            Some(Some(bound)) => {
                self.insert(&bound);
                self.insert(".");
            }
            Some(None) => {}
            None if options.tables.is_global(&name) => {}
            None if starts_uppercase(&name) => self.ensure_import(&name, id),
            None => {
                if self.scopes.in_class() && !self.is_package_root(&name) {
                    self.insert("this.");
                }
            }
        }
        if let Some(renamed) = self.remap_identifier(&name) {
            self.skip_to(end);
            self.insert(&renamed);
        }
        Ok(())
    }

    fn remap_identifier(&self, name: &str) -> Option<String> {
        self.options
            .extensions
            .iter()
            .find_map(|extension| extension.remap_identifier(name))
    }

    /// Qualified spelling of a name in the current scope.
    pub(crate) fn qualified_name(&self, name: &str) -> String {
        match self.scopes.resolve(name).and_then(|d| d.bound.as_deref()) {
            Some(bound) => format!("{bound}.{name}"),
            None => name.to_string(),
        }
    }

    // ========================================================================
    // Types and imports
    // ========================================================================

    /// Target spelling of a type written as `raw`, adding an import when it
    /// names a class not otherwise visible.
    pub fn type_reference(&mut self, raw: &str, at: NodeId) -> String {
        let raw = raw.trim();
        if let Some(element) = raw.strip_prefix("Vector.<").and_then(|r| r.strip_suffix('>')) {
            return format!("{}[]", self.type_reference(element, at));
        }
        if let Some(mapped) = self.mapped_type(raw) {
            return mapped;
        }
        let simple = simple_name(raw);
        if starts_uppercase(simple) {
            self.ensure_import(simple, at);
        }
        simple.to_string()
    }

    /// Remapping for a type name from the extensions or the built-in table.
    pub(crate) fn mapped_type(&self, raw: &str) -> Option<String> {
        let simple = simple_name(raw);
        let options = self.options;
        options
            .extensions
            .iter()
            .find_map(|ext| ext.remap_type(raw).or_else(|| ext.remap_type(simple)))
            .or_else(|| options.tables.map_type(simple).map(str::to_string))
    }

    /// Record an import for an unresolved class name, at most once per file.
    fn ensure_import(&mut self, name: &str, at: NodeId) {
        let options = self.options;
        if self.scopes.resolve(name).is_some()
            || options.tables.is_global(name)
            || self.mapped_type(name).is_some()
            || self.scopes.class_name() == Some(name)
        {
            return;
        }
        let root = self.scopes.root();
        self.scopes.declare_in(root, Declaration::new(name));
        if options.use_namespaces {
            return;
        }
        let mut target = self.package.clone();
        target.push(name.to_string());
        let path = relative_import_path(&self.package, &target);
        let line = format!("import {{ {name} }} from \"{path}\";");
        if self.header.insert(line) {
            debug!(name, "auto-import");
            self.report(at, &messages::AUTO_IMPORT_ADDED, &[name]);
        }
    }

    /// Apply the extensions' import rewrites in order.
    pub(crate) fn rewrite_import(&self, path: &str) -> String {
        let mut current = path.to_string();
        for extension in &self.options.extensions {
            if let Some(rewritten) = extension.rewrite_import(&current) {
                current = rewritten;
            }
        }
        current
    }

    /// Names an import path brings into scope.
    pub(crate) fn imported_names(&self, path: &str) -> Vec<String> {
        match path.strip_suffix(".*") {
            Some(namespace) => self
                .options
                .namespace_definitions
                .get(namespace)
                .cloned()
                .unwrap_or_default(),
            None => vec![simple_name(path).to_string()],
        }
    }

    /// Whether an expression has a declared type that maps to `Map`.
    pub(crate) fn is_map_expression(&self, id: NodeId) -> bool {
        self.declared_type(id)
            .and_then(|raw| self.mapped_type(&raw))
            .is_some_and(|mapped| mapped.starts_with("Map<"))
    }

    fn declared_type(&self, id: NodeId) -> Option<String> {
        match self.tree.kind(id) {
            NodeKind::Identifier => self
                .scopes
                .resolve(self.tree.text(id))
                .and_then(|d| d.type_name.clone()),
            NodeKind::Dot => {
                let target = self.tree.child(id, 0)?;
                let member = self.tree.child(id, 1)?;
                let owner = self.tree.text(target);
                let is_own = self.tree.kind(target) == NodeKind::Identifier
                    && (owner == "this" || self.scopes.class_name() == Some(owner));
                if !is_own || self.tree.kind(member) != NodeKind::Identifier {
                    return None;
                }
                self.scopes
                    .resolve_member(self.tree.text(member))
                    .and_then(|d| d.type_name.clone())
            }
            NodeKind::Encapsulated => self.declared_type(self.tree.child(id, 0)?),
            _ => None,
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Record a warning located at a node.
    pub fn report(&mut self, at: NodeId, message: &DiagnosticMessage, args: &[&str]) {
        let (start, end) = self.range(at);
        let diagnostic = Diagnostic::with_location(
            self.file_name,
            &self.line_map,
            TextRange::new(start, end),
            message,
            args,
        );
        match diagnostic.category {
            DiagnosticCategory::Warning => {
                warn!(file = self.file_name, code = diagnostic.code, "{}", diagnostic.message_text)
            }
            _ => debug!(file = self.file_name, code = diagnostic.code, "{}", diagnostic.message_text),
        }
        self.diagnostics.add(diagnostic);
    }

    pub(crate) fn internal(&self, message: impl Into<String>) -> ConvertError {
        ConvertError::internal(self.file_name, message)
    }

    pub(crate) fn required_child(&self, id: NodeId, kind: NodeKind) -> EmitResultOf<NodeId> {
        self.tree
            .find_child(id, kind)
            .ok_or_else(|| self.internal(format!("{} without {}", self.tree.kind(id), kind)))
    }

    pub(crate) fn required_nth(&self, id: NodeId, index: usize) -> EmitResultOf<NodeId> {
        self.tree
            .child(id, index)
            .ok_or_else(|| self.internal(format!("{} has no child {}", self.tree.kind(id), index)))
    }

    // ========================================================================
    // Source helpers
    // ========================================================================

    /// Start of the first token equal to `text` at or after `from`.
    pub fn find_token(&self, from: usize, text: &str) -> Option<usize> {
        let mut scanner = Scanner::new(self.source);
        scanner.restore(Checkpoint {
            index: from,
            vector_depth: 0,
        });
        loop {
            let token = scanner.next_token().ok()?;
            if token.is_eof() {
                return None;
            }
            if token.is(text) {
                return Some(token.start);
            }
        }
    }

    pub(crate) fn require_token(&self, from: usize, text: &str) -> EmitResultOf<usize> {
        self.find_token(from, text)
            .ok_or_else(|| self.internal(format!("'{text}' not found after offset {from}")))
    }

    /// Offset of the delimiter closing a bracketed node, which ends its span.
    pub(crate) fn closing_delimiter(&self, id: NodeId, delimiter: &str) -> Option<usize> {
        let (_, end) = self.range(id);
        self.source[..end].ends_with(delimiter).then(|| end - delimiter.len())
    }

    /// End of a statement including a `;` directly after it.
    pub(crate) fn statement_end(&self, id: NodeId) -> usize {
        let (_, end) = self.range(id);
        let mut scanner = Scanner::new(self.source);
        scanner.restore(Checkpoint {
            index: end,
            vector_depth: 0,
        });
        loop {
            match scanner.next_token() {
                Ok(token) if token.is_newline() || token.is_comment() => continue,
                Ok(token) if token.is(";") => return token.end(),
                _ => return end,
            }
        }
    }

    /// Leading whitespace of the line containing `offset`.
    pub(crate) fn line_indent(&self, offset: usize) -> &'e str {
        let source: &'e str = self.source;
        let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line = &source[line_start..offset];
        let width = line.len() - line.trim_start_matches(|c| c == ' ' || c == '\t').len();
        &line[..width]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd", "\n"), "a\nb\nc\nd");
        assert_eq!(normalize_line_endings("a\nb", "\r\n"), "a\r\nb");
    }

    #[test]
    fn test_name_helpers() {
        assert_eq!(simple_name("flash.utils.Dictionary"), "Dictionary");
        assert_eq!(simple_name("Item"), "Item");
        assert!(starts_uppercase("Item"));
        assert!(!starts_uppercase("item"));
        assert!(!starts_uppercase(""));
    }
}
