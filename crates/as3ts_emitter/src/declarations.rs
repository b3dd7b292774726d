//! Packages, imports, classes, functions and variable declarations.

use as3ts_ast::{ModifierFlags, NodeId, NodeKind};
use as3ts_diagnostics::messages;

use crate::emitter::{simple_name, EmitResultOf, Emitter};
use crate::paths::relative_import_path;
use crate::scope::{Declaration, ScopeKind};

/// Where a declaration appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Site {
    /// Directly in a package or at the top of the file.
    Package,
    /// In a class or interface body.
    Member,
    /// Inside a function body.
    Local,
}

impl<'e> Emitter<'e> {
    pub(crate) fn declaration_site(&self, id: NodeId) -> Site {
        let Some(parent) = self.tree.parent(id) else {
            return Site::Package;
        };
        match self.tree.kind(parent) {
            NodeKind::CompilationUnit => Site::Package,
            NodeKind::Content => match self.tree.parent(parent).map(|p| self.tree.kind(p)) {
                Some(NodeKind::Package) => Site::Package,
                Some(NodeKind::Class | NodeKind::Interface) => Site::Member,
                _ => Site::Local,
            },
            NodeKind::Block => match self.tree.parent(parent) {
                Some(block_owner)
                    if self.tree.kind(block_owner) == NodeKind::ConditionalCompilation =>
                {
                    self.declaration_site(block_owner)
                }
                _ => Site::Local,
            },
            _ => Site::Local,
        }
    }

    // ========================================================================
    // Package
    // ========================================================================

    pub(crate) fn emit_package(&mut self, id: NodeId) -> EmitResultOf<()> {
        let (start, _) = self.range(id);
        let content = self.required_child(id, NodeKind::Content)?;
        let named = self.tree.find_child(id, NodeKind::Name).is_some();
        self.catchup(start);
        if self.options.use_namespaces && named {
            self.skip("package".len());
            self.insert("namespace");
            return self.visit_children(content);
        }

        let (content_start, _) = self.range(content);
        self.skip_to(content_start + 1);
        self.visit_children(content)?;
        let close = self
            .closing_delimiter(content, "}")
            .ok_or_else(|| self.internal("package body is not closed"))?;
        self.catchup(close);
        self.skip_to(close + 1);
        Ok(())
    }

    // ========================================================================
    // Directives
    // ========================================================================

    pub(crate) fn emit_import(&mut self, id: NodeId) -> EmitResultOf<()> {
        let (start, end) = self.range(id);
        let path = self.rewrite_import(self.tree.text(id));

        let lines = match path.strip_suffix(".*") {
            Some(namespace) => {
                if !self.options.namespace_definitions.contains_key(namespace) {
                    self.report(id, &messages::UNRESOLVED_WILDCARD_IMPORT, &[&path]);
                    self.comment_out(id);
                    return Ok(());
                }
                self.imported_names(&path)
                    .iter()
                    .map(|name| self.import_line(namespace, name))
                    .collect::<Vec<_>>()
            }
            None => {
                let name = simple_name(&path);
                if let Some(target) = self.mapped_type(name) {
                    self.report(id, &messages::REMAPPED_IMPORT_COMMENTED_OUT, &[&path, &target]);
                    self.comment_out(id);
                    return Ok(());
                }
                let namespace = path.strip_suffix(name).unwrap_or("").trim_end_matches('.');
                vec![self.import_line(namespace, name)]
            }
        };

        self.catchup(start);
        self.skip_to(end);
        let separator = format!(";\n{}", self.line_indent(start));
        self.insert(&lines.join(&separator));
        Ok(())
    }

    fn import_line(&self, namespace: &str, name: &str) -> String {
        if self.options.use_namespaces && !namespace.is_empty() {
            return format!("import {name} = {namespace}.{name}");
        }
        let target: Vec<String> = namespace
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .chain(std::iter::once(name.to_string()))
            .collect();
        let path = relative_import_path(&self.package, &target);
        format!("import {{ {name} }} from \"{path}\"")
    }

    pub(crate) fn emit_use(&mut self, id: NodeId) -> EmitResultOf<()> {
        let namespace = self.tree.text(id).to_string();
        self.report(id, &messages::USE_NAMESPACE_COMMENTED_OUT, &[&namespace]);
        self.comment_out(id);
        Ok(())
    }

    pub(crate) fn emit_include(&mut self, id: NodeId) -> EmitResultOf<()> {
        let file = self.tree.text(id).to_string();
        self.report(id, &messages::INCLUDE_NOT_SPLICED, &[&file]);
        self.comment_out(id);
        Ok(())
    }

    pub(crate) fn emit_metadata(&mut self, id: NodeId) -> EmitResultOf<()> {
        for meta in self.tree.find_children(id, NodeKind::Meta).collect::<Vec<_>>() {
            let text = self.tree.text(meta).to_string();
            self.report(meta, &messages::METADATA_COMMENTED_OUT, &[&text]);
        }
        self.comment_out(id);
        Ok(())
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    /// Emit metadata and modifiers of a declaration.
    fn emit_declaration_prefix(&mut self, id: NodeId) -> EmitResultOf<Site> {
        let site = self.declaration_site(id);
        if let Some(metadata) = self.tree.find_child(id, NodeKind::MetaList) {
            self.emit_metadata(metadata)?;
        }
        if let Some(modifiers) = self.tree.find_child(id, NodeKind::ModList) {
            self.emit_modifiers(modifiers, site);
        }
        Ok(site)
    }

    /// Package-level visibility becomes `export`; member access and `static`
    /// are kept; anything else is commented out.
    fn emit_modifiers(&mut self, list: NodeId, site: Site) {
        let mut exported = false;
        for i in 0..self.tree.children(list).len() {
            let modifier = self.tree.children(list)[i];
            let (start, end) = self.range(modifier);
            if start == end {
                continue;
            }
            let text = self.tree.text(modifier).to_string();
            let flag = ModifierFlags::classify(&text);
            match site {
                Site::Package if ModifierFlags::EXPORT_WORTHY.contains(flag) => {
                    self.catchup(start);
                    self.skip_to(end);
                    if exported {
                        self.skip_whitespace();
                    } else {
                        self.insert("export");
                        exported = true;
                    }
                }
                Site::Member if ModifierFlags::MEMBER_KEPT.contains(flag) => {}
                _ => {
                    self.report(modifier, &messages::MODIFIER_COMMENTED_OUT, &[&text]);
                    self.comment_out(modifier);
                }
            }
        }
    }

    fn has_modifier(&self, id: NodeId, flag: ModifierFlags) -> bool {
        self.tree.find_child(id, NodeKind::ModList).is_some_and(|list| {
            self.tree
                .children(list)
                .iter()
                .any(|&m| ModifierFlags::classify(self.tree.text(m)) == flag)
        })
    }

    /// Where to look for the declaration keyword: after metadata and modifiers.
    fn keyword_search_start(&self, id: NodeId) -> usize {
        [NodeKind::ModList, NodeKind::MetaList]
            .iter()
            .find_map(|&kind| self.tree.find_child(id, kind))
            .map_or(self.range(id).0, |prefix| self.range(prefix).1)
    }

    /// Drop a declaration keyword such as `function` or `var`.
    fn remove_keyword(&mut self, id: NodeId, keyword: &str) -> EmitResultOf<()> {
        let at = self.require_token(self.keyword_search_start(id), keyword)?;
        self.catchup(at);
        self.skip_to(at + keyword.len());
        self.skip_whitespace();
        Ok(())
    }

    // ========================================================================
    // Classes and interfaces
    // ========================================================================

    pub(crate) fn emit_class(&mut self, id: NodeId) -> EmitResultOf<()> {
        self.emit_type_declaration(id)
    }

    pub(crate) fn emit_interface(&mut self, id: NodeId) -> EmitResultOf<()> {
        self.emit_type_declaration(id)
    }

    fn emit_type_declaration(&mut self, id: NodeId) -> EmitResultOf<()> {
        let name_node = self.required_child(id, NodeKind::Name)?;
        let name = self.tree.text(name_node).to_string();
        let content = self.required_child(id, NodeKind::Content)?;
        self.emit_declaration_prefix(id)?;
        self.visit_children_except(id, &[NodeKind::MetaList, NodeKind::ModList, NodeKind::Content])?;

        let mut members = Vec::new();
        self.collect_members(content, &name, &mut members);
        self.in_scope(ScopeKind::Class, Some(name), members, |e| e.visit_children(content))
    }

    /// Member declarations of a class body, including conditionally compiled ones.
    fn collect_members(&self, content: NodeId, class_name: &str, out: &mut Vec<Declaration>) {
        for &member in self.tree.children(content) {
            let owner = if self.has_modifier(member, ModifierFlags::STATIC) {
                class_name
            } else {
                "this"
            };
            match self.tree.kind(member) {
                NodeKind::Function | NodeKind::Get | NodeKind::Set => {
                    let Some(name) = self.tree.find_child(member, NodeKind::Name) else {
                        continue;
                    };
                    let name = self.tree.text(name);
                    if name == class_name {
                        continue;
                    }
                    out.push(Declaration::typed(name, self.type_source(member)).bound_to(owner));
                }
                NodeKind::VarList | NodeKind::ConstList => {
                    for binding in self.tree.find_children(member, NodeKind::NameTypeInit) {
                        out.push(self.binding_declaration(binding).bound_to(owner));
                    }
                }
                NodeKind::ConditionalCompilation => {
                    if let Some(block) = self.tree.find_child(member, NodeKind::Block) {
                        self.collect_members(block, class_name, out);
                    }
                }
                _ => {}
            }
        }
    }

    // ========================================================================
    // Functions
    // ========================================================================

    pub(crate) fn emit_function(&mut self, id: NodeId) -> EmitResultOf<()> {
        let kind = self.tree.kind(id);
        let name_node = self.required_child(id, NodeKind::Name)?;
        let parameters = self.required_child(id, NodeKind::ParameterList)?;
        let return_type = self.type_child(id);
        let body = self.tree.find_child(id, NodeKind::Block);

        let site = self.emit_declaration_prefix(id)?;
        let is_constructor = site == Site::Member
            && kind == NodeKind::Function
            && self.scopes.class_name() == Some(self.tree.text(name_node));
        if site == Site::Member {
            self.remove_keyword(id, "function")?;
        }
        if is_constructor {
            let (start, end) = self.range(name_node);
            self.catchup(start);
            self.skip_to(end);
            self.insert("constructor");
        }

        let mut declarations = self.parameter_declarations(parameters);
        if let Some(body) = body {
            self.collect_locals(body, &mut declarations);
        }
        let drop_return_type = is_constructor || kind == NodeKind::Set;
        self.in_scope(ScopeKind::Function, None, declarations, |e| {
            e.visit(parameters)?;
            if let Some(return_type) = return_type {
                if drop_return_type {
                    let colon = e.require_token(e.range(parameters).1, ":")?;
                    e.catchup(colon);
                    e.skip_to(e.range(return_type).1);
                } else {
                    e.visit(return_type)?;
                }
            }
            match body {
                Some(body) => e.visit(body),
                None => Ok(()),
            }
        })
    }

    pub(crate) fn emit_lambda(&mut self, id: NodeId) -> EmitResultOf<()> {
        let parameters = self.required_child(id, NodeKind::ParameterList)?;
        let mut declarations = self.parameter_declarations(parameters);
        if let Some(name) = self.tree.find_child(id, NodeKind::Name) {
            declarations.push(Declaration::new(self.tree.text(name)));
        }
        if let Some(body) = self.tree.find_child(id, NodeKind::Block) {
            self.collect_locals(body, &mut declarations);
        }
        self.in_scope(ScopeKind::Function, None, declarations, |e| e.visit_children(id))
    }

    fn parameter_declarations(&self, list: NodeId) -> Vec<Declaration> {
        self.tree
            .find_children(list, NodeKind::Parameter)
            .filter_map(|parameter| self.tree.child(parameter, 0))
            .map(|binding| self.binding_declaration(binding))
            .collect()
    }

    /// Variables and nested functions declared anywhere in a function body.
    fn collect_locals(&self, id: NodeId, out: &mut Vec<Declaration>) {
        for &child in self.tree.children(id) {
            match self.tree.kind(child) {
                NodeKind::VarList | NodeKind::ConstList => {
                    for binding in self.tree.find_children(child, NodeKind::NameTypeInit) {
                        out.push(self.binding_declaration(binding));
                    }
                }
                NodeKind::Function | NodeKind::Get | NodeKind::Set => {
                    if let Some(name) = self.tree.find_child(child, NodeKind::Name) {
                        out.push(Declaration::new(self.tree.text(name)));
                    }
                }
                NodeKind::Lambda => {}
                NodeKind::Catch => {
                    if let Some(block) = self.tree.find_child(child, NodeKind::Block) {
                        self.collect_locals(block, out);
                    }
                }
                _ => self.collect_locals(child, out),
            }
        }
    }

    pub(crate) fn emit_rest(&mut self, id: NodeId) -> EmitResultOf<()> {
        let name = self.required_child(id, NodeKind::Name)?;
        match self.type_child(id) {
            Some(annotation) => {
                let mapped = self.type_reference(self.node_source(annotation), annotation);
                if !mapped.ends_with("[]") {
                    let (start, end) = self.range(annotation);
                    self.catchup(start);
                    self.skip_to(end);
                    self.insert("any[]");
                    return Ok(());
                }
                self.visit(annotation)
            }
            None => {
                self.catchup(self.range(name).1);
                self.insert(": any[]");
                Ok(())
            }
        }
    }

    pub(crate) fn emit_catch(&mut self, id: NodeId) -> EmitResultOf<()> {
        let binding = self.required_child(id, NodeKind::NameTypeInit)?;
        let block = self.required_child(id, NodeKind::Block)?;
        let name = self.required_child(binding, NodeKind::Name)?;
        if let Some(annotation) = self.type_child(binding) {
            self.catchup(self.range(name).1);
            self.skip_to(self.range(annotation).1);
        }
        let declaration = Declaration::new(self.tree.text(name));
        self.in_scope(ScopeKind::Catch, None, vec![declaration], |e| e.visit(block))
    }

    // ========================================================================
    // Variables
    // ========================================================================

    pub(crate) fn emit_var_list(&mut self, id: NodeId) -> EmitResultOf<()> {
        let site = self.emit_declaration_prefix(id)?;
        if site == Site::Member {
            if self.tree.kind(id) == NodeKind::ConstList {
                let at = self.require_token(self.keyword_search_start(id), "const")?;
                self.catchup(at);
                self.skip_to(at + "const".len());
                self.insert("readonly");
            } else {
                self.remove_keyword(id, "var")?;
            }
        }
        self.visit_children_except(id, &[NodeKind::MetaList, NodeKind::ModList])
    }

    pub(crate) fn emit_type(&mut self, id: NodeId) -> EmitResultOf<()> {
        let (start, end) = self.range(id);
        let raw = self.node_source(id);
        let mapped = self.type_reference(raw, id);
        if mapped != raw {
            self.catchup(start);
            self.skip_to(end);
            self.insert(&mapped);
        }
        Ok(())
    }
}
