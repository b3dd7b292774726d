//! Loop lowering and conditional compilation.

use as3ts_ast::{NodeId, NodeKind};
use as3ts_diagnostics::messages;

use crate::declarations::Site;
use crate::emitter::{EmitResultOf, Emitter};

/// The variable bound by a `for ... in` header.
struct LoopVariable {
    name: String,
    /// Start of the header's initializer (`var` or the identifier).
    init_start: usize,
    name_range: (usize, usize),
    /// The identifier node when the header reuses an existing variable.
    identifier: Option<NodeId>,
    annotation: Option<NodeId>,
}

impl<'e> Emitter<'e> {
    fn loop_variable(&self, init: NodeId) -> Option<LoopVariable> {
        let target = self.tree.child(init, 0)?;
        match self.tree.kind(target) {
            kind if kind.is_var_list() => {
                let binding = self.tree.find_child(target, NodeKind::NameTypeInit)?;
                let name = self.tree.find_child(binding, NodeKind::Name)?;
                Some(LoopVariable {
                    name: self.tree.text(name).to_string(),
                    init_start: self.range(target).0,
                    name_range: self.range(name),
                    identifier: None,
                    annotation: self.type_child(binding),
                })
            }
            NodeKind::Identifier => Some(LoopVariable {
                name: self.tree.text(target).to_string(),
                init_start: self.range(target).0,
                name_range: self.range(target),
                identifier: Some(target),
                annotation: None,
            }),
            _ => None,
        }
    }

    /// `let name: T;` placed on its own line before the loop.
    fn hoist_loop_variable(&mut self, statement: NodeId, variable: &LoopVariable) {
        let (start, _) = self.range(statement);
        let annotation = match variable.annotation {
            Some(annotation) => {
                format!(": {}", self.type_reference(self.node_source(annotation), annotation))
            }
            None => String::new(),
        };
        let indent = self.line_indent(start);
        self.catchup(start);
        self.insert(&format!("let {}{};\n{}", variable.name, annotation, indent));
    }

    pub(crate) fn emit_for_in(&mut self, id: NodeId) -> EmitResultOf<()> {
        let init = self.required_child(id, NodeKind::Init)?;
        let header = self.required_child(id, NodeKind::In)?;
        let body = self.required_nth(id, 2)?;
        let container = self.required_nth(header, 0)?;
        let Some(variable) = self.loop_variable(init) else {
            return self.visit_children(id);
        };

        if self.is_map_expression(container) {
            // for (let [key] of map)
            self.catchup(variable.init_start);
            match variable.identifier {
                Some(identifier) => {
                    self.insert("[");
                    self.visit(identifier)?;
                    self.catchup(variable.name_range.1);
                }
                None => {
                    self.skip_to(variable.name_range.0);
                    self.insert("let [");
                    self.catchup(variable.name_range.1);
                }
            }
            self.insert("] ");
            let (in_start, _) = self.range(header);
            self.skip_to(in_start + "in".len());
            self.insert("of");
            self.visit(container)?;
            return self.visit(body);
        }

        match variable.annotation {
            Some(annotation) if variable.identifier.is_none() => {
                self.hoist_loop_variable(id, &variable);
                self.catchup(variable.init_start);
                self.skip_to(variable.name_range.0);
                self.catchup(variable.name_range.1);
                self.skip_to(self.range(annotation).1);
            }
            _ => self.visit(init)?,
        }
        self.visit(header)?;
        self.visit(body)
    }

    /// `for each (v in c)` becomes a key loop that assigns `v` first thing.
    pub(crate) fn emit_for_each(&mut self, id: NodeId) -> EmitResultOf<()> {
        let init = self.required_child(id, NodeKind::Init)?;
        let header = self.required_child(id, NodeKind::In)?;
        let body = self.required_nth(id, 2)?;
        let container = self.required_nth(header, 0)?;
        let Some(variable) = self.loop_variable(init) else {
            return self.visit_children(id);
        };
        let is_map = self.is_map_expression(container);
        let key = format!("$k_{}", variable.name);

        let (start, _) = self.range(id);
        if variable.identifier.is_none() {
            self.hoist_loop_variable(id, &variable);
        }
        let target = self.qualified_name(&variable.name);

        let each = self.require_token(start, "each")?;
        self.catchup(each);
        self.skip_to(each + "each".len());
        self.skip_whitespace();

        let (in_start, _) = self.range(header);
        self.catchup(variable.init_start);
        self.skip_to(in_start);
        self.insert(&format!("let {key} "));
        let assignment = if is_map {
            self.skip_to(in_start + "in".len());
            self.insert("of");
            let container = self.capture(container)?;
            self.insert(".keys()");
            format!("{target} = {container}.get({key});")
        } else {
            let container = self.capture(container)?;
            format!("{target} = {container}[{key}];")
        };
        self.emit_loop_body(body, &assignment)
    }

    fn emit_loop_body(&mut self, body: NodeId, prologue: &str) -> EmitResultOf<()> {
        let (start, _) = self.range(body);
        if self.tree.kind(body) == NodeKind::Block {
            self.catchup(start + 1);
            self.insert(" ");
            self.insert(prologue);
            return self.visit(body);
        }
        self.catchup(start);
        self.insert("{ ");
        self.insert(prologue);
        self.insert(" ");
        self.visit(body)?;
        self.catchup(self.statement_end(body));
        self.insert(" }");
        Ok(())
    }

    // ========================================================================
    // Conditional compilation
    // ========================================================================

    /// `process.env.CONFIG_DEBUG === "true"` for `CONFIG::debug`.
    fn environment_check(&self, condition: NodeId) -> String {
        let name = self.node_source(condition).replace("::", "_").to_uppercase();
        format!("process.env.{name} === \"true\"")
    }

    pub(crate) fn emit_conditional_block(&mut self, id: NodeId) -> EmitResultOf<()> {
        let condition = self.required_nth(id, 0)?;
        let block = self.required_child(id, NodeKind::Block)?;
        let (start, _) = self.range(id);
        let (_, condition_end) = self.range(condition);

        if self.declaration_site(id) == Site::Member {
            // Class bodies cannot hold statements: keep the members, drop the guard.
            let text = self.node_source(condition);
            self.report(condition, &messages::CONDITIONAL_GUARD_DROPPED, &[text]);
            self.catchup(start);
            self.insert("/*");
            self.catchup(condition_end);
            self.insert("*/");
            let (block_start, _) = self.range(block);
            self.catchup(block_start);
            self.skip_to(block_start + 1);
            self.visit_children(block)?;
            let close = self
                .closing_delimiter(block, "}")
                .ok_or_else(|| self.internal("conditional block is not closed"))?;
            self.catchup(close);
            self.skip_to(close + 1);
            return Ok(());
        }

        let check = self.environment_check(condition);
        self.catchup(start);
        self.skip_to(condition_end);
        self.insert(&format!("if ({check})"));
        self.visit(block)
    }

    /// `ns::name` in an expression.
    pub(crate) fn emit_namespace_access(&mut self, id: NodeId) -> EmitResultOf<()> {
        let (start, end) = self.range(id);
        if self.in_condition(id) {
            let check = self.environment_check(id);
            self.catchup(start);
            self.skip_to(end);
            self.insert(&check);
            return Ok(());
        }
        let member = self.required_nth(id, 1)?;
        self.catchup(start);
        self.skip_to(self.range(member).0);
        self.visit(member)
    }

    fn in_condition(&self, id: NodeId) -> bool {
        for ancestor in self.tree.ancestors(id) {
            match self.tree.kind(ancestor) {
                NodeKind::Condition | NodeKind::Conditional => return true,
                NodeKind::Block
                | NodeKind::Content
                | NodeKind::Arguments
                | NodeKind::Lambda
                | NodeKind::Init
                | NodeKind::Return => return false,
                _ => {}
            }
        }
        false
    }
}
