//! Expression rewrites: casts, type tests, `Map` access and XML literals.

use as3ts_ast::{NodeId, NodeKind};
use as3ts_diagnostics::messages;

use crate::emitter::{simple_name, starts_uppercase, EmitResultOf, Emitter};

/// Turn an XML literal into a template string; `{expr}` becomes `${expr}`.
pub fn xml_template(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() + 8);
    out.push('`');
    let mut depth = 0usize;
    let mut chars = xml.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if depth == 0 {
                    out.push('$');
                }
                out.push('{');
                depth += 1;
            }
            '}' if depth > 0 => {
                out.push('}');
                depth -= 1;
            }
            '`' if depth == 0 => out.push_str("\\`"),
            '\\' if depth == 0 => out.push_str("\\\\"),
            '$' if depth == 0 && chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out.push('`');
    out
}

/// Whether a mapped type name can follow `instanceof`.
fn is_runtime_class(name: &str) -> bool {
    starts_uppercase(name)
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
}

impl<'e> Emitter<'e> {
    // ========================================================================
    // Member access and calls
    // ========================================================================

    pub(crate) fn emit_dot(&mut self, id: NodeId) -> EmitResultOf<()> {
        let target = self.required_nth(id, 0)?;
        let member = self.required_nth(id, 1)?;
        self.visit(target)?;
        match self.tree.kind(member) {
            NodeKind::NamespaceAccess => {
                let name = self.required_nth(member, 1)?;
                self.catchup(self.range(member).0);
                self.skip_to(self.range(name).0);
            }
            NodeKind::E4xAttr | NodeKind::E4xStar => {
                let text = self.node_source(id);
                self.report(id, &messages::E4X_COPIED_UNCHANGED, &[text]);
            }
            _ => {}
        }
        Ok(())
    }

    /// `Foo(x)` with an unknown capitalized callee is a cast: `<Foo>(x)`.
    pub(crate) fn emit_call(&mut self, id: NodeId) -> EmitResultOf<()> {
        let callee = self.required_nth(id, 0)?;
        let arguments = self.required_nth(id, 1)?;
        match self.cast_type(callee, arguments) {
            Some(cast) => {
                let (start, end) = self.range(callee);
                self.catchup(start);
                self.skip_to(end);
                self.insert(&format!("<{cast}>"));
                self.visit(arguments)
            }
            None => self.visit_children(id),
        }
    }

    fn cast_type(&mut self, callee: NodeId, arguments: NodeId) -> Option<String> {
        if self.tree.children(arguments).len() != 1 {
            return None;
        }
        match self.tree.kind(callee) {
            NodeKind::Identifier => {
                let name = self.tree.text(callee).to_string();
                let options = self.options;
                if !starts_uppercase(&name)
                    || self.scopes.resolve_local(&name).is_some()
                    || options.tables.is_conversion_function(&name)
                {
                    return None;
                }
                Some(self.type_reference(&name, callee))
            }
            NodeKind::Vector => Some(self.type_reference(self.node_source(callee), callee)),
            _ => None,
        }
    }

    pub(crate) fn emit_new(&mut self, id: NodeId) -> EmitResultOf<()> {
        let (start, _) = self.range(id);
        let target = self.required_nth(id, 0)?;
        let (target_start, target_end) = self.range(target);
        match self.tree.kind(target) {
            NodeKind::ShortVector => {
                // new <T>[a, b] -> [a, b]
                let array = self.required_child(target, NodeKind::Array)?;
                self.catchup(start);
                self.skip_to(self.range(array).0);
                return self.visit(array);
            }
            NodeKind::Vector => {
                let element = self.tree.text(target).to_string();
                let element = self.type_reference(&element, target);
                self.catchup(target_start);
                self.skip_to(target_end);
                self.insert(&format!("Array<{element}>"));
            }
            NodeKind::Identifier => {
                let name = self.tree.text(target);
                match self.mapped_type(name).filter(|mapped| starts_uppercase(mapped)) {
                    Some(mapped) => {
                        self.catchup(target_start);
                        self.skip_to(target_end);
                        self.insert(&mapped);
                    }
                    None => self.visit(target)?,
                }
            }
            _ => self.visit(target)?,
        }
        match self.tree.find_child(id, NodeKind::Arguments) {
            Some(arguments) => self.visit(arguments),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Type operators
    // ========================================================================

    pub(crate) fn emit_relation(&mut self, id: NodeId) -> EmitResultOf<()> {
        let (left, op, right) = match *self.tree.children(id) {
            [left, op, right] => (left, op, right),
            _ => return self.visit_children(id),
        };
        let operator = self.tree.text(op).to_string();
        match operator.as_str() {
            "as" => self.emit_as_cast(left, right),
            "is" => self.emit_is_check(id, left, right),
            "in" if self.is_map_expression(right) => self.emit_map_has(left, right),
            _ => self.visit_children(id),
        }
    }

    /// `x as T` -> `(<T>x)`
    fn emit_as_cast(&mut self, left: NodeId, right: NodeId) -> EmitResultOf<()> {
        let mapped = self.type_reference(self.node_source(right), right);
        let (left_start, left_end) = self.range(left);
        self.catchup(left_start);
        self.insert(&format!("(<{mapped}>"));
        self.visit(left)?;
        self.catchup(left_end);
        self.skip_to(self.range(right).1);
        self.insert(")");
        Ok(())
    }

    /// `x is T`: `typeof` for primitives, `Array.isArray` for arrays,
    /// `instanceof` with a warning for everything else.
    fn emit_is_check(&mut self, id: NodeId, left: NodeId, right: NodeId) -> EmitResultOf<()> {
        let raw = self.node_source(right);
        let simple = simple_name(raw);
        let (left_start, left_end) = self.range(left);
        let (_, right_end) = self.range(right);
        let options = self.options;

        let (prefix, suffix) = if let Some(primitive) = options.tables.primitive_check(simple) {
            ("typeof ".to_string(), format!(" === \"{primitive}\""))
        } else if simple == "Array" || raw.starts_with("Vector.<") {
            ("Array.isArray(".to_string(), ")".to_string())
        } else {
            let mapped = self.type_reference(raw, right);
            let class = if is_runtime_class(&mapped) { mapped.as_str() } else { "Object" };
            self.report(id, &messages::IS_CHECK_ON_CUSTOM_TYPE, &[raw]);
            (String::new(), format!(" instanceof {class} /* is {raw} */"))
        };

        self.catchup(left_start);
        self.insert(&prefix);
        self.visit(left)?;
        self.catchup(left_end);
        self.skip_to(right_end);
        self.insert(&suffix);
        Ok(())
    }

    // ========================================================================
    // Map access
    // ========================================================================

    /// Emit `target.method(key`, returning the emitted target and key.
    fn emit_map_call(&mut self, target: NodeId, key: NodeId, method: &str) -> EmitResultOf<(String, String)> {
        let target_text = self.capture(target)?;
        self.skip_to(self.range(key).0);
        self.insert(&format!(".{method}("));
        let key_text = self.capture(key)?;
        Ok((target_text, key_text))
    }

    /// Skip past the `]` closing an accessor and close the call.
    fn close_map_call(&mut self, key: NodeId, accessor: NodeId) -> EmitResultOf<()> {
        self.catchup(self.range(key).1);
        self.skip_to(self.range(accessor).1);
        self.insert(")");
        Ok(())
    }

    pub(crate) fn emit_array_accessor(&mut self, id: NodeId) -> EmitResultOf<()> {
        let target = self.required_nth(id, 0)?;
        let key = self.required_nth(id, 1)?;
        if !self.is_map_expression(target) {
            return self.visit_children(id);
        }
        self.emit_map_call(target, key, "get")?;
        self.close_map_call(key, id)
    }

    pub(crate) fn emit_assign(&mut self, id: NodeId) -> EmitResultOf<()> {
        let left = self.required_nth(id, 0)?;
        let op = self.required_nth(id, 1)?;
        let right = self.required_nth(id, 2)?;
        if self.tree.kind(left) != NodeKind::ArrayAccessor {
            return self.visit_children(id);
        }
        let target = self.required_nth(left, 0)?;
        let key = self.required_nth(left, 1)?;
        if !self.is_map_expression(target) {
            return self.visit_children(id);
        }

        let operator = self.tree.text(op).to_string();
        let (right_start, right_end) = self.range(right);
        let (target_text, key_text) = self.emit_map_call(target, key, "set")?;
        self.skip_to(right_start);
        if operator == "=" {
            self.insert(", ");
            self.visit(right)?;
            self.catchup(right_end);
            self.insert(")");
        } else {
            // d[k] += v -> d.set(k, d.get(k) + (v))
            let binary = operator.trim_end_matches('=');
            self.insert(&format!(", {target_text}.get({key_text}) {binary} ("));
            self.visit(right)?;
            self.catchup(right_end);
            self.insert("))");
        }
        Ok(())
    }

    pub(crate) fn emit_delete(&mut self, id: NodeId) -> EmitResultOf<()> {
        let operand = self.required_nth(id, 0)?;
        if self.tree.kind(operand) != NodeKind::ArrayAccessor {
            return self.visit_children(id);
        }
        let target = self.required_nth(operand, 0)?;
        let key = self.required_nth(operand, 1)?;
        if !self.is_map_expression(target) {
            return self.visit_children(id);
        }
        self.catchup(self.range(id).0);
        self.skip_to(self.range(target).0);
        self.emit_map_call(target, key, "delete")?;
        self.close_map_call(key, operand)
    }

    /// `k in d` -> `d.has(k)`
    fn emit_map_has(&mut self, key: NodeId, map: NodeId) -> EmitResultOf<()> {
        let key_text = self.take(key)?;
        let (map_start, map_end) = self.range(map);
        self.skip_to(map_start);
        self.visit(map)?;
        self.catchup(map_end);
        self.insert(&format!(".has({key_text})"));
        Ok(())
    }

    // ========================================================================
    // XML
    // ========================================================================

    pub(crate) fn emit_xml(&mut self, id: NodeId) -> EmitResultOf<()> {
        let (start, end) = self.range(id);
        let template = xml_template(self.node_source(id));
        self.catchup(start);
        self.skip_to(end);
        self.insert(&template);
        Ok(())
    }

    /// E4X operators have no counterpart; only their base expression is emitted.
    pub(crate) fn emit_e4x(&mut self, id: NodeId) -> EmitResultOf<()> {
        let text = self.node_source(id);
        self.report(id, &messages::E4X_COPIED_UNCHANGED, &[text]);
        match self.tree.kind(id) {
            NodeKind::E4xFilter | NodeKind::E4xDescendant => {
                let target = self.required_nth(id, 0)?;
                self.visit(target)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_template() {
        assert_eq!(xml_template("<a x={v}>{w}</a>"), "`<a x=${v}>${w}</a>`");
        assert_eq!(xml_template("<a>`cost: $5`</a>"), "`<a>\\`cost: $5\\`</a>`");
        assert_eq!(xml_template("<a>${b}</a>"), "`<a>\\$${b}</a>`");
        assert_eq!(xml_template("<a>{ {k: 1}.k }</a>"), "`<a>${ {k: 1}.k }</a>`");
    }

    #[test]
    fn test_runtime_class() {
        assert!(is_runtime_class("Sprite"));
        assert!(is_runtime_class("Map"));
        assert!(!is_runtime_class("Map<any, any>"));
        assert!(!is_runtime_class("number"));
        assert!(!is_runtime_class("any[]"));
    }
}
