//! Parser integration tests.
//!
//! Verifies that the parser builds correctly shaped, correctly spanned trees
//! from ActionScript 3 source.

use as3ts_ast::{Node, NodeKind};
use as3ts_diagnostics::ConvertError;
use as3ts_parser::parse;

/// Helper: parse source text and panic with the error on failure.
fn parse_ok(source: &str) -> Node {
    parse("Test.as", source).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
}

/// Helper: every descendant of `node`, depth first.
fn all_nodes(node: &Node) -> Vec<&Node> {
    let mut out = Vec::new();
    node.walk(&mut |n| out.push(n));
    out
}

/// Helper: the first descendant of the given kind.
fn find(node: &Node, kind: NodeKind) -> Option<&Node> {
    all_nodes(node).into_iter().find(|n| n.kind == kind)
}

/// Helper: the members of the first class in a unit.
fn class_members(unit: &Node) -> Vec<&Node> {
    let class = find(unit, NodeKind::Class).expect("no class");
    class
        .find_child(NodeKind::Content)
        .expect("no content")
        .children
        .iter()
        .collect()
}

const SAMPLE: &str = r#"package com.example.game
{
    import flash.display.Sprite;
    import flash.utils.*;

    /**
     * A player.
     */
    [Bindable]
    public class Player extends Sprite implements IEntity
    {
        public static const MAX_HEALTH:int = 100;
        private var _name:String;
        protected var items:Vector.<Item> = new Vector.<Item>();
        mx_internal var hidden:Boolean;

        public function Player(name:String, ...rest)
        {
            super();
            _name = name;
            var lookup:Dictionary = new Dictionary();
            for each (var item:Item in items) {
                lookup[item.id] = item;
            }
            for (var key:String in lookup) {
                trace(key);
            }
        }

        public function get name():String { return _name; }
        public function set name(value:String):void { _name = value; }

        override public function toString():String
        {
            var xml:XML = <player name={_name}><hp>{MAX_HEALTH}</hp></player>;
            var n:Number = health as Number;
            if (item is String && !(n > 3)) {
                return "x" + /ab+c/i.source;
            }
            switch (n) {
                case 1:
                    break;
                default:
                    n = n >>> 2;
            }
            try {
                risky();
            } catch (e:ArgumentError) {
                throw e;
            } finally {
                cleanup();
            }
            return xml.hp.@value + xml..item.(@id == "3").length();
        }
    }
}
"#;

// ============================================================================
// Structural invariants
// ============================================================================

#[test]
fn test_span_containment() {
    let unit = parse_ok(SAMPLE);
    for node in all_nodes(&unit) {
        assert!(node.start <= node.end, "{:?} has start after end", node.kind);
        let mut previous_end = node.start;
        for child in &node.children {
            assert!(child.start >= previous_end, "{:?} child {:?} overlaps", node.kind, child.kind);
            assert!(child.end <= node.end, "{:?} child {:?} escapes", node.kind, child.kind);
            previous_end = child.end;
        }
        if let Some(max) = node.children.iter().map(|c| c.end).max() {
            let closed = matches!(SAMPLE.as_bytes()[node.end - 1], b')' | b']' | b'}');
            assert!(
                node.end == max || closed,
                "{:?} ends neither at its last child nor at a closing delimiter",
                node.kind
            );
        }
    }
}

/// Helper: the source text of the first node of the given kind.
fn source_of<'s>(source: &'s str, unit: &Node, kind: NodeKind) -> &'s str {
    let node = find(unit, kind).unwrap_or_else(|| panic!("no {:?}", kind));
    &source[node.start..node.end]
}

#[test]
fn test_delimited_nodes_end_at_closer() {
    let source = "x = (f(g(a))[0] as Foo);\nif (ready) { go(); }\nvar list = [1, [2]];\nvar o = {k: {}};";
    let unit = parse_ok(source);
    assert_eq!(source_of(source, &unit, NodeKind::Encapsulated), "(f(g(a))[0] as Foo)");
    assert_eq!(source_of(source, &unit, NodeKind::ArrayAccessor), "f(g(a))[0]");
    assert_eq!(source_of(source, &unit, NodeKind::Call), "f(g(a))");
    assert_eq!(source_of(source, &unit, NodeKind::Arguments), "(g(a))");
    assert_eq!(source_of(source, &unit, NodeKind::Condition), "(ready)");
    assert_eq!(source_of(source, &unit, NodeKind::Block), "{ go(); }");
    assert_eq!(source_of(source, &unit, NodeKind::Array), "[1, [2]]");
    assert_eq!(source_of(source, &unit, NodeKind::Object), "{k: {}}");
}

#[test]
fn test_package_content_ends_at_its_own_brace() {
    let source = "package a {\n class Foo {\n  function bar():void {\n   baz();\n  }\n }\n}";
    let unit = parse_ok(source);
    let package = &unit.children[0];
    let content = package.find_child(NodeKind::Content).expect("no content");
    assert_eq!(content.end, source.len());
    assert_eq!(package.end, source.len());
}

#[test]
fn test_leaf_text_matches_source() {
    let unit = parse_ok(SAMPLE);
    for node in all_nodes(&unit) {
        if matches!(node.kind, NodeKind::Identifier | NodeKind::Literal | NodeKind::RegExp) {
            assert_eq!(&SAMPLE[node.start..node.end], node.text_str());
        }
    }
}

#[test]
fn test_sample_top_level_shape() {
    let unit = parse_ok(SAMPLE);
    let package = &unit.children[0];
    assert_eq!(package.kind, NodeKind::Package);
    let content = package.find_child(NodeKind::Content).unwrap();
    let imports: Vec<&str> = content.find_children(NodeKind::Import).map(|n| n.text_str()).collect();
    assert_eq!(imports, vec!["flash.display.Sprite", "flash.utils.*"]);
    assert!(content.find_child(NodeKind::DocComment).is_some());
    let class = content.find_child(NodeKind::Class).unwrap();
    assert_eq!(class.children[0].kind, NodeKind::MetaList);
    assert_eq!(class.children[0].children[0].text_str(), "Bindable");
}

// ============================================================================
// Class members
// ============================================================================

#[test]
fn test_member_kinds() {
    let unit = parse_ok(SAMPLE);
    let kinds: Vec<NodeKind> = class_members(&unit).iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::ConstList,
            NodeKind::VarList,
            NodeKind::VarList,
            NodeKind::VarList,
            NodeKind::Function,
            NodeKind::Get,
            NodeKind::Set,
            NodeKind::Function,
        ]
    );
}

#[test]
fn test_user_namespace_modifier() {
    let unit = parse_ok(SAMPLE);
    let members = class_members(&unit);
    let modifiers = members[3].find_child(NodeKind::ModList).unwrap();
    assert_eq!(modifiers.children[0].text_str(), "mx_internal");
}

#[test]
fn test_rest_parameter() {
    let unit = parse_ok(SAMPLE);
    let constructor = class_members(&unit)[4];
    let parameters = constructor.find_child(NodeKind::ParameterList).unwrap();
    assert_eq!(parameters.children.len(), 2);
    assert_eq!(parameters.children[1].children[0].kind, NodeKind::Rest);
}

#[test]
fn test_interface_methods_without_bodies() {
    let unit = parse_ok("interface IShape extends IA, IB {\n function area():Number;\n function get id():int;\n}");
    let interface = &unit.children[0];
    assert_eq!(interface.kind, NodeKind::Interface);
    assert_eq!(interface.find_child(NodeKind::Extends).unwrap().children.len(), 2);
    let content = interface.find_child(NodeKind::Content).unwrap();
    assert_eq!(content.children.len(), 2);
    assert!(content.children[0].find_child(NodeKind::Block).is_none());
}

#[test]
fn test_get_and_set_as_plain_names() {
    let node = parse_ok("var get:int = set + 1;");
    assert_eq!(node.children[0].kind, NodeKind::VarList);
}

#[test]
fn test_conditional_member_modifier() {
    let unit = parse_ok("class A { CONFIG::debug public function log():void {} }");
    let members = class_members(&unit);
    let modifiers = members[0].find_child(NodeKind::ModList).unwrap();
    assert_eq!(modifiers.children[0].text_str(), "CONFIG::debug");
    assert_eq!(modifiers.children[1].text_str(), "public");
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_directives() {
    let unit = parse_ok("use namespace mx_internal;\ninclude \"helpers.as\";\nimport a.b.C;");
    let kinds: Vec<NodeKind> = unit.children.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NodeKind::Use, NodeKind::Include, NodeKind::Import]);
    assert_eq!(unit.children[0].text_str(), "mx_internal");
    assert_eq!(unit.children[1].text_str(), "helpers.as");
}

#[test]
fn test_switch_cases() {
    let unit = parse_ok(SAMPLE);
    let switch = find(&unit, NodeKind::Switch).unwrap();
    let block = switch.find_child(NodeKind::SwitchBlock).unwrap();
    assert_eq!(block.children.len(), 2);
    assert_eq!(block.children[1].children[0].kind, NodeKind::Default);
}

#[test]
fn test_try_catch_finally() {
    let unit = parse_ok(SAMPLE);
    let node = find(&unit, NodeKind::Try).unwrap();
    let kinds: Vec<NodeKind> = node.children.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NodeKind::Block, NodeKind::Catch, NodeKind::Finally]);
    let catch = &node.children[1];
    assert_eq!(catch.children[0].children[1].text_str(), "ArgumentError");
}

#[test]
fn test_labeled_loop() {
    let unit = parse_ok("outer: for (;;) { continue outer; }");
    let label = &unit.children[0];
    assert_eq!(label.kind, NodeKind::Label);
    assert_eq!(label.text_str(), "outer");
    assert_eq!(label.children[0].kind, NodeKind::For);
}

#[test]
fn test_optional_semicolons() {
    let unit = parse_ok("var a = 1\nvar b = 2\na = b");
    assert_eq!(unit.children.len(), 3);
}

#[test]
fn test_local_function_and_lambda() {
    let unit = parse_ok("function outer():void { function inner():void {} var f:Function = function(x:int):int { return x; }; }");
    assert!(find(&unit, NodeKind::Lambda).is_some());
    let outer = &unit.children[0];
    let body = outer.find_child(NodeKind::Block).unwrap();
    assert_eq!(body.children[0].kind, NodeKind::Function);
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_as_and_is_are_relations() {
    let unit = parse_ok(SAMPLE);
    let relations: Vec<&Node> = all_nodes(&unit)
        .into_iter()
        .filter(|n| n.kind == NodeKind::Relation)
        .collect();
    let ops: Vec<&str> = relations.iter().map(|r| r.children[1].text_str()).collect();
    assert!(ops.contains(&"as"));
    assert!(ops.contains(&"is"));
}

#[test]
fn test_xml_literal_and_e4x() {
    let unit = parse_ok(SAMPLE);
    let xml = find(&unit, NodeKind::XmlLiteral).unwrap();
    assert!(xml.text_str().starts_with("<player"));
    assert!(find(&unit, NodeKind::E4xAttr).is_some());
    assert!(find(&unit, NodeKind::E4xDescendant).is_some());
    assert!(find(&unit, NodeKind::E4xFilter).is_some());
}

#[test]
fn test_object_and_array_literals() {
    let unit = parse_ok("var o:Object = {a: 1, \"b\": [1, 2, , 3], 4: null};");
    let object = find(&unit, NodeKind::Object).unwrap();
    assert_eq!(object.children.len(), 3);
    let array = find(&unit, NodeKind::Array).unwrap();
    assert_eq!(array.children.len(), 3);
}

#[test]
fn test_new_and_calls() {
    let unit = parse_ok("x = new a.B(1).run();");
    let assign = &unit.children[0];
    let call = &assign.children[2];
    assert_eq!(call.kind, NodeKind::Call);
    let dot = &call.children[0];
    assert_eq!(dot.children[0].kind, NodeKind::New);
}

#[test]
fn test_vector_cast_and_new() {
    let unit = parse_ok("v = Vector.<int>(list); w = new Vector.<String>(3);");
    let cast = &unit.children[0].children[2];
    assert_eq!(cast.kind, NodeKind::Call);
    assert_eq!(cast.children[0].kind, NodeKind::Vector);
    let new = &unit.children[1].children[2];
    assert_eq!(new.children[0].kind, NodeKind::Vector);
    assert_eq!(new.children[0].text_str(), "String");
}

#[test]
fn test_ternary_and_compound_assignment() {
    let unit = parse_ok("a += b ? c : d;");
    let assign = &unit.children[0];
    assert_eq!(assign.children[1].text_str(), "+=");
    assert_eq!(assign.children[2].kind, NodeKind::Conditional);
}

#[test]
fn test_postfix_not_across_newline() {
    let unit = parse_ok("a\n++b");
    assert_eq!(unit.children.len(), 2);
    assert_eq!(unit.children[1].kind, NodeKind::PreInc);
}

#[test]
fn test_relational_less_than_not_short_vector() {
    let unit = parse_ok("if (a < b) { c = a > b; }");
    assert!(find(&unit, NodeKind::ShortVector).is_none());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_malformed_class_body_reports_position() {
    let err = parse("Broken.as", "package {\n  class A {\n    function f() {\n  }\n}\n").unwrap_err();
    assert_eq!(err.file(), "Broken.as");
    assert!(matches!(err, ConvertError::Syntax { .. }));
    assert!(err.position().is_some());
    assert!(err.to_string().starts_with("Broken.as("));
}

#[test]
fn test_unexpected_token_message() {
    let err = parse("T.as", "var x = ;").unwrap_err();
    match err {
        ConvertError::Syntax { expected, actual, line, column, .. } => {
            assert_eq!(expected, "expression");
            assert_eq!(actual, ";");
            assert_eq!((line, column), (1, 9));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_deep_nesting_is_an_error_not_a_crash() {
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let source = format!("x = {}1{};", "(".repeat(500), ")".repeat(500));
            parse("Deep.as", &source)
        })
        .unwrap();
    let result = handle.join().unwrap();
    assert!(matches!(result, Err(ConvertError::Syntax { .. })));
}

#[test]
fn test_debug_json_dump() {
    let unit = parse_ok("var a:int = 1;");
    let json = unit.to_debug_json().unwrap();
    assert!(json.contains("\"VarList\""));
    assert!(json.contains("\"NameTypeInit\""));
}
