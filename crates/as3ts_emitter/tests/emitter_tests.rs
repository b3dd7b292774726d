//! Emitter tests over parsed ActionScript sources.

use as3ts_ast::NodeId;
use as3ts_ast::NodeKind;
use as3ts_diagnostics::ConvertError;
use as3ts_emitter::{emit_file, EmitResult, Emitter, EmitterOptions, Extension};
use as3ts_options::parse_config;
use as3ts_parser::parse;

/// Helper: parse and emit with the given options.
fn convert_with(source: &str, options: &EmitterOptions) -> EmitResult {
    let ast = parse("Test.as", source).expect("source should parse");
    emit_file("Test.as", &ast, source, options).expect("source should emit")
}

/// Helper: parse and emit with default options.
fn convert(source: &str) -> String {
    convert_with(source, &EmitterOptions::default()).text
}

fn has_code(result: &EmitResult, code: u32) -> bool {
    result.diagnostics.iter().any(|d| d.code == code)
}

/// Rewrites `trace(...)` calls to `console.log(...)`.
struct TraceExtension;

impl Extension for TraceExtension {
    fn name(&self) -> &str {
        "trace"
    }

    fn visit(&self, emitter: &mut Emitter<'_>, node: NodeId) -> Result<bool, ConvertError> {
        if emitter.tree().kind(node) != NodeKind::Call {
            return Ok(false);
        }
        let Some(callee) = emitter.tree().child(node, 0) else {
            return Ok(false);
        };
        if emitter.tree().kind(callee) != NodeKind::Identifier || emitter.tree().text(callee) != "trace" {
            return Ok(false);
        }
        let (start, end) = emitter.range(callee);
        emitter.catchup(start);
        emitter.skip_to(end);
        emitter.insert("console.log");
        if let Some(arguments) = emitter.tree().child(node, 1) {
            emitter.visit(arguments)?;
        }
        Ok(true)
    }
}

// ============================================================================
// Passthrough
// ============================================================================

#[test]
fn test_passthrough_is_identity() {
    let source = "function add(a, b) {\n    // sum\n    return a + b * 2; /* done */\n}\n";
    assert_eq!(convert(source), source);
}

#[test]
fn test_passthrough_normalizes_line_endings() {
    let source = "function add(a, b) {\r\n    return a + b;\r\n}\r\n";
    assert_eq!(convert(source), source.replace("\r\n", "\n"));

    let options = EmitterOptions {
        line_separator: "\r\n".to_string(),
        ..EmitterOptions::default()
    };
    let unix = "var a = 1;\nvar b = 2;\n";
    assert_eq!(convert_with(unix, &options).text, "var a = 1;\r\nvar b = 2;\r\n");
}

// ============================================================================
// Packages and imports
// ============================================================================

#[test]
fn test_flat_package_is_unwrapped() {
    let source = "package com.example {\n    public class A {}\n}\n";
    assert_eq!(convert(source), "\n    export class A {}\n\n");
}

#[test]
fn test_namespace_mode_package() {
    let source = "package com.example {\n    import flash.events.Event;\n    public class A {}\n}\n";
    let options = EmitterOptions {
        use_namespaces: true,
        ..EmitterOptions::default()
    };
    assert_eq!(
        convert_with(source, &options).text,
        "namespace com.example {\n    import Event = flash.events.Event;\n    export class A {}\n}\n"
    );
}

#[test]
fn test_flat_import_paths_are_relative() {
    let source = "package com.example.game {\n    import com.example.model.Item;\n    import flash.events.Event;\n}\n";
    let output = convert(source);
    assert!(output.contains("import { Item } from \"../model/Item\";"));
    assert!(output.contains("import { Event } from \"../../../flash/events/Event\";"));
}

#[test]
fn test_wildcard_imports() {
    let source = "package app {\n    import flash.events.*;\n    import mx.core.*;\n}\n";
    let mut options = EmitterOptions::default();
    options
        .namespace_definitions
        .insert("flash.events".to_string(), vec!["Event".to_string(), "MouseEvent".to_string()]);
    let result = convert_with(source, &options);
    assert!(result.text.contains(
        "import { Event } from \"../flash/events/Event\";\n    import { MouseEvent } from \"../flash/events/MouseEvent\";"
    ));
    assert!(result.text.contains("/*import mx.core.**/"));
    assert!(has_code(&result, 5002));
}

#[test]
fn test_remapped_import_is_commented_out() {
    let result = convert_with("import flash.utils.Dictionary;\n", &EmitterOptions::default());
    assert_eq!(result.text, "/*import flash.utils.Dictionary*/;\n");
    assert!(has_code(&result, 5008));
}

#[test]
fn test_auto_import_is_deduplicated() {
    let source = r#"
package game {
    public class World {
        public function build():void {
            var a:Item = new Item();
            if (a) {
                var b:Item = Item(a);
            }
            function inner():Item {
                return null;
            }
        }
    }
}
"#;
    let result = convert_with(source, &EmitterOptions::default());
    assert_eq!(result.text.matches("import { Item } from \"./Item\";").count(), 1);
    assert!(result.text.starts_with("import { Item } from \"./Item\";\n"));
    assert!(result.text.contains("var b:Item = <Item>(a);"));
    assert!(has_code(&result, 5101));
}

#[test]
fn test_no_auto_import_in_namespace_mode() {
    let source = "package game {\n    public class World {\n        private var item:Item;\n    }\n}\n";
    let options = EmitterOptions {
        use_namespaces: true,
        ..EmitterOptions::default()
    };
    assert!(!convert_with(source, &options).text.contains("import"));
}

#[test]
fn test_directives_are_commented_out() {
    let source = "use namespace mx_internal;\ninclude \"Shared.as\";\n";
    let result = convert_with(source, &EmitterOptions::default());
    assert_eq!(
        result.text,
        "/*use namespace mx_internal*/;\n/*include \"Shared.as\"*/;\n"
    );
    assert!(has_code(&result, 5007));
    assert!(has_code(&result, 5003));
}

// ============================================================================
// Classes
// ============================================================================

const COUNTER: &str = r#"
package com.example {
    import flash.events.EventDispatcher;

    [Bindable]
    public class Counter extends EventDispatcher {
        public static const STEP:int = 1;
        private var _count:int;

        public function Counter(start:int = 0) {
            super();
            _count = start;
        }

        public function get count():int { return _count; }

        public function set count(value:int):void { _count = value; }

        override public function toString():String { return "Counter " + _count; }

        public function increment(...amounts):void {
            _count += STEP;
            dispatchEvent(null);
        }
    }
}
"#;

#[test]
fn test_class_declaration_lowering() {
    let result = convert_with(COUNTER, &EmitterOptions::default());
    let output = &result.text;
    assert!(output.contains("import { EventDispatcher } from \"../../flash/events/EventDispatcher\";"));
    assert!(output.contains("/*[Bindable]*/\n    export class Counter extends EventDispatcher {"));
    assert!(output.contains("public static readonly STEP:number = 1;"));
    assert!(output.contains("private _count:number;"));
    assert!(output.contains("public constructor(start:number = 0) {"));
    assert!(!output.contains("package"));
    assert!(has_code(&result, 5005));
}

#[test]
fn test_member_lowering() {
    let result = convert_with(COUNTER, &EmitterOptions::default());
    let output = &result.text;
    assert!(output.contains("super();"));
    assert!(output.contains("this._count = start;"));
    assert!(output.contains("public get count():number { return this._count; }"));
    assert!(output.contains("public set count(value:number) { this._count = value; }"));
    assert!(output.contains("/*override*/ public toString():string"));
    assert!(output.contains("public increment(...amounts: any[]):void {"));
    assert!(output.contains("this._count += Counter.STEP;"));
    assert!(output.contains("this.dispatchEvent(null);"));
    assert!(has_code(&result, 5004));
}

#[test]
fn test_implicit_this_respects_scope() {
    let source = r#"
class Widget {
    private var name:String;
    public function rename(value:String):void {
        var name:String = value;
        label = name;
        var t:Number = flash.utils.getTimer();
        trace(Math.max(1, 2));
    }
}
"#;
    let output = convert(source);
    assert!(output.contains("var name:string = value;"));
    assert!(output.contains("this.label = name;"));
    assert!(output.contains("flash.utils.getTimer()"));
    assert!(output.contains("trace(Math.max(1, 2));"));
}

#[test]
fn test_user_namespace_modifier() {
    let source = "class A {\n    mx_internal function reset():void {}\n}\n";
    let result = convert_with(source, &EmitterOptions::default());
    assert!(result.text.contains("/*mx_internal*/ reset():void {}"));
    assert!(has_code(&result, 5004));
}

#[test]
fn test_packaged_class_keeps_member_braces() {
    let source = "package a {\n public class Foo {\n public function bar():void {\n baz();\n }\n }\n}";
    assert_eq!(
        convert(source),
        "\n export class Foo {\n public bar():void {\n this.baz();\n }\n }\n"
    );
}

#[test]
fn test_member_conditional_block_keeps_member_braces() {
    let source = "class A {\n    CONFIG::debug {\n        function f():void {\n            x();\n        }\n    }\n}\n";
    let result = convert_with(source, &EmitterOptions::default());
    assert!(result.text.contains("/*CONFIG::debug*/"));
    assert!(result.text.contains("f():void {\n            this.x();\n        }\n    \n}\n"));
    assert_eq!(result.text.matches('{').count(), 2);
    assert_eq!(result.text.matches('}').count(), 2);
    assert!(has_code(&result, 5009));
    assert!(!has_code(&result, 5004));
}

#[test]
fn test_interface_members() {
    let source = "package shapes {\n    public interface IShape {\n        function area():Number;\n    }\n}\n";
    assert!(convert(source).contains("export interface IShape {\n        area():number;\n    }"));
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_for_each_over_dictionary() {
    let source = "var dict:Dictionary = new Dictionary();\nfor each (var v:String in dict) { trace(v); }\n";
    assert_eq!(
        convert(source),
        "var dict:Map<any, any> = new Map<any, any>();\nlet v: string;\nfor (let $k_v of dict.keys()) { v = dict.get($k_v); trace(v); }\n"
    );
}

#[test]
fn test_for_each_with_trace_extension() {
    let source = "var dict:Dictionary = new Dictionary();\nfor each (var v:String in dict) { trace(v); }\n";
    let options = EmitterOptions::default().with_extension(TraceExtension);
    let output = convert_with(source, &options).text;
    assert!(output.contains("{ v = dict.get($k_v); console.log(v); }"));
}

#[test]
fn test_for_each_over_array() {
    let source = "function sum(values:Array):int {\n    var total:int = 0;\n    for each (var n:int in values) total += n;\n    return total;\n}\n";
    let output = convert(source);
    assert!(output.contains(
        "    let n: number;\n    for (let $k_n in values) { n = values[$k_n]; total += n; }"
    ));
}

#[test]
fn test_for_each_braceless_call_body() {
    let source = "for each (var v:int in items()) trace(v);\n";
    assert_eq!(
        convert(source),
        "let v: number;\nfor (let $k_v in items()) { v = items()[$k_v]; trace(v); }\n"
    );
}

#[test]
fn test_for_in_hoists_typed_variable() {
    let source = "function keys(obj:Object):void {\n    for (var k:String in obj) {\n        trace(k);\n    }\n}\n";
    let output = convert(source);
    assert!(output.contains("    let k: string;\n    for (k in obj) {"));
}

#[test]
fn test_for_in_untyped_is_unchanged() {
    let source = "for (var k in obj) trace(k);\n";
    assert_eq!(convert(source), source);
}

#[test]
fn test_catch_drops_annotation() {
    let source = "try { run(); } catch (e:Error) { trace(e); }\n";
    assert_eq!(convert(source), "try { run(); } catch (e) { trace(e); }\n");
}

#[test]
fn test_conditional_compilation() {
    let source = "function f():void {\n    CONFIG::debug {\n        trace(\"debug\");\n    }\n    if (CONFIG::release) trace(\"release\");\n}\n";
    let output = convert(source);
    assert!(output.contains("if (process.env.CONFIG_DEBUG === \"true\") {\n        trace(\"debug\");\n    }"));
    assert!(output.contains("if (process.env.CONFIG_RELEASE === \"true\") trace(\"release\");"));
}

#[test]
fn test_namespace_qualifier_dropped_outside_conditions() {
    assert_eq!(convert("mx_internal::reset();\n"), "reset();\n");
}

// ============================================================================
// Maps
// ============================================================================

#[test]
fn test_dictionary_access_round_trip() {
    let source = r#"
package {
    import flash.utils.Dictionary;

    public class Registry {
        private var table:Dictionary = new Dictionary();

        public function run(key:String, value:Object):void {
            table[key] = value;
            var found:Object = table[key];
            table[key] += 1;
            if (key in table) delete table[key];
            for (var k:String in table) trace(k);
        }
    }
}
"#;
    let output = convert(source);
    assert!(output.contains("private table:Map<any, any> = new Map<any, any>();"));
    assert!(output.contains("this.table.set(key, value);"));
    assert!(output.contains("var found:any = this.table.get(key);"));
    assert!(output.contains("this.table.set(key, this.table.get(key) + (1));"));
    assert!(output.contains("if (this.table.has(key)) this.table.delete(key);"));
    assert!(output.contains("for (let [k] of this.table) trace(k);"));
}

#[test]
fn test_map_writes_with_bracketed_values() {
    let source = "var d:Dictionary = new Dictionary();\nd[k] = [1, 2];\nd[key(0)] = {a: 1};\nd[k] = load(k);\nvar v = d[list[0]];\n";
    let output = convert(source);
    assert!(output.contains("d.set(k, [1, 2]);"));
    assert!(output.contains("d.set(key(0), {a: 1});"));
    assert!(output.contains("d.set(k, load(k));"));
    assert!(output.contains("var v = d.get(list[0]);"));
}

#[test]
fn test_plain_subscripts_are_unchanged() {
    let source = "var list:Array = [];\nlist[0] = list[1];\ndelete list[2];\n";
    assert_eq!(convert(source), "var list:any[] = [];\nlist[0] = list[1];\ndelete list[2];\n");
}

// ============================================================================
// Casts and type tests
// ============================================================================

#[test]
fn test_as_cast() {
    assert_eq!(convert("var n:Number = x as Number;"), "var n:number = (<number>x);");
}

#[test]
fn test_as_cast_of_bracketed_operands() {
    let source = "var a:Number = load(x) as Number;\nvar b:Number = arr[i] as Number;\nvar c:Number = (x + 1) as Number;\n";
    assert_eq!(
        convert(source),
        "var a:number = (<number>load(x));\nvar b:number = (<number>arr[i]);\nvar c:number = (<number>(x + 1));\n"
    );
}

#[test]
fn test_cast_heuristic() {
    let source = r#"
import flash.display.Sprite;
function f(obj:Object, x:Number):void {
    var s:Sprite = Sprite(obj);
    var n:int = int(x);
    var r:Object = compute(x);
    var v:Array = Vector.<int>(obj);
}
"#;
    let output = convert(source);
    assert!(output.contains("import { Sprite } from \"./flash/display/Sprite\";"));
    assert!(output.contains("var s:Sprite = <Sprite>(obj);"));
    assert!(output.contains("var n:number = int(x);"));
    assert!(output.contains("var r:any = compute(x);"));
    assert!(output.contains("var v:any[] = <number[]>(obj);"));
}

#[test]
fn test_is_checks() {
    let source = "if (a is String && b is Array && c is Sprite) {}\n";
    let result = convert_with(source, &EmitterOptions::default());
    assert!(result.text.contains("typeof a === \"string\""));
    assert!(result.text.contains("Array.isArray(b)"));
    assert!(result.text.contains("c instanceof Sprite /* is Sprite */"));
    assert!(has_code(&result, 5001));
}

#[test]
fn test_is_check_of_bracketed_operands() {
    let source = "var a:Boolean = load(x) is String;\nvar b:Boolean = list[0] is Array;\nvar c:Boolean = [] is Array;\n";
    assert_eq!(
        convert(source),
        "var a:boolean = typeof load(x) === \"string\";\nvar b:boolean = Array.isArray(list[0]);\nvar c:boolean = Array.isArray([]);\n"
    );
}

#[test]
fn test_vector_forms() {
    let source = "var v:Vector.<int> = new Vector.<int>(3);\nvar w:Vector.<String> = new <String>[\"a\", \"b\"];\n";
    assert_eq!(
        convert(source),
        "var v:number[] = new Array<number>(3);\nvar w:string[] = [\"a\", \"b\"];\n"
    );
}

// ============================================================================
// XML
// ============================================================================

#[test]
fn test_xml_literal_becomes_template() {
    assert_eq!(
        convert("var x:XML = <a id={n}>{label}</a>;"),
        "var x:any = `<a id=${n}>${label}</a>`;"
    );
}

#[test]
fn test_e4x_is_copied_with_warning() {
    let source = "var names = doc..item.(@id == 1).@name;";
    let result = convert_with(source, &EmitterOptions::default());
    assert_eq!(result.text, source);
    assert!(has_code(&result, 5006));
}

// ============================================================================
// Configuration tables
// ============================================================================

#[test]
fn test_configured_tables() {
    let config = parse_config(
        r#"{
            "typeMap": { "Point": "Vec2" },
            "identifierMap": { "getTimer": "performance.now" },
            "importRewrites": [{ "pattern": "^mx\\.controls\\.", "replacement": "ui.widgets." }]
        }"#,
    )
    .unwrap();
    let options = EmitterOptions::from_config(&config).unwrap();
    let source = "import flash.geom.Point;\nimport mx.controls.Button;\nvar p:Point = new Point();\nvar t:int = getTimer();\n";
    let result = convert_with(source, &options);
    assert!(result.text.contains("/*import flash.geom.Point*/;"));
    assert!(result.text.contains("import { Button } from \"./ui/widgets/Button\";"));
    assert!(result.text.contains("var p:Vec2 = new Vec2();"));
    assert!(result.text.contains("var t:number = performance.now();"));
}
