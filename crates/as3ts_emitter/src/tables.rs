//! Built-in lookup tables: type remapping, known globals, conversion functions.

use as3ts_core::{FxHashSet, FxMap};

/// Immutable lookup tables consulted during emission.
///
/// Built once per converter and shared by reference with every emission.
#[derive(Debug, Clone)]
pub struct BuiltinTables {
    type_map: FxMap<&'static str, &'static str>,
    globals: FxHashSet<&'static str>,
    conversion_functions: FxHashSet<&'static str>,
    primitive_checks: FxMap<&'static str, &'static str>,
    package_roots: FxHashSet<&'static str>,
}

const TYPE_MAP: &[(&str, &str)] = &[
    ("*", "any"),
    ("int", "number"),
    ("uint", "number"),
    ("Number", "number"),
    ("String", "string"),
    ("Boolean", "boolean"),
    ("Object", "any"),
    ("Class", "any"),
    ("XML", "any"),
    ("XMLList", "any"),
    ("Array", "any[]"),
    ("Dictionary", "Map<any, any>"),
    ("void", "void"),
    ("Function", "Function"),
    // Flash-only error classes collapse to the base error
    ("ArgumentError", "Error"),
    ("DefinitionError", "Error"),
    ("EOFError", "Error"),
    ("IOError", "Error"),
    ("IllegalOperationError", "Error"),
    ("InvalidSWFError", "Error"),
    ("MemoryError", "Error"),
    ("ScriptTimeoutError", "Error"),
    ("SecurityError", "Error"),
    ("StackOverflowError", "Error"),
    ("UninitializedError", "Error"),
    ("VerifyError", "Error"),
];

const GLOBALS: &[&str] = &[
    "trace", "Math", "JSON", "Date", "RegExp", "Error", "EvalError", "RangeError",
    "ReferenceError", "SyntaxError", "TypeError", "URIError", "Array", "Object", "String",
    "Number", "Boolean", "Function", "int", "uint", "isNaN", "isFinite", "parseInt",
    "parseFloat", "encodeURI", "decodeURI", "encodeURIComponent", "decodeURIComponent",
    "escape", "unescape", "isXMLName", "undefined", "NaN", "Infinity", "arguments", "Vector",
    "XML", "XMLList", "Class", "Namespace", "QName", "Map", "Promise", "console", "process",
    "setTimeout", "setInterval", "clearTimeout", "clearInterval",
];

const CONVERSION_FUNCTIONS: &[&str] = &[
    "String", "Number", "Boolean", "int", "uint", "Array", "Object", "XML", "XMLList", "Date",
];

const PRIMITIVE_CHECKS: &[(&str, &str)] = &[
    ("String", "string"),
    ("Number", "number"),
    ("int", "number"),
    ("uint", "number"),
    ("Boolean", "boolean"),
    ("Function", "function"),
];

const PACKAGE_ROOTS: &[&str] = &["flash", "mx", "fl", "air"];

impl BuiltinTables {
    pub fn new() -> Self {
        Self {
            type_map: TYPE_MAP.iter().copied().collect(),
            globals: GLOBALS.iter().copied().collect(),
            conversion_functions: CONVERSION_FUNCTIONS.iter().copied().collect(),
            primitive_checks: PRIMITIVE_CHECKS.iter().copied().collect(),
            package_roots: PACKAGE_ROOTS.iter().copied().collect(),
        }
    }

    /// Target spelling of a source type name, if it differs or is predefined.
    pub fn map_type(&self, name: &str) -> Option<&'static str> {
        self.type_map.get(name).copied()
    }

    pub fn is_global(&self, name: &str) -> bool {
        self.globals.contains(name)
    }

    /// `String(x)`, `int(x)` and friends convert rather than cast.
    pub fn is_conversion_function(&self, name: &str) -> bool {
        self.conversion_functions.contains(name)
    }

    /// The `typeof` result tested for `x is T` when `T` is a primitive wrapper.
    pub fn primitive_check(&self, name: &str) -> Option<&'static str> {
        self.primitive_checks.get(name).copied()
    }

    /// First segments of well-known package paths.
    pub fn is_package_root(&self, name: &str) -> bool {
        self.package_roots.contains(name)
    }
}

impl Default for BuiltinTables {
    fn default() -> Self {
        Self::new()
    }
}
