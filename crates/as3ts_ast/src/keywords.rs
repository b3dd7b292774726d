//! Reserved and contextual words of the source language.

/// Words that can never be used as plain identifiers.
const RESERVED: &[&str] = &[
    "as", "break", "case", "catch", "class", "const", "continue", "default", "delete", "do",
    "else", "extends", "false", "finally", "for", "function", "if", "implements", "import",
    "in", "instanceof", "interface", "internal", "is", "new", "null", "package", "private",
    "protected", "public", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "use", "var", "void", "while", "with",
];

/// Words with a special meaning only in some positions.
const CONTEXTUAL: &[&str] = &[
    "each", "get", "set", "namespace", "include", "dynamic", "final", "native", "override",
    "static", "virtual",
];

/// Whether `text` is a reserved word.
pub fn is_reserved(text: &str) -> bool {
    RESERVED.contains(&text)
}

/// Whether `text` is a contextual keyword.
pub fn is_contextual(text: &str) -> bool {
    CONTEXTUAL.contains(&text)
}

/// Whether the emitter must pass `text` through without scope lookup.
pub fn is_keyword(text: &str) -> bool {
    is_reserved(text) || text == "undefined"
}
