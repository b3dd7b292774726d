//! Parser utility functions.

/// Check if a word is a declaration modifier keyword.
pub fn is_modifier_keyword(text: &str) -> bool {
    matches!(
        text,
        "public"
            | "private"
            | "protected"
            | "internal"
            | "static"
            | "override"
            | "final"
            | "dynamic"
            | "native"
            | "virtual"
    )
}

/// Check if a word introduces a declaration after its modifiers.
pub fn is_declaration_keyword(text: &str) -> bool {
    matches!(text, "class" | "interface" | "function" | "var" | "const")
}

/// Check if a word is an accessor marker (`function get x()`).
pub fn is_accessor_keyword(text: &str) -> bool {
    text == "get" || text == "set"
}

/// Text used for the actual token in syntax errors.
pub fn describe_token(text: &str) -> &str {
    if text.is_empty() {
        "end of file"
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classes() {
        assert!(is_modifier_keyword("override"));
        assert!(!is_modifier_keyword("function"));
        assert!(is_declaration_keyword("const"));
        assert_eq!(describe_token(""), "end of file");
    }
}
