//! Scanner integration tests.
//!
//! Verifies that the scanner tokenizes ActionScript 3 constructs.

use as3ts_scanner::{Scanner, Token};

/// Helper: scan all tokens from source up to EOF.
fn scan_all(source: &str) -> Vec<Token<'_>> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token().expect("scan failed");
        if token.is_eof() {
            break;
        }
        tokens.push(token);
    }
    tokens
}

/// Helper: scan all token texts.
fn scan_texts(source: &str) -> Vec<&str> {
    scan_all(source).into_iter().map(|t| t.text).collect()
}

#[test]
fn test_empty_source() {
    assert!(scan_all("").is_empty());
}

#[test]
fn test_whitespace_only() {
    assert!(scan_all("   \t  ").is_empty());
    assert_eq!(scan_texts("  \n\t "), vec!["\n"]);
}

#[test]
fn test_eof_token_position() {
    let mut scanner = Scanner::new("a  ");
    scanner.next_token().unwrap();
    let eof = scanner.next_token().unwrap();
    assert!(eof.is_eof());
    assert_eq!(eof.start, 3);
}

#[test]
fn test_token_offsets() {
    let tokens = scan_all("var x:int = 1;");
    let starts: Vec<usize> = tokens.iter().map(|t| t.start).collect();
    assert_eq!(starts, vec![0, 4, 5, 6, 10, 12, 13]);
}

#[test]
fn test_package_header() {
    assert_eq!(
        scan_texts("package com.foo {\n}"),
        vec!["package", "com", ".", "foo", "{", "\n", "}"]
    );
}

#[test]
fn test_vector_type() {
    assert_eq!(
        scan_texts("var v:Vector.<String> = new Vector.<String>();"),
        vec![
            "var", "v", ":", "Vector", ".<", "String", ">", "=", "new", "Vector", ".<", "String",
            ">", "(", ")", ";"
        ]
    );
}

#[test]
fn test_vector_mode_only_splits_inside_vector() {
    assert_eq!(
        scan_texts("x >>= 1; Vector.<Vector.<int>>"),
        vec!["x", ">>=", "1", ";", "Vector", ".<", "Vector", ".<", "int", ">", ">"]
    );
}

#[test]
fn test_namespace_and_e4x_operators() {
    assert_eq!(
        scan_texts("CONFIG::debug x..item x.@id"),
        vec!["CONFIG", "::", "debug", "x", "..", "item", "x", ".", "@", "id"]
    );
}

#[test]
fn test_rest_parameter() {
    assert_eq!(scan_texts("(...args)"), vec!["(", "...", "args", ")"]);
}

#[test]
fn test_doc_comment_token() {
    let tokens = scan_all("/** Docs */\nfunction f() {}");
    assert!(tokens[0].is_doc_comment());
    assert!(tokens[1].is_newline());
}

#[test]
fn test_unterminated_comment_is_error() {
    let mut scanner = Scanner::new("a /* never closed");
    scanner.next_token().unwrap();
    let err = scanner.next_token().unwrap_err();
    assert_eq!(err.offset, 2);
}

#[test]
fn test_division_is_not_regex() {
    assert_eq!(scan_texts("a / b / c"), vec!["a", "/", "b", "/", "c"]);
    assert_eq!(scan_texts("a /= 2"), vec!["a", "/=", "2"]);
}

#[test]
fn test_regex_with_class_and_escape() {
    let mut scanner = Scanner::new(r"/[/\]]+\//g.test(s)");
    let slash = scanner.next_token().unwrap();
    let regex = scanner.scan_regex(slash.start).unwrap();
    assert_eq!(regex.text, r"/[/\]]+\//g");
    assert_eq!(scanner.next_token().unwrap().text, ".");
}

#[test]
fn test_regex_rejects_unbalanced_groups_and_bad_flags() {
    let mut scanner = Scanner::new("/a)/");
    let slash = scanner.next_token().unwrap();
    assert!(scanner.scan_regex(slash.start).is_none());

    let mut scanner = Scanner::new("/a/q");
    let slash = scanner.next_token().unwrap();
    assert!(scanner.scan_regex(slash.start).is_none());
}

#[test]
fn test_xml_literal_with_cdata_and_comment() {
    let source = "<root><!-- c --><![CDATA[<not a tag>]]><item id={n}/></root>";
    let tokens = scan_all(source);
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].is_xml);
    assert_eq!(tokens[0].text, source);
}

#[test]
fn test_xml_list_literal() {
    let tokens = scan_all("<><a/><b/></>");
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].is_xml);
}

#[test]
fn test_mismatched_xml_falls_back_to_operator() {
    assert_eq!(scan_texts("<a></b>")[0], "<");
}

#[test]
fn test_checkpoint_restore() {
    let mut scanner = Scanner::new("Vector.<int> rest");
    let saved = scanner.checkpoint();
    scanner.next_token().unwrap();
    scanner.next_token().unwrap();
    assert!(scanner.in_vector());
    scanner.restore(saved);
    assert!(!scanner.in_vector());
    assert_eq!(scanner.next_token().unwrap().text, "Vector");
}

#[test]
fn test_try_scan_keeps_progress_on_success() {
    let mut scanner = Scanner::new("a b c");
    let second = scanner.try_scan(|s| {
        s.next_token().ok()?;
        s.next_token().ok().map(|t| t.text)
    });
    assert_eq!(second, Some("b"));
    assert_eq!(scanner.next_token().unwrap().text, "c");
}

#[test]
fn test_unicode_identifier() {
    let tokens = scan_all("var été = 1;");
    assert_eq!(tokens[1].text, "été");
    assert!(tokens[1].is_identifier_like());
}
