//! Module paths for flat-mode imports.

/// Relative module path from a file in package `from` to the module `to`
/// (package segments followed by the type name).
pub fn relative_import_path(from: &[String], to: &[String]) -> String {
    let to_dirs = to.len().saturating_sub(1);
    let common = from
        .iter()
        .zip(to[..to_dirs].iter())
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from.len() - common;
    let mut parts: Vec<&str> = Vec::new();
    if ups == 0 {
        parts.push(".");
    } else {
        parts.extend(std::iter::repeat("..").take(ups));
    }
    parts.extend(to[common..].iter().map(String::as_str));
    parts.join("/")
}
