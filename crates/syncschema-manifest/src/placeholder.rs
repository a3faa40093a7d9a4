//! Named SQL placeholder extraction (`:paramName`)

use regex::Regex;
use std::sync::LazyLock;

// Alternatives are tried left to right at each position: string literals and
// quoted identifiers (with doubled-quote escapes), then `::type` casts, are
// consumed whole so a colon inside them never starts a placeholder.
static SQL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|::[A-Za-z_][A-Za-z0-9_]*|:([A-Za-z_][A-Za-z0-9_]*)"#)
        .expect("placeholder pattern is valid")
});

/// Extract placeholder names in order of first appearance, without duplicates
pub fn extract_placeholders(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for caps in SQL_TOKEN.captures_iter(sql) {
        let Some(name) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    names
}
