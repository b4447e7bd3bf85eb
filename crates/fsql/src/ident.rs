//! SQL identifier quoting.
//!
//! Mirrors PostgreSQL's `quote_ident`: text that is already a safe bare identifier is
//! emitted as-is, anything else is wrapped in double quotes with `"` escaped as `""`.
//!
//! A safe bare identifier matches `[a-z_][a-z0-9_]*` and is not a keyword that would
//! change meaning when unquoted (see the keyword table in `keywords.rs`).
//!
//! # Example
//! ```
//! use fsql::ident::quote_ident;
//!
//! assert_eq!(quote_ident("users"), "users");
//! assert_eq!(quote_ident("UserTable"), r#""UserTable""#);
//! assert_eq!(quote_ident("from"), r#""from""#);
//! ```

use crate::keywords;

/// Whether `name` can be used unquoted without changing its meaning.
pub fn is_safe_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        // First char: lowercase letter or underscore.
        Some(c) if c == '_' || c.is_ascii_lowercase() => {}
        _ => return false,
    }
    // Subsequent chars: lowercase letter, digit, or underscore.
    if !chars.all(|c| c == '_' || c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return false;
    }
    !keywords::requires_quoting(name)
}

/// Quote `name` as an identifier if it is not already a safe bare identifier.
pub fn quote_ident(name: &str) -> String {
    if is_safe_ident(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    write_quoted(name, &mut out);
    out
}

pub(crate) fn write_quoted(name: &str, out: &mut String) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}
