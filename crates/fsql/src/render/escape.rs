use super::canonical::write_json_string;
use super::entry::{Entry, ValueKind};
use crate::ident;

/// How an entry's value is written into the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeMode {
    /// `{d[key]}`: the value text verbatim, `null` for null.
    Plain,
    /// `{d[key]!r}`: a single-quoted SQL string literal, `''` for null.
    Literal,
    /// `{d[key]!i}`: a SQL identifier, quoted when needed, `""` for null.
    Ident,
    /// `{d[key]!j}`: a quoted JSON literal cast to `jsonb`, `'null'::jsonb` for null.
    Json,
}

impl EscapeMode {
    /// All modes, in the order the rewriter applies them for each key.
    pub const ALL: [EscapeMode; 4] = [
        EscapeMode::Literal,
        EscapeMode::Ident,
        EscapeMode::Json,
        EscapeMode::Plain,
    ];

    /// The mode suffix used in placeholder syntax, if any.
    pub fn suffix(self) -> Option<char> {
        match self {
            EscapeMode::Plain => None,
            EscapeMode::Literal => Some('r'),
            EscapeMode::Ident => Some('i'),
            EscapeMode::Json => Some('j'),
        }
    }

    /// Build the placeholder text for `key` in this mode.
    pub fn pattern(self, key: &str) -> String {
        let mut out = String::with_capacity(key.len() + 7);
        out.push_str("{d[");
        out.push_str(key);
        out.push(']');
        if let Some(suffix) = self.suffix() {
            out.push('!');
            out.push(suffix);
        }
        out.push('}');
        out
    }

    /// Produce the substitution text for `entry`.
    pub fn escape(self, entry: &Entry) -> String {
        let Some(value) = entry.value.as_deref().filter(|_| !entry.is_null) else {
            return self.null_form().to_string();
        };
        match self {
            EscapeMode::Plain => value.to_string(),
            EscapeMode::Literal => quote_literal(value),
            EscapeMode::Ident => ident::quote_ident(value),
            EscapeMode::Json => {
                let json = match entry.kind {
                    ValueKind::String => json_string(value),
                    _ => value.to_string(),
                };
                let mut out = quote_literal(&json);
                out.push_str(JSONB_CAST);
                out
            }
        }
    }

    fn null_form(self) -> &'static str {
        match self {
            EscapeMode::Plain => "null",
            EscapeMode::Literal => "''",
            EscapeMode::Ident => "\"\"",
            EscapeMode::Json => "'null'::jsonb",
        }
    }
}

const JSONB_CAST: &str = "::jsonb";

/// Quote `s` as a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

/// Encode `s` as a JSON string literal.
pub fn json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    write_json_string(s, &mut out);
    out
}
