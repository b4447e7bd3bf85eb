use super::canonical::{canonical_number, object_to_canonical_json, to_canonical_json};
use serde_json::Value;

/// Placeholder prefix. A value containing it carries further placeholders.
pub(crate) const PLACEHOLDER_PREFIX: &str = "{d[";

/// Key of the virtual entry holding the whole document.
pub const SELF_KEY: &str = "_self";

const SELF_PLACEHOLDER_PREFIX: &str = "{d[_self]";

/// Origin type of a document value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Null,
    /// Nested array or object, carried as canonical JSON text.
    Composite,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Null => ValueKind::Null,
            Value::Array(_) | Value::Object(_) => ValueKind::Composite,
        }
    }
}

/// One top-level document key with its textual value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    /// `None` when the value is null.
    pub value: Option<String>,
    pub is_null: bool,
    pub kind: ValueKind,
    /// The value contains placeholder syntax and must be substituted first.
    pub has_nested_placeholder: bool,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: Option<String>, kind: ValueKind) -> Self {
        let has_nested_placeholder = value
            .as_deref()
            .is_some_and(|v| v.contains(PLACEHOLDER_PREFIX));
        Self {
            key: key.into(),
            is_null: value.is_none(),
            value,
            kind,
            has_nested_placeholder,
        }
    }

    /// Build an entry from a document value.
    pub fn from_value(key: &str, value: &Value) -> Self {
        let text = match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(canonical_number(n)),
            Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
            Value::Array(_) | Value::Object(_) => Some(to_canonical_json(value)),
        };
        Self::new(key, text, ValueKind::of(value))
    }
}

/// Collect the entries of `data` that `template` may reference.
///
/// Only top-level keys are visited, in document order. When the template references
/// `{d[_self]` and the document has no `_self` key, a virtual entry holding the whole
/// document is appended; it never counts as a carrier. Absent or non-object data yields
/// no entries.
pub fn extract_entries(template: &str, data: Option<&Value>) -> Vec<Entry> {
    let Some(Value::Object(map)) = data else {
        return Vec::new();
    };

    let mut entries: Vec<Entry> = map
        .iter()
        .map(|(key, value)| Entry::from_value(key, value))
        .collect();

    if template.contains(SELF_PLACEHOLDER_PREFIX) && !map.contains_key(SELF_KEY) {
        let mut self_entry = Entry::new(
            SELF_KEY,
            Some(object_to_canonical_json(map)),
            ValueKind::Composite,
        );
        self_entry.has_nested_placeholder = false;
        entries.push(self_entry);
    }

    entries
}
