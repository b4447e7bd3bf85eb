//! Template rendering: substitute values from a JSON document into SQL text.
//!
//! Placeholders take the form `{d[key]}` or `{d[key]!mode}` where `mode` is one of
//! `r` (string literal), `i` (identifier) or `j` (jsonb literal). See [`EscapeMode`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let sql = fsql::render_str(
//!     "SELECT {d[col]!i} FROM users WHERE name = {d[name]!r}",
//!     &json!({"col": "email", "name": "O'Brien"}),
//! );
//! assert_eq!(sql, "SELECT email FROM users WHERE name = 'O''Brien'");
//! ```
//!
//! Rendering is a single pass. Values that themselves contain placeholders are
//! substituted first, so one level of nesting resolves; deeper chains need
//! [`Renderer::render_nested`].

pub mod canonical;
mod entry;
mod escape;
mod plan;


pub use entry::{Entry, SELF_KEY, ValueKind, extract_entries};
pub use escape::{EscapeMode, json_string, quote_literal};
pub use plan::plan_entries;

use crate::error::{FsqlError, FsqlResult};
use serde_json::Value;

/// Render `template` with values from `data`.
///
/// - `None` template returns `None`.
/// - `None` or non-object data returns the template unchanged.
/// - Placeholders without a matching key are left as they are.
pub fn render(template: Option<&str>, data: Option<&Value>) -> Option<String> {
    let template = template?;
    Some(render_with(template, data))
}

/// Render `template` with values from `data`, see [`render`].
pub fn render_str(template: &str, data: &Value) -> String {
    render_with(template, Some(data))
}

fn render_with(template: &str, data: Option<&Value>) -> String {
    let entries = extract_entries(template, data);
    if entries.is_empty() {
        return template.to_string();
    }

    let mut text = template.to_string();
    for entry in plan_entries(entries) {
        for mode in EscapeMode::ALL {
            let pattern = mode.pattern(&entry.key);
            if text.contains(&pattern) {
                text = text.replace(&pattern, &mode.escape(&entry));
            }
        }
    }
    text
}

/// Template renderer with a bounded multi-pass mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    max_depth: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

impl Renderer {
    /// Default number of passes allowed by [`Renderer::render_nested`].
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    /// Upper bound accepted by [`Renderer::max_depth`].
    pub const MAX_DEPTH_LIMIT: usize = 10_000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of passes, clamped to `1..=10000`.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.clamp(1, Self::MAX_DEPTH_LIMIT);
        self
    }

    pub fn depth(&self) -> usize {
        self.max_depth
    }

    /// Single-pass render, identical to [`render`].
    pub fn render(&self, template: Option<&str>, data: Option<&Value>) -> Option<String> {
        render(template, data)
    }

    /// Render repeatedly until the text stops changing.
    ///
    /// Returns [`FsqlError::DepthExceeded`] if the text still changes after
    /// `max_depth` passes, which happens for self-expanding documents such as
    /// `{"a": "x{d[a]}"}`.
    pub fn render_nested(&self, template: &str, data: &Value) -> FsqlResult<String> {
        let mut current = template.to_string();
        for _ in 0..self.max_depth {
            let next = render_str(&current, data);
            if next == current {
                return Ok(next);
            }
            current = next;
        }

        if render_str(&current, data) == current {
            Ok(current)
        } else {
            Err(FsqlError::DepthExceeded(self.max_depth))
        }
    }
}
