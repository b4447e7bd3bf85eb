//! # fsql
//!
//! SQL text templates rendered from JSON documents, executed through a per-session
//! prepared statement cache on PostgreSQL.
//!
//! ## Features
//!
//! - **Placeholders**: `{d[key]}` (verbatim), `{d[key]!r}` (string literal),
//!   `{d[key]!i}` (identifier), `{d[key]!j}` (`jsonb` literal)
//! - **One level of nesting**: values that contain placeholders are substituted first
//! - **Whole-document access**: `{d[_self]}` refers to the entire document
//! - **Statement cache**: identical final SQL is compiled once per session
//! - **Explicit invalidation**: `clear_cache()` after schema changes
//!
//! ## Example
//!
//! ```ignore
//! use fsql::{Session, render_str};
//! use serde_json::json;
//!
//! let sql = render_str(
//!     "SELECT to_jsonb(count(*)) FROM {d[table]!i} WHERE status = {d[status]!r}",
//!     &json!({"table": "orders", "status": "open"}),
//! );
//!
//! let client = fsql::pool::connect(&database_url).await?;
//! let mut session = Session::new(client);
//! let count = session.execute(Some(&sql), None, true).await?;
//! ```

pub mod engine;
pub mod error;
pub mod ident;
mod keywords;
pub mod monitor;
pub mod pool;
pub mod render;
pub mod session;

pub use engine::{Engine, TextArray};
pub use error::{FsqlError, FsqlResult};
pub use monitor::{CacheOutcome, CacheStats};
pub use render::{EscapeMode, Renderer, render, render_str};
pub use session::{Session, SessionConfig};

#[cfg(feature = "tracing")]
pub use monitor::TracingSqlHook;

#[cfg(feature = "pool")]
pub use pool::create_pool;
