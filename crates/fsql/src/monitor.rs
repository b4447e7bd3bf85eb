//! Statement cache instrumentation and SQL logging.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// How an execution obtained its statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Reused a statement retained by the cache.
    Hit,
    /// Compiled a statement and retained it.
    Miss,
    /// Compiled a transient statement for this call only.
    Disabled,
}

impl CacheOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::Disabled => "disabled",
        }
    }
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Statements reused from the cache.
    pub hits: u64,
    /// Cache lookups that had to compile.
    pub misses: u64,
    /// Statements compiled and retained by the cache.
    pub prepares: u64,
    /// Statements compiled for a single uncached call.
    pub transient_prepares: u64,
    /// Number of `clear_cache` calls that released a table.
    pub invalidations: u64,
    /// Total time spent compiling statements.
    pub prepare_duration: Duration,
}

impl CacheStats {
    /// Total number of compiles, cached or not.
    pub fn total_prepares(&self) -> u64 {
        self.prepares + self.transient_prepares
    }

    pub(crate) fn on_prepare(&mut self, outcome: CacheOutcome, duration: Duration) {
        match outcome {
            CacheOutcome::Disabled => self.transient_prepares += 1,
            CacheOutcome::Hit | CacheOutcome::Miss => self.prepares += 1,
        }
        self.prepare_duration = self.prepare_duration.saturating_add(duration);
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(feature = "tracing")]
pub use tracing_hook::TracingSqlHook;

#[cfg(feature = "tracing")]
mod tracing_hook {
    use super::{CacheOutcome, truncate_sql_bytes};
    use tracing::Level;

    /// A `tracing` hook that emits the final SQL of each execution and cache resets.
    ///
    /// Events use target `fsql.sql` for executions and `fsql.cache` for invalidation.
    #[derive(Debug, Clone)]
    pub struct TracingSqlHook {
        /// Tracing event level to emit at.
        pub level: Level,
        /// Truncate long SQL strings (in bytes). `None` means no truncation.
        pub max_sql_length: Option<usize>,
    }

    impl Default for TracingSqlHook {
        fn default() -> Self {
            Self {
                level: Level::DEBUG,
                max_sql_length: Some(200),
            }
        }
    }

    /// Dispatch a tracing event at a runtime-determined level.
    macro_rules! emit_at_level {
        ($level:expr, $($field:tt)*) => {
            match $level {
                Level::ERROR => tracing::error!($($field)*),
                Level::WARN  => tracing::warn!($($field)*),
                Level::INFO  => tracing::info!($($field)*),
                Level::DEBUG => tracing::debug!($($field)*),
                Level::TRACE => tracing::trace!($($field)*),
            }
        };
    }

    impl TracingSqlHook {
        pub fn new() -> Self {
            Self::default()
        }

        /// Override the tracing event level.
        pub fn level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Set maximum SQL length to display.
        pub fn max_sql_length(mut self, len: usize) -> Self {
            self.max_sql_length = Some(len);
            self
        }

        /// Disable SQL truncation.
        pub fn no_truncate(mut self) -> Self {
            self.max_sql_length = None;
            self
        }

        fn truncate_sql(&self, sql: &str) -> String {
            match self.max_sql_length {
                Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
                _ => sql.to_string(),
            }
        }

        pub(crate) fn on_execute(&self, sql: &str, outcome: CacheOutcome, key: Option<u64>) {
            let sql = self.truncate_sql(sql);
            let cache = outcome.as_str();
            match key {
                Some(key) => emit_at_level!(
                    self.level,
                    target: "fsql.sql",
                    cache,
                    key = format_args!("{key:016x}"),
                    sql = %sql,
                ),
                None => emit_at_level!(self.level, target: "fsql.sql", cache, sql = %sql),
            }
        }

        pub(crate) fn on_invalidate(&self, released: usize) {
            emit_at_level!(self.level, target: "fsql.cache", released, "statement cache cleared");
        }
    }
}
