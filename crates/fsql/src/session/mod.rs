//! Per-connection session: cached statement execution for rendered SQL.
//!
//! A `Session` owns an [`Engine`] (usually a `tokio_postgres::Client`) and a statement
//! cache. Each call compiles its final SQL with a single `text[]` parameter, runs it and
//! returns the first column of the first row as JSON.
//!
//! # Example
//!
//! ```ignore
//! use fsql::{Session, SessionConfig};
//! use serde_json::json;
//!
//! let mut session = Session::with_config(client, SessionConfig::new().with_logging());
//!
//! let total = session
//!     .render_and_execute(
//!         "SELECT to_jsonb(count(*)) FROM {d[table]!i} WHERE owner = $1[1]",
//!         Some(&json!({"table": "orders"})),
//!         Some(&[Some("alice".to_string())]),
//!         true,
//!     )
//!     .await?;
//!
//! // After DDL, drop statements compiled against the old schema.
//! session.clear_cache();
//! ```

pub mod config;
mod statement_cache;

pub use config::SessionConfig;
pub use statement_cache::key_for;

use crate::engine::{Engine, TextArray};
use crate::error::FsqlResult;
#[cfg(feature = "tracing")]
use crate::monitor::TracingSqlHook;
use crate::monitor::{CacheOutcome, CacheStats};
use crate::render;
use serde_json::Value;
use statement_cache::StatementCache;
use std::time::Instant;
use tokio_postgres::types::Type;


/// A single-connection execution context with its own statement cache.
///
/// Not shared between connections; all mutating calls take `&mut self`.
pub struct Session<E: Engine> {
    engine: E,
    cache: StatementCache<E::Statement>,
    stats: CacheStats,
    config: SessionConfig,
    #[cfg(feature = "tracing")]
    tracing_sql_hook: Option<TracingSqlHook>,
}

impl<E: Engine> Session<E> {
    /// Create a new `Session` with default configuration.
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, SessionConfig::default())
    }

    /// Create a new `Session` with custom configuration.
    pub fn with_config(engine: E, config: SessionConfig) -> Self {
        Self {
            engine,
            cache: StatementCache::new(),
            stats: CacheStats::default(),
            #[cfg(feature = "tracing")]
            tracing_sql_hook: config.logging_enabled.then(TracingSqlHook::new),
            config,
        }
    }

    /// Emit executed SQL via `tracing` (targets `fsql.sql` and `fsql.cache`).
    ///
    /// Requires crate feature `tracing`.
    #[cfg(feature = "tracing")]
    pub fn with_tracing_sql(self) -> Self {
        self.with_tracing_sql_hook(TracingSqlHook::new())
    }

    /// Same as [`Session::with_tracing_sql`] with a custom hook configuration.
    ///
    /// Requires crate feature `tracing`.
    #[cfg(feature = "tracing")]
    pub fn with_tracing_sql_hook(mut self, hook: TracingSqlHook) -> Self {
        self.config.logging_enabled = true;
        self.tracing_sql_hook = Some(hook);
        self
    }

    /// Get a reference to the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Get the current configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the collected cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset cache statistics.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Number of statements currently retained by the cache.
    pub fn cached_statements(&self) -> usize {
        self.cache.len()
    }

    /// Execute `sql` with `params` bound as `$1`, using the configured global cache switch.
    ///
    /// - `None` sql returns `Ok(None)` without touching the engine.
    /// - Zero rows or SQL NULL in the first column returns `Ok(None)`.
    /// - Compile and execution failures are returned as-is; nothing is retried.
    pub async fn execute(
        &mut self,
        sql: Option<&str>,
        params: TextArray<'_>,
        use_cache: bool,
    ) -> FsqlResult<Option<Value>> {
        let global = self.config.cache_plans;
        self.execute_with(sql, params, use_cache, global).await
    }

    /// Execute with an explicit global cache switch.
    ///
    /// Caching applies only when both `use_cache` and `global_cache_enabled` are set;
    /// otherwise a transient statement is compiled, run once and released.
    pub async fn execute_with(
        &mut self,
        sql: Option<&str>,
        params: TextArray<'_>,
        use_cache: bool,
        global_cache_enabled: bool,
    ) -> FsqlResult<Option<Value>> {
        let Some(sql) = sql else {
            return Ok(None);
        };

        if !(use_cache && global_cache_enabled) {
            self.emit_tracing_sql(sql, CacheOutcome::Disabled, None);
            let stmt = self.prepare(sql, CacheOutcome::Disabled).await?;
            let result = self.run(&stmt, params).await;
            self.engine.release(stmt);
            return result;
        }

        let key = key_for(sql);
        let stmt = match self.cache.get(key) {
            Some(stmt) => {
                self.stats.hits += 1;
                self.emit_tracing_sql(sql, CacheOutcome::Hit, Some(key));
                stmt
            }
            None => {
                self.stats.misses += 1;
                self.emit_tracing_sql(sql, CacheOutcome::Miss, Some(key));
                self.cache.create()?;
                let stmt = self.prepare(sql, CacheOutcome::Miss).await?;
                let (stmt, duplicate) = self.cache.insert_if_absent(key, stmt)?;
                if let Some(duplicate) = duplicate {
                    self.engine.release(duplicate);
                }
                stmt
            }
        };

        self.run(&stmt, params).await
    }

    /// Render `template` with `data`, then [`execute`](Session::execute) the result.
    pub async fn render_and_execute(
        &mut self,
        template: &str,
        data: Option<&Value>,
        params: TextArray<'_>,
        use_cache: bool,
    ) -> FsqlResult<Option<Value>> {
        let sql = render::render(Some(template), data);
        self.execute(sql.as_deref(), params, use_cache).await
    }

    /// Render `template` with nested resolution bounded by the configured `max_depth`,
    /// then execute the result.
    pub async fn render_nested_and_execute(
        &mut self,
        template: &str,
        data: &Value,
        params: TextArray<'_>,
        use_cache: bool,
    ) -> FsqlResult<Option<Value>> {
        let sql = self.config.renderer().render_nested(template, data)?;
        self.execute(Some(&sql), params, use_cache).await
    }

    /// Release every cached statement and drop the cache table.
    ///
    /// Call after schema changes that make compiled statements stale. The next cached
    /// call starts from an empty table.
    pub fn clear_cache(&mut self) {
        let Some(statements) = self.cache.invalidate() else {
            return;
        };
        let released = statements.len();
        for stmt in statements {
            self.engine.release(stmt);
        }
        self.stats.invalidations += 1;
        self.emit_tracing_invalidate(released);
    }

    /// Release the cache and return the engine.
    pub fn close(mut self) -> E {
        self.clear_cache();
        self.engine
    }

    async fn prepare(&mut self, sql: &str, outcome: CacheOutcome) -> FsqlResult<E::Statement> {
        let start = Instant::now();
        let stmt = self.engine.prepare(sql, &[Type::TEXT_ARRAY]).await?;
        self.stats.on_prepare(outcome, start.elapsed());
        Ok(stmt)
    }

    async fn run(&self, stmt: &E::Statement, params: TextArray<'_>) -> FsqlResult<Option<Value>> {
        match self.engine.query_first(stmt, params).await? {
            Some(row) => self.engine.first_column(&row),
            None => Ok(None),
        }
    }

    #[cfg(not(feature = "tracing"))]
    fn emit_tracing_sql(&self, _sql: &str, _outcome: CacheOutcome, _key: Option<u64>) {}

    #[cfg(feature = "tracing")]
    fn emit_tracing_sql(&self, sql: &str, outcome: CacheOutcome, key: Option<u64>) {
        if let Some(hook) = &self.tracing_sql_hook {
            hook.on_execute(sql, outcome, key);
        }
    }

    #[cfg(not(feature = "tracing"))]
    fn emit_tracing_invalidate(&self, _released: usize) {}

    #[cfg(feature = "tracing")]
    fn emit_tracing_invalidate(&self, released: usize) {
        if let Some(hook) = &self.tracing_sql_hook {
            hook.on_invalidate(released);
        }
    }
}

impl<E: Engine> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cached_statements", &self.cache.len())
            .field("stats", &self.stats)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
