use crate::error::{FsqlError, FsqlResult};
use std::collections::HashMap;

/// Slots reserved when the table is first created.
const INITIAL_CAPACITY: usize = 128;

/// Compute the cache key for final SQL text.
///
/// The key is the first 8 bytes (little endian) of the BLAKE3 digest, so it is stable
/// across processes and platforms. Distinct texts with equal keys are treated as the
/// same statement.
pub fn key_for(sql: &str) -> u64 {
    let digest = blake3::hash(sql.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Per-session table of compiled statements keyed by [`key_for`].
///
/// The table is created on first use and dropped by [`StatementCache::invalidate`].
/// There is no eviction: it grows until invalidated.
#[derive(Debug)]
pub(crate) struct StatementCache<S> {
    table: Option<HashMap<u64, S>>,
}

impl<S> Default for StatementCache<S> {
    fn default() -> Self {
        Self { table: None }
    }
}

impl<S: Clone> StatementCache<S> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: u64) -> Option<S> {
        self.table.as_ref()?.get(&key).cloned()
    }

    /// Store `stmt` under `key`, creating the table if needed.
    ///
    /// If a statement is already stored it wins and `stmt` is handed back as the
    /// second element so the caller can release it.
    pub(crate) fn insert_if_absent(&mut self, key: u64, stmt: S) -> FsqlResult<(S, Option<S>)> {
        self.create()?;
        let table = self.table.get_or_insert_with(HashMap::new);
        if let Some(existing) = table.get(&key) {
            return Ok((existing.clone(), Some(stmt)));
        }
        table.insert(key, stmt.clone());
        Ok((stmt, None))
    }

    pub(crate) fn len(&self) -> usize {
        self.table.as_ref().map_or(0, HashMap::len)
    }

    #[cfg(test)]
    pub(crate) fn is_created(&self) -> bool {
        self.table.is_some()
    }

    /// Drop the table and return every retained statement for release.
    pub(crate) fn invalidate(&mut self) -> Option<Vec<S>> {
        self.table
            .take()
            .map(|table| table.into_values().collect())
    }

    /// Create the table if it does not exist yet.
    pub(crate) fn create(&mut self) -> FsqlResult<()> {
        if self.table.is_none() {
            let mut table = HashMap::new();
            table
                .try_reserve(INITIAL_CAPACITY)
                .map_err(|e| FsqlError::Resource(format!("statement cache: {e}")))?;
            self.table = Some(table);
        }
        Ok(())
    }
}
