//! Execution engine contract used by [`Session`](crate::Session).
//!
//! An engine compiles SQL text into a reusable statement, executes it with bound
//! parameters and hands back rows. Implementations are provided for
//! `tokio_postgres::Client`, `tokio_postgres::Transaction` and (with the `pool`
//! feature) `deadpool_postgres::Client`.

mod numeric;

use crate::error::{FsqlError, FsqlResult};
use futures_util::TryStreamExt;
use numeric::NumericText;
use serde_json::{Number, Value};
use std::future::Future;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Row, RowStream, Statement};

/// The single statement parameter: an array of text values, or SQL NULL.
pub type TextArray<'a> = Option<&'a [Option<String>]>;

/// A connection that can compile and run statements.
///
/// Statements are **per-connection** and must not be used across connections.
pub trait Engine: Send + Sync {
    /// Compiled statement handle.
    type Statement: Clone + Send + Sync;
    /// A result row.
    type Row: Send;

    /// Compile `sql` with the given parameter types.
    fn prepare(
        &self,
        sql: &str,
        param_types: &[Type],
    ) -> impl Future<Output = FsqlResult<Self::Statement>> + Send;

    /// Execute `stmt` with `params` bound to `$1` and return the first row, if any.
    ///
    /// Implementations should ask the server for a single row when the protocol allows
    /// it. `tokio_postgres::Transaction` does, through a portal with a row limit of one.
    /// `tokio_postgres::Client` has no portals outside a transaction, so the statement
    /// runs to completion on the server and every row past the first is discarded as it
    /// arrives.
    fn query_first(
        &self,
        stmt: &Self::Statement,
        params: TextArray<'_>,
    ) -> impl Future<Output = FsqlResult<Option<Self::Row>>> + Send;

    /// Read the first column of `row` into an owned JSON value.
    ///
    /// SQL NULL maps to `Ok(None)`.
    fn first_column(&self, row: &Self::Row) -> FsqlResult<Option<Value>>;

    /// Release a compiled statement.
    ///
    /// The default implementation drops the handle.
    fn release(&self, stmt: Self::Statement) {
        drop(stmt);
    }
}

// ===== tokio-postgres support =====

// Client-side row limit: the stream is dropped after its first row.
async fn first_row(stream: RowStream) -> FsqlResult<Option<Row>> {
    let mut stream = std::pin::pin!(stream);
    stream.try_next().await.map_err(FsqlError::from)
}

impl Engine for tokio_postgres::Client {
    type Statement = Statement;
    type Row = Row;

    async fn prepare(&self, sql: &str, param_types: &[Type]) -> FsqlResult<Statement> {
        Ok(tokio_postgres::Client::prepare_typed(self, sql, param_types).await?)
    }

    async fn query_first(&self, stmt: &Statement, params: TextArray<'_>) -> FsqlResult<Option<Row>> {
        let bound: [&(dyn ToSql + Sync); 1] = [&params];
        let stream = tokio_postgres::Client::query_raw(self, stmt, bound.iter().copied()).await?;
        first_row(stream).await
    }

    fn first_column(&self, row: &Row) -> FsqlResult<Option<Value>> {
        decode_first_column(row)
    }
}

impl Engine for tokio_postgres::Transaction<'_> {
    type Statement = Statement;
    type Row = Row;

    async fn prepare(&self, sql: &str, param_types: &[Type]) -> FsqlResult<Statement> {
        Ok(tokio_postgres::Transaction::prepare_typed(self, sql, param_types).await?)
    }

    async fn query_first(&self, stmt: &Statement, params: TextArray<'_>) -> FsqlResult<Option<Row>> {
        let bound: [&(dyn ToSql + Sync); 1] = [&params];
        let portal = self.bind_raw(stmt, bound.iter().copied()).await?;
        let rows = self.query_portal(&portal, 1).await?;
        Ok(rows.into_iter().next())
    }

    fn first_column(&self, row: &Row) -> FsqlResult<Option<Value>> {
        decode_first_column(row)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Engine for deadpool_postgres::Client {
    type Statement = Statement;
    type Row = Row;

    async fn prepare(&self, sql: &str, param_types: &[Type]) -> FsqlResult<Statement> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        Engine::prepare(client, sql, param_types).await
    }

    async fn query_first(&self, stmt: &Statement, params: TextArray<'_>) -> FsqlResult<Option<Row>> {
        let client: &tokio_postgres::Client = self;
        Engine::query_first(client, stmt, params).await
    }

    fn first_column(&self, row: &Row) -> FsqlResult<Option<Value>> {
        decode_first_column(row)
    }
}

/// Convert the first column of a Postgres row into a JSON value.
///
/// Supports `json`/`jsonb`, text-like types, `bool`, integers, floats and `numeric`.
/// `numeric` keeps its exact digits; `NaN` and infinities have no JSON form and are
/// decode errors, as are all other column types.
pub fn decode_first_column(row: &Row) -> FsqlResult<Option<Value>> {
    let Some(column) = row.columns().first() else {
        return Ok(None);
    };
    let name = column.name();
    let ty = column.type_();
    let err = |e: tokio_postgres::Error| FsqlError::decode(name, e.to_string());

    if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<Value>>(0).map_err(err)
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::NAME || *ty == Type::BPCHAR
    {
        Ok(row.try_get::<_, Option<String>>(0).map_err(err)?.map(Value::String))
    } else if *ty == Type::BOOL {
        Ok(row.try_get::<_, Option<bool>>(0).map_err(err)?.map(Value::Bool))
    } else if *ty == Type::INT2 {
        Ok(row.try_get::<_, Option<i16>>(0).map_err(err)?.map(Value::from))
    } else if *ty == Type::INT4 {
        Ok(row.try_get::<_, Option<i32>>(0).map_err(err)?.map(Value::from))
    } else if *ty == Type::INT8 {
        Ok(row.try_get::<_, Option<i64>>(0).map_err(err)?.map(Value::from))
    } else if *ty == Type::FLOAT4 {
        let v = row.try_get::<_, Option<f32>>(0).map_err(err)?;
        v.map(|f| float_value(name, f64::from(f))).transpose()
    } else if *ty == Type::FLOAT8 {
        let v = row.try_get::<_, Option<f64>>(0).map_err(err)?;
        v.map(|f| float_value(name, f)).transpose()
    } else if *ty == Type::NUMERIC {
        let v = row.try_get::<_, Option<NumericText>>(0).map_err(err)?;
        v.map(|n| n.into_value(name)).transpose()
    } else {
        Err(FsqlError::decode(
            name,
            format!("unsupported result type {ty}"),
        ))
    }
}

fn float_value(column: &str, f: f64) -> FsqlResult<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| FsqlError::decode(column, format!("{f} is not representable in JSON")))
}
