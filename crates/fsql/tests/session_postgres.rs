use fsql::{FsqlError, FsqlResult, Session, SessionConfig};
use serde_json::json;
use tokio_postgres::Client;

async fn try_connect() -> FsqlResult<Option<Client>> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping");
            return Ok(None);
        }
    };
    fsql::pool::connect(&database_url).await.map(Some)
}

#[tokio::test]
async fn executes_rendered_sql_and_reuses_statement() -> FsqlResult<()> {
    let Some(client) = try_connect().await? else {
        return Ok(());
    };
    let mut session = Session::new(client);

    let template = "SELECT jsonb_build_object('n', {d[n]}, 'tag', {d[tag]!r}, 'args', $1::text[])";
    let data = json!({"n": 7, "tag": "it's"});
    let params = vec![Some("a".to_string()), None];

    let first = session
        .render_and_execute(template, Some(&data), Some(&params), true)
        .await?;
    let second = session
        .render_and_execute(template, Some(&data), Some(&params), true)
        .await?;

    let expected = json!({"n": 7, "tag": "it's", "args": ["a", null]});
    assert_eq!(first, Some(expected.clone()));
    assert_eq!(second, Some(expected));
    assert_eq!(session.stats().prepares, 1);
    assert_eq!(session.stats().hits, 1);
    assert_eq!(session.cached_statements(), 1);
    Ok(())
}

#[tokio::test]
async fn zero_rows_and_null_are_none() -> FsqlResult<()> {
    let Some(client) = try_connect().await? else {
        return Ok(());
    };
    let mut session = Session::new(client);

    assert_eq!(
        session.execute(Some("SELECT 1 WHERE false"), None, true).await?,
        None
    );
    assert_eq!(
        session.execute(Some("SELECT NULL::jsonb"), None, false).await?,
        None
    );
    assert_eq!(
        session.execute(Some("SELECT 'x'::text"), None, false).await?,
        Some(json!("x"))
    );
    assert_eq!(
        session.execute(Some("SELECT 41 + 1"), None, true).await?,
        Some(json!(42))
    );
    Ok(())
}

#[tokio::test]
async fn only_first_row_is_returned() -> FsqlResult<()> {
    let Some(client) = try_connect().await? else {
        return Ok(());
    };
    let mut session = Session::new(client);

    let value = session
        .execute(
            Some("SELECT to_jsonb(g) FROM generate_series(1, 1000) g ORDER BY g"),
            None,
            true,
        )
        .await?;
    assert_eq!(value, Some(json!(1)));
    Ok(())
}

#[tokio::test]
async fn clear_cache_after_schema_change() -> FsqlResult<()> {
    let Some(client) = try_connect().await? else {
        return Ok(());
    };
    let mut session = Session::with_config(client, SessionConfig::new().with_logging());

    let table = format!("fsql_test_clear_{}", std::process::id());
    let create = format!("CREATE TEMP TABLE {table} (v int)");
    let insert = format!("INSERT INTO {table} VALUES (1)");
    session.engine().batch_execute(&create).await?;
    session.engine().batch_execute(&insert).await?;

    let select = format!("SELECT to_jsonb(t) FROM {table} t");
    assert_eq!(
        session.execute(Some(&select), None, true).await?,
        Some(json!({"v": 1}))
    );

    let alter = format!("ALTER TABLE {table} ADD COLUMN w int DEFAULT 2");
    session.engine().batch_execute(&alter).await?;
    session.clear_cache();
    assert_eq!(session.cached_statements(), 0);

    assert_eq!(
        session.execute(Some(&select), None, true).await?,
        Some(json!({"v": 1, "w": 2}))
    );
    assert_eq!(session.stats().invalidations, 1);
    assert_eq!(session.stats().prepares, 2);
    Ok(())
}

#[tokio::test]
async fn compile_error_is_reported() -> FsqlResult<()> {
    let Some(client) = try_connect().await? else {
        return Ok(());
    };
    let mut session = Session::new(client);

    let err = session
        .execute(Some("SELEC broken"), None, true)
        .await
        .unwrap_err();
    assert!(matches!(err, FsqlError::Query(_)));
    assert!(err.is_engine_failure());
    assert_eq!(session.cached_statements(), 0);

    // The session stays usable.
    assert_eq!(
        session.execute(Some("SELECT true"), None, true).await?,
        Some(json!(true))
    );
    Ok(())
}

#[tokio::test]
async fn unsupported_result_type_is_a_decode_error() -> FsqlResult<()> {
    let Some(client) = try_connect().await? else {
        return Ok(());
    };
    let mut session = Session::new(client);

    let err = session
        .execute(Some("SELECT now() AS ts"), None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, FsqlError::Decode { ref column, .. } if column == "ts"));
    Ok(())
}

#[tokio::test]
async fn transaction_stops_after_first_row() -> FsqlResult<()> {
    let Some(mut client) = try_connect().await? else {
        return Ok(());
    };
    let tx = client.transaction().await?;
    let mut session = Session::new(tx);

    // Evaluating the third row divides by zero; the portal never reaches it.
    let sql = "SELECT to_jsonb(g) FROM generate_series(1, 3) g WHERE 1.0 / (3 - g) > 0";
    assert_eq!(session.execute(Some(sql), None, true).await?, Some(json!(1)));
    assert_eq!(session.execute(Some(sql), None, true).await?, Some(json!(1)));
    assert_eq!(session.stats().prepares, 1);

    let tx = session.close();
    tx.rollback().await?;
    Ok(())
}

#[tokio::test]
async fn numeric_results_keep_every_digit() -> FsqlResult<()> {
    let Some(client) = try_connect().await? else {
        return Ok(());
    };
    let mut session = Session::new(client);

    let sum = session
        .execute(
            Some("SELECT sum(x) FROM (VALUES (1.25), (2.50)) v(x)"),
            None,
            true,
        )
        .await?
        .unwrap();
    assert_eq!(sum.to_string(), "3.75");

    let wide = session
        .execute(
            Some("SELECT 123456789012345678901234567890.000001::numeric"),
            None,
            false,
        )
        .await?
        .unwrap();
    assert_eq!(wide.to_string(), "123456789012345678901234567890.000001");

    let err = session
        .execute(Some("SELECT 'NaN'::numeric AS n"), None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, FsqlError::Decode { ref column, .. } if column == "n"));
    Ok(())
}
