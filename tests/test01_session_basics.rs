#![cfg(feature = "sqlite")]

use serde_json::json;
use sql_session::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

async fn seeded_session() -> Result<Session, SqlSessionError> {
    let mut session = Session::sqlite(":memory:").await?;
    session
        .execute_batch(
            "CREATE TABLE player (id INTEGER PRIMARY KEY, name TEXT NOT NULL, score INTEGER);
             INSERT INTO player (id, name, score) VALUES (5, 'alice', 10);
             INSERT INTO player (id, name, score) VALUES (6, 'bob', 20);",
        )
        .await?;
    Ok(session)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scalar_normalizes_null_and_empty_to_zero() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session().await?;

    let empty = session
        .execute_scalar("SELECT name FROM player WHERE id = :id", &ParamBag::new().set("id", RowValues::Int(999)))
        .await?;
    assert_eq!(empty, RowValues::Int(0));

    let null = session
        .execute_scalar("SELECT NULL", &ParamBag::new())
        .await?;
    assert_eq!(null, RowValues::Int(0));

    let real = session
        .execute_scalar("SELECT name FROM player WHERE id = :id", &ParamBag::new().set("id", RowValues::Int(5)))
        .await?;
    assert_eq!(real, RowValues::Text("alice".into()));

    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dml_binds_named_params_from_object() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session().await?;

    let params = ParamBag::from_object(json!({ "id": 5 }))?;
    let updated = session
        .execute_dml("UPDATE player SET score = 1 WHERE id = :id", &params)
        .await?;
    assert_eq!(updated, 1);

    let score = session
        .scalar_i64("SELECT score FROM player WHERE id = :id", &params)
        .await?;
    assert_eq!(score, 1);

    // No matching row means zero affected, not an error.
    let missed = session
        .execute_dml(
            "UPDATE player SET score = 1 WHERE id = :id",
            &ParamBag::new().set("id", RowValues::Int(999)),
        )
        .await?;
    assert_eq!(missed, 0);

    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn typed_scalar_getters_convert() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session().await?;
    let none = ParamBag::new();

    assert_eq!(session.scalar_i64("SELECT COUNT(*) FROM player", &none).await?, 2);
    assert_eq!(session.scalar_f64("SELECT 2.5", &none).await?, 2.5);
    assert_eq!(
        session.scalar_string("SELECT name FROM player WHERE id = 5", &none).await?,
        "alice"
    );
    // Normalized empty scalar renders as "0".
    assert_eq!(
        session
            .scalar_string("SELECT name FROM player WHERE id = 999", &none)
            .await?,
        "0"
    );
    let ts = session
        .scalar_timestamp("SELECT '2024-03-01 12:30:00'", &none)
        .await?;
    assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-01 12:30:00");

    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn select_returns_rows_matching_columns() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session().await?;

    let rs = session
        .execute_select("SELECT id, name FROM player ORDER BY id", &ParamBag::new())
        .await?;
    assert_eq!(rs.rows_affected, 2);
    assert_eq!(
        rs.get_column_names().unwrap().as_slice(),
        &["id".to_string(), "name".to_string()]
    );
    assert_eq!(rs.results[0].get("id"), Some(&RowValues::Int(5)));
    assert_eq!(rs.results[1].get("name"), Some(&RowValues::Text("bob".into())));

    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn raw_connection_access_reaches_the_driver() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session().await?;

    let version = session
        .with_sqlite_connection(|conn| {
            conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
                .map_err(SqlSessionError::SqliteError)
        })
        .await?;
    assert_eq!(version, 0);

    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sessions_persist_to_disk() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("basics");

    let mut session = Session::sqlite(&path).await?;
    session
        .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")
        .await?;
    session
        .execute_dml("INSERT INTO t (id) VALUES (:id)", &ParamBag::new().set("id", RowValues::Int(1)))
        .await?;
    session.close().await;

    let mut reopened = Session::sqlite(&path).await?;
    let count = reopened.scalar_i64("SELECT COUNT(*) FROM t", &ParamBag::new()).await?;
    assert_eq!(count, 1);
    reopened.close().await;
    Ok(())
}
