#![cfg(feature = "sqlite")]

use sql_session::prelude::*;

#[derive(Debug, PartialEq)]
struct Player {
    id: i64,
    name: String,
    active: bool,
}

impl FromRow for Player {
    fn from_row(row: &Row) -> Result<Self, SqlSessionError> {
        Ok(Player {
            id: *row
                .get("id")
                .and_then(RowValues::as_int)
                .ok_or_else(|| SqlSessionError::ExecutionError("player.id missing".into()))?,
            name: row
                .get("name")
                .and_then(RowValues::as_text)
                .ok_or_else(|| SqlSessionError::ExecutionError("player.name missing".into()))?
                .to_string(),
            active: *row
                .get("active")
                .and_then(RowValues::as_bool)
                .ok_or_else(|| SqlSessionError::ExecutionError("player.active missing".into()))?,
        })
    }
}

async fn seeded_session() -> Result<Session, SqlSessionError> {
    let mut session = Session::sqlite(":memory:").await?;
    session
        .execute_batch(
            "CREATE TABLE player (id INTEGER PRIMARY KEY, name TEXT NOT NULL, active INTEGER);
             INSERT INTO player (id, name, active) VALUES (1, 'alice', 1);
             INSERT INTO player (id, name, active) VALUES (2, 'bob', 0);",
        )
        .await?;
    Ok(session)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn list_maps_every_row_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session().await?;

    let players: Vec<Player> = session
        .query_list("SELECT id, name, active FROM player ORDER BY id", &ParamBag::new())
        .await?;
    assert_eq!(
        players,
        vec![
            Player { id: 1, name: "alice".into(), active: true },
            Player { id: 2, name: "bob".into(), active: false },
        ]
    );

    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_enforces_exactly_one_row() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session().await?;

    let one: Player = session
        .query_single(
            "SELECT id, name, active FROM player WHERE id = :id",
            &ParamBag::new().set("id", RowValues::Int(1)),
        )
        .await?;
    assert_eq!(one.name, "alice");

    let none = session
        .query_single::<Player>(
            "SELECT id, name, active FROM player WHERE id = :id",
            &ParamBag::new().set("id", RowValues::Int(999)),
        )
        .await
        .unwrap_err();
    assert!(matches!(none, SqlSessionError::Cardinality(0)));

    let many = session
        .query_single::<Player>("SELECT id, name, active FROM player", &ParamBag::new())
        .await
        .unwrap_err();
    assert!(matches!(many, SqlSessionError::Cardinality(2)));

    session.close().await;
    Ok(())
}

// Generic helper driven through the SessionExecutor seam rather than the
// concrete Session type.
async fn count_rows<E: SessionExecutor + Send>(
    executor: &mut E,
    table: &str,
) -> Result<usize, SqlSessionError> {
    let rs = executor
        .execute_select(&format!("SELECT * FROM {table}"), &ParamBag::new())
        .await?;
    Ok(rs.results.len())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn executor_trait_runs_generic_code() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session().await?;

    assert_eq!(count_rows(&mut session, "player").await?, 2);

    let inserted = SessionExecutor::execute_dml(
        &mut session,
        "INSERT INTO player (id, name, active) VALUES (:id, :name, :active)",
        &ParamBag::new()
            .set("id", RowValues::Int(3))
            .set("name", RowValues::Text("carol".into()))
            .set("active", RowValues::Bool(true)),
    )
    .await?;
    assert_eq!(inserted, 1);
    assert_eq!(count_rows(&mut session, "player").await?, 3);

    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rows_map_identically_through_from_row() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded_session().await?;

    // Row itself implements FromRow, so list calls can return raw rows.
    let raw: Vec<Row> = session
        .query_list("SELECT id, name FROM player ORDER BY id", &ParamBag::new())
        .await?;
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0].get("name"), Some(&RowValues::Text("alice".into())));

    session.close().await;
    Ok(())
}
