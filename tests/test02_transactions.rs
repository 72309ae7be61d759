#![cfg(feature = "sqlite")]

use sql_session::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

async fn session_with_table(path: &str) -> Result<Session, SqlSessionError> {
    let mut session = Session::sqlite(path).await?;
    session
        .execute_batch("CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY, val TEXT)")
        .await?;
    Ok(session)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn commit_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("commit");
    let mut session = session_with_table(&path).await?;

    session.begin_tran().await?;
    assert!(session.in_transaction());
    session
        .execute_dml(
            "INSERT INTO t (id, val) VALUES (:id, :val)",
            &ParamBag::new()
                .set("id", RowValues::Int(1))
                .set("val", RowValues::Text("x".into())),
        )
        .await?;
    session.commit_tran().await?;
    assert!(!session.in_transaction());

    // Second commit with no active transaction is a no-op.
    session.commit_tran().await?;
    // So is a rollback.
    session.rollback_tran().await?;

    let count = session.scalar_i64("SELECT COUNT(*) FROM t", &ParamBag::new()).await?;
    assert_eq!(count, 1);
    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rollback_discards_and_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("rollback");
    let mut session = session_with_table(&path).await?;

    session.begin_tran().await?;
    session
        .execute_dml(
            "INSERT INTO t (id, val) VALUES (:id, :val)",
            &ParamBag::new()
                .set("id", RowValues::Int(1))
                .set("val", RowValues::Text("x".into())),
        )
        .await?;
    session.rollback_tran().await?;
    assert!(!session.in_transaction());
    session.rollback_tran().await?;

    let count = session.scalar_i64("SELECT COUNT(*) FROM t", &ParamBag::new()).await?;
    assert_eq!(count, 0);
    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn nested_begin_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("nested");
    let mut session = session_with_table(&path).await?;

    session.begin_tran().await?;
    let err = session.begin_tran().await.unwrap_err();
    assert!(matches!(err, SqlSessionError::TransactionState(_)));
    // The original transaction is untouched by the rejected begin.
    assert!(session.in_transaction());
    session.rollback_tran().await?;

    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn isolation_variant_begins_a_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("iso");
    let mut session = session_with_table(&path).await?;

    session.begin_tran_with(IsolationLevel::Serializable).await?;
    session
        .execute_dml(
            "INSERT INTO t (id, val) VALUES (:id, :val)",
            &ParamBag::new()
                .set("id", RowValues::Int(9))
                .set("val", RowValues::Text("iso".into())),
        )
        .await?;
    session.commit_tran().await?;

    let count = session.scalar_i64("SELECT COUNT(*) FROM t", &ParamBag::new()).await?;
    assert_eq!(count, 1);
    session.close().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_commits_open_transaction_and_is_idempotent()
-> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("close");

    let mut session = session_with_table(&path).await?;
    session.begin_tran().await?;
    session
        .execute_dml(
            "INSERT INTO t (id, val) VALUES (:id, :val)",
            &ParamBag::new()
                .set("id", RowValues::Int(1))
                .set("val", RowValues::Text("kept".into())),
        )
        .await?;
    // Close with the transaction still open: the commit-on-close policy
    // must preserve the insert.
    session.close().await;
    session.close().await; // second close is a no-op

    let err = session.execute_batch("SELECT 1").await.unwrap_err();
    assert!(matches!(err, SqlSessionError::ConnectionError(_)));

    let mut reopened = Session::sqlite(&path).await?;
    let val = reopened
        .scalar_string("SELECT val FROM t WHERE id = 1", &ParamBag::new())
        .await?;
    assert_eq!(val, "kept");
    reopened.close().await;
    Ok(())
}
