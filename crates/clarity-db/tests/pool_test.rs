//! Integration tests for migrations and the db-init summary helper.

use clarity_db::pool;
use clarity_db::queries::users;
use clarity_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn migrations_are_idempotent() {
    let (pool, db_name) = create_test_db().await;

    // create_test_db already migrated; running again is a no-op.
    pool::run_migrations(&pool).await.unwrap();

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn table_counts_covers_the_whole_schema() {
    let (pool, db_name) = create_test_db().await;

    let counts = pool::table_counts(&pool).await.unwrap();
    assert_eq!(counts, vec![("users", 0), ("checklists", 0)]);

    users::insert_user(&pool, "a@b.c", "hash", "salt")
        .await
        .unwrap()
        .unwrap();

    let counts = pool::table_counts(&pool).await.unwrap();
    assert_eq!(counts, vec![("users", 1), ("checklists", 0)]);

    pool.close().await;
    drop_test_db(&db_name).await;
}
