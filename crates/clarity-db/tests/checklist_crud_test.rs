//! Integration tests for checklist document persistence.
//!
//! Covers the full-overwrite contract: save-then-load equality, wholesale
//! replacement, and delete-vs-empty distinction.

use clarity_db::models::ChecklistItem;
use clarity_db::queries::{checklists, users};
use clarity_test_utils::{create_test_db, drop_test_db};
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_user(pool: &PgPool) -> Uuid {
    users::insert_user(pool, "owner@example.com", "h", "s")
        .await
        .expect("insert_user should succeed")
        .expect("email should be fresh")
        .id
}

fn sample_items() -> Vec<ChecklistItem> {
    vec![
        ChecklistItem::new("Buy milk"),
        ChecklistItem::new("Call Sam"),
        ChecklistItem::new("Write the report outline"),
    ]
}

#[tokio::test]
async fn save_then_load_returns_equal_document() {
    let (pool, db_name) = create_test_db().await;
    let user_id = seed_user(&pool).await;

    let items = sample_items();
    let saved = checklists::upsert_checklist(&pool, user_id, &items)
        .await
        .expect("upsert should succeed");
    assert_eq!(saved.user_id, user_id);
    assert_eq!(saved.items(), items.as_slice());

    let loaded = checklists::get_checklist(&pool, user_id)
        .await
        .expect("get should succeed")
        .expect("document should exist");
    assert_eq!(loaded.items(), items.as_slice());
    assert_eq!(loaded.updated_at, saved.updated_at);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn upsert_replaces_whole_document() {
    let (pool, db_name) = create_test_db().await;
    let user_id = seed_user(&pool).await;

    checklists::upsert_checklist(&pool, user_id, &sample_items())
        .await
        .expect("first upsert should succeed");

    let replacement = vec![ChecklistItem::new("Completely new plan")];
    let saved = checklists::upsert_checklist(&pool, user_id, &replacement)
        .await
        .expect("second upsert should succeed");
    assert_eq!(saved.items().len(), 1);

    let loaded = checklists::get_checklist(&pool, user_id)
        .await
        .expect("get should succeed")
        .expect("document should exist");
    assert_eq!(loaded.items(), replacement.as_slice());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn toggle_flips_exactly_one_field() {
    let (pool, db_name) = create_test_db().await;
    let user_id = seed_user(&pool).await;

    let before = sample_items();
    checklists::upsert_checklist(&pool, user_id, &before)
        .await
        .expect("upsert should succeed");

    // Toggle item 1 and rewrite the full list, as the store layer does.
    let mut toggled = before.clone();
    toggled[1].done = !toggled[1].done;
    checklists::upsert_checklist(&pool, user_id, &toggled)
        .await
        .expect("toggle upsert should succeed");

    let after = checklists::get_checklist(&pool, user_id)
        .await
        .expect("get should succeed")
        .expect("document should exist")
        .into_items();

    assert_eq!(after.len(), before.len());
    for (i, (a, b)) in after.iter().zip(before.iter()).enumerate() {
        assert_eq!(a.text, b.text, "text must be unchanged at index {i}");
        if i == 1 {
            assert_ne!(a.done, b.done, "toggled field must flip");
        } else {
            assert_eq!(a.done, b.done, "untouched field must not flip at index {i}");
        }
    }

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_then_load_is_absent_not_empty() {
    let (pool, db_name) = create_test_db().await;
    let user_id = seed_user(&pool).await;

    checklists::upsert_checklist(&pool, user_id, &sample_items())
        .await
        .expect("upsert should succeed");

    let removed = checklists::delete_checklist(&pool, user_id)
        .await
        .expect("delete should succeed");
    assert!(removed);

    let loaded = checklists::get_checklist(&pool, user_id)
        .await
        .expect("get should succeed");
    assert!(
        loaded.is_none(),
        "deleted document must be absent, not an empty list"
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_missing_document_reports_false() {
    let (pool, db_name) = create_test_db().await;
    let user_id = seed_user(&pool).await;

    let removed = checklists::delete_checklist(&pool, user_id)
        .await
        .expect("delete should succeed");
    assert!(!removed);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn empty_list_is_distinct_from_absent() {
    let (pool, db_name) = create_test_db().await;
    let user_id = seed_user(&pool).await;

    checklists::upsert_checklist(&pool, user_id, &[])
        .await
        .expect("upsert of empty list should succeed");

    let loaded = checklists::get_checklist(&pool, user_id)
        .await
        .expect("get should succeed")
        .expect("an emptied document still exists");
    assert!(loaded.items().is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn deleting_user_cascades_to_checklist() {
    let (pool, db_name) = create_test_db().await;
    let user_id = seed_user(&pool).await;

    checklists::upsert_checklist(&pool, user_id, &sample_items())
        .await
        .expect("upsert should succeed");

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .expect("user delete should succeed");

    let loaded = checklists::get_checklist(&pool, user_id)
        .await
        .expect("get should succeed");
    assert!(loaded.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}
