//! Database query functions for the `checklists` table.
//!
//! Every mutation is a full-document replace or a row delete; there are no
//! per-item updates at this layer.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{ChecklistDoc, ChecklistItem};

/// Insert or fully replace the checklist document for a user.
///
/// `updated_at` is server-assigned on every write. Returns the stored
/// document.
pub async fn upsert_checklist(
    pool: &PgPool,
    user_id: Uuid,
    items: &[ChecklistItem],
) -> Result<ChecklistDoc> {
    let doc = sqlx::query_as::<_, ChecklistDoc>(
        "INSERT INTO checklists (user_id, items, updated_at) \
         VALUES ($1, $2, now()) \
         ON CONFLICT (user_id) DO UPDATE \
         SET items = EXCLUDED.items, updated_at = now() \
         RETURNING *",
    )
    .bind(user_id)
    .bind(Json(items))
    .fetch_one(pool)
    .await
    .context("failed to upsert checklist")?;

    Ok(doc)
}

/// Fetch the checklist document for a user, if one exists.
pub async fn get_checklist(pool: &PgPool, user_id: Uuid) -> Result<Option<ChecklistDoc>> {
    let doc = sqlx::query_as::<_, ChecklistDoc>("SELECT * FROM checklists WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch checklist")?;

    Ok(doc)
}

/// Delete the checklist document for a user entirely.
///
/// Returns `true` if a document was removed, `false` if none existed.
/// Deleting is distinct from saving an empty list: after a delete,
/// [`get_checklist`] returns `None` rather than an empty document.
pub async fn delete_checklist(pool: &PgPool, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM checklists WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to delete checklist")?;

    Ok(result.rows_affected() > 0)
}
