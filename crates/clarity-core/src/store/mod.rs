//! Per-user checklist store.
//!
//! One document per user, replaced whole on every write. `clear` removes the
//! document entirely: an absent checklist ("never generated") is a different
//! state from an empty one ("emptied"), and callers can tell them apart.

use clarity_db::models::{ChecklistDoc, ChecklistItem};
use clarity_db::queries::checklists;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Store failure taxonomy. Everything at this layer is a backend problem;
/// callers retry or surface it, they do not branch on subtypes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("checklist store unavailable")]
    Unavailable(#[from] anyhow::Error),
}

/// Flip the `done` flag of the item at `index`, in place.
///
/// Returns `false` without touching the list when the index is out of
/// bounds. Pure list surgery; persistence is the caller's job.
pub fn toggle_item(items: &mut [ChecklistItem], index: usize) -> bool {
    match items.get_mut(index) {
        Some(item) => {
            item.done = !item.done;
            true
        }
        None => false,
    }
}

/// Checklist persistence keyed by user id.
#[derive(Debug, Clone)]
pub struct ChecklistStore {
    pool: PgPool,
}

impl ChecklistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's checklist. `None` means no document exists.
    pub async fn load(&self, user_id: Uuid) -> Result<Option<ChecklistDoc>, StoreError> {
        Ok(checklists::get_checklist(&self.pool, user_id).await?)
    }

    /// Replace the user's checklist with `items`, creating the document if
    /// absent. Saving an empty list keeps the document alive.
    pub async fn save(
        &self,
        user_id: Uuid,
        items: &[ChecklistItem],
    ) -> Result<ChecklistDoc, StoreError> {
        let doc = checklists::upsert_checklist(&self.pool, user_id, items).await?;
        info!(%user_id, count = items.len(), "saved checklist");
        Ok(doc)
    }

    /// Remove the user's checklist document. Returns `true` when a document
    /// existed.
    pub async fn clear(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let removed = checklists::delete_checklist(&self.pool, user_id).await?;
        if removed {
            info!(%user_id, "cleared checklist");
        }
        Ok(removed)
    }
}
