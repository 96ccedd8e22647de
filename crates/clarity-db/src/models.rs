use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user account as exposed to API clients. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Full user row including credential fields.
///
/// Never serialized; `password_hash` and `password_salt` stay inside the
/// auth layer. Convert to [`User`] before anything client-facing.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            email: r.email,
            created_at: r.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Checklists
// ---------------------------------------------------------------------------

/// A single actionable item in a user's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Task text. Non-empty by construction.
    pub text: String,
    /// Completion state, toggled by the user.
    pub done: bool,
}

impl ChecklistItem {
    /// A fresh item as produced by generation: not yet done.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}

/// The persisted checklist document: the full ordered item list belonging
/// to one user, replaced wholesale on every write.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChecklistDoc {
    pub user_id: Uuid,
    pub items: Json<Vec<ChecklistItem>>,
    pub updated_at: DateTime<Utc>,
}

impl ChecklistDoc {
    pub fn items(&self) -> &[ChecklistItem] {
        &self.items.0
    }

    pub fn into_items(self) -> Vec<ChecklistItem> {
        self.items.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_starts_not_done() {
        let item = ChecklistItem::new("Buy milk");
        assert_eq!(item.text, "Buy milk");
        assert!(!item.done);
    }

    #[test]
    fn item_serde_roundtrip() {
        let item = ChecklistItem {
            text: "Call Sam".to_string(),
            done: true,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"{"text":"Call Sam","done":true}"#);
        let back: ChecklistItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn user_record_converts_without_credentials() {
        let rec = UserRecord {
            id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            password_hash: "deadbeef".to_string(),
            password_salt: "cafe".to_string(),
            created_at: Utc::now(),
        };
        let user = User::from(rec.clone());
        assert_eq!(user.id, rec.id);
        assert_eq!(user.email, rec.email);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("deadbeef"), "hash must not leak: {json}");
    }
}
