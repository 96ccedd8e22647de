//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::UserRecord;

/// Insert a new user row. Returns the inserted record with server-generated
/// defaults (id, created_at), or `None` when the email is already taken.
pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    password_salt: &str,
) -> Result<Option<UserRecord>> {
    let result = sqlx::query_as::<_, UserRecord>(
        "INSERT INTO users (email, password_hash, password_salt) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(password_salt)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => Ok(Some(user)),
        Err(e) => {
            // A unique violation on the email index means the account exists;
            // everything else is a real failure.
            let is_duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if is_duplicate {
                Ok(None)
            } else {
                Err(e).context("failed to insert user")
            }
        }
    }
}

/// Fetch a user by email (exact match on the stored, normalized form).
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by email")?;

    Ok(user)
}

/// Fetch a user by its ID.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<UserRecord>> {
    let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}
