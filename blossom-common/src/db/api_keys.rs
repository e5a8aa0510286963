//! API key storage and lookup

use crate::auth::{generate_api_key, hash_api_key};
use crate::db::users::{find_user_by_id, User};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Issue a new API key for a user, replacing any existing one.
///
/// Returns the plaintext key; only its hash is stored.
pub async fn issue_api_key(pool: &SqlitePool, user_id: i64) -> Result<String> {
    let key = generate_api_key();
    sqlx::query(
        r#"
        INSERT INTO api_keys (user_id, key_hash, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            key_hash = excluded.key_hash,
            created_at = excluded.created_at
        "#,
    )
    .bind(user_id)
    .bind(hash_api_key(&key))
    .bind(crate::time::now())
    .execute(pool)
    .await?;

    info!("Issued API key for user {}", user_id);
    Ok(key)
}

/// Remove a user's API key; returns whether one existed
pub async fn revoke_api_key(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM api_keys WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// The user owning `key`, if any
pub async fn authenticate_api_key(pool: &SqlitePool, key: &str) -> Result<Option<User>> {
    let user_id: Option<i64> = sqlx::query_scalar("SELECT user_id FROM api_keys WHERE key_hash = ?")
        .bind(hash_api_key(key))
        .fetch_optional(pool)
        .await?;

    match user_id {
        Some(id) => find_user_by_id(pool, id).await,
        None => Ok(None),
    }
}
