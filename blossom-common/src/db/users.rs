//! User (volunteer, staff and bot account) persistence

use crate::auth::hash_password;
use crate::rank::{rank_with_override, Rank};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

/// User record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_volunteer: bool,
    pub is_grafeas_staff: bool,
    pub is_staff: bool,
    pub accepted_coc: bool,
    pub blacklisted: bool,
    pub date_joined: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
}

impl User {
    /// False for accounts created without a password (bootstrap imports, bots)
    pub fn has_usable_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Fields for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    /// Already-hashed password; `None` leaves the password unusable
    pub password_hash: Option<String>,
    pub is_volunteer: bool,
    pub is_grafeas_staff: bool,
    pub is_staff: bool,
    pub accepted_coc: bool,
}

impl NewUser {
    /// A volunteer with default flags and no password
    pub fn volunteer(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            password_hash: None,
            is_volunteer: true,
            is_grafeas_staff: false,
            is_staff: false,
            accepted_coc: false,
        }
    }
}

/// Reference to a user by numeric id or by username
#[derive(Debug, Clone, PartialEq)]
pub enum UserRef {
    Id(i64),
    Username(String),
}

const USER_COLUMNS: &str = "id, username, email, password_hash, is_volunteer, is_grafeas_staff, \
     is_staff, accepted_coc, blacklisted, date_joined, last_update_time";

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        is_volunteer: row.try_get("is_volunteer")?,
        is_grafeas_staff: row.try_get("is_grafeas_staff")?,
        is_staff: row.try_get("is_staff")?,
        accepted_coc: row.try_get("accepted_coc")?,
        blacklisted: row.try_get("blacklisted")?,
        date_joined: row.try_get("date_joined")?,
        last_update_time: row.try_get("last_update_time")?,
    })
}

/// Insert a new user
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> Result<User> {
    let now = crate::time::now();
    let id = sqlx::query(
        r#"
        INSERT INTO users (
            username, email, password_hash, is_volunteer, is_grafeas_staff,
            is_staff, accepted_coc, blacklisted, date_joined, last_update_time
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.is_volunteer)
    .bind(new_user.is_grafeas_staff)
    .bind(new_user.is_staff)
    .bind(new_user.accepted_coc)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Created user {} (id {})", new_user.username, id);

    find_user_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("User {} vanished after insert", id)))
}

/// Load user by id
pub async fn find_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

/// Load user by exact username
pub async fn find_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS))
        .bind(username)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

/// Load user by id or username.
///
/// A numeric string is tried as a username first, then as an id.
pub async fn find_user_by_ref(pool: &SqlitePool, user_ref: &UserRef) -> Result<Option<User>> {
    match user_ref {
        UserRef::Id(id) => find_user_by_id(pool, *id).await,
        UserRef::Username(username) => {
            if let Some(user) = find_user_by_username(pool, username).await? {
                return Ok(Some(user));
            }
            match username.trim().parse::<i64>() {
                Ok(id) => find_user_by_id(pool, id).await,
                Err(_) => Ok(None),
            }
        }
    }
}

/// All users ordered by username
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY username ASC", USER_COLUMNS))
        .fetch_all(pool)
        .await?;
    rows.iter().map(user_from_row).collect()
}

/// Number of submissions the user has completed; 0 for blacklisted users
pub async fn gamma(pool: &SqlitePool, user: &User) -> Result<i64> {
    if user.blacklisted {
        return Ok(0);
    }
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE completed_by = ?")
        .bind(user.id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Rank from the user's gamma, or from `override_gamma` when non-zero
pub async fn rank(pool: &SqlitePool, user: &User, override_gamma: Option<i64>) -> Result<Rank> {
    let gamma = gamma(pool, user).await?;
    Ok(rank_with_override(gamma, override_gamma))
}

/// Earliest claim time over the user's claimed submissions
pub async fn first_active(pool: &SqlitePool, user: &User) -> Result<Option<DateTime<Utc>>> {
    let first: Option<DateTime<Utc>> = sqlx::query_scalar(
        r#"
        SELECT claim_time FROM submissions
        WHERE claimed_by = ? AND claim_time IS NOT NULL
        ORDER BY claim_time ASC
        LIMIT 1
        "#,
    )
    .bind(user.id)
    .fetch_optional(pool)
    .await?;
    Ok(first)
}

/// Record acceptance of the Code of Conduct
pub async fn accept_coc(pool: &SqlitePool, user_id: i64) -> Result<()> {
    update_flag(pool, user_id, "accepted_coc", true).await
}

/// Set or clear the blacklist flag
pub async fn set_blacklisted(pool: &SqlitePool, user_id: i64, blacklisted: bool) -> Result<()> {
    update_flag(pool, user_id, "blacklisted", blacklisted).await
}

/// Grant or remove Grafeas staff (API and CMS) access
pub async fn set_grafeas_staff(pool: &SqlitePool, user_id: i64, staff: bool) -> Result<()> {
    update_flag(pool, user_id, "is_grafeas_staff", staff).await
}

/// Grant or remove site superadmin access
pub async fn set_site_staff(pool: &SqlitePool, user_id: i64, staff: bool) -> Result<()> {
    update_flag(pool, user_id, "is_staff", staff).await
}

/// Set a user's password, or make it unusable with `None`
pub async fn set_password(pool: &SqlitePool, user_id: i64, password: Option<&str>) -> Result<()> {
    let password_hash = password.map(hash_password);
    let result = sqlx::query("UPDATE users SET password_hash = ?, last_update_time = ? WHERE id = ?")
        .bind(password_hash)
        .bind(crate::time::now())
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("User {}", user_id)));
    }
    Ok(())
}

async fn update_flag(pool: &SqlitePool, user_id: i64, column: &'static str, value: bool) -> Result<()> {
    // column is always one of the fixed names above
    let sql = format!("UPDATE users SET {} = ?, last_update_time = ? WHERE id = ?", column);
    let result = sqlx::query(&sql)
        .bind(value)
        .bind(crate::time::now())
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("User {}", user_id)));
    }
    Ok(())
}
