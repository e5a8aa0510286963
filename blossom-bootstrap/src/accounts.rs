//! Staff account administration

use blossom_common::db::api_keys::issue_api_key;
use blossom_common::db::users::{find_user_by_id, set_grafeas_staff, set_site_staff};
use blossom_common::db::User;
use blossom_common::Error;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;
use crate::reconcile::get_or_create_user;

/// Mark `username` as Grafeas staff (and site staff when `superadmin`),
/// creating the account if needed, and issue a fresh API key.
///
/// Any previous key for the account stops working.
pub async fn create_staff(pool: &SqlitePool, username: &str, superadmin: bool) -> Result<(User, String)> {
    let (user, _) = get_or_create_user(pool, username).await?;

    set_grafeas_staff(pool, user.id, true).await?;
    if superadmin {
        set_site_staff(pool, user.id, true).await?;
    }
    let api_key = issue_api_key(pool, user.id).await?;
    info!("{} is now staff (superadmin: {})", username, superadmin);

    let user = find_user_by_id(pool, user.id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", username)))?;
    Ok((user, api_key))
}
