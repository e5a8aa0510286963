//! Volunteer endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use blossom_common::db::api_keys::issue_api_key;
use blossom_common::db::dummy::generate_dummy_transcription;
use blossom_common::db::users::{
    self, create_user, find_user_by_id, find_user_by_username, first_active, gamma,
};
use blossom_common::db::{NewUser, User};
use blossom_common::Rank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::info;

use super::{missing_key, value_as_string, ApiUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const USERNAME_DESCRIPTION: &str = "str; the username of the volunteer.";

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub username: Option<String>,
}

/// Volunteer statistics
#[derive(Debug, Serialize)]
pub struct VolunteerSummary {
    pub id: i64,
    pub username: String,
    pub gamma: i64,
    pub rank: Rank,
    pub next_rank_at: Option<i64>,
    pub accepted_coc: bool,
    pub blacklisted: bool,
    pub first_active: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

/// POST /api/volunteers
///
/// Create-or-get keyed by username: 201 when created, 200 when it existed.
pub async fn create_volunteer(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(body) = payload?;
    let username = username_from_body(&body)?;

    if let Some(existing) = find_user_by_username(&state.db, &username).await? {
        return Ok((StatusCode::OK, Json(existing)));
    }

    match create_user(&state.db, &NewUser::volunteer(&username)).await {
        Ok(user) => {
            info!("Created volunteer {}", user.username);
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(e) if e.is_unique_violation() => {
            let existing = find_user_by_username(&state.db, &username)
                .await?
                .ok_or(e)?;
            Ok((StatusCode::OK, Json(existing)))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/volunteers/summary?username=
pub async fn summary(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> ApiResult<Json<VolunteerSummary>> {
    let Query(query) = query?;
    let username = query
        .username
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No username received. Use ?username= in your request.".to_string()))?;

    let user = find_user_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No volunteer found with username {}!", username)))?;

    Ok(Json(build_summary(&state.db, &user).await?))
}

/// POST /api/volunteers/:id/gamma_plusone
///
/// Adds one completed dummy submission to the volunteer's count.
pub async fn gamma_plusone(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = path?;
    let user = require_volunteer(&state.db, id).await?;
    generate_dummy_transcription(&state.db, user.id, None).await?;

    let gamma = gamma(&state.db, &user).await?;
    info!("Raised gamma of {} to {}", user.username, gamma);
    Ok(Json(json!({ "success": "Updated gamma!", "gamma": gamma })))
}

/// POST /api/volunteers/:id/accept_coc
pub async fn accept_coc(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = path?;
    let user = require_volunteer(&state.db, id).await?;
    if user.accepted_coc {
        return Err(ApiError::Conflict(format!(
            "{} has already accepted the Code of Conduct.",
            user.username
        )));
    }

    users::accept_coc(&state.db, user.id).await?;
    info!("{} accepted the Code of Conduct", user.username);
    Ok(Json(json!({ "success": format!("{} has accepted the Code of Conduct.", user.username) })))
}

/// POST /api/volunteers/:id/blacklist
pub async fn blacklist(
    State(state): State<AppState>,
    Extension(ApiUser(staff)): Extension<ApiUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = path?;
    let Json(body) = payload?;
    let blacklisted = body
        .get("blacklisted")
        .and_then(Value::as_bool)
        .ok_or_else(|| {
            missing_key("blacklisted", "bool; whether the volunteer should be blacklisted.")
        })?;

    let user = require_volunteer(&state.db, id).await?;
    users::set_blacklisted(&state.db, user.id, blacklisted).await?;
    info!(
        "{} set blacklisted={} for {}",
        staff.username, blacklisted, user.username
    );

    Ok(Json(json!({ "username": user.username, "blacklisted": blacklisted })))
}

/// POST /api/volunteers/:id/api_key
///
/// The plaintext key appears in this response only.
pub async fn issue_key(
    State(state): State<AppState>,
    Extension(ApiUser(staff)): Extension<ApiUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = path?;
    let user = require_volunteer(&state.db, id).await?;
    let key = issue_api_key(&state.db, user.id).await?;
    info!("{} issued a new API key for {}", staff.username, user.username);
    Ok(Json(json!({ "username": user.username, "api_key": key })))
}

pub(crate) async fn build_summary(pool: &SqlitePool, user: &User) -> ApiResult<VolunteerSummary> {
    let gamma = gamma(pool, user).await?;
    let rank = blossom_common::rank::rank_for_gamma(gamma);
    Ok(VolunteerSummary {
        id: user.id,
        username: user.username.clone(),
        gamma,
        rank,
        next_rank_at: rank.next_threshold(),
        accepted_coc: user.accepted_coc,
        blacklisted: user.blacklisted,
        first_active: first_active(pool, user).await?,
        date_joined: user.date_joined,
    })
}

async fn require_volunteer(pool: &SqlitePool, id: i64) -> ApiResult<User> {
    find_user_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No volunteer found with ID {}!", id)))
}

/// Username from a `{username}` body; 400 when absent
pub(crate) fn username_from_body(body: &Value) -> ApiResult<String> {
    value_as_string(body.get("username"))
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| missing_key("username", USERNAME_DESCRIPTION))
}
